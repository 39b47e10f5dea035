// Copyright 2025 Lablup Inc. and Jeongkyu Shin
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Synchronized output sink shared by concurrent device tasks.
//!
//! Every write goes through one mutex, and a device's block of lines is
//! written while holding it, so lines from different devices never tear.

use once_cell::sync::Lazy;
use std::io::{self, Write};
use std::sync::{Arc, Mutex, MutexGuard};

type SharedWriter = Arc<Mutex<Box<dyn Write + Send>>>;

/// Process-wide stdout sink
static STDOUT_SINK: Lazy<SharedWriter> = Lazy::new(|| {
    let stdout: Box<dyn Write + Send> = Box::new(io::stdout());
    Arc::new(Mutex::new(stdout))
});

/// Cloneable handle to an internally synchronized writer.
#[derive(Clone)]
pub struct SyncSink {
    writer: SharedWriter,
}

impl SyncSink {
    pub fn stdout() -> Self {
        Self {
            writer: Arc::clone(&STDOUT_SINK),
        }
    }

    pub fn from_writer(writer: impl Write + Send + 'static) -> Self {
        let writer: Box<dyn Write + Send> = Box::new(writer);
        Self {
            writer: Arc::new(Mutex::new(writer)),
        }
    }

    /// A sink writing into memory, plus a handle for reading it back.
    pub fn buffer() -> (Self, SharedBuffer) {
        let buffer = SharedBuffer::default();
        (Self::from_writer(buffer.clone()), buffer)
    }

    fn lock(&self) -> MutexGuard<'_, Box<dyn Write + Send>> {
        // A panic mid-write leaves only partial output behind, keep going
        self.writer.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Write raw bytes and flush.
    pub fn write_bytes(&self, bytes: &[u8]) -> io::Result<()> {
        let mut writer = self.lock();
        writer.write_all(bytes)?;
        writer.flush()
    }

    pub fn println(&self, text: &str) -> io::Result<()> {
        let mut writer = self.lock();
        writeln!(writer, "{text}")?;
        writer.flush()
    }

    /// Write several lines without letting other writers in between.
    pub fn print_lines<'a, I>(&self, lines: I) -> io::Result<()>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut writer = self.lock();
        for line in lines {
            writeln!(writer, "{line}")?;
        }
        writer.flush()
    }
}

impl std::fmt::Debug for SyncSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncSink").finish_non_exhaustive()
    }
}

/// In-memory writer used behind [`SyncSink::buffer`].
#[derive(Clone, Default)]
pub struct SharedBuffer {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    pub fn contents(&self) -> Vec<u8> {
        self.bytes.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn to_string_lossy(&self) -> String {
        String::from_utf8_lossy(&self.contents()).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bytes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Writes a device's output with a `[serial]` prefix on every line.
pub struct DeviceOutputWriter {
    sink: SyncSink,
    prefix: String,
}

impl DeviceOutputWriter {
    pub fn new(sink: SyncSink, serial: &str) -> Self {
        Self {
            sink,
            prefix: format!("[{serial}]"),
        }
    }

    /// Write every line of `text` as one uninterrupted block.
    pub fn write_lines(&self, text: &str) -> io::Result<()> {
        let lines: Vec<String> = text
            .lines()
            .map(|line| format!("{} {}", self.prefix, line))
            .collect();

        if lines.is_empty() {
            return Ok(());
        }
        self.sink.print_lines(lines.iter().map(String::as_str))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_writer_prefixes_lines() {
        let (sink, buffer) = SyncSink::buffer();
        let writer = DeviceOutputWriter::new(sink, "emulator-5554");

        writer.write_lines("Success\nsecond line\n").unwrap();
        assert_eq!(
            buffer.to_string_lossy(),
            "[emulator-5554] Success\n[emulator-5554] second line\n"
        );
    }

    #[test]
    fn test_empty_text_writes_nothing() {
        let (sink, buffer) = SyncSink::buffer();
        DeviceOutputWriter::new(sink, "x").write_lines("").unwrap();
        assert!(buffer.contents().is_empty());
    }

    #[test]
    fn test_concurrent_blocks_do_not_interleave() {
        let (sink, buffer) = SyncSink::buffer();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let writer = DeviceOutputWriter::new(sink.clone(), &format!("dev{i}"));
                std::thread::spawn(move || {
                    let text: String = (0..50).map(|n| format!("{n}\n")).collect();
                    writer.write_lines(&text).unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let output = buffer.to_string_lossy();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 8 * 50);

        // Each device's 50 lines form one contiguous run
        for block in lines.chunks(50) {
            let prefix = block[0].split(' ').next().unwrap();
            assert!(block.iter().all(|line| line.starts_with(prefix)));
        }
    }
}
