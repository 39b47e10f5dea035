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

//! [`Transporter`] backed by the `adb` executable.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::{ChildStderr, Command};

use super::{TransportTarget, Transporter};
use crate::error::{Error, Result};
use crate::executor::{StreamingPipe, DEFAULT_STREAM_BUFFER};

/// How much of a streaming child's stderr is kept for the failure message.
const STDERR_TAIL: usize = 4 * 1024;

/// How to invoke adb: the executable plus the global switches placed before
/// every sub-command.
#[derive(Debug, Clone)]
pub struct AdbCommand {
    program: PathBuf,
    global_args: Vec<String>,
    stream_buffer: usize,
}

impl AdbCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            global_args: Vec::new(),
            stream_buffer: DEFAULT_STREAM_BUFFER,
        }
    }

    pub fn with_global_args(mut self, global_args: Vec<String>) -> Self {
        self.global_args = global_args;
        self
    }

    /// Number of chunks a streaming shell may buffer ahead of its consumer.
    pub fn with_stream_buffer(mut self, stream_buffer: usize) -> Self {
        self.stream_buffer = stream_buffer.max(1);
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Full argument vector: global switches, `-s <serial>`, then `args`.
    pub fn args_for(&self, serial: Option<&str>, args: &[&str]) -> Vec<String> {
        let mut full = self.global_args.clone();
        if let Some(serial) = serial {
            full.push("-s".to_string());
            full.push(serial.to_string());
        }
        full.extend(args.iter().map(|arg| arg.to_string()));
        full
    }

    fn command(&self, serial: Option<&str>, args: &[&str]) -> Command {
        let mut command = Command::new(&self.program);
        command
            .args(self.args_for(serial, args))
            .stdin(Stdio::null())
            .kill_on_drop(true);
        command
    }

    /// Run adb to completion and return its stdout, failing on a non-zero exit.
    pub async fn output(&self, serial: Option<&str>, args: &[&str]) -> Result<Vec<u8>> {
        let context = describe(serial, args);
        tracing::debug!("Running {:?} {:?}", self.program, self.args_for(serial, args));

        let output = self
            .command(serial, args)
            .output()
            .await
            .map_err(|e| Error::transport(&context, format!("failed to run adb: {e}")))?;

        check_exit(&context, output.status, &output.stderr)?;
        Ok(output.stdout)
    }

    /// Spawn adb with stdout piped into a [`StreamingPipe`].
    ///
    /// stderr is relayed to our own stderr as it arrives. Once stdout closes,
    /// the exit status is checked the same way [`output`](Self::output) does
    /// and surfaces through [`StreamingPipe::finish`].
    pub fn stream(&self, serial: Option<&str>, args: &[&str]) -> Result<StreamingPipe> {
        let context = describe(serial, args);
        tracing::debug!("Streaming {:?} {:?}", self.program, self.args_for(serial, args));

        let mut child = self
            .command(serial, args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| Error::transport(&context, format!("failed to run adb: {e}")))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::transport(&context, "adb stdout was not captured"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| Error::transport(&context, "adb stderr was not captured"))?;
        let stderr_tail = tokio::spawn(relay_stderr(stderr));

        // The child rides along with the producer task and is killed when it is dropped
        let completion = async move {
            let status = child
                .wait()
                .await
                .map_err(|e| Error::transport(&context, format!("failed to wait for adb: {e}")))?;
            let stderr = stderr_tail.await.unwrap_or_default();
            check_exit(&context, status, &stderr)
        };

        Ok(StreamingPipe::from_reader(
            stdout,
            completion,
            self.stream_buffer,
        ))
    }
}

/// Map a finished adb process to an error when it did not exit cleanly.
fn check_exit(context: &str, status: ExitStatus, stderr: &[u8]) -> Result<()> {
    if status.success() {
        return Ok(());
    }

    let stderr = String::from_utf8_lossy(stderr);
    let message = match stderr.trim() {
        "" => format!("adb exited with {status}"),
        text => text.to_string(),
    };
    if message.contains("no devices/emulators found") {
        return Err(Error::NoDevicesConnected);
    }
    Err(Error::transport(context, message))
}

/// Copy a child's stderr through to ours, keeping the tail for error reporting.
async fn relay_stderr(mut stderr: ChildStderr) -> Vec<u8> {
    let mut out = tokio::io::stderr();
    let mut tail = Vec::new();
    let mut buf = [0u8; 1024];

    loop {
        let n = match stderr.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) => {
                tracing::debug!("Reading adb stderr failed: {}", e);
                break;
            }
        };
        if let Err(e) = out.write_all(&buf[..n]).await {
            tracing::debug!("Relaying adb stderr failed: {}", e);
        }
        tail.extend_from_slice(&buf[..n]);
        if tail.len() > STDERR_TAIL {
            tail.drain(..tail.len() - STDERR_TAIL);
        }
    }
    tail
}

fn describe(serial: Option<&str>, args: &[&str]) -> String {
    match serial {
        Some(serial) => format!("[{serial}] adb {}", args.join(" ")),
        None => format!("adb {}", args.join(" ")),
    }
}

/// Transporter that shells out to adb for every operation.
#[derive(Debug, Clone)]
pub struct AdbTransporter {
    adb: AdbCommand,
    target: TransportTarget,
}

impl AdbTransporter {
    pub fn new(adb: AdbCommand, target: TransportTarget) -> Self {
        Self { adb, target }
    }

    fn shell_args(args: &[String]) -> Vec<&str> {
        std::iter::once("shell")
            .chain(args.iter().map(String::as_str))
            .collect()
    }
}

#[async_trait]
impl Transporter for AdbTransporter {
    fn target(&self) -> &TransportTarget {
        &self.target
    }

    async fn shell_sync(&self, args: &[String]) -> Result<Vec<u8>> {
        self.adb
            .output(self.target.serial(), &Self::shell_args(args))
            .await
    }

    async fn shell_stream(&self, args: &[String]) -> Result<StreamingPipe> {
        self.adb.stream(self.target.serial(), &Self::shell_args(args))
    }

    async fn push(&self, local: &Path, remote: &str) -> Result<()> {
        let metadata = tokio::fs::metadata(local)
            .await
            .map_err(|e| Error::local_io(local, e))?;
        if !metadata.is_file() {
            return Err(Error::local_io(
                local,
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a regular file"),
            ));
        }

        let local_str = local.to_string_lossy();
        self.adb
            .output(self.target.serial(), &["push", &local_str, remote])
            .await?;
        Ok(())
    }

    async fn pull(&self, remote: &str, local: &Path) -> Result<()> {
        if tokio::fs::metadata(local).await.is_ok_and(|m| m.is_dir()) {
            return Err(Error::local_io(
                local,
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "is a directory"),
            ));
        }

        // adb writes into a sibling that replaces `local` only on success.
        // Creating it also fails early on an unwritable destination.
        let parent = match local.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        let partial = tempfile::Builder::new()
            .prefix(".madb-pull-")
            .tempfile_in(parent)
            .map_err(|e| Error::local_io(local, e))?
            .into_temp_path();

        let partial_str = partial.to_string_lossy().into_owned();
        self.adb
            .output(self.target.serial(), &["pull", remote, &partial_str])
            .await?;

        partial
            .persist(local)
            .map_err(|e| Error::local_io(local, e.error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_for_default_target() {
        let adb = AdbCommand::new("adb").with_global_args(vec!["-d".into()]);
        assert_eq!(
            adb.args_for(None, &["shell", "ls"]),
            vec!["-d", "shell", "ls"]
        );
    }

    #[test]
    fn test_args_for_single_device() {
        let adb = AdbCommand::new("adb").with_global_args(vec!["-H".into(), "10.0.0.2".into()]);
        assert_eq!(
            adb.args_for(Some("emulator-5554"), &["pull", "/sdcard/a.txt", "a.txt"]),
            vec!["-H", "10.0.0.2", "-s", "emulator-5554", "pull", "/sdcard/a.txt", "a.txt"]
        );
    }

    #[test]
    fn test_shell_args_prepend_shell() {
        let args = vec!["pm".to_string(), "list".to_string(), "packages".to_string()];
        assert_eq!(
            AdbTransporter::shell_args(&args),
            vec!["shell", "pm", "list", "packages"]
        );
    }

    #[test]
    fn test_stream_buffer_never_zero() {
        let adb = AdbCommand::new("adb").with_stream_buffer(0);
        assert_eq!(adb.stream_buffer, 1);
    }

    #[tokio::test]
    async fn test_missing_adb_binary_is_transport_error() {
        let adb = AdbCommand::new("/nonexistent/path/to/adb");
        let err = adb.output(None, &["devices"]).await.unwrap_err();
        assert!(matches!(err, Error::TransportIo { .. }));
        assert!(err.to_string().contains("failed to run adb"));
    }

    #[tokio::test]
    async fn test_push_missing_local_file_is_local_error() {
        let transporter = AdbTransporter::new(
            AdbCommand::new("/nonexistent/path/to/adb"),
            TransportTarget::DefaultAll,
        );
        let err = transporter
            .push(Path::new("/this/file/does/not/exist.apk"), "/data/local/tmp/x.apk")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::LocalIo { .. }));
    }

    /// adb stand-in: `sh -c <script> adb <args...>` sees the adb argv as `$@`.
    #[cfg(unix)]
    fn scripted_adb(script: &str) -> AdbCommand {
        AdbCommand::new("sh").with_global_args(vec!["-c".into(), script.into(), "adb".into()])
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_no_devices_message_maps_to_no_devices_error() {
        let adb = scripted_adb("echo 'adb: error: no devices/emulators found' >&2; exit 1");
        let err = adb.output(None, &["shell", "ls"]).await.unwrap_err();
        assert!(matches!(err, Error::NoDevicesConnected));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_nonzero_exit_carries_stderr() {
        let adb = scripted_adb("echo 'device offline' >&2; exit 1");
        let err = adb.output(Some("emu"), &["shell", "ls"]).await.unwrap_err();
        assert_eq!(err.to_string(), "[emu] adb shell ls: device offline");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_stream_delivers_child_stdout() {
        let adb = scripted_adb("echo \"$@\"");
        let pipe = adb.stream(Some("emu"), &["shell", "ls"]).unwrap();
        assert_eq!(pipe.collect_bytes().await, b"-s emu shell ls\n".to_vec());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_stream_reports_nonzero_exit_after_output() {
        let adb = scripted_adb("echo partial; echo 'device offline' >&2; exit 1");
        let mut pipe = adb.stream(Some("emu"), &["shell", "ls"]).unwrap();

        assert_eq!(
            pipe.next_chunk().await,
            Some(crate::executor::OutputChunk::Chunk(b"partial\n".to_vec()))
        );
        let err = pipe.finish().await.unwrap_err();
        assert!(matches!(err, Error::TransportIo { .. }));
        assert_eq!(err.to_string(), "[emu] adb shell ls: device offline");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_stream_maps_no_devices_exit() {
        let adb = scripted_adb("echo 'adb: error: no devices/emulators found' >&2; exit 1");
        let pipe = adb.stream(None, &["logcat"]).unwrap();
        assert!(matches!(pipe.finish().await, Err(Error::NoDevicesConnected)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_stream_clean_exit_finishes_ok() {
        let adb = scripted_adb("echo ok");
        let pipe = adb.stream(None, &["shell", "true"]).unwrap();
        assert!(pipe.finish().await.is_ok());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failed_pull_keeps_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let local = dir.path().join("important.txt");
        std::fs::write(&local, "precious data").unwrap();

        let transporter = AdbTransporter::new(
            scripted_adb("echo 'remote object does not exist' >&2; exit 1"),
            TransportTarget::SingleDevice("emu".into()),
        );
        let err = transporter
            .pull("/sdcard/missing.txt", &local)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::TransportIo { .. }));
        assert_eq!(std::fs::read_to_string(&local).unwrap(), "precious data");
        // No partial download is left beside it
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_successful_pull_replaces_file() {
        let dir = tempfile::tempdir().unwrap();
        let local = dir.path().join("notes.txt");
        std::fs::write(&local, "old").unwrap();

        // The destination adb is handed is the last argument
        let transporter = AdbTransporter::new(
            scripted_adb("for last; do :; done; printf fresh > \"$last\""),
            TransportTarget::SingleDevice("emu".into()),
        );
        transporter.pull("/sdcard/notes.txt", &local).await.unwrap();

        assert_eq!(std::fs::read_to_string(&local).unwrap(), "fresh");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_pull_into_missing_directory_is_local_error() {
        let transporter = AdbTransporter::new(
            AdbCommand::new("/nonexistent/path/to/adb"),
            TransportTarget::DefaultAll,
        );
        let err = transporter
            .pull("/sdcard/a.txt", Path::new("/this/dir/does/not/exist/a.txt"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::LocalIo { .. }));
    }
}
