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

use anyhow::{Context, Result};

use super::CommandContext;
use crate::executor::{OutputChunk, StreamingPipe, SyncSink};
use crate::logcat::{clear_log, logcat_command, LineBuffer, LineFormatter, LogcatFormatter};

pub struct LogcatParams<'a> {
    pub clear: bool,
    pub tags: &'a str,
    pub pretty_print: Option<bool>,
    pub packages: Option<&'a str>,
}

pub async fn logcat(ctx: &CommandContext, params: LogcatParams<'_>) -> Result<()> {
    let resolved = ctx.resolve(&[]);
    let transporter = resolved.transporter.as_ref();

    if params.clear {
        clear_log(transporter)
            .await
            .context("Failed to clear the device log")?;
        return Ok(());
    }

    let pretty = params
        .pretty_print
        .unwrap_or(ctx.config.logcat.pretty_print);
    let mut formatter = LogcatFormatter::new(pretty, ctx.config.logcat.tag_width);
    if let Some(packages) = params.packages {
        formatter.set_app_filters(packages.split(':'));
    }
    formatter
        .update_app_filters(transporter)
        .await
        .context("Failed to read the device process list")?;

    let pipe = ctx
        .engine
        .run_streaming(transporter, &[logcat_command(params.tags)])
        .await
        .context("Failed to start logcat")?;

    print_formatted(pipe, &mut formatter, &ctx.sink)
        .await
        .context("logcat ended with an error")
}

/// Split the stream into lines and print whatever `formatter` keeps.
pub async fn print_formatted(
    mut pipe: StreamingPipe,
    formatter: &mut dyn LineFormatter,
    sink: &SyncSink,
) -> Result<()> {
    let mut lines = LineBuffer::new();

    while let Some(chunk) = pipe.next_chunk().await {
        let completed = match chunk {
            OutputChunk::Chunk(bytes) => lines.push(&bytes),
            OutputChunk::EndOfStream => lines.finish().into_iter().collect(),
        };
        for line in completed {
            if let Some(formatted) = formatter.format_line(&line) {
                sink.write_bytes(formatted.as_bytes())?;
            }
        }
    }
    pipe.finish().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[tokio::test]
    async fn test_lines_split_across_chunks_are_formatted_whole() {
        let (tx, pipe) = StreamingPipe::channel(4);
        tokio::spawn(async move {
            let parts: [&str; 3] = [
                "10-18 12:00:00.000   100   100 I Tag: first\n10-18 12:00:",
                "01.000   100   100 W Tag: second\n",
                "10-18 12:00:02.000   100   100 E Tag: unterminated",
            ];
            for part in parts {
                if tx.send(part).await.is_err() {
                    break;
                }
            }
        });

        let mut formatter = LogcatFormatter::new(true, 4);
        let (sink, buffer) = SyncSink::buffer();
        print_formatted(pipe, &mut formatter, &sink).await.unwrap();

        assert_eq!(
            buffer.to_string_lossy(),
            " Tag I first\n Tag W second\n Tag E unterminated\n"
        );
    }

    #[tokio::test]
    async fn test_transport_failure_after_output_is_returned() {
        let pipe = StreamingPipe::from_reader(
            std::io::Cursor::new(b"10-18 12:00:00.000   100   100 I Tag: last words\n".to_vec()),
            async { Err(Error::transport("[emu] adb shell logcat", "device offline")) },
            2,
        );

        let mut formatter = LogcatFormatter::new(true, 4);
        let (sink, buffer) = SyncSink::buffer();
        let err = print_formatted(pipe, &mut formatter, &sink)
            .await
            .unwrap_err();

        assert_eq!(crate::error::exit_code(&err), 4);
        assert_eq!(buffer.to_string_lossy(), " Tag I last words\n");
    }
}
