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

//! Streaming shell, used by `shell` and for unrecognised sub-commands.

use anyhow::{Context, Result};

use super::CommandContext;
use crate::executor::{OutputChunk, StreamingPipe, SyncSink};

/// Run `args` in a device shell, printing output as it arrives.
pub async fn shell(ctx: &CommandContext, args: &[String]) -> Result<()> {
    let resolved = ctx.resolve(args);
    tracing::debug!("Target args: {:?}", resolved.target_args);

    let pipe = ctx
        .engine
        .run_streaming(resolved.transporter.as_ref(), args)
        .await
        .with_context(|| format!("Failed to start shell {}", args.join(" ")))?;

    print_stream(pipe, &ctx.sink)
        .await
        .with_context(|| format!("Shell {} failed", args.join(" ")))
}

/// Copy every chunk to `sink` until the stream ends, then report how the
/// session exited.
pub async fn print_stream(mut pipe: StreamingPipe, sink: &SyncSink) -> Result<()> {
    while let Some(chunk) = pipe.next_chunk().await {
        match chunk {
            OutputChunk::Chunk(bytes) => sink.write_bytes(&bytes)?,
            OutputChunk::EndOfStream => break,
        }
    }
    pipe.finish().await?;
    Ok(())
}
