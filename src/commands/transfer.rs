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

//! Single-transport file commands.

use anyhow::{Context, Result};
use std::path::Path;

use super::CommandContext;
use crate::error::Error;

pub async fn push(ctx: &CommandContext, local: &Path, remote: &str) -> Result<()> {
    let resolved = ctx.resolve(&[]);
    resolved
        .transporter
        .push(local, remote)
        .await
        .with_context(|| format!("Failed to push {} to {}", local.display(), remote))?;

    tracing::info!("Pushed {} to {}", local.display(), remote);
    Ok(())
}

pub async fn pull(ctx: &CommandContext, remote: &str, local: &Path) -> Result<()> {
    let resolved = ctx.resolve(&[]);
    resolved
        .transporter
        .pull(remote, local)
        .await
        .with_context(|| format!("Failed to pull {} to {}", remote, local.display()))?;

    tracing::info!("Pulled {} to {}", remote, local.display());
    Ok(())
}

/// Print a remote directory listing verbatim.
pub async fn ls(ctx: &CommandContext, path: &str) -> Result<()> {
    let resolved = ctx.resolve(&[]);
    let output = resolved
        .transporter
        .shell_sync(&["ls".to_string(), path.to_string()])
        .await
        .with_context(|| format!("Failed to list {path}"))?;

    ctx.sink.write_bytes(&output)?;
    Ok(())
}

/// Capture the screen as PNG into `outfile`.
///
/// The capture runs before the file is created, so a failed capture leaves
/// no empty file behind.
pub async fn screencap(ctx: &CommandContext, outfile: &Path) -> Result<()> {
    let resolved = ctx.resolve(&[]);
    let png = resolved
        .transporter
        .shell_sync(&["screencap".to_string(), "-p".to_string()])
        .await
        .context("Failed to capture the screen")?;

    tokio::fs::write(outfile, &png)
        .await
        .map_err(|e| Error::local_io(outfile, e))?;

    tracing::info!("Saved {} bytes to {}", png.len(), outfile.display());
    Ok(())
}
