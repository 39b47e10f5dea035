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

//! Package install and uninstall across every target device.

use anyhow::{Context, Result};
use chrono::Local;
use owo_colors::{OwoColorize, Stream::Stdout};
use std::path::Path;

use super::{report_outcome, CommandContext};
use crate::error::Error;
use crate::executor::DispatchOutcome;

fn timestamp() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S%.3f").to_string()
}

/// The two steps run on a device once the package is staged at `remote_path`.
pub fn install_steps(remote_path: &str) -> Vec<Vec<String>> {
    vec![
        vec![
            "pm".to_string(),
            "install".to_string(),
            "-r".to_string(),
            remote_path.to_string(),
        ],
        vec!["rm".to_string(), remote_path.to_string()],
    ]
}

pub fn uninstall_argv(package: &str, extra_args: &[String]) -> Vec<String> {
    let mut argv = vec!["pm".to_string(), "uninstall".to_string()];
    argv.extend(extra_args.iter().cloned());
    argv.push(package.to_string());
    argv
}

/// Stage `apk` on every device, then install it and remove the staged copy.
pub async fn install(ctx: &CommandContext, apk: &Path) -> Result<()> {
    let metadata = tokio::fs::metadata(apk)
        .await
        .map_err(|e| Error::local_io(apk, e))?;
    if !metadata.is_file() {
        return Err(Error::local_io(
            apk,
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a regular file"),
        )
        .into());
    }
    let file_name = apk
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .with_context(|| format!("Cannot determine a file name for {}", apk.display()))?;
    let remote_path = ctx.config.install_path(&file_name);

    let devices = ctx.target_devices().await?;
    if devices.is_empty() {
        return DispatchOutcome::NoDevices
            .print_outputs(&ctx.sink)
            .map_err(Into::into);
    }

    ctx.sink.println(&format!(
        "{}: pushing {} to {} device(s)",
        timestamp(),
        file_name.if_supports_color(Stdout, |t| t.bold()),
        devices.len()
    ))?;

    let pushed = ctx
        .engine
        .push_to_all(&devices, apk, &remote_path)
        .await
        .into_results();

    let (staged, push_failures): (Vec<_>, Vec<_>) =
        pushed.into_iter().partition(|result| result.is_success());
    for failure in &push_failures {
        failure.print_summary(&ctx.sink, "")?;
    }

    let staged: Vec<_> = staged.into_iter().map(|result| result.device).collect();
    ctx.sink.println(&format!("{}: {}", timestamp(), remote_path))?;

    if staged.is_empty() {
        anyhow::bail!("Push of {} failed on every device", file_name);
    }

    let outcome = ctx
        .engine
        .run_sequence_on_all(&staged, &install_steps(&remote_path))
        .await;

    let installed = report_outcome(&ctx.sink, &outcome);
    if !push_failures.is_empty() {
        anyhow::bail!(
            "{} of {} devices failed",
            push_failures.len() + outcome.failed_count(),
            devices.len()
        );
    }
    installed
}

/// Run `pm uninstall [extra args] <package>` on every device.
pub async fn uninstall(ctx: &CommandContext, package: &str, extra_args: &[String]) -> Result<()> {
    let devices = ctx.target_devices().await?;
    let outcome = ctx
        .engine
        .run_on_all(&devices, &uninstall_argv(package, extra_args))
        .await;
    report_outcome(&ctx.sink, &outcome)
}
