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

//! Per-device tasks and progress display for fan-out operations.

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use owo_colors::OwoColorize;
use std::path::PathBuf;
use std::sync::Arc;

use crate::device::Device;
use crate::transport::Transporter;

use super::result_types::{DeviceResult, StepOutput};

const PROGRESS_BAR_TICK_RATE_MS: u64 = 80;

/// Longest error excerpt shown on a finished spinner.
const SHORT_ERROR_LEN: usize = 50;

pub(crate) fn create_progress_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template("{prefix:.bold} {spinner:.cyan} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_chars("⣾⣽⣻⢿⡿⣟⣯⣷ ")
}

pub(crate) fn create_multi_progress(visible: bool) -> MultiProgress {
    if visible {
        MultiProgress::with_draw_target(ProgressDrawTarget::stderr())
    } else {
        MultiProgress::with_draw_target(ProgressDrawTarget::hidden())
    }
}

pub(crate) fn setup_progress_bar(
    multi_progress: &MultiProgress,
    device: &Device,
    style: ProgressStyle,
    initial_message: &str,
) -> ProgressBar {
    let pb = multi_progress.add(ProgressBar::new_spinner());
    pb.set_style(style);
    pb.set_prefix(format!("[{}]", device.serial));
    pb.set_message(format!("{}", initial_message.cyan()));
    if !multi_progress.is_hidden() {
        pb.enable_steady_tick(std::time::Duration::from_millis(PROGRESS_BAR_TICK_RATE_MS));
    }
    pb
}

fn finish_with_error(pb: &ProgressBar, error: &dyn std::fmt::Display) {
    let message = error.to_string();
    let first_line = message.lines().next().unwrap_or("Unknown error");
    let short_error = if first_line.chars().count() > SHORT_ERROR_LEN {
        let cut: String = first_line.chars().take(SHORT_ERROR_LEN - 3).collect();
        format!("{cut}...")
    } else {
        first_line.to_string()
    };
    pb.finish_with_message(format!("{} {}", "●".red(), short_error.red()));
}

/// Run `steps` one after another on a single device.
///
/// A step starts only after the previous one returned. The first failure
/// ends the job for this device.
pub(crate) async fn execute_steps_task(
    device: Device,
    transporter: Arc<dyn Transporter>,
    steps: Vec<Vec<String>>,
    pb: ProgressBar,
) -> DeviceResult {
    let mut outputs = Vec::with_capacity(steps.len());

    for argv in steps {
        pb.set_message(format!("{}", argv.join(" ").blue()));
        tracing::debug!("[{}] shell {:?}", device.serial, argv);

        match transporter.shell_sync(&argv).await {
            Ok(output) => outputs.push(StepOutput { argv, output }),
            Err(e) => {
                tracing::error!("[{}] {} failed: {}", device.serial, argv.join(" "), e);
                finish_with_error(&pb, &e);
                return DeviceResult {
                    device,
                    result: Err(e),
                };
            }
        }
    }

    pb.finish_with_message(format!("{} {}", "●".green(), "Done".green()));
    DeviceResult {
        device,
        result: Ok(outputs),
    }
}

/// Push one local file to a single device.
pub(crate) async fn push_file_task(
    device: Device,
    transporter: Arc<dyn Transporter>,
    local_path: PathBuf,
    remote_path: String,
    pb: ProgressBar,
) -> DeviceResult {
    pb.set_message(format!("{}", "Pushing...".blue()));

    let result = transporter.push(&local_path, &remote_path).await;
    match &result {
        Ok(()) => pb.finish_with_message(format!("{} {}", "●".green(), "Pushed".green())),
        Err(e) => {
            tracing::error!("[{}] push failed: {}", device.serial, e);
            finish_with_error(&pb, e);
        }
    }

    let argv = vec![
        "push".to_string(),
        local_path.display().to_string(),
        remote_path,
    ];
    DeviceResult {
        device,
        result: result.map(|()| {
            vec![StepOutput {
                argv,
                output: Vec::new(),
            }]
        }),
    }
}
