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

//! Core dispatch engine implementation.

use futures::future::join_all;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use crate::device::{Device, DeviceRegistry};
use crate::error::{Error, Result};
use crate::transport::Transporter;

use super::execution_strategy::{
    create_multi_progress, create_progress_style, execute_steps_task, push_file_task,
    setup_progress_bar,
};
use super::result_types::{DeviceResult, DispatchOutcome};
use super::stream::StreamingPipe;

/// Fans a job out to a device snapshot and joins the per-device results.
pub struct DispatchEngine {
    registry: Arc<dyn DeviceRegistry>,
    progress: bool,
}

impl DispatchEngine {
    pub fn new(registry: Arc<dyn DeviceRegistry>) -> Self {
        Self {
            registry,
            progress: false,
        }
    }

    /// Draw a spinner per device while the job runs.
    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    pub fn registry(&self) -> &Arc<dyn DeviceRegistry> {
        &self.registry
    }

    /// Run a single shell command on every device.
    pub async fn run_on_all(&self, devices: &[Device], argv: &[String]) -> DispatchOutcome {
        self.run_sequence_on_all(devices, &[argv.to_vec()]).await
    }

    /// Run `steps` in order on every device, devices concurrently.
    pub async fn run_sequence_on_all(
        &self,
        devices: &[Device],
        steps: &[Vec<String>],
    ) -> DispatchOutcome {
        let style = create_progress_style();
        self.fan_out(devices, |device, transporter, multi_progress| {
            let pb = setup_progress_bar(multi_progress, &device, style.clone(), "Waiting...");
            execute_steps_task(device, transporter, steps.to_vec(), pb)
        })
        .await
    }

    /// Push one local file to the same remote path on every device.
    pub async fn push_to_all(
        &self,
        devices: &[Device],
        local_path: &Path,
        remote_path: &str,
    ) -> DispatchOutcome {
        let style = create_progress_style();
        self.fan_out(devices, |device, transporter, multi_progress| {
            let pb = setup_progress_bar(multi_progress, &device, style.clone(), "Connecting...");
            push_file_task(
                device,
                transporter,
                local_path.to_path_buf(),
                remote_path.to_string(),
                pb,
            )
        })
        .await
    }

    /// Start a streaming shell on a single transport.
    pub async fn run_streaming(
        &self,
        transporter: &dyn Transporter,
        argv: &[String],
    ) -> Result<StreamingPipe> {
        tracing::debug!("Streaming {:?} via {}", argv, transporter.target());
        transporter.shell_stream(argv).await
    }

    async fn fan_out<F, Fut>(&self, devices: &[Device], make_task: F) -> DispatchOutcome
    where
        F: Fn(Device, Arc<dyn Transporter>, &indicatif::MultiProgress) -> Fut,
        Fut: Future<Output = DeviceResult> + Send + 'static,
    {
        if devices.is_empty() {
            tracing::debug!("No devices to dispatch to");
            return DispatchOutcome::NoDevices;
        }

        let multi_progress = create_multi_progress(self.progress);

        let tasks: Vec<_> = devices
            .iter()
            .map(|device| {
                let transporter = self.registry.transporter(device);
                tokio::spawn(make_task(device.clone(), transporter, &multi_progress))
            })
            .collect();

        let results = join_all(tasks).await;
        DispatchOutcome::Completed(Self::collect_results(devices, results))
    }

    fn collect_results(
        devices: &[Device],
        results: Vec<std::result::Result<DeviceResult, tokio::task::JoinError>>,
    ) -> Vec<DeviceResult> {
        devices
            .iter()
            .zip(results)
            .map(|(device, result)| match result {
                Ok(device_result) => device_result,
                Err(e) => {
                    tracing::error!("Task failed for device {}: {}", device.serial, e);
                    DeviceResult {
                        device: device.clone(),
                        result: Err(Error::transport(
                            device.serial.clone(),
                            format!("task execution failed: {e}"),
                        )),
                    }
                }
            })
            .collect()
    }
}

impl std::fmt::Debug for DispatchEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchEngine")
            .field("progress", &self.progress)
            .finish_non_exhaustive()
    }
}
