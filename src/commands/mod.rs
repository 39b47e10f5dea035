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

//! Sub-command implementations.
//!
//! Every command writes through the [`SyncSink`] in its [`CommandContext`] so
//! output from concurrent device tasks never interleaves mid-line.

pub mod devices;
pub mod install;
pub mod logcat;
pub mod shell;
pub mod transfer;

use anyhow::Result;
use std::sync::Arc;

use crate::config::Config;
use crate::device::{Device, DeviceRegistry};
use crate::executor::{DispatchEngine, DispatchOutcome, SyncSink};
use crate::target::{Resolved, Resolver, TargetFlags};

/// Everything a command needs, built once per invocation.
pub struct CommandContext {
    pub config: Config,
    pub flags: TargetFlags,
    pub registry: Arc<dyn DeviceRegistry>,
    pub engine: DispatchEngine,
    pub sink: SyncSink,
}

impl CommandContext {
    pub fn new(
        config: Config,
        flags: TargetFlags,
        registry: Arc<dyn DeviceRegistry>,
        sink: SyncSink,
    ) -> Self {
        let engine = DispatchEngine::new(Arc::clone(&registry));
        Self {
            config,
            flags,
            registry,
            engine,
            sink,
        }
    }

    pub fn with_progress(mut self, progress: bool) -> Self {
        self.engine = self.engine.with_progress(progress);
        self
    }

    /// Resolve the targeting flags for a single-transport command.
    pub fn resolve(&self, trailing: &[String]) -> Resolved {
        Resolver::new(Arc::clone(&self.registry)).resolve(&self.flags, trailing)
    }

    /// Devices a fan-out command should reach.
    ///
    /// With `-s` this is exactly that device, which must exist. Otherwise it is
    /// every online device matching `-d`/`-e`.
    pub async fn target_devices(&self) -> crate::error::Result<Vec<Device>> {
        match self.flags.serial() {
            Some(serial) => {
                let device = self.registry.find(serial).await?;
                if !device.state.is_online() {
                    tracing::warn!("{} is {}, skipping", device.serial, device.state);
                    return Ok(Vec::new());
                }
                Ok(vec![device])
            }
            None => self.registry.online(self.flags.device_filter()).await,
        }
    }
}

impl std::fmt::Debug for CommandContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandContext")
            .field("config", &self.config)
            .field("flags", &self.flags)
            .field("engine", &self.engine)
            .finish_non_exhaustive()
    }
}

/// Print a fan-out's per-device output and fail if any device failed.
pub(crate) fn report_outcome(sink: &SyncSink, outcome: &DispatchOutcome) -> Result<()> {
    outcome.print_outputs(sink)?;

    let failed = outcome.failed_count();
    if failed > 0 {
        anyhow::bail!(
            "{} of {} devices failed",
            failed,
            outcome.results().len()
        );
    }
    Ok(())
}

