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

//! In-memory registry and transporter that record every call.

#![allow(dead_code)]

use async_trait::async_trait;
use madb::commands::CommandContext;
use madb::config::Config;
use madb::device::{Device, DeviceFilter, DeviceRegistry, DeviceState};
use madb::error::{Error, Result};
use madb::executor::{SharedBuffer, StreamingPipe, SyncSink};
use madb::target::TargetFlags;
use madb::transport::{TransportTarget, Transporter};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ShellSync {
        serial: Option<String>,
        args: Vec<String>,
    },
    ShellStream {
        serial: Option<String>,
        args: Vec<String>,
    },
    Push {
        serial: Option<String>,
        local: PathBuf,
        remote: String,
    },
    Pull {
        serial: Option<String>,
        remote: String,
        local: PathBuf,
    },
}

impl Call {
    pub fn serial(&self) -> Option<&str> {
        match self {
            Call::ShellSync { serial, .. }
            | Call::ShellStream { serial, .. }
            | Call::Push { serial, .. }
            | Call::Pull { serial, .. } => serial.as_deref(),
        }
    }
}

#[derive(Default)]
struct State {
    devices: Vec<Device>,
    calls: Vec<Call>,
    failing_shell: HashSet<(String, String)>,
    failing_push: HashSet<String>,
    delays: Vec<(String, Duration)>,
    list_calls: usize,
}

/// Registry over a fixed device list; transporters share its call log.
#[derive(Clone, Default)]
pub struct MockRegistry {
    state: Arc<Mutex<State>>,
}

impl MockRegistry {
    pub fn with_devices(serials: &[&str]) -> Self {
        let registry = Self::default();
        for serial in serials {
            registry.add_device(Device::new(*serial, DeviceState::Device));
        }
        registry
    }

    pub fn add_device(&self, device: Device) {
        self.state.lock().unwrap().devices.push(device);
    }

    /// Make `command` (space-joined argv) fail on `serial`.
    pub fn fail_shell(&self, serial: &str, command: &str) {
        self.state
            .lock()
            .unwrap()
            .failing_shell
            .insert((serial.to_string(), command.to_string()));
    }

    pub fn fail_push(&self, serial: &str) {
        self.state
            .lock()
            .unwrap()
            .failing_push
            .insert(serial.to_string());
    }

    /// Slow every call on `serial` down by `delay`.
    pub fn delay(&self, serial: &str, delay: Duration) {
        self.state
            .lock()
            .unwrap()
            .delays
            .push((serial.to_string(), delay));
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn calls_for(&self, serial: &str) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|call| call.serial() == Some(serial))
            .collect()
    }

    pub fn list_calls(&self) -> usize {
        self.state.lock().unwrap().list_calls
    }

    fn transporter_for(&self, target: TransportTarget) -> Arc<dyn Transporter> {
        Arc::new(MockTransporter {
            target,
            registry: self.clone(),
        })
    }
}

#[async_trait]
impl DeviceRegistry for MockRegistry {
    async fn list(&self, filter: DeviceFilter) -> Result<Vec<Device>> {
        let mut state = self.state.lock().unwrap();
        state.list_calls += 1;
        Ok(state
            .devices
            .iter()
            .filter(|device| filter.matches(device))
            .cloned()
            .collect())
    }

    fn transporter(&self, device: &Device) -> Arc<dyn Transporter> {
        self.transporter_for(TransportTarget::SingleDevice(device.serial.clone()))
    }

    fn default_transporter(&self, _switches: &[String]) -> Arc<dyn Transporter> {
        self.transporter_for(TransportTarget::DefaultAll)
    }
}

pub struct MockTransporter {
    target: TransportTarget,
    registry: MockRegistry,
}

impl MockTransporter {
    fn serial(&self) -> Option<String> {
        self.target.serial().map(str::to_string)
    }

    async fn record(&self, call: Call) {
        let delay = {
            let state = self.registry.state.lock().unwrap();
            state
                .delays
                .iter()
                .find(|(serial, _)| Some(serial.as_str()) == self.target.serial())
                .map(|(_, delay)| *delay)
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.registry.state.lock().unwrap().calls.push(call);
    }

    fn shell_fails(&self, args: &[String]) -> bool {
        let key = (
            self.target.serial().unwrap_or_default().to_string(),
            args.join(" "),
        );
        self.registry
            .state
            .lock()
            .unwrap()
            .failing_shell
            .contains(&key)
    }
}

#[async_trait]
impl Transporter for MockTransporter {
    fn target(&self) -> &TransportTarget {
        &self.target
    }

    async fn shell_sync(&self, args: &[String]) -> Result<Vec<u8>> {
        self.record(Call::ShellSync {
            serial: self.serial(),
            args: args.to_vec(),
        })
        .await;
        if self.shell_fails(args) {
            return Err(Error::transport(
                format!("adb shell {}", args.join(" ")),
                "device offline",
            ));
        }
        Ok(format!("{}\n", args.join(" ")).into_bytes())
    }

    async fn shell_stream(&self, args: &[String]) -> Result<StreamingPipe> {
        self.record(Call::ShellStream {
            serial: self.serial(),
            args: args.to_vec(),
        })
        .await;
        let (tx, pipe) = StreamingPipe::channel(4);
        let output = format!("{}\n", args.join(" "));
        tokio::spawn(async move {
            let _ = tx.send(output).await;
        });
        Ok(pipe)
    }

    async fn push(&self, local: &Path, remote: &str) -> Result<()> {
        self.record(Call::Push {
            serial: self.serial(),
            local: local.to_path_buf(),
            remote: remote.to_string(),
        })
        .await;
        let fails = self
            .target
            .serial()
            .is_some_and(|serial| self.registry.state.lock().unwrap().failing_push.contains(serial));
        if fails {
            return Err(Error::transport(
                format!("adb push {}", local.display()),
                "remote write failed",
            ));
        }
        Ok(())
    }

    async fn pull(&self, remote: &str, local: &Path) -> Result<()> {
        self.record(Call::Pull {
            serial: self.serial(),
            remote: remote.to_string(),
            local: local.to_path_buf(),
        })
        .await;
        Ok(())
    }
}

pub fn argv(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|part| part.to_string()).collect()
}

/// Command context over `registry` that captures everything printed.
pub fn context(registry: &MockRegistry, flags: TargetFlags) -> (CommandContext, SharedBuffer) {
    let (sink, buffer) = SyncSink::buffer();
    let ctx = CommandContext::new(Config::default(), flags, Arc::new(registry.clone()), sink);
    (ctx, buffer)
}
