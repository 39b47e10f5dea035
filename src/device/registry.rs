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

//! Device registry: point-in-time device snapshots and per-device transports.

use async_trait::async_trait;
use std::sync::Arc;

use super::{parse_device_list, Device, DeviceFilter};
use crate::error::{Error, Result};
use crate::transport::{AdbCommand, AdbTransporter, TransportTarget, Transporter};

#[async_trait]
pub trait DeviceRegistry: Send + Sync {
    /// Snapshot of every visible device matching `filter`, in any state.
    ///
    /// Order is stable within one snapshot only.
    async fn list(&self, filter: DeviceFilter) -> Result<Vec<Device>>;

    /// Look up a device by serial.
    async fn find(&self, serial: &str) -> Result<Device> {
        self.list(DeviceFilter::All)
            .await?
            .into_iter()
            .find(|device| device.serial == serial)
            .ok_or_else(|| Error::DeviceNotFound(serial.to_string()))
    }

    /// Snapshot restricted to devices that can accept commands.
    async fn online(&self, filter: DeviceFilter) -> Result<Vec<Device>> {
        let devices = self.list(filter).await?;
        let (online, skipped): (Vec<_>, Vec<_>) =
            devices.into_iter().partition(|d| d.state.is_online());
        for device in &skipped {
            tracing::info!("Skipping {} ({})", device.serial, device.state);
        }
        Ok(online)
    }

    /// Transporter bound to a device from a snapshot.
    fn transporter(&self, device: &Device) -> Arc<dyn Transporter>;

    /// Transporter for adb's own target selection, narrowed by `switches`.
    fn default_transporter(&self, switches: &[String]) -> Arc<dyn Transporter>;
}

/// Registry that asks the adb server via `adb devices -l`.
#[derive(Debug, Clone)]
pub struct AdbRegistry {
    adb: AdbCommand,
}

impl AdbRegistry {
    /// `adb` should carry only server-selecting switches; device-selecting
    /// ones are applied through [`DeviceFilter`].
    pub fn new(adb: AdbCommand) -> Self {
        Self { adb }
    }
}

#[async_trait]
impl DeviceRegistry for AdbRegistry {
    async fn list(&self, filter: DeviceFilter) -> Result<Vec<Device>> {
        let output = self.adb.output(None, &["devices", "-l"]).await?;
        let devices: Vec<Device> = parse_device_list(&String::from_utf8_lossy(&output))
            .into_iter()
            .filter(|device| filter.matches(device))
            .collect();
        tracing::debug!("Registry snapshot: {} device(s)", devices.len());
        Ok(devices)
    }

    fn transporter(&self, device: &Device) -> Arc<dyn Transporter> {
        Arc::new(AdbTransporter::new(
            self.adb.clone(),
            TransportTarget::SingleDevice(device.serial.clone()),
        ))
    }

    fn default_transporter(&self, switches: &[String]) -> Arc<dyn Transporter> {
        Arc::new(AdbTransporter::new(
            self.adb.clone().with_global_args(switches.to_vec()),
            TransportTarget::DefaultAll,
        ))
    }
}
