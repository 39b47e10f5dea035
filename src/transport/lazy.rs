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

//! Serial-bound transporter that looks the device up on first use.

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::OnceCell;

use super::{TransportTarget, Transporter};
use crate::device::DeviceRegistry;
use crate::error::{Error, Result};
use crate::executor::StreamingPipe;

/// A [`TransportTarget::SingleDevice`] handle whose registry lookup is
/// deferred until the first operation.
///
/// Constructing one never touches the registry, so a bad serial surfaces as
/// [`crate::error::Error::DeviceNotFound`] from the first call instead of at
/// resolution time. A failed lookup is not cached; the next call retries.
pub struct LazyTransporter {
    target: TransportTarget,
    registry: Arc<dyn DeviceRegistry>,
    bound: OnceCell<Arc<dyn Transporter>>,
}

impl LazyTransporter {
    pub fn new(serial: impl Into<String>, registry: Arc<dyn DeviceRegistry>) -> Self {
        Self {
            target: TransportTarget::SingleDevice(serial.into()),
            registry,
            bound: OnceCell::new(),
        }
    }

    /// Whether the registry lookup has already succeeded.
    pub fn is_bound(&self) -> bool {
        self.bound.initialized()
    }

    async fn bind(&self) -> Result<&Arc<dyn Transporter>> {
        self.bound
            .get_or_try_init(|| async {
                let serial = self.target.serial().unwrap_or_default();
                let device = self.registry.find(serial).await?;
                if !device.state.is_online() {
                    tracing::warn!("Device {} is {}", device.serial, device.state);
                }
                tracing::debug!("Bound transport to {}", device.serial);
                Ok::<_, Error>(self.registry.transporter(&device))
            })
            .await
    }
}

#[async_trait]
impl Transporter for LazyTransporter {
    fn target(&self) -> &TransportTarget {
        &self.target
    }

    async fn shell_sync(&self, args: &[String]) -> Result<Vec<u8>> {
        self.bind().await?.shell_sync(args).await
    }

    async fn shell_stream(&self, args: &[String]) -> Result<StreamingPipe> {
        self.bind().await?.shell_stream(args).await
    }

    async fn push(&self, local: &Path, remote: &str) -> Result<()> {
        self.bind().await?.push(local, remote).await
    }

    async fn pull(&self, remote: &str, local: &Path) -> Result<()> {
        self.bind().await?.pull(remote, local).await
    }
}
