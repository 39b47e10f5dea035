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

//! Device transport capability.
//!
//! A [`Transporter`] runs shell commands and transfers files against either
//! one specific device or whatever adb's own target selection picks
//! ([`TransportTarget::DefaultAll`]). It is shared as `Arc<dyn Transporter>`
//! so one handle can be used from many tasks.

mod adb;
mod lazy;

pub use adb::{AdbCommand, AdbTransporter};
pub use lazy::LazyTransporter;

use async_trait::async_trait;
use std::fmt;
use std::path::Path;

use crate::error::Result;
use crate::executor::StreamingPipe;

/// What a transporter is bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportTarget {
    /// One device, by serial or `host:port`
    SingleDevice(String),
    /// adb's default target, narrowed only by the global switches
    DefaultAll,
}

impl TransportTarget {
    pub fn serial(&self) -> Option<&str> {
        match self {
            TransportTarget::SingleDevice(serial) => Some(serial),
            TransportTarget::DefaultAll => None,
        }
    }
}

impl fmt::Display for TransportTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportTarget::SingleDevice(serial) => write!(f, "{serial}"),
            TransportTarget::DefaultAll => write!(f, "default device"),
        }
    }
}

#[async_trait]
pub trait Transporter: Send + Sync {
    fn target(&self) -> &TransportTarget;

    /// Run a shell command to completion and return its standard output.
    async fn shell_sync(&self, args: &[String]) -> Result<Vec<u8>>;

    /// Start a shell command and return its output as a live stream.
    async fn shell_stream(&self, args: &[String]) -> Result<StreamingPipe>;

    async fn push(&self, local: &Path, remote: &str) -> Result<()>;

    async fn pull(&self, remote: &str, local: &Path) -> Result<()>;
}
