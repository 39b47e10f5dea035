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

//! Error types and process exit codes.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Exit code when at least one device in a fan-out failed.
pub const EXIT_PARTIAL_FAILURE: i32 = 1;
/// Exit code reserved for `pull` failures.
pub const EXIT_PULL_FAILED: i32 = 2;
pub const EXIT_DEVICE_NOT_FOUND: i32 = 3;
pub const EXIT_TRANSPORT: i32 = 4;
pub const EXIT_LOCAL_IO: i32 = 5;
pub const EXIT_CONFIG: i32 = 6;

/// Errors produced while resolving targets and talking to devices.
#[derive(Debug, Error)]
pub enum Error {
    /// `-s` named a serial the registry does not know about
    #[error("device '{0}' not found")]
    DeviceNotFound(String),

    /// The registry snapshot was empty where a device was required
    #[error("no devices connected")]
    NoDevicesConnected,

    /// The underlying shell or transfer operation failed
    #[error("{context}: {message}")]
    TransportIo { context: String, message: String },

    /// Opening, reading or creating a local file failed
    #[error("local file '{}': {source}", path.display())]
    LocalIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl Error {
    pub fn transport(context: impl Into<String>, message: impl Into<String>) -> Self {
        Error::TransportIo {
            context: context.into(),
            message: message.into(),
        }
    }

    pub fn local_io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::LocalIo {
            path: path.into(),
            source,
        }
    }

    /// Process exit code for this failure class.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::DeviceNotFound(_) | Error::NoDevicesConnected => EXIT_DEVICE_NOT_FOUND,
            Error::TransportIo { .. } => EXIT_TRANSPORT,
            Error::LocalIo { .. } => EXIT_LOCAL_IO,
            Error::Config(_) => EXIT_CONFIG,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Map an `anyhow` error coming out of a command to an exit code.
///
/// Falls back to [`EXIT_PARTIAL_FAILURE`] when no [`Error`] is found in the chain.
pub fn exit_code(err: &anyhow::Error) -> i32 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<Error>())
        .map(Error::exit_code)
        .unwrap_or(EXIT_PARTIAL_FAILURE)
}
