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

//! Attached device model and enumeration.
//!
//! A [`Device`] is an immutable snapshot entry produced by a
//! [`DeviceRegistry`]. Devices can appear or vanish between two listings, so
//! consumers must not rely on ordinal identity across calls.

mod parser;
mod registry;

pub use parser::parse_device_list;
pub use registry::{AdbRegistry, DeviceRegistry};

use std::fmt;

/// Connection state as reported by `adb devices`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceState {
    Device,
    Offline,
    Unauthorized,
    Recovery,
    Sideload,
    Bootloader,
    NoPermissions,
    Other(String),
}

impl DeviceState {
    pub fn parse(state: &str) -> Self {
        match state {
            "device" => DeviceState::Device,
            "offline" => DeviceState::Offline,
            "unauthorized" => DeviceState::Unauthorized,
            "recovery" => DeviceState::Recovery,
            "sideload" => DeviceState::Sideload,
            "bootloader" => DeviceState::Bootloader,
            "no" => DeviceState::NoPermissions,
            other => DeviceState::Other(other.to_string()),
        }
    }

    /// Whether shell and transfer operations can be issued to the device.
    pub fn is_online(&self) -> bool {
        matches!(self, DeviceState::Device)
    }
}

impl fmt::Display for DeviceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceState::Device => write!(f, "device"),
            DeviceState::Offline => write!(f, "offline"),
            DeviceState::Unauthorized => write!(f, "unauthorized"),
            DeviceState::Recovery => write!(f, "recovery"),
            DeviceState::Sideload => write!(f, "sideload"),
            DeviceState::Bootloader => write!(f, "bootloader"),
            DeviceState::NoPermissions => write!(f, "no permissions"),
            DeviceState::Other(state) => write!(f, "{state}"),
        }
    }
}

/// How the device is attached to the adb server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionKind {
    Usb,
    Network,
    Emulator,
}

impl ConnectionKind {
    /// Infer the connection from the serial adb assigned to the device.
    ///
    /// Emulators are named `emulator-<console port>`; TCP devices are
    /// `host:port` or an mDNS service name.
    pub fn from_serial(serial: &str) -> Self {
        if serial.starts_with("emulator-") {
            ConnectionKind::Emulator
        } else if serial.contains(':') || serial.contains("._adb-tls-connect.") {
            ConnectionKind::Network
        } else {
            ConnectionKind::Usb
        }
    }
}

impl fmt::Display for ConnectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionKind::Usb => write!(f, "usb"),
            ConnectionKind::Network => write!(f, "network"),
            ConnectionKind::Emulator => write!(f, "emulator"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    /// USB serial, `host:port`, or emulator name
    pub serial: String,
    pub state: DeviceState,
    pub connection: ConnectionKind,
    /// `key:value` attributes from `adb devices -l`, in listing order
    pub attributes: Vec<(String, String)>,
}

impl Device {
    pub fn new(serial: impl Into<String>, state: DeviceState) -> Self {
        let serial = serial.into();
        Self {
            connection: ConnectionKind::from_serial(&serial),
            serial,
            state,
            attributes: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((key.into(), value.into()));
        self
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn model(&self) -> Option<&str> {
        self.attribute("model")
    }

    /// Human-readable one-line descriptor, as printed by `devices`.
    pub fn descriptor(&self) -> String {
        let mut line = format!("{}\t{}", self.serial, self.state);
        for (key, value) in &self.attributes {
            line.push(' ');
            line.push_str(key);
            line.push(':');
            line.push_str(value);
        }
        line
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.descriptor())
    }
}

/// Subset of devices a listing should return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeviceFilter {
    #[default]
    All,
    /// `-d`: USB-attached devices only
    UsbOnly,
    /// `-e`: emulators only
    EmulatorOnly,
}

impl DeviceFilter {
    /// Build the filter from the `-d`/`-e` switches. `-d` wins if both are set.
    pub fn from_flags(usb_only: bool, emulator_only: bool) -> Self {
        if usb_only {
            DeviceFilter::UsbOnly
        } else if emulator_only {
            DeviceFilter::EmulatorOnly
        } else {
            DeviceFilter::All
        }
    }

    pub fn matches(&self, device: &Device) -> bool {
        match self {
            DeviceFilter::All => true,
            DeviceFilter::UsbOnly => device.connection == ConnectionKind::Usb,
            DeviceFilter::EmulatorOnly => device.connection == ConnectionKind::Emulator,
        }
    }
}
