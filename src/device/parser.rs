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

//! Parser for `adb devices [-l]` output.

use super::{ConnectionKind, Device, DeviceState};

/// Parse the output of `adb devices -l` into device snapshots.
///
/// The banner line, blank lines and adb server chatter (`* daemon ...`,
/// version mismatch notices) are skipped. Entries keep listing order.
pub fn parse_device_list(output: &str) -> Vec<Device> {
    output.lines().filter_map(parse_device_line).collect()
}

fn parse_device_line(line: &str) -> Option<Device> {
    let line = line.trim();
    if line.is_empty()
        || line.starts_with("List of devices")
        || line.starts_with('*')
        || line.starts_with("adb ")
        || line.starts_with("adb:")
    {
        return None;
    }

    let mut tokens = line.split_whitespace();
    let serial = tokens.next()?;
    let state = DeviceState::parse(tokens.next()?);

    let mut device = Device::new(serial, state);
    for token in tokens {
        if let Some((key, value)) = token.split_once(':') {
            if is_attribute_key(key) && !value.is_empty() {
                device.attributes.push((key.to_string(), value.to_string()));
            }
        }
    }

    // `usb:` is only reported for USB transports and is more reliable than the serial
    if device.attribute("usb").is_some() {
        device.connection = ConnectionKind::Usb;
    }

    Some(device)
}

fn is_attribute_key(key: &str) -> bool {
    !key.is_empty() && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}
