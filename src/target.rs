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

//! Target resolution: global switches to adb argument tokens and a transport.
//!
//! [`TargetFlags`] is built once from the command line and passed down
//! explicitly. The token order mirrors the order adb expects its own global
//! switches: `-a`, `-d`, `-e`, then `-p`, `-H`, `-P`, then whatever the user
//! typed after them.

use std::fmt;
use std::sync::Arc;

use crate::device::{DeviceFilter, DeviceRegistry};
use crate::transport::{LazyTransporter, Transporter};

/// Targeting switches shared by every sub-command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetFlags {
    /// `-a`: adb server listens on all interfaces
    pub all_interfaces: bool,
    /// `-d`: only the USB-attached device
    pub usb_only: bool,
    /// `-e`: only the emulator
    pub emulator_only: bool,
    /// `-s <serial>`
    pub serial: Option<String>,
    /// `-p <product name or path>`
    pub product: Option<String>,
    /// `-H <adb server host>`
    pub host: Option<String>,
    /// `-P <adb server port>`
    pub port: Option<String>,
}

impl TargetFlags {
    /// The serial to bind to, if a non-empty one was given.
    pub fn serial(&self) -> Option<&str> {
        non_empty(&self.serial)
    }

    pub fn device_filter(&self) -> DeviceFilter {
        DeviceFilter::from_flags(self.usb_only, self.emulator_only)
    }

    /// Every targeting switch except `-s`, in adb's order.
    pub fn switch_tokens(&self) -> Vec<String> {
        let mut tokens = Vec::with_capacity(9);
        push_switch(&mut tokens, self.all_interfaces, "-a");
        push_switch(&mut tokens, self.usb_only, "-d");
        push_switch(&mut tokens, self.emulator_only, "-e");
        push_value(&mut tokens, "-p", &self.product);
        push_value(&mut tokens, "-H", &self.host);
        push_value(&mut tokens, "-P", &self.port);
        tokens
    }

    /// Switches that select and configure the adb server but not a device.
    pub fn server_tokens(&self) -> Vec<String> {
        let mut tokens = Vec::with_capacity(7);
        push_switch(&mut tokens, self.all_interfaces, "-a");
        push_value(&mut tokens, "-p", &self.product);
        push_value(&mut tokens, "-H", &self.host);
        push_value(&mut tokens, "-P", &self.port);
        tokens
    }

    /// Switch tokens followed by the user's trailing arguments.
    pub fn target_args(&self, trailing: &[String]) -> Vec<String> {
        let mut args = self.switch_tokens();
        args.extend(trailing.iter().cloned());
        args
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn push_switch(tokens: &mut Vec<String>, enabled: bool, switch: &str) {
    if enabled {
        tokens.push(switch.to_string());
    }
}

fn push_value(tokens: &mut Vec<String>, switch: &str, value: &Option<String>) {
    if let Some(value) = non_empty(value) {
        tokens.push(switch.to_string());
        tokens.push(value.to_string());
    }
}

/// Outcome of resolving the targeting flags.
pub struct Resolved {
    /// Targeting switches (without `-s`) followed by the trailing arguments,
    /// as typed. Kept for logging only: `transporter` applies its own
    /// switches and never reads this.
    pub target_args: Vec<String>,
    pub transporter: Arc<dyn Transporter>,
}

impl fmt::Debug for Resolved {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolved")
            .field("target_args", &self.target_args)
            .field("target", self.transporter.target())
            .finish()
    }
}

pub struct Resolver {
    registry: Arc<dyn DeviceRegistry>,
}

impl Resolver {
    pub fn new(registry: Arc<dyn DeviceRegistry>) -> Self {
        Self { registry }
    }

    /// Build the token list and pick the transport.
    ///
    /// A serial yields a lazily bound single-device transport; nothing is
    /// looked up here. Without one, adb's default target is used.
    pub fn resolve(&self, flags: &TargetFlags, trailing: &[String]) -> Resolved {
        let target_args = flags.target_args(trailing);
        let transporter: Arc<dyn Transporter> = match flags.serial() {
            Some(serial) => Arc::new(LazyTransporter::new(serial, Arc::clone(&self.registry))),
            None => self.registry.default_transporter(&flags.switch_tokens()),
        };

        tracing::debug!(
            "Resolved target {} with args {:?}",
            transporter.target(),
            target_args
        );

        Resolved {
            target_args,
            transporter,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(value: &str) -> Option<String> {
        Some(value.to_string())
    }

    #[test]
    fn test_no_flags_yields_no_tokens() {
        assert!(TargetFlags::default().switch_tokens().is_empty());
    }

    #[test]
    fn test_full_token_order() {
        let flags = TargetFlags {
            all_interfaces: true,
            usb_only: true,
            emulator_only: true,
            serial: s("ignored-here"),
            product: s("sailfish"),
            host: s("10.0.0.2"),
            port: s("5038"),
        };

        assert_eq!(
            flags.target_args(&["uninstall".to_string(), "com.example".to_string()]),
            vec![
                "-a", "-d", "-e", "-p", "sailfish", "-H", "10.0.0.2", "-P", "5038", "uninstall",
                "com.example"
            ]
        );
    }

    #[test]
    fn test_order_is_independent_of_which_flags_are_set() {
        let flags = TargetFlags {
            emulator_only: true,
            port: s("5038"),
            ..Default::default()
        };
        assert_eq!(flags.switch_tokens(), vec!["-e", "-P", "5038"]);

        // Same input, same output, every time
        for _ in 0..10 {
            assert_eq!(flags.switch_tokens(), vec!["-e", "-P", "5038"]);
        }
    }

    #[test]
    fn test_empty_strings_are_unset() {
        let flags = TargetFlags {
            serial: s(""),
            host: s(""),
            product: s("p"),
            ..Default::default()
        };
        assert_eq!(flags.serial(), None);
        assert_eq!(flags.switch_tokens(), vec!["-p", "p"]);
    }

    #[test]
    fn test_server_tokens_drop_device_selectors() {
        let flags = TargetFlags {
            all_interfaces: true,
            usb_only: true,
            emulator_only: true,
            host: s("h"),
            ..Default::default()
        };
        assert_eq!(flags.server_tokens(), vec!["-a", "-H", "h"]);
        assert_eq!(flags.device_filter(), DeviceFilter::UsbOnly);
    }
}
