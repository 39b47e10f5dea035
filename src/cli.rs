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

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::target::TargetFlags;

#[derive(Parser, Debug)]
#[command(
    name = "madb",
    version,
    about = "Multi-device adb - run adb commands on one or every attached Android device",
    long_about = "madb sits in front of adb. It resolves which device a command applies to from the usual adb\ntargeting switches, then runs it on that device or fans it out to every attached device in parallel.\nUnrecognised commands are passed to a streaming adb shell.",
    after_help = "EXAMPLES:\n  Install on every device:      madb install app.apk\n  Uninstall everywhere:         madb uninstall com.example.app\n  Shell on one device:          madb -s EMULATOR1 shell ls /sdcard\n  Filtered logcat:              madb logcat --tags '*:W' com.example.app\n  Pass-through shell:           madb getprop ro.product.model"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[arg(
        short = 's',
        value_name = "SERIAL",
        help = "Direct the command to the device with the given serial number or qualifier"
    )]
    pub serial: Option<String>,

    #[arg(
        short = 'p',
        value_name = "PRODUCT",
        help = "Product name or path passed through to adb"
    )]
    pub product: Option<String>,

    #[arg(short = 'a', help = "Direct adb to listen on all interfaces for a connection")]
    pub all_interfaces: bool,

    #[arg(short = 'd', help = "Direct the command to the only connected USB device")]
    pub usb_only: bool,

    #[arg(short = 'e', help = "Direct the command to the only running emulator")]
    pub emulator_only: bool,

    #[arg(
        short = 'H',
        value_name = "HOST",
        help = "Name of the adb server host (default: localhost)"
    )]
    pub host: Option<String>,

    #[arg(
        short = 'P',
        value_name = "PORT",
        help = "Port of the adb server (default: 5037)"
    )]
    pub port: Option<String>,

    #[arg(
        long,
        value_name = "PATH",
        help = "Configuration file path [default: ~/.config/madb/config.yaml]"
    )]
    pub config: Option<PathBuf>,

    #[arg(
        short = 'v',
        long,
        action = clap::ArgAction::Count,
        help = "Increase verbosity (-v, -vv, -vvv)"
    )]
    pub verbose: u8,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    #[command(about = "Copy a local file to the device")]
    Push { local: PathBuf, remote: String },

    #[command(
        about = "Copy a file from the device",
        long_about = "Copies a file from the device to a local path.\n\nExit codes: 0 (copied), 2 (pull failed)"
    )]
    Pull { remote: String, local: PathBuf },

    #[command(
        about = "Install a package on every attached device",
        long_about = "Pushes the package to the staging directory on every device, then installs it and\nremoves the staged copy. Devices run independently of each other; a device whose push\nfails is reported and skipped.\n\nExit codes: 0 (all succeed), 1 (any failures)"
    )]
    Install { apk: PathBuf },

    #[command(
        about = "Uninstall a package from every attached device",
        after_help = "Examples:\n  madb uninstall com.example.app\n  madb uninstall com.example.app -k   # keep data and cache"
    )]
    Uninstall {
        package: String,
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    #[command(about = "List attached devices")]
    Devices,

    #[command(about = "List a directory on the device")]
    Ls { path: String },

    #[command(
        about = "Stream the device log, optionally filtered to packages",
        after_help = "Examples:\n  madb logcat --clear\n  madb logcat --tags '*:S ActivityManager:I' com.example.app:com.example.other"
    )]
    Logcat {
        #[arg(long, help = "Clear (flush) the entire log and exit")]
        clear: bool,

        #[arg(
            long,
            default_value = "",
            help = "Space separated list of tag filters, e.g. \"*:S MyTag:V\""
        )]
        tags: String,

        #[arg(
            long,
            num_args = 0..=1,
            require_equals = true,
            default_missing_value = "true",
            value_name = "BOOL",
            help = "Pretty print log lines [default: from config, true]"
        )]
        pretty_print: Option<bool>,

        #[arg(value_name = "PACKAGES", help = "Colon-separated package names")]
        packages: Option<String>,
    },

    #[command(about = "Save a screenshot of the device to a local PNG file")]
    Screencap { outfile: PathBuf },

    #[command(about = "Run a shell command and stream its output")]
    Shell {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    #[command(external_subcommand)]
    External(Vec<String>),
}

impl Cli {
    pub fn target_flags(&self) -> TargetFlags {
        TargetFlags {
            all_interfaces: self.all_interfaces,
            usb_only: self.usb_only,
            emulator_only: self.emulator_only,
            serial: self.serial.clone(),
            product: self.product.clone(),
            host: self.host.clone(),
            port: self.port.clone(),
        }
    }
}
