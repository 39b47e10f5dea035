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

//! Result types for fan-out operations.

use owo_colors::{OwoColorize, Stream::Stdout};
use std::io;

use super::output_sync::{DeviceOutputWriter, SyncSink};
use crate::device::Device;
use crate::error::Result;

/// Output of one completed step on one device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepOutput {
    pub argv: Vec<String>,
    pub output: Vec<u8>,
}

/// Outcome of a whole job on a single device.
///
/// A failing step ends the device's job, so `Ok` means every step ran.
#[derive(Debug)]
pub struct DeviceResult {
    pub device: Device,
    pub result: Result<Vec<StepOutput>>,
}

impl DeviceResult {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    /// Concatenated output of every step.
    pub fn output(&self) -> Vec<u8> {
        match &self.result {
            Ok(steps) => steps.iter().flat_map(|s| s.output.iter().copied()).collect(),
            Err(_) => Vec::new(),
        }
    }

    /// Print the device's output prefixed with its serial, or its error.
    pub fn print_output(&self, sink: &SyncSink) -> io::Result<()> {
        match &self.result {
            Ok(_) => {
                let output = self.output();
                DeviceOutputWriter::new(sink.clone(), &self.device.serial)
                    .write_lines(&String::from_utf8_lossy(&output))
            }
            Err(_) => self.print_summary(sink, ""),
        }
    }

    /// One status line per device, followed by the error chain on failure.
    pub fn print_summary(&self, sink: &SyncSink, success_message: &str) -> io::Result<()> {
        match &self.result {
            Ok(_) => sink.println(&format!(
                "{} {}: {}",
                "●".if_supports_color(Stdout, |t| t.green()),
                self.device.serial.if_supports_color(Stdout, |t| t.bold()),
                success_message.if_supports_color(Stdout, |t| t.green())
            )),
            Err(e) => {
                let mut lines = vec![format!(
                    "{} {}: {}",
                    "●".if_supports_color(Stdout, |t| t.red()),
                    self.device.serial.if_supports_color(Stdout, |t| t.bold()),
                    "Failed".if_supports_color(Stdout, |t| t.red())
                )];
                let mut source: Option<&dyn std::error::Error> = Some(e);
                while let Some(err) = source {
                    lines.push(format!("    {err}"));
                    source = err.source();
                }
                sink.print_lines(lines.iter().map(String::as_str))
            }
        }
    }
}

/// Aggregate result of a fan-out.
#[derive(Debug)]
pub enum DispatchOutcome {
    /// The device list was empty; nothing was run.
    NoDevices,
    /// One result per device, in the order devices were given.
    Completed(Vec<DeviceResult>),
}

impl DispatchOutcome {
    pub const NO_DEVICES_MESSAGE: &'static str = "No devices found";

    pub fn is_no_devices(&self) -> bool {
        matches!(self, DispatchOutcome::NoDevices)
    }

    pub fn results(&self) -> &[DeviceResult] {
        match self {
            DispatchOutcome::NoDevices => &[],
            DispatchOutcome::Completed(results) => results,
        }
    }

    pub fn into_results(self) -> Vec<DeviceResult> {
        match self {
            DispatchOutcome::NoDevices => Vec::new(),
            DispatchOutcome::Completed(results) => results,
        }
    }

    pub fn success_count(&self) -> usize {
        self.results().iter().filter(|r| r.is_success()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.results().len() - self.success_count()
    }

    /// Print every device's output, or the no-devices line.
    pub fn print_outputs(&self, sink: &SyncSink) -> io::Result<()> {
        if self.is_no_devices() {
            return sink.println(Self::NO_DEVICES_MESSAGE);
        }
        for result in self.results() {
            result.print_output(sink)?;
        }
        Ok(())
    }
}
