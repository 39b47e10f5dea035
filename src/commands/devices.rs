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

use anyhow::Result;

use super::CommandContext;
use crate::executor::DispatchOutcome;

pub const DEVICES_BANNER: &str = "List of devices attached";

/// Print every visible device, whatever its state.
pub async fn list_devices(ctx: &CommandContext) -> Result<()> {
    let devices = ctx.registry.list(ctx.flags.device_filter()).await?;

    let mut lines = vec![DEVICES_BANNER.to_string()];
    if devices.is_empty() {
        lines.push(DispatchOutcome::NO_DEVICES_MESSAGE.to_string());
    } else {
        lines.extend(devices.iter().map(|device| device.descriptor()));
        lines.push(String::new());
    }

    ctx.sink.print_lines(lines.iter().map(String::as_str))?;
    Ok(())
}
