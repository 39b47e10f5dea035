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

//! Application initialization and configuration loading

use anyhow::Result;
use madb::{
    cli::Cli,
    commands::CommandContext,
    config::Config,
    device::{AdbRegistry, DeviceRegistry},
    executor::SyncSink,
    transport::AdbCommand,
    utils::{init_logging, is_tty},
};
use std::sync::Arc;

/// Initialize logging, load the configuration and wire up the adb backend.
pub async fn initialize_app(cli: &Cli) -> Result<CommandContext> {
    init_logging(cli.verbose);

    let config = Config::load_with_priority(cli.config.as_deref()).await?;
    tracing::debug!("Using adb at {:?}", config.adb_path);

    let flags = cli.target_flags();

    // -d/-e narrow device listings through DeviceFilter; only the
    // server-selecting switches reach every adb call
    let adb = AdbCommand::new(&config.adb_path)
        .with_global_args(flags.server_tokens())
        .with_stream_buffer(config.stream_buffer);
    let registry: Arc<dyn DeviceRegistry> = Arc::new(AdbRegistry::new(adb));

    Ok(CommandContext::new(config, flags, registry, SyncSink::stdout()).with_progress(is_tty()))
}
