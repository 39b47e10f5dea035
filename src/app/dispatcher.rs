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

//! Command dispatcher for routing CLI commands to their implementations

use anyhow::Result;
use madb::{
    cli::{Cli, Commands},
    commands::{
        devices::list_devices,
        install::{install, uninstall},
        logcat::{logcat, LogcatParams},
        shell::shell,
        transfer::{ls, pull, push, screencap},
        CommandContext,
    },
    error::{exit_code, EXIT_PULL_FAILED},
};

/// Dispatch commands to their appropriate handlers
pub async fn dispatch_command(cli: &Cli, ctx: &CommandContext) -> Result<()> {
    let Some(command) = &cli.command else {
        anyhow::bail!("No command specified. Try 'madb --help'.");
    };

    match command {
        Commands::Push { local, remote } => push(ctx, local, remote).await,
        Commands::Pull { remote, local } => pull(ctx, remote, local).await,
        Commands::Install { apk } => install(ctx, apk).await,
        Commands::Uninstall { package, args } => uninstall(ctx, package, args).await,
        Commands::Devices => list_devices(ctx).await,
        Commands::Ls { path } => ls(ctx, path).await,
        Commands::Logcat {
            clear,
            tags,
            pretty_print,
            packages,
        } => {
            logcat(
                ctx,
                LogcatParams {
                    clear: *clear,
                    tags,
                    pretty_print: *pretty_print,
                    packages: packages.as_deref(),
                },
            )
            .await
        }
        Commands::Screencap { outfile } => screencap(ctx, outfile).await,
        Commands::Shell { args } | Commands::External(args) => shell(ctx, args).await,
    }
}

/// Exit status for a failed command.
pub fn failure_exit_code(command: Option<&Commands>, err: &anyhow::Error) -> i32 {
    match command {
        Some(Commands::Pull { .. }) => EXIT_PULL_FAILED,
        _ => exit_code(err),
    }
}
