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

use clap::Parser;
use madb::{cli::Cli, error::exit_code};

mod app;

use app::{
    dispatcher::{dispatch_command, failure_exit_code},
    initialization::initialize_app,
};

/// Show concise usage message (like adb)
fn show_usage() {
    println!("usage: madb [-s SERIAL] [-p PRODUCT] [-a] [-d|-e] [-H HOST] [-P PORT]");
    println!("            [-v...] [--config PATH] COMMAND [ARGS...]");
    println!();
    println!("       madb devices | push | pull | install | uninstall | ls");
    println!("       madb logcat | screencap | shell | <any shell command>");
    println!();
    println!("For more information, try 'madb --help'");
}

#[tokio::main]
async fn main() {
    if std::env::args().len() == 1 {
        show_usage();
        std::process::exit(0);
    }

    let cli = Cli::parse();

    let ctx = match initialize_app(&cli).await {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(exit_code(&e));
        }
    };

    if let Err(e) = dispatch_command(&cli, &ctx).await {
        eprintln!("Error: {e:#}");
        std::process::exit(failure_exit_code(cli.command.as_ref(), &e));
    }
}
