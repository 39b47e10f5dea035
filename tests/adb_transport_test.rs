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

//! Commands driven through the real adb transport, with `adb` replaced by a
//! shell script that fails the way adb does.

#![cfg(unix)]

use madb::commands::logcat::{logcat, LogcatParams};
use madb::commands::{shell::shell, transfer, CommandContext};
use madb::config::Config;
use madb::device::AdbRegistry;
use madb::error::{exit_code, EXIT_DEVICE_NOT_FOUND, EXIT_TRANSPORT};
use madb::executor::{SharedBuffer, SyncSink};
use madb::target::TargetFlags;
use madb::transport::AdbCommand;
use std::os::unix::fs::PermissionsExt;
use std::sync::Arc;
use tempfile::TempDir;

/// Answers `adb devices -l` with a single emulator.
const ONE_DEVICE: &str = r#"if [ "$1" = devices ]; then printf 'List of devices attached\nemu\tdevice product:sdk\n'; exit 0; fi"#;

const NO_DEVICES: &str = "echo 'adb: error: no devices/emulators found' >&2; exit 1";

/// Install an executable `adb` script in `dir`.
fn fake_adb(dir: &TempDir, body: &str) -> AdbCommand {
    let path = dir.path().join("adb");
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    AdbCommand::new(path)
}

fn adb_context(adb: AdbCommand, flags: TargetFlags) -> (CommandContext, SharedBuffer) {
    let (sink, buffer) = SyncSink::buffer();
    let registry = Arc::new(AdbRegistry::new(adb));
    let ctx = CommandContext::new(Config::default(), flags, registry, sink);
    (ctx, buffer)
}

fn on_emu() -> TargetFlags {
    TargetFlags {
        serial: Some("emu".to_string()),
        ..Default::default()
    }
}

fn argv(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|part| part.to_string()).collect()
}

#[tokio::test]
async fn test_shell_without_devices_exits_device_not_found() {
    let dir = TempDir::new().unwrap();
    let (ctx, buffer) = adb_context(fake_adb(&dir, NO_DEVICES), TargetFlags::default());

    let err = shell(&ctx, &argv(&["ls"])).await.unwrap_err();

    assert_eq!(exit_code(&err), EXIT_DEVICE_NOT_FOUND);
    assert_eq!(buffer.to_string_lossy(), "");
}

#[tokio::test]
async fn test_shell_failure_after_output_exits_transport() {
    let dir = TempDir::new().unwrap();
    let body = format!("{ONE_DEVICE}\necho partial; echo 'error: device offline' >&2; exit 1");
    let (ctx, buffer) = adb_context(fake_adb(&dir, &body), on_emu());

    let err = shell(&ctx, &argv(&["ls"])).await.unwrap_err();

    assert_eq!(exit_code(&err), EXIT_TRANSPORT);
    assert!(format!("{err:#}").contains("device offline"));
    assert_eq!(buffer.to_string_lossy(), "partial\n");
}

#[tokio::test]
async fn test_shell_clean_exit_succeeds() {
    let dir = TempDir::new().unwrap();
    let (ctx, buffer) = adb_context(fake_adb(&dir, r#"echo "$@""#), TargetFlags::default());

    shell(&ctx, &argv(&["ls", "/sdcard"])).await.unwrap();

    assert_eq!(buffer.to_string_lossy(), "shell ls /sdcard\n");
}

#[tokio::test]
async fn test_unknown_serial_exits_device_not_found() {
    let dir = TempDir::new().unwrap();
    let body = format!("{ONE_DEVICE}\nexit 1");
    let flags = TargetFlags {
        serial: Some("ghost".to_string()),
        ..Default::default()
    };
    let (ctx, _buffer) = adb_context(fake_adb(&dir, &body), flags);

    let err = shell(&ctx, &argv(&["ls"])).await.unwrap_err();

    assert_eq!(exit_code(&err), EXIT_DEVICE_NOT_FOUND);
}

#[tokio::test]
async fn test_logcat_failure_exits_transport() {
    let dir = TempDir::new().unwrap();
    let body = format!(
        "{ONE_DEVICE}\necho '10-18 12:00:00.000   100   100 I Tag: bye'; echo 'error: closed' >&2; exit 1"
    );
    let (ctx, buffer) = adb_context(fake_adb(&dir, &body), on_emu());

    let params = LogcatParams {
        clear: false,
        tags: "",
        pretty_print: Some(false),
        packages: None,
    };
    let err = logcat(&ctx, params).await.unwrap_err();

    assert_eq!(exit_code(&err), EXIT_TRANSPORT);
    assert!(buffer.to_string_lossy().contains("bye"));
}

#[tokio::test]
async fn test_ls_failure_prints_nothing() {
    let dir = TempDir::new().unwrap();
    let body = "echo 'ls: /nope: No such file or directory' >&2; exit 1";
    let (ctx, buffer) = adb_context(fake_adb(&dir, body), TargetFlags::default());

    let err = transfer::ls(&ctx, "/nope").await.unwrap_err();

    assert_eq!(exit_code(&err), EXIT_TRANSPORT);
    assert!(format!("{err:#}").contains("No such file or directory"));
    assert_eq!(buffer.to_string_lossy(), "");
}

#[tokio::test]
async fn test_screencap_failure_leaves_no_file() {
    let dir = TempDir::new().unwrap();
    let outfile = dir.path().join("screen.png");
    let (ctx, _buffer) = adb_context(fake_adb(&dir, NO_DEVICES), TargetFlags::default());

    let err = transfer::screencap(&ctx, &outfile).await.unwrap_err();

    assert_eq!(exit_code(&err), EXIT_DEVICE_NOT_FOUND);
    assert!(!outfile.exists());
}

#[tokio::test]
async fn test_pull_failure_keeps_existing_file() {
    let dir = TempDir::new().unwrap();
    let local = dir.path().join("important.txt");
    std::fs::write(&local, "precious data").unwrap();
    let body = format!("{ONE_DEVICE}\necho 'adb: error: remote object does not exist' >&2; exit 1");
    let (ctx, _buffer) = adb_context(fake_adb(&dir, &body), on_emu());

    let err = transfer::pull(&ctx, "/sdcard/missing.txt", &local)
        .await
        .unwrap_err();

    assert_eq!(exit_code(&err), EXIT_TRANSPORT);
    assert_eq!(std::fs::read_to_string(&local).unwrap(), "precious data");
}
