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

//! Configuration file loading.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::error::Error;
use crate::executor::DEFAULT_STREAM_BUFFER;
use crate::logcat::DEFAULT_TAG_WIDTH;

pub const DEFAULT_INSTALL_TEMP_DIR: &str = "/data/local/tmp";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// adb executable, looked up on PATH unless absolute.
    pub adb_path: PathBuf,

    /// On-device directory that `install` stages packages in.
    pub install_temp_dir: String,

    /// Chunks buffered between a streaming adb child and the printer.
    pub stream_buffer: usize,

    pub logcat: LogcatConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            adb_path: PathBuf::from("adb"),
            install_temp_dir: DEFAULT_INSTALL_TEMP_DIR.to_string(),
            stream_buffer: DEFAULT_STREAM_BUFFER,
            logcat: LogcatConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogcatConfig {
    pub tag_width: usize,
    pub pretty_print: bool,
}

impl Default for LogcatConfig {
    fn default() -> Self {
        Self {
            tag_width: DEFAULT_TAG_WIDTH,
            pretty_print: true,
        }
    }
}

impl Config {
    /// Load configuration from a file. A missing file yields the defaults.
    pub async fn load(path: &Path) -> Result<Self> {
        let expanded_path = expand_tilde(path);

        if !expanded_path.exists() {
            tracing::debug!(
                "Config file not found at {:?}, using defaults",
                expanded_path
            );
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&expanded_path).await.map_err(|e| {
            Error::Config(format!(
                "failed to read {}: {e}",
                expanded_path.display()
            ))
        })?;

        let mut config: Config = serde_yaml::from_str(&content).map_err(|e| {
            Error::Config(format!(
                "failed to parse YAML in {}: {e}",
                expanded_path.display()
            ))
        })?;
        config.adb_path = expand_tilde(&config.adb_path);

        config
            .validate()
            .with_context(|| format!("Invalid configuration in {}", expanded_path.display()))?;

        tracing::debug!("Loaded configuration from {:?}", expanded_path);
        Ok(config)
    }

    /// Load from the explicit `--config` path, falling back to the per-user file.
    pub async fn load_with_priority(cli_config_path: Option<&Path>) -> Result<Self> {
        if let Some(path) = cli_config_path {
            tracing::debug!("Using explicitly specified config file: {:?}", path);
            return Self::load(path).await;
        }

        match Self::default_path() {
            Some(path) => Self::load(&path).await,
            None => {
                tracing::debug!("No config directory available, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// `$XDG_CONFIG_HOME/madb/config.yaml` or the platform equivalent.
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "madb").map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    pub fn validate(&self) -> std::result::Result<(), Error> {
        if self.adb_path.as_os_str().is_empty() {
            return Err(Error::Config("adb_path must not be empty".to_string()));
        }
        if !self.install_temp_dir.starts_with('/') {
            return Err(Error::Config(format!(
                "install_temp_dir must be an absolute device path, got '{}'",
                self.install_temp_dir
            )));
        }
        if self.stream_buffer == 0 {
            return Err(Error::Config(
                "stream_buffer must be at least 1".to_string(),
            ));
        }
        if self.logcat.tag_width == 0 {
            return Err(Error::Config(
                "logcat.tag_width must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Remote path `install` stages `file_name` at.
    pub fn install_path(&self, file_name: &str) -> String {
        format!("{}/{}", self.install_temp_dir.trim_end_matches('/'), file_name)
    }
}

pub fn expand_tilde(path: &Path) -> PathBuf {
    if let Some(path_str) = path.to_str() {
        if path_str.starts_with("~/") {
            if let Ok(home) = std::env::var("HOME") {
                return PathBuf::from(path_str.replacen('~', &home, 1));
            }
        }
    }
    path.to_path_buf()
}
