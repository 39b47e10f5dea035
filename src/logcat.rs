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

//! Line splitting, parsing and package filtering for streamed logcat output.

use std::collections::HashMap;
use std::fmt;

use crate::error::Result;
use crate::transport::Transporter;

pub const DEFAULT_TAG_WIDTH: usize = 22;

/// Reassembles lines from arbitrarily split output chunks.
#[derive(Debug, Default)]
pub struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and return every line it completed.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);

        let mut lines = Vec::new();
        while let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
            let rest = self.pending.split_off(pos + 1);
            let line = std::mem::replace(&mut self.pending, rest);
            lines.push(Self::decode(&line));
        }
        lines
    }

    /// Flush a trailing line that never got its newline.
    pub fn finish(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }
        let line = std::mem::take(&mut self.pending);
        Some(Self::decode(&line))
    }

    fn decode(line: &[u8]) -> String {
        String::from_utf8_lossy(line)
            .trim_end_matches(['\n', '\r'])
            .to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Verbose,
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
    Assert,
    Silent,
}

impl LogLevel {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'V' => Some(Self::Verbose),
            'D' => Some(Self::Debug),
            'I' => Some(Self::Info),
            'W' => Some(Self::Warn),
            'E' => Some(Self::Error),
            'F' => Some(Self::Fatal),
            'A' => Some(Self::Assert),
            'S' => Some(Self::Silent),
            _ => None,
        }
    }

    pub fn as_char(&self) -> char {
        match self {
            Self::Verbose => 'V',
            Self::Debug => 'D',
            Self::Info => 'I',
            Self::Warn => 'W',
            Self::Error => 'E',
            Self::Fatal => 'F',
            Self::Assert => 'A',
            Self::Silent => 'S',
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// One parsed logcat entry in `threadtime` or `brief` format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    pub timestamp: Option<String>,
    pub pid: u32,
    pub tid: Option<u32>,
    pub level: LogLevel,
    pub tag: String,
    pub message: String,
}

impl LogLine {
    pub fn parse(line: &str) -> Option<Self> {
        Self::parse_threadtime(line).or_else(|| Self::parse_brief(line))
    }

    /// `MM-DD HH:MM:SS.mmm  PID  TID L TAG: message`
    fn parse_threadtime(line: &str) -> Option<Self> {
        let (date, rest) = next_token(line)?;
        if date.len() != 5 || date.as_bytes()[2] != b'-' {
            return None;
        }
        let (time, rest) = next_token(rest)?;
        if !time.contains(':') {
            return None;
        }
        let (pid, rest) = next_token(rest)?;
        let (tid, rest) = next_token(rest)?;
        let (level, rest) = next_token(rest)?;
        let level = single_char(level).and_then(LogLevel::from_char)?;
        let (tag, message) = split_tag(rest.trim_start())?;

        Some(Self {
            timestamp: Some(format!("{date} {time}")),
            pid: pid.parse().ok()?,
            tid: Some(tid.parse().ok()?),
            level,
            tag,
            message,
        })
    }

    /// `L/TAG( PID): message`
    fn parse_brief(line: &str) -> Option<Self> {
        let mut chars = line.chars();
        let level = LogLevel::from_char(chars.next()?)?;
        if chars.next()? != '/' {
            return None;
        }
        let rest = chars.as_str();
        let open = rest.find('(')?;
        let close = open + rest[open..].find(')')?;
        let pid = rest[open + 1..close].trim().parse().ok()?;
        let message = rest[close + 1..].strip_prefix(':')?;

        Some(Self {
            timestamp: None,
            pid,
            tid: None,
            level,
            tag: rest[..open].trim_end().to_string(),
            message: message.strip_prefix(' ').unwrap_or(message).to_string(),
        })
    }
}

fn next_token(s: &str) -> Option<(&str, &str)> {
    let s = s.trim_start();
    if s.is_empty() {
        return None;
    }
    let end = s.find(char::is_whitespace).unwrap_or(s.len());
    Some((&s[..end], &s[end..]))
}

fn single_char(s: &str) -> Option<char> {
    let mut chars = s.chars();
    let c = chars.next()?;
    chars.next().is_none().then_some(c)
}

fn split_tag(rest: &str) -> Option<(String, String)> {
    if let Some(idx) = rest.find(": ") {
        return Some((rest[..idx].trim_end().to_string(), rest[idx + 2..].to_string()));
    }
    let tag = rest.strip_suffix(':')?;
    Some((tag.trim_end().to_string(), String::new()))
}

/// Extract `(pid, process)` from an ActivityManager process start notice.
///
/// Handles `Start proc 1234:com.app/u0a12 for activity ...` and the older
/// `Start proc com.app for activity ...: pid=1234 uid=...` wording.
fn parse_start_proc(message: &str) -> Option<(u32, String)> {
    let rest = &message[message.find("Start proc ")? + "Start proc ".len()..];
    let (first, _) = next_token(rest)?;

    if let Some((pid, name)) = first.split_once(':') {
        if let Ok(pid) = pid.parse() {
            let name = name.split('/').next().unwrap_or(name);
            return Some((pid, name.to_string()));
        }
    }

    let pid = rest.split_once("pid=")?.1;
    let digits: String = pid.chars().take_while(|c| c.is_ascii_digit()).collect();
    Some((digits.parse().ok()?, first.to_string()))
}

/// Extract `(pid, process)` from `Process com.app (pid 1234) has died`.
fn parse_process_death(message: &str) -> Option<(u32, String)> {
    let rest = message.strip_prefix("Process ")?;
    let (name, rest) = rest.split_once(" (pid ")?;
    let (pid, rest) = rest.split_once(')')?;
    if !rest.contains("has died") {
        return None;
    }
    Some((pid.trim().parse().ok()?, name.to_string()))
}

/// Parse `ps` output into `(pid, name)` pairs.
///
/// The PID column is located from the header; the name is the last column.
pub fn parse_process_table(output: &str) -> Vec<(u32, String)> {
    let mut lines = output.lines();
    let pid_column = match lines
        .next()
        .and_then(|header| header.split_whitespace().position(|col| col == "PID"))
    {
        Some(column) => column,
        None => return Vec::new(),
    };

    lines
        .filter_map(|line| {
            let columns: Vec<&str> = line.split_whitespace().collect();
            let pid = columns.get(pid_column)?.parse().ok()?;
            let name = columns.last()?;
            Some((pid, name.to_string()))
        })
        .collect()
}

/// Transforms raw logcat lines into what gets printed.
pub trait LineFormatter: Send {
    /// `None` drops the line.
    fn format_line(&mut self, line: &str) -> Option<String>;
}

/// Filters log lines to a set of packages and optionally pretty-prints them.
#[derive(Debug)]
pub struct LogcatFormatter {
    packages: Vec<String>,
    pids: HashMap<u32, String>,
    pretty: bool,
    tag_width: usize,
}

impl LogcatFormatter {
    pub fn new(pretty: bool, tag_width: usize) -> Self {
        Self {
            packages: Vec::new(),
            pids: HashMap::new(),
            pretty,
            tag_width,
        }
    }

    /// Restrict output to `packages`. Empty names are ignored.
    pub fn set_app_filters<I, S>(&mut self, packages: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.packages = packages
            .into_iter()
            .map(Into::into)
            .filter(|p: &String| !p.is_empty())
            .collect();
    }

    pub fn packages(&self) -> &[String] {
        &self.packages
    }

    pub fn is_filtering(&self) -> bool {
        !self.packages.is_empty()
    }

    pub fn tracks_pid(&self, pid: u32) -> bool {
        self.pids.contains_key(&pid)
    }

    /// Seed the pid table from the processes already running on the device.
    pub async fn update_app_filters(&mut self, transporter: &dyn Transporter) -> Result<()> {
        if !self.is_filtering() {
            return Ok(());
        }

        let ps_all = ["ps".to_string(), "-A".to_string()];
        let mut processes = match transporter.shell_sync(&ps_all).await {
            Ok(output) => parse_process_table(&String::from_utf8_lossy(&output)),
            Err(e) => {
                tracing::debug!("ps -A failed, retrying with plain ps: {}", e);
                Vec::new()
            }
        };
        // Toolbox ps reads -A as a name filter and prints only its header
        if processes.is_empty() {
            let output = transporter.shell_sync(&["ps".to_string()]).await?;
            processes = parse_process_table(&String::from_utf8_lossy(&output));
        }

        for (pid, name) in processes {
            if self.matches_package(&name) {
                tracing::debug!("Tracking {} as pid {}", name, pid);
                self.pids.insert(pid, name);
            }
        }
        Ok(())
    }

    fn matches_package(&self, process: &str) -> bool {
        self.packages.iter().any(|package| {
            process == package
                || process
                    .strip_prefix(package.as_str())
                    .is_some_and(|rest| rest.starts_with(':'))
        })
    }

    fn track_lifecycle(&mut self, entry: &LogLine) {
        if let Some((pid, name)) = parse_start_proc(&entry.message) {
            if self.matches_package(&name) {
                tracing::debug!("{} started as pid {}", name, pid);
                self.pids.insert(pid, name);
            }
        } else if let Some((pid, name)) = parse_process_death(&entry.message) {
            if self.pids.remove(&pid).is_some() {
                tracing::debug!("{} (pid {}) died", name, pid);
            }
        }
    }

    fn render(&self, entry: &LogLine) -> String {
        let tag: String = entry.tag.chars().take(self.tag_width).collect();
        format!(
            "{:>width$} {} {}\n",
            tag,
            entry.level,
            entry.message,
            width = self.tag_width
        )
    }
}

impl LineFormatter for LogcatFormatter {
    fn format_line(&mut self, line: &str) -> Option<String> {
        let Some(entry) = LogLine::parse(line) else {
            // Section banners and continuation noise only pass when unfiltered
            return (!self.is_filtering()).then(|| format!("{line}\n"));
        };

        self.track_lifecycle(&entry);

        if self.is_filtering() && !self.pids.contains_key(&entry.pid) {
            return None;
        }

        if self.pretty {
            Some(self.render(&entry))
        } else {
            Some(format!("{line}\n"))
        }
    }
}

/// Flush the device log.
pub async fn clear_log(transporter: &dyn Transporter) -> Result<()> {
    transporter
        .shell_sync(&["logcat".to_string(), "-c".to_string()])
        .await?;
    Ok(())
}

/// Shell command that streams the log with `tags` applied as the session filter.
pub fn logcat_command(tags: &str) -> String {
    format!("export ANDROID_LOG_TAGS=\"{tags}\" ; logcat")
}
