// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Common utilities for CLI commands.

use std::io::IsTerminal as _;
use std::path::Path;

use rosbag2_sqlite::{Rosbag2, Time};
use tracing_subscriber::EnvFilter;

pub use anyhow::Result as CliResult;
pub type Result<T = ()> = CliResult<T>;

const NANOS_PER_SEC: u64 = 1_000_000_000;

/// Install the tracing subscriber. `RUST_LOG` overrides the default level.
pub fn init_logging(verbose: bool) {
    let default = if verbose {
        "rosbag2_sqlite=debug,rosbag2=debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

/// Format a duration in nanoseconds to human-readable string.
pub fn format_duration(nanos: u64) -> String {
    let secs = nanos / NANOS_PER_SEC;
    let millis = (nanos % NANOS_PER_SEC) / 1_000_000;

    if secs >= 3600 {
        let hours = secs / 3600;
        let minutes = (secs % 3600) / 60;
        format!("{}h {}m", hours, minutes)
    } else if secs >= 60 {
        let minutes = secs / 60;
        let remaining_secs = secs % 60;
        format!("{}m {}s", minutes, remaining_secs)
    } else if secs > 0 {
        format!("{}.{:03}s", secs, millis)
    } else {
        format!("{}ms", millis)
    }
}

/// Format a timestamp as a UTC date with nanoseconds.
pub fn format_timestamp(time: Time) -> String {
    let datetime = chrono::DateTime::<chrono::Utc>::from_timestamp(time.sec, time.nsec);

    match datetime {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S%.9f UTC").to_string(),
        None => format!("{} s", time),
    }
}

/// Parse a timestamp string.
///
/// Accepts:
/// - Unix timestamp in seconds: "1585866235"
/// - Unix timestamp with fractional seconds: "1585866235.112411371"
/// - Unix timestamp in nanoseconds: "1585866235112411371"
/// - RFC 3339: "2020-04-02T22:23:55.112411371Z"
pub fn parse_timestamp(s: &str) -> CliResult<Time> {
    let s = s.trim();

    if let Ok(n) = s.parse::<u64>() {
        // Values below year 3000 in seconds are taken as seconds
        return Ok(if n < 32_503_680_000 {
            Time::new(n as i64, 0)
        } else {
            Time::from_nanos(n)
        });
    }

    if let Some((sec, frac)) = s.split_once('.') {
        if let (Ok(sec), true) = (sec.parse::<u64>(), is_fraction(frac)) {
            let mut digits = frac.to_string();
            digits.truncate(9);
            while digits.len() < 9 {
                digits.push('0');
            }
            let nsec: u32 = digits.parse()?;
            return Ok(Time::new(sec as i64, nsec));
        }
    }

    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
        if dt.timestamp() < 0 {
            return Err(anyhow::anyhow!("Timestamp before the Unix epoch: {s}"));
        }
        return Ok(Time::new(dt.timestamp(), dt.timestamp_subsec_nanos()));
    }

    Err(anyhow::anyhow!("Invalid timestamp: {s}"))
}

fn is_fraction(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Progress bar wrapper for consistent progress reporting.
pub struct ProgressBar {
    inner: Option<indicatif::ProgressBar>,
}

impl ProgressBar {
    /// Create a new progress bar. Hidden when stderr is not a terminal.
    pub fn new(total: u64, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        let inner = if std::io::stderr().is_terminal() {
            let pb = indicatif::ProgressBar::new(total);
            if let Ok(style) = indicatif::ProgressStyle::default_bar()
                .template("{prefix} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} {msg}")
            {
                pb.set_style(style.progress_chars("=>-"));
            }
            pb.set_prefix(prefix);
            Some(pb)
        } else {
            None
        };

        Self { inner }
    }

    /// Create a spinner for work of unknown length. Hidden when stderr is
    /// not a terminal.
    pub fn spinner(prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        let inner = if std::io::stderr().is_terminal() {
            let pb = indicatif::ProgressBar::new_spinner();
            if let Ok(style) =
                indicatif::ProgressStyle::default_spinner().template("{prefix} {spinner} {pos} {msg}")
            {
                pb.set_style(style);
            }
            pb.set_prefix(prefix);
            Some(pb)
        } else {
            None
        };

        Self { inner }
    }

    /// Advance by one.
    pub fn inc(&self) {
        if let Some(pb) = &self.inner {
            pb.inc(1);
        }
    }

    /// Finish the progress bar with a message.
    pub fn finish_with_message(&self, msg: String) {
        if let Some(pb) = &self.inner {
            pb.finish_with_message(msg);
        }
    }
}

/// Open a `.db3` file or a bag directory.
pub fn open_bag(path: &Path) -> Result<Rosbag2> {
    let bag = if path.is_dir() {
        Rosbag2::open_dir(path)?
    } else {
        Rosbag2::open_file(path)?
    };
    Ok(bag)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(500_000_000), "500ms");
        assert_eq!(format_duration(1_500_000_000), "1.500s");
        assert_eq!(format_duration(90_000_000_000), "1m 30s");
        assert_eq!(format_duration(3_600_000_000_000), "1h 0m");
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(
            format_timestamp(Time::new(1585866235, 112411371)),
            "2020-04-02 22:23:55.112411371 UTC"
        );
    }

    #[test]
    fn test_parse_timestamp() {
        assert_eq!(parse_timestamp("0").unwrap(), Time::ZERO);
        assert_eq!(
            parse_timestamp("1585866235").unwrap(),
            Time::new(1585866235, 0)
        );
        assert_eq!(
            parse_timestamp("1585866235112411371").unwrap(),
            Time::new(1585866235, 112411371)
        );
        assert_eq!(
            parse_timestamp("1585866235.5").unwrap(),
            Time::new(1585866235, 500_000_000)
        );
        assert_eq!(
            parse_timestamp("2020-04-02T22:23:55.112411371Z").unwrap(),
            Time::new(1585866235, 112411371)
        );
        assert!(parse_timestamp("yesterday").is_err());
        assert!(parse_timestamp("12.x").is_err());
    }
}
