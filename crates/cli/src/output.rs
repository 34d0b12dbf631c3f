// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Output formatting for CLI commands

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::Serialize;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Print output in the specified format
pub fn print<T: Serialize + std::fmt::Display>(value: &T, format: OutputFormat) {
    match format {
        OutputFormat::Text => println!("{}", value),
        OutputFormat::Json => {
            if let Ok(json) = serde_json::to_string_pretty(value) {
                println!("{}", json);
            }
        }
    }
}

/// Print a list of items; `empty` is shown instead of nothing in text mode
pub fn print_list<T: Serialize + std::fmt::Display>(items: &[T], format: OutputFormat, empty: &str) {
    match format {
        OutputFormat::Text => {
            if items.is_empty() {
                println!("{}", empty);
            }
            for item in items {
                println!("{}", item);
            }
        }
        OutputFormat::Json => {
            if let Ok(json) = serde_json::to_string_pretty(items) {
                println!("{}", json);
            }
        }
    }
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) {
    if let Ok(json) = serde_json::to_string_pretty(value) {
        println!("{}", json);
    }
}

pub fn format_time(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Compact elapsed time: `850ms`, `12s`, `3m04s`, `2h05m`
pub fn format_elapsed(from: DateTime<Utc>, to: DateTime<Utc>) -> String {
    let ms = (to - from).num_milliseconds().max(0);
    let secs = ms / 1000;
    if ms < 1000 {
        format!("{}ms", ms)
    } else if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m{:02}s", secs / 60, secs % 60)
    } else {
        format!("{}h{:02}m", secs / 3600, (secs % 3600) / 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    #[test]
    fn elapsed_picks_unit() {
        let t = Utc::now();
        assert_eq!(format_elapsed(t, t + TimeDelta::milliseconds(850)), "850ms");
        assert_eq!(format_elapsed(t, t + TimeDelta::seconds(12)), "12s");
        assert_eq!(format_elapsed(t, t + TimeDelta::seconds(184)), "3m04s");
        assert_eq!(format_elapsed(t, t + TimeDelta::seconds(7500)), "2h05m");
    }

    #[test]
    fn elapsed_never_negative() {
        let t = Utc::now();
        assert_eq!(format_elapsed(t, t - TimeDelta::seconds(5)), "0ms");
    }
}
