// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Terminal styling.
//!
//! Respects NO_COLOR and FORCE_COLOR. Colors are disabled when output is
//! piped.

use colored::{ColoredString, Colorize};

/// Initialize color support based on environment.
/// Call once at startup.
pub fn init() {
    if std::env::var_os("NO_COLOR").is_some() {
        colored::control::set_override(false);
    } else if std::env::var_os("FORCE_COLOR").is_some() {
        colored::control::set_override(true);
    }
}

pub fn error_label() -> ColoredString {
    "error".red().bold()
}

pub fn file_path(path: &str) -> ColoredString {
    path.bold()
}

pub fn banner_ok(phase: &str) -> String {
    format!("{} {} {}", "===".dimmed(), format!("{} OK", phase).green().bold(), "===".dimmed())
}

pub fn banner_fail(phase: &str, errors: usize, warnings: usize) -> String {
    let mut msg = format!("{} FAILED: {}", phase, plural(errors, "error"));
    if warnings > 0 {
        msg.push_str(&format!(", {}", plural(warnings, "warning")));
    }
    format!("{} {} {}", "===".dimmed(), msg.red().bold(), "===".dimmed())
}

pub fn banner_warn(phase: &str, warnings: usize) -> String {
    let msg = format!("{} OK with {}", phase, plural(warnings, "warning"));
    format!("{} {} {}", "===".dimmed(), msg.yellow().bold(), "===".dimmed())
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("1 {}", word)
    } else {
        format!("{} {}s", n, word)
    }
}
