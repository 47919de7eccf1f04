// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Log output on stderr.

use colored::{Color, Colorize};
use log::{Level, LevelFilter};

fn dispatch(level: LevelFilter) -> fern::Dispatch {
    fern::Dispatch::new()
        .level(level)
        .format(|out, message, record| {
            let level = record.level();
            let color = match level {
                Level::Error => Color::Red,
                Level::Warn => Color::Yellow,
                Level::Info => Color::Blue,
                Level::Debug => Color::Magenta,
                Level::Trace => Color::Green,
            };
            out.finish(format_args!(
                "{} [{}] {}",
                format!("{}:", level.to_string().to_lowercase()).color(color),
                record.target(),
                message
            ))
        })
        .chain(std::io::stderr())
}

/// Install the global logger. Fails if one is already installed.
pub fn init(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    dispatch(level).apply()
}
