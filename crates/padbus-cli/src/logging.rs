use std::fmt::Display;

use colored::{ColoredString, Colorize};
use fern::Dispatch;
use log::{Level, LevelFilter};

const TIME_FORMAT: &str = "%Y.%m.%d %H:%M:%S";

fn line(now: impl Display, message: impl Display) -> String {
    format!("[{now}] {message}")
}

fn paint(level: Level, line: String) -> ColoredString {
    match level {
        Level::Error => line.bright_red(),
        Level::Warn => line.bright_yellow(),
        Level::Info => line.normal(),
        Level::Debug | Level::Trace => line.dimmed(),
    }
}

/// Setup the logger.
///
/// The CLI and the library (`padbus::*`) follow the verbosity flag, other
/// crates are limited to warnings.
pub(crate) fn setup(verbose: bool, no_color: bool) -> Result<(), log::SetLoggerError> {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    if no_color {
        colored::control::set_override(false);
    }
    Dispatch::new()
        .format(|out, message, record| {
            let now = chrono::Local::now().format(TIME_FORMAT);
            out.finish(format_args!("{}", paint(record.level(), line(now, message))))
        })
        .level(LevelFilter::Warn)
        .level_for("padbus", level)
        .level_for("padbus_cli", level)
        .chain(std::io::stdout())
        .apply()
}
