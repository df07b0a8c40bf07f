//! Logging configuration for the supply monitor.

use chrono::Local;
use env_logger::{Builder, Env, Target};
use log::debug;
use std::io::Write;

const CRATE_TARGET: &str = "tetherwatch";

/// Filter used when `TETHERWATCH_LOG` is unset.
///
/// A bare level (`"debug"`) applies to this crate only and keeps HTTP
/// dependencies at `warn`; anything containing `=` or `,` is taken as a full
/// env_logger directive.
fn default_filter(level: &str) -> String {
    let level = level.trim();
    if level.is_empty() {
        return format!("warn,{}=info", CRATE_TARGET);
    }
    if level.contains('=') || level.contains(',') {
        return level.to_string();
    }
    format!("warn,{}={}", CRATE_TARGET, level.to_ascii_lowercase())
}

/// `tetherwatch::engine` → `engine`; other targets are left alone.
fn short_target(target: &str) -> &str {
    target
        .strip_prefix(CRATE_TARGET)
        .and_then(|rest| rest.strip_prefix("::"))
        .unwrap_or(target)
}

/// Initialize the logging system.
///
/// `TETHERWATCH_LOG` overrides `level`; safe to call more than once.
pub fn init_logging(level: &str) {
    let env = Env::default()
        .filter_or("TETHERWATCH_LOG", default_filter(level))
        .write_style_or("TETHERWATCH_LOG_STYLE", "auto");

    Builder::from_env(env)
        .format(|buf, record| {
            let level_color = match record.level() {
                | log::Level::Error => "\x1b[31m",
                | log::Level::Warn => "\x1b[33m",
                | log::Level::Info => "\x1b[32m",
                | log::Level::Debug => "\x1b[36m",
                | log::Level::Trace => "\x1b[35m",
            };
            writeln!(
                buf,
                "{} {}{:5}\x1b[0m [{}] {}",
                Local::now().format("%Y-%m-%d %H:%M:%S"),
                level_color,
                record.level(),
                short_target(record.target()),
                record.args()
            )
        })
        .target(Target::Stderr)
        .try_init()
        .ok();

    debug!("Logging initialized with filter: {}", default_filter(level));
}

/// Initialize test logging (for use in tests)
#[cfg(test)]
pub fn init_test_logging() {
    let _ = env_logger::builder()
        .is_test(true)
        .filter_level(log::LevelFilter::Debug)
        .try_init();
}
