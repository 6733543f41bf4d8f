//! Logging for the fusion evaluator.
//!
//! Records go to stderr: stdout carries the prediction lines.

use chrono::Local;
use env_logger::{Builder, Env, Target};
use log::debug;
use std::io::Write;

/// Log filter, e.g. `debug` or `latefusion::fusion=trace`. Wins over `--log-level`.
pub const LOG_ENV: &str = "LATEFUSION_LOG";

/// `auto`, `always` or `never`.
pub const LOG_STYLE_ENV: &str = "LATEFUSION_LOG_STYLE";

/// Logger writing `<time> <LEVEL> [<target>] <message>` lines to stderr.
/// `level` applies when `LATEFUSION_LOG` is unset.
fn builder(level: &str) -> Builder {
    let env = Env::default().filter_or(LOG_ENV, level).write_style_or(LOG_STYLE_ENV, "auto");

    let mut builder = Builder::from_env(env);
    builder
        .format(|buf, record| {
            // colored only when the write style allows it
            let level = buf.default_styled_level(record.level());
            writeln!(
                buf,
                "{} {:<5} [{}] {}",
                Local::now().format("%H:%M:%S%.3f"),
                level,
                record.target(),
                record.args()
            )
        })
        .target(Target::Stderr);
    builder
}

/// Install the global logger. Later calls are no-ops.
pub fn init_logging(level: &str) {
    if builder(level).try_init().is_ok() {
        debug!("Logging initialized at level: {}", level);
    }
}

#[cfg(test)]
pub fn init_test_logging() {
    let _ = env_logger::builder()
        .is_test(true)
        .filter_level(log::LevelFilter::Debug)
        .try_init();
}
