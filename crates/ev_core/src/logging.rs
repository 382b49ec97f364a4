//! Global logger setup for binaries and benches. Library code only emits
//! through the `log` macros.

use std::path::Path;

use chrono::Local;
use fern::colors::{Color, ColoredLevelConfig};
use fern::Dispatch;
use log::LevelFilter;

/// Level from `RUST_LOG`, defaulting to `info`.
pub fn env_level() -> LevelFilter {
    std::env::var("RUST_LOG")
        .ok()
        .and_then(|raw| raw.parse::<LevelFilter>().ok())
        .unwrap_or(LevelFilter::Info)
}

/// Installs the global logger: colored lines on stderr, plus plain lines in
/// `log_file` when given. `level` overrides `RUST_LOG`.
///
/// Fails if the log file cannot be opened or a logger is already installed.
pub fn init(level: Option<LevelFilter>, log_file: Option<&Path>) -> Result<(), fern::InitError> {
    let level = level.unwrap_or_else(env_level);
    let colors = ColoredLevelConfig::new()
        .error(Color::Red)
        .warn(Color::Yellow)
        .info(Color::Green)
        .debug(Color::Blue)
        .trace(Color::BrightBlack);

    let console = Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "[{} {} {}] {}",
                Local::now().format("%Y-%m-%d %H:%M:%S"),
                colors.color(record.level()),
                record.target(),
                message
            ))
        })
        .chain(std::io::stderr());

    let mut dispatch = Dispatch::new()
        .level(level)
        .level_for("bevy_ecs", LevelFilter::Warn)
        .chain(console);

    if let Some(path) = log_file {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        let file = Dispatch::new()
            .format(|out, message, record| {
                out.finish(format_args!(
                    "[{} {} {}] {}",
                    Local::now().format("%Y-%m-%d %H:%M:%S"),
                    record.level(),
                    record.target(),
                    message
                ))
            })
            .chain(fern::log_file(path)?);
        dispatch = dispatch.chain(file);
    }

    dispatch.apply()?;
    log::debug!("logger initialized at {level}");
    Ok(())
}
