//! Minimal stderr logger.
//!
//! Lines look like `[elapsed LEVEL target] message`. Install once at startup
//! with [`init_with_level`], or [`init_from_env`] to read the level from
//! `PHOTO_MAP_LOG` (`error`, `warn`, `info`, `debug`, `trace`, `off`).

use std::io::Write;
use std::str::FromStr;
use std::sync::OnceLock;
use std::time::Instant;

use log::{LevelFilter, Log, Metadata, Record};

#[cfg(feature = "tracing")]
use tracing_subscriber::fmt::format::FmtSpan;
#[cfg(feature = "tracing")]
use tracing_subscriber::util::SubscriberInitExt;
#[cfg(feature = "tracing")]
use tracing_subscriber::{fmt, EnvFilter};

/// Environment variable read by [`init_from_env`].
pub const LOG_ENV_VAR: &str = "PHOTO_MAP_LOG";

struct StderrLogger {
    level: LevelFilter,
    started: Instant,
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let elapsed = self.started.elapsed().as_secs_f64();
        let mut stderr = std::io::stderr().lock();
        let _ = writeln!(
            stderr,
            "[{:8.3}s {:>5} {}] {}",
            elapsed,
            record.level(),
            record.target(),
            record.args()
        );
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

static LOGGER: OnceLock<StderrLogger> = OnceLock::new();

/// Install the stderr logger with the provided level filter.
///
/// Calling this more than once is a no-op after the first successful
/// initialization.
pub fn init_with_level(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    if LOGGER.get().is_none() {
        let logger = LOGGER.get_or_init(|| StderrLogger {
            level,
            started: Instant::now(),
        });
        log::set_logger(logger)?;
        log::set_max_level(level);
    }
    Ok(())
}

/// Install the stderr logger with the level named in `PHOTO_MAP_LOG`,
/// falling back to `default` when unset or unparsable.
pub fn init_from_env(default: LevelFilter) -> Result<(), log::SetLoggerError> {
    init_with_level(level_from_env(default))
}

fn level_from_env(default: LevelFilter) -> LevelFilter {
    parse_level(std::env::var(LOG_ENV_VAR).ok().as_deref()).unwrap_or(default)
}

fn parse_level(raw: Option<&str>) -> Option<LevelFilter> {
    raw.and_then(|raw| LevelFilter::from_str(raw.trim()).ok())
}

/// Filter directive for the `photo_map*` crates at `level`, keeping
/// dependencies at `warn`.
#[cfg_attr(not(feature = "tracing"), allow(dead_code))]
fn crate_directive(level: LevelFilter) -> String {
    let level = level.as_str().to_ascii_lowercase();
    let mut directive = String::from("warn");
    for target in [
        "photo_map",
        "photo_map_core",
        "photo_map_quality",
        "photo_map_workflow",
    ] {
        directive.push_str(&format!(",{target}={level}"));
    }
    directive
}

/// Install a `tracing` subscriber that closes spans with their timings.
///
/// `RUST_LOG` wins when set. Otherwise the level in `PHOTO_MAP_LOG` (default
/// `info`) applies to the photo-map crates. `json` emits one object per
/// event with the current span attached.
#[cfg(feature = "tracing")]
pub fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(crate_directive(level_from_env(LevelFilter::Info))));
    let builder = fmt()
        .with_env_filter(filter)
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(std::io::stderr);
    if json {
        let _ = builder
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .finish()
            .try_init();
    } else {
        let _ = builder
            .with_target(true)
            .with_timer(fmt::time::Uptime::default())
            .finish()
            .try_init();
    }
}
