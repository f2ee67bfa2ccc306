//! Subscriber setup for binaries that run the post-build stages (feature
//! `logging`).
//!
//! The stages themselves only emit `tracing` events prefixed with their
//! stage name (`[fob-dts]`, `[fob-umd]`, ...). Embedders that already own a
//! subscriber need none of this.

use std::sync::Once;
use tracing::Subscriber;
use tracing_subscriber::filter::{Directive, LevelFilter};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

static INIT: Once = Once::new();

/// Verbosity of post-build output.
///
/// `Trace` additionally shows every file the entry tracker records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    Silent,
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn level_filter(self) -> LevelFilter {
        match self {
            LogLevel::Silent => LevelFilter::OFF,
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let level = match s.to_ascii_lowercase().as_str() {
            "silent" | "off" | "none" => LogLevel::Silent,
            "error" => LogLevel::Error,
            "warn" | "warning" => LogLevel::Warn,
            "info" => LogLevel::Info,
            "debug" => LogLevel::Debug,
            "trace" => LogLevel::Trace,
            other => return Err(format!("unknown log level '{}'", other)),
        };
        Ok(level)
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.level_filter(), f)
    }
}

/// Compact, timestamp-free lines on stderr; stdout stays free for tools
/// that pipe it.
fn stderr_layer<S>(color: bool) -> impl Layer<S>
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    fmt::layer()
        .compact()
        .without_time()
        .with_target(false)
        .with_ansi(color)
        .with_writer(std::io::stderr)
}

/// Install a global subscriber at `level`. `RUST_LOG` directives refine it.
///
/// Only the first initializer called in a process has any effect.
pub fn init_logging(level: LogLevel) {
    init_logging_with_color(level, true);
}

/// [`init_logging`] with ANSI colors on or off (`--no-color`, `NO_COLOR`).
pub fn init_logging_with_color(level: LogLevel, color: bool) {
    INIT.call_once(|| {
        let filter = EnvFilter::builder()
            .with_default_directive(Directive::from(level.level_filter()))
            .from_env_lossy();
        tracing_subscriber::registry()
            .with(filter)
            .with(stderr_layer(color))
            .init();
    });
}

/// Install a global subscriber driven only by `RUST_LOG` (info when unset).
pub fn init_logging_from_env() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        tracing_subscriber::registry()
            .with(filter)
            .with(stderr_layer(true))
            .init();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_levels() {
        assert_eq!("info".parse::<LogLevel>().unwrap(), LogLevel::Info);
        assert_eq!("DEBUG".parse::<LogLevel>().unwrap(), LogLevel::Debug);
        assert_eq!("warning".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert_eq!("none".parse::<LogLevel>().unwrap(), LogLevel::Silent);
        assert_eq!("trace".parse::<LogLevel>().unwrap(), LogLevel::Trace);
        assert!("loud".parse::<LogLevel>().unwrap_err().contains("loud"));
    }

    #[test]
    fn test_display_matches_filter_names() {
        assert_eq!(LogLevel::Silent.to_string(), "off");
        assert_eq!(LogLevel::default().to_string(), "info");
        assert_eq!(LogLevel::Trace.to_string(), "trace");
    }
}
