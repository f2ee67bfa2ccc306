//! Logging setup for the CLI.
//!
//! - `--verbose` logs at debug level
//! - `--quiet` only shows errors
//! - `RUST_LOG` adds directives on top of either

use fob_postbuild::logging::{LogLevel, init_logging_with_color};

/// Log level selected by the global flags. `verbose` wins over `quiet`.
pub fn level_for(verbose: bool, quiet: bool) -> LogLevel {
    if verbose {
        LogLevel::Debug
    } else if quiet {
        LogLevel::Error
    } else {
        LogLevel::Info
    }
}

/// Install the tracing subscriber. Call once at startup.
pub fn init_logger(verbose: bool, quiet: bool, no_color: bool) {
    init_logging_with_color(level_for(verbose, quiet), !no_color && should_use_colors());
}

/// `NO_COLOR` disables colors, `FORCE_COLOR` forces them.
pub fn should_use_colors() -> bool {
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    if std::env::var_os("FORCE_COLOR").is_some() {
        return true;
    }
    std::io::IsTerminal::is_terminal(&std::io::stderr())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_for_flags() {
        assert_eq!(level_for(false, false), LogLevel::Info);
        assert_eq!(level_for(true, false), LogLevel::Debug);
        assert_eq!(level_for(false, true), LogLevel::Error);
        assert_eq!(level_for(true, true), LogLevel::Debug);
    }
}
