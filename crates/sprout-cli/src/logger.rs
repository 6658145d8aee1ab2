//! Logging setup for the sprout CLI.
//!
//! The library only emits `tracing` events; this installs the subscriber that
//! prints them.
//!
//! ```rust,no_run
//! use sprout_cli::logger::init_logger;
//!
//! init_logger(false, false, false);
//! tracing::info!("Starting build");
//! ```

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const VERBOSE_FILTER: &str = "sprout=debug,sprout_build=debug,sprout_cli=debug";
const QUIET_FILTER: &str = "error";
const DEFAULT_FILTER: &str = "sprout=info,sprout_build=info,sprout_cli=info";

/// Pick the filter directives for the given flags.
///
/// `--verbose` wins over `--quiet`; without either, `RUST_LOG` is honoured.
pub fn filter_for(verbose: bool, quiet: bool) -> EnvFilter {
    if verbose {
        EnvFilter::new(VERBOSE_FILTER)
    } else if quiet {
        EnvFilter::new(QUIET_FILTER)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
    }
}

/// Install the global subscriber. Call once, before anything logs.
pub fn init_logger(verbose: bool, quiet: bool, no_color: bool) {
    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_level(true)
        .with_ansi(!no_color)
        .with_writer(std::io::stderr)
        .compact();

    // A second init (tests, embedding) keeps the first subscriber
    let _ = tracing_subscriber::registry()
        .with(filter_for(verbose, quiet))
        .with(fmt_layer)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbose_filter_enables_debug() {
        let filter = filter_for(true, false);
        assert_eq!(
            filter.max_level_hint(),
            Some(tracing::level_filters::LevelFilter::DEBUG)
        );
    }

    #[test]
    fn test_quiet_filter_only_errors() {
        let filter = filter_for(false, true);
        assert_eq!(
            filter.max_level_hint(),
            Some(tracing::level_filters::LevelFilter::ERROR)
        );
    }

    #[test]
    fn test_init_logger_twice_does_not_panic() {
        init_logger(false, true, true);
        init_logger(true, false, true);
    }
}
