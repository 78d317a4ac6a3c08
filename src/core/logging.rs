//! Diagnostic logging to stderr
//!
//! Filter comes from `DEPOT_LOG`, then `RUST_LOG`, then the verbosity flags.
//! Stdout stays reserved for command output so pipes are unaffected.

use tracing_subscriber::EnvFilter;

/// Environment variable holding a tracing filter directive
pub const LOG_ENV: &str = "DEPOT_LOG";

/// Level used when no environment filter is set
pub fn default_level(verbose: bool, quiet: bool) -> &'static str {
    if verbose {
        "debug"
    } else if quiet {
        "error"
    } else {
        "warn"
    }
}

fn build_filter(verbose: bool, quiet: bool) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default_level(verbose, quiet)))
}

/// Install the global subscriber
///
/// Safe to call more than once; later calls are no-ops.
pub fn init(verbose: bool, quiet: bool) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(build_filter(verbose, quiet))
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_level() {
        assert_eq!(default_level(false, false), "warn");
        assert_eq!(default_level(true, false), "debug");
        assert_eq!(default_level(false, true), "error");
        assert_eq!(default_level(true, true), "debug");
    }

    #[test]
    fn test_init_twice_is_harmless() {
        init(false, true);
        init(true, false);
    }
}
