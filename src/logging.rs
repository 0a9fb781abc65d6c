//! Diagnostic logging setup.
//!
//! Logs go to stderr so stdout carries only answers. The filter comes from
//! `SONARCHAT_LOG` (same syntax as `RUST_LOG`) and defaults to `warn`.

use tracing_subscriber::{fmt, EnvFilter};

use crate::core::constants::LOG_ENV;

const DEFAULT_DIRECTIVE: &str = "warn";

/// Build the filter from a directive string, falling back to the default
/// when it does not parse.
pub fn filter_from(directive: Option<&str>) -> EnvFilter {
    directive
        .filter(|value| !value.trim().is_empty())
        .and_then(|value| EnvFilter::try_new(value).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_DIRECTIVE))
}

/// Install the global subscriber. Calling it twice is harmless.
pub fn init_logging() {
    let directive = std::env::var(LOG_ENV).ok();
    let _ = fmt()
        .with_env_filter(filter_from(directive.as_deref()))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_or_blank_directives_use_the_default() {
        assert_eq!(filter_from(None).to_string(), DEFAULT_DIRECTIVE);
        assert_eq!(filter_from(Some("  ")).to_string(), DEFAULT_DIRECTIVE);
    }

    #[test]
    fn valid_directives_are_kept() {
        assert_eq!(
            filter_from(Some("sonarchat=debug")).to_string(),
            "sonarchat=debug"
        );
    }

    #[test]
    fn init_can_run_more_than_once() {
        init_logging();
        init_logging();
    }
}
