use std::env;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Logging setup.
pub struct LoggingConfig;

impl LoggingConfig {
    /// Installs the global subscriber, writing to stderr.
    ///
    /// Environment:
    /// - `RUST_LOG`: filter directives (error, warn, info, debug, trace)
    /// - `MCPFLOW_DEBUG`: verbose output with targets, files and thread ids
    ///
    /// Calling it again is a no-op once a global subscriber exists.
    ///
    /// ```no_run
    /// use mcpflow::utils::LoggingConfig;
    ///
    /// LoggingConfig::init();
    /// ```
    pub fn init() {
        let is_debug = Self::is_debug();

        let env_filter = match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => {
                if is_debug {
                    EnvFilter::new("mcpflow=debug,info")
                } else {
                    EnvFilter::new("mcpflow=info,warn")
                }
            }
        };

        let fmt_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(is_debug)
            .with_file(is_debug)
            .with_line_number(is_debug)
            .with_thread_ids(is_debug);

        let installed = tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()
            .is_ok();

        if installed && is_debug {
            tracing::debug!("debug mode enabled");
        }
    }

    /// Same as [`LoggingConfig::init`] with an explicit filter.
    pub fn init_with_filter(filter: &str) {
        let _ = tracing_subscriber::registry()
            .with(EnvFilter::new(filter))
            .with(fmt::layer().with_writer(std::io::stderr))
            .try_init();
    }

    /// `MCPFLOW_DEBUG` is set.
    pub fn is_debug() -> bool {
        env::var("MCPFLOW_DEBUG").is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_debug() {
        env::remove_var("MCPFLOW_DEBUG");
        assert!(!LoggingConfig::is_debug());

        env::set_var("MCPFLOW_DEBUG", "1");
        assert!(LoggingConfig::is_debug());

        env::remove_var("MCPFLOW_DEBUG");
    }

    #[test]
    fn test_init_twice_does_not_panic() {
        LoggingConfig::init_with_filter("mcpflow=warn");
        LoggingConfig::init();
    }
}
