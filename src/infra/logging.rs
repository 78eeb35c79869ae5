use tracing_subscriber::EnvFilter;

use crate::infra::{config::LogConfig, error::AppError};

/// Installs the global subscriber. `RUST_LOG` wins over the configured level.
///
/// Thread names are printed so core-thread work is told apart from the
/// caller's.
pub fn init(config: &LogConfig) -> Result<(), AppError> {
    tracing_subscriber::fmt()
        .with_env_filter(filter_for(config))
        .with_target(true)
        .with_thread_names(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(AppError::LoggingInit)
}

fn filter_for(config: &LogConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::env_lock;

    #[test]
    fn falls_back_to_configured_level_without_rust_log() {
        let _guard = env_lock();
        let previous = std::env::var_os("RUST_LOG");
        // SAFETY: env is guarded by process-wide test mutex.
        unsafe { std::env::remove_var("RUST_LOG") };

        let filter = filter_for(&LogConfig {
            level: "debug".to_owned(),
        });

        if let Some(value) = previous {
            // SAFETY: restoring env while guard is held.
            unsafe { std::env::set_var("RUST_LOG", value) };
        }

        assert_eq!(
            filter.max_level_hint(),
            Some(tracing::level_filters::LevelFilter::DEBUG)
        );
    }
}
