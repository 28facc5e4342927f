//! 日志初始化
//!
//! `RUST_LOG` 优先于配置中的日志级别。

use tracing::subscriber::set_global_default;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;

use crate::config::{LogFormat, LoggingConfig};
use crate::error::{Result, TokenError};

/// Installs the global subscriber and the `log` bridge. Calling it twice
/// returns an error.
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|err| TokenError::Configuration(format!("invalid log level: {err}")))?;

    let registry = tracing_subscriber::registry().with(filter);
    let installed = match config.format {
        LogFormat::Pretty => set_global_default(registry.with(fmt::layer().pretty())),
        LogFormat::Compact => {
            set_global_default(registry.with(fmt::layer().compact().with_target(true)))
        }
        LogFormat::Json => {
            set_global_default(registry.with(fmt::layer().json().with_current_span(true)))
        }
    };
    installed.map_err(|err| TokenError::internal(format!("tracing already initialised: {err}")))?;

    // dependencies that still emit through `log`
    tracing_log::LogTracer::init()
        .map_err(|err| TokenError::internal(format!("log bridge already installed: {err}")))
}
