use std::process::ExitCode;

use token_service::config::Config;
use token_service::{server, telemetry};
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    let (env, config) = match Config::from_env() {
        Ok(loaded) => loaded,
        Err(err) => {
            eprintln!("token-service: {err}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(err) = telemetry::init_tracing(&config.logging) {
        eprintln!("token-service: {err}");
        return ExitCode::FAILURE;
    }
    info!(environment = %env, store = ?config.store.backend, "configuration loaded");

    match server::serve(&config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "token service failed");
            ExitCode::FAILURE
        }
    }
}
