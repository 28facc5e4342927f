//! 服务装配与启动
//!
//! 按配置创建撤销存储、身份服务客户端和令牌编解码器，
//! 然后在收到 Ctrl+C / SIGTERM 时优雅停机。

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::auth::{
    CredentialService, HttpAuthenticationProvider, MemoryRevocationStore, RevocationStore,
    TokenCodec, TokenVerifier,
};
use crate::config::{Config, StoreBackend, StoreConfig};
use crate::error::{Result, TokenError};
use crate::http::{self, AppState};

/// Opens the revocation store selected by `config.backend`.
pub async fn connect_store(config: &StoreConfig) -> Result<Arc<dyn RevocationStore>> {
    match config.backend {
        StoreBackend::Memory => {
            warn!("using in-process revocation store; revocations are not shared between instances");
            Ok(Arc::new(MemoryRevocationStore::new()))
        }
        #[cfg(feature = "etcd")]
        StoreBackend::Etcd => {
            let store = crate::auth::store::EtcdRevocationStore::connect_with_prefix(
                &config.endpoints,
                config.timeout(),
                config.key_prefix.clone(),
            )
            .await
            .map_err(|err| TokenError::store_unavailable(format!("{err:#}")))?;
            Ok(Arc::new(store))
        }
        #[cfg(feature = "redis")]
        StoreBackend::Redis => {
            let url = config
                .endpoints
                .first()
                .ok_or_else(|| TokenError::Configuration("redis endpoint not configured".into()))?;
            let store = crate::auth::store::RedisRevocationStore::connect_with_prefix(
                url,
                config.timeout(),
                config.key_prefix.clone(),
            )
            .await
            .map_err(|err| TokenError::store_unavailable(format!("{err:#}")))?;
            Ok(Arc::new(store))
        }
        #[allow(unreachable_patterns)]
        other => Err(TokenError::Configuration(format!(
            "store backend {other:?} not compiled in"
        ))),
    }
}

/// Builds the handler state from a validated config.
pub async fn build_state(config: &Config) -> Result<AppState> {
    let store = connect_store(&config.store).await?;
    let provider = HttpAuthenticationProvider::new(
        &config.identity.base_url,
        &config.identity.path,
        config.identity.timeout(),
    )?;
    let codec = Arc::new(TokenCodec::new(
        config.auth.secret.as_bytes(),
        config.auth.token_ttl(),
    ));

    let credentials = CredentialService::new(Arc::new(provider), codec.clone(), store.clone())
        .with_revocation_margin(config.auth.revocation_margin());
    let verifier = TokenVerifier::new(codec, store);

    Ok(AppState {
        credentials: Arc::new(credentials),
        verifier: Arc::new(verifier),
    })
}

/// Serves the HTTP API until a shutdown signal arrives.
pub async fn serve(config: &Config) -> Result<()> {
    let addr = config.server.socket_addr()?;
    let state = build_state(config).await?;

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|err| TokenError::internal(format!("failed to bind {addr}: {err}")))?;
    info!(
        service = %config.service.name,
        version = %config.service.version,
        %addr,
        "token service listening"
    );

    axum::serve(listener, http::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| TokenError::internal(format!("server error: {err}")))?;

    info!("token service stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("shutdown signal received (Ctrl+C)"),
        _ = terminate => info!("shutdown signal received (SIGTERM)"),
    }
}
