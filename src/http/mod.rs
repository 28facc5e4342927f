//! HTTP 传输层
//!
//! 只负责解析凭据、调用凭据服务并把错误渲染成响应。

pub mod auth;
pub mod error;
pub mod handlers;

use std::sync::Arc;

use axum::Router;
use axum::extract::FromRef;
use axum::routing::{get, post};
use http::header::AUTHORIZATION;
use tower_http::sensitive_headers::SetSensitiveRequestHeadersLayer;
use tower_http::trace::TraceLayer;

use crate::auth::{CredentialService, TokenVerifier};

pub use auth::{AuthenticatedSubject, BasicCredentials, BearerToken, TokenAuth};
pub use error::BEARER_CHALLENGE;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub credentials: Arc<CredentialService>,
    pub verifier: Arc<TokenVerifier>,
}

impl FromRef<AppState> for Arc<CredentialService> {
    fn from_ref(state: &AppState) -> Self {
        state.credentials.clone()
    }
}

impl FromRef<AppState> for Arc<TokenVerifier> {
    fn from_ref(state: &AppState) -> Self {
        state.verifier.clone()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/tokens",
            post(handlers::new_token).delete(handlers::revoke_token),
        )
        .route("/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .layer(SetSensitiveRequestHeadersLayer::new([AUTHORIZATION]))
        .with_state(state)
}
