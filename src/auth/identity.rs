//! 身份服务客户端
//!
//! 口令校验委托给外部用户服务：以 basic auth 请求固定路径，
//! 200 响应体中的 `id` 字段即为令牌主体。

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, warn};

use super::token::SubjectId;
use crate::error::{Result, TokenError};

/// 默认的身份校验路径
pub const DEFAULT_IDENTITY_PATH: &str = "/api/users/me";

/// Verifies a nickname/secret pair and returns the subject it belongs to.
#[async_trait]
pub trait AuthenticationProvider: Send + Sync {
    async fn verify(&self, nickname: &str, secret: &str) -> Result<SubjectId>;
}

#[derive(Debug, Deserialize)]
struct IdentityResponse {
    id: SubjectId,
}

/// HTTP-backed identity provider
#[derive(Debug, Clone)]
pub struct HttpAuthenticationProvider {
    client: reqwest::Client,
    url: String,
}

impl HttpAuthenticationProvider {
    pub fn new(base_url: &str, path: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|err| TokenError::Configuration(format!("identity http client: {err}")))?;

        Ok(Self {
            client,
            url: format!("{}{}", base_url.trim_end_matches('/'), path),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl AuthenticationProvider for HttpAuthenticationProvider {
    async fn verify(&self, nickname: &str, secret: &str) -> Result<SubjectId> {
        if nickname.is_empty() || secret.is_empty() {
            return Err(TokenError::AuthenticationFailed);
        }

        // transport failures are reported exactly like rejected credentials
        let response = self
            .client
            .get(&self.url)
            .basic_auth(nickname, Some(secret))
            .send()
            .await
            .map_err(|err| {
                warn!(error = %err, url = %self.url, "identity service unreachable");
                TokenError::AuthenticationFailed
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            if status.is_server_error() {
                warn!(%status, "identity service error, treating as authentication failure");
            } else {
                debug!(%status, "identity service rejected credentials");
            }
            return Err(TokenError::AuthenticationFailed);
        }

        let identity: IdentityResponse = response.json().await.map_err(|err| {
            warn!(error = %err, "identity service returned an unreadable body");
            TokenError::AuthenticationFailed
        })?;

        Ok(identity.id)
    }
}
