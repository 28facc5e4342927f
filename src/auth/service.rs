//! 凭据服务：签发与撤销
//!
//! 令牌状态（从本服务观察）：
//! `Unissued -> Active -> {ExpiredNaturally | RevokedEarly} -> Gone`

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, instrument};

use super::identity::AuthenticationProvider;
use super::store::RevocationStore;
use super::token::{SubjectId, TokenClaims, TokenCodec};
use crate::error::{InfraResultExt, Result};

/// 默认撤销安全余量（秒），吸收时钟偏差和存储传播延迟
pub const DEFAULT_REVOCATION_MARGIN_SECS: u64 = 5;

/// A freshly minted token and the subject it was bound to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub subject: SubjectId,
}

/// Result of a revoke call; both variants are successes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevokeOutcome {
    /// Marker written with this TTL.
    Revoked { ttl: Duration },
    /// Token was already past natural expiry; nothing written.
    AlreadyExpired,
}

pub struct CredentialService {
    provider: Arc<dyn AuthenticationProvider>,
    codec: Arc<TokenCodec>,
    store: Arc<dyn RevocationStore>,
    revocation_margin: Duration,
}

impl CredentialService {
    pub fn new(
        provider: Arc<dyn AuthenticationProvider>,
        codec: Arc<TokenCodec>,
        store: Arc<dyn RevocationStore>,
    ) -> Self {
        Self {
            provider,
            codec,
            store,
            revocation_margin: Duration::from_secs(DEFAULT_REVOCATION_MARGIN_SECS),
        }
    }

    pub fn with_revocation_margin(mut self, margin: Duration) -> Self {
        self.revocation_margin = margin;
        self
    }

    /// Authenticates against the identity service and mints a token with the
    /// default TTL.
    pub async fn issue(&self, nickname: &str, secret: &str) -> Result<IssuedToken> {
        self.issue_inner(nickname, secret, None).await
    }

    /// Same as [`issue`](Self::issue) with an explicit TTL.
    pub async fn issue_with_ttl(
        &self,
        nickname: &str,
        secret: &str,
        ttl: Duration,
    ) -> Result<IssuedToken> {
        self.issue_inner(nickname, secret, Some(ttl)).await
    }

    #[instrument(skip(self, secret))]
    async fn issue_inner(
        &self,
        nickname: &str,
        secret: &str,
        ttl: Option<Duration>,
    ) -> Result<IssuedToken> {
        let subject = self.provider.verify(nickname, secret).await?;
        let token = self.codec.encode_now(&subject, ttl)?;

        info!(subject = %subject, "token issued");
        Ok(IssuedToken { token, subject })
    }

    /// Revokes a token the caller holds. The token must still carry a valid
    /// signature and must not be expired.
    pub async fn revoke(&self, token: &str) -> Result<RevokeOutcome> {
        let claims = self.codec.decode(token)?;
        self.revoke_decoded(token, &claims).await
    }

    /// Revokes a token whose claims were already decoded by the caller
    /// (e.g. by the request authentication step).
    ///
    /// The marker lives for the token's remaining lifetime plus the safety
    /// margin. Revoking again rewrites the marker with a recomputed TTL.
    pub async fn revoke_decoded(&self, token: &str, claims: &TokenClaims) -> Result<RevokeOutcome> {
        let now = self.codec.clock().now();
        let margin = i64::try_from(self.revocation_margin.as_secs()).unwrap_or(i64::MAX);
        let remaining = claims.remaining_secs(now).saturating_add(margin);

        if remaining <= 0 {
            debug!(jti = %claims.jti, "token already past expiry, nothing to revoke");
            return Ok(RevokeOutcome::AlreadyExpired);
        }

        let ttl = Duration::from_secs(remaining.unsigned_abs());
        self.store
            .write_with_ttl(token, ttl)
            .await
            .or_store_unavailable()?;

        info!(subject = %claims.user_id, jti = %claims.jti, ttl_secs = ttl.as_secs(), "token revoked");
        Ok(RevokeOutcome::Revoked { ttl })
    }

    pub fn codec(&self) -> &Arc<TokenCodec> {
        &self.codec
    }

    pub fn revocation_margin(&self) -> Duration {
        self.revocation_margin
    }
}
