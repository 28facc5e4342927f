use std::sync::Arc;

use tracing::{debug, error};

use super::store::RevocationStore;
use super::token::{SubjectId, TokenClaims, TokenCodec};
use crate::error::{InfraResultExt, Result, TokenError};

/// A token that passed signature, expiry and revocation checks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedToken {
    pub subject: SubjectId,
    pub claims: TokenClaims,
}

/// Verification contract for resource servers.
///
/// Signature and expiry are checked first; only a structurally valid token
/// costs a store lookup. An unreachable store rejects the token.
pub struct TokenVerifier {
    codec: Arc<TokenCodec>,
    store: Arc<dyn RevocationStore>,
}

impl TokenVerifier {
    pub fn new(codec: Arc<TokenCodec>, store: Arc<dyn RevocationStore>) -> Self {
        Self { codec, store }
    }

    pub async fn check(&self, token: &str) -> Result<VerifiedToken> {
        let claims = self.codec.decode(token).inspect_err(|err| {
            debug!(error = %err, "token rejected by codec");
        })?;

        let revoked = self
            .store
            .exists(token)
            .await
            .or_store_unavailable()
            .inspect_err(|err| {
                error!(error = %err, jti = %claims.jti, "revocation lookup failed, rejecting token");
            })?;

        if revoked {
            debug!(jti = %claims.jti, "token rejected: revoked");
            return Err(TokenError::Revoked);
        }

        Ok(VerifiedToken {
            subject: claims.user_id.clone(),
            claims,
        })
    }
}
