use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::clock::{Clock, SystemClock};
use crate::error::{Result, TokenError};

/// The only signing algorithm accepted on either side of the codec.
pub const SIGNING_ALGORITHM: Algorithm = Algorithm::HS256;

/// Opaque identity of the authenticated principal, as reported by the
/// identity service (either a numeric or a string id).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SubjectId {
    Int(i64),
    Str(String),
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubjectId::Int(id) => write!(f, "{id}"),
            SubjectId::Str(id) => f.write_str(id),
        }
    }
}

impl From<i64> for SubjectId {
    fn from(id: i64) -> Self {
        SubjectId::Int(id)
    }
}

impl From<String> for SubjectId {
    fn from(id: String) -> Self {
        SubjectId::Str(id)
    }
}

impl From<&str> for SubjectId {
    fn from(id: &str) -> Self {
        SubjectId::Str(id.to_string())
    }
}

/// JWT claims carried by an access token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    pub user_id: SubjectId,
    pub iat: i64,
    pub exp: i64,
    /// Random id so that two tokens minted in the same second differ.
    pub jti: String,
}

impl TokenClaims {
    /// Seconds of natural validity left at `now` (negative once expired).
    pub fn remaining_secs(&self, now: DateTime<Utc>) -> i64 {
        self.exp.saturating_sub(now.timestamp())
    }
}

/// Stateless token codec backed by HMAC (HS256)
pub struct TokenCodec {
    default_ttl: Duration,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    clock: Arc<dyn Clock>,
}

impl TokenCodec {
    /// Creates a codec reading the system clock
    pub fn new(secret: impl AsRef<[u8]>, default_ttl: Duration) -> Self {
        Self::with_clock(secret, default_ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(
        secret: impl AsRef<[u8]>,
        default_ttl: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let secret = secret.as_ref();

        let mut validation = Validation::new(SIGNING_ALGORITHM);
        // expiry is checked against our own clock after signature verification
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            default_ttl,
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            clock,
        }
    }

    /// Signs a token for `subject`, valid from `issued_at` for `ttl`.
    pub fn encode(
        &self,
        subject: &SubjectId,
        issued_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<String> {
        let ttl_secs = i64::try_from(ttl.as_secs())
            .map_err(|_| TokenError::internal("token ttl out of range"))?;
        let iat = issued_at.timestamp();

        let claims = TokenClaims {
            user_id: subject.clone(),
            iat,
            exp: iat.saturating_add(ttl_secs),
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::new(SIGNING_ALGORITHM), &claims, &self.encoding_key)
            .map_err(|err| TokenError::internal(format!("failed to encode token: {err}")))
    }

    /// Signs a token issued now, using `ttl` or the configured default.
    pub fn encode_now(&self, subject: &SubjectId, ttl: Option<Duration>) -> Result<String> {
        self.encode(subject, self.clock.now(), ttl.unwrap_or(self.default_ttl))
    }

    /// Verifies signature and expiry, returning the decoded claims
    ///
    /// Only a string that is not shaped like `header.payload.signature`, or a
    /// correctly signed token lacking `exp`, is `Malformed`. Any other failure
    /// on a three-segment token (including an edited header that no longer
    /// parses) is an `InvalidSignature`.
    pub fn decode(&self, token: &str) -> Result<TokenClaims> {
        if !has_compact_shape(token) {
            return Err(TokenError::Malformed("expected three dot-separated segments".into()));
        }

        let claims = decode::<TokenClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|err| match err.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                ErrorKind::InvalidToken | ErrorKind::MissingRequiredClaim(_) => {
                    TokenError::Malformed(err.to_string())
                }
                _ => TokenError::InvalidSignature,
            })?;

        if self.clock.now_secs() >= claims.exp {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }

    /// Returns the default token TTL
    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }
}

fn has_compact_shape(token: &str) -> bool {
    let segments: Vec<&str> = token.split('.').collect();
    segments.len() == 3 && segments.iter().all(|segment| !segment.is_empty())
}

impl fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCodec")
            .field("algorithm", &SIGNING_ALGORITHM)
            .field("default_ttl", &self.default_ttl)
            .finish_non_exhaustive()
    }
}
