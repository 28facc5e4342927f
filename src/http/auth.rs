//! 请求认证提取器
//!
//! 认证结果作为显式值交给处理函数，不挂在请求上下文里。

use std::sync::Arc;

use axum::extract::{FromRef, FromRequestParts};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use http::header::AUTHORIZATION;
use http::request::Parts;
use tracing::debug;

use crate::auth::{CredentialService, TokenClaims, TokenVerifier, VerifiedToken};
use crate::error::TokenError;

/// Nickname and secret from an `Authorization: Basic` header
#[derive(Clone, PartialEq, Eq)]
pub struct BasicCredentials {
    pub nickname: String,
    pub secret: String,
}

impl std::fmt::Debug for BasicCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicCredentials")
            .field("nickname", &self.nickname)
            .finish_non_exhaustive()
    }
}

/// Raw token from an `Authorization: Bearer` header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BearerToken(pub String);

/// Token auth: a bearer token with a valid signature that has not expired.
/// The revocation list is not consulted, so an already revoked token can be
/// revoked again.
#[derive(Debug, Clone)]
pub struct TokenAuth {
    pub token: String,
    pub claims: TokenClaims,
}

/// Full resource-server check: signature, expiry and revocation.
#[derive(Debug, Clone)]
pub struct AuthenticatedSubject(pub VerifiedToken);

fn authorization<'a>(parts: &'a Parts, scheme: &str) -> Option<&'a str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (given, rest) = value.split_once(' ')?;
    given
        .eq_ignore_ascii_case(scheme)
        .then(|| rest.trim())
        .filter(|rest| !rest.is_empty())
}

impl BasicCredentials {
    pub fn from_header(parts: &Parts) -> Option<Self> {
        let encoded = authorization(parts, "Basic")?;
        let decoded = STANDARD.decode(encoded).ok()?;
        let decoded = String::from_utf8(decoded).ok()?;
        let (nickname, secret) = decoded.split_once(':')?;

        Some(Self {
            nickname: nickname.to_string(),
            secret: secret.to_string(),
        })
    }
}

impl<S> FromRequestParts<S> for BasicCredentials
where
    S: Send + Sync,
{
    type Rejection = TokenError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Self::from_header(parts).ok_or_else(|| {
            debug!("missing or unreadable basic credentials");
            TokenError::AuthenticationFailed
        })
    }
}

impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = TokenError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        authorization(parts, "Bearer")
            .map(|token| BearerToken(token.to_string()))
            .ok_or(TokenError::AuthenticationFailed)
    }
}

impl<S> FromRequestParts<S> for TokenAuth
where
    Arc<CredentialService>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = TokenError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let BearerToken(token) = BearerToken::from_request_parts(parts, state).await?;
        let credentials = Arc::<CredentialService>::from_ref(state);
        let claims = credentials.codec().decode(&token)?;
        Ok(Self { token, claims })
    }
}

impl<S> FromRequestParts<S> for AuthenticatedSubject
where
    Arc<TokenVerifier>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = TokenError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let BearerToken(token) = BearerToken::from_request_parts(parts, state).await?;
        let verifier = Arc::<TokenVerifier>::from_ref(state);
        verifier.check(&token).await.map(AuthenticatedSubject)
    }
}
