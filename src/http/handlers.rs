use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::auth::{BasicCredentials, TokenAuth};
use crate::auth::CredentialService;
use crate::error::TokenError;

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

/// `POST /api/tokens` — basic auth with nickname and password.
pub async fn new_token(
    State(credentials): State<Arc<CredentialService>>,
    creds: BasicCredentials,
) -> Result<Json<TokenResponse>, TokenError> {
    let issued = credentials.issue(&creds.nickname, &creds.secret).await?;
    Ok(Json(TokenResponse {
        token: issued.token,
    }))
}

/// `DELETE /api/tokens` — revokes the bearer token used to call it.
pub async fn revoke_token(
    State(credentials): State<Arc<CredentialService>>,
    auth: TokenAuth,
) -> Result<StatusCode, TokenError> {
    // an already expired token is still reported as success
    credentials.revoke_decoded(&auth.token, &auth.claims).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
