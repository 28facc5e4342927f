use axum::Json;
use axum::response::{IntoResponse, Response};
use http::header::WWW_AUTHENTICATE;
use serde_json::json;
use tracing::error;

use crate::error::TokenError;

/// Challenge sent with every 401. Naming the "Bearer" scheme keeps browsers
/// from popping up a basic-auth login prompt.
pub const BEARER_CHALLENGE: &str = r#"Bearer realm="Authentication Required""#;

impl IntoResponse for TokenError {
    fn into_response(self) -> Response {
        let status = self.code().http_status();

        // never tell the caller which check failed
        if self.is_authentication() {
            return (
                status,
                [(WWW_AUTHENTICATE, BEARER_CHALLENGE)],
                Json(json!({ "error": "authentication required" })),
            )
                .into_response();
        }

        error!(error = %self, code = %self.code(), "request failed");
        let message = match self {
            TokenError::StoreUnavailable(_) => "service unavailable",
            _ => "internal server error",
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}
