// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.
//!
//! Token problems never reach the client: the gatekeeper collapses them into
//! "no identity" and lets the access policy decide. Only the variants of
//! [`AuthError`] are ever rendered as responses, each with a fixed body.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Fixed message for policy denials.
pub const ACCESS_DENIED_MESSAGE: &str = "Unauthorized access";

/// Fixed message for failed logins (unknown user and wrong password alike).
pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid username or password";

const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// Outcome of verifying a token that did not come back valid.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    /// Unparsable, bad signature, or issued for another subject
    #[error("token is malformed")]
    Malformed,
    /// Signature is good but the expiry has passed
    #[error("token has expired")]
    Expired,
    /// The codec itself failed (key or crypto backend problem)
    #[error("token signing failed: {0}")]
    Signing(String),
}

/// Errors rendered to clients by the auth layer.
#[derive(Debug)]
pub enum AuthError {
    /// Access policy denied the request
    AccessDenied,
    /// Login failed
    InvalidCredentials,
    /// Token could not be signed or verified due to server misconfiguration
    SigningFailure(String),
}

#[derive(Serialize)]
struct AuthErrorBody {
    message: &'static str,
}

impl AuthError {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::AccessDenied => StatusCode::FORBIDDEN,
            AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AuthError::SigningFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing message. Never carries internal detail.
    pub fn public_message(&self) -> &'static str {
        match self {
            AuthError::AccessDenied => ACCESS_DENIED_MESSAGE,
            AuthError::InvalidCredentials => INVALID_CREDENTIALS_MESSAGE,
            AuthError::SigningFailure(_) => INTERNAL_ERROR_MESSAGE,
        }
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::AccessDenied => write!(f, "Access denied by policy"),
            AuthError::InvalidCredentials => write!(f, "Invalid credentials"),
            AuthError::SigningFailure(msg) => write!(f, "Token signing failure: {msg}"),
        }
    }
}

impl std::error::Error for AuthError {}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Signing(msg) => AuthError::SigningFailure(msg),
            // Credential problems are not errors at this layer.
            TokenError::Malformed | TokenError::Expired => AuthError::AccessDenied,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        if let AuthError::SigningFailure(ref msg) = self {
            tracing::error!(error = %msg, "Token signing failure");
        }
        let status = self.status_code();
        let body = Json(AuthErrorBody {
            message: self.public_message(),
        });
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn access_denied_returns_403_with_fixed_body() {
        let response = AuthError::AccessDenied.into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = String::from_utf8(body_bytes.to_vec()).unwrap();
        assert_eq!(body, r#"{"message":"Unauthorized access"}"#);
    }

    #[tokio::test]
    async fn invalid_credentials_returns_401() {
        let response = AuthError::InvalidCredentials.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();
        assert_eq!(body["message"], INVALID_CREDENTIALS_MESSAGE);
        assert!(body.get("token").is_none());
    }

    #[tokio::test]
    async fn signing_failure_hides_detail() {
        let response = AuthError::SigningFailure("bad key length".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = String::from_utf8(body_bytes.to_vec()).unwrap();
        assert!(!body.contains("bad key length"));
    }

    #[test]
    fn token_signing_error_maps_to_signing_failure() {
        let err: AuthError = TokenError::Signing("boom".into()).into();
        assert!(matches!(err, AuthError::SigningFailure(_)));
    }
}
