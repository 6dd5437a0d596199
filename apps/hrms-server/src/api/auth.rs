// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Login and logout endpoints.

use axum::{
    extract::{rejection::JsonRejection, State},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    auth::{AuthError, Role},
    error::ApiError,
    state::AppState,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Issued on a successful login. The role is informational; it is never
/// read back from the token.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    /// Bearer token for the `Authorization` header
    pub token: String,
    pub role: Role,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

/// Exchange a username and password for a bearer token.
#[utoipa::path(
    post,
    path = "/api/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token issued", body = LoginResponse),
        (status = 400, description = "Malformed request body", body = MessageResponse),
        (status = 401, description = "Invalid username or password", body = MessageResponse),
    )
)]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, Response> {
    let Json(request) = payload.map_err(|rejection| ApiError::from(rejection).into_response())?;

    let Some(account) = state
        .identities
        .verify_credentials(&request.username, &request.password)
        .await
    else {
        tracing::info!(username = %request.username, "Login rejected");
        return Err(AuthError::InvalidCredentials.into_response());
    };

    let token = state
        .tokens
        .issue(&account.username)
        .map_err(|e| AuthError::from(e).into_response())?;

    tracing::info!(username = %account.username, role = %account.role, "Login succeeded");
    Ok(Json(LoginResponse {
        token,
        role: account.role,
    }))
}

/// Tokens are stateless, so logging out is the client discarding its token.
#[utoipa::path(
    post,
    path = "/api/logout",
    tag = "Auth",
    responses(
        (status = 200, description = "Logged out", body = MessageResponse),
    )
)]
pub async fn logout() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "Logged out".to_string(),
    })
}
