// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User endpoints.

use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::{Auth, AuthenticatedUser, Role};

/// Response for GET /api/me
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserMeResponse {
    /// Login name
    pub username: String,
    /// Role as currently stored, not as of login
    pub role: Role,
}

impl From<AuthenticatedUser> for UserMeResponse {
    fn from(user: AuthenticatedUser) -> Self {
        Self {
            username: user.username,
            role: user.role,
        }
    }
}

/// Get the current authenticated user's information.
#[utoipa::path(
    get,
    path = "/api/me",
    tag = "Users",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "User information", body = UserMeResponse),
        (status = 403, description = "Missing or invalid token"),
    )
)]
pub async fn get_current_user(Auth(user): Auth) -> Json<UserMeResponse> {
    Json(user.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_me_response_from_authenticated_user() {
        let response: UserMeResponse = AuthenticatedUser::new("ravi", Role::Recruiter).into();
        assert_eq!(response.username, "ravi");
        assert_eq!(response.role, Role::Recruiter);
    }
}
