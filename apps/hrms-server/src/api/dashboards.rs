// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Per-role landing endpoints.
//!
//! Role checks happen in the access policy (`/hr/**` and friends); handlers
//! here only describe the area they serve.

use axum::{extract::Path, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    auth::{Auth, Role},
    error::{ApiError, NOT_FOUND_MESSAGE},
};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DashboardResponse {
    pub area: String,
    pub username: String,
    pub role: Role,
}

/// Area whose URL segment is exactly the lower-case role name.
///
/// Matching is case-sensitive like the policy patterns, so `/HR/dashboard`
/// never reaches the HR area by a route the policy does not guard.
fn area_role(area: &str) -> Option<Role> {
    Role::ALL
        .into_iter()
        .find(|role| role.as_str().to_ascii_lowercase() == area)
}

/// Landing data for one role area.
#[utoipa::path(
    get,
    path = "/{area}/dashboard",
    tag = "Dashboards",
    security(("bearer" = [])),
    params(("area" = String, Path, description = "admin, hr, employee, recruiter or finance")),
    responses(
        (status = 200, description = "Dashboard data", body = DashboardResponse),
        (status = 403, description = "Caller lacks the area's role"),
        (status = 404, description = "Unknown area"),
    )
)]
pub async fn dashboard(
    Path(area): Path<String>,
    Auth(user): Auth,
) -> Result<Json<DashboardResponse>, ApiError> {
    if area_role(&area).is_none() {
        return Err(ApiError::not_found(NOT_FOUND_MESSAGE));
    }

    Ok(Json(DashboardResponse {
        area,
        username: user.username,
        role: user.role,
    }))
}

/// Smoke endpoint for signed-in clients.
#[utoipa::path(
    get,
    path = "/api/test",
    tag = "Dashboards",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Service reachable with a valid token", body = String),
        (status = 403, description = "Missing or invalid token"),
    )
)]
pub async fn controller_check() -> &'static str {
    "Controller is working"
}
