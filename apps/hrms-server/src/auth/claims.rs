// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JWT claims and authenticated user representation.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::roles::Role;

/// Claims carried by tokens this server issues.
///
/// The role is deliberately absent: it is re-read from the account store on
/// every request so role changes apply without reissuing tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (username)
    pub sub: String,

    /// Issued at timestamp (seconds since epoch)
    pub iat: i64,

    /// Expiration timestamp (seconds since epoch)
    pub exp: i64,
}

/// Identity established by the gatekeeper for a single request.
///
/// Lives in the request extensions and is dropped with the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AuthenticatedUser {
    /// Account username (token `sub` claim)
    pub username: String,

    /// Role read from the account store for this request
    pub role: Role,
}

impl AuthenticatedUser {
    pub fn new(username: impl Into<String>, role: Role) -> Self {
        Self {
            username: username.into(),
            role,
        }
    }

    /// Check if the user holds exactly the given role.
    pub fn has_role(&self, required: Role) -> bool {
        self.role == required
    }
}
