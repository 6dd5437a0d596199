// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User roles for authorization.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Account roles known to the access policy.
///
/// Roles are flat: holding one role grants nothing implied by another.
/// `Admin` only opens `/admin/**`, it is not a superuser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// System administration screens
    #[serde(alias = "ROLE_ADMIN")]
    Admin,
    /// Human resources staff
    #[serde(alias = "ROLE_HR")]
    Hr,
    /// Regular employee self-service
    #[serde(alias = "ROLE_EMPLOYEE")]
    Employee,
    /// Recruiting and job postings
    #[serde(alias = "ROLE_RECRUITER")]
    Recruiter,
    /// Payroll and finance
    #[serde(alias = "ROLE_FINANCE")]
    Finance,
}

/// Returned when a role name is not one of the known variants.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl Role {
    pub const ALL: [Role; 5] = [
        Role::Admin,
        Role::Hr,
        Role::Employee,
        Role::Recruiter,
        Role::Finance,
    ];

    /// Canonical upper-case name, as stored and returned to clients.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Hr => "HR",
            Role::Employee => "EMPLOYEE",
            Role::Recruiter => "RECRUITER",
            Role::Finance => "FINANCE",
        }
    }
}

impl FromStr for Role {
    type Err = UnknownRole;

    /// Parse a role name, case-insensitive, with or without the `ROLE_` prefix.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        let name = upper.strip_prefix("ROLE_").unwrap_or(&upper);
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == name)
            .ok_or_else(|| UnknownRole(s.to_string()))
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
