// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Stateless bearer-token authentication and route authorization for the
//! HRMS API.
//!
//! ## Auth Flow
//!
//! 1. Client logs in at `POST /api/login` and receives an HS256 JWT
//! 2. Client sends `Authorization: Bearer <JWT>` on later requests
//! 3. Server, per request:
//!    - reads the claimed subject from the token
//!    - loads that account (and its current role) from the account store
//!    - verifies signature, subject and expiry
//!    - attaches an [`AuthenticatedUser`] to the request, or leaves it anonymous
//!    - applies the [`AccessPolicy`] to allow the request or answer 403
//!
//! ## Security
//!
//! - No server-side sessions; tokens are verified from their own content
//! - Roles are never embedded in tokens, so role changes apply immediately
//! - Why a token was discarded is never disclosed to the caller
//! - The signing key is never logged

pub mod claims;
pub mod error;
pub mod extractor;
pub mod identity;
pub mod middleware;
pub mod password;
pub mod policy;
pub mod roles;
pub mod token;

pub use claims::{AuthenticatedUser, Claims};
pub use error::{AuthError, TokenError};
pub use extractor::{Auth, OptionalAuth};
pub use identity::IdentityResolver;
pub use policy::{AccessPolicy, AccessRule, Decision, PathPattern, PolicyError, Requirement};
pub use roles::Role;
pub use token::{TokenCodec, DEFAULT_TOKEN_VALIDITY};
