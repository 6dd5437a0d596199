// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Request gatekeeper and authorization stages for Axum.
//!
//! Two middleware functions run in order in front of every route:
//!
//! 1. [`authenticate`] turns a valid `Authorization: Bearer <token>` header
//!    into an [`AuthenticatedUser`] in the request extensions. It never
//!    rejects: a missing, malformed, expired or foreign token, or a subject
//!    with no account, all leave the request anonymous.
//! 2. [`authorize`] asks the [`AccessPolicy`](super::AccessPolicy) about the
//!    request and either forwards it or answers 403.
//!
//! Keeping every denial in the second stage means there is exactly one place
//! that rejects requests, and nothing about why a token was discarded leaks.
//!
//! ```rust,ignore
//! let app = Router::new()
//!     .route("/api/me", get(me))
//!     .layer(
//!         ServiceBuilder::new()
//!             .layer(from_fn_with_state(state.clone(), authenticate))
//!             .layer(from_fn_with_state(state.clone(), authorize)),
//!     )
//!     .with_state(state);
//! ```

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::{error::TokenError, policy::Decision, AuthError, AuthenticatedUser};
use crate::state::AppState;

/// Scheme prefix expected in the `Authorization` header.
pub const BEARER_PREFIX: &str = "Bearer ";

/// Token portion of a `Bearer` authorization header, if there is one.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix(BEARER_PREFIX)
}

/// Work out who is calling, if anyone.
///
/// `Ok(None)` covers every credential problem. `Err` is reserved for a
/// broken token codec, which is a server fault rather than a bad request.
pub async fn establish_identity(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<Option<AuthenticatedUser>, AuthError> {
    let Some(token) = bearer_token(headers) else {
        return Ok(None);
    };

    let Some(subject) = state.tokens.extract_subject(token) else {
        tracing::debug!(reason = "unparsable", "Discarding bearer token");
        return Ok(None);
    };

    let Some(account) = state.identities.resolve(&subject).await else {
        tracing::debug!(reason = "unknown_subject", "Discarding bearer token");
        return Ok(None);
    };

    match state.tokens.verify(token, &subject) {
        Ok(()) => Ok(Some(AuthenticatedUser::new(account.username, account.role))),
        Err(TokenError::Signing(msg)) => Err(AuthError::SigningFailure(msg)),
        Err(e) => {
            tracing::debug!(reason = %e, "Discarding bearer token");
            Ok(None)
        }
    }
}

/// Gatekeeper stage: attach the caller's identity to the request.
///
/// If an identity is already attached (the stage ran earlier in the same
/// pipeline) it is kept and no lookup happens.
pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    if request.extensions().get::<AuthenticatedUser>().is_none() {
        match establish_identity(&state, request.headers()).await {
            Ok(Some(user)) => {
                request.extensions_mut().insert(user);
            }
            Ok(None) => {}
            Err(e) => return e.into_response(),
        }
    }

    next.run(request).await
}

/// Authorization stage: apply the access policy to the request.
pub async fn authorize(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let identity = request.extensions().get::<AuthenticatedUser>();
    let decision = state
        .policy
        .authorize(request.uri().path(), request.method(), identity);

    match decision {
        Decision::Allow => next.run(request).await,
        Decision::Deny => {
            tracing::info!(
                method = %request.method(),
                path = %request.uri().path(),
                authenticated = identity.is_some(),
                "Request denied by access policy"
            );
            AuthError::AccessDenied.into_response()
        }
    }
}
