// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Identity resolution: token subjects and login names to accounts.

use std::sync::Arc;

use crate::accounts::{Account, AccountStore};

use super::password::{verify_password, UNKNOWN_ACCOUNT_HASH};

/// Maps usernames to stored accounts.
///
/// The role is looked up on every call rather than cached or embedded in the
/// token, so a role change is visible on the very next request.
#[derive(Clone)]
pub struct IdentityResolver {
    store: Arc<dyn AccountStore>,
}

impl IdentityResolver {
    pub fn new(store: Arc<dyn AccountStore>) -> Self {
        Self { store }
    }

    /// Exact, case-sensitive lookup. No side effects.
    pub async fn resolve(&self, username: &str) -> Option<Account> {
        self.store.find_by_username(username).await
    }

    /// Resolve `username` and check `password` against its stored hash.
    ///
    /// Returns `None` for an unknown user and for a wrong password alike.
    /// An unknown user is checked against [`UNKNOWN_ACCOUNT_HASH`] so both
    /// failures cost one Argon2 verification. Hashing runs on the blocking
    /// pool.
    pub async fn verify_credentials(&self, username: &str, password: &str) -> Option<Account> {
        let account = self.resolve(username).await;

        let stored_hash = account
            .as_ref()
            .map_or_else(|| UNKNOWN_ACCOUNT_HASH.to_string(), |a| a.password_hash.clone());
        let password = password.to_string();
        let matches = tokio::task::spawn_blocking(move || verify_password(&stored_hash, &password))
            .await
            .unwrap_or_else(|e| {
                tracing::error!(error = %e, "Password verification task failed");
                false
            });

        account.filter(|_| matches)
    }
}
