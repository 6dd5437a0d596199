// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::accounts::AccountStore;
use crate::auth::{AccessPolicy, IdentityResolver, TokenCodec};

/// Process-wide state shared by every request.
///
/// Everything here is read-only after startup; the account store handles its
/// own locking.
#[derive(Clone)]
pub struct AppState {
    pub tokens: Arc<TokenCodec>,
    pub identities: IdentityResolver,
    pub policy: Arc<AccessPolicy>,
}

impl AppState {
    pub fn new(tokens: TokenCodec, accounts: Arc<dyn AccountStore>, policy: AccessPolicy) -> Self {
        Self {
            tokens: Arc::new(tokens),
            identities: IdentityResolver::new(accounts),
            policy: Arc::new(policy),
        }
    }
}
