// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Account Store
//!
//! Accounts pair a unique username with a role and an Argon2 credential.
//! The gatekeeper only ever reads them; creation happens through seeding at
//! startup.
//!
//! The [`AccountStore`] trait is the seam to the persistence layer. The
//! bundled [`InMemoryAccountStore`] keeps accounts in a `HashMap` behind a
//! tokio `RwLock`, so lookups from concurrent requests share a read lock.

use std::{collections::HashMap, path::Path};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::auth::{
    password::{hash_password, PasswordError},
    Role,
};

/// A stored account.
///
/// `password_hash` is skipped on serialization and redacted from `Debug`.
#[derive(Clone, Serialize)]
pub struct Account {
    /// Opaque identifier
    pub id: Uuid,
    /// Unique, case-sensitive login name
    pub username: String,
    /// Current role
    pub role: Role,
    /// Argon2 PHC string
    #[serde(skip_serializing)]
    pub password_hash: String,
}

impl std::fmt::Debug for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Account")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("role", &self.role)
            .field("password_hash", &"<redacted>")
            .finish()
    }
}

/// One entry of the startup seed file.
#[derive(Debug, Clone, Deserialize)]
pub struct SeedAccount {
    pub username: String,
    pub password: String,
    pub role: Role,
}

#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error("account already exists: {0}")]
    Duplicate(String),
    #[error("account not found: {0}")]
    NotFound(String),
    #[error("username must not be empty")]
    EmptyUsername,
    #[error(transparent)]
    Password(#[from] PasswordError),
    #[error("failed to read seed file {path}: {reason}")]
    SeedFile { path: String, reason: String },
}

/// Read-side persistence capability consumed by the identity resolver.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Exact, case-sensitive lookup by username.
    async fn find_by_username(&self, username: &str) -> Option<Account>;
}

#[derive(Default)]
pub struct InMemoryAccountStore {
    accounts: RwLock<HashMap<String, Account>>,
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a prepared account. Usernames are unique.
    pub async fn insert(&self, account: Account) -> Result<(), AccountError> {
        if account.username.is_empty() {
            return Err(AccountError::EmptyUsername);
        }

        let mut accounts = self.accounts.write().await;
        if accounts.contains_key(&account.username) {
            return Err(AccountError::Duplicate(account.username));
        }
        accounts.insert(account.username.clone(), account);
        Ok(())
    }

    /// Hash `password` and create a new account.
    pub async fn create(
        &self,
        username: impl Into<String>,
        password: &str,
        role: Role,
    ) -> Result<Account, AccountError> {
        let account = Account {
            id: Uuid::new_v4(),
            username: username.into(),
            role,
            password_hash: hash_password(password)?,
        };
        self.insert(account.clone()).await?;
        Ok(account)
    }

    /// Change an account's role. Takes effect on the account's next request.
    pub async fn set_role(&self, username: &str, role: Role) -> Result<(), AccountError> {
        let mut accounts = self.accounts.write().await;
        let account = accounts
            .get_mut(username)
            .ok_or_else(|| AccountError::NotFound(username.to_string()))?;
        account.role = role;
        Ok(())
    }

    /// Create every seed account, stopping at the first failure.
    pub async fn seed(&self, seeds: Vec<SeedAccount>) -> Result<usize, AccountError> {
        let count = seeds.len();
        for seed in seeds {
            self.create(seed.username, &seed.password, seed.role).await?;
        }
        Ok(count)
    }

    pub async fn len(&self) -> usize {
        self.accounts.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.accounts.read().await.is_empty()
    }
}

#[async_trait]
impl AccountStore for InMemoryAccountStore {
    async fn find_by_username(&self, username: &str) -> Option<Account> {
        self.accounts.read().await.get(username).cloned()
    }
}

/// Load seed accounts from a JSON array file.
pub fn load_seed_file(path: impl AsRef<Path>) -> Result<Vec<SeedAccount>, AccountError> {
    let path = path.as_ref();
    let seed_error = |reason: String| AccountError::SeedFile {
        path: path.display().to_string(),
        reason,
    };

    let raw = std::fs::read_to_string(path).map_err(|e| seed_error(e.to_string()))?;
    serde_json::from_str(&raw).map_err(|e| seed_error(e.to_string()))
}
