// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token codec: issues and verifies HS256 bearer tokens.
//!
//! Tokens are compact JWS strings carrying `sub`, `iat` and `exp`. Nothing is
//! stored server-side; validity is recomputed from the signature and the
//! timestamps on every use.

use std::time::Duration;

use chrono::{DateTime, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};

use super::{claims::Claims, error::TokenError};

/// Default token lifetime (10 hours).
pub const DEFAULT_TOKEN_VALIDITY: Duration = Duration::from_secs(10 * 60 * 60);

const ALGORITHM: Algorithm = Algorithm::HS256;

/// Signs and verifies identity tokens with a process-wide secret.
///
/// Immutable after construction, so a single instance is shared across all
/// request workers behind an `Arc`.
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validity: Duration,
}

impl TokenCodec {
    pub fn new(secret: &[u8], validity: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validity,
        }
    }

    pub fn validity(&self) -> Duration {
        self.validity
    }

    /// Issue a token for `subject`, valid from now for the configured window.
    pub fn issue(&self, subject: &str) -> Result<String, TokenError> {
        self.issue_at(subject, Utc::now())
    }

    /// Issue a token as if the current time were `now`.
    pub fn issue_at(&self, subject: &str, now: DateTime<Utc>) -> Result<String, TokenError> {
        let iat = now.timestamp();
        let exp = i64::try_from(self.validity.as_secs())
            .ok()
            .and_then(|validity| iat.checked_add(validity))
            .ok_or_else(|| TokenError::Signing("token validity out of range".to_string()))?;
        let claims = Claims {
            sub: subject.to_string(),
            iat,
            exp,
        };

        encode(&Header::new(ALGORITHM), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Verify `token` was signed by us for `expected_subject` and is unexpired.
    pub fn verify(&self, token: &str, expected_subject: &str) -> Result<(), TokenError> {
        self.verify_at(token, expected_subject, Utc::now())
    }

    /// Verify against an explicit clock value.
    ///
    /// Checks run signature first, then subject, then expiry, so a forged or
    /// foreign token is `Malformed` even when it is also past its expiry.
    pub fn verify_at(
        &self,
        token: &str,
        expected_subject: &str,
        now: DateTime<Utc>,
    ) -> Result<(), TokenError> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation())
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidKeyFormat => TokenError::Signing(e.to_string()),
                _ => TokenError::Malformed,
            })?;

        if claims.sub != expected_subject {
            return Err(TokenError::Malformed);
        }

        if now.timestamp() >= claims.exp {
            return Err(TokenError::Expired);
        }

        Ok(())
    }

    /// Read the subject without checking signature or expiry.
    ///
    /// Only used to pick which account to load; the caller must still run
    /// [`TokenCodec::verify`] before trusting anything in the token.
    pub fn extract_subject(&self, token: &str) -> Option<String> {
        jsonwebtoken::dangerous::insecure_decode::<Claims>(token)
            .ok()
            .map(|data| data.claims.sub)
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(ALGORITHM);
        // Expiry is compared against the caller's clock in verify_at.
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["sub", "exp"]);
        validation
    }
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("algorithm", &ALGORITHM)
            .field("validity", &self.validity)
            .finish_non_exhaustive()
    }
}
