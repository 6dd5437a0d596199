// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! All configuration is read from the environment once at startup and is
//! immutable afterwards.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `JWT_SECRET` | HMAC key for signing tokens (min 32 bytes) | Required |
//! | `TOKEN_VALIDITY_SECS` | Token lifetime in seconds (max 30 days) | `36000` |
//! | `CORS_ALLOWED_ORIGINS` | Comma-separated allowed origins | `http://localhost:5173` |
//! | `ACCESS_POLICY_PATH` | JSON file replacing the built-in route table | Built-in |
//! | `SEED_ACCOUNTS_PATH` | JSON file of accounts created at startup | None |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::{net::SocketAddr, path::PathBuf, time::Duration};

use crate::auth::DEFAULT_TOKEN_VALIDITY;

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const JWT_SECRET_ENV: &str = "JWT_SECRET";
pub const TOKEN_VALIDITY_ENV: &str = "TOKEN_VALIDITY_SECS";
pub const CORS_ALLOWED_ORIGINS_ENV: &str = "CORS_ALLOWED_ORIGINS";
pub const ACCESS_POLICY_PATH_ENV: &str = "ACCESS_POLICY_PATH";
pub const SEED_ACCOUNTS_PATH_ENV: &str = "SEED_ACCOUNTS_PATH";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_CORS_ORIGIN: &str = "http://localhost:5173";

/// Longest token lifetime accepted (30 days).
pub const MAX_TOKEN_VALIDITY_SECS: u64 = 30 * 24 * 60 * 60;

/// Shortest signing key accepted for HS256.
pub const MIN_SECRET_LEN: usize = 32;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Process configuration.
///
/// `Debug` redacts the signing key.
#[derive(Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub jwt_secret: Vec<u8>,
    pub token_validity: Duration,
    pub cors_allowed_origins: Vec<String>,
    pub access_policy_path: Option<PathBuf>,
    pub seed_accounts_path: Option<PathBuf>,
}

impl AppConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = match lookup(PORT_ENV) {
            Some(raw) => raw.parse::<u16>().map_err(|e| ConfigError::Invalid {
                name: PORT_ENV,
                reason: e.to_string(),
            })?,
            None => DEFAULT_PORT,
        };
        let bind_addr = format!("{host}:{port}")
            .parse::<SocketAddr>()
            .map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
                name: HOST_ENV,
                reason: e.to_string(),
            })?;

        let jwt_secret = lookup(JWT_SECRET_ENV)
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::Missing(JWT_SECRET_ENV))?
            .into_bytes();
        if jwt_secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::Invalid {
                name: JWT_SECRET_ENV,
                reason: format!("must be at least {MIN_SECRET_LEN} bytes"),
            });
        }

        let token_validity = match lookup(TOKEN_VALIDITY_ENV) {
            Some(raw) => {
                let secs = raw.parse::<u64>().map_err(|e| ConfigError::Invalid {
                    name: TOKEN_VALIDITY_ENV,
                    reason: e.to_string(),
                })?;
                if secs == 0 || secs > MAX_TOKEN_VALIDITY_SECS {
                    return Err(ConfigError::Invalid {
                        name: TOKEN_VALIDITY_ENV,
                        reason: format!("must be between 1 and {MAX_TOKEN_VALIDITY_SECS} seconds"),
                    });
                }
                Duration::from_secs(secs)
            }
            None => DEFAULT_TOKEN_VALIDITY,
        };

        let cors_allowed_origins = lookup(CORS_ALLOWED_ORIGINS_ENV)
            .unwrap_or_else(|| DEFAULT_CORS_ORIGIN.to_string())
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(String::from)
            .collect();

        Ok(Self {
            bind_addr,
            jwt_secret,
            token_validity,
            cors_allowed_origins,
            access_policy_path: lookup(ACCESS_POLICY_PATH_ENV).map(PathBuf::from),
            seed_accounts_path: lookup(SEED_ACCOUNTS_PATH_ENV).map(PathBuf::from),
        })
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("bind_addr", &self.bind_addr)
            .field("jwt_secret", &"<redacted>")
            .field("token_validity", &self.token_validity)
            .field("cors_allowed_origins", &self.cors_allowed_origins)
            .field("access_policy_path", &self.access_policy_path)
            .field("seed_accounts_path", &self.seed_accounts_path)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn load(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn defaults_apply_when_only_secret_is_set() {
        let config = load(&[(JWT_SECRET_ENV, SECRET)]).unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:8080".parse::<SocketAddr>().unwrap());
        assert_eq!(config.token_validity, Duration::from_secs(36_000));
        assert_eq!(config.cors_allowed_origins, vec!["http://localhost:5173"]);
        assert!(config.access_policy_path.is_none());
        assert!(config.seed_accounts_path.is_none());
    }

    #[test]
    fn missing_secret_is_an_error() {
        assert!(matches!(
            load(&[]),
            Err(ConfigError::Missing(JWT_SECRET_ENV))
        ));
        assert!(matches!(
            load(&[(JWT_SECRET_ENV, "")]),
            Err(ConfigError::Missing(JWT_SECRET_ENV))
        ));
    }

    #[test]
    fn short_secret_is_rejected() {
        assert!(matches!(
            load(&[(JWT_SECRET_ENV, "short")]),
            Err(ConfigError::Invalid { name: JWT_SECRET_ENV, .. })
        ));
    }

    #[test]
    fn overrides_are_parsed() {
        let config = load(&[
            (JWT_SECRET_ENV, SECRET),
            (HOST_ENV, "127.0.0.1"),
            (PORT_ENV, "9000"),
            (TOKEN_VALIDITY_ENV, "600"),
            (CORS_ALLOWED_ORIGINS_ENV, "https://hr.example.com, https://app.example.com"),
            (ACCESS_POLICY_PATH_ENV, "/etc/hrms/policy.json"),
        ])
        .unwrap();

        assert_eq!(config.bind_addr, "127.0.0.1:9000".parse::<SocketAddr>().unwrap());
        assert_eq!(config.token_validity, Duration::from_secs(600));
        assert_eq!(
            config.cors_allowed_origins,
            vec!["https://hr.example.com", "https://app.example.com"]
        );
        assert_eq!(
            config.access_policy_path,
            Some(PathBuf::from("/etc/hrms/policy.json"))
        );
    }

    #[test]
    fn invalid_numbers_are_rejected() {
        assert!(load(&[(JWT_SECRET_ENV, SECRET), (PORT_ENV, "http")]).is_err());
        assert!(load(&[(JWT_SECRET_ENV, SECRET), (TOKEN_VALIDITY_ENV, "0")]).is_err());
        assert!(load(&[(JWT_SECRET_ENV, SECRET), (TOKEN_VALIDITY_ENV, "-5")]).is_err());
    }

    #[test]
    fn token_validity_has_an_upper_bound() {
        let max = MAX_TOKEN_VALIDITY_SECS.to_string();
        let config = load(&[(JWT_SECRET_ENV, SECRET), (TOKEN_VALIDITY_ENV, &max)]).unwrap();
        assert_eq!(config.token_validity, Duration::from_secs(MAX_TOKEN_VALIDITY_SECS));

        let over = (MAX_TOKEN_VALIDITY_SECS + 1).to_string();
        for raw in [over.as_str(), "9223372036854775807", "18446744073709551615"] {
            assert!(
                matches!(
                    load(&[(JWT_SECRET_ENV, SECRET), (TOKEN_VALIDITY_ENV, raw)]),
                    Err(ConfigError::Invalid { name: TOKEN_VALIDITY_ENV, .. })
                ),
                "{raw} should be rejected"
            );
        }
    }

    #[test]
    fn debug_redacts_secret() {
        let config = load(&[(JWT_SECRET_ENV, SECRET)]).unwrap();
        assert!(!format!("{config:?}").contains(SECRET));
    }
}
