// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Access Policy
//!
//! A table of path patterns and what each requires of the caller. The table
//! is built once at startup and only read afterwards.
//!
//! ## Patterns
//!
//! Ant-style, matched segment by segment:
//!
//! - `/api/login` matches exactly that path
//! - `/hr/*` matches one segment below `/hr`
//! - `/hr/**` matches `/hr` and anything below it (`**` must be last)
//!
//! ## Precedence
//!
//! Of all rules matching a path, the most specific pattern wins: more literal
//! segments, then more `*` segments, then no trailing `**`. Equally specific
//! matches fall back to requirement order (public, role, authenticated) and
//! then table order. Paths no rule matches need any authenticated identity.
//!
//! Method is ignored, except that `OPTIONS` preflights are always allowed.
//!
//! Request paths are percent-decoded segment by segment before matching, so
//! `/%68r/dashboard` is governed by `/hr/**`. Paths that only make sense
//! after further normalization (`..`, encoded `/`, `//`) are denied.

use std::{cmp::Reverse, path::Path};

use axum::http::Method;
use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};

use super::{claims::AuthenticatedUser, roles::Role};

#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    #[error("invalid path pattern {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: &'static str },
    #[error("failed to load access policy from {path}: {reason}")]
    File { path: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Wildcard,
}

/// A parsed path pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PathPattern {
    raw: String,
    segments: Vec<Segment>,
    open_ended: bool,
}

/// Percent-decoded segments of a request path, as the router's `Path`
/// extractor will see them.
///
/// `None` when the path cannot be compared safely against patterns: no
/// leading `/`, invalid UTF-8 after decoding, an encoded `/`, a `.` or `..`
/// segment, or an empty segment anywhere but the end.
fn canonical_segments(path: &str) -> Option<Vec<String>> {
    let rest = path.strip_prefix('/')?;
    if rest.is_empty() {
        return Some(Vec::new());
    }

    let raw: Vec<&str> = rest.split('/').collect();
    let last = raw.len() - 1;
    raw.into_iter()
        .enumerate()
        .map(|(i, segment)| {
            let decoded = percent_decode_str(segment).decode_utf8().ok()?.into_owned();
            let canonical = match decoded.as_str() {
                "" => i == last,
                "." | ".." => false,
                d => !d.contains('/'),
            };
            canonical.then_some(decoded)
        })
        .collect()
}

/// Ordering key for overlapping patterns; greater is more specific.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Specificity {
    literals: usize,
    wildcards: usize,
    closed: bool,
}

impl PathPattern {
    pub fn parse(raw: &str) -> Result<Self, PolicyError> {
        let invalid = |reason| PolicyError::InvalidPattern {
            pattern: raw.to_string(),
            reason,
        };

        let rest = raw.strip_prefix('/').ok_or_else(|| invalid("must start with '/'"))?;

        let mut segments = Vec::new();
        let mut open_ended = false;
        if !rest.is_empty() {
            let parts: Vec<&str> = rest.split('/').collect();
            let last = parts.len() - 1;
            for (i, part) in parts.into_iter().enumerate() {
                match part {
                    "" => return Err(invalid("empty segment")),
                    "**" if i == last => open_ended = true,
                    "**" => return Err(invalid("'**' is only allowed as the last segment")),
                    "*" => segments.push(Segment::Wildcard),
                    p if p.contains('*') => {
                        return Err(invalid("'*' must be a whole segment"))
                    }
                    p => segments.push(Segment::Literal(p.to_string())),
                }
            }
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
            open_ended,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Match a request path. Segments are percent-decoded first; a path
    /// that does not decode to plain segments matches nothing.
    pub fn matches(&self, path: &str) -> bool {
        canonical_segments(path).is_some_and(|parts| self.matches_segments(&parts))
    }

    fn matches_segments(&self, parts: &[String]) -> bool {
        let length_ok = if self.open_ended {
            parts.len() >= self.segments.len()
        } else {
            parts.len() == self.segments.len()
        };

        length_ok
            && self
                .segments
                .iter()
                .zip(parts)
                .all(|(segment, part)| match segment {
                    Segment::Literal(literal) => literal == part,
                    Segment::Wildcard => !part.is_empty(),
                })
    }

    fn specificity(&self) -> Specificity {
        let wildcards = self
            .segments
            .iter()
            .filter(|s| **s == Segment::Wildcard)
            .count();
        Specificity {
            literals: self.segments.len() - wildcards,
            wildcards,
            closed: !self.open_ended,
        }
    }
}

impl TryFrom<String> for PathPattern {
    type Error = PolicyError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        PathPattern::parse(&raw)
    }
}

impl From<PathPattern> for String {
    fn from(pattern: PathPattern) -> Self {
        pattern.raw
    }
}

/// What a matching rule demands of the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Requirement {
    /// Anyone, with or without a token
    Public,
    /// Any authenticated identity
    Authenticated,
    /// An authenticated identity holding exactly this role
    Role(Role),
}

impl Requirement {
    /// Tie-break order between equally specific patterns.
    fn rank(&self) -> u8 {
        match self {
            Requirement::Public => 0,
            Requirement::Role(_) => 1,
            Requirement::Authenticated => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessRule {
    pub pattern: PathPattern,
    pub access: Requirement,
}

impl AccessRule {
    pub fn new(pattern: &str, access: Requirement) -> Result<Self, PolicyError> {
        Ok(Self {
            pattern: PathPattern::parse(pattern)?,
            access,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

#[derive(Debug, Clone)]
pub struct AccessPolicy {
    rules: Vec<AccessRule>,
}

const PUBLIC_PATHS: &[&str] = &[
    "/api/login",
    "/login",
    "/logout",
    "/api/logout",
    "/verify-payment",
    "/api/auth/**",
    "/api/jobs/**",
    "/health/**",
    "/docs/**",
    "/api-doc/**",
];

const AUTHENTICATED_PATHS: &[&str] = &[
    "/api/hrdashboard",
    "/create-order",
    "/api/employee",
    "/api/admindashboard",
    "/api/recruiter",
    "/api/payroll",
    "/api/finance",
    "/api/test",
    "/api/me",
    "/post-job",
];

const ROLE_PATHS: &[(&str, Role)] = &[
    ("/api/payroll/**", Role::Finance),
    ("/admin/**", Role::Admin),
    ("/employee/**", Role::Employee),
    ("/hr/**", Role::Hr),
    ("/recruiter/**", Role::Recruiter),
    ("/finance/**", Role::Finance),
];

impl AccessPolicy {
    pub fn new(rules: Vec<AccessRule>) -> Self {
        Self { rules }
    }

    /// The HR application's route table.
    pub fn hrms_default() -> Result<Self, PolicyError> {
        let public = PUBLIC_PATHS
            .iter()
            .map(|p| AccessRule::new(p, Requirement::Public));
        let authenticated = AUTHENTICATED_PATHS
            .iter()
            .map(|p| AccessRule::new(p, Requirement::Authenticated));
        let roles = ROLE_PATHS
            .iter()
            .map(|(p, role)| AccessRule::new(p, Requirement::Role(*role)));

        public
            .chain(authenticated)
            .chain(roles)
            .collect::<Result<Vec<_>, _>>()
            .map(Self::new)
    }

    /// Load a rule table from a JSON array of `{pattern, access}` objects.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, PolicyError> {
        let path = path.as_ref();
        let file_error = |reason: String| PolicyError::File {
            path: path.display().to_string(),
            reason,
        };

        let raw = std::fs::read_to_string(path).map_err(|e| file_error(e.to_string()))?;
        let rules: Vec<AccessRule> =
            serde_json::from_str(&raw).map_err(|e| file_error(e.to_string()))?;
        Ok(Self::new(rules))
    }

    pub fn rules(&self) -> &[AccessRule] {
        &self.rules
    }

    /// The rule that governs `path`, if any.
    pub fn rule_for(&self, path: &str) -> Option<&AccessRule> {
        let parts = canonical_segments(path)?;
        self.rule_for_segments(&parts)
    }

    fn rule_for_segments(&self, parts: &[String]) -> Option<&AccessRule> {
        self.rules
            .iter()
            .enumerate()
            .filter(|(_, rule)| rule.pattern.matches_segments(parts))
            .max_by_key(|(index, rule)| {
                (
                    rule.pattern.specificity(),
                    Reverse(rule.access.rank()),
                    Reverse(*index),
                )
            })
            .map(|(_, rule)| rule)
    }

    pub fn authorize(
        &self,
        path: &str,
        method: &Method,
        identity: Option<&AuthenticatedUser>,
    ) -> Decision {
        if *method == Method::OPTIONS {
            return Decision::Allow;
        }

        let Some(parts) = canonical_segments(path) else {
            return Decision::Deny;
        };

        let allowed = match self.rule_for_segments(&parts).map(|rule| rule.access) {
            Some(Requirement::Public) => true,
            Some(Requirement::Role(role)) => identity.is_some_and(|user| user.has_role(role)),
            Some(Requirement::Authenticated) | None => identity.is_some(),
        };

        if allowed {
            Decision::Allow
        } else {
            Decision::Deny
        }
    }
}
