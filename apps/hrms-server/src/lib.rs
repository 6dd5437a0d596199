// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! HRMS API gatekeeper.
//!
//! Stateless JWT authentication and route-based role authorization in front
//! of the HR application's HTTP endpoints.
//!
//! ## Modules
//!
//! - `accounts` - Account records and the account store
//! - `api` - HTTP routes and middleware stack (Axum)
//! - `auth` - Token codec, identity resolution, gatekeeper and access policy
//! - `config` - Environment configuration
//! - `logging` - Tracing subscriber setup

pub mod accounts;
pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod logging;
pub mod state;
