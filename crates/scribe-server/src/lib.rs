// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Scribe HTTP server.
//!
//! Receives signed installation webhooks from the GitHub App, and lets
//! authenticated users manage the configuration of repositories in their
//! own installation.

pub mod api;
pub mod api_response;
pub mod auth_middleware;
pub mod error;
pub mod routes;

pub use api::{create_app_state, create_router, AppState};
pub use error::ServerError;
pub use scribe_server_config::ServerConfig;
pub use scribe_server_db as db;
