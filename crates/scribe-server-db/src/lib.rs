// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Database layer for the Scribe server.
//!
//! Each table group has a `*Store` trait and a SQLite-backed `*Repository`
//! implementing it. Handlers and services hold `Arc<dyn *Store>` so tests can
//! swap in in-memory pools.

mod error;
pub mod configuration;
pub mod installation;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod token;
pub mod types;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use configuration::{ConfigurationRepository, ConfigurationStore};
pub use error::DbError;
pub use installation::{InstallationRepository, InstallationStore};
pub use migrations::run_migrations;
pub use pool::{create_pool, ping};
pub use repository::{RepositoryRepository, RepositoryStore};
pub use token::{TokenRepository, TokenStore};
pub use types::{
	ConfigurationDetails, ConfigurationInput, Installation, InstallationWithRepositories,
	NewInstallation, NewRepository, Repository, RepositoryConfiguration,
};
