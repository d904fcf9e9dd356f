// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Bearer token records. Tokens are looked up by their SHA-256 hash.

use async_trait::async_trait;
use sqlx::{sqlite::SqlitePool, Row};

use crate::error::DbError;

#[async_trait]
pub trait TokenStore: Send + Sync {
	async fn create_token(&self, token_hash: &str, username: &str) -> Result<(), DbError>;
	async fn get_username_by_token_hash(&self, token_hash: &str)
		-> Result<Option<String>, DbError>;
	async fn touch_token(&self, token_hash: &str) -> Result<(), DbError>;
}

#[derive(Clone)]
pub struct TokenRepository {
	pool: SqlitePool,
}

impl TokenRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	#[tracing::instrument(skip(self, token_hash), fields(username = %username))]
	pub async fn create_token(&self, token_hash: &str, username: &str) -> Result<(), DbError> {
		let now = chrono::Utc::now().to_rfc3339();

		sqlx::query(
			r#"
			INSERT INTO api_tokens (token_hash, username, created_at)
			VALUES (?1, ?2, ?3)
			"#,
		)
		.bind(token_hash)
		.bind(username)
		.bind(&now)
		.execute(&self.pool)
		.await
		.map_err(|e| DbError::from_insert(e, "token already exists"))?;

		tracing::info!(username = %username, "api_token: created");
		Ok(())
	}

	#[tracing::instrument(skip(self, token_hash))]
	pub async fn get_username_by_token_hash(
		&self,
		token_hash: &str,
	) -> Result<Option<String>, DbError> {
		let row = sqlx::query("SELECT username FROM api_tokens WHERE token_hash = ?")
			.bind(token_hash)
			.fetch_optional(&self.pool)
			.await?;

		Ok(row.map(|r| r.get("username")))
	}

	#[tracing::instrument(skip(self, token_hash))]
	pub async fn touch_token(&self, token_hash: &str) -> Result<(), DbError> {
		let now = chrono::Utc::now().to_rfc3339();

		sqlx::query("UPDATE api_tokens SET last_used_at = ?1 WHERE token_hash = ?2")
			.bind(&now)
			.bind(token_hash)
			.execute(&self.pool)
			.await?;

		Ok(())
	}
}

#[async_trait]
impl TokenStore for TokenRepository {
	async fn create_token(&self, token_hash: &str, username: &str) -> Result<(), DbError> {
		self.create_token(token_hash, username).await
	}

	async fn get_username_by_token_hash(
		&self,
		token_hash: &str,
	) -> Result<Option<String>, DbError> {
		self.get_username_by_token_hash(token_hash).await
	}

	async fn touch_token(&self, token_hash: &str) -> Result<(), DbError> {
		self.touch_token(token_hash).await
	}
}
