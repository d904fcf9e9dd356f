// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Shared harness for HTTP integration tests.

#![allow(dead_code)]

use axum::{
	body::Body,
	http::{Method, Request, StatusCode},
	Router,
};
use scribe_common_config::SecretString;
use scribe_server::{auth_middleware, create_app_state, create_router, AppState, ServerConfig};
use scribe_server_github_app::SignatureAlgorithm;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

pub const WEBHOOK_SECRET: &str = "test-webhook-secret";
pub const INTERNAL_KEY: &str = "test-internal-key";

pub struct TestApp {
	pub app: Router,
	pub state: AppState,
	_dir: TempDir,
}

/// App over a temp-file database with a webhook secret and internal key set.
pub async fn setup_test_app() -> TestApp {
	let dir = tempfile::tempdir().unwrap();
	let db_path = dir.path().join("scribe_test.db");
	let db_url = format!("sqlite:{}?mode=rwc", db_path.display());
	let pool = scribe_server::db::create_pool(&db_url).await.unwrap();
	scribe_server::db::run_migrations(&pool).await.unwrap();

	let mut config = ServerConfig::default();
	config.webhook.secret = Some(SecretString::from(WEBHOOK_SECRET));
	config.auth.internal_api_key = Some(SecretString::from(INTERNAL_KEY));

	let state = create_app_state(pool, &config);
	TestApp {
		app: create_router(state.clone()),
		state,
		_dir: dir,
	}
}

impl TestApp {
	/// Send a webhook signed with the test secret.
	pub async fn send_webhook(&self, payload: &Value) -> (StatusCode, Vec<u8>) {
		let body = payload.to_string();
		let signature = SignatureAlgorithm::Sha1.sign(WEBHOOK_SECRET.as_bytes(), body.as_bytes());
		self.send_raw_webhook(body, Some(&signature)).await
	}

	pub async fn send_raw_webhook(
		&self,
		body: String,
		signature: Option<&str>,
	) -> (StatusCode, Vec<u8>) {
		let mut request = Request::builder()
			.method(Method::POST)
			.uri("/api/installation")
			.header("content-type", "application/json");
		if let Some(signature) = signature {
			request = request.header("x-hub-signature", signature);
		}

		let response = self
			.app
			.clone()
			.oneshot(request.body(Body::from(body)).unwrap())
			.await
			.unwrap();
		let status = response.status();
		let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
			.await
			.unwrap();
		(status, bytes.to_vec())
	}

	/// Mint an API token for `username`.
	pub async fn token_for(&self, username: &str) -> String {
		auth_middleware::issue_token(self.state.token_store.as_ref(), username)
			.await
			.unwrap()
	}

	/// JSON request with an optional bearer token. Non-JSON bodies come back
	/// as `Value::Null`.
	pub async fn request(
		&self,
		method: Method,
		uri: &str,
		bearer: Option<&str>,
		body: Option<Value>,
	) -> (StatusCode, Value) {
		let body = body.map(|value| value.to_string());
		self.request_raw(method, uri, bearer, body).await
	}

	/// Like [`TestApp::request`] but sends `body` verbatim as JSON.
	pub async fn request_raw(
		&self,
		method: Method,
		uri: &str,
		bearer: Option<&str>,
		body: Option<String>,
	) -> (StatusCode, Value) {
		let mut request = Request::builder().method(method).uri(uri);
		if let Some(token) = bearer {
			request = request.header("authorization", format!("Bearer {token}"));
		}
		let body = match body {
			Some(raw) => {
				request = request.header("content-type", "application/json");
				Body::from(raw)
			}
			None => Body::empty(),
		};

		let response = self
			.app
			.clone()
			.oneshot(request.body(body).unwrap())
			.await
			.unwrap();
		let status = response.status();
		let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
			.await
			.unwrap();
		let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
		(status, json)
	}

	/// Internal id of a repository the webhook created.
	pub async fn repository_id(&self, full_name: &str) -> i64 {
		self.state
			.repository_store
			.get_repository_by_full_name(full_name)
			.await
			.unwrap()
			.unwrap_or_else(|| panic!("repository {full_name} not stored"))
			.id
	}
}

pub fn installation_event(
	action: &str,
	installation_id: i64,
	login: &str,
	repos: &[(i64, &str)],
) -> Value {
	let repos: Vec<Value> = repos
		.iter()
		.map(|&(id, full_name)| {
			serde_json::json!({
				"id": id,
				"full_name": full_name,
				"name": full_name.split('/').nth(1).unwrap_or(full_name),
				"private": false,
			})
		})
		.collect();

	let list_key = match action {
		"added" => "repositories_added",
		"removed" => "repositories_removed",
		_ => "repositories",
	};

	let mut event = serde_json::json!({
		"action": action,
		"installation": {"id": installation_id, "account": {"login": login}},
	});
	event[list_key] = Value::Array(repos);
	event
}
