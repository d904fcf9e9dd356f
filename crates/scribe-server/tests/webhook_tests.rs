// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Integration tests for the installation webhook endpoint.
//!
//! Tests cover:
//! - Signature enforcement over the raw body
//! - Created/added/removed/deleted reconciliation
//! - Redelivery idempotence
//! - Ignored and malformed events

mod support;

use axum::http::{Method, StatusCode};
use serde_json::{json, Value};
use support::{installation_event, setup_test_app, TestApp};

async fn repository_names(app: &TestApp, installation_id: &str) -> Vec<String> {
	app.state
		.installation_store
		.get_installation_by_installation_id(installation_id)
		.await
		.unwrap()
		.map(|i| i.repositories.into_iter().map(|r| r.full_name).collect())
		.unwrap_or_default()
}

fn json_body(bytes: &[u8]) -> Value {
	serde_json::from_slice(bytes).unwrap()
}

// ============================================================================
// Signature
// ============================================================================

#[tokio::test]
async fn test_unsigned_webhook_is_forbidden() {
	let app = setup_test_app().await;
	let event = installation_event("created", 42, "alice", &[(1, "alice/repo1")]);

	let (status, body) = app.send_raw_webhook(event.to_string(), None).await;

	assert_eq!(status, StatusCode::FORBIDDEN);
	assert_eq!(body, b"Invalid signature");
	assert!(app
		.state
		.installation_store
		.get_installation_by_installation_id("42")
		.await
		.unwrap()
		.is_none());
}

#[tokio::test]
async fn test_signature_over_different_body_is_forbidden() {
	let app = setup_test_app().await;
	let signed = installation_event("created", 42, "alice", &[(1, "alice/repo1")]);
	let sent = installation_event("created", 42, "mallory", &[(1, "alice/repo1")]);
	let signature = scribe_server_github_app::SignatureAlgorithm::Sha1.sign(
		support::WEBHOOK_SECRET.as_bytes(),
		signed.to_string().as_bytes(),
	);

	let (status, _) = app
		.send_raw_webhook(sent.to_string(), Some(&signature))
		.await;

	assert_eq!(status, StatusCode::FORBIDDEN);
	assert!(repository_names(&app, "42").await.is_empty());
}

#[tokio::test]
async fn test_wrong_secret_is_forbidden() {
	let app = setup_test_app().await;
	let body = installation_event("deleted", 42, "alice", &[]).to_string();
	let signature =
		scribe_server_github_app::SignatureAlgorithm::Sha1.sign(b"not-the-secret", body.as_bytes());

	let (status, body) = app.send_raw_webhook(body, Some(&signature)).await;

	assert_eq!(status, StatusCode::FORBIDDEN);
	assert_eq!(body, b"Invalid signature");
}

// ============================================================================
// Reconciliation
// ============================================================================

#[tokio::test]
async fn test_created_stores_installation_and_repositories() {
	let app = setup_test_app().await;
	let event = installation_event(
		"created",
		42,
		"alice",
		&[(1, "alice/repo1"), (2, "alice/repo2")],
	);

	let (status, body) = app.send_webhook(&event).await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(json_body(&body), json!({"success": true}));
	assert_eq!(
		repository_names(&app, "42").await,
		vec!["alice/repo1", "alice/repo2"]
	);

	let installation = app
		.state
		.installation_store
		.get_installation_by_installation_id("42")
		.await
		.unwrap()
		.unwrap();
	assert_eq!(installation.installation.username, "alice");
}

#[tokio::test]
async fn test_redelivered_created_is_idempotent() {
	let app = setup_test_app().await;
	let event = installation_event("created", 42, "alice", &[(1, "alice/repo1")]);

	for _ in 0..3 {
		let (status, _) = app.send_webhook(&event).await;
		assert_eq!(status, StatusCode::OK);
	}

	assert_eq!(repository_names(&app, "42").await, vec!["alice/repo1"]);
	let listed = app
		.state
		.repository_store
		.list_repositories_by_full_names(&["alice/repo1".to_string()])
		.await
		.unwrap();
	assert_eq!(listed.len(), 1);
}

#[tokio::test]
async fn test_added_then_removed() {
	let app = setup_test_app().await;
	app.send_webhook(&installation_event("created", 42, "alice", &[(1, "alice/repo1")]))
		.await;

	let (status, _) = app
		.send_webhook(&installation_event(
			"added",
			42,
			"alice",
			&[(2, "alice/repo2"), (1, "alice/repo1")],
		))
		.await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(
		repository_names(&app, "42").await,
		vec!["alice/repo1", "alice/repo2"]
	);

	let (status, _) = app
		.send_webhook(&installation_event(
			"removed",
			42,
			"alice",
			&[(1, "alice/repo1"), (9, "alice/never-added")],
		))
		.await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(repository_names(&app, "42").await, vec!["alice/repo2"]);

	// Removal detaches but keeps the repository row.
	app.repository_id("alice/repo1").await;
}

#[tokio::test]
async fn test_repository_shared_between_installations() {
	let app = setup_test_app().await;
	app.send_webhook(&installation_event("created", 1, "alice", &[(5, "org/shared")]))
		.await;
	app.send_webhook(&installation_event("created", 2, "bob", &[(5, "org/shared")]))
		.await;

	assert_eq!(repository_names(&app, "1").await, vec!["org/shared"]);
	assert_eq!(repository_names(&app, "2").await, vec!["org/shared"]);

	app.send_webhook(&installation_event("removed", 1, "alice", &[(5, "org/shared")]))
		.await;

	assert!(repository_names(&app, "1").await.is_empty());
	assert_eq!(repository_names(&app, "2").await, vec!["org/shared"]);
}

#[tokio::test]
async fn test_deleted_removes_installation_and_its_configurations() {
	let app = setup_test_app().await;
	app.send_webhook(&installation_event("created", 42, "alice", &[(1, "alice/repo1")]))
		.await;
	let token = app.token_for("alice").await;
	let repo = app.repository_id("alice/repo1").await;
	let (status, created) = app
		.request(
			Method::POST,
			"/api/repository-configurations",
			Some(&token),
			Some(json!({"data": {"repository": repo, "cron": "1 weeks"}})),
		)
		.await;
	assert_eq!(status, StatusCode::CREATED);
	let configuration_id = created["data"]["id"].as_i64().unwrap();

	let (status, body) = app
		.send_webhook(&installation_event("deleted", 42, "alice", &[]))
		.await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(json_body(&body), json!({"success": true}));

	assert!(app
		.state
		.installation_store
		.get_installation_by_installation_id("42")
		.await
		.unwrap()
		.is_none());
	assert!(app
		.state
		.configuration_store
		.get_configuration_details(configuration_id)
		.await
		.unwrap()
		.is_none());

	// Deleting again is a no-op.
	let (status, _) = app
		.send_webhook(&installation_event("deleted", 42, "alice", &[]))
		.await;
	assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_removed_for_unknown_installation_succeeds() {
	let app = setup_test_app().await;

	let (status, body) = app
		.send_webhook(&installation_event("removed", 77, "carol", &[(1, "carol/x")]))
		.await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(json_body(&body)["success"], true);
	assert!(app
		.state
		.installation_store
		.get_installation_by_installation_id("77")
		.await
		.unwrap()
		.is_none());
}

#[tokio::test]
async fn test_concurrent_deliveries_for_one_installation_converge() {
	let app = setup_test_app().await;
	app.send_webhook(&installation_event(
		"created",
		42,
		"alice",
		&[(1, "alice/a"), (2, "alice/b")],
	))
	.await;

	let add_c = installation_event("added", 42, "alice", &[(3, "alice/c")]);
	let add_d = installation_event("added", 42, "alice", &[(4, "alice/d")]);
	let remove_a = installation_event("removed", 42, "alice", &[(1, "alice/a")]);
	let (c, d, a) = tokio::join!(
		app.send_webhook(&add_c),
		app.send_webhook(&add_d),
		app.send_webhook(&remove_a)
	);

	for (status, body) in [c, d, a] {
		assert_eq!(status, StatusCode::OK);
		assert_eq!(json_body(&body), json!({"success": true}));
	}
	assert_eq!(
		repository_names(&app, "42").await,
		vec!["alice/b", "alice/c", "alice/d"]
	);
}

#[tokio::test]
async fn test_persistence_failure_is_reported_as_server_error() {
	let app = setup_test_app().await;
	app.state.pool.close().await;

	let (status, body) = app
		.send_webhook(&installation_event("created", 42, "alice", &[(1, "alice/a")]))
		.await;

	assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
	assert_eq!(
		json_body(&body),
		json!({"success": false, "message": "Failed to process installation event"})
	);
}

// ============================================================================
// Ignored and malformed events
// ============================================================================

#[tokio::test]
async fn test_unknown_action_is_acknowledged() {
	let app = setup_test_app().await;

	let (status, body) = app
		.send_webhook(&json!({
			"action": "suspend",
			"installation": {"id": 42, "account": {"login": "alice"}}
		}))
		.await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(json_body(&body), json!({"success": true}));
}

#[tokio::test]
async fn test_signed_non_json_body_is_bad_request() {
	let app = setup_test_app().await;
	let body = "action=created".to_string();
	let signature = scribe_server_github_app::SignatureAlgorithm::Sha1
		.sign(support::WEBHOOK_SECRET.as_bytes(), body.as_bytes());

	let (status, body) = app.send_raw_webhook(body, Some(&signature)).await;

	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(json_body(&body)["success"], false);
}
