// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Application state and router construction.

use std::sync::Arc;

use axum::{
	middleware,
	routing::{get, post, put},
	Router,
};
use scribe_common_config::SecretString;
use scribe_server_config::ServerConfig;
use scribe_server_configurations::ConfigurationGuard;
use scribe_server_db::{
	ConfigurationRepository, ConfigurationStore, InstallationRepository, InstallationStore,
	RepositoryRepository, RepositoryStore, TokenRepository, TokenStore,
};
use scribe_server_github_app::{InstallationReconciler, SignatureVerifier};
use sqlx::SqlitePool;

use crate::{
	auth_middleware::{auth_layer, internal_auth_middleware},
	routes,
};

#[derive(Clone)]
pub struct AppState {
	pub pool: SqlitePool,
	pub repository_store: Arc<dyn RepositoryStore>,
	pub installation_store: Arc<dyn InstallationStore>,
	pub configuration_store: Arc<dyn ConfigurationStore>,
	pub token_store: Arc<dyn TokenStore>,
	pub verifier: Arc<SignatureVerifier>,
	pub reconciler: Arc<InstallationReconciler>,
	pub guard: Arc<ConfigurationGuard>,
	pub internal_api_key: Option<SecretString>,
}

/// Creates the application state from a migrated pool and resolved config.
pub fn create_app_state(pool: SqlitePool, config: &ServerConfig) -> AppState {
	let repository_store: Arc<dyn RepositoryStore> = Arc::new(RepositoryRepository::new(pool.clone()));
	let installation_store: Arc<dyn InstallationStore> =
		Arc::new(InstallationRepository::new(pool.clone()));
	let configuration_store: Arc<dyn ConfigurationStore> =
		Arc::new(ConfigurationRepository::new(pool.clone()));
	let token_store: Arc<dyn TokenStore> = Arc::new(TokenRepository::new(pool.clone()));

	let verifier = SignatureVerifier::new(config.webhook.secret.clone(), config.webhook.algorithm)
		.with_skip_verification(config.webhook.skip_verification);

	let reconciler = InstallationReconciler::new(
		Arc::clone(&repository_store),
		Arc::clone(&installation_store),
	);
	let guard = ConfigurationGuard::new(
		Arc::clone(&installation_store),
		Arc::clone(&configuration_store),
	);

	tracing::debug!(
		algorithm = %verifier.algorithm(),
		has_webhook_secret = verifier.has_secret(),
		has_internal_api_key = config.auth.internal_api_key.is_some(),
		"app state created"
	);

	AppState {
		pool,
		repository_store,
		installation_store,
		configuration_store,
		token_store,
		verifier: Arc::new(verifier),
		reconciler: Arc::new(reconciler),
		guard: Arc::new(guard),
		internal_api_key: config.auth.internal_api_key.clone(),
	}
}

pub fn create_router(state: AppState) -> Router {
	// Public routes - the webhook carries its own signature
	let public = Router::new()
		.route("/health", get(routes::health::health_check))
		.route(
			"/api/installation",
			post(routes::webhooks::installation_webhook),
		);

	// User routes - bearer API token
	let authed = Router::new()
		.route(
			"/api/installations",
			get(routes::installations::list_installations),
		)
		.route(
			"/api/repository-configurations",
			post(routes::repository_configurations::create_repository_configuration)
				.get(routes::disabled::not_implemented),
		)
		.route(
			"/api/repository-configurations/{id}",
			put(routes::repository_configurations::update_repository_configuration)
				.delete(routes::repository_configurations::delete_repository_configuration)
				.get(routes::disabled::not_implemented),
		)
		.route(
			"/api/repositories",
			get(routes::disabled::not_implemented).post(routes::disabled::not_implemented),
		)
		.route(
			"/api/repositories/{id}",
			get(routes::disabled::not_implemented).put(routes::disabled::not_implemented),
		)
		.route_layer(middleware::from_fn_with_state(state.clone(), auth_layer));

	// Internal routes - shared internal API key
	let internal = Router::new()
		.route(
			"/api/internal/repository-configurations/{id}",
			get(routes::internal::get_repository_configuration),
		)
		.route_layer(middleware::from_fn_with_state(
			state.internal_api_key.clone(),
			internal_auth_middleware,
		));

	public.merge(authed).merge(internal).with_state(state)
}
