// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Caller authentication for the HTTP API.
//!
//! Two schemes are supported:
//!
//! - User API tokens (`Authorization: Bearer st_...`). Tokens are hashed with
//!   SHA-256 and looked up in `api_tokens`; [`auth_layer`] stores the result
//!   as an [`AuthContext`] request extension and [`RequireAuth`] rejects
//!   unauthenticated requests.
//! - The internal API key for service-to-service routes, compared in
//!   constant time by [`internal_auth_middleware`].
//!
//! Raw tokens are never logged or stored.

use std::sync::Arc;

use axum::{
	body::Body,
	extract::{FromRequestParts, Request, State},
	http::{header::AUTHORIZATION, request::Parts, HeaderMap, StatusCode},
	middleware::Next,
	response::{IntoResponse, Response},
	Json,
};
use scribe_common_config::SecretString;
use scribe_common_webhook::constant_time_eq;
use scribe_server_db::{DbError, TokenStore};
use tracing::{instrument, warn};

use crate::{api::AppState, error::ErrorResponse};

/// Prefix of user API tokens.
pub const TOKEN_PREFIX: &str = "st_";

/// Random bytes in a user API token (hex encoded after the prefix).
pub const TOKEN_BYTES: usize = 32;

/// The authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
	pub username: String,
}

/// Auth state for request processing.
#[derive(Debug, Clone, Default)]
pub struct AuthContext {
	pub current_user: Option<CurrentUser>,
}

impl AuthContext {
	pub fn unauthenticated() -> Self {
		Self { current_user: None }
	}

	pub fn authenticated(current_user: CurrentUser) -> Self {
		Self {
			current_user: Some(current_user),
		}
	}
}

/// Hash a token with SHA-256 and return it hex encoded.
pub fn hash_token(token: &str) -> String {
	use sha2::{Digest, Sha256};
	let mut hasher = Sha256::new();
	hasher.update(token.as_bytes());
	hex::encode(hasher.finalize())
}

/// Mint a new user API token.
///
/// Returns `(token, hash)`. Only the hash is persisted; the token is shown to
/// the operator once.
pub fn generate_token() -> (String, String) {
	use rand::Rng;
	let mut rng = rand::thread_rng();
	let bytes: [u8; TOKEN_BYTES] = rng.gen();
	let token = format!("{}{}", TOKEN_PREFIX, hex::encode(bytes));
	let hash = hash_token(&token);
	(token, hash)
}

/// Mint a token for `username` and store its hash.
pub async fn issue_token(tokens: &dyn TokenStore, username: &str) -> Result<String, DbError> {
	let (token, hash) = generate_token();
	tokens.create_token(&hash, username).await?;
	tracing::info!(username = %username, "api_token: issued");
	Ok(token)
}

/// Extract a bearer token from the Authorization header.
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
	headers
		.get(AUTHORIZATION)?
		.to_str()
		.ok()?
		.strip_prefix("Bearer ")
}

/// Resolve the bearer token on each request into an [`AuthContext`].
///
/// Requests without a valid token continue with an unauthenticated context;
/// rejecting them is left to [`RequireAuth`].
#[instrument(
	name = "auth_layer",
	skip(state, request, next),
	fields(username = tracing::field::Empty)
)]
pub async fn auth_layer(
	State(state): State<AppState>,
	mut request: Request<Body>,
	next: Next,
) -> Response {
	let token = extract_bearer_token(request.headers()).map(str::to_owned);

	let auth_ctx = match token {
		Some(token) => authenticate_token(&token, &state.token_store)
			.await
			.unwrap_or_else(AuthContext::unauthenticated),
		None => AuthContext::unauthenticated(),
	};

	if let Some(ref user) = auth_ctx.current_user {
		tracing::Span::current().record("username", tracing::field::display(&user.username));
	}

	request.extensions_mut().insert(auth_ctx);
	next.run(request).await
}

#[instrument(skip_all)]
async fn authenticate_token(token: &str, tokens: &Arc<dyn TokenStore>) -> Option<AuthContext> {
	if !token.starts_with(TOKEN_PREFIX) {
		tracing::debug!("Unknown bearer token type");
		return None;
	}

	let token_hash = hash_token(token);

	let username = match tokens.get_username_by_token_hash(&token_hash).await {
		Ok(Some(username)) => username,
		Ok(None) => {
			tracing::debug!("API token not found for token hash");
			return None;
		}
		Err(e) => {
			tracing::error!(error = %e, "Failed to look up API token");
			return None;
		}
	};

	// Update last used (fire and forget)
	let tokens = Arc::clone(tokens);
	tokio::spawn(async move {
		if let Err(e) = tokens.touch_token(&token_hash).await {
			tracing::warn!(error = %e, "Failed to update API token last used");
		}
	});

	Some(AuthContext::authenticated(CurrentUser { username }))
}

/// Extractor that requires an authenticated caller.
///
/// ```ignore
/// async fn handler(RequireAuth(user): RequireAuth) -> impl IntoResponse {
///     format!("Hello, {}!", user.username)
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

impl<S> FromRequestParts<S> for RequireAuth
where
	S: Send + Sync,
{
	type Rejection = Response;

	#[instrument(name = "RequireAuth::from_request_parts", skip_all)]
	async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
		let auth_ctx = parts
			.extensions
			.get::<AuthContext>()
			.cloned()
			.unwrap_or_else(AuthContext::unauthenticated);

		match auth_ctx.current_user {
			Some(user) => {
				tracing::debug!(username = %user.username, "Authentication required: success");
				Ok(RequireAuth(user))
			}
			None => {
				tracing::debug!("Authentication required: no valid credentials");
				let response = (
					StatusCode::UNAUTHORIZED,
					Json(ErrorResponse::new("Authentication required")),
				);
				Err(response.into_response())
			}
		}
	}
}

/// Guard internal routes with the shared internal API key.
///
/// Without a configured key every request is rejected.
pub async fn internal_auth_middleware(
	State(expected_key): State<Option<SecretString>>,
	request: Request,
	next: Next,
) -> Result<Response, StatusCode> {
	let Some(expected_key) = expected_key.filter(|k| !k.expose().is_empty()) else {
		warn!("Internal API key not configured, rejecting request");
		return Err(StatusCode::UNAUTHORIZED);
	};

	let Some(provided) = extract_bearer_token(request.headers()) else {
		warn!("Internal request missing bearer token");
		return Err(StatusCode::UNAUTHORIZED);
	};

	if !constant_time_eq(expected_key.expose().as_bytes(), provided.as_bytes()) {
		warn!("Invalid internal API key");
		return Err(StatusCode::UNAUTHORIZED);
	}

	Ok(next.run(request).await)
}
