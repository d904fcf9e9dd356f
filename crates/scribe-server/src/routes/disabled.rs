// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use crate::{auth_middleware::RequireAuth, error::ServerError};

/// Generic repository and configuration routes answer 501 to any
/// authenticated caller.
pub async fn not_implemented(RequireAuth(user): RequireAuth) -> ServerError {
	tracing::debug!(username = %user.username, "disabled route requested");
	ServerError::NotImplemented
}
