// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! API response helpers.
//!
//! Entity endpoints wrap bodies in a `{ "data": ... }` envelope in both
//! directions.

use axum::{http::StatusCode, Json};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataEnvelope<T> {
	pub data: T,
}

impl<T> DataEnvelope<T> {
	pub fn new(data: T) -> Self {
		Self { data }
	}

	pub fn into_inner(self) -> T {
		self.data
	}
}

/// 201 with the entity in the data envelope.
pub fn created<T: Serialize>(data: T) -> (StatusCode, Json<DataEnvelope<T>>) {
	(StatusCode::CREATED, Json(DataEnvelope::new(data)))
}

/// 200 with the entity in the data envelope.
pub fn ok<T: Serialize>(data: T) -> (StatusCode, Json<DataEnvelope<T>>) {
	(StatusCode::OK, Json(DataEnvelope::new(data)))
}
