// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! HTTP route handlers organized by concern.

pub mod disabled;
pub mod health;
pub mod installations;
pub mod internal;
pub mod repository_configurations;
pub mod webhooks;
