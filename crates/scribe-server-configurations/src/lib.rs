// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Repository configuration, scoped to the caller's installation.
//!
//! A caller reaches a configuration only through an installation they own
//! that currently lists the configured repository. Caller-supplied ids for
//! the installation, the repository of an existing configuration, or the
//! configuration being deleted are never trusted.

pub mod error;
pub mod guard;
pub mod payload;
pub mod schedule;

pub use error::ConfigurationError;
pub use guard::ConfigurationGuard;
pub use payload::ConfigurationPayload;
pub use schedule::{Schedule, ScheduleUnit};
