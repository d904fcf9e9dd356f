// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Installation reconciliation.
//!
//! Each installation id is either absent or present with a repository set.
//! Events move it between the two:
//!
//! | Event   | Absent                         | Present                        |
//! |---------|--------------------------------|--------------------------------|
//! | created | create with upserted repos     | attach upserted repos          |
//! | added   | create with upserted repos     | attach upserted repos          |
//! | removed | no-op                          | detach resolved repos          |
//! | deleted | no-op                          | delete (repositories kept)     |
//!
//! Repositories are upserted by `full_name` before the installation write, so
//! replaying an event after a partial failure converges. Membership changes
//! are written as deltas (attach or detach named ids) rather than whole-set
//! overwrites, so concurrent events for one installation compose.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use scribe_server_db::{
	InstallationStore, InstallationWithRepositories, NewInstallation, NewRepository,
	RepositoryStore,
};
use serde::Serialize;
use tracing::{debug, error, info};

use crate::error::GithubAppError;
use crate::events::{InstallationEvent, WebhookInstallation, WebhookRepository};

/// Reply body for installation webhooks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WebhookResponse {
	pub success: bool,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub message: Option<String>,
}

impl WebhookResponse {
	pub fn ok() -> Self {
		Self {
			success: true,
			message: None,
		}
	}

	pub fn failure(message: impl Into<String>) -> Self {
		Self {
			success: false,
			message: Some(message.into()),
		}
	}
}

pub struct InstallationReconciler {
	repositories: Arc<dyn RepositoryStore>,
	installations: Arc<dyn InstallationStore>,
}

impl InstallationReconciler {
	pub fn new(
		repositories: Arc<dyn RepositoryStore>,
		installations: Arc<dyn InstallationStore>,
	) -> Self {
		Self {
			repositories,
			installations,
		}
	}

	/// Apply one event. Failures are logged and reported in the response,
	/// never returned as errors.
	#[tracing::instrument(
		skip(self, event),
		fields(
			action = %event.action(),
			installation_id = event.installation().map(|i| i.id),
		)
	)]
	pub async fn handle(&self, event: &InstallationEvent) -> WebhookResponse {
		let result = match event {
			InstallationEvent::Created {
				installation,
				repositories,
			}
			| InstallationEvent::Added {
				installation,
				repositories,
			} => self.attach_repositories(installation, repositories).await,
			InstallationEvent::Removed {
				installation,
				repositories,
			} => self.detach_repositories(installation, repositories).await,
			InstallationEvent::Deleted { installation } => {
				self.delete_installation(installation).await
			}
			InstallationEvent::Ignored { action } => {
				debug!(action = ?action, "installation: ignoring event");
				Ok(())
			}
		};

		match result {
			Ok(()) => WebhookResponse::ok(),
			Err(e) => {
				error!(error = %e, "installation: reconciliation failed");
				WebhookResponse::failure("Failed to process installation event")
			}
		}
	}

	/// Create the installation, or grow its repository set.
	async fn attach_repositories(
		&self,
		installation: &WebhookInstallation,
		repositories: &[WebhookRepository],
	) -> Result<(), GithubAppError> {
		let ids = self.upsert_repositories(repositories).await?;
		let installation_id = installation.installation_id();
		let username = &installation.account.login;

		let existing = self
			.installations
			.get_installation_by_installation_id(&installation_id)
			.await?;

		let existing = match existing {
			Some(existing) => existing,
			None => {
				let new = NewInstallation {
					installation_id: installation_id.clone(),
					username: username.clone(),
				};
				let ids_vec: Vec<i64> = ids.iter().copied().collect();

				match self.installations.create_installation(&new, &ids_vec).await {
					Ok(created) => {
						info!(
							installation_id = %installation_id,
							username = %username,
							repo_count = created.repositories.len(),
							"installation: created"
						);
						return Ok(());
					}
					// A concurrent delivery created it first; merge into theirs.
					Err(e) if e.is_conflict() => self
						.installations
						.get_installation_by_installation_id(&installation_id)
						.await?
						.ok_or_else(|| {
							GithubAppError::Persistence(scribe_server_db::DbError::NotFound(
								format!("installation {installation_id}"),
							))
						})?,
					Err(e) => return Err(e.into()),
				}
			}
		};

		self.merge_into(&existing, &ids, username).await
	}

	async fn merge_into(
		&self,
		existing: &InstallationWithRepositories,
		ids: &BTreeSet<i64>,
		username: &str,
	) -> Result<(), GithubAppError> {
		let id = existing.installation.id;
		let ids_vec: Vec<i64> = ids.iter().copied().collect();
		let attached = self
			.installations
			.add_installation_repositories(id, &ids_vec)
			.await?;

		if attached > 0 {
			info!(
				installation_id = %existing.installation.installation_id,
				added = attached,
				"installation: repositories added"
			);
		} else {
			debug!(
				installation_id = %existing.installation.installation_id,
				"installation: repository set already up to date"
			);
		}

		if existing.installation.username != username {
			self.installations
				.update_installation_username(id, username)
				.await?;
			info!(
				installation_id = %existing.installation.installation_id,
				username = %username,
				"installation: owner renamed"
			);
		}

		Ok(())
	}

	async fn detach_repositories(
		&self,
		installation: &WebhookInstallation,
		repositories: &[WebhookRepository],
	) -> Result<(), GithubAppError> {
		let installation_id = installation.installation_id();

		let Some(existing) = self
			.installations
			.get_installation_by_installation_id(&installation_id)
			.await?
		else {
			debug!(installation_id = %installation_id, "installation: unknown, nothing to remove");
			return Ok(());
		};

		let removed: Vec<i64> = self
			.resolve_repositories(repositories)
			.await?
			.into_iter()
			.collect();
		if removed.is_empty() {
			return Ok(());
		}

		let detached = self
			.installations
			.remove_installation_repositories(existing.installation.id, &removed)
			.await?;
		if detached > 0 {
			info!(
				installation_id = %installation_id,
				removed = detached,
				"installation: repositories removed"
			);
		}

		Ok(())
	}

	async fn delete_installation(
		&self,
		installation: &WebhookInstallation,
	) -> Result<(), GithubAppError> {
		let installation_id = installation.installation_id();

		let Some(existing) = self
			.installations
			.get_installation_by_installation_id(&installation_id)
			.await?
		else {
			debug!(installation_id = %installation_id, "installation: unknown, nothing to delete");
			return Ok(());
		};

		if self
			.installations
			.delete_installation(existing.installation.id)
			.await?
		{
			info!(installation_id = %installation_id, "installation: deleted");
		}

		Ok(())
	}

	/// Internal ids for `repositories`, creating rows that do not exist yet.
	async fn upsert_repositories(
		&self,
		repositories: &[WebhookRepository],
	) -> Result<BTreeSet<i64>, GithubAppError> {
		let by_name: BTreeMap<&str, &WebhookRepository> = repositories
			.iter()
			.map(|r| (r.full_name.as_str(), r))
			.collect();
		let names: Vec<String> = by_name.keys().map(|n| n.to_string()).collect();

		let existing = self
			.repositories
			.list_repositories_by_full_names(&names)
			.await?;

		let mut ids: BTreeSet<i64> = existing.iter().map(|r| r.id).collect();
		let known: BTreeSet<&str> = existing.iter().map(|r| r.full_name.as_str()).collect();

		for (full_name, repo) in by_name {
			if known.contains(full_name) {
				continue;
			}

			let new = NewRepository {
				repository_id: repo.id.to_string(),
				full_name: full_name.to_string(),
				name: repo.short_name().to_string(),
				private: repo.private,
			};

			let id = match self.repositories.create_repository(&new).await {
				Ok(created) => created.id,
				Err(e) if e.is_conflict() => self
					.repositories
					.get_repository_by_full_name(full_name)
					.await?
					.map(|r| r.id)
					.ok_or_else(|| {
						GithubAppError::Persistence(scribe_server_db::DbError::NotFound(format!(
							"repository {full_name}"
						)))
					})?,
				Err(e) => return Err(e.into()),
			};
			ids.insert(id);
		}

		Ok(ids)
	}

	/// Internal ids for the stored repositories among `repositories`.
	async fn resolve_repositories(
		&self,
		repositories: &[WebhookRepository],
	) -> Result<BTreeSet<i64>, GithubAppError> {
		let names: Vec<String> = repositories.iter().map(|r| r.full_name.clone()).collect();
		let found = self
			.repositories
			.list_repositories_by_full_names(&names)
			.await?;
		Ok(found.iter().map(|r| r.id).collect())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::sync::atomic::{AtomicBool, Ordering};

	use async_trait::async_trait;
	use scribe_server_db::testing::create_test_pool;
	use scribe_server_db::{
		DbError, Installation, InstallationRepository, Repository, RepositoryRepository,
	};

	use crate::events::WebhookAccount;

	struct Harness {
		reconciler: InstallationReconciler,
		repositories: RepositoryRepository,
		installations: InstallationRepository,
	}

	async fn harness() -> Harness {
		let pool = create_test_pool().await;
		let repositories = RepositoryRepository::new(pool.clone());
		let installations = InstallationRepository::new(pool);
		Harness {
			reconciler: InstallationReconciler::new(
				Arc::new(repositories.clone()),
				Arc::new(installations.clone()),
			),
			repositories,
			installations,
		}
	}

	fn installation(id: i64, login: &str) -> WebhookInstallation {
		WebhookInstallation {
			id,
			account: WebhookAccount {
				login: login.to_string(),
			},
		}
	}

	fn repo(id: i64, full_name: &str) -> WebhookRepository {
		WebhookRepository {
			id,
			full_name: full_name.to_string(),
			name: full_name.split('/').nth(1).unwrap_or(full_name).to_string(),
			private: false,
		}
	}

	fn created(id: i64, repos: Vec<WebhookRepository>) -> InstallationEvent {
		InstallationEvent::Created {
			installation: installation(id, "alice"),
			repositories: repos,
		}
	}

	fn added(id: i64, repos: Vec<WebhookRepository>) -> InstallationEvent {
		InstallationEvent::Added {
			installation: installation(id, "alice"),
			repositories: repos,
		}
	}

	fn removed(id: i64, repos: Vec<WebhookRepository>) -> InstallationEvent {
		InstallationEvent::Removed {
			installation: installation(id, "alice"),
			repositories: repos,
		}
	}

	fn deleted(id: i64) -> InstallationEvent {
		InstallationEvent::Deleted {
			installation: installation(id, "alice"),
		}
	}

	impl Harness {
		async fn full_names(&self, installation_id: &str) -> Option<Vec<String>> {
			self.installations
				.get_installation_by_installation_id(installation_id)
				.await
				.unwrap()
				.map(|i| i.repositories.into_iter().map(|r| r.full_name).collect())
		}

		async fn repository_count(&self, names: &[&str]) -> usize {
			let names: Vec<String> = names.iter().map(|n| n.to_string()).collect();
			self.repositories
				.list_repositories_by_full_names(&names)
				.await
				.unwrap()
				.len()
		}
	}

	#[tokio::test]
	async fn test_created_twice_is_idempotent() {
		let h = harness().await;
		let event = created(42, vec![repo(1, "alice/a"), repo(2, "alice/b")]);

		assert_eq!(h.reconciler.handle(&event).await, WebhookResponse::ok());
		assert_eq!(h.reconciler.handle(&event).await, WebhookResponse::ok());

		let all = h
			.installations
			.list_installations_for_user("alice")
			.await
			.unwrap();
		assert_eq!(all.len(), 1);
		assert_eq!(
			h.full_names("42").await.unwrap(),
			vec!["alice/a".to_string(), "alice/b".to_string()]
		);
		assert_eq!(h.repository_count(&["alice/a", "alice/b"]).await, 2);
	}

	#[tokio::test]
	async fn test_duplicate_repositories_in_one_event_are_collapsed() {
		let h = harness().await;
		let event = created(42, vec![repo(1, "alice/a"), repo(1, "alice/a")]);

		assert!(h.reconciler.handle(&event).await.success);
		assert_eq!(h.full_names("42").await.unwrap(), vec!["alice/a".to_string()]);
	}

	#[tokio::test]
	async fn test_added_for_unknown_installation_creates_it() {
		let h = harness().await;
		let event = added(42, vec![repo(1, "alice/repo1")]);

		assert_eq!(h.reconciler.handle(&event).await, WebhookResponse::ok());

		let installation = h
			.installations
			.get_installation_by_installation_id("42")
			.await
			.unwrap()
			.unwrap();
		assert_eq!(installation.installation.username, "alice");
		assert_eq!(installation.repositories.len(), 1);
		assert_eq!(installation.repositories[0].full_name, "alice/repo1");
		assert_eq!(installation.repositories[0].repository_id, "1");
	}

	#[tokio::test]
	async fn test_added_unions_and_removed_subtracts() {
		let h = harness().await;
		h.reconciler
			.handle(&created(42, vec![repo(1, "alice/a"), repo(2, "alice/b")]))
			.await;

		h.reconciler
			.handle(&added(42, vec![repo(2, "alice/b"), repo(3, "alice/c")]))
			.await;
		assert_eq!(
			h.full_names("42").await.unwrap(),
			vec![
				"alice/a".to_string(),
				"alice/b".to_string(),
				"alice/c".to_string()
			]
		);

		h.reconciler.handle(&removed(42, vec![repo(1, "alice/a")])).await;
		assert_eq!(
			h.full_names("42").await.unwrap(),
			vec!["alice/b".to_string(), "alice/c".to_string()]
		);

		// Removal detaches only.
		assert_eq!(h.repository_count(&["alice/a"]).await, 1);
	}

	#[tokio::test]
	async fn test_removed_replay_and_unknown_repository_are_noops() {
		let h = harness().await;
		h.reconciler
			.handle(&created(42, vec![repo(1, "alice/a"), repo(2, "alice/b")]))
			.await;

		let event = removed(42, vec![repo(1, "alice/a")]);
		assert!(h.reconciler.handle(&event).await.success);
		assert!(h.reconciler.handle(&event).await.success);

		let never = removed(42, vec![repo(9, "alice/never")]);
		assert!(h.reconciler.handle(&never).await.success);
		assert_eq!(h.repository_count(&["alice/never"]).await, 0);

		assert_eq!(h.full_names("42").await.unwrap(), vec!["alice/b".to_string()]);
	}

	#[tokio::test]
	async fn test_removed_for_unknown_installation_is_noop() {
		let h = harness().await;
		let response = h.reconciler.handle(&removed(7, vec![repo(1, "alice/a")])).await;
		assert_eq!(response, WebhookResponse::ok());
		assert!(h.full_names("7").await.is_none());
	}

	#[tokio::test]
	async fn test_deleted_keeps_repositories_and_is_idempotent() {
		let h = harness().await;
		h.reconciler
			.handle(&created(42, vec![repo(1, "alice/a")]))
			.await;

		assert_eq!(h.reconciler.handle(&deleted(42)).await, WebhookResponse::ok());
		assert!(h.full_names("42").await.is_none());
		assert_eq!(h.repository_count(&["alice/a"]).await, 1);

		assert_eq!(h.reconciler.handle(&deleted(42)).await, WebhookResponse::ok());
	}

	#[tokio::test]
	async fn test_repository_shared_between_installations() {
		let h = harness().await;
		h.reconciler
			.handle(&created(1, vec![repo(10, "org/shared")]))
			.await;
		h.reconciler
			.handle(&InstallationEvent::Created {
				installation: installation(2, "bob"),
				repositories: vec![repo(10, "org/shared")],
			})
			.await;

		assert_eq!(h.repository_count(&["org/shared"]).await, 1);
		assert_eq!(h.full_names("1").await.unwrap(), vec!["org/shared".to_string()]);
		assert_eq!(h.full_names("2").await.unwrap(), vec!["org/shared".to_string()]);
	}

	#[tokio::test]
	async fn test_owner_rename_is_applied() {
		let h = harness().await;
		h.reconciler.handle(&created(42, vec![])).await;
		h.reconciler
			.handle(&InstallationEvent::Added {
				installation: installation(42, "alice-renamed"),
				repositories: vec![],
			})
			.await;

		let installation = h
			.installations
			.get_installation_by_installation_id("42")
			.await
			.unwrap()
			.unwrap();
		assert_eq!(installation.installation.username, "alice-renamed");
	}

	#[tokio::test]
	async fn test_ignored_event_succeeds_without_mutation() {
		let h = harness().await;
		let response = h
			.reconciler
			.handle(&InstallationEvent::Ignored {
				action: Some("suspend".to_string()),
			})
			.await;
		assert_eq!(response, WebhookResponse::ok());
		assert!(h
			.installations
			.list_installations_for_user("alice")
			.await
			.unwrap()
			.is_empty());
	}

	#[tokio::test]
	async fn test_concurrent_added_events_both_land() {
		let h = harness().await;
		h.reconciler.handle(&created(42, vec![repo(1, "alice/a")])).await;

		let add_c = added(42, vec![repo(3, "alice/c")]);
		let add_d = added(42, vec![repo(4, "alice/d")]);
		let (first, second) = tokio::join!(h.reconciler.handle(&add_c), h.reconciler.handle(&add_d));

		assert_eq!(first, WebhookResponse::ok());
		assert_eq!(second, WebhookResponse::ok());
		assert_eq!(
			h.full_names("42").await.unwrap(),
			vec![
				"alice/a".to_string(),
				"alice/c".to_string(),
				"alice/d".to_string()
			]
		);
	}

	#[tokio::test]
	async fn test_concurrent_added_and_removed_compose() {
		let h = harness().await;
		h.reconciler
			.handle(&created(42, vec![repo(1, "alice/a"), repo(2, "alice/b")]))
			.await;

		let add_c = added(42, vec![repo(3, "alice/c")]);
		let remove_a = removed(42, vec![repo(1, "alice/a")]);
		let (first, second) =
			tokio::join!(h.reconciler.handle(&add_c), h.reconciler.handle(&remove_a));

		assert!(first.success);
		assert!(second.success);
		assert_eq!(
			h.full_names("42").await.unwrap(),
			vec!["alice/b".to_string(), "alice/c".to_string()]
		);
	}

	/// Installation store whose writes fail while `failing` is set.
	struct FlakyInstallations {
		inner: InstallationRepository,
		failing: AtomicBool,
	}

	impl FlakyInstallations {
		fn check(&self) -> Result<(), DbError> {
			if self.failing.load(Ordering::SeqCst) {
				return Err(DbError::Internal("database is locked".to_string()));
			}
			Ok(())
		}
	}

	#[async_trait]
	impl InstallationStore for FlakyInstallations {
		async fn get_installation_by_installation_id(
			&self,
			installation_id: &str,
		) -> Result<Option<InstallationWithRepositories>, DbError> {
			self.inner
				.get_installation_by_installation_id(installation_id)
				.await
		}

		async fn create_installation(
			&self,
			installation: &NewInstallation,
			repository_ids: &[i64],
		) -> Result<InstallationWithRepositories, DbError> {
			self.check()?;
			self.inner
				.create_installation(installation, repository_ids)
				.await
		}

		async fn add_installation_repositories(
			&self,
			id: i64,
			repository_ids: &[i64],
		) -> Result<u64, DbError> {
			self.check()?;
			self.inner.add_installation_repositories(id, repository_ids).await
		}

		async fn remove_installation_repositories(
			&self,
			id: i64,
			repository_ids: &[i64],
		) -> Result<u64, DbError> {
			self.check()?;
			self.inner
				.remove_installation_repositories(id, repository_ids)
				.await
		}

		async fn update_installation_username(
			&self,
			id: i64,
			username: &str,
		) -> Result<bool, DbError> {
			self.check()?;
			self.inner.update_installation_username(id, username).await
		}

		async fn delete_installation(&self, id: i64) -> Result<bool, DbError> {
			self.check()?;
			self.inner.delete_installation(id).await
		}

		async fn list_installations_for_user(
			&self,
			username: &str,
		) -> Result<Vec<InstallationWithRepositories>, DbError> {
			self.inner.list_installations_for_user(username).await
		}

		async fn find_installation_for_user(
			&self,
			username: &str,
		) -> Result<Option<Installation>, DbError> {
			self.inner.find_installation_for_user(username).await
		}

		async fn get_installation_repository(
			&self,
			id: i64,
			repository_id: i64,
		) -> Result<Option<Repository>, DbError> {
			self.inner.get_installation_repository(id, repository_id).await
		}
	}

	#[tokio::test]
	async fn test_failed_write_reports_failure_and_replay_converges() {
		let pool = create_test_pool().await;
		let repositories = RepositoryRepository::new(pool.clone());
		let installations = InstallationRepository::new(pool);
		let flaky = Arc::new(FlakyInstallations {
			inner: installations.clone(),
			failing: AtomicBool::new(true),
		});
		let reconciler = InstallationReconciler::new(Arc::new(repositories.clone()), flaky.clone());
		let h = Harness {
			reconciler,
			repositories,
			installations,
		};
		let event = created(42, vec![repo(1, "alice/a"), repo(2, "alice/b")]);

		let response = h.reconciler.handle(&event).await;
		assert_eq!(
			response,
			WebhookResponse::failure("Failed to process installation event")
		);
		// Repositories were upserted before the installation write failed.
		assert_eq!(h.repository_count(&["alice/a", "alice/b"]).await, 2);
		assert!(h.full_names("42").await.is_none());

		flaky.failing.store(false, Ordering::SeqCst);
		assert_eq!(h.reconciler.handle(&event).await, WebhookResponse::ok());
		assert_eq!(h.reconciler.handle(&event).await, WebhookResponse::ok());

		assert_eq!(h.repository_count(&["alice/a", "alice/b"]).await, 2);
		assert_eq!(
			h.installations
				.list_installations_for_user("alice")
				.await
				.unwrap()
				.len(),
			1
		);
		assert_eq!(
			h.full_names("42").await.unwrap(),
			vec!["alice/a".to_string(), "alice/b".to_string()]
		);
	}

	#[tokio::test]
	async fn test_failed_membership_write_on_existing_installation_is_reported() {
		let pool = create_test_pool().await;
		let repositories = RepositoryRepository::new(pool.clone());
		let installations = InstallationRepository::new(pool);
		let flaky = Arc::new(FlakyInstallations {
			inner: installations.clone(),
			failing: AtomicBool::new(false),
		});
		let reconciler = InstallationReconciler::new(Arc::new(repositories), flaky.clone());

		reconciler.handle(&created(42, vec![repo(1, "alice/a")])).await;
		flaky.failing.store(true, Ordering::SeqCst);

		let event = added(42, vec![repo(2, "alice/b")]);
		assert!(!reconciler.handle(&event).await.success);
		assert!(!reconciler.handle(&removed(42, vec![repo(1, "alice/a")])).await.success);

		flaky.failing.store(false, Ordering::SeqCst);
		assert!(reconciler.handle(&event).await.success);
		let names: Vec<String> = installations
			.get_installation_by_installation_id("42")
			.await
			.unwrap()
			.unwrap()
			.repositories
			.into_iter()
			.map(|r| r.full_name)
			.collect();
		assert_eq!(names, vec!["alice/a".to_string(), "alice/b".to_string()]);
	}

	#[test]
	fn test_response_serialization() {
		assert_eq!(
			serde_json::to_value(WebhookResponse::ok()).unwrap(),
			serde_json::json!({"success": true})
		);
		assert_eq!(
			serde_json::to_value(WebhookResponse::failure("boom")).unwrap(),
			serde_json::json!({"success": false, "message": "boom"})
		);
	}
}
