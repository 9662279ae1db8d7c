// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Periodic background jobs.
//!
//! A deliberately small scheduler: each registered job gets its own task
//! that sleeps its interval and runs, until the shutdown broadcast fires.
//! Job failures are logged and the loop continues; there is no retry or
//! persistence machinery here.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tracing::{info, instrument, warn};
use whispers_server_secrets::{SecretsService, SqliteSecretStore};

use crate::oauth_state::OAuthStateStore;

/// Errors surfaced by job runs.
#[derive(Debug, thiserror::Error)]
pub enum JobError {
	#[error("job failed: {0}")]
	Failed(String),
}

/// Outcome of a successful job run.
#[derive(Debug, Clone)]
pub struct JobOutput {
	pub message: String,
}

/// A unit of periodic background work.
#[async_trait]
pub trait Job: Send + Sync {
	fn id(&self) -> &'static str;
	fn name(&self) -> &'static str;
	async fn run(&self) -> Result<JobOutput, JobError>;
}

struct RegisteredJob {
	job: Arc<dyn Job>,
	interval: Duration,
}

/// Runs registered jobs on their intervals until shutdown.
pub struct JobScheduler {
	jobs: Vec<RegisteredJob>,
	shutdown_tx: broadcast::Sender<()>,
	handles: Mutex<Vec<JoinHandle<()>>>,
}

impl JobScheduler {
	pub fn new() -> Self {
		let (shutdown_tx, _) = broadcast::channel(1);
		Self {
			jobs: Vec::new(),
			shutdown_tx,
			handles: Mutex::new(Vec::new()),
		}
	}

	pub fn register_periodic(&mut self, job: Arc<dyn Job>, interval: Duration) {
		self.jobs.push(RegisteredJob { job, interval });
	}

	/// Run every registered job once, immediately.
	///
	/// Used at startup so a long purge interval does not leave stale rows
	/// sitting through the first hour of uptime.
	#[instrument(skip(self))]
	pub async fn run_all_once(&self) {
		for registered in &self.jobs {
			run_job(&registered.job).await;
		}
	}

	/// Spawn the periodic loops.
	#[instrument(skip(self))]
	pub async fn start(&self) {
		let mut handles = self.handles.lock().await;

		for registered in &self.jobs {
			let job = Arc::clone(&registered.job);
			let interval = registered.interval;
			let mut shutdown_rx = self.shutdown_tx.subscribe();
			let job_id = job.id();

			let handle = tokio::spawn(async move {
				loop {
					tokio::select! {
						_ = tokio::time::sleep(interval) => {
							run_job(&job).await;
						}
						_ = shutdown_rx.recv() => {
							info!(job_id = %job_id, "shutting down periodic job");
							break;
						}
					}
				}
			});

			handles.push(handle);
		}

		info!(job_count = handles.len(), "job scheduler started");
	}

	/// Stop all loops and wait for them to finish.
	#[instrument(skip(self))]
	pub async fn shutdown(&self) {
		let _ = self.shutdown_tx.send(());

		let mut handles = self.handles.lock().await;
		for handle in handles.drain(..) {
			let _ = handle.await;
		}

		info!("job scheduler shut down");
	}
}

impl Default for JobScheduler {
	fn default() -> Self {
		Self::new()
	}
}

async fn run_job(job: &Arc<dyn Job>) {
	match job.run().await {
		Ok(output) => {
			tracing::debug!(job_id = %job.id(), message = %output.message, "job completed");
		}
		Err(e) => {
			warn!(job_id = %job.id(), error = %e, "job failed");
		}
	}
}

/// Deletes rows whose expiry has passed.
///
/// Purging is an optimization; the access policy alone already makes
/// expired secrets unreachable.
pub struct PurgeExpiredSecretsJob {
	secrets: Arc<SecretsService<SqliteSecretStore>>,
}

impl PurgeExpiredSecretsJob {
	pub fn new(secrets: Arc<SecretsService<SqliteSecretStore>>) -> Self {
		Self { secrets }
	}
}

#[async_trait]
impl Job for PurgeExpiredSecretsJob {
	fn id(&self) -> &'static str {
		"purge_expired_secrets"
	}

	fn name(&self) -> &'static str {
		"Purge expired secrets"
	}

	async fn run(&self) -> Result<JobOutput, JobError> {
		let purged = self
			.secrets
			.purge_expired(Utc::now())
			.await
			.map_err(|e| JobError::Failed(e.to_string()))?;

		if purged > 0 {
			info!(count = purged, "purged expired secrets");
		}
		Ok(JobOutput {
			message: format!("purged {purged} expired secrets"),
		})
	}
}

/// Drops CSRF states from abandoned login attempts.
pub struct OAuthStateCleanupJob {
	states: Arc<OAuthStateStore>,
}

impl OAuthStateCleanupJob {
	pub fn new(states: Arc<OAuthStateStore>) -> Self {
		Self { states }
	}
}

#[async_trait]
impl Job for OAuthStateCleanupJob {
	fn id(&self) -> &'static str {
		"oauth_state_cleanup"
	}

	fn name(&self) -> &'static str {
		"OAuth state cleanup"
	}

	async fn run(&self) -> Result<JobOutput, JobError> {
		let dropped = self.states.purge_expired();
		Ok(JobOutput {
			message: format!("dropped {dropped} stale OAuth states"),
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::sync::atomic::{AtomicUsize, Ordering};

	struct CountingJob {
		runs: Arc<AtomicUsize>,
	}

	#[async_trait]
	impl Job for CountingJob {
		fn id(&self) -> &'static str {
			"counting"
		}

		fn name(&self) -> &'static str {
			"Counting job"
		}

		async fn run(&self) -> Result<JobOutput, JobError> {
			self.runs.fetch_add(1, Ordering::SeqCst);
			Ok(JobOutput {
				message: "counted".to_string(),
			})
		}
	}

	#[tokio::test]
	async fn run_all_once_runs_each_job() {
		let runs = Arc::new(AtomicUsize::new(0));
		let mut scheduler = JobScheduler::new();
		scheduler.register_periodic(
			Arc::new(CountingJob {
				runs: Arc::clone(&runs),
			}),
			Duration::from_secs(3600),
		);

		scheduler.run_all_once().await;
		assert_eq!(runs.load(Ordering::SeqCst), 1);
	}

	#[tokio::test]
	async fn periodic_job_fires_and_stops_on_shutdown() {
		let runs = Arc::new(AtomicUsize::new(0));
		let mut scheduler = JobScheduler::new();
		scheduler.register_periodic(
			Arc::new(CountingJob {
				runs: Arc::clone(&runs),
			}),
			Duration::from_millis(10),
		);

		scheduler.start().await;
		tokio::time::sleep(Duration::from_millis(100)).await;
		scheduler.shutdown().await;

		let after_shutdown = runs.load(Ordering::SeqCst);
		assert!(after_shutdown >= 1, "job never fired");

		tokio::time::sleep(Duration::from_millis(50)).await;
		assert_eq!(runs.load(Ordering::SeqCst), after_shutdown, "job fired after shutdown");
	}

	#[tokio::test]
	async fn failing_job_does_not_stop_scheduler() {
		struct FailingJob;

		#[async_trait]
		impl Job for FailingJob {
			fn id(&self) -> &'static str {
				"failing"
			}

			fn name(&self) -> &'static str {
				"Failing job"
			}

			async fn run(&self) -> Result<JobOutput, JobError> {
				Err(JobError::Failed("boom".to_string()))
			}
		}

		let mut scheduler = JobScheduler::new();
		scheduler.register_periodic(Arc::new(FailingJob), Duration::from_millis(10));
		scheduler.start().await;
		tokio::time::sleep(Duration::from_millis(50)).await;
		scheduler.shutdown().await;
	}
}
