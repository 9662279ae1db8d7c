// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Background job configuration.

use serde::Deserialize;

/// Default interval between expired-secret purge runs: one hour.
pub const DEFAULT_PURGE_INTERVAL_SECS: u64 = 3600;

/// Jobs configuration (runtime, fully resolved).
#[derive(Debug, Clone)]
pub struct JobsConfig {
	pub purge_interval_secs: u64,
}

impl Default for JobsConfig {
	fn default() -> Self {
		Self {
			purge_interval_secs: DEFAULT_PURGE_INTERVAL_SECS,
		}
	}
}

/// Jobs configuration layer (partial, for merging).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobsConfigLayer {
	#[serde(default)]
	pub purge_interval_secs: Option<u64>,
}

impl JobsConfigLayer {
	pub fn merge(&mut self, other: JobsConfigLayer) {
		if other.purge_interval_secs.is_some() {
			self.purge_interval_secs = other.purge_interval_secs;
		}
	}

	pub fn finalize(self) -> JobsConfig {
		// A zero interval would spin the purge loop; fall back to the default.
		let purge_interval_secs = match self.purge_interval_secs {
			Some(0) | None => DEFAULT_PURGE_INTERVAL_SECS,
			Some(secs) => secs,
		};
		JobsConfig {
			purge_interval_secs,
		}
	}
}
