// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Mergeable configuration layer spanning all sections.

use serde::Deserialize;

use crate::sections::{
	DatabaseConfigLayer, HttpConfigLayer, JobsConfigLayer, LoggingConfigLayer, SessionConfigLayer,
};

/// Partial configuration from a single source; sections absent from the
/// source stay `None` and do not override lower-precedence sources.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerConfigLayer {
	#[serde(default)]
	pub http: Option<HttpConfigLayer>,
	#[serde(default)]
	pub database: Option<DatabaseConfigLayer>,
	#[serde(default)]
	pub session: Option<SessionConfigLayer>,
	#[serde(default)]
	pub jobs: Option<JobsConfigLayer>,
	#[serde(default)]
	pub logging: Option<LoggingConfigLayer>,
}

impl ServerConfigLayer {
	/// Merge a higher-precedence layer into this one.
	pub fn merge(&mut self, other: ServerConfigLayer) {
		merge_section(&mut self.http, other.http, HttpConfigLayer::merge);
		merge_section(&mut self.database, other.database, DatabaseConfigLayer::merge);
		merge_section(&mut self.session, other.session, SessionConfigLayer::merge);
		merge_section(&mut self.jobs, other.jobs, JobsConfigLayer::merge);
		merge_section(&mut self.logging, other.logging, LoggingConfigLayer::merge);
	}
}

fn merge_section<T>(base: &mut Option<T>, other: Option<T>, merge: impl FnOnce(&mut T, T)) {
	let Some(other) = other else { return };
	match base.take() {
		Some(mut existing) => {
			merge(&mut existing, other);
			*base = Some(existing);
		}
		None => *base = Some(other),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_merge_takes_higher_precedence_fields() {
		let mut base = ServerConfigLayer {
			http: Some(HttpConfigLayer {
				host: Some("127.0.0.1".to_string()),
				port: Some(9000),
				base_url: None,
			}),
			..Default::default()
		};
		base.merge(ServerConfigLayer {
			http: Some(HttpConfigLayer {
				host: None,
				port: Some(8081),
				base_url: None,
			}),
			database: Some(DatabaseConfigLayer {
				url: Some("sqlite::memory:".to_string()),
			}),
			..Default::default()
		});

		let http = base.http.unwrap();
		assert_eq!(http.host.as_deref(), Some("127.0.0.1"));
		assert_eq!(http.port, Some(8081));
		assert_eq!(
			base.database.unwrap().url.as_deref(),
			Some("sqlite::memory:")
		);
	}

	#[test]
	fn test_merge_absent_section_keeps_base() {
		let mut base = ServerConfigLayer {
			jobs: Some(JobsConfigLayer {
				purge_interval_secs: Some(60),
			}),
			..Default::default()
		};
		base.merge(ServerConfigLayer::default());
		assert_eq!(base.jobs.unwrap().purge_interval_secs, Some(60));
	}

	#[test]
	fn test_toml_deserializes_partial_layer() {
		let layer: ServerConfigLayer = toml::from_str(
			r#"
			[http]
			port = 9999

			[logging]
			level = "debug"
			"#,
		)
		.unwrap();
		assert_eq!(layer.http.unwrap().port, Some(9999));
		assert_eq!(layer.logging.unwrap().level.as_deref(), Some("debug"));
		assert!(layer.database.is_none());
	}
}
