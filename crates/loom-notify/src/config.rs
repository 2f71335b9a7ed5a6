// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Notifier configuration.

use std::fmt;
use std::time::Duration;

use loom_notify_logs::DEFAULT_CAPACITY;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Release stage used when neither the config nor the environment names one.
pub const DEFAULT_RELEASE_STAGE: &str = "production";

/// Environment variable naming the application's deployment environment.
pub const APP_ENV_VAR: &str = "LOOM_ENV";

/// Metadata keys filtered out of reports by default.
pub const DEFAULT_FILTERS: &[&str] = &["password"];

pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Queued reports that trigger a send while batching.
pub const DEFAULT_MAX_BATCH_SIZE: usize = 10;

/// Queued reports kept before the oldest are dropped.
pub const DEFAULT_MAX_QUEUE_SIZE: usize = 1000;

/// A partial configuration, as read from a single source.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NotifierConfigLayer {
	pub api_key: Option<String>,
	pub release_stage: Option<String>,
	pub notify_release_stages: Option<Vec<String>>,
	pub filters: Option<Vec<String>>,
	pub batch_sending: Option<bool>,
	pub endpoint: Option<String>,
	pub request_timeout_secs: Option<u64>,
	pub log_capacity: Option<usize>,
	pub max_batch_size: Option<usize>,
	pub max_queue_size: Option<usize>,
}

impl NotifierConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.api_key.is_some() {
			self.api_key = other.api_key;
		}
		if other.release_stage.is_some() {
			self.release_stage = other.release_stage;
		}
		if other.notify_release_stages.is_some() {
			self.notify_release_stages = other.notify_release_stages;
		}
		if other.filters.is_some() {
			self.filters = other.filters;
		}
		if other.batch_sending.is_some() {
			self.batch_sending = other.batch_sending;
		}
		if other.endpoint.is_some() {
			self.endpoint = other.endpoint;
		}
		if other.request_timeout_secs.is_some() {
			self.request_timeout_secs = other.request_timeout_secs;
		}
		if other.log_capacity.is_some() {
			self.log_capacity = other.log_capacity;
		}
		if other.max_batch_size.is_some() {
			self.max_batch_size = other.max_batch_size;
		}
		if other.max_queue_size.is_some() {
			self.max_queue_size = other.max_queue_size;
		}
	}

	/// Resolve defaults and validate.
	///
	/// Fails with [`ConfigError::MissingApiKey`] when no non-blank API key is set.
	pub fn finalize(self) -> Result<NotifierConfig, ConfigError> {
		let api_key = self
			.api_key
			.map(|k| k.trim().to_string())
			.filter(|k| !k.is_empty())
			.ok_or(ConfigError::MissingApiKey)?;

		let release_stage = resolve_release_stage(
			self.release_stage,
			std::env::var(APP_ENV_VAR).ok(),
		);

		Ok(NotifierConfig {
			api_key,
			release_stage,
			notify_release_stages: self.notify_release_stages.unwrap_or_default(),
			filters: self
				.filters
				.unwrap_or_else(|| DEFAULT_FILTERS.iter().map(|f| f.to_string()).collect()),
			batch_sending: self.batch_sending.unwrap_or(true),
			endpoint: self.endpoint.filter(|e| !e.is_empty()),
			request_timeout: Duration::from_secs(
				self.request_timeout_secs.unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
			),
			log_capacity: self.log_capacity.unwrap_or(DEFAULT_CAPACITY),
			max_batch_size: self.max_batch_size.unwrap_or(DEFAULT_MAX_BATCH_SIZE),
			max_queue_size: self.max_queue_size.unwrap_or(DEFAULT_MAX_QUEUE_SIZE),
		})
	}
}

/// Pick the configured stage, then the application environment, then
/// [`DEFAULT_RELEASE_STAGE`].
pub fn resolve_release_stage(configured: Option<String>, app_env: Option<String>) -> String {
	configured
		.filter(|s| !s.is_empty())
		.or_else(|| app_env.filter(|s| !s.is_empty()))
		.unwrap_or_else(|| DEFAULT_RELEASE_STAGE.to_string())
}

/// Validated notifier configuration.
#[derive(Clone, PartialEq)]
pub struct NotifierConfig {
	pub api_key: String,
	pub release_stage: String,
	/// Stages for which reports are sent. Empty means every stage.
	pub notify_release_stages: Vec<String>,
	pub filters: Vec<String>,
	pub batch_sending: bool,
	pub endpoint: Option<String>,
	pub request_timeout: Duration,
	/// Number of flushed log entries kept for attachment to reports.
	pub log_capacity: usize,
	/// Queued reports that trigger a send while batching.
	pub max_batch_size: usize,
	/// Queued reports kept before the oldest are dropped.
	pub max_queue_size: usize,
}

impl NotifierConfig {
	/// Configuration with defaults for everything but the API key.
	pub fn new(api_key: impl Into<String>) -> Result<Self, ConfigError> {
		NotifierConfigLayer {
			api_key: Some(api_key.into()),
			..Default::default()
		}
		.finalize()
	}
}

impl fmt::Debug for NotifierConfig {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("NotifierConfig")
			.field("api_key", &"[REDACTED]")
			.field("release_stage", &self.release_stage)
			.field("notify_release_stages", &self.notify_release_stages)
			.field("filters", &self.filters)
			.field("batch_sending", &self.batch_sending)
			.field("endpoint", &self.endpoint)
			.field("request_timeout", &self.request_timeout)
			.field("log_capacity", &self.log_capacity)
			.field("max_batch_size", &self.max_batch_size)
			.field("max_queue_size", &self.max_queue_size)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn layer_with_key() -> NotifierConfigLayer {
		NotifierConfigLayer {
			api_key: Some("key_123".to_string()),
			release_stage: Some("staging".to_string()),
			..Default::default()
		}
	}

	#[test]
	fn test_missing_api_key_fails() {
		let result = NotifierConfigLayer::default().finalize();
		assert!(matches!(result, Err(ConfigError::MissingApiKey)));
	}

	#[test]
	fn test_blank_api_key_fails() {
		let layer = NotifierConfigLayer {
			api_key: Some("   ".to_string()),
			..Default::default()
		};
		assert!(matches!(layer.finalize(), Err(ConfigError::MissingApiKey)));
	}

	#[test]
	fn test_finalize_defaults() {
		let config = layer_with_key().finalize().unwrap();
		assert_eq!(config.api_key, "key_123");
		assert_eq!(config.release_stage, "staging");
		assert_eq!(config.filters, vec!["password".to_string()]);
		assert!(config.notify_release_stages.is_empty());
		assert!(config.batch_sending);
		assert!(config.endpoint.is_none());
		assert_eq!(config.request_timeout, Duration::from_secs(30));
		assert_eq!(config.log_capacity, DEFAULT_CAPACITY);
		assert_eq!(config.max_batch_size, DEFAULT_MAX_BATCH_SIZE);
		assert_eq!(config.max_queue_size, DEFAULT_MAX_QUEUE_SIZE);
	}

	#[test]
	fn test_merge_overwrites() {
		let mut base = layer_with_key();
		base.merge(NotifierConfigLayer {
			release_stage: Some("production".to_string()),
			filters: Some(vec!["secret".to_string()]),
			..Default::default()
		});

		assert_eq!(base.api_key.as_deref(), Some("key_123"));
		assert_eq!(base.release_stage.as_deref(), Some("production"));
		assert_eq!(base.filters, Some(vec!["secret".to_string()]));
	}

	#[test]
	fn test_release_stage_resolution() {
		assert_eq!(
			resolve_release_stage(Some("beta".into()), Some("dev".into())),
			"beta"
		);
		assert_eq!(resolve_release_stage(None, Some("dev".into())), "dev");
		assert_eq!(resolve_release_stage(Some(String::new()), None), "production");
		assert_eq!(resolve_release_stage(None, None), DEFAULT_RELEASE_STAGE);
	}

	#[test]
	fn test_debug_redacts_api_key() {
		let config = NotifierConfig::new("super-secret-key").unwrap();
		let debug = format!("{:?}", config);
		assert!(!debug.contains("super-secret-key"));
		assert!(debug.contains("[REDACTED]"));
	}
}
