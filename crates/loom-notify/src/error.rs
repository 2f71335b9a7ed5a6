// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for the notifier.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for notifier operations.
pub type Result<T> = std::result::Result<T, NotifyError>;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// No API key configured, or the key is blank.
	#[error("notifier API key must be set")]
	MissingApiKey,

	/// A notifier was built without any configuration.
	#[error("notifier configuration must be provided")]
	MissingConfig,

	#[error("failed to read config file {path}: {source}")]
	FileRead {
		path: PathBuf,
		source: std::io::Error,
	},

	#[error("failed to parse config file {path}: {source}")]
	TomlParse {
		path: PathBuf,
		source: toml::de::Error,
	},

	#[error("invalid value for {key}: {message}")]
	InvalidValue { key: String, message: String },
}

/// Errors that can occur while reporting.
#[derive(Debug, Error)]
pub enum NotifyError {
	#[error(transparent)]
	Config(#[from] ConfigError),

	/// Trace metadata could not be decoded into frames.
	#[error("invalid trace metadata: {0}")]
	InvalidTrace(#[source] loom_notify_core::CoreError),

	/// The user identity lookup failed.
	#[error("user lookup failed: {0}")]
	UserLookup(String),

	/// No endpoint configured for the HTTP transport.
	#[error("notify endpoint is not configured")]
	MissingEndpoint,

	#[error("HTTP request failed: {0}")]
	RequestFailed(#[from] reqwest::Error),

	#[error("server error (status {status}): {message}")]
	ServerError {
		/// HTTP status code.
		status: u16,
		/// Error message from server.
		message: String,
	},

	#[error("rate limited, retry after {retry_after_secs:?} seconds")]
	RateLimited { retry_after_secs: Option<u64> },

	#[error("serialization error: {0}")]
	Serialization(#[from] serde_json::Error),
}
