// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error report types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;
use crate::severity::Severity;
use crate::stacktrace::{Stacktrace, TraceFrame};

/// Metadata key carrying caller-supplied trace frames.
pub const TRACE_KEY: &str = "trace";
/// Metadata key carrying the buffered log snapshot.
pub const LOGS_KEY: &str = "logs";

/// Structured metadata attached to a report.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// User identity attached to a report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserContext {
	pub id: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub email: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
}

impl UserContext {
	pub fn with_id(id: impl Into<String>) -> Self {
		Self {
			id: Some(id.into()),
			..Default::default()
		}
	}
}

/// One error event on its way to the reporting service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorReport {
	pub id: Uuid,
	/// Free-form classification of the source of the error.
	pub category: String,
	pub message: String,
	pub severity: Severity,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub stacktrace: Option<Stacktrace>,
	#[serde(default)]
	pub metadata: Metadata,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub user: Option<UserContext>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub release_stage: Option<String>,
	pub timestamp: DateTime<Utc>,
}

impl ErrorReport {
	pub fn new(category: impl Into<String>, message: impl Into<String>, severity: Severity) -> Self {
		Self {
			id: Uuid::now_v7(),
			category: category.into(),
			message: message.into(),
			severity,
			stacktrace: None,
			metadata: Metadata::new(),
			user: None,
			release_stage: None,
			timestamp: Utc::now(),
		}
	}

	pub fn with_metadata(mut self, metadata: Metadata) -> Self {
		self.metadata = metadata;
		self
	}

	pub fn with_user(mut self, user: Option<UserContext>) -> Self {
		self.user = user;
		self
	}

	pub fn set_metadata(&mut self, key: impl Into<String>, value: serde_json::Value) {
		self.metadata.insert(key.into(), value);
	}

	/// Remove the `trace` metadata entry and decode it.
	///
	/// Returns `Ok(None)` when the entry is absent or `null`. The entry is
	/// removed even when it fails to decode.
	pub fn take_trace(&mut self) -> Result<Option<Vec<TraceFrame>>> {
		match self.metadata.remove(TRACE_KEY) {
			None | Some(serde_json::Value::Null) => Ok(None),
			Some(value) => Ok(Some(serde_json::from_value(value)?)),
		}
	}
}
