// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Buffered log records and the form they take on error reports.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Structured fields recorded with a log event, keyed by field name.
///
/// Serializes as a JSON object so report filters can redact fields by name.
pub type LogFields = BTreeMap<String, String>;

/// Severity of a buffered log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
	Trace,
	Debug,
	Info,
	Warn,
	Error,
}

impl LogLevel {
	pub fn as_str(&self) -> &'static str {
		match self {
			LogLevel::Trace => "trace",
			LogLevel::Debug => "debug",
			LogLevel::Info => "info",
			LogLevel::Warn => "warn",
			LogLevel::Error => "error",
		}
	}
}

impl From<tracing::Level> for LogLevel {
	fn from(level: tracing::Level) -> Self {
		if level == tracing::Level::ERROR {
			LogLevel::Error
		} else if level == tracing::Level::WARN {
			LogLevel::Warn
		} else if level == tracing::Level::INFO {
			LogLevel::Info
		} else if level == tracing::Level::DEBUG {
			LogLevel::Debug
		} else {
			LogLevel::Trace
		}
	}
}

impl fmt::Display for LogLevel {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// A log record held by a [`LogBuffer`](crate::LogBuffer).
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
	/// Position in the buffer's sequence, starting at 1.
	pub id: u64,
	pub timestamp: DateTime<Utc>,
	pub level: LogLevel,
	/// Category of the record; the tracing target for captured events.
	pub target: String,
	pub message: String,
	pub fields: LogFields,
}

impl LogEntry {
	pub fn new(
		id: u64,
		level: LogLevel,
		target: impl Into<String>,
		message: impl Into<String>,
		fields: impl IntoIterator<Item = (String, String)>,
	) -> Self {
		Self {
			id,
			timestamp: Utc::now(),
			level,
			target: target.into(),
			message: message.into(),
			fields: fields.into_iter().collect(),
		}
	}

	/// The record as attached to an error report.
	pub fn to_message(&self) -> LogMessage {
		LogMessage {
			timestamp: self.timestamp,
			level: self.level,
			category: self.target.clone(),
			text: self.message.clone(),
			fields: self.fields.clone(),
		}
	}
}

/// Snapshot of a flushed log record carried in report metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogMessage {
	pub timestamp: DateTime<Utc>,
	pub level: LogLevel,
	pub category: String,
	pub text: String,
	#[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
	pub fields: LogFields,
}
