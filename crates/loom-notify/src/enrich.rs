// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Before-notify enrichment: log flush, trace conversion, log attachment.

use std::sync::Arc;

use loom_notify_core::{ErrorReport, Stacktrace, LOGS_KEY};
use loom_notify_logs::{FlushState, LogEntry, LogMessage, LogSource};
use tracing::warn;

use crate::client::BeforeNotify;
use crate::error::{NotifyError, Result};

/// Enriches every report with the caller's trace and the buffered logs.
///
/// For each report, in order:
/// 1. flushes the log source, unless it is already flushing (the report was
///    raised by one of its targets);
/// 2. replaces the report's stacktrace with one built from the `trace`
///    metadata entry, when that entry holds at least one frame, and removes
///    the entry;
/// 3. sets `logs` to the flushed log entries.
///
/// Failures are logged and never stop the report.
pub struct EnrichmentHook {
	logs: Arc<dyn LogSource>,
}

impl EnrichmentHook {
	pub fn new(logs: Arc<dyn LogSource>) -> Self {
		Self { logs }
	}

	pub fn apply(&self, report: &mut ErrorReport) {
		if self.logs.flush_state() == FlushState::Idle {
			self.logs.flush(true);
		}

		if let Err(e) = attach_trace(report) {
			warn!(error = %e, category = %report.category, "Ignoring malformed trace metadata");
		}

		let messages: Vec<LogMessage> =
			self.logs.messages().iter().map(LogEntry::to_message).collect();
		match serde_json::to_value(messages) {
			Ok(logs) => report.set_metadata(LOGS_KEY, logs),
			Err(e) => warn!(error = %e, "Failed to attach buffered logs to report"),
		}
	}

	/// Wrap the hook for registration with
	/// [`NotifyClient::add_before_notify`](crate::NotifyClient::add_before_notify).
	pub fn into_before_notify(self) -> BeforeNotify {
		Arc::new(move |report: &mut ErrorReport| self.apply(report))
	}
}

fn attach_trace(report: &mut ErrorReport) -> Result<()> {
	let trace = report.take_trace().map_err(NotifyError::InvalidTrace)?;

	if let Some((origin, rest)) = trace.as_deref().and_then(<[_]>::split_first) {
		report.stacktrace = Some(Stacktrace::from_trace(origin, rest));
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use loom_notify_core::{Frame, Severity, TraceFrame, TRACE_KEY};
	use loom_notify_logs::{LogBuffer, LogLevel};
	use serde_json::json;

	fn report_with_trace(trace: serde_json::Value) -> ErrorReport {
		let mut report = ErrorReport::new("app", "failure", Severity::Error);
		report.set_metadata(TRACE_KEY, trace);
		report
	}

	fn existing_stacktrace() -> Stacktrace {
		Stacktrace {
			frames: vec![Frame {
				file: "src/main.rs".into(),
				line_number: 1,
				method: Some("main".into()),
			}],
		}
	}

	#[test]
	fn test_flushes_pending_logs_into_report() {
		let buffer = LogBuffer::new(100);
		buffer.push(LogLevel::Info, "app".into(), "before error".into(), vec![]);
		let hook = EnrichmentHook::new(Arc::new(buffer.clone()));

		let mut report = ErrorReport::new("app", "failure", Severity::Error);
		hook.apply(&mut report);

		assert_eq!(buffer.pending_len(), 0);
		let logs = report.metadata[LOGS_KEY].as_array().unwrap();
		assert_eq!(logs.len(), 1);
		assert_eq!(logs[0]["text"], "before error");
		assert_eq!(logs[0]["level"], "info");
	}

	#[test]
	fn test_trace_becomes_stacktrace() {
		let hook = EnrichmentHook::new(Arc::new(LogBuffer::new(10)));
		let mut report = report_with_trace(json!([
			{"file": "a.php", "line": 10},
			{"file": "b.php", "line": 5},
		]));

		hook.apply(&mut report);

		assert!(!report.metadata.contains_key(TRACE_KEY));
		let st = report.stacktrace.unwrap();
		assert_eq!(st.frames.len(), 2);
		assert_eq!((st.frames[0].file.as_str(), st.frames[0].line_number), ("a.php", 10));
		assert_eq!((st.frames[1].file.as_str(), st.frames[1].line_number), ("b.php", 5));
	}

	#[test]
	fn test_empty_trace_keeps_existing_stacktrace() {
		let hook = EnrichmentHook::new(Arc::new(LogBuffer::new(10)));
		let mut report = report_with_trace(json!([]));
		report.stacktrace = Some(existing_stacktrace());

		hook.apply(&mut report);

		assert!(!report.metadata.contains_key(TRACE_KEY));
		assert_eq!(report.stacktrace, Some(existing_stacktrace()));
	}

	#[test]
	fn test_malformed_trace_does_not_stop_enrichment() {
		let hook = EnrichmentHook::new(Arc::new(LogBuffer::new(10)));
		let mut report = report_with_trace(json!([{"file": "a.php"}]));
		report.stacktrace = Some(existing_stacktrace());

		hook.apply(&mut report);

		assert!(!report.metadata.contains_key(TRACE_KEY));
		assert_eq!(report.stacktrace, Some(existing_stacktrace()));
		assert!(report.metadata.contains_key(LOGS_KEY));
	}

	#[test]
	fn test_trace_functions_carried_to_frames() {
		let hook = EnrichmentHook::new(Arc::new(LogBuffer::new(10)));
		let trace = vec![TraceFrame::new("src/db.rs", 40).with_function("app::db::query")];
		let mut report = report_with_trace(serde_json::to_value(trace).unwrap());

		hook.apply(&mut report);

		let st = report.stacktrace.unwrap();
		assert_eq!(st.frames[0].method.as_deref(), Some("app::db::query"));
	}
}
