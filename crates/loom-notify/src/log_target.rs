// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Log target that turns exported log entries into reports.

use std::sync::Weak;

use loom_notify_core::Severity;
use loom_notify_logs::{LogEntry, LogLevel, LogTarget};

use crate::notifier::{Notifier, NotifierInner};

/// Log target of this crate's own records, which are never reported.
const OWN_TARGET: &str = "loom_notify";

/// Reports exported log entries at or above a minimum level.
///
/// Runs while the log buffer is flushing, so the enrichment hook of the
/// resulting reports does not flush again. Holds the notifier weakly; once
/// the notifier is dropped, entries are ignored.
pub struct ReportingLogTarget {
	notifier: Weak<NotifierInner>,
	min_level: LogLevel,
}

impl ReportingLogTarget {
	pub(crate) fn new(notifier: Weak<NotifierInner>, min_level: LogLevel) -> Self {
		Self {
			notifier,
			min_level,
		}
	}
}

impl LogTarget for ReportingLogTarget {
	fn export(&self, entries: &[LogEntry]) {
		let Some(inner) = self.notifier.upgrade() else {
			return;
		};
		let notifier = Notifier { inner };

		for entry in entries
			.iter()
			.filter(|e| e.level >= self.min_level && !is_own_target(&e.target))
		{
			notifier.notify_with_severity(&entry.target, &entry.message, None, severity_for(entry.level));
		}
	}
}

fn is_own_target(target: &str) -> bool {
	target == OWN_TARGET || target.starts_with("loom_notify::")
}

fn severity_for(level: LogLevel) -> Severity {
	match level {
		LogLevel::Error => Severity::Error,
		LogLevel::Warn => Severity::Warning,
		_ => Severity::Info,
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_own_target_detection() {
		assert!(is_own_target("loom_notify"));
		assert!(is_own_target("loom_notify::client"));
		assert!(!is_own_target("loom_notifyish::client"));
		assert!(!is_own_target("app::billing"));
	}

	#[test]
	fn test_severity_mapping() {
		assert_eq!(severity_for(LogLevel::Error), Severity::Error);
		assert_eq!(severity_for(LogLevel::Warn), Severity::Warning);
		assert_eq!(severity_for(LogLevel::Info), Severity::Info);
		assert_eq!(severity_for(LogLevel::Trace), Severity::Info);
	}

	#[test]
	fn test_dropped_notifier_ignores_entries() {
		let target = ReportingLogTarget::new(Weak::new(), LogLevel::Error);
		target.export(&[LogEntry::new(1, LogLevel::Error, "app", "boom", vec![])]);
	}
}
