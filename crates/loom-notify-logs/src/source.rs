// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Traits connecting the buffer to its consumers.

use crate::entry::LogEntry;

/// Whether a buffer is currently exporting entries to its targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushState {
	Idle,
	Flushing,
}

/// Receives log entries when a buffer is flushed.
///
/// `export` runs while the buffer is [`FlushState::Flushing`]; anything it
/// triggers that asks the buffer to flush again is a no-op.
pub trait LogTarget: Send + Sync {
	fn export(&self, entries: &[LogEntry]);
}

/// Buffered logs as seen by error reporting.
pub trait LogSource: Send + Sync {
	/// Export pending entries. With `drain` unset, only flushes once the
	/// pending queue has reached the buffer's flush interval.
	fn flush(&self, drain: bool);

	fn flush_state(&self) -> FlushState;

	/// Flushed entries in chronological order.
	fn messages(&self) -> Vec<LogEntry>;
}
