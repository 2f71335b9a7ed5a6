// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Log buffer with pending queue, bounded history, and export targets.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::entry::{LogEntry, LogLevel};
use crate::source::{FlushState, LogSource, LogTarget};

/// Default number of flushed entries kept for attachment to reports.
pub const DEFAULT_CAPACITY: usize = 10_000;

/// Default number of pending entries that triggers an automatic flush.
pub const DEFAULT_FLUSH_INTERVAL: usize = 1_000;

/// A thread-safe log buffer.
///
/// New entries queue as pending until the buffer is flushed. A flush moves
/// them into a bounded ring of flushed entries (oldest evicted first) and
/// hands them to every registered [`LogTarget`]. While targets run the buffer
/// is [`FlushState::Flushing`] and further flush requests are ignored, so a
/// target that reports an error cannot start a nested flush.
#[derive(Clone)]
pub struct LogBuffer {
	inner: Arc<LogBufferInner>,
}

struct LogBufferInner {
	pending: Mutex<Vec<LogEntry>>,
	flushed: RwLock<VecDeque<LogEntry>>,
	capacity: usize,
	flush_interval: usize,
	next_id: AtomicU64,
	flushing: AtomicBool,
	targets: RwLock<Vec<Arc<dyn LogTarget>>>,
}

/// Holds the buffer in [`FlushState::Flushing`] until dropped.
struct FlushGuard<'a> {
	flushing: &'a AtomicBool,
}

impl<'a> FlushGuard<'a> {
	fn acquire(flushing: &'a AtomicBool) -> Option<Self> {
		flushing
			.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
			.ok()
			.map(|_| Self { flushing })
	}
}

impl Drop for FlushGuard<'_> {
	fn drop(&mut self) {
		self.flushing.store(false, Ordering::Release);
	}
}

impl LogBuffer {
	/// Create a new log buffer keeping up to `capacity` flushed entries.
	pub fn new(capacity: usize) -> Self {
		Self::with_flush_interval(capacity, DEFAULT_FLUSH_INTERVAL)
	}

	pub fn with_flush_interval(capacity: usize, flush_interval: usize) -> Self {
		Self {
			inner: Arc::new(LogBufferInner {
				pending: Mutex::new(Vec::new()),
				flushed: RwLock::new(VecDeque::with_capacity(capacity.min(DEFAULT_CAPACITY))),
				capacity,
				flush_interval: flush_interval.max(1),
				next_id: AtomicU64::new(1),
				flushing: AtomicBool::new(false),
				targets: RwLock::new(Vec::new()),
			}),
		}
	}

	pub fn with_default_capacity() -> Self {
		Self::new(DEFAULT_CAPACITY)
	}

	/// Register a target that receives entries on every flush.
	pub fn add_target(&self, target: Arc<dyn LogTarget>) {
		self.inner.targets.write().push(target);
	}

	/// Queue a new log entry.
	///
	/// Flushes automatically once the pending queue reaches the flush interval.
	pub fn push(
		&self,
		level: LogLevel,
		target: String,
		message: String,
		fields: Vec<(String, String)>,
	) {
		let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
		let entry = LogEntry::new(id, level, target, message, fields);

		let pending = {
			let mut pending = self.inner.pending.lock();
			pending.push(entry);
			pending.len()
		};

		if pending >= self.inner.flush_interval {
			self.flush(false);
		}
	}

	/// Export pending entries to the targets.
	///
	/// Without `drain`, nothing happens until the pending queue has reached the
	/// flush interval. Does nothing while a flush is already running.
	pub fn flush(&self, drain: bool) {
		let Some(_guard) = FlushGuard::acquire(&self.inner.flushing) else {
			return;
		};

		let batch = {
			let mut pending = self.inner.pending.lock();
			if !drain && pending.len() < self.inner.flush_interval {
				return;
			}
			std::mem::take(&mut *pending)
		};

		if batch.is_empty() {
			return;
		}

		{
			let mut flushed = self.inner.flushed.write();
			flushed.extend(batch.iter().cloned());
			let excess = flushed.len().saturating_sub(self.inner.capacity);
			flushed.drain(..excess);
		}

		let targets = self.inner.targets.read().clone();
		for target in targets {
			target.export(&batch);
		}
	}

	pub fn flush_state(&self) -> FlushState {
		if self.inner.flushing.load(Ordering::Acquire) {
			FlushState::Flushing
		} else {
			FlushState::Idle
		}
	}

	/// Flushed entries in chronological order.
	pub fn messages(&self) -> Vec<LogEntry> {
		self.inner.flushed.read().iter().cloned().collect()
	}

	/// Number of entries waiting for the next flush.
	pub fn pending_len(&self) -> usize {
		self.inner.pending.lock().len()
	}

	/// Number of flushed entries currently kept.
	pub fn len(&self) -> usize {
		self.inner.flushed.read().len()
	}

	pub fn is_empty(&self) -> bool {
		self.inner.flushed.read().is_empty()
	}

	pub fn capacity(&self) -> usize {
		self.inner.capacity
	}

	/// Drop all pending and flushed entries.
	pub fn clear(&self) {
		self.inner.pending.lock().clear();
		self.inner.flushed.write().clear();
	}
}

impl Default for LogBuffer {
	fn default() -> Self {
		Self::with_default_capacity()
	}
}

impl LogSource for LogBuffer {
	fn flush(&self, drain: bool) {
		LogBuffer::flush(self, drain);
	}

	fn flush_state(&self) -> FlushState {
		LogBuffer::flush_state(self)
	}

	fn messages(&self) -> Vec<LogEntry> {
		LogBuffer::messages(self)
	}
}
