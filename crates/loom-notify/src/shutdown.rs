// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Process shutdown: final log flush and delivery of queued reports.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use loom_notify_logs::{FlushState, LogSource};
use tracing::error;

use crate::client::NotifyClient;

/// Flushes buffered logs once and delivers queued reports.
///
/// Running it again is harmless: the log flush is skipped and the client
/// has nothing left to send.
#[derive(Clone)]
pub struct ShutdownCoordinator {
	client: NotifyClient,
	logs: Arc<dyn LogSource>,
	logs_flushed: Arc<AtomicBool>,
}

impl ShutdownCoordinator {
	pub fn new(client: NotifyClient, logs: Arc<dyn LogSource>) -> Self {
		Self {
			client,
			logs,
			logs_flushed: Arc::new(AtomicBool::new(false)),
		}
	}

	pub fn run(&self) {
		// Logs flushed here may be reported by a log target, so they go first.
		if self.logs.flush_state() == FlushState::Idle
			&& !self.logs_flushed.swap(true, Ordering::SeqCst)
		{
			self.logs.flush(true);
		}

		if let Err(e) = self.client.shutdown_handler() {
			error!(error = %e, "Failed to deliver queued error reports at shutdown");
		}
	}
}

/// Runs a [`ShutdownCoordinator`] when dropped.
#[must_use = "the shutdown handler runs when the guard is dropped"]
pub struct ShutdownGuard {
	coordinator: ShutdownCoordinator,
}

impl ShutdownGuard {
	pub fn new(coordinator: ShutdownCoordinator) -> Self {
		Self { coordinator }
	}
}

impl Drop for ShutdownGuard {
	fn drop(&mut self) {
		self.coordinator.run();
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error::Result;
	use crate::transport::Transport;
	use loom_notify_core::{ErrorReport, Metadata, Severity};
	use loom_notify_logs::{LogBuffer, LogLevel};
	use parking_lot::Mutex;

	#[derive(Default)]
	struct RecordingTransport {
		sent: Mutex<Vec<ErrorReport>>,
	}

	impl Transport for RecordingTransport {
		fn send(&self, reports: &[ErrorReport]) -> Result<()> {
			self.sent.lock().extend_from_slice(reports);
			Ok(())
		}
	}

	fn batched_client(transport: Arc<RecordingTransport>) -> NotifyClient {
		NotifyClient::builder()
			.api_key("key_123")
			.batch_sending(true)
			.transport(transport)
			.build()
			.unwrap()
	}

	#[test]
	fn test_run_flushes_logs_and_sends_queue() {
		let transport = Arc::new(RecordingTransport::default());
		let client = batched_client(transport.clone());
		let buffer = LogBuffer::new(100);
		buffer.push(LogLevel::Info, "app".into(), "shutting down".into(), vec![]);

		client
			.notify_error("c", "queued", Metadata::new(), Severity::Error, None)
			.unwrap();

		ShutdownCoordinator::new(client.clone(), Arc::new(buffer.clone())).run();

		assert_eq!(buffer.pending_len(), 0);
		assert_eq!(buffer.len(), 1);
		assert_eq!(transport.sent.lock().len(), 1);
		assert!(client.is_closed());
	}

	#[test]
	fn test_second_run_skips_log_flush() {
		let transport = Arc::new(RecordingTransport::default());
		let buffer = LogBuffer::new(100);
		let coordinator = ShutdownCoordinator::new(batched_client(transport), Arc::new(buffer.clone()));

		coordinator.run();
		buffer.push(LogLevel::Info, "app".into(), "late".into(), vec![]);
		coordinator.run();

		assert_eq!(buffer.pending_len(), 1);
	}

	#[test]
	fn test_guard_runs_on_drop() {
		let transport = Arc::new(RecordingTransport::default());
		let client = batched_client(transport.clone());
		client
			.notify_error("c", "queued", Metadata::new(), Severity::Error, None)
			.unwrap();

		{
			let _guard = ShutdownGuard::new(ShutdownCoordinator::new(
				client.clone(),
				Arc::new(LogBuffer::new(10)),
			));
		}

		assert_eq!(transport.sent.lock().len(), 1);
	}
}
