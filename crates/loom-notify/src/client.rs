// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Reporting client: hooks, filtering, release-stage gating and batching.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use loom_notify_core::{ErrorReport, Metadata, Notifiable, Severity, UserContext};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::config::{
	NotifierConfig, DEFAULT_FILTERS, DEFAULT_MAX_BATCH_SIZE, DEFAULT_MAX_QUEUE_SIZE,
	DEFAULT_RELEASE_STAGE, DEFAULT_REQUEST_TIMEOUT_SECS,
};
use crate::error::{ConfigError, Result};
use crate::filter::filter_metadata;
use crate::transport::{HttpTransport, Transport};

/// Callback run on every report before it is queued or sent.
pub type BeforeNotify = Arc<dyn Fn(&mut ErrorReport) + Send + Sync>;

/// Builder for constructing a [`NotifyClient`].
pub struct NotifyClientBuilder {
	api_key: Option<String>,
	release_stage: Option<String>,
	notify_release_stages: Vec<String>,
	filters: Vec<String>,
	batch_sending: bool,
	max_batch_size: usize,
	max_queue_size: usize,
	endpoint: Option<String>,
	request_timeout: Duration,
	transport: Option<Arc<dyn Transport>>,
}

impl NotifyClientBuilder {
	pub fn new() -> Self {
		Self {
			api_key: None,
			release_stage: None,
			notify_release_stages: Vec::new(),
			filters: DEFAULT_FILTERS.iter().map(|f| f.to_string()).collect(),
			batch_sending: true,
			max_batch_size: DEFAULT_MAX_BATCH_SIZE,
			max_queue_size: DEFAULT_MAX_QUEUE_SIZE,
			endpoint: None,
			request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
			transport: None,
		}
	}

	/// Start from a validated configuration.
	pub fn from_config(config: &NotifierConfig) -> Self {
		Self {
			api_key: Some(config.api_key.clone()),
			release_stage: Some(config.release_stage.clone()),
			notify_release_stages: config.notify_release_stages.clone(),
			filters: config.filters.clone(),
			batch_sending: config.batch_sending,
			max_batch_size: config.max_batch_size,
			max_queue_size: config.max_queue_size,
			endpoint: config.endpoint.clone(),
			request_timeout: config.request_timeout,
			transport: None,
		}
	}

	pub fn api_key(mut self, key: impl Into<String>) -> Self {
		self.api_key = Some(key.into());
		self
	}

	pub fn release_stage(mut self, stage: impl Into<String>) -> Self {
		self.release_stage = Some(stage.into());
		self
	}

	/// Only send reports while the release stage is one of `stages`.
	pub fn notify_release_stages(mut self, stages: Vec<String>) -> Self {
		self.notify_release_stages = stages;
		self
	}

	pub fn filters(mut self, filters: Vec<String>) -> Self {
		self.filters = filters;
		self
	}

	pub fn batch_sending(mut self, enabled: bool) -> Self {
		self.batch_sending = enabled;
		self
	}

	/// Send queued reports once `size` of them are waiting.
	pub fn max_batch_size(mut self, size: usize) -> Self {
		self.max_batch_size = size;
		self
	}

	/// Drop the oldest queued reports beyond `size`.
	pub fn max_queue_size(mut self, size: usize) -> Self {
		self.max_queue_size = size;
		self
	}

	pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
		self.endpoint = Some(endpoint.into());
		self
	}

	pub fn request_timeout(mut self, timeout: Duration) -> Self {
		self.request_timeout = timeout;
		self
	}

	/// Use `transport` instead of an [`HttpTransport`] for the endpoint.
	pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
		self.transport = Some(transport);
		self
	}

	pub fn build(self) -> Result<NotifyClient> {
		let api_key = self
			.api_key
			.filter(|k| !k.trim().is_empty())
			.ok_or(ConfigError::MissingApiKey)?;

		let transport = match self.transport {
			Some(transport) => transport,
			None => {
				let endpoint = self.endpoint.unwrap_or_default();
				Arc::new(HttpTransport::new(endpoint, api_key, self.request_timeout)?)
			}
		};

		let release_stage = self
			.release_stage
			.unwrap_or_else(|| DEFAULT_RELEASE_STAGE.to_string());

		let max_batch_size = self.max_batch_size.max(1);
		let max_queue_size = self.max_queue_size.max(max_batch_size);

		info!(
			release_stage = %release_stage,
			batch_sending = self.batch_sending,
			max_batch_size,
			max_queue_size,
			"Notify client initialized"
		);

		Ok(NotifyClient {
			inner: Arc::new(NotifyClientInner {
				release_stage: RwLock::new(release_stage),
				notify_release_stages: RwLock::new(self.notify_release_stages),
				filters: RwLock::new(self.filters),
				batch_sending: AtomicBool::new(self.batch_sending),
				max_batch_size,
				max_queue_size,
				hooks: RwLock::new(Vec::new()),
				queue: Mutex::new(Vec::new()),
				closed: AtomicBool::new(false),
				transport,
			}),
		})
	}
}

impl Default for NotifyClientBuilder {
	fn default() -> Self {
		Self::new()
	}
}

struct NotifyClientInner {
	release_stage: RwLock<String>,
	notify_release_stages: RwLock<Vec<String>>,
	filters: RwLock<Vec<String>>,
	batch_sending: AtomicBool,
	max_batch_size: usize,
	max_queue_size: usize,
	hooks: RwLock<Vec<BeforeNotify>>,
	queue: Mutex<Vec<ErrorReport>>,
	closed: AtomicBool,
	transport: Arc<dyn Transport>,
}

/// Client that prepares reports and hands them to a [`Transport`].
///
/// With batch sending enabled, reports queue until `max_batch_size` of them
/// are waiting, or until [`flush`](Self::flush) or
/// [`shutdown_handler`](Self::shutdown_handler). The queue holds at most
/// `max_queue_size` reports, oldest dropped first; a batch that fails to send
/// goes back into it. Once shut down, reports are sent as they arrive.
#[derive(Clone)]
pub struct NotifyClient {
	inner: Arc<NotifyClientInner>,
}

impl NotifyClient {
	pub fn builder() -> NotifyClientBuilder {
		NotifyClientBuilder::new()
	}

	/// Report a message with the given severity.
	pub fn notify_error(
		&self,
		category: &str,
		message: &str,
		metadata: Metadata,
		severity: Severity,
		user: Option<UserContext>,
	) -> Result<()> {
		let report = ErrorReport::new(category, message, severity)
			.with_metadata(metadata)
			.with_user(user);
		self.notify(report)
	}

	/// Report an error at [`Severity::Error`], grouped by its class name.
	pub fn notify_exception(
		&self,
		exception: &dyn Notifiable,
		metadata: Option<Metadata>,
		user: Option<UserContext>,
	) -> Result<()> {
		let report = ErrorReport::new(exception.class_name(), exception.to_string(), Severity::Error)
			.with_metadata(metadata.unwrap_or_default())
			.with_user(user);
		self.notify(report)
	}

	/// Run hooks and filters on `report`, then queue or send it.
	pub fn notify(&self, mut report: ErrorReport) -> Result<()> {
		let release_stage = self.inner.release_stage.read().clone();
		if !self.should_notify(&release_stage) {
			debug!(release_stage = %release_stage, category = %report.category, "Release stage not notified, dropping report");
			return Ok(());
		}
		report.release_stage = Some(release_stage);

		let hooks = self.inner.hooks.read().clone();
		for hook in hooks {
			hook(&mut report);
		}

		filter_metadata(&mut report.metadata, &self.inner.filters.read());

		if self.inner.batch_sending.load(Ordering::SeqCst) && !self.is_closed() {
			return self.enqueue(report);
		}

		self.inner.transport.send(std::slice::from_ref(&report))
	}

	/// Send every queued report.
	pub fn flush(&self) -> Result<()> {
		let batch = std::mem::take(&mut *self.inner.queue.lock());
		if batch.is_empty() {
			return Ok(());
		}
		debug!(count = batch.len(), "Flushing queued error reports");
		self.send_batch(batch)
	}

	/// Send queued reports and stop batching.
	///
	/// Safe to call more than once: reports already sent are not sent again.
	pub fn shutdown_handler(&self) -> Result<()> {
		if !self.inner.closed.swap(true, Ordering::SeqCst) {
			info!("Notify client shutting down");
		}
		self.flush()
	}

	pub fn add_before_notify(&self, hook: BeforeNotify) {
		self.inner.hooks.write().push(hook);
	}

	pub fn set_filters(&self, filters: Vec<String>) {
		*self.inner.filters.write() = filters;
	}

	pub fn set_release_stage(&self, stage: impl Into<String>) {
		*self.inner.release_stage.write() = stage.into();
	}

	pub fn set_notify_release_stages(&self, stages: Vec<String>) {
		*self.inner.notify_release_stages.write() = stages;
	}

	pub fn set_batch_sending(&self, enabled: bool) {
		self.inner.batch_sending.store(enabled, Ordering::SeqCst);
	}

	pub fn release_stage(&self) -> String {
		self.inner.release_stage.read().clone()
	}

	/// Number of reports waiting for the next flush.
	pub fn queued(&self) -> usize {
		self.inner.queue.lock().len()
	}

	pub fn is_closed(&self) -> bool {
		self.inner.closed.load(Ordering::SeqCst)
	}

	fn enqueue(&self, report: ErrorReport) -> Result<()> {
		debug!(report_id = %report.id, "Queued error report");

		// No logging while the queue is locked: log targets may report.
		let (batch, dropped) = {
			let mut queue = self.inner.queue.lock();
			queue.push(report);
			let dropped = self.take_overflow(&mut queue);

			let batch = if queue.len() >= self.inner.max_batch_size {
				std::mem::take(&mut *queue)
			} else {
				Vec::new()
			};
			(batch, dropped)
		};
		log_dropped(&dropped);

		if batch.is_empty() {
			return Ok(());
		}
		debug!(count = batch.len(), "Batch size reached, sending error reports");
		self.send_batch(batch)
	}

	/// Send `batch`, returning it to the front of the queue on failure.
	fn send_batch(&self, batch: Vec<ErrorReport>) -> Result<()> {
		let result = self.inner.transport.send(&batch);
		if result.is_err() {
			let dropped = {
				let mut queue = self.inner.queue.lock();
				let newer = std::mem::replace(&mut *queue, batch);
				queue.extend(newer);
				self.take_overflow(&mut queue)
			};
			log_dropped(&dropped);
		}
		result
	}

	/// Remove the oldest reports beyond the queue limit.
	fn take_overflow(&self, queue: &mut Vec<ErrorReport>) -> Vec<ErrorReport> {
		let excess = queue.len().saturating_sub(self.inner.max_queue_size);
		queue.drain(..excess).collect()
	}

	fn should_notify(&self, release_stage: &str) -> bool {
		let stages = self.inner.notify_release_stages.read();
		stages.is_empty() || stages.iter().any(|s| s == release_stage)
	}
}

fn log_dropped(dropped: &[ErrorReport]) {
	for report in dropped {
		warn!(
			report_id = %report.id,
			category = %report.category,
			"Dropped error report due to queue overflow"
		);
	}
}
