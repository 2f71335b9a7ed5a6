// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The notification facade used by application code.

use std::error::Error;
use std::sync::Arc;

use loom_notify_core::{
	cause_chain, Exception, Metadata, Notifiable, Severity, TraceFrame, UserContext, TRACE_KEY,
};
use loom_notify_logs::{LogBuffer, LogLevel, LogSource};
use tracing::{error, info, warn};

use crate::client::{NotifyClient, NotifyClientBuilder};
use crate::config::NotifierConfig;
use crate::enrich::EnrichmentHook;
use crate::error::{ConfigError, Result};
use crate::identity::{ExecutionContext, UserIdentity};
use crate::log_target::ReportingLogTarget;
use crate::shutdown::{ShutdownCoordinator, ShutdownGuard};
use crate::transport::Transport;

/// Builder for constructing a [`Notifier`].
#[derive(Default)]
pub struct NotifierBuilder {
	config: Option<NotifierConfig>,
	transport: Option<Arc<dyn Transport>>,
	logs: Option<Arc<dyn LogSource>>,
	identity: Option<Arc<dyn UserIdentity>>,
	context: ExecutionContext,
}

impl NotifierBuilder {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn config(mut self, config: NotifierConfig) -> Self {
		self.config = Some(config);
		self
	}

	/// Use `transport` instead of an HTTP transport for the configured endpoint.
	pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
		self.transport = Some(transport);
		self
	}

	/// Attach and flush the logs kept in `buffer`.
	pub fn log_buffer(self, buffer: LogBuffer) -> Self {
		self.log_source(Arc::new(buffer))
	}

	pub fn log_source(mut self, logs: Arc<dyn LogSource>) -> Self {
		self.logs = Some(logs);
		self
	}

	pub fn user_identity(mut self, identity: Arc<dyn UserIdentity>) -> Self {
		self.identity = Some(identity);
		self
	}

	pub fn execution_context(mut self, context: ExecutionContext) -> Self {
		self.context = context;
		self
	}

	/// Builds the notifier and registers the enrichment hook on its client.
	///
	/// Without a log source, a private [`LogBuffer`] sized by the config is used.
	pub fn build(self) -> Result<Notifier> {
		let config = self.config.ok_or(ConfigError::MissingConfig)?;

		let logs = self
			.logs
			.unwrap_or_else(|| Arc::new(LogBuffer::new(config.log_capacity)));

		let mut client = NotifyClientBuilder::from_config(&config);
		if let Some(transport) = self.transport {
			client = client.transport(transport);
		}
		let client = client.build()?;
		client.add_before_notify(EnrichmentHook::new(Arc::clone(&logs)).into_before_notify());

		let shutdown = ShutdownCoordinator::new(client.clone(), logs);

		info!(
			release_stage = %config.release_stage,
			batch_sending = config.batch_sending,
			context = ?self.context,
			"Notifier initialized"
		);

		Ok(Notifier {
			inner: Arc::new(NotifierInner {
				client,
				identity: self.identity,
				context: self.context,
				shutdown,
			}),
		})
	}
}

pub(crate) struct NotifierInner {
	client: NotifyClient,
	identity: Option<Arc<dyn UserIdentity>>,
	context: ExecutionContext,
	shutdown: ShutdownCoordinator,
}

/// Reports errors on behalf of application code.
///
/// Every operation swallows its own failures: they are logged and never
/// returned, so error handling code cannot fail because reporting did.
#[derive(Clone)]
pub struct Notifier {
	pub(crate) inner: Arc<NotifierInner>,
}

impl Notifier {
	pub fn builder() -> NotifierBuilder {
		NotifierBuilder::new()
	}

	pub fn notify_error(&self, category: &str, message: &str, trace: Option<Vec<TraceFrame>>) {
		self.notify_with_severity(category, message, trace, Severity::Error);
	}

	pub fn notify_warning(&self, category: &str, message: &str, trace: Option<Vec<TraceFrame>>) {
		self.notify_with_severity(category, message, trace, Severity::Warning);
	}

	pub fn notify_info(&self, category: &str, message: &str, trace: Option<Vec<TraceFrame>>) {
		self.notify_with_severity(category, message, trace, Severity::Info);
	}

	/// Report `exception` and each of its causes, oldest cause first.
	///
	/// Every error in the chain is reported once, with its own metadata.
	pub fn notify_exception(&self, exception: &dyn Notifiable) {
		for cause in cause_chain(exception).into_iter().rev() {
			self.send_exception(cause);
		}
		self.send_exception(exception);
	}

	/// Report a std error and its `source()` chain.
	pub fn notify_std_error(&self, error: &(dyn Error + 'static)) {
		self.notify_exception(&Exception::from_error(error));
	}

	/// Flush logs and deliver queued reports. See [`ShutdownCoordinator`].
	pub fn run_shutdown_handler(&self) {
		self.inner.shutdown.run();
	}

	/// Runs the shutdown handler when dropped.
	pub fn shutdown_guard(&self) -> ShutdownGuard {
		ShutdownGuard::new(self.inner.shutdown.clone())
	}

	/// A log target reporting exported entries at or above `min_level`.
	pub fn log_target(&self, min_level: LogLevel) -> ReportingLogTarget {
		ReportingLogTarget::new(Arc::downgrade(&self.inner), min_level)
	}

	/// Report panics before running the previously installed panic hook.
	pub fn install_panic_hook(&self) {
		crate::panic_hook::install_panic_hook(self.clone());
		info!("Panic hook installed");
	}

	pub fn client(&self) -> &NotifyClient {
		&self.inner.client
	}

	pub(crate) fn notify_with_severity(
		&self,
		category: &str,
		message: &str,
		trace: Option<Vec<TraceFrame>>,
		severity: Severity,
	) {
		let mut metadata = Metadata::new();
		match serde_json::to_value(trace) {
			Ok(trace) => {
				metadata.insert(TRACE_KEY.to_string(), trace);
			}
			Err(e) => warn!(error = %e, "Failed to encode trace metadata"),
		}

		let user = self.user_context();
		if let Err(e) = self
			.inner
			.client
			.notify_error(category, message, metadata, severity, user)
		{
			error!(error = %e, category, severity = %severity, "Failed to send error notification");
		}
	}

	fn send_exception(&self, exception: &dyn Notifiable) {
		let user = self.user_context();
		if let Err(e) = self
			.inner
			.client
			.notify_exception(exception, exception.metadata(), user)
		{
			error!(error = %e, class = exception.class_name(), "Failed to send exception notification");
		}
	}

	fn user_context(&self) -> Option<UserContext> {
		if self.inner.context != ExecutionContext::Interactive {
			return None;
		}
		let identity = self.inner.identity.as_ref()?;

		match identity.current_user_id() {
			Ok(id) => id.map(UserContext::with_id),
			Err(e) => {
				warn!(error = %e, "Failed to resolve user for error report");
				None
			}
		}
	}
}
