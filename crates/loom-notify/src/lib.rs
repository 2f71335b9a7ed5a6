// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error notification for Loom applications.
//!
//! [`Notifier`] is the entry point application code reports through. It wraps a
//! [`NotifyClient`] that runs before-notify hooks, filters sensitive metadata,
//! gates on release stage and batches reports until shutdown. The
//! [`EnrichmentHook`] registered on every notifier flushes buffered
//! application logs and attaches them, together with any caller-supplied
//! trace, to each outgoing report.
//!
//! # Example
//!
//! ```ignore
//! use loom_notify::{load_config, BufferLayer, LogBuffer, LogLevel, Notifier};
//! use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
//!
//! let logs = LogBuffer::default();
//! tracing_subscriber::registry()
//!     .with(tracing_subscriber::fmt::layer())
//!     .with(BufferLayer::new(logs.clone()))
//!     .init();
//!
//! let notifier = Notifier::builder()
//!     .config(load_config(None)?)
//!     .log_buffer(logs.clone())
//!     .build()?;
//! logs.add_target(std::sync::Arc::new(notifier.log_target(LogLevel::Error)));
//! notifier.install_panic_hook();
//! let _shutdown = notifier.shutdown_guard();
//!
//! notifier.notify_warning("billing", "card retry scheduled", None);
//! ```

pub mod backtrace;
pub mod client;
pub mod config;
pub mod enrich;
pub mod error;
pub mod filter;
pub mod identity;
pub mod log_target;
pub mod notifier;
pub mod panic_hook;
pub mod shutdown;
pub mod sources;
pub mod transport;

pub use client::{BeforeNotify, NotifyClient, NotifyClientBuilder};
pub use config::{NotifierConfig, NotifierConfigLayer};
pub use enrich::EnrichmentHook;
pub use error::{ConfigError, NotifyError, Result};
pub use identity::{ExecutionContext, UserIdentity};
pub use log_target::ReportingLogTarget;
pub use notifier::{Notifier, NotifierBuilder};
pub use shutdown::{ShutdownCoordinator, ShutdownGuard};
pub use sources::load_config;
pub use transport::{HttpTransport, Transport};

pub use loom_notify_core::{
	ErrorReport, Exception, Frame, Metadata, Notifiable, Severity, Stacktrace, TraceFrame,
	UserContext,
};
pub use loom_notify_logs::{
	BufferLayer, FlushState, LogBuffer, LogEntry, LogFields, LogLevel, LogMessage, LogSource,
	LogTarget,
};
