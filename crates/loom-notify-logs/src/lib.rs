// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Application log buffering for error notification.
//!
//! This crate provides:
//! - [`LogEntry`] - A structured log entry with timestamp, level, target, and message
//! - [`LogMessage`] - The snapshot of a flushed entry attached to error reports
//! - [`LogBuffer`] - Pending log entries plus a bounded ring of flushed entries
//! - [`LogTarget`] - Receives entries when the buffer is flushed
//! - [`LogSource`] - The view of the buffer used by error reporting
//! - [`BufferLayer`] - A tracing Layer that captures events into the buffer
//!
//! # Usage
//!
//! ```ignore
//! use loom_notify_logs::{BufferLayer, LogBuffer};
//! use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
//!
//! let log_buffer = LogBuffer::new(10_000);
//!
//! tracing_subscriber::registry()
//!     .with(tracing_subscriber::fmt::layer())
//!     .with(BufferLayer::new(log_buffer.clone()))
//!     .init();
//! ```

mod buffer;
mod entry;
mod layer;
mod source;

pub use buffer::{LogBuffer, DEFAULT_CAPACITY, DEFAULT_FLUSH_INTERVAL};
pub use entry::{LogEntry, LogFields, LogLevel, LogMessage};
pub use layer::BufferLayer;
pub use source::{FlushState, LogSource, LogTarget};
