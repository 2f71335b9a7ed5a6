// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core types for Loom error notification.
//!
//! This crate provides the data model shared by the notifier client and the
//! log buffer integration:
//! - [`ErrorReport`] - an in-flight error event with severity, stacktrace and metadata
//! - [`TraceFrame`], [`Frame`], [`Stacktrace`] - caller-supplied and formal call traces
//! - [`Notifiable`] and [`Exception`] - errors with optional metadata and a causal chain
//! - [`UserContext`] - identity attached to a report

pub mod error;
pub mod exception;
pub mod report;
pub mod severity;
pub mod stacktrace;

pub use error::{CoreError, Result};
pub use exception::{cause_chain, Exception, Notifiable, MAX_CAUSE_DEPTH};
pub use report::{ErrorReport, Metadata, UserContext, LOGS_KEY, TRACE_KEY};
pub use severity::Severity;
pub use stacktrace::{Frame, Stacktrace, TraceFrame, MAIN_METHOD};
