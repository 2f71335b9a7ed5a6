// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Notifiable errors and their causal chains.

use std::collections::HashSet;
use std::error::Error;
use std::fmt;
use std::sync::Arc;

use crate::report::Metadata;

/// Maximum number of causes followed when walking a causal chain.
pub const MAX_CAUSE_DEPTH: usize = 32;

/// An error that can be reported.
///
/// Both capabilities are optional: an error without metadata or without a
/// previous cause is the normal case.
pub trait Notifiable: Error {
	/// Name used to group reports of this error.
	fn class_name(&self) -> &str {
		"Error"
	}

	/// Structured metadata to attach to the report.
	fn metadata(&self) -> Option<Metadata> {
		None
	}

	/// The error that caused this one.
	fn previous(&self) -> Option<&dyn Notifiable> {
		None
	}
}

/// Collect the causes of `exception`, nearest cause first.
///
/// The walk stops after [`MAX_CAUSE_DEPTH`] causes or when an error already
/// seen is reached again.
pub fn cause_chain<'a>(exception: &'a dyn Notifiable) -> Vec<&'a dyn Notifiable> {
	let mut seen: HashSet<*const ()> = HashSet::new();
	seen.insert(address(exception));

	let mut causes = Vec::new();
	let mut current = exception.previous();
	while let Some(cause) = current {
		if causes.len() >= MAX_CAUSE_DEPTH || !seen.insert(address(cause)) {
			break;
		}
		causes.push(cause);
		current = cause.previous();
	}
	causes
}

fn address(exception: &dyn Notifiable) -> *const () {
	std::ptr::from_ref(exception).cast::<()>()
}

/// A concrete notifiable error with an optional shared cause.
#[derive(Debug, Clone)]
pub struct Exception {
	class: String,
	message: String,
	metadata: Option<Metadata>,
	previous: Option<Arc<Exception>>,
}

impl Exception {
	pub fn new(class: impl Into<String>, message: impl Into<String>) -> Self {
		Self {
			class: class.into(),
			message: message.into(),
			metadata: None,
			previous: None,
		}
	}

	pub fn with_metadata(mut self, metadata: Metadata) -> Self {
		self.metadata = Some(metadata);
		self
	}

	pub fn with_previous(mut self, previous: impl Into<Arc<Exception>>) -> Self {
		self.previous = Some(previous.into());
		self
	}

	/// Convert a std error and its `source()` chain.
	pub fn from_error(error: &(dyn Error + 'static)) -> Self {
		let mut messages = vec![error.to_string()];
		let mut source = error.source();
		while let Some(err) = source {
			if messages.len() > MAX_CAUSE_DEPTH {
				break;
			}
			messages.push(err.to_string());
			source = err.source();
		}

		let mut chain: Option<Exception> = None;
		for message in messages.into_iter().rev() {
			let mut exception = Exception::new("Error", message);
			if let Some(cause) = chain.take() {
				exception = exception.with_previous(cause);
			}
			chain = Some(exception);
		}
		chain.unwrap_or_else(|| Exception::new("Error", error.to_string()))
	}

	pub fn message(&self) -> &str {
		&self.message
	}
}

impl fmt::Display for Exception {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.message)
	}
}

impl Error for Exception {
	fn source(&self) -> Option<&(dyn Error + 'static)> {
		self.previous.as_deref().map(|e| e as &(dyn Error + 'static))
	}
}

impl Notifiable for Exception {
	fn class_name(&self) -> &str {
		&self.class
	}

	fn metadata(&self) -> Option<Metadata> {
		self.metadata.clone()
	}

	fn previous(&self) -> Option<&dyn Notifiable> {
		self.previous.as_deref().map(|e| e as &dyn Notifiable)
	}
}
