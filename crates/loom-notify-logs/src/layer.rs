// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Tracing layer that captures events into the buffer.

use std::fmt;

use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;

use crate::buffer::LogBuffer;
use crate::entry::LogLevel;

/// A tracing Layer that queues log events in a [`LogBuffer`].
///
/// Compose it with other layers (like `fmt::layer()`) so logs still reach
/// stdout while being kept for attachment to error reports.
#[derive(Clone)]
pub struct BufferLayer {
	buffer: LogBuffer,
	min_level: LogLevel,
}

impl BufferLayer {
	pub fn new(buffer: LogBuffer) -> Self {
		Self {
			buffer,
			min_level: LogLevel::Trace,
		}
	}

	/// Ignore events below `level`.
	pub fn with_min_level(mut self, level: LogLevel) -> Self {
		self.min_level = level;
		self
	}

	pub fn buffer(&self) -> &LogBuffer {
		&self.buffer
	}
}

impl<S> Layer<S> for BufferLayer
where
	S: Subscriber + for<'a> LookupSpan<'a>,
{
	fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
		let metadata = event.metadata();
		let level = LogLevel::from(*metadata.level());
		if level < self.min_level {
			return;
		}

		let mut visitor = FieldVisitor::default();
		event.record(&mut visitor);

		self.buffer.push(
			level,
			metadata.target().to_string(),
			visitor.message.unwrap_or_default(),
			visitor.fields,
		);
	}
}

#[derive(Default)]
struct FieldVisitor {
	message: Option<String>,
	fields: Vec<(String, String)>,
}

impl FieldVisitor {
	fn record_value(&mut self, field: &Field, value: String) {
		if field.name() == "message" {
			self.message = Some(value);
		} else {
			self.fields.push((field.name().to_string(), value));
		}
	}
}

impl Visit for FieldVisitor {
	fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
		self.record_value(field, format!("{:?}", value));
	}

	fn record_str(&mut self, field: &Field, value: &str) {
		self.record_value(field, value.to_string());
	}

	fn record_i64(&mut self, field: &Field, value: i64) {
		self.record_value(field, value.to_string());
	}

	fn record_u64(&mut self, field: &Field, value: u64) {
		self.record_value(field, value.to_string());
	}

	fn record_bool(&mut self, field: &Field, value: bool) {
		self.record_value(field, value.to_string());
	}

	fn record_f64(&mut self, field: &Field, value: f64) {
		self.record_value(field, value.to_string());
	}

	fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
		self.record_value(field, value.to_string());
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use tracing_subscriber::layer::SubscriberExt;

	#[test]
	fn test_layer_queues_events_as_pending() {
		let buffer = LogBuffer::new(100);
		let subscriber = tracing_subscriber::registry().with(BufferLayer::new(buffer.clone()));

		tracing::subscriber::with_default(subscriber, || {
			tracing::info!(order_id = 42, "Order placed");
		});

		assert_eq!(buffer.pending_len(), 1);
		buffer.flush(true);

		let entries = buffer.messages();
		assert_eq!(entries.len(), 1);
		assert_eq!(entries[0].level, LogLevel::Info);
		assert_eq!(entries[0].message, "Order placed");
		assert_eq!(entries[0].fields.get("order_id").map(String::as_str), Some("42"));
	}

	#[test]
	fn test_min_level_filters_events() {
		let buffer = LogBuffer::new(100);
		let layer = BufferLayer::new(buffer.clone()).with_min_level(LogLevel::Warn);
		let subscriber = tracing_subscriber::registry().with(layer);

		tracing::subscriber::with_default(subscriber, || {
			tracing::debug!("noise");
			tracing::info!("still noise");
			tracing::warn!("disk almost full");
		});

		buffer.flush(true);
		let entries = buffer.messages();
		assert_eq!(entries.len(), 1);
		assert_eq!(entries[0].message, "disk almost full");
	}

	#[test]
	fn test_layer_records_target() {
		let buffer = LogBuffer::new(100);
		let subscriber = tracing_subscriber::registry().with(BufferLayer::new(buffer.clone()));

		tracing::subscriber::with_default(subscriber, || {
			tracing::error!(target: "app::payments", "charge failed");
		});

		buffer.flush(true);
		assert_eq!(buffer.messages()[0].target, "app::payments");
	}
}
