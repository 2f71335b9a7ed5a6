// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Call traces: caller-supplied trace frames and the formal report stacktrace.

use serde::{Deserialize, Serialize};

/// Method name given to the outermost frame when the trace does not name one.
pub const MAIN_METHOD: &str = "[main]";

/// A call frame supplied by application code alongside a notification.
///
/// Each frame records a location (`file`, `line`) and, optionally, the
/// function executing at that location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceFrame {
	pub file: String,
	pub line: u32,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub function: Option<String>,
}

impl TraceFrame {
	pub fn new(file: impl Into<String>, line: u32) -> Self {
		Self {
			file: file.into(),
			line,
			function: None,
		}
	}

	pub fn with_function(mut self, function: impl Into<String>) -> Self {
		self.function = Some(function.into());
		self
	}
}

/// A frame of the stacktrace attached to a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
	pub file: String,
	pub line_number: u32,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub method: Option<String>,
}

/// The formal stacktrace of a report, innermost frame first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stacktrace {
	pub frames: Vec<Frame>,
}

impl Stacktrace {
	/// Build a stacktrace anchored at `origin`, followed by `rest` in order.
	///
	/// The outermost frame is labelled [`MAIN_METHOD`] when it carries no
	/// function name.
	pub fn from_trace(origin: &TraceFrame, rest: &[TraceFrame]) -> Self {
		let mut frames: Vec<Frame> = std::iter::once(origin)
			.chain(rest.iter())
			.map(|tf| Frame {
				file: tf.file.clone(),
				line_number: tf.line,
				method: tf.function.clone(),
			})
			.collect();

		if let Some(last) = frames.last_mut() {
			if last.method.is_none() {
				last.method = Some(MAIN_METHOD.to_string());
			}
		}

		Self { frames }
	}

	/// The frame the stacktrace is anchored at.
	pub fn origin(&self) -> Option<&Frame> {
		self.frames.first()
	}

	pub fn is_empty(&self) -> bool {
		self.frames.is_empty()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_from_trace_anchors_at_origin() {
		let origin = TraceFrame::new("a.php", 10);
		let rest = vec![TraceFrame::new("b.php", 5)];

		let st = Stacktrace::from_trace(&origin, &rest);

		assert_eq!(st.frames.len(), 2);
		let top = st.origin().unwrap();
		assert_eq!(top.file, "a.php");
		assert_eq!(top.line_number, 10);
		assert_eq!(st.frames[1].file, "b.php");
		assert_eq!(st.frames[1].line_number, 5);
	}

	#[test]
	fn test_outermost_frame_labelled_main() {
		let origin = TraceFrame::new("src/lib.rs", 3).with_function("app::run");
		let st = Stacktrace::from_trace(&origin, &[TraceFrame::new("src/main.rs", 9)]);

		assert_eq!(st.frames[0].method.as_deref(), Some("app::run"));
		assert_eq!(st.frames[1].method.as_deref(), Some(MAIN_METHOD));
	}

	#[test]
	fn test_named_outermost_frame_kept() {
		let origin = TraceFrame::new("src/main.rs", 1).with_function("main");
		let st = Stacktrace::from_trace(&origin, &[]);

		assert_eq!(st.frames.len(), 1);
		assert_eq!(st.frames[0].method.as_deref(), Some("main"));
	}

	#[test]
	fn test_trace_frame_deserializes_without_function() {
		let frame: TraceFrame = serde_json::from_str(r#"{"file":"a.php","line":10}"#).unwrap();
		assert_eq!(frame, TraceFrame::new("a.php", 10));
	}
}
