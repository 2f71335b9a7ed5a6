// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Backtrace capture as trace frames.

use std::backtrace::Backtrace;

use loom_notify_core::TraceFrame;
use rustc_demangle::demangle;

/// Frames from these functions belong to the capture machinery itself.
const CAPTURE_PREFIXES: &[&str] = &["loom_notify::backtrace::", "loom_notify::panic_hook::"];

/// Capture the current backtrace as application trace frames.
pub fn capture_trace() -> Vec<TraceFrame> {
	parse_backtrace(&Backtrace::force_capture())
}

/// Convert a backtrace into trace frames, innermost first.
///
/// Only frames with a resolved source location that belong to application
/// code are kept.
pub fn parse_backtrace(backtrace: &Backtrace) -> Vec<TraceFrame> {
	parse_backtrace_string(&backtrace.to_string())
}

/// Parse `Backtrace` display output:
///
/// ```text
///    0: my_app::handlers::process
///              at ./src/handlers.rs:42:9
/// ```
fn parse_backtrace_string(bt_string: &str) -> Vec<TraceFrame> {
	let mut frames = Vec::new();
	let mut function: Option<String> = None;

	for line in bt_string.lines() {
		let line = line.trim();

		if let Some(location) = line.strip_prefix("at ") {
			let Some(name) = function.take() else {
				continue;
			};
			if !is_in_app_frame(&name) {
				continue;
			}
			if let Some((file, lineno)) = parse_location(location) {
				frames.push(TraceFrame::new(file, lineno).with_function(name));
			}
		} else if let Some(name) = parse_function_line(line) {
			function = Some(name);
		}
	}

	frames
}

/// Parse `N: function_name` into a demangled function name.
fn parse_function_line(line: &str) -> Option<String> {
	let (index, name) = line.split_once(':')?;
	index.trim().parse::<u32>().ok()?;

	let name = name.trim();
	if name.is_empty() {
		return None;
	}
	Some(demangle(name).to_string())
}

/// Parse `path:line:column` (or `path:line`).
fn parse_location(location: &str) -> Option<(String, u32)> {
	let mut parts = location.rsplitn(3, ':');
	let last = parts.next()?;
	let middle = parts.next()?;

	match parts.next() {
		Some(file) if middle.parse::<u32>().is_ok() && last.parse::<u32>().is_ok() => {
			Some((file.to_string(), middle.parse().ok()?))
		}
		_ => {
			let (file, line) = location.rsplit_once(':')?;
			Some((file.to_string(), line.parse().ok()?))
		}
	}
}

/// Determine if a frame is from application code rather than the standard
/// library, the runtime, or the capture machinery.
fn is_in_app_frame(function: &str) -> bool {
	const SYSTEM_PREFIXES: &[&str] = &[
		"std::",
		"core::",
		"alloc::",
		"<std::",
		"<core::",
		"<alloc::",
		"tokio::",
		"<tokio::",
		"futures::",
		"<futures::",
		"tracing::",
		"<tracing::",
		"test::",
		"<test::",
		"panic_unwind::",
		"rust_begin_unwind",
		"rust_panic",
		"__rust_",
		"_rust_",
		"__libc_",
		"<unknown>",
	];

	const SYSTEM_CONTAINS: &[&str] = &[
		"::panicking::",
		"::rt::",
		"::sys_common::",
		"::backtrace_rs::",
	];

	!SYSTEM_PREFIXES.iter().any(|p| function.starts_with(p))
		&& !SYSTEM_CONTAINS.iter().any(|c| function.contains(c))
		&& !CAPTURE_PREFIXES.iter().any(|p| function.starts_with(p))
}

#[cfg(test)]
mod tests {
	use super::*;

	const SAMPLE: &str = "   0: std::backtrace_rs::backtrace::libunwind::trace
             at /rustc/abc/library/std/src/../../backtrace/src/backtrace/libunwind.rs:116:5
   1: loom_notify::backtrace::capture_trace
             at ./crates/loom-notify/src/backtrace.rs:18:2
   2: my_app::db::query
             at ./src/db.rs:42:9
   3: my_app::main
             at ./src/main.rs:7:5
   4: core::ops::function::FnOnce::call_once
             at /rustc/abc/library/core/src/ops/function.rs:250:5
   5: <unknown>
   6: __libc_start_main";

	#[test]
	fn test_parses_in_app_frames_only() {
		let frames = parse_backtrace_string(SAMPLE);

		assert_eq!(
			frames,
			vec![
				TraceFrame::new("./src/db.rs", 42).with_function("my_app::db::query"),
				TraceFrame::new("./src/main.rs", 7).with_function("my_app::main"),
			]
		);
	}

	#[test]
	fn test_is_in_app_frame_excludes_std() {
		assert!(!is_in_app_frame("std::panic::panic_any"));
		assert!(!is_in_app_frame("core::panicking::panic"));
		assert!(!is_in_app_frame("alloc::vec::Vec::push"));
		assert!(!is_in_app_frame("loom_notify::panic_hook::report_panic"));
	}

	#[test]
	fn test_is_in_app_frame_includes_user_code() {
		assert!(is_in_app_frame("my_app::main"));
		assert!(is_in_app_frame("loom_notify::notifier::Notifier::notify_error"));
	}

	#[test]
	fn test_parse_location_variants() {
		assert_eq!(parse_location("./src/a.rs:10:3"), Some(("./src/a.rs".to_string(), 10)));
		assert_eq!(parse_location("./src/a.rs:10"), Some(("./src/a.rs".to_string(), 10)));
		assert_eq!(
			parse_location(r"C:\src\a.rs:10:3"),
			Some((r"C:\src\a.rs".to_string(), 10))
		);
		assert_eq!(parse_location("no-location"), None);
	}

	#[test]
	fn test_parse_function_line_requires_index() {
		assert_eq!(parse_function_line("12: my_app::run"), Some("my_app::run".to_string()));
		assert_eq!(parse_function_line("my_app::run"), None);
	}

	#[test]
	fn test_capture_trace() {
		// Frames depend on debug info; capturing must not panic.
		let _frames = capture_trace();
	}
}
