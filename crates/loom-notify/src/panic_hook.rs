// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Panic hook integration for automatic error reporting.

use std::backtrace::Backtrace;
use std::panic::PanicHookInfo;

use loom_notify_core::TraceFrame;

use crate::backtrace::parse_backtrace;
use crate::notifier::Notifier;

/// Category of reports raised by panics.
pub const PANIC_CATEGORY: &str = "panic";

/// Name of the thread panic reports are delivered from.
pub const DELIVERY_THREAD_NAME: &str = "loom-notify-panic";

/// Install a panic hook that reports panics through `notifier`.
///
/// The report is built and delivered on a short-lived thread of its own, so a
/// blocking transport also works when the panic happens on an async runtime
/// worker. The hook waits for delivery, then runs the previously installed
/// hook.
pub fn install_panic_hook(notifier: Notifier) {
	let default_hook = std::panic::take_hook();

	std::panic::set_hook(Box::new(move |info| {
		// A panic while delivering a report is not reported again.
		if std::thread::current().name() != Some(DELIVERY_THREAD_NAME) {
			let backtrace = Backtrace::force_capture();
			report_panic(&notifier, info, &backtrace);
		}
		default_hook(info);
	}));
}

fn report_panic(notifier: &Notifier, info: &PanicHookInfo<'_>, backtrace: &Backtrace) {
	let message = extract_panic_message(info);

	let mut trace: Vec<TraceFrame> = info
		.location()
		.map(|l| TraceFrame::new(l.file(), l.line()))
		.into_iter()
		.collect();
	trace.extend(parse_backtrace(backtrace));

	let notifier = notifier.clone();
	let delivery = std::thread::Builder::new()
		.name(DELIVERY_THREAD_NAME.to_string())
		.spawn(move || {
			notifier.notify_error(PANIC_CATEGORY, &message, Some(trace));
			// The process may be about to exit; don't leave the report queued.
			notifier.client().flush()
		});

	match delivery.map(|handle| handle.join()) {
		Ok(Ok(Ok(()))) => {}
		Ok(Ok(Err(e))) => eprintln!("Failed to deliver panic report: {}", e),
		Ok(Err(_)) => eprintln!("Panic report delivery thread panicked"),
		Err(e) => eprintln!("Failed to start panic report delivery: {}", e),
	}
}

fn extract_panic_message(info: &PanicHookInfo<'_>) -> String {
	if let Some(s) = info.payload().downcast_ref::<&str>() {
		s.to_string()
	} else if let Some(s) = info.payload().downcast_ref::<String>() {
		s.clone()
	} else {
		"Box<dyn Any>".to_string()
	}
}
