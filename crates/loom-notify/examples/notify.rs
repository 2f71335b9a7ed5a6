// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Wires a notifier into an application's tracing setup.
//!
//! Run with `LOOM_NOTIFY_API_KEY` and `LOOM_NOTIFY_ENDPOINT` set, optionally
//! passing the path of a TOML config file.

use std::path::PathBuf;
use std::sync::Arc;

use loom_notify::{load_config, BufferLayer, LogBuffer, LogLevel, Notifier};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> Result<(), Box<dyn std::error::Error>> {
	let config_path = std::env::args().nth(1).map(PathBuf::from);
	let config = load_config(config_path.as_deref())?;

	let logs = LogBuffer::new(config.log_capacity);
	tracing_subscriber::registry()
		.with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
		.with(tracing_subscriber::fmt::layer())
		.with(BufferLayer::new(logs.clone()))
		.init();

	let notifier = Notifier::builder()
		.config(config)
		.log_buffer(logs.clone())
		.user_identity(Arc::new(|| -> loom_notify::Result<Option<String>> {
			Ok(std::env::var("USER").ok())
		}))
		.build()?;
	logs.add_target(Arc::new(notifier.log_target(LogLevel::Error)));
	notifier.install_panic_hook();
	let _shutdown = notifier.shutdown_guard();

	info!(order_id = 1042, "Processing order");
	error!(order_id = 1042, "Payment gateway rejected card");

	notifier.notify_warning("inventory", "stock below threshold", None);

	let io = std::io::Error::new(std::io::ErrorKind::NotFound, "receipt template missing");
	notifier.notify_std_error(&io);

	Ok(())
}
