// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Delivery of reports to the reporting service.

use std::time::Duration;

use loom_notify_core::ErrorReport;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::NotifierConfig;
use crate::error::{NotifyError, Result};

/// Notifier name sent with every payload.
const NOTIFIER_NAME: &str = "loom-notify-rust";
/// Notifier version sent with every payload.
const NOTIFIER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Sends batches of reports.
pub trait Transport: Send + Sync {
	fn send(&self, reports: &[ErrorReport]) -> Result<()>;
}

/// Posts report batches as JSON over HTTP.
///
/// Uses a blocking client so reports can be delivered from panic hooks and
/// shutdown paths; do not call it from inside an async runtime worker.
pub struct HttpTransport {
	client: reqwest::blocking::Client,
	endpoint: String,
	api_key: String,
}

impl HttpTransport {
	pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
		let endpoint = endpoint.into();
		if endpoint.trim().is_empty() {
			return Err(NotifyError::MissingEndpoint);
		}

		let client = reqwest::blocking::Client::builder()
			.user_agent(format!("{NOTIFIER_NAME}/{NOTIFIER_VERSION}"))
			.timeout(timeout)
			.build()?;

		Ok(Self {
			client,
			endpoint: endpoint.trim_end_matches('/').to_string(),
			api_key: api_key.into(),
		})
	}

	pub fn from_config(config: &NotifierConfig) -> Result<Self> {
		let endpoint = config.endpoint.clone().ok_or(NotifyError::MissingEndpoint)?;
		Self::new(endpoint, config.api_key.clone(), config.request_timeout)
	}

	pub fn endpoint(&self) -> &str {
		&self.endpoint
	}
}

#[derive(Serialize)]
struct NotifyPayload<'a> {
	notifier: NotifierInfo,
	events: &'a [ErrorReport],
}

#[derive(Serialize)]
struct NotifierInfo {
	name: &'static str,
	version: &'static str,
}

impl Transport for HttpTransport {
	fn send(&self, reports: &[ErrorReport]) -> Result<()> {
		if reports.is_empty() {
			return Ok(());
		}

		debug!(endpoint = %self.endpoint, count = reports.len(), "Sending error reports");

		let payload = NotifyPayload {
			notifier: NotifierInfo {
				name: NOTIFIER_NAME,
				version: NOTIFIER_VERSION,
			},
			events: reports,
		};

		let response = self
			.client
			.post(&self.endpoint)
			.header("Authorization", format!("Bearer {}", self.api_key))
			.json(&payload)
			.send()?;

		if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
			let retry_after = response
				.headers()
				.get("Retry-After")
				.and_then(|v| v.to_str().ok())
				.and_then(|s| s.parse().ok());
			return Err(NotifyError::RateLimited {
				retry_after_secs: retry_after,
			});
		}

		if !response.status().is_success() {
			let status = response.status().as_u16();
			let message = response.text().unwrap_or_default();
			return Err(NotifyError::ServerError { status, message });
		}

		info!(count = reports.len(), "Error reports delivered");
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_requires_endpoint() {
		let config = NotifierConfig::new("key").unwrap();
		assert!(matches!(
			HttpTransport::from_config(&config),
			Err(NotifyError::MissingEndpoint)
		));
	}

	#[test]
	fn test_blank_endpoint_rejected() {
		let result = HttpTransport::new("  ", "key", Duration::from_secs(1));
		assert!(matches!(result, Err(NotifyError::MissingEndpoint)));
	}

	#[test]
	fn test_normalizes_endpoint() {
		let mut config = NotifierConfig::new("key").unwrap();
		config.endpoint = Some("https://notify.example.com/events/".to_string());

		let transport = HttpTransport::from_config(&config).unwrap();
		assert_eq!(transport.endpoint(), "https://notify.example.com/events");
	}

	#[test]
	fn test_empty_batch_is_not_sent() {
		// Unroutable endpoint: any request would fail.
		let transport = HttpTransport::new("http://127.0.0.1:9", "key", Duration::from_millis(50)).unwrap();
		assert!(transport.send(&[]).is_ok());
	}

	#[test]
	fn test_payload_shape() {
		let report = ErrorReport::new("db", "timeout", loom_notify_core::Severity::Warning);
		let events = [report];
		let payload = NotifyPayload {
			notifier: NotifierInfo {
				name: NOTIFIER_NAME,
				version: NOTIFIER_VERSION,
			},
			events: &events,
		};

		let json = serde_json::to_value(&payload).unwrap();
		assert_eq!(json["notifier"]["name"], NOTIFIER_NAME);
		assert_eq!(json["events"][0]["category"], "db");
		assert_eq!(json["events"][0]["severity"], "warning");
	}
}
