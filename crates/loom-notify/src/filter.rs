// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Redaction of sensitive metadata fields.

use loom_notify_core::Metadata;
use serde_json::Value;

/// Replacement value for filtered fields.
pub const FILTERED: &str = "[FILTERED]";

/// Replace the value of every key containing one of `filters`, at any depth.
pub fn filter_metadata(metadata: &mut Metadata, filters: &[String]) {
	for (key, value) in metadata.iter_mut() {
		if filters.iter().any(|f| !f.is_empty() && key.contains(f.as_str())) {
			*value = Value::String(FILTERED.to_string());
		} else {
			filter_value(value, filters);
		}
	}
}

fn filter_value(value: &mut Value, filters: &[String]) {
	match value {
		Value::Object(map) => filter_metadata(map, filters),
		Value::Array(items) => {
			for item in items {
				filter_value(item, filters);
			}
		}
		_ => {}
	}
}
