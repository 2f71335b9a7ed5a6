// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources: defaults, TOML files, and environment variables.

use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use crate::config::{NotifierConfig, NotifierConfigLayer};
use crate::error::ConfigError;

/// Source precedence levels (higher = overrides lower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	ConfigFile = 20,
	Environment = 50,
}

/// Trait for configuration sources.
pub trait ConfigSource: Send + Sync {
	fn name(&self) -> &'static str;
	fn precedence(&self) -> Precedence;
	fn load(&self) -> Result<NotifierConfigLayer, ConfigError>;
}

/// Built-in defaults source.
pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
	fn name(&self) -> &'static str {
		"defaults"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Defaults
	}

	fn load(&self) -> Result<NotifierConfigLayer, ConfigError> {
		Ok(NotifierConfigLayer::default())
	}
}

/// TOML file configuration source. A missing file contributes nothing.
pub struct TomlSource {
	path: PathBuf,
}

impl TomlSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}
}

impl ConfigSource for TomlSource {
	fn name(&self) -> &'static str {
		"toml-config"
	}

	fn precedence(&self) -> Precedence {
		Precedence::ConfigFile
	}

	fn load(&self) -> Result<NotifierConfigLayer, ConfigError> {
		if !self.path.exists() {
			debug!(path = %self.path.display(), "config file not found, skipping");
			return Ok(NotifierConfigLayer::default());
		}

		debug!(path = %self.path.display(), "loading config file");
		let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::FileRead {
			path: self.path.clone(),
			source: e,
		})?;

		let layer: NotifierConfigLayer =
			toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
				path: self.path.clone(),
				source: e,
			})?;

		trace!("parsed notifier config layer from TOML");
		Ok(layer)
	}
}

/// Environment variable source.
///
/// Convention: LOOM_NOTIFY_<FIELD>; list values are comma separated.
pub struct EnvSource;

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<NotifierConfigLayer, ConfigError> {
		debug!("loading environment variables");
		layer_from_vars(|name| std::env::var(name).ok())
	}
}

fn layer_from_vars(
	lookup: impl Fn(&str) -> Option<String>,
) -> Result<NotifierConfigLayer, ConfigError> {
	let var = |name: &str| lookup(name).filter(|s| !s.is_empty());
	let list = |name: &str| {
		var(name).map(|v| {
			v.split(',')
				.map(|s| s.trim().to_string())
				.filter(|s| !s.is_empty())
				.collect::<Vec<_>>()
		})
	};
	let number = |name: &str| -> Result<Option<u64>, ConfigError> {
		match var(name) {
			Some(v) => v.parse().map(Some).map_err(|_| ConfigError::InvalidValue {
				key: name.to_string(),
				message: format!("invalid integer value '{v}'"),
			}),
			None => Ok(None),
		}
	};
	let size = |name: &str| -> Result<Option<usize>, ConfigError> {
		number(name)?
			.map(|n| {
				usize::try_from(n).map_err(|_| ConfigError::InvalidValue {
					key: name.to_string(),
					message: format!("{n} exceeds the platform size limit"),
				})
			})
			.transpose()
	};

	Ok(NotifierConfigLayer {
		api_key: var("LOOM_NOTIFY_API_KEY"),
		release_stage: var("LOOM_NOTIFY_RELEASE_STAGE"),
		notify_release_stages: list("LOOM_NOTIFY_RELEASE_STAGES"),
		filters: list("LOOM_NOTIFY_FILTERS"),
		batch_sending: var("LOOM_NOTIFY_BATCH_SENDING")
			.map(|v| v.eq_ignore_ascii_case("true") || v == "1"),
		endpoint: var("LOOM_NOTIFY_ENDPOINT"),
		request_timeout_secs: number("LOOM_NOTIFY_REQUEST_TIMEOUT_SECS")?,
		log_capacity: size("LOOM_NOTIFY_LOG_CAPACITY")?,
		max_batch_size: size("LOOM_NOTIFY_MAX_BATCH_SIZE")?,
		max_queue_size: size("LOOM_NOTIFY_MAX_QUEUE_SIZE")?,
	})
}

/// Load configuration from defaults, an optional TOML file, and the
/// environment, in increasing precedence.
pub fn load_config(path: Option<&Path>) -> Result<NotifierConfig, ConfigError> {
	let mut sources: Vec<Box<dyn ConfigSource>> = vec![Box::new(DefaultsSource), Box::new(EnvSource)];
	if let Some(path) = path {
		sources.push(Box::new(TomlSource::new(path)));
	}
	sources.sort_by_key(|s| s.precedence());

	let mut layer = NotifierConfigLayer::default();
	for source in sources {
		trace!(source = source.name(), "merging config source");
		layer.merge(source.load()?);
	}
	layer.finalize()
}
