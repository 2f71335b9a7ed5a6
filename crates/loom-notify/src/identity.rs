// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! User identity lookup for report context.

use crate::error::Result;

/// Resolves the user the current request is acting for.
pub trait UserIdentity: Send + Sync {
	/// `Ok(None)` when no user is authenticated.
	fn current_user_id(&self) -> Result<Option<String>>;
}

impl<F> UserIdentity for F
where
	F: Fn() -> Result<Option<String>> + Send + Sync,
{
	fn current_user_id(&self) -> Result<Option<String>> {
		self()
	}
}

/// Kind of process the notifier runs in.
///
/// User lookup only happens in interactive (request-serving) contexts; batch
/// jobs and command-line tools have no session to ask.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExecutionContext {
	#[default]
	Interactive,
	Batch,
}
