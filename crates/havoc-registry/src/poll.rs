// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Activation polling.

use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::error::RegistryError;

/// Where activation state comes from. Production uses the GraphQL
/// `getInfraDetails` query; tests script the answers.
#[async_trait]
pub trait InfraStateSource: Send + Sync {
	async fn infra_active(&self, infra_id: &str) -> Result<bool, RegistryError>;
}

/// Polls until the infra reports active.
///
/// Sleeps `interval` before each attempt, so a freshly applied manifest gets
/// a moment to come up before the first query. A failed attempt is fatal;
/// exceeding `timeout` yields [`RegistryError::PollTimeout`].
pub async fn await_active(
	source: &dyn InfraStateSource,
	infra_id: &str,
	timeout: Duration,
	interval: Duration,
) -> Result<(), RegistryError> {
	let deadline = Instant::now() + timeout;
	let mut attempt = 0u32;
	loop {
		if Instant::now() >= deadline {
			return Err(RegistryError::PollTimeout {
				infra_id: infra_id.to_string(),
				waited_secs: timeout.as_secs(),
			});
		}
		tokio::time::sleep(interval).await;
		attempt += 1;
		if source.infra_active(infra_id).await? {
			info!(infra_id, attempt, "infra is active");
			return Ok(());
		}
		debug!(infra_id, attempt, "infra not active yet");
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::mock::MockStateSource;

	#[tokio::test(start_paused = true)]
	async fn returns_once_active() {
		let source = MockStateSource::with_script(vec![false, false, false, true]);
		await_active(
			&source,
			"abc123",
			Duration::from_secs(180),
			Duration::from_secs(2),
		)
		.await
		.unwrap();
		assert_eq!(source.attempts(), 4);
	}

	#[tokio::test(start_paused = true)]
	async fn times_out_when_never_active() {
		let source = MockStateSource::with_script(vec![]);
		let err = await_active(
			&source,
			"abc123",
			Duration::from_secs(5),
			Duration::from_secs(2),
		)
		.await
		.unwrap_err();
		match err {
			RegistryError::PollTimeout {
				infra_id,
				waited_secs,
			} => {
				assert_eq!(infra_id, "abc123");
				assert_eq!(waited_secs, 5);
			}
			other => panic!("unexpected error: {other}"),
		}
		// Deadline is checked before each sleep: attempts land at t=2s and
		// t=4s, then the 4s check still precedes the 5s deadline so one more
		// attempt fires at t=6s.
		assert_eq!(source.attempts(), 3);
	}

	#[tokio::test(start_paused = true)]
	async fn attempt_error_is_fatal() {
		let source = MockStateSource::with_script(vec![false]);
		source.fail_next("permission denied");
		let err = await_active(
			&source,
			"abc123",
			Duration::from_secs(180),
			Duration::from_secs(2),
		)
		.await
		.unwrap_err();
		match err {
			RegistryError::Api { message } => assert!(message.contains("permission denied")),
			other => panic!("unexpected error: {other}"),
		}
		assert_eq!(source.attempts(), 1);
	}
}
