// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Federated OIDC identity provider binding.

use tracing::{debug, info};

use crate::api::IamApi;
use crate::error::IamError;

/// A resolved provider: its ARN and the audience the trust condition uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderBinding {
	pub arn: String,
	pub audience: String,
}

/// Ensures the federated OIDC provider is registered, reusing an existing
/// registration when the account already has one for this URL.
///
/// Create first; on the "already exists" signal, list every registered
/// provider, fetch each one's URL, and reuse the first whose registered URL
/// is contained in the requested URL. If the signal was raised but nothing
/// matches, that inconsistency surfaces as [`IamError::ProviderNotFound`].
/// Any other create failure is fatal.
pub async fn bind_provider(
	iam: &dyn IamApi,
	provider_url: &str,
	thumbprint: &str,
	audience: &str,
) -> Result<ProviderBinding, IamError> {
	match iam
		.create_oidc_provider(provider_url, thumbprint, audience)
		.await
	{
		Ok(arn) => {
			info!(url = provider_url, %arn, "OIDC provider created");
			Ok(ProviderBinding {
				arn,
				audience: audience.to_string(),
			})
		}
		Err(err) if err.already_exists() => {
			debug!(url = provider_url, "provider already registered, looking up");
			let arn = find_provider_by_url(iam, provider_url).await?;
			info!(url = provider_url, %arn, "reusing registered OIDC provider");
			Ok(ProviderBinding {
				arn,
				audience: audience.to_string(),
			})
		}
		Err(err) => Err(err),
	}
}

async fn find_provider_by_url(iam: &dyn IamApi, provider_url: &str) -> Result<String, IamError> {
	for arn in iam.list_oidc_providers().await? {
		let registered = iam.oidc_provider_url(&arn).await?;
		if provider_url.contains(&registered) {
			return Ok(arn);
		}
	}
	Err(IamError::ProviderNotFound {
		url: provider_url.to_string(),
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::mock::MockIam;

	const URL: &str = "https://oidc.eks.us-east-2.amazonaws.com/id/ABCDEF";
	const THUMB: &str = "A9993E364706816ABA3E25717850C26C9CD0D89D";

	#[tokio::test]
	async fn create_success_returns_new_arn() {
		let iam = MockIam::new();
		let binding = bind_provider(&iam, URL, THUMB, "sts.amazonaws.com")
			.await
			.unwrap();
		assert_eq!(binding.arn, "arn:aws:iam::000000000000:oidc-provider/0");
		assert_eq!(binding.audience, "sts.amazonaws.com");
		assert_eq!(iam.calls(), vec!["create_oidc_provider"]);
	}

	#[tokio::test]
	async fn already_exists_recovers_via_lookup() {
		let iam = MockIam::new();
		iam.fail_provider_create_already_exists();
		iam.register_provider("arn:aws:iam::1:oidc-provider/a", "oidc.other.example.com");
		iam.register_provider(
			"arn:aws:iam::1:oidc-provider/b",
			"oidc.eks.us-east-2.amazonaws.com/id/ABCDEF",
		);

		let binding = bind_provider(&iam, URL, THUMB, "sts.amazonaws.com")
			.await
			.unwrap();
		assert_eq!(binding.arn, "arn:aws:iam::1:oidc-provider/b");
		assert_eq!(
			iam.calls(),
			vec![
				"create_oidc_provider",
				"list_oidc_providers",
				"oidc_provider_url",
				"oidc_provider_url",
			]
		);
	}

	#[tokio::test]
	async fn already_exists_without_match_surfaces_not_found() {
		let iam = MockIam::new();
		iam.fail_provider_create_already_exists();
		iam.register_provider("arn:aws:iam::1:oidc-provider/a", "oidc.other.example.com");

		let err = bind_provider(&iam, URL, THUMB, "sts.amazonaws.com")
			.await
			.unwrap_err();
		match err {
			IamError::ProviderNotFound { url } => assert_eq!(url, URL),
			other => panic!("unexpected error: {other}"),
		}
	}

	#[tokio::test]
	async fn other_create_failure_is_fatal() {
		let iam = MockIam::new();
		iam.fail_provider_create("access denied");

		let err = bind_provider(&iam, URL, THUMB, "sts.amazonaws.com")
			.await
			.unwrap_err();
		match err {
			IamError::ProviderCreateFailed { message } => {
				assert!(message.contains("access denied"));
			}
			other => panic!("unexpected error: {other}"),
		}
		// No recovery attempt.
		assert_eq!(iam.calls(), vec!["create_oidc_provider"]);
	}
}
