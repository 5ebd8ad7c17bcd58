// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! IAM capability trait and the aws-sdk-iam implementation.

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_iam::error::DisplayErrorContext;
use tracing::debug;

use crate::error::IamError;

/// Cloud IAM operations the onboarding flow depends on.
///
/// Identifiers are opaque ARN-like strings. `create_oidc_provider` signals
/// "already registered" via [`IamError::AlreadyExists`] so callers can run
/// the lookup-and-reuse recovery.
#[async_trait]
pub trait IamApi: Send + Sync {
	async fn create_oidc_provider(
		&self,
		url: &str,
		thumbprint: &str,
		audience: &str,
	) -> Result<String, IamError>;

	/// ARNs of every OIDC provider registered in the account.
	async fn list_oidc_providers(&self) -> Result<Vec<String>, IamError>;

	/// Registered URL of one provider.
	async fn oidc_provider_url(&self, arn: &str) -> Result<String, IamError>;

	async fn create_role(&self, name: &str, trust_document: &str) -> Result<String, IamError>;

	async fn attach_role_policy(&self, role_name: &str, policy_arn: &str) -> Result<(), IamError>;

	async fn update_assume_role_policy(
		&self,
		role_name: &str,
		trust_document: &str,
	) -> Result<(), IamError>;

	async fn create_policy(&self, name: &str, document: &str) -> Result<String, IamError>;

	/// ARN of an existing role; [`IamError::RoleNotFound`] if absent.
	async fn role_arn(&self, name: &str) -> Result<String, IamError>;
}

/// Production [`IamApi`] over aws-sdk-iam.
#[derive(Clone)]
pub struct AwsIam {
	client: aws_sdk_iam::Client,
}

impl AwsIam {
	/// Builds a client for the given region using the default credential
	/// chain (shared credentials file, environment, instance metadata).
	pub async fn new(region: &str) -> Self {
		let config = aws_config::defaults(BehaviorVersion::latest())
			.region(Region::new(region.to_string()))
			.load()
			.await;
		Self {
			client: aws_sdk_iam::Client::new(&config),
		}
	}

	pub fn from_client(client: aws_sdk_iam::Client) -> Self {
		Self { client }
	}
}

#[async_trait]
impl IamApi for AwsIam {
	async fn create_oidc_provider(
		&self,
		url: &str,
		thumbprint: &str,
		audience: &str,
	) -> Result<String, IamError> {
		debug!(url, "creating OIDC provider");
		let result = self
			.client
			.create_open_id_connect_provider()
			.url(url)
			.thumbprint_list(thumbprint)
			.client_id_list(audience)
			.send()
			.await;

		match result {
			Ok(output) => output
				.open_id_connect_provider_arn()
				.map(str::to_string)
				.ok_or_else(|| IamError::ProviderCreateFailed {
					message: "response carried no provider ARN".to_string(),
				}),
			Err(err) => {
				let message = DisplayErrorContext(&err).to_string();
				if err
					.as_service_error()
					.is_some_and(|e| e.is_entity_already_exists_exception())
				{
					Err(IamError::AlreadyExists { message })
				} else {
					Err(IamError::ProviderCreateFailed { message })
				}
			}
		}
	}

	async fn list_oidc_providers(&self) -> Result<Vec<String>, IamError> {
		let output = self
			.client
			.list_open_id_connect_providers()
			.send()
			.await
			.map_err(|err| IamError::Api {
				message: DisplayErrorContext(&err).to_string(),
			})?;

		Ok(output
			.open_id_connect_provider_list()
			.iter()
			.filter_map(|entry| entry.arn())
			.map(str::to_string)
			.collect())
	}

	async fn oidc_provider_url(&self, arn: &str) -> Result<String, IamError> {
		let output = self
			.client
			.get_open_id_connect_provider()
			.open_id_connect_provider_arn(arn)
			.send()
			.await
			.map_err(|err| IamError::Api {
				message: DisplayErrorContext(&err).to_string(),
			})?;

		output
			.url()
			.map(str::to_string)
			.ok_or_else(|| IamError::Api {
				message: format!("provider {arn} carried no URL"),
			})
	}

	async fn create_role(&self, name: &str, trust_document: &str) -> Result<String, IamError> {
		debug!(role = name, "creating IAM role");
		let output = self
			.client
			.create_role()
			.role_name(name)
			.assume_role_policy_document(trust_document)
			.path("/")
			.send()
			.await
			.map_err(|err| IamError::RoleCreateFailed {
				name: name.to_string(),
				message: DisplayErrorContext(&err).to_string(),
			})?;

		output
			.role()
			.map(|role| role.arn().to_string())
			.ok_or_else(|| IamError::RoleCreateFailed {
				name: name.to_string(),
				message: "response carried no role".to_string(),
			})
	}

	async fn attach_role_policy(&self, role_name: &str, policy_arn: &str) -> Result<(), IamError> {
		self
			.client
			.attach_role_policy()
			.role_name(role_name)
			.policy_arn(policy_arn)
			.send()
			.await
			.map_err(|err| IamError::PolicyAttachFailed {
				role: role_name.to_string(),
				policy: policy_arn.to_string(),
				message: DisplayErrorContext(&err).to_string(),
			})?;
		Ok(())
	}

	async fn update_assume_role_policy(
		&self,
		role_name: &str,
		trust_document: &str,
	) -> Result<(), IamError> {
		debug!(role = role_name, "updating role trust policy");
		self
			.client
			.update_assume_role_policy()
			.role_name(role_name)
			.policy_document(trust_document)
			.send()
			.await
			.map_err(|err| IamError::RoleUpdateFailed {
				name: role_name.to_string(),
				message: DisplayErrorContext(&err).to_string(),
			})?;
		Ok(())
	}

	async fn create_policy(&self, name: &str, document: &str) -> Result<String, IamError> {
		debug!(policy = name, "creating IAM policy");
		let output = self
			.client
			.create_policy()
			.policy_name(name)
			.policy_document(document)
			.send()
			.await
			.map_err(|err| IamError::PolicyCreateFailed {
				name: name.to_string(),
				message: DisplayErrorContext(&err).to_string(),
			})?;

		output
			.policy()
			.and_then(|policy| policy.arn())
			.map(str::to_string)
			.ok_or_else(|| IamError::PolicyCreateFailed {
				name: name.to_string(),
				message: "response carried no policy ARN".to_string(),
			})
	}

	async fn role_arn(&self, name: &str) -> Result<String, IamError> {
		let result = self.client.get_role().role_name(name).send().await;
		match result {
			Ok(output) => output
				.role()
				.map(|role| role.arn().to_string())
				.ok_or_else(|| IamError::RoleNotFound {
					name: name.to_string(),
				}),
			Err(err) => {
				if err
					.as_service_error()
					.is_some_and(|e| e.is_no_such_entity_exception())
				{
					Err(IamError::RoleNotFound {
						name: name.to_string(),
					})
				} else {
					Err(IamError::Api {
						message: DisplayErrorContext(&err).to_string(),
					})
				}
			}
		}
	}
}
