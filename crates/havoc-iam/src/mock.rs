// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! In-memory [`IamApi`] for tests.
//!
//! Records every call in order and allows scripting failures, without
//! touching a real AWS account.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::api::IamApi;
use crate::error::IamError;

#[derive(Default)]
struct State {
	calls: Vec<String>,
	providers: Vec<(String, String)>,
	roles: Vec<(String, String)>,
	created_roles: Vec<String>,
	created_policies: Vec<(String, String)>,
	attached_policies: Vec<String>,
	trust_documents: Vec<String>,
	provider_create_error: Option<IamError>,
	attach_error: Option<String>,
	role_create_error: Option<String>,
}

/// Scriptable mock IAM capability.
#[derive(Clone, Default)]
pub struct MockIam {
	state: Arc<Mutex<State>>,
}

impl MockIam {
	pub fn new() -> Self {
		Self::default()
	}

	/// Method names in invocation order.
	pub fn calls(&self) -> Vec<String> {
		self.state.lock().unwrap().calls.clone()
	}

	/// Pre-registers a provider `(arn, url)` for the lookup path.
	pub fn register_provider(&self, arn: &str, url: &str) {
		self
			.state
			.lock()
			.unwrap()
			.providers
			.push((arn.to_string(), url.to_string()));
	}

	/// Pre-registers a role `(name, arn)`.
	pub fn register_role(&self, name: &str, arn: &str) {
		self
			.state
			.lock()
			.unwrap()
			.roles
			.push((name.to_string(), arn.to_string()));
	}

	/// Scripts the next provider create to fail with the already-exists
	/// signal.
	pub fn fail_provider_create_already_exists(&self) {
		self.state.lock().unwrap().provider_create_error = Some(IamError::AlreadyExists {
			message: "EntityAlreadyExists: provider already exists".to_string(),
		});
	}

	/// Scripts the next provider create to fail fatally.
	pub fn fail_provider_create(&self, message: &str) {
		self.state.lock().unwrap().provider_create_error = Some(IamError::ProviderCreateFailed {
			message: message.to_string(),
		});
	}

	/// Scripts policy attachment to fail.
	pub fn fail_attach(&self, message: &str) {
		self.state.lock().unwrap().attach_error = Some(message.to_string());
	}

	/// Scripts role creation to fail.
	pub fn fail_role_create(&self, message: &str) {
		self.state.lock().unwrap().role_create_error = Some(message.to_string());
	}

	pub fn created_roles(&self) -> Vec<String> {
		self.state.lock().unwrap().created_roles.clone()
	}

	/// `(name, document)` pairs of policies created through the mock.
	pub fn created_policies(&self) -> Vec<(String, String)> {
		self.state.lock().unwrap().created_policies.clone()
	}

	pub fn attached_policies(&self) -> Vec<String> {
		self.state.lock().unwrap().attached_policies.clone()
	}

	/// Trust documents passed to create/update calls, in order.
	pub fn trust_documents(&self) -> Vec<String> {
		self.state.lock().unwrap().trust_documents.clone()
	}

	fn record(&self, call: &str) {
		self.state.lock().unwrap().calls.push(call.to_string());
	}
}

#[async_trait]
impl IamApi for MockIam {
	async fn create_oidc_provider(
		&self,
		_url: &str,
		_thumbprint: &str,
		_audience: &str,
	) -> Result<String, IamError> {
		self.record("create_oidc_provider");
		if let Some(err) = self.state.lock().unwrap().provider_create_error.take() {
			return Err(err);
		}
		Ok("arn:aws:iam::000000000000:oidc-provider/0".to_string())
	}

	async fn list_oidc_providers(&self) -> Result<Vec<String>, IamError> {
		self.record("list_oidc_providers");
		let state = self.state.lock().unwrap();
		Ok(state.providers.iter().map(|(arn, _)| arn.clone()).collect())
	}

	async fn oidc_provider_url(&self, arn: &str) -> Result<String, IamError> {
		self.record("oidc_provider_url");
		let state = self.state.lock().unwrap();
		state
			.providers
			.iter()
			.find(|(a, _)| a == arn)
			.map(|(_, url)| url.clone())
			.ok_or_else(|| IamError::Api {
				message: format!("unknown provider {arn}"),
			})
	}

	async fn create_role(&self, name: &str, trust_document: &str) -> Result<String, IamError> {
		self.record("create_role");
		let mut state = self.state.lock().unwrap();
		if let Some(message) = state.role_create_error.take() {
			return Err(IamError::RoleCreateFailed {
				name: name.to_string(),
				message,
			});
		}
		let arn = format!("arn:aws:iam::000000000000:role/{name}");
		state.created_roles.push(name.to_string());
		state.roles.push((name.to_string(), arn.clone()));
		state.trust_documents.push(trust_document.to_string());
		Ok(arn)
	}

	async fn attach_role_policy(&self, role_name: &str, policy_arn: &str) -> Result<(), IamError> {
		self.record("attach_role_policy");
		let mut state = self.state.lock().unwrap();
		if let Some(message) = state.attach_error.take() {
			return Err(IamError::PolicyAttachFailed {
				role: role_name.to_string(),
				policy: policy_arn.to_string(),
				message,
			});
		}
		state.attached_policies.push(policy_arn.to_string());
		Ok(())
	}

	async fn update_assume_role_policy(
		&self,
		_role_name: &str,
		trust_document: &str,
	) -> Result<(), IamError> {
		self.record("update_assume_role_policy");
		self
			.state
			.lock()
			.unwrap()
			.trust_documents
			.push(trust_document.to_string());
		Ok(())
	}

	async fn create_policy(&self, name: &str, document: &str) -> Result<String, IamError> {
		self.record("create_policy");
		let arn = format!("arn:aws:iam::000000000000:policy/{name}");
		self
			.state
			.lock()
			.unwrap()
			.created_policies
			.push((name.to_string(), document.to_string()));
		Ok(arn)
	}

	async fn role_arn(&self, name: &str) -> Result<String, IamError> {
		self.record("role_arn");
		let state = self.state.lock().unwrap();
		state
			.roles
			.iter()
			.find(|(n, _)| n == name)
			.map(|(_, arn)| arn.clone())
			.ok_or_else(|| IamError::RoleNotFound {
				name: name.to_string(),
			})
	}
}
