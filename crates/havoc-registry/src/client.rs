// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! HTTP client for the chaos control plane.
//!
//! Two surfaces: a REST call to create the target environment and a small
//! GraphQL API (`registerInfra` mutation, `getInfraDetails` query) behind a
//! `{query, variables}` envelope. Both authenticate with an `x-api-key`
//! header plus `Type: ApiKey`.

use std::time::Duration;

use async_trait::async_trait;
use havoc_core::OnboardingRequest;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::RegistryError;
use crate::poll::InfraStateSource;

const REGISTER_QUERY: &str = r#"mutation($identifiers: IdentifiersRequest!, $request: RegisterInfraRequest!) {
  registerInfra(identifiers: $identifiers, request: $request) {
    token
    infraID
    name
    manifest
  }
}"#;

const INFRA_DETAILS_QUERY: &str = r#"query($infraID: String!, $identifiers: IdentifiersRequest!) {
  getInfraDetails(infraID: $infraID, identifiers: $identifiers) {
    infraID
    isActive
  }
}"#;

/// What a successful registration hands back.
#[derive(Debug, Clone)]
pub struct RegistrationResult {
	pub token: String,
	pub infra_id: String,
	pub manifest: String,
}

/// Scoping identifiers sent with every GraphQL call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct Identifiers {
	org_identifier: String,
	account_identifier: String,
	project_identifier: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RegisterRequest {
	name: String,
	#[serde(rename = "environmentID")]
	environment_id: String,
	description: String,
	platform_name: String,
	infra_namespace: String,
	service_account: String,
	infra_scope: String,
	infra_ns_exists: bool,
	infra_sa_exists: bool,
	installation_type: String,
	skip_ssl: bool,
}

#[derive(Serialize)]
struct Payload<V> {
	query: &'static str,
	variables: V,
}

#[derive(Serialize)]
struct RegisterVariables {
	identifiers: Identifiers,
	request: RegisterRequest,
}

#[derive(Serialize)]
struct InfraDetailsVariables {
	#[serde(rename = "infraID")]
	infra_id: String,
	identifiers: Identifiers,
}

#[derive(Deserialize)]
struct GraphQlResponse<T> {
	data: Option<T>,
	errors: Option<Vec<GraphQlError>>,
}

#[derive(Deserialize)]
struct GraphQlError {
	message: String,
}

#[derive(Debug, Deserialize)]
struct RegisterData {
	#[serde(rename = "registerInfra")]
	register_infra: RegisterInfraPayload,
}

#[derive(Debug, Deserialize)]
struct RegisterInfraPayload {
	token: String,
	#[serde(rename = "infraID")]
	infra_id: String,
	manifest: String,
}

#[derive(Deserialize)]
struct InfraDetailsData {
	#[serde(rename = "getInfraDetails")]
	infra: InfraDetailsPayload,
}

#[derive(Deserialize)]
struct InfraDetailsPayload {
	#[serde(rename = "isActive")]
	is_active: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EnvironmentBody {
	org_identifier: String,
	project_identifier: String,
	identifier: String,
	name: String,
	description: String,
	#[serde(rename = "type")]
	env_type: String,
}

/// Client bound to one account/org/project scope.
#[derive(Clone)]
pub struct RegistryClient {
	http: reqwest::Client,
	endpoint: String,
	api_key: String,
	identifiers: Identifiers,
}

impl RegistryClient {
	pub fn new(
		endpoint: impl Into<String>,
		api_key: impl Into<String>,
		account_id: impl Into<String>,
		org_id: impl Into<String>,
		project_id: impl Into<String>,
	) -> Result<Self, RegistryError> {
		let http = reqwest::Client::builder()
			.timeout(Duration::from_secs(30))
			.build()?;
		Ok(Self {
			http,
			endpoint: endpoint.into().trim_end_matches('/').to_string(),
			api_key: api_key.into(),
			identifiers: Identifiers {
				org_identifier: org_id.into(),
				account_identifier: account_id.into(),
				project_identifier: project_id.into(),
			},
		})
	}

	/// Builds a client scoped to a request's account/org/project.
	pub fn for_request(request: &OnboardingRequest) -> Result<Self, RegistryError> {
		Self::new(
			&request.endpoint,
			&request.api_key,
			&request.account_id,
			&request.org_id,
			&request.project_id,
		)
	}

	fn graphql_url(&self) -> String {
		format!(
			"{}/chaos/manager/api/query?accountIdentifier={}",
			self.endpoint, self.identifiers.account_identifier
		)
	}

	/// Creates the target environment. A non-2xx response whose body says the
	/// environment already exists counts as success, so re-runs are safe.
	pub async fn create_environment(
		&self,
		request: &OnboardingRequest,
	) -> Result<(), RegistryError> {
		let url = format!(
			"{}/ng/api/environmentsV2?accountIdentifier={}",
			self.endpoint, self.identifiers.account_identifier
		);
		// Harness identifiers only allow [A-Za-z0-9_].
		let identifier = request.environment.name.replace('-', "_");
		let body = EnvironmentBody {
			org_identifier: self.identifiers.org_identifier.clone(),
			project_identifier: self.identifiers.project_identifier.clone(),
			identifier,
			name: request.environment.name.clone(),
			description: request.environment.description.clone(),
			env_type: request.environment.env_type.clone(),
		};

		debug!(name = %request.environment.name, "creating environment");
		let response = self
			.http
			.post(&url)
			.header("x-api-key", &self.api_key)
			.json(&body)
			.send()
			.await?;

		let status = response.status();
		if status.is_success() {
			info!(name = %request.environment.name, "environment created");
			return Ok(());
		}

		let text = response.text().await.unwrap_or_default();
		if text.to_lowercase().contains("already exists") {
			info!(name = %request.environment.name, "environment already exists, reusing");
			return Ok(());
		}
		Err(RegistryError::EnvironmentCreateFailed {
			status: status.as_u16(),
			message: text,
		})
	}

	/// Registers the chaos infra and returns the connection manifest.
	pub async fn register(
		&self,
		request: &OnboardingRequest,
	) -> Result<RegistrationResult, RegistryError> {
		let payload = Payload {
			query: REGISTER_QUERY,
			variables: RegisterVariables {
				identifiers: self.identifiers.clone(),
				request: RegisterRequest {
					name: request.infra.name.clone(),
					environment_id: request.environment.name.clone(),
					description: request.infra.description.clone(),
					platform_name: request.infra.platform_name.clone(),
					infra_namespace: request.infra.namespace.clone(),
					service_account: request.infra.service_account.clone(),
					infra_scope: request.infra.scope.clone(),
					infra_ns_exists: request.infra.ns_exists,
					infra_sa_exists: request.infra.sa_exists,
					installation_type: request.infra.installation_type.clone(),
					skip_ssl: request.infra.skip_ssl,
				},
			},
		};

		debug!(infra = %request.infra.name, "registering infra");
		let body: GraphQlResponse<RegisterData> = self.post_graphql(&payload).await?;
		let data = take_data(body)?;
		let payload = data.register_infra;

		if payload.manifest.trim().is_empty() {
			return Err(RegistryError::EmptyManifest);
		}
		info!(infra = %request.infra.name, infra_id = %payload.infra_id, "infra registered");
		Ok(RegistrationResult {
			token: payload.token,
			infra_id: payload.infra_id,
			manifest: payload.manifest,
		})
	}

	async fn post_graphql<P: Serialize, T: for<'de> Deserialize<'de>>(
		&self,
		payload: &P,
	) -> Result<GraphQlResponse<T>, RegistryError> {
		let response = self
			.http
			.post(self.graphql_url())
			.header("x-api-key", &self.api_key)
			.header("Type", "ApiKey")
			.json(payload)
			.send()
			.await?;

		let status = response.status();
		if !status.is_success() {
			let text = response.text().await.unwrap_or_default();
			return Err(RegistryError::RegistrationFailed {
				message: format_status(status, &text),
			});
		}
		Ok(response.json().await?)
	}
}

fn format_status(status: StatusCode, body: &str) -> String {
	if body.is_empty() {
		format!("status {status}")
	} else {
		format!("status {status}: {body}")
	}
}

fn take_data<T>(response: GraphQlResponse<T>) -> Result<T, RegistryError> {
	if let Some(errors) = response.errors {
		let message = errors
			.into_iter()
			.map(|e| e.message)
			.collect::<Vec<_>>()
			.join("; ");
		return Err(RegistryError::RegistrationFailed { message });
	}
	response.data.ok_or_else(|| RegistryError::Api {
		message: "response carried neither data nor errors".to_string(),
	})
}

/// The remote calls an onboarding run makes, as a seam for orchestration
/// tests. [`RegistryClient`] is the production implementation.
#[async_trait]
pub trait ControlPlane: InfraStateSource {
	async fn create_environment(&self, request: &OnboardingRequest) -> Result<(), RegistryError>;

	async fn register(
		&self,
		request: &OnboardingRequest,
	) -> Result<RegistrationResult, RegistryError>;
}

#[async_trait]
impl ControlPlane for RegistryClient {
	async fn create_environment(&self, request: &OnboardingRequest) -> Result<(), RegistryError> {
		RegistryClient::create_environment(self, request).await
	}

	async fn register(
		&self,
		request: &OnboardingRequest,
	) -> Result<RegistrationResult, RegistryError> {
		RegistryClient::register(self, request).await
	}
}

#[async_trait]
impl InfraStateSource for RegistryClient {
	async fn infra_active(&self, infra_id: &str) -> Result<bool, RegistryError> {
		let payload = Payload {
			query: INFRA_DETAILS_QUERY,
			variables: InfraDetailsVariables {
				infra_id: infra_id.to_string(),
				identifiers: self.identifiers.clone(),
			},
		};
		let body: GraphQlResponse<InfraDetailsData> = self.post_graphql(&payload).await?;
		let data = take_data(body)?;
		Ok(data.infra.is_active)
	}
}
