// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Onboarding request model.
//!
//! The request is fully parameterized: the only hidden behavior is the two
//! derived names (`<infra>-env` and `<infra>-platform`) and the fixed poll
//! defaults. Requests deserialize from the CLI's JSON config file, so every
//! field carries a serde default matching the CLI flag default.

use serde::{Deserialize, Serialize};

use crate::action::ActionMode;

/// Default activation wait in seconds.
pub const DEFAULT_POLL_TIMEOUT_SECS: u64 = 180;

/// Default delay between activation polls in seconds.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 2;

const DEFAULT_ENDPOINT: &str = "https://app.harness.io/gateway";

/// Target chaos infrastructure descriptor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InfraSpec {
	pub name: String,
	#[serde(default = "default_namespace")]
	pub namespace: String,
	/// ServiceAccount the infra itself runs as.
	#[serde(default = "default_namespace")]
	pub service_account: String,
	#[serde(default = "default_scope")]
	pub scope: String,
	#[serde(default = "default_true")]
	pub ns_exists: bool,
	#[serde(default)]
	pub sa_exists: bool,
	#[serde(default)]
	pub skip_ssl: bool,
	#[serde(default = "default_infra_description")]
	pub description: String,
	/// Derived as `<infra-name>-platform` when left empty.
	#[serde(default)]
	pub platform_name: String,
	#[serde(default = "default_installation_type")]
	pub installation_type: String,
}

/// Control-plane environment descriptor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnvironmentSpec {
	/// Derived as `<infra-name>-env` when left empty.
	#[serde(default)]
	pub name: String,
	#[serde(default = "default_env_description")]
	pub description: String,
	#[serde(default = "default_env_type")]
	pub env_type: String,
}

/// AWS-side descriptor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloudSpec {
	/// OIDC identity provider URL of the target cluster.
	#[serde(default)]
	pub provider_url: String,
	/// Existing role to reuse; empty means create a new role.
	#[serde(default)]
	pub role_name: String,
	#[serde(default)]
	pub region: String,
	/// Comma-separated resource categories for the composed policy.
	#[serde(default = "default_resources")]
	pub resources: String,
}

impl Default for CloudSpec {
	fn default() -> Self {
		Self {
			provider_url: String::new(),
			role_name: String::new(),
			region: String::new(),
			resources: default_resources(),
		}
	}
}

/// Immutable input describing one onboarding run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OnboardingRequest {
	pub api_key: String,
	pub account_id: String,
	#[serde(default = "default_org")]
	pub org_id: String,
	pub project_id: String,

	pub infra: InfraSpec,
	#[serde(default)]
	pub environment: EnvironmentSpec,
	#[serde(default)]
	pub cloud: CloudSpec,

	/// ServiceAccount experiments run as; the annotation target.
	#[serde(default = "default_experiment_service_account")]
	pub experiment_service_account: String,

	#[serde(default = "default_timeout")]
	pub timeout_secs: u64,
	#[serde(default = "default_interval")]
	pub poll_interval_secs: u64,
	#[serde(default = "default_action")]
	pub action: ActionMode,

	/// Control-plane base URL.
	#[serde(default = "default_endpoint")]
	pub endpoint: String,
}

impl OnboardingRequest {
	/// Computes the derived defaults, consuming the raw request.
	///
	/// Environment name defaults to `<infra-name>-env` and platform name to
	/// `<infra-name>-platform`. Called once at construction; the request is
	/// treated as immutable afterwards.
	pub fn resolved(mut self) -> Self {
		if self.environment.name.trim().is_empty() {
			self.environment.name = format!("{}-env", self.infra.name);
		}
		if self.infra.platform_name.trim().is_empty() {
			self.infra.platform_name = format!("{}-platform", self.infra.name);
		}
		self
	}

	/// Name of the role the run creates (or resolves) when none is supplied.
	pub fn derived_role_name(&self) -> String {
		format!("HCERole-{}", self.infra.namespace)
	}

	/// Resource categories as individual tokens.
	pub fn resource_categories(&self) -> Vec<&str> {
		self
			.cloud
			.resources
			.split(',')
			.map(str::trim)
			.filter(|s| !s.is_empty())
			.collect()
	}
}

fn default_namespace() -> String {
	"hce".to_string()
}

fn default_scope() -> String {
	"namespace".to_string()
}

fn default_org() -> String {
	"default".to_string()
}

fn default_infra_description() -> String {
	"Infra for Harness Chaos Testing".to_string()
}

fn default_env_description() -> String {
	"Environment for Harness Chaos Testing".to_string()
}

fn default_env_type() -> String {
	"PreProduction".to_string()
}

fn default_installation_type() -> String {
	"MANIFEST".to_string()
}

fn default_experiment_service_account() -> String {
	"litmus-admin".to_string()
}

fn default_resources() -> String {
	"all".to_string()
}

fn default_timeout() -> u64 {
	DEFAULT_POLL_TIMEOUT_SECS
}

fn default_interval() -> u64 {
	DEFAULT_POLL_INTERVAL_SECS
}

fn default_action() -> ActionMode {
	ActionMode::All
}

fn default_endpoint() -> String {
	DEFAULT_ENDPOINT.to_string()
}

fn default_true() -> bool {
	true
}
