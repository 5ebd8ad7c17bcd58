// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The onboarding state machine.
//!
//! Runs the mode-selected subset of four steps: register the infra with the
//! control plane, bind the OIDC identity provider, bind the web-identity
//! trust role, annotate the experiment ServiceAccount. Each step's output
//! threads into the next; the first failure aborts the run and nothing is
//! rolled back.

use std::time::Duration;

use havoc_core::{ActionMode, OnboardingRequest};
use havoc_iam::{bind_provider, bind_role, resolve_role, IamApi, ProviderBinding, RoleBinding};
use havoc_iam::{ThumbprintSource, STS_AUDIENCE};
use havoc_k8s::{annotate_service_account, ClusterApi};
use havoc_registry::{
	apply_registration, await_active, ControlPlane, InfraStateSource, RegistrationResult,
};
use tracing::info;

use crate::error::OnboardError;

/// What a run produced; fields stay `None` for steps the mode skipped.
#[derive(Debug, Default)]
pub struct OnboardReport {
	pub infra_id: Option<String>,
	pub provider_arn: Option<String>,
	pub role_arn: Option<String>,
}

/// Drives one onboarding run over the injected capabilities.
pub struct Orchestrator<'a> {
	request: OnboardingRequest,
	control: &'a dyn ControlPlane,
	iam: &'a dyn IamApi,
	cluster: &'a dyn ClusterApi,
	thumbprints: &'a dyn ThumbprintSource,
}

impl<'a> Orchestrator<'a> {
	pub fn new(
		request: OnboardingRequest,
		control: &'a dyn ControlPlane,
		iam: &'a dyn IamApi,
		cluster: &'a dyn ClusterApi,
		thumbprints: &'a dyn ThumbprintSource,
	) -> Self {
		Self {
			request,
			control,
			iam,
			cluster,
			thumbprints,
		}
	}

	pub async fn run(&self) -> Result<OnboardReport, OnboardError> {
		let mut report = OnboardReport::default();
		info!(
			infra = %self.request.infra.name,
			action = %self.request.action,
			"starting onboarding run"
		);

		match self.request.action {
			ActionMode::All => {
				report.infra_id = Some(self.register().await?.infra_id);
				let provider = self.bind_provider().await?;
				report.provider_arn = Some(provider.arn.clone());
				let role = self.bind_role(&provider).await?;
				self.annotate(&role.arn).await?;
				report.role_arn = Some(role.arn);
			}
			ActionMode::OnlyInstall => {
				report.infra_id = Some(self.register().await?.infra_id);
			}
			ActionMode::InstallWithProvider => {
				report.infra_id = Some(self.register().await?.infra_id);
				let provider = self.bind_provider().await?;
				report.provider_arn = Some(provider.arn.clone());
				report.role_arn = Some(self.bind_role(&provider).await?.arn);
			}
			ActionMode::OnlyProvider => {
				let provider = self.bind_provider().await?;
				report.provider_arn = Some(provider.arn.clone());
				report.role_arn = Some(self.bind_role(&provider).await?.arn);
			}
			ActionMode::OnlyAnnotate => {
				let arn = self.resolve_role_arn().await?;
				self.annotate(&arn).await?;
				report.role_arn = Some(arn);
			}
		}

		info!(infra = %self.request.infra.name, "onboarding run complete");
		Ok(report)
	}

	/// Environment create, infra registration, manifest apply, then polling
	/// until the infra reports active.
	async fn register(&self) -> Result<RegistrationResult, OnboardError> {
		self
			.control
			.create_environment(&self.request)
			.await
			.map_err(OnboardError::Register)?;
		let result = self
			.control
			.register(&self.request)
			.await
			.map_err(OnboardError::Register)?;
		apply_registration(self.cluster, &result, &self.request.infra.namespace)
			.await
			.map_err(OnboardError::Register)?;

		let source: &dyn InfraStateSource = self.control;
		await_active(
			source,
			&result.infra_id,
			Duration::from_secs(self.request.timeout_secs),
			Duration::from_secs(self.request.poll_interval_secs),
		)
		.await
		.map_err(OnboardError::Register)?;
		Ok(result)
	}

	async fn bind_provider(&self) -> Result<ProviderBinding, OnboardError> {
		let url = &self.request.cloud.provider_url;
		let thumbprint = self
			.thumbprints
			.thumbprint(url)
			.await
			.map_err(OnboardError::BindProvider)?;
		bind_provider(self.iam, url, &thumbprint, STS_AUDIENCE)
			.await
			.map_err(OnboardError::BindProvider)
	}

	/// Creates or reuses the role. The create path (empty role name) first
	/// composes the permission policy from the requested resource categories
	/// and creates it as `HCEChaosPolicy-<namespace>`.
	async fn bind_role(&self, provider: &ProviderBinding) -> Result<RoleBinding, OnboardError> {
		let role_name = &self.request.cloud.role_name;

		let policy_arn = if role_name.trim().is_empty() {
			let categories = self.request.resource_categories();
			let policy =
				havoc_policy::compose(&categories).map_err(OnboardError::ComposePolicy)?;
			let document = policy.to_json().map_err(OnboardError::ComposePolicy)?;
			let name = format!("HCEChaosPolicy-{}", self.request.infra.namespace);
			self
				.iam
				.create_policy(&name, &document)
				.await
				.map_err(OnboardError::BindRole)?
		} else {
			String::new()
		};

		bind_role(
			self.iam,
			role_name,
			&policy_arn,
			&provider.arn,
			&self.request.infra.namespace,
			&self.request.experiment_service_account,
		)
		.await
		.map_err(OnboardError::BindRole)
	}

	/// The annotate-only mode trusts an already-provisioned role: the
	/// supplied name, or the derived `HCERole-<namespace>` when none is.
	async fn resolve_role_arn(&self) -> Result<String, OnboardError> {
		let name = if self.request.cloud.role_name.trim().is_empty() {
			self.request.derived_role_name()
		} else {
			self.request.cloud.role_name.clone()
		};
		resolve_role(self.iam, &name)
			.await
			.map_err(OnboardError::ResolveRole)
	}

	async fn annotate(&self, role_arn: &str) -> Result<(), OnboardError> {
		annotate_service_account(
			self.cluster,
			&self.request.infra.namespace,
			&self.request.experiment_service_account,
			role_arn,
		)
		.await
		.map_err(OnboardError::Annotate)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use havoc_iam::mock::MockIam;
	use havoc_iam::IamError;
	use havoc_k8s::mock::MockCluster;
	use havoc_k8s::ROLE_ARN_ANNOTATION;
	use havoc_registry::mock::MockControlPlane;

	use async_trait::async_trait;

	struct FixedThumbprint;

	#[async_trait]
	impl ThumbprintSource for FixedThumbprint {
		async fn thumbprint(&self, _provider_url: &str) -> Result<String, IamError> {
			Ok("A9993E364706816ABA3E25717850C26C9CD0D89D".to_string())
		}
	}

	fn request(action: &str) -> OnboardingRequest {
		let req: OnboardingRequest = serde_json::from_str(&format!(
			r#"{{
				"api_key": "pat.xyz",
				"account_id": "acct-1",
				"project_id": "proj-1",
				"action": "{action}",
				"infra": {{ "name": "demo" }},
				"cloud": {{
					"provider_url": "https://oidc.eks.us-east-2.amazonaws.com/id/ABCDEF",
					"region": "us-east-2",
					"resources": "ec2,lambda"
				}}
			}}"#
		))
		.unwrap();
		req.resolved()
	}

	fn annotated_arn(cluster: &MockCluster) -> Option<String> {
		cluster
			.service_account("hce", "litmus-admin")?
			.metadata
			.annotations?
			.get(ROLE_ARN_ANNOTATION)
			.cloned()
	}

	#[tokio::test(start_paused = true)]
	async fn all_runs_every_step_in_order() {
		let control = MockControlPlane::new();
		let iam = MockIam::new();
		let cluster = MockCluster::new();
		cluster.add_service_account("hce", "litmus-admin");

		let orchestrator =
			Orchestrator::new(request("all"), &control, &iam, &cluster, &FixedThumbprint);
		let report = orchestrator.run().await.unwrap();

		assert_eq!(report.infra_id.as_deref(), Some("infra-1"));
		assert_eq!(
			report.role_arn.as_deref(),
			Some("arn:aws:iam::000000000000:role/HCERole-hce")
		);
		assert_eq!(
			control.calls(),
			vec!["create_environment", "register", "infra_active"]
		);
		assert_eq!(
			iam.calls(),
			vec![
				"create_oidc_provider",
				"create_policy",
				"create_role",
				"attach_role_policy",
			]
		);
		// The connection manifest was applied into the infra namespace.
		assert_eq!(cluster.applied().len(), 1);
		assert_eq!(cluster.applied()[0].0, "hce");
		assert_eq!(
			annotated_arn(&cluster).as_deref(),
			Some("arn:aws:iam::000000000000:role/HCERole-hce")
		);
	}

	#[tokio::test(start_paused = true)]
	async fn all_composes_policy_from_requested_categories() {
		let control = MockControlPlane::new();
		let iam = MockIam::new();
		let cluster = MockCluster::new();
		cluster.add_service_account("hce", "litmus-admin");

		Orchestrator::new(request("all"), &control, &iam, &cluster, &FixedThumbprint)
			.run()
			.await
			.unwrap();

		let policies = iam.created_policies();
		assert_eq!(policies.len(), 1);
		let (name, document) = &policies[0];
		assert_eq!(name, "HCEChaosPolicy-hce");
		let value: serde_json::Value = serde_json::from_str(document).unwrap();
		let actions = value["Statement"][0]["Action"].as_array().unwrap();
		assert!(actions.iter().any(|a| a == "ec2:DescribeInstances"));
		assert!(actions.iter().any(|a| a == "lambda:GetFunction"));
		assert!(!actions.iter().any(|a| a == "rds:DeleteDBInstance"));
	}

	#[tokio::test(start_paused = true)]
	async fn only_install_skips_cloud_and_annotation() {
		let control = MockControlPlane::new();
		let iam = MockIam::new();
		let cluster = MockCluster::new();
		cluster.add_service_account("hce", "litmus-admin");

		let report = Orchestrator::new(
			request("only_install"),
			&control,
			&iam,
			&cluster,
			&FixedThumbprint,
		)
		.run()
		.await
		.unwrap();

		assert_eq!(report.infra_id.as_deref(), Some("infra-1"));
		assert!(report.provider_arn.is_none());
		assert!(report.role_arn.is_none());
		assert!(iam.calls().is_empty());
		assert!(annotated_arn(&cluster).is_none());
	}

	#[tokio::test(start_paused = true)]
	async fn register_waits_through_inactive_polls() {
		let control = MockControlPlane::new();
		control.script_active(vec![false, false, false]);
		let iam = MockIam::new();
		let cluster = MockCluster::new();

		Orchestrator::new(
			request("only_install"),
			&control,
			&iam,
			&cluster,
			&FixedThumbprint,
		)
		.run()
		.await
		.unwrap();

		let polls = control
			.calls()
			.iter()
			.filter(|c| c.as_str() == "infra_active")
			.count();
		assert_eq!(polls, 4);
	}

	#[tokio::test]
	async fn only_annotate_uses_supplied_role_name() {
		let control = MockControlPlane::new();
		let iam = MockIam::new();
		iam.register_role("ops-role", "arn:aws:iam::1:role/ops-role");
		let cluster = MockCluster::new();
		cluster.add_service_account("hce", "litmus-admin");

		let mut req = request("only_annotate");
		req.cloud.role_name = "ops-role".to_string();
		let report = Orchestrator::new(req, &control, &iam, &cluster, &FixedThumbprint)
			.run()
			.await
			.unwrap();

		assert_eq!(report.role_arn.as_deref(), Some("arn:aws:iam::1:role/ops-role"));
		assert!(control.calls().is_empty());
		assert_eq!(iam.calls(), vec!["role_arn"]);
		assert_eq!(
			annotated_arn(&cluster).as_deref(),
			Some("arn:aws:iam::1:role/ops-role")
		);
	}

	#[tokio::test]
	async fn only_annotate_falls_back_to_derived_role_name() {
		let control = MockControlPlane::new();
		let iam = MockIam::new();
		iam.register_role("HCERole-hce", "arn:aws:iam::1:role/HCERole-hce");
		let cluster = MockCluster::new();
		cluster.add_service_account("hce", "litmus-admin");

		let report = Orchestrator::new(
			request("only_annotate"),
			&control,
			&iam,
			&cluster,
			&FixedThumbprint,
		)
		.run()
		.await
		.unwrap();

		assert_eq!(
			report.role_arn.as_deref(),
			Some("arn:aws:iam::1:role/HCERole-hce")
		);
	}

	#[tokio::test]
	async fn only_provider_reusing_role_skips_policy_creation() {
		let control = MockControlPlane::new();
		let iam = MockIam::new();
		iam.register_role("ops-role", "arn:aws:iam::1:role/ops-role");
		let cluster = MockCluster::new();

		let mut req = request("only_provider");
		req.cloud.role_name = "ops-role".to_string();
		let report = Orchestrator::new(req, &control, &iam, &cluster, &FixedThumbprint)
			.run()
			.await
			.unwrap();

		assert!(control.calls().is_empty());
		assert_eq!(
			iam.calls(),
			vec!["create_oidc_provider", "update_assume_role_policy", "role_arn"]
		);
		assert!(iam.created_policies().is_empty());
		assert_eq!(report.role_arn.as_deref(), Some("arn:aws:iam::1:role/ops-role"));
	}

	#[tokio::test(start_paused = true)]
	async fn provider_failure_stops_later_steps() {
		let control = MockControlPlane::new();
		let iam = MockIam::new();
		iam.fail_provider_create("access denied");
		let cluster = MockCluster::new();
		cluster.add_service_account("hce", "litmus-admin");

		let err = Orchestrator::new(request("all"), &control, &iam, &cluster, &FixedThumbprint)
			.run()
			.await
			.unwrap_err();

		assert_eq!(err.step(), "bind-provider");
		// Registration already happened, nothing after the failure did.
		assert_eq!(
			control.calls(),
			vec!["create_environment", "register", "infra_active"]
		);
		assert_eq!(iam.calls(), vec!["create_oidc_provider"]);
		assert!(annotated_arn(&cluster).is_none());
	}

	#[tokio::test(start_paused = true)]
	async fn registration_failure_aborts_before_cloud_steps() {
		let control = MockControlPlane::new();
		control.fail_register("invalid project");
		let iam = MockIam::new();
		let cluster = MockCluster::new();

		let err = Orchestrator::new(request("all"), &control, &iam, &cluster, &FixedThumbprint)
			.run()
			.await
			.unwrap_err();

		assert_eq!(err.step(), "register");
		assert!(iam.calls().is_empty());
		assert!(cluster.applied().is_empty());
	}
}
