// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Onboards chaos infrastructure onto an AWS-backed cluster.
//!
//! One invocation runs the mode-selected onboarding steps for a single
//! request built from flags, or for a batch of requests read from a JSON
//! config file. Requests in a batch run sequentially; the first failure
//! stops the run with a non-zero exit.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use havoc_core::{
	ActionMode, CloudSpec, EnvironmentSpec, InfraSpec, OnboardingRequest,
	DEFAULT_POLL_INTERVAL_SECS, DEFAULT_POLL_TIMEOUT_SECS,
};
use havoc_iam::{AwsIam, TlsThumbprintSource};
use havoc_k8s::KubeCluster;
use havoc_onboard::Orchestrator;
use havoc_registry::RegistryClient;

/// Register a chaos infrastructure with the control plane and wire its
/// workload identity into AWS.
#[derive(Parser, Debug)]
#[command(name = "havoc", version, about, long_about = None)]
struct Args {
	/// Control-plane API key
	#[arg(long, env = "HAVOC_API_KEY", required_unless_present = "config")]
	api_key: Option<String>,

	/// Account identifier
	#[arg(long, required_unless_present = "config")]
	account_id: Option<String>,

	/// Organisation identifier
	#[arg(long, default_value = "default")]
	organisation: String,

	/// Project identifier
	#[arg(long, required_unless_present = "config")]
	project: Option<String>,

	/// Name of the chaos infrastructure
	#[arg(long, required_unless_present = "config")]
	infra_name: Option<String>,

	/// Namespace the infrastructure runs in
	#[arg(long, default_value = "hce")]
	infra_namespace: String,

	/// Infrastructure scope (namespace or cluster)
	#[arg(long, default_value = "namespace")]
	infra_scope: String,

	/// Whether the infrastructure namespace already exists
	#[arg(long, default_value_t = true, action = ArgAction::Set)]
	infra_ns_exists: bool,

	#[arg(long, default_value = "Infra for Harness Chaos Testing")]
	infra_description: String,

	/// ServiceAccount the infrastructure itself runs as
	#[arg(long, default_value = "hce")]
	infra_service_account: String,

	/// Whether the infrastructure ServiceAccount already exists
	#[arg(long, action = ArgAction::SetTrue)]
	is_infra_sa_exists: bool,

	#[arg(long, action = ArgAction::SetTrue)]
	infra_skip_ssl: bool,

	/// Platform name; derived as `<infra-name>-platform` when empty
	#[arg(long, default_value = "")]
	infra_platform_name: String,

	/// Environment name; derived as `<infra-name>-env` when empty
	#[arg(long, default_value = "")]
	environment_name: String,

	#[arg(long, default_value = "Environment for Harness Chaos Testing")]
	env_description: String,

	/// Environment type, Production or PreProduction
	#[arg(long, default_value = "PreProduction")]
	env_type: String,

	/// OIDC identity provider URL of the target cluster
	#[arg(long, default_value = "")]
	provider_url: String,

	/// Existing IAM role to reuse; empty creates `HCERole-<namespace>`
	#[arg(long, default_value = "")]
	role_name: String,

	/// Comma-separated resource categories for the composed policy
	#[arg(long, default_value = "all")]
	resources: String,

	/// Target AWS region
	#[arg(long, default_value = "")]
	region: String,

	/// Experiment ServiceAccount to annotate with the role ARN
	#[arg(long, default_value = "litmus-admin")]
	service_account: String,

	/// Path to the kubeconfig file; sets KUBECONFIG
	#[arg(long)]
	kubeconfig_path: Option<PathBuf>,

	/// Maximum time to wait for activation, in seconds
	#[arg(long, default_value_t = DEFAULT_POLL_TIMEOUT_SECS)]
	timeout: u64,

	/// Delay between activation checks in seconds
	#[arg(long, default_value_t = DEFAULT_POLL_INTERVAL_SECS)]
	delay: u64,

	/// Steps to run: all, only_install, install_with_provider, only_provider,
	/// only_annotate
	#[arg(long, default_value = "all")]
	actions: String,

	/// Control-plane base URL
	#[arg(long, default_value = "https://app.harness.io/gateway")]
	endpoint: String,

	/// AWS shared credentials file; sets AWS_SHARED_CREDENTIALS_FILE
	#[arg(long)]
	aws_credential_file: Option<PathBuf>,

	/// AWS profile; sets AWS_PROFILE
	#[arg(long)]
	aws_profile: Option<String>,

	/// JSON file holding an array of onboarding requests, run sequentially
	#[arg(long)]
	config: Option<PathBuf>,

	/// Output logs as JSON
	#[arg(long, action = ArgAction::SetTrue)]
	json_logs: bool,
}

impl Args {
	fn into_request(self) -> Result<OnboardingRequest> {
		let action: ActionMode = self.actions.parse()?;
		Ok(OnboardingRequest {
			api_key: self.api_key.unwrap_or_default(),
			account_id: self.account_id.unwrap_or_default(),
			org_id: self.organisation,
			project_id: self.project.unwrap_or_default(),
			infra: InfraSpec {
				name: self.infra_name.unwrap_or_default(),
				namespace: self.infra_namespace,
				service_account: self.infra_service_account,
				scope: self.infra_scope,
				ns_exists: self.infra_ns_exists,
				sa_exists: self.is_infra_sa_exists,
				skip_ssl: self.infra_skip_ssl,
				description: self.infra_description,
				platform_name: self.infra_platform_name,
				installation_type: "MANIFEST".to_string(),
			},
			environment: EnvironmentSpec {
				name: self.environment_name,
				description: self.env_description,
				env_type: self.env_type,
			},
			cloud: CloudSpec {
				provider_url: self.provider_url,
				role_name: self.role_name,
				region: self.region,
				resources: self.resources,
			},
			experiment_service_account: self.service_account,
			timeout_secs: self.timeout,
			poll_interval_secs: self.delay,
			action,
			endpoint: self.endpoint,
		})
	}
}

fn init_tracing(json_logs: bool) {
	let filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("havoc=info"));
	if json_logs {
		tracing_subscriber::fmt().with_env_filter(filter).json().init();
	} else {
		tracing_subscriber::fmt().with_env_filter(filter).init();
	}
}

fn load_batch(path: &PathBuf) -> Result<Vec<OnboardingRequest>> {
	let raw = std::fs::read_to_string(path)
		.with_context(|| format!("unable to read config file {}", path.display()))?;
	serde_json::from_str(&raw)
		.with_context(|| format!("unable to parse config JSON in {}", path.display()))
}

async fn run(request: OnboardingRequest) -> Result<()> {
	let request = request.resolved();
	let infra = request.infra.name.clone();

	let control = RegistryClient::for_request(&request)
		.context("failed to build control-plane client")?;
	let iam = AwsIam::new(&request.cloud.region).await;
	let cluster = KubeCluster::connect()
		.await
		.context("failed to connect to the cluster")?;
	let thumbprints = TlsThumbprintSource;

	let orchestrator = Orchestrator::new(request, &control, &iam, &cluster, &thumbprints);
	match orchestrator.run().await {
		Ok(report) => {
			info!(
				infra = %infra,
				infra_id = report.infra_id.as_deref().unwrap_or("-"),
				role_arn = report.role_arn.as_deref().unwrap_or("-"),
				"onboarding succeeded"
			);
			Ok(())
		}
		Err(err) => {
			let step = err.step();
			error!(infra = %infra, step, "onboarding failed");
			Err(anyhow::Error::new(err).context(format!("onboarding failed at step '{step}'")))
		}
	}
}

#[tokio::main]
async fn main() -> Result<()> {
	let args = Args::parse();
	dotenvy::dotenv().ok();
	init_tracing(args.json_logs);

	// The kube and AWS clients read these at construction time.
	if let Some(path) = &args.kubeconfig_path {
		std::env::set_var("KUBECONFIG", path);
	}
	if let Some(path) = &args.aws_credential_file {
		std::env::set_var("AWS_SHARED_CREDENTIALS_FILE", path);
	}
	if let Some(profile) = &args.aws_profile {
		std::env::set_var("AWS_PROFILE", profile);
	}

	match args.config.clone() {
		Some(path) => {
			let batch = load_batch(&path)?;
			info!(requests = batch.len(), "running batch config");
			for (index, request) in batch.into_iter().enumerate() {
				run(request)
					.await
					.with_context(|| format!("request {index} in batch config failed"))?;
			}
			Ok(())
		}
		None => run(args.into_request()?).await,
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn parse(argv: &[&str]) -> Args {
		Args::try_parse_from(argv).unwrap()
	}

	const BASE: &[&str] = &[
		"havoc",
		"--api-key",
		"pat.xyz",
		"--account-id",
		"acct-1",
		"--project",
		"proj-1",
		"--infra-name",
		"demo",
	];

	#[test]
	fn flag_defaults_build_a_request() {
		let req = parse(BASE).into_request().unwrap().resolved();
		assert_eq!(req.org_id, "default");
		assert_eq!(req.infra.namespace, "hce");
		assert_eq!(req.infra.scope, "namespace");
		assert!(req.infra.ns_exists);
		assert_eq!(req.environment.name, "demo-env");
		assert_eq!(req.infra.platform_name, "demo-platform");
		assert_eq!(req.action, ActionMode::All);
		assert_eq!(req.timeout_secs, 180);
		assert_eq!(req.poll_interval_secs, 2);
		assert_eq!(req.endpoint, "https://app.harness.io/gateway");
	}

	#[test]
	fn ns_exists_takes_an_explicit_value() {
		let mut argv = BASE.to_vec();
		argv.extend(["--infra-ns-exists", "false"]);
		let req = parse(&argv).into_request().unwrap();
		assert!(!req.infra.ns_exists);
	}

	#[test]
	fn unknown_action_is_rejected() {
		let mut argv = BASE.to_vec();
		argv.extend(["--actions", "install_everything"]);
		let err = parse(&argv).into_request().unwrap_err();
		assert!(err.to_string().contains("install_everything"));
	}

	#[test]
	fn config_flag_lifts_required_flags() {
		let args = parse(&["havoc", "--config", "/tmp/batch.json"]);
		assert!(args.api_key.is_none());
		assert!(args.config.is_some());
	}

	#[test]
	fn missing_required_flags_fail_without_config() {
		assert!(Args::try_parse_from(["havoc"]).is_err());
	}

	#[test]
	fn batch_config_parses_multiple_requests() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("batch.json");
		std::fs::write(
			&path,
			r#"[
				{"api_key": "a", "account_id": "1", "project_id": "p", "infra": {"name": "one"}},
				{"api_key": "b", "account_id": "2", "project_id": "q", "infra": {"name": "two"}}
			]"#,
		)
		.unwrap();

		let batch = load_batch(&path).unwrap();
		assert_eq!(batch.len(), 2);
		assert_eq!(batch[0].infra.name, "one");
		assert_eq!(batch[1].infra.name, "two");
	}
}
