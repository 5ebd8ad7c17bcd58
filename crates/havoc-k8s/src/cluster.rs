// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Cluster capability trait and the kube-backed implementation.

use std::path::PathBuf;

use async_trait::async_trait;
use k8s_openapi::api::core::v1::ServiceAccount;
use kube::api::{Api, DynamicObject, Patch, PatchParams, PostParams};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::discovery::ApiResource;
use kube::{Client, Config};
use tracing::debug;

use crate::error::K8sError;

/// Field manager name for server-side apply.
const FIELD_MANAGER: &str = "havoc-onboard";

/// Cluster operations the onboarding flow depends on.
#[async_trait]
pub trait ClusterApi: Send + Sync {
	/// Reads a ServiceAccount; [`K8sError::ServiceAccountNotFound`] when
	/// absent.
	async fn get_service_account(
		&self,
		namespace: &str,
		name: &str,
	) -> Result<ServiceAccount, K8sError>;

	/// Writes a ServiceAccount back. Optimistic: a concurrent modification
	/// fails the call, there is no conflict retry.
	async fn update_service_account(
		&self,
		namespace: &str,
		service_account: &ServiceAccount,
	) -> Result<(), K8sError>;

	/// Applies one generic manifest document in the given namespace,
	/// resolving its kind dynamically.
	async fn apply_manifest(
		&self,
		document: &serde_json::Value,
		namespace: &str,
	) -> Result<(), K8sError>;
}

/// Production [`ClusterApi`] over a kube [`Client`].
#[derive(Clone)]
pub struct KubeCluster {
	client: Client,
}

impl KubeCluster {
	/// Connects using `KUBECONFIG`, then `~/.kube/config`, then in-cluster
	/// discovery, in that order.
	pub async fn connect() -> Result<Self, K8sError> {
		let config = resolve_config().await?;
		let client = Client::try_from(config)?;
		Ok(Self { client })
	}

	pub fn from_client(client: Client) -> Self {
		Self { client }
	}
}

async fn resolve_config() -> Result<Config, K8sError> {
	let path = std::env::var_os("KUBECONFIG")
		.map(PathBuf::from)
		.or_else(|| dirs::home_dir().map(|home| home.join(".kube").join("config")));

	if let Some(path) = path {
		if path.exists() {
			debug!(path = %path.display(), "loading kubeconfig");
			let kubeconfig = Kubeconfig::read_from(&path).map_err(|e| K8sError::Config {
				message: e.to_string(),
			})?;
			return Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
				.await
				.map_err(|e| K8sError::Config {
					message: e.to_string(),
				});
		}
	}

	debug!("no kubeconfig file, falling back to in-cluster config");
	Config::incluster().map_err(|e| K8sError::Config {
		message: e.to_string(),
	})
}

#[async_trait]
impl ClusterApi for KubeCluster {
	async fn get_service_account(
		&self,
		namespace: &str,
		name: &str,
	) -> Result<ServiceAccount, K8sError> {
		let api: Api<ServiceAccount> = Api::namespaced(self.client.clone(), namespace);
		match api.get(name).await {
			Ok(sa) => Ok(sa),
			Err(kube::Error::Api(response)) if response.code == 404 => {
				Err(K8sError::ServiceAccountNotFound {
					namespace: namespace.to_string(),
					name: name.to_string(),
				})
			}
			Err(err) => Err(err.into()),
		}
	}

	async fn update_service_account(
		&self,
		namespace: &str,
		service_account: &ServiceAccount,
	) -> Result<(), K8sError> {
		let name = service_account
			.metadata
			.name
			.as_deref()
			.ok_or_else(|| K8sError::InvalidManifest {
				message: "ServiceAccount has no name".to_string(),
			})?;
		let api: Api<ServiceAccount> = Api::namespaced(self.client.clone(), namespace);
		api
			.replace(name, &PostParams::default(), service_account)
			.await?;
		Ok(())
	}

	async fn apply_manifest(
		&self,
		document: &serde_json::Value,
		namespace: &str,
	) -> Result<(), K8sError> {
		let invalid = |message: String| K8sError::InvalidManifest { message };

		let kind = document
			.get("kind")
			.and_then(|v| v.as_str())
			.ok_or_else(|| invalid("missing kind".to_string()))?;
		let api_version = document
			.get("apiVersion")
			.and_then(|v| v.as_str())
			.ok_or_else(|| invalid("missing apiVersion".to_string()))?;
		let name = document
			.pointer("/metadata/name")
			.and_then(|v| v.as_str())
			.ok_or_else(|| invalid("missing metadata.name".to_string()))?;
		// A namespace embedded in the document wins over the target one.
		let target_ns = document
			.pointer("/metadata/namespace")
			.and_then(|v| v.as_str())
			.unwrap_or(namespace);

		let (group, version) = match api_version.split_once('/') {
			Some((group, version)) => (group.to_string(), version.to_string()),
			None => (String::new(), api_version.to_string()),
		};
		let gvk = kube::api::GroupVersionKind {
			group,
			version,
			kind: kind.to_string(),
		};
		let api_resource = ApiResource::from_gvk(&gvk);

		debug!(kind, name, namespace = target_ns, "applying manifest document");
		let api: Api<DynamicObject> =
			Api::namespaced_with(self.client.clone(), target_ns, &api_resource);
		api
			.patch(
				name,
				&PatchParams::apply(FIELD_MANAGER).force(),
				&Patch::Apply(document),
			)
			.await?;
		Ok(())
	}
}
