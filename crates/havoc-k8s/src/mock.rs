// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! In-memory [`ClusterApi`] for tests.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use k8s_openapi::api::core::v1::ServiceAccount;
use kube::api::ObjectMeta;

use crate::cluster::ClusterApi;
use crate::error::K8sError;

#[derive(Default)]
struct State {
	service_accounts: BTreeMap<(String, String), ServiceAccount>,
	applied: Vec<(String, serde_json::Value)>,
	update_attempts: usize,
	fail_update: Option<String>,
	fail_apply: Option<String>,
}

/// Records every call and holds ServiceAccounts in memory. Failures are
/// scripted per operation.
#[derive(Clone, Default)]
pub struct MockCluster {
	state: Arc<Mutex<State>>,
}

impl MockCluster {
	pub fn new() -> Self {
		Self::default()
	}

	/// Seeds an empty ServiceAccount.
	pub fn add_service_account(&self, namespace: &str, name: &str) {
		let sa = ServiceAccount {
			metadata: ObjectMeta {
				name: Some(name.to_string()),
				namespace: Some(namespace.to_string()),
				..Default::default()
			},
			..Default::default()
		};
		self.state
			.lock()
			.unwrap()
			.service_accounts
			.insert((namespace.to_string(), name.to_string()), sa);
	}

	/// Sets an annotation on a seeded ServiceAccount.
	pub fn set_annotation(&self, namespace: &str, name: &str, key: &str, value: &str) {
		let mut state = self.state.lock().unwrap();
		if let Some(sa) = state
			.service_accounts
			.get_mut(&(namespace.to_string(), name.to_string()))
		{
			sa.metadata
				.annotations
				.get_or_insert_with(BTreeMap::new)
				.insert(key.to_string(), value.to_string());
		}
	}

	/// Current stored copy of a ServiceAccount.
	pub fn service_account(&self, namespace: &str, name: &str) -> Option<ServiceAccount> {
		self.state
			.lock()
			.unwrap()
			.service_accounts
			.get(&(namespace.to_string(), name.to_string()))
			.cloned()
	}

	/// Documents applied so far, with the namespace each targeted.
	pub fn applied(&self) -> Vec<(String, serde_json::Value)> {
		self.state.lock().unwrap().applied.clone()
	}

	pub fn update_attempts(&self) -> usize {
		self.state.lock().unwrap().update_attempts
	}

	/// Next `update_service_account` fails with this message.
	pub fn fail_update(&self, message: &str) {
		self.state.lock().unwrap().fail_update = Some(message.to_string());
	}

	/// Every `apply_manifest` fails with this message.
	pub fn fail_apply(&self, message: &str) {
		self.state.lock().unwrap().fail_apply = Some(message.to_string());
	}
}

#[async_trait]
impl ClusterApi for MockCluster {
	async fn get_service_account(
		&self,
		namespace: &str,
		name: &str,
	) -> Result<ServiceAccount, K8sError> {
		self.state
			.lock()
			.unwrap()
			.service_accounts
			.get(&(namespace.to_string(), name.to_string()))
			.cloned()
			.ok_or_else(|| K8sError::ServiceAccountNotFound {
				namespace: namespace.to_string(),
				name: name.to_string(),
			})
	}

	async fn update_service_account(
		&self,
		namespace: &str,
		service_account: &ServiceAccount,
	) -> Result<(), K8sError> {
		let mut state = self.state.lock().unwrap();
		state.update_attempts += 1;
		if let Some(message) = state.fail_update.take() {
			return Err(K8sError::ApiError { message });
		}
		let name = service_account
			.metadata
			.name
			.clone()
			.ok_or_else(|| K8sError::InvalidManifest {
				message: "ServiceAccount has no name".to_string(),
			})?;
		state
			.service_accounts
			.insert((namespace.to_string(), name), service_account.clone());
		Ok(())
	}

	async fn apply_manifest(
		&self,
		document: &serde_json::Value,
		namespace: &str,
	) -> Result<(), K8sError> {
		let mut state = self.state.lock().unwrap();
		if let Some(message) = state.fail_apply.clone() {
			return Err(K8sError::ApiError { message });
		}
		state
			.applied
			.push((namespace.to_string(), document.clone()));
		Ok(())
	}
}
