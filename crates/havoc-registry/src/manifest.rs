// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Connection manifest handling.
//!
//! The registration response carries one YAML blob holding every object the
//! infra needs (namespace, ServiceAccount, Deployment, ...). It is split on
//! document separators and applied in order; the first failure aborts the
//! run, objects applied before it stay in place.

use havoc_k8s::ClusterApi;
use tracing::info;

use crate::client::RegistrationResult;
use crate::error::RegistryError;

/// Splits a multi-document YAML blob into trimmed, non-empty documents.
pub fn split_manifest(manifest: &str) -> Vec<&str> {
	let body = manifest.strip_prefix("---\n").unwrap_or(manifest);
	body
		.split("\n---")
		.map(str::trim)
		.filter(|doc| !doc.is_empty())
		.collect()
}

/// Applies every document of a registration manifest into `namespace`.
pub async fn apply_registration(
	cluster: &dyn ClusterApi,
	result: &RegistrationResult,
	namespace: &str,
) -> Result<(), RegistryError> {
	let documents = split_manifest(&result.manifest);
	if documents.is_empty() {
		return Err(RegistryError::EmptyManifest);
	}

	for (index, document) in documents.iter().enumerate() {
		let value: serde_json::Value =
			serde_yaml::from_str(document).map_err(|e| RegistryError::ManifestParseFailed {
				index,
				message: e.to_string(),
			})?;
		let kind = value
			.get("kind")
			.and_then(|v| v.as_str())
			.unwrap_or("unknown")
			.to_string();
		cluster
			.apply_manifest(&value, namespace)
			.await
			.map_err(|e| RegistryError::ManifestApplyFailed {
				index,
				kind,
				message: e.to_string(),
			})?;
	}
	info!(
		infra_id = %result.infra_id,
		documents = documents.len(),
		namespace,
		"connection manifest applied"
	);
	Ok(())
}
