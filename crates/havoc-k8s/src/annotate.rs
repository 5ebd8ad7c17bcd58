// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Workload identity annotation.

use std::collections::BTreeMap;

use tracing::info;

use crate::cluster::ClusterApi;
use crate::error::K8sError;

/// Annotation key EKS inspects to map a ServiceAccount to an IAM role.
pub const ROLE_ARN_ANNOTATION: &str = "eks.amazonaws.com/role-arn";

/// Stamps the resolved role ARN onto the experiment ServiceAccount.
///
/// Reads the ServiceAccount, sets the well-known annotation (creating the
/// annotation map when absent) and writes the object back. The terminal step
/// of a full onboarding run.
pub async fn annotate_service_account(
	cluster: &dyn ClusterApi,
	namespace: &str,
	name: &str,
	role_arn: &str,
) -> Result<(), K8sError> {
	let mut service_account = cluster.get_service_account(namespace, name).await?;

	service_account
		.metadata
		.annotations
		.get_or_insert_with(BTreeMap::new)
		.insert(ROLE_ARN_ANNOTATION.to_string(), role_arn.to_string());

	cluster
		.update_service_account(namespace, &service_account)
		.await?;
	info!(namespace, name, role_arn, "ServiceAccount annotated with role");
	Ok(())
}
