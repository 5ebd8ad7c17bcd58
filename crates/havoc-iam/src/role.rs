// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Web-identity trust role binding.

use tracing::info;

use crate::api::IamApi;
use crate::error::IamError;

/// A resolved role binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleBinding {
	pub arn: String,
	/// True when the role was freshly created (as opposed to a reused role
	/// whose trust document was rewritten).
	pub created: bool,
}

/// Trust (assume-role) policy granting the federated provider permission to
/// assume via web identity, conditioned on the service-account audience
/// claim.
pub fn trust_document(
	provider_arn: &str,
	namespace: &str,
	service_account: &str,
) -> Result<String, IamError> {
	let condition_key = format!("{provider_arn}:aud");
	let subject = format!("system:serviceaccount:{namespace}:{service_account}");
	let document = serde_json::json!({
		"Version": "2012-10-17",
		"Statement": [
			{
				"Effect": "Allow",
				"Principal": { "Federated": provider_arn },
				"Action": "sts:AssumeRoleWithWebIdentity",
				"Condition": {
					"StringEquals": { condition_key: subject }
				}
			}
		]
	});
	serde_json::to_string(&document).map_err(|e| IamError::Api {
		message: format!("failed to serialize trust document: {e}"),
	})
}

/// Creates or updates the role binding the provider to the workload
/// identity.
///
/// Empty `role_name` creates `HCERole-<namespace>` and attaches
/// `policy_arn`; both sub-steps must succeed and nothing is rolled back when
/// the second fails. A non-empty name reuses that role, rewriting only its
/// trust document; attached policies are left untouched.
pub async fn bind_role(
	iam: &dyn IamApi,
	role_name: &str,
	policy_arn: &str,
	provider_arn: &str,
	namespace: &str,
	service_account: &str,
) -> Result<RoleBinding, IamError> {
	let trust = trust_document(provider_arn, namespace, service_account)?;

	if role_name.trim().is_empty() {
		let name = format!("HCERole-{namespace}");
		info!(role = %name, "creating role with web-identity trust");
		let arn = iam.create_role(&name, &trust).await?;
		iam.attach_role_policy(&name, policy_arn).await?;
		Ok(RoleBinding { arn, created: true })
	} else {
		info!(role = role_name, "updating trust policy of existing role");
		iam.update_assume_role_policy(role_name, &trust).await?;
		let arn = iam.role_arn(role_name).await?;
		Ok(RoleBinding {
			arn,
			created: false,
		})
	}
}

/// Looks up the ARN for a role name; used by the annotation step.
pub async fn resolve_role(iam: &dyn IamApi, role_name: &str) -> Result<String, IamError> {
	iam.role_arn(role_name).await
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::mock::MockIam;

	const PROVIDER: &str = "arn:aws:iam::1:oidc-provider/oidc.example.com";
	const POLICY: &str = "arn:aws:iam::1:policy/HCEChaosPolicy-hce";

	#[test]
	fn trust_document_pins_audience_claim() {
		let doc = trust_document(PROVIDER, "hce", "litmus-admin").unwrap();
		let value: serde_json::Value = serde_json::from_str(&doc).unwrap();
		let statement = &value["Statement"][0];
		assert_eq!(statement["Effect"], "Allow");
		assert_eq!(statement["Principal"]["Federated"], PROVIDER);
		assert_eq!(statement["Action"], "sts:AssumeRoleWithWebIdentity");
		assert_eq!(
			statement["Condition"]["StringEquals"][format!("{PROVIDER}:aud")],
			"system:serviceaccount:hce:litmus-admin"
		);
	}

	#[tokio::test]
	async fn empty_name_creates_then_attaches() {
		let iam = MockIam::new();
		let binding = bind_role(&iam, "", POLICY, PROVIDER, "hce", "litmus-admin")
			.await
			.unwrap();
		assert!(binding.created);
		assert_eq!(iam.calls(), vec!["create_role", "attach_role_policy"]);
		assert_eq!(iam.created_roles(), vec!["HCERole-hce"]);
		assert_eq!(iam.attached_policies(), vec![POLICY.to_string()]);
	}

	#[tokio::test]
	async fn existing_name_updates_trust_only() {
		let iam = MockIam::new();
		iam.register_role("ops-role", "arn:aws:iam::1:role/ops-role");
		let binding = bind_role(&iam, "ops-role", "", PROVIDER, "hce", "litmus-admin")
			.await
			.unwrap();
		assert!(!binding.created);
		assert_eq!(binding.arn, "arn:aws:iam::1:role/ops-role");
		assert_eq!(iam.calls(), vec!["update_assume_role_policy", "role_arn"]);
		assert!(iam.created_roles().is_empty());
		assert!(iam.attached_policies().is_empty());
	}

	#[tokio::test]
	async fn attach_failure_fails_the_bind_without_rollback() {
		let iam = MockIam::new();
		iam.fail_attach("policy quota exceeded");
		let err = bind_role(&iam, "", POLICY, PROVIDER, "hce", "litmus-admin")
			.await
			.unwrap_err();
		match err {
			IamError::PolicyAttachFailed { role, .. } => assert_eq!(role, "HCERole-hce"),
			other => panic!("unexpected error: {other}"),
		}
		// The created role is left in place.
		assert_eq!(iam.created_roles(), vec!["HCERole-hce"]);
	}

	#[tokio::test]
	async fn resolve_missing_role_is_not_found() {
		let iam = MockIam::new();
		let err = resolve_role(&iam, "absent").await.unwrap_err();
		match err {
			IamError::RoleNotFound { name } => assert_eq!(name, "absent"),
			other => panic!("unexpected error: {other}"),
		}
	}
}
