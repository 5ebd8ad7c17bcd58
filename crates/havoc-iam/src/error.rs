// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! IAM capability error types.

/// Errors that can occur during IAM operations.
#[derive(Debug, thiserror::Error)]
pub enum IamError {
	/// The entity (provider, role, policy) already exists in the account.
	/// The provider binder recovers from this; everything else treats it as
	/// fatal.
	#[error("entity already exists: {message}")]
	AlreadyExists { message: String },

	#[error("failed to create OIDC provider: {message}")]
	ProviderCreateFailed { message: String },

	/// The create call signaled "already exists" but no registered provider
	/// matches the requested URL. The inconsistency is surfaced, not
	/// swallowed.
	#[error("no registered OIDC provider matches URL: {url}")]
	ProviderNotFound { url: String },

	#[error("failed to create role {name}: {message}")]
	RoleCreateFailed { name: String, message: String },

	#[error("failed to update trust policy of role {name}: {message}")]
	RoleUpdateFailed { name: String, message: String },

	#[error("role not found: {name}")]
	RoleNotFound { name: String },

	#[error("failed to create policy {name}: {message}")]
	PolicyCreateFailed { name: String, message: String },

	#[error("failed to attach policy {policy} to role {role}: {message}")]
	PolicyAttachFailed {
		role: String,
		policy: String,
		message: String,
	},

	#[error("failed to compute thumbprint for {url}: {message}")]
	Thumbprint { url: String, message: String },

	#[error("IAM API error: {message}")]
	Api { message: String },
}

/// Predicate for the "already exists" recovery heuristic.
///
/// The SDK surfaces `EntityAlreadyExists` structurally and [`AwsIam`] maps it
/// to [`IamError::AlreadyExists`] directly; this message check only backs up
/// providers that lose the error type across a transport boundary. Kept as a
/// single named function so the heuristic stays auditable.
///
/// [`AwsIam`]: crate::api::AwsIam
pub fn is_already_exists(message: &str) -> bool {
	let lower = message.to_ascii_lowercase();
	lower.contains("already exists") || lower.contains("entityalreadyexists")
}

impl IamError {
	/// Whether this error carries the idempotent "already exists" signal.
	pub fn already_exists(&self) -> bool {
		match self {
			IamError::AlreadyExists { .. } => true,
			IamError::ProviderCreateFailed { message } | IamError::Api { message } => {
				is_already_exists(message)
			}
			_ => false,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn predicate_matches_service_phrasing() {
		assert!(is_already_exists(
			"EntityAlreadyExists: Provider with url https://oidc.example already exists."
		));
		assert!(is_already_exists("provider Already Exists"));
		assert!(!is_already_exists("access denied"));
	}

	#[test]
	fn structured_variant_is_already_exists() {
		let err = IamError::AlreadyExists {
			message: "whatever".to_string(),
		};
		assert!(err.already_exists());
	}

	#[test]
	fn create_failed_falls_back_to_message() {
		let err = IamError::ProviderCreateFailed {
			message: "EntityAlreadyExists".to_string(),
		};
		assert!(err.already_exists());

		let err = IamError::ProviderCreateFailed {
			message: "throttled".to_string(),
		};
		assert!(!err.already_exists());
	}

	#[test]
	fn other_variants_never_match() {
		let err = IamError::RoleNotFound {
			name: "already exists".to_string(),
		};
		assert!(!err.already_exists());
	}
}
