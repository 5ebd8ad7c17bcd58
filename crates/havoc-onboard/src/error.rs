// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use havoc_iam::IamError;
use havoc_k8s::K8sError;
use havoc_policy::PolicyError;
use havoc_registry::RegistryError;
use thiserror::Error;

/// A failed onboarding step. The variant names the step, the source carries
/// the underlying cause untouched.
#[derive(Error, Debug)]
pub enum OnboardError {
	#[error("registration step failed")]
	Register(#[source] RegistryError),

	#[error("provider binding step failed")]
	BindProvider(#[source] IamError),

	#[error("policy composition failed")]
	ComposePolicy(#[source] PolicyError),

	#[error("role binding step failed")]
	BindRole(#[source] IamError),

	#[error("role resolution failed")]
	ResolveRole(#[source] IamError),

	#[error("annotation step failed")]
	Annotate(#[source] K8sError),
}

impl OnboardError {
	/// Short step name for log and exit reporting.
	pub fn step(&self) -> &'static str {
		match self {
			OnboardError::Register(_) => "register",
			OnboardError::BindProvider(_) => "bind-provider",
			OnboardError::ComposePolicy(_) => "compose-policy",
			OnboardError::BindRole(_) => "bind-role",
			OnboardError::ResolveRole(_) => "resolve-role",
			OnboardError::Annotate(_) => "annotate",
		}
	}
}
