// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! AWS IAM capability for chaos-infra onboarding.
//!
//! This crate exposes the cloud IAM side of onboarding behind the [`IamApi`]
//! capability trait: registering a federated OIDC identity provider
//! (tolerating "already registered"), creating or updating the web-identity
//! trust role, and composing the two into bindings the orchestrator threads
//! into later steps. [`AwsIam`] is the production implementation over
//! aws-sdk-iam; tests use [`mock::MockIam`].

pub mod api;
pub mod error;
pub mod mock;
pub mod provider;
pub mod role;
pub mod thumbprint;

pub use api::{AwsIam, IamApi};
pub use error::IamError;
pub use provider::{bind_provider, ProviderBinding};
pub use role::{bind_role, resolve_role, trust_document, RoleBinding};
pub use thumbprint::{oidc_thumbprint, ThumbprintSource, TlsThumbprintSource};

/// Audience the trust condition pins the web-identity token to.
pub const STS_AUDIENCE: &str = "sts.amazonaws.com";
