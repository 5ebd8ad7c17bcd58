// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Cluster capability for chaos-infra onboarding.
//!
//! Exposes the two cluster-side operations onboarding needs behind the
//! [`ClusterApi`] trait: reading/writing one ServiceAccount (to stamp the
//! resolved role ARN onto it) and applying arbitrary manifest documents via
//! the dynamic API. [`KubeCluster`] is the production implementation; tests
//! use [`mock::MockCluster`].

pub mod annotate;
pub mod cluster;
pub mod error;
pub mod mock;

pub use annotate::{annotate_service_account, ROLE_ARN_ANNOTATION};
pub use cluster::{ClusterApi, KubeCluster};
pub use error::K8sError;
