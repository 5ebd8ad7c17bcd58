// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core request model for Havoc chaos-infra onboarding.
//!
//! An [`OnboardingRequest`] fully describes one onboarding run: the control
//! plane identity, the target infra and environment, the AWS descriptors, and
//! the operational knobs. Requests are immutable once resolved; derived
//! defaults (environment and platform names) are computed exactly once via
//! [`OnboardingRequest::resolved`].

pub mod action;
pub mod request;

pub use action::{ActionMode, InvalidAction};
pub use request::{
	CloudSpec, EnvironmentSpec, InfraSpec, OnboardingRequest, DEFAULT_POLL_INTERVAL_SECS,
	DEFAULT_POLL_TIMEOUT_SECS,
};
