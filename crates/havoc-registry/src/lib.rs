// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Control-plane client for chaos-infra onboarding.
//!
//! Covers the remote half of a registration run: creating the environment,
//! the `registerInfra` GraphQL mutation, splitting and applying the returned
//! connection manifest, and polling `getInfraDetails` until the infra turns
//! active.

pub mod client;
pub mod error;
pub mod manifest;
pub mod mock;
pub mod poll;

pub use client::{ControlPlane, RegistrationResult, RegistryClient};
pub use error::RegistryError;
pub use manifest::{apply_registration, split_manifest};
pub use poll::{await_active, InfraStateSource};
