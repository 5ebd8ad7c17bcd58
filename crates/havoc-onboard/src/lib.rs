// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Onboarding orchestration.
//!
//! Composes the capability crates (control plane, IAM, cluster) into the
//! mode-selected step sequence and surfaces the first failure with its step
//! name. Capabilities are injected as trait objects so the whole flow runs
//! against mocks in tests.

pub mod error;
pub mod orchestrator;

pub use error::OnboardError;
pub use orchestrator::{OnboardReport, Orchestrator};
