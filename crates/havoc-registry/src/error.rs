// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use thiserror::Error;

/// Errors from the control-plane client and manifest handling.
#[derive(Error, Debug)]
pub enum RegistryError {
	#[error("failed to create environment (status {status}): {message}")]
	EnvironmentCreateFailed { status: u16, message: String },

	#[error("infra registration failed: {message}")]
	RegistrationFailed { message: String },

	#[error("registration returned an empty manifest")]
	EmptyManifest,

	#[error("manifest document {index} is not valid YAML: {message}")]
	ManifestParseFailed { index: usize, message: String },

	#[error("failed to apply manifest document {index} ({kind}): {message}")]
	ManifestApplyFailed {
		index: usize,
		kind: String,
		message: String,
	},

	#[error("infra {infra_id} did not become active within {waited_secs}s")]
	PollTimeout { infra_id: String, waited_secs: u64 },

	#[error("HTTP request failed: {0}")]
	Http(#[from] reqwest::Error),

	#[error("unexpected control-plane response: {message}")]
	Api { message: String },
}
