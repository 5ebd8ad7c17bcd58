// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use thiserror::Error;

/// Errors that can occur during cluster operations.
#[derive(Error, Debug)]
pub enum K8sError {
	#[error("K8s API error: {message}")]
	ApiError { message: String },

	#[error("failed to resolve cluster config: {message}")]
	Config { message: String },

	#[error("ServiceAccount not found: {namespace}/{name}")]
	ServiceAccountNotFound { namespace: String, name: String },

	#[error("invalid manifest document: {message}")]
	InvalidManifest { message: String },
}

impl From<kube::Error> for K8sError {
	fn from(err: kube::Error) -> Self {
		K8sError::ApiError {
			message: err.to_string(),
		}
	}
}
