// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

/// Errors from policy composition.
#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
	#[error("unknown resource category: {category}")]
	UnknownResourceCategory { category: String },

	#[error("failed to serialize policy document: {0}")]
	Serialize(String),
}
