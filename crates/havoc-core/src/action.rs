// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Action modes selecting which onboarding steps run.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The requested action string was not a recognized mode.
///
/// Raised at parse time, before any onboarding step executes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid action: {0}")]
pub struct InvalidAction(pub String);

/// Which subset of the onboarding sequence to run.
///
/// The full sequence is register -> bind provider -> bind role -> annotate;
/// each mode executes a fixed, ordered subset of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionMode {
	/// Register the infra, bind the OIDC provider and role, annotate the SA.
	All,
	/// Register the infra with the control plane only.
	OnlyInstall,
	/// Register, then bind the OIDC provider and role. No annotation.
	InstallWithProvider,
	/// Bind the OIDC provider and role only. No registration.
	OnlyProvider,
	/// Annotate the experiment ServiceAccount with an existing role.
	OnlyAnnotate,
}

impl ActionMode {
	pub fn as_str(&self) -> &'static str {
		match self {
			ActionMode::All => "all",
			ActionMode::OnlyInstall => "only_install",
			ActionMode::InstallWithProvider => "install_with_provider",
			ActionMode::OnlyProvider => "only_provider",
			ActionMode::OnlyAnnotate => "only_annotate",
		}
	}
}

impl fmt::Display for ActionMode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for ActionMode {
	type Err = InvalidAction;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"all" => Ok(ActionMode::All),
			"only_install" => Ok(ActionMode::OnlyInstall),
			"install_with_provider" => Ok(ActionMode::InstallWithProvider),
			"only_provider" => Ok(ActionMode::OnlyProvider),
			"only_annotate" => Ok(ActionMode::OnlyAnnotate),
			other => Err(InvalidAction(other.to_string())),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_all_known_modes() {
		assert_eq!("all".parse::<ActionMode>().unwrap(), ActionMode::All);
		assert_eq!(
			"only_install".parse::<ActionMode>().unwrap(),
			ActionMode::OnlyInstall
		);
		assert_eq!(
			"install_with_provider".parse::<ActionMode>().unwrap(),
			ActionMode::InstallWithProvider
		);
		assert_eq!(
			"only_provider".parse::<ActionMode>().unwrap(),
			ActionMode::OnlyProvider
		);
		assert_eq!(
			"only_annotate".parse::<ActionMode>().unwrap(),
			ActionMode::OnlyAnnotate
		);
	}

	#[test]
	fn rejects_unknown_mode() {
		let err = "install_everything".parse::<ActionMode>().unwrap_err();
		assert_eq!(err, InvalidAction("install_everything".to_string()));
		assert!(err.to_string().contains("install_everything"));
	}

	#[test]
	fn display_round_trips() {
		for mode in [
			ActionMode::All,
			ActionMode::OnlyInstall,
			ActionMode::InstallWithProvider,
			ActionMode::OnlyProvider,
			ActionMode::OnlyAnnotate,
		] {
			assert_eq!(mode.to_string().parse::<ActionMode>().unwrap(), mode);
		}
	}

	#[test]
	fn serde_uses_snake_case_tokens() {
		let mode: ActionMode = serde_json::from_str("\"install_with_provider\"").unwrap();
		assert_eq!(mode, ActionMode::InstallWithProvider);
	}
}
