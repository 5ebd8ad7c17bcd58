// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Scripted [`InfraStateSource`] and [`ControlPlane`] for tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use havoc_core::OnboardingRequest;

use crate::client::{ControlPlane, RegistrationResult};
use crate::error::RegistryError;
use crate::poll::InfraStateSource;

#[derive(Default)]
struct State {
	script: VecDeque<bool>,
	attempts: usize,
	fail_next: Option<String>,
}

/// Answers activation queries from a fixed script. Once the script runs out
/// every further query reports not active.
#[derive(Clone, Default)]
pub struct MockStateSource {
	state: Arc<Mutex<State>>,
}

impl MockStateSource {
	pub fn with_script(script: Vec<bool>) -> Self {
		Self {
			state: Arc::new(Mutex::new(State {
				script: script.into(),
				..Default::default()
			})),
		}
	}

	pub fn attempts(&self) -> usize {
		self.state.lock().unwrap().attempts
	}

	/// Next query fails with this message.
	pub fn fail_next(&self, message: &str) {
		self.state.lock().unwrap().fail_next = Some(message.to_string());
	}
}

#[async_trait]
impl InfraStateSource for MockStateSource {
	async fn infra_active(&self, _infra_id: &str) -> Result<bool, RegistryError> {
		let mut state = self.state.lock().unwrap();
		state.attempts += 1;
		if let Some(message) = state.fail_next.take() {
			return Err(RegistryError::Api { message });
		}
		Ok(state.script.pop_front().unwrap_or(false))
	}
}

struct PlaneState {
	calls: Vec<String>,
	manifest: String,
	infra_id: String,
	active_script: VecDeque<bool>,
	fail_environment: Option<String>,
	fail_register: Option<String>,
}

impl Default for PlaneState {
	fn default() -> Self {
		Self {
			calls: Vec::new(),
			manifest: "apiVersion: v1\nkind: ServiceAccount\nmetadata:\n  name: hce\n".to_string(),
			infra_id: "infra-1".to_string(),
			active_script: VecDeque::new(),
			fail_environment: None,
			fail_register: None,
		}
	}
}

/// Scripted control plane: hands out a fixed manifest and infra id, records
/// every call. Activation answers come from a script; once exhausted the
/// infra reports active.
#[derive(Clone, Default)]
pub struct MockControlPlane {
	state: Arc<Mutex<PlaneState>>,
}

impl MockControlPlane {
	pub fn new() -> Self {
		Self::default()
	}

	/// Method names in invocation order.
	pub fn calls(&self) -> Vec<String> {
		self.state.lock().unwrap().calls.clone()
	}

	pub fn set_manifest(&self, manifest: &str) {
		self.state.lock().unwrap().manifest = manifest.to_string();
	}

	/// Answers to `infra_active` before it settles on active.
	pub fn script_active(&self, script: Vec<bool>) {
		self.state.lock().unwrap().active_script = script.into();
	}

	pub fn fail_environment(&self, message: &str) {
		self.state.lock().unwrap().fail_environment = Some(message.to_string());
	}

	pub fn fail_register(&self, message: &str) {
		self.state.lock().unwrap().fail_register = Some(message.to_string());
	}
}

#[async_trait]
impl InfraStateSource for MockControlPlane {
	async fn infra_active(&self, _infra_id: &str) -> Result<bool, RegistryError> {
		let mut state = self.state.lock().unwrap();
		state.calls.push("infra_active".to_string());
		Ok(state.active_script.pop_front().unwrap_or(true))
	}
}

#[async_trait]
impl ControlPlane for MockControlPlane {
	async fn create_environment(&self, _request: &OnboardingRequest) -> Result<(), RegistryError> {
		let mut state = self.state.lock().unwrap();
		state.calls.push("create_environment".to_string());
		if let Some(message) = state.fail_environment.take() {
			return Err(RegistryError::EnvironmentCreateFailed {
				status: 500,
				message,
			});
		}
		Ok(())
	}

	async fn register(
		&self,
		_request: &OnboardingRequest,
	) -> Result<RegistrationResult, RegistryError> {
		let mut state = self.state.lock().unwrap();
		state.calls.push("register".to_string());
		if let Some(message) = state.fail_register.take() {
			return Err(RegistryError::RegistrationFailed { message });
		}
		Ok(RegistrationResult {
			token: "tok".to_string(),
			infra_id: state.infra_id.clone(),
			manifest: state.manifest.clone(),
		})
	}
}
