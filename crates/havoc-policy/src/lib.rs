// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! IAM policy composition for chaos resource categories.
//!
//! Each category in the closed vocabulary maps to a fixed list of IAM
//! actions. [`compose`] unions the actions of the requested categories into a
//! single minimal policy document; duplicate actions collapse silently since
//! the same action legitimately appears in several categories. Composition is
//! a pure transformation with no side effects.

pub mod catalog;
pub mod error;

pub use catalog::ResourceCategory;
pub use error::PolicyError;

use std::collections::BTreeSet;

use serde::Serialize;

/// Pinned IAM policy language version.
pub const POLICY_VERSION: &str = "2012-10-17";

/// One statement of a composed policy: a single allowed action on `*`.
#[derive(Debug, Clone, Serialize)]
pub struct Statement {
	#[serde(rename = "Effect")]
	pub effect: &'static str,
	#[serde(rename = "Action")]
	pub action: Vec<String>,
	#[serde(rename = "Resource")]
	pub resource: &'static str,
}

/// A minimal IAM policy document composed from resource categories.
#[derive(Debug, Clone, Serialize)]
pub struct ComposedPolicy {
	#[serde(rename = "Version")]
	pub version: &'static str,
	#[serde(rename = "Statement")]
	pub statement: Vec<Statement>,
}

impl ComposedPolicy {
	/// All allowed actions, in statement order.
	pub fn actions(&self) -> impl Iterator<Item = &str> {
		self
			.statement
			.iter()
			.flat_map(|s| s.action.iter().map(String::as_str))
	}

	/// Serializes the policy document to JSON.
	pub fn to_json(&self) -> Result<String, PolicyError> {
		serde_json::to_string(self).map_err(|e| PolicyError::Serialize(e.to_string()))
	}
}

/// Unions the action sets of the given categories into one policy.
///
/// Fails with [`PolicyError::UnknownResourceCategory`] on the first token
/// outside the closed vocabulary, before anything else happens. The action
/// set is deduplicated and ordering of the input is irrelevant.
pub fn compose(categories: &[&str]) -> Result<ComposedPolicy, PolicyError> {
	let mut actions: BTreeSet<&'static str> = BTreeSet::new();
	for token in categories {
		let category = ResourceCategory::from_token(token)?;
		actions.extend(category.actions());
	}

	let statement = actions
		.into_iter()
		.map(|action| Statement {
			effect: "Allow",
			action: vec![action.to_string()],
			resource: "*",
		})
		.collect();

	Ok(ComposedPolicy {
		version: POLICY_VERSION,
		statement,
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::collections::BTreeSet;

	fn action_set(policy: &ComposedPolicy) -> BTreeSet<&str> {
		policy.actions().collect()
	}

	#[test]
	fn single_category_matches_its_table() {
		let policy = compose(&["rds"]).unwrap();
		let expected: BTreeSet<&str> = ResourceCategory::Rds.actions().iter().copied().collect();
		assert_eq!(action_set(&policy), expected);
	}

	#[test]
	fn union_of_two_categories_has_no_duplicates() {
		// ec2 and rds overlap on the Describe* instance actions.
		let policy = compose(&["ec2", "rds"]).unwrap();
		let mut expected: BTreeSet<&str> = ResourceCategory::Ec2.actions().iter().copied().collect();
		expected.extend(ResourceCategory::Rds.actions());
		assert_eq!(action_set(&policy), expected);

		let all: Vec<&str> = policy.actions().collect();
		let unique: BTreeSet<&str> = all.iter().copied().collect();
		assert_eq!(all.len(), unique.len());
	}

	#[test]
	fn composition_is_order_insensitive() {
		let a = compose(&["ec2", "lambda", "ebs"]).unwrap();
		let b = compose(&["ebs", "ec2", "lambda"]).unwrap();
		assert_eq!(action_set(&a), action_set(&b));
	}

	#[test]
	fn repeated_categories_collapse() {
		let once = compose(&["lambda"]).unwrap();
		let twice = compose(&["lambda", "lambda"]).unwrap();
		assert_eq!(action_set(&once), action_set(&twice));
	}

	#[test]
	fn unknown_category_fails_naming_the_token() {
		let err = compose(&["ec2", "dynamodb"]).unwrap_err();
		match err {
			PolicyError::UnknownResourceCategory { category } => {
				assert_eq!(category, "dynamodb");
			}
			other => panic!("unexpected error: {other}"),
		}
	}

	#[test]
	fn every_statement_allows_one_action_on_wildcard() {
		let policy = compose(&["az"]).unwrap();
		assert_eq!(policy.version, POLICY_VERSION);
		for statement in &policy.statement {
			assert_eq!(statement.effect, "Allow");
			assert_eq!(statement.resource, "*");
			assert_eq!(statement.action.len(), 1);
		}
	}

	#[test]
	fn document_serializes_with_aws_field_names() {
		let policy = compose(&["ebs"]).unwrap();
		let doc = policy.to_json().unwrap();
		let value: serde_json::Value = serde_json::from_str(&doc).unwrap();
		assert_eq!(value["Version"], POLICY_VERSION);
		assert!(value["Statement"].is_array());
		assert_eq!(value["Statement"][0]["Effect"], "Allow");
		assert_eq!(value["Statement"][0]["Resource"], "*");
	}

	#[test]
	fn all_category_covers_ec2_state() {
		let all = compose(&["all"]).unwrap();
		let set = action_set(&all);
		for action in ResourceCategory::Ec2State.actions() {
			assert!(set.contains(action), "missing {action}");
		}
	}
}
