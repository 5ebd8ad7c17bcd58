// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Fixed category-to-action catalog.
//!
//! The vocabulary is closed: each chaos resource category carries the IAM
//! actions its experiments need. The tables are immutable static data,
//! initialized at compile time.

use crate::error::PolicyError;

/// A chaos resource category from the closed vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceCategory {
	Ec2,
	Lambda,
	Rds,
	AwsAccessRestrict,
	Az,
	Ebs,
	Ec2State,
	EcsEc2,
	EcsFargate,
	EcsState,
	LambdaPermission,
	Windows,
	All,
}

impl ResourceCategory {
	/// Parses a category token; unknown tokens abort composition.
	pub fn from_token(token: &str) -> Result<Self, PolicyError> {
		match token {
			"ec2" => Ok(Self::Ec2),
			"lambda" => Ok(Self::Lambda),
			"rds" => Ok(Self::Rds),
			"aws-access-restrict" => Ok(Self::AwsAccessRestrict),
			"az" => Ok(Self::Az),
			"ebs" => Ok(Self::Ebs),
			"ec2-state" => Ok(Self::Ec2State),
			"ecs-ec2" => Ok(Self::EcsEc2),
			"ecs-fargate" => Ok(Self::EcsFargate),
			"ecs-state" => Ok(Self::EcsState),
			"lambda-permission" => Ok(Self::LambdaPermission),
			"windows" => Ok(Self::Windows),
			"all" => Ok(Self::All),
			other => Err(PolicyError::UnknownResourceCategory {
				category: other.to_string(),
			}),
		}
	}

	/// The IAM actions this category grants.
	pub fn actions(&self) -> &'static [&'static str] {
		match self {
			Self::Ec2 => EC2_ACTIONS,
			Self::Lambda => LAMBDA_ACTIONS,
			Self::Rds => RDS_ACTIONS,
			Self::AwsAccessRestrict => AWS_ACCESS_RESTRICT_ACTIONS,
			Self::Az => AZ_ACTIONS,
			Self::Ebs => EBS_ACTIONS,
			Self::Ec2State => EC2_STATE_ACTIONS,
			Self::EcsEc2 => ECS_EC2_ACTIONS,
			Self::EcsFargate => ECS_FARGATE_ACTIONS,
			Self::EcsState => ECS_STATE_ACTIONS,
			Self::LambdaPermission => LAMBDA_PERMISSION_ACTIONS,
			Self::Windows => WINDOWS_ACTIONS,
			Self::All => ALL_ACTIONS,
		}
	}
}

static EC2_ACTIONS: &[&str] = &[
	"ssm:GetDocument",
	"ssm:DescribeDocument",
	"ssm:GetParameter",
	"ssm:GetParameters",
	"ssm:SendCommand",
	"ssm:CancelCommand",
	"ssm:CreateDocument",
	"ssm:DeleteDocument",
	"ssm:GetCommandInvocation",
	"ssm:UpdateInstanceInformation",
	"ssm:DescribeInstanceInformation",
	"ec2messages:AcknowledgeMessage",
	"ec2messages:DeleteMessage",
	"ec2messages:FailMessage",
	"ec2messages:GetEndpoint",
	"ec2messages:GetMessages",
	"ec2messages:SendReply",
	"ec2:DescribeInstanceStatus",
	"ec2:DescribeInstances",
];

static LAMBDA_ACTIONS: &[&str] = &[
	"lambda:ListEventSourceMappings",
	"lambda:DeleteEventSourceMapping",
	"lambda:UpdateEventSourceMapping",
	"lambda:CreateEventSourceMapping",
	"lambda:UpdateFunctionConfiguration",
	"lambda:GetFunctionConcurrency",
	"lambda:GetFunction",
	"lambda:DeleteFunctionConcurrency",
	"lambda:PutFunctionConcurrency",
];

static RDS_ACTIONS: &[&str] = &[
	"ec2:DescribeInstanceStatus",
	"ec2:DescribeInstances",
	"rds:DescribeDBClusters",
	"rds:DescribeDBInstances",
	"rds:DeleteDBInstance",
	"rds:RebootDBInstance",
];

static AWS_ACCESS_RESTRICT_ACTIONS: &[&str] = &[
	"ec2:DescribeSecurityGroups",
	"ec2:RevokeSecurityGroupIngress",
	"ec2:AuthorizeSecurityGroupIngress",
	"ec2:RevokeSecurityGroupEgress",
	"ec2:AuthorizeSecurityGroupEgress",
];

static AZ_ACTIONS: &[&str] = &[
	"ec2:DescribeInstanceStatus",
	"ec2:DescribeInstances",
	"ec2:DescribeSubnets",
	"elasticloadbalancing:DetachLoadBalancerFromSubnets",
	"elasticloadbalancing:AttachLoadBalancerToSubnets",
	"elasticloadbalancing:DescribeLoadBalancers",
	"ec2:CreateNetworkAcl",
	"ec2:CreateNetworkAclEntry",
	"ec2:DescribeNetworkAcls",
	"ec2:ReplaceNetworkAclAssociation",
	"ec2:DeleteNetworkAcl",
];

static EBS_ACTIONS: &[&str] = &[
	"ec2:AttachVolume",
	"ec2:DetachVolume",
	"ec2:DescribeVolumes",
	"ec2:DescribeInstanceStatus",
	"ec2:DescribeInstances",
];

static EC2_STATE_ACTIONS: &[&str] = &[
	"ec2:StartInstances",
	"ec2:StopInstances",
	"ec2:DescribeInstanceStatus",
	"ec2:DescribeInstances",
	"autoscaling:DescribeAutoScalingInstances",
];

static ECS_EC2_ACTIONS: &[&str] = &[
	"ssm:GetDocument",
	"ssm:DescribeDocument",
	"ssm:GetParameter",
	"ssm:GetParameters",
	"ssm:SendCommand",
	"ssm:CancelCommand",
	"ssm:CreateDocument",
	"ssm:DeleteDocument",
	"ssm:GetCommandInvocation",
	"ssm:UpdateInstanceInformation",
	"ssm:DescribeInstanceInformation",
	"ec2messages:AcknowledgeMessage",
	"ec2messages:DeleteMessage",
	"ec2messages:FailMessage",
	"ec2messages:GetEndpoint",
	"ec2messages:GetMessages",
	"ec2messages:SendReply",
	"ec2:DescribeInstanceStatus",
	"ec2:DescribeInstances",
];

static ECS_FARGATE_ACTIONS: &[&str] = &[
	"ecs:DescribeTasks",
	"ecs:DescribeServices",
	"ecs:DescribeTaskDefinition",
	"ecs:RegisterTaskDefinition",
	"ecs:UpdateService",
	"ecs:ListTasks",
	"ecs:DeregisterTaskDefinition",
	"iam:PassRole",
];

static ECS_STATE_ACTIONS: &[&str] = &[
	"ecs:ListServices",
	"ecs:ListTasks",
	"ecs:StopTask",
	"ecs:DescribeServices",
	"ecs:DescribeTasks",
	"ecs:ListContainerInstances",
	"ecs:DescribeContainerInstances",
	"ec2:StartInstances",
	"ec2:StopInstances",
	"ec2:DescribeInstanceStatus",
	"ec2:DescribeInstances",
	"autoscaling:DescribeAutoScalingInstances",
];

static LAMBDA_PERMISSION_ACTIONS: &[&str] = &[
	"iam:PassRole",
	"lambda:GetFunction",
	"lambda:UpdateFunctionConfiguration",
	"iam:AttachRolePolicy",
	"iam:DetachRolePolicy",
	"iam:ListAttachedRolePolicies",
	"iam:GetRolePolicy",
];

static WINDOWS_ACTIONS: &[&str] = &[
	"ssm:GetDocument",
	"ssm:DescribeDocument",
	"ssm:GetParameter",
	"ssm:GetParameters",
	"ssm:SendCommand",
	"ssm:CancelCommand",
	"ssm:CreateDocument",
	"ssm:DeleteDocument",
	"ssm:GetCommandInvocation",
	"ssm:UpdateInstanceInformation",
	"ssm:DescribeInstanceInformation",
	"ec2messages:AcknowledgeMessage",
	"ec2messages:DeleteMessage",
	"ec2messages:FailMessage",
	"ec2messages:GetEndpoint",
	"ec2messages:GetMessages",
	"ec2messages:SendReply",
	"ec2:DescribeInstanceStatus",
	"ec2:DescribeInstances",
];

static ALL_ACTIONS: &[&str] = &[
	"ec2:StartInstances",
	"ec2:StopInstances",
	"ec2:AttachVolume",
	"ec2:DetachVolume",
	"ec2:DescribeVolumes",
	"ec2:DescribeSubnets",
	"ec2:DescribeInstanceStatus",
	"ec2:DescribeInstances",
	"ec2messages:AcknowledgeMessage",
	"ec2messages:DeleteMessage",
	"ec2messages:FailMessage",
	"ec2messages:GetEndpoint",
	"ec2messages:GetMessages",
	"ec2messages:SendReply",
	"ec2:AuthorizeSecurityGroupEgress",
	"ec2:RevokeSecurityGroupEgress",
	"ec2:RevokeSecurityGroupIngress",
	"ec2:DescribeSecurityGroups",
	"autoscaling:DescribeAutoScalingInstances",
	"ssm:GetDocument",
	"ssm:DescribeDocument",
	"ssm:GetParameter",
	"ssm:GetParameters",
	"ssm:SendCommand",
	"ssm:CancelCommand",
	"ssm:CreateDocument",
	"ssm:DeleteDocument",
	"ssm:GetCommandInvocation",
	"ssm:UpdateInstanceInformation",
	"ssm:DescribeInstanceInformation",
	"ecs:UpdateContainerInstancesState",
	"ecs:RegisterContainerInstance",
	"ecs:ListContainerInstances",
	"ecs:DeregisterContainerInstance",
	"ecs:DescribeContainerInstances",
	"ecs:ListTasks",
	"ecs:DescribeClusters",
	"ecs:ListServices",
	"ecs:StopTask",
	"ecs:DescribeServices",
	"ecs:DescribeTaskDefinition",
	"ecs:RegisterTaskDefinition",
	"ecs:DeregisterTaskDefinition",
	"ecs:UpdateService",
	"ecs:DescribeTasks",
	"elasticloadbalancing:DetachLoadBalancerFromSubnets",
	"elasticloadbalancing:AttachLoadBalancerToSubnets",
	"elasticloadbalancing:DescribeLoadBalancers",
	"lambda:ListEventSourceMappings",
	"lambda:DeleteEventSourceMapping",
	"lambda:UpdateEventSourceMapping",
	"lambda:CreateEventSourceMapping",
	"lambda:UpdateFunctionConfiguration",
	"lambda:GetFunctionConcurrency",
	"lambda:GetFunction",
	"lambda:DeleteFunctionConcurrency",
	"lambda:PutFunctionConcurrency",
	"lambda:DeleteLayerVersion",
	"lambda:GetLayerVersion",
	"lambda:ListLayerVersions",
	"rds:DescribeDBClusters",
	"rds:DescribeDBInstances",
	"rds:DeleteDBInstance",
	"rds:RebootDBInstance",
];

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn every_token_round_trips() {
		for (token, category) in [
			("ec2", ResourceCategory::Ec2),
			("lambda", ResourceCategory::Lambda),
			("rds", ResourceCategory::Rds),
			("aws-access-restrict", ResourceCategory::AwsAccessRestrict),
			("az", ResourceCategory::Az),
			("ebs", ResourceCategory::Ebs),
			("ec2-state", ResourceCategory::Ec2State),
			("ecs-ec2", ResourceCategory::EcsEc2),
			("ecs-fargate", ResourceCategory::EcsFargate),
			("ecs-state", ResourceCategory::EcsState),
			("lambda-permission", ResourceCategory::LambdaPermission),
			("windows", ResourceCategory::Windows),
			("all", ResourceCategory::All),
		] {
			assert_eq!(ResourceCategory::from_token(token).unwrap(), category);
			assert!(!category.actions().is_empty());
		}
	}

	#[test]
	fn tokens_are_case_sensitive() {
		assert!(ResourceCategory::from_token("EC2").is_err());
	}
}
