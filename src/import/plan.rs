//! Static mapping from discovered backend resources to Terraform addresses.

use crate::discovery::DiscoveredBackend;
use std::fmt;

/// Name of the inline policy attached to the backend role
pub const ROLE_POLICY_NAME: &str = "terraform-state-files-policy";

/// Addresses bound to the bucket name, in import order
pub const BUCKET_ADDRESSES: [&str; 5] = [
    "aws_s3_bucket.terraform_state",
    "aws_s3_bucket_versioning.terraform_state_versioning",
    "aws_s3_bucket_server_side_encryption_configuration.terraform_state_encryption",
    "aws_s3_bucket_public_access_block.terraform_state_pab",
    "aws_s3_bucket_lifecycle_configuration.terraform_state_lifecycle",
];

pub const ROLE_ADDRESS: &str = "aws_iam_role.terraform_state_role";
pub const ROLE_POLICY_ADDRESS: &str = "aws_iam_role_policy.terraform_state_policy";

/// One `terraform import <address> <id>` to perform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportOperation {
    pub address: String,
    pub id: String,
}

impl ImportOperation {
    pub fn new(address: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            id: id.into(),
        }
    }
}

impl fmt::Display for ImportOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <- {}", self.address, self.id)
    }
}

/// Ordered list of imports for one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportPlan {
    operations: Vec<ImportOperation>,
}

impl ImportPlan {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build the plan for a bucket/role pair.
    ///
    /// The backend is imported as a unit: if either side is missing the plan is empty.
    pub fn build(bucket: Option<&str>, role: Option<&str>) -> Self {
        let (Some(bucket), Some(role)) = (bucket, role) else {
            return Self::empty();
        };

        let mut operations: Vec<ImportOperation> = BUCKET_ADDRESSES
            .iter()
            .map(|address| ImportOperation::new(*address, bucket))
            .collect();

        operations.push(ImportOperation::new(ROLE_ADDRESS, role));
        operations.push(ImportOperation::new(
            ROLE_POLICY_ADDRESS,
            role_policy_id(role),
        ));

        Self { operations }
    }

    pub fn from_discovery(discovered: &DiscoveredBackend) -> Self {
        Self::build(discovered.bucket.as_deref(), discovered.role.as_deref())
    }

    pub fn operations(&self) -> &[ImportOperation] {
        &self.operations
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

/// Inline role policies are imported as `<role>:<policy>`
pub fn role_policy_id(role: &str) -> String {
    format!("{}:{}", role, ROLE_POLICY_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_discovery_yields_empty_plan() {
        assert!(ImportPlan::build(None, None).is_empty());
        assert!(ImportPlan::build(Some("bucket"), None).is_empty());
        assert!(ImportPlan::build(None, Some("role")).is_empty());
    }

    #[test]
    fn test_full_plan_order_and_ids() {
        let plan = ImportPlan::build(
            Some("acme-state-files-prod-a1b2"),
            Some("acme-state-files-prod-role"),
        );

        let expected = vec![
            ImportOperation::new("aws_s3_bucket.terraform_state", "acme-state-files-prod-a1b2"),
            ImportOperation::new(
                "aws_s3_bucket_versioning.terraform_state_versioning",
                "acme-state-files-prod-a1b2",
            ),
            ImportOperation::new(
                "aws_s3_bucket_server_side_encryption_configuration.terraform_state_encryption",
                "acme-state-files-prod-a1b2",
            ),
            ImportOperation::new(
                "aws_s3_bucket_public_access_block.terraform_state_pab",
                "acme-state-files-prod-a1b2",
            ),
            ImportOperation::new(
                "aws_s3_bucket_lifecycle_configuration.terraform_state_lifecycle",
                "acme-state-files-prod-a1b2",
            ),
            ImportOperation::new(
                "aws_iam_role.terraform_state_role",
                "acme-state-files-prod-role",
            ),
            ImportOperation::new(
                "aws_iam_role_policy.terraform_state_policy",
                "acme-state-files-prod-role:terraform-state-files-policy",
            ),
        ];

        assert_eq!(plan.len(), 7);
        assert_eq!(plan.operations(), expected.as_slice());
    }

    #[test]
    fn test_from_discovery() {
        let discovered = DiscoveredBackend {
            bucket: Some("b".to_string()),
            role: None,
        };
        assert!(ImportPlan::from_discovery(&discovered).is_empty());

        let discovered = DiscoveredBackend {
            bucket: Some("b".to_string()),
            role: Some("r".to_string()),
        };
        let plan = ImportPlan::from_discovery(&discovered);
        assert_eq!(plan.operations().last().unwrap().id, "r:terraform-state-files-policy");
    }
}
