//! Anonymous-read bucket policy.

use serde::Serialize;

const POLICY_VERSION: &str = "2012-10-17";

/// An S3 bucket policy document.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct AccessPolicy {
    version: &'static str,
    statement: Vec<PolicyStatement>,
}

/// A single `Allow` statement for anonymous principals.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyStatement {
    effect: &'static str,
    principal: Principal,
    action: Vec<&'static str>,
    resource: Vec<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
struct Principal {
    #[serde(rename = "AWS")]
    aws: Vec<&'static str>,
}

impl PolicyStatement {
    fn allow_anyone(action: Vec<&'static str>, resource: String) -> Self {
        Self {
            effect: "Allow",
            principal: Principal { aws: vec!["*"] },
            action,
            resource: vec![resource],
        }
    }
}

impl AccessPolicy {
    /// Public read for every object, plus bucket location and listing.
    ///
    /// Objects become reachable at permanent, unsigned URLs.
    #[must_use]
    pub fn anonymous_read(bucket: &str) -> Self {
        Self {
            version: POLICY_VERSION,
            statement: vec![
                PolicyStatement::allow_anyone(
                    vec!["s3:GetBucketLocation", "s3:ListBucket"],
                    format!("arn:aws:s3:::{bucket}"),
                ),
                PolicyStatement::allow_anyone(
                    vec!["s3:GetObject"],
                    format!("arn:aws:s3:::{bucket}/*"),
                ),
            ],
        }
    }

    /// Serialize to the JSON document sent with `PUT ?policy`.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
