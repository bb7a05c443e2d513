//! Public URL construction for stored objects.

use super::config::BucketConfig;

/// Absolute, unsigned URL for `object` in `bucket`.
///
/// With a public base URL the link goes through it (subdomain and path-prefix
/// proxies look the same here); otherwise it points straight at the endpoint.
/// The link only works while the bucket's anonymous-read policy is in place.
#[must_use]
pub fn resolve_object_url(config: &BucketConfig, bucket: &str, object: &str) -> String {
    match config.public_base_url.as_deref() {
        Some(base) => format!("{}/{bucket}/{object}", base.trim_end_matches('/')),
        None => format!("{}/{bucket}/{object}", config.endpoint_url()),
    }
}
