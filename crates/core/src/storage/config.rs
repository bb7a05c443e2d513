//! Object store configuration.

use std::time::Duration;

use folio_shared::config::ObjectStoreSettings;

use super::error::StorageError;

/// Bucket names that show up when an unset variable gets stringified.
const PLACEHOLDER_BUCKET_NAMES: &[&str] = &["undefined", "null"];

/// Connection and naming settings for the image bucket.
///
/// Built once at startup and shared read-only. The bucket name is not checked
/// here; [`BucketConfig::bucket`] validates it on every use so that a bad value
/// surfaces as a storage error instead of a boot failure.
#[derive(Clone)]
pub struct BucketConfig {
    /// Host of the S3 API (no scheme, no port).
    pub endpoint: String,
    /// Port of the S3 API.
    pub port: u16,
    /// Use `https` when talking to (and linking to) the endpoint.
    pub use_tls: bool,
    /// Access key.
    pub access_key: String,
    /// Secret key.
    pub secret_key: String,
    /// Raw bucket name as configured.
    pub bucket_name: String,
    /// Public base URL (subdomain or path-prefix proxy) used for minted links.
    pub public_base_url: Option<String>,
    /// Region passed on bucket creation.
    pub region: String,
    /// Upper bound for a single object store call, retries included.
    pub operation_timeout: Duration,
}

impl BucketConfig {
    /// Region MinIO and AWS use when none is specified.
    pub const DEFAULT_REGION: &'static str = "us-east-1";
    /// Default per-operation timeout.
    pub const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(10);

    /// Create a config for a plain-HTTP endpoint with empty credentials.
    #[must_use]
    pub fn new(endpoint: impl Into<String>, port: u16, bucket_name: impl Into<String>) -> Self {
        Self {
            endpoint: normalize_endpoint(&endpoint.into()),
            port,
            use_tls: false,
            access_key: String::new(),
            secret_key: String::new(),
            bucket_name: bucket_name.into(),
            public_base_url: None,
            region: Self::DEFAULT_REGION.to_string(),
            operation_timeout: Self::DEFAULT_OPERATION_TIMEOUT,
        }
    }

    /// Set TLS.
    #[must_use]
    pub fn with_tls(mut self, use_tls: bool) -> Self {
        self.use_tls = use_tls;
        self
    }

    /// Set access and secret keys.
    #[must_use]
    pub fn with_credentials(
        mut self,
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Self {
        self.access_key = access_key.into();
        self.secret_key = secret_key.into();
        self
    }

    /// Set the public base URL. Blank values are ignored.
    #[must_use]
    pub fn with_public_base_url(mut self, url: Option<String>) -> Self {
        self.public_base_url = url
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty());
        self
    }

    /// Set the bucket region.
    #[must_use]
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    /// Set the per-operation timeout.
    #[must_use]
    pub fn with_operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = timeout;
        self
    }

    /// `https` when TLS is enabled, `http` otherwise.
    #[must_use]
    pub const fn scheme(&self) -> &'static str {
        if self.use_tls { "https" } else { "http" }
    }

    /// `scheme://endpoint:port`, the address of the S3 API.
    #[must_use]
    pub fn endpoint_url(&self) -> String {
        format!("{}://{}:{}", self.scheme(), self.endpoint, self.port)
    }

    /// The trimmed bucket name, or a configuration error if it is unusable.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Configuration`] when the name is empty or a
    /// placeholder such as `undefined`.
    pub fn bucket(&self) -> Result<&str, StorageError> {
        let name = self.bucket_name.trim();
        if name.is_empty() || PLACEHOLDER_BUCKET_NAMES.contains(&name) {
            return Err(StorageError::configuration(
                "bucket name is not set or invalid",
            ));
        }
        Ok(name)
    }
}

impl From<&ObjectStoreSettings> for BucketConfig {
    fn from(settings: &ObjectStoreSettings) -> Self {
        Self::new(&settings.endpoint, settings.port, &settings.bucket_name)
            .with_tls(settings.use_ssl)
            .with_credentials(&settings.access_key, &settings.secret_key)
            .with_public_base_url(settings.public_url.clone())
            .with_region(&settings.region)
            .with_operation_timeout(Duration::from_secs(settings.timeout_secs))
    }
}

impl std::fmt::Debug for BucketConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BucketConfig")
            .field("endpoint", &self.endpoint)
            .field("port", &self.port)
            .field("use_tls", &self.use_tls)
            .field("access_key", &"[hidden]")
            .field("secret_key", &"[hidden]")
            .field("bucket_name", &self.bucket_name)
            .field("public_base_url", &self.public_base_url)
            .field("region", &self.region)
            .field("operation_timeout", &self.operation_timeout)
            .finish()
    }
}

/// Drop a scheme prefix and trailing slashes so `endpoint_url` stays well formed.
fn normalize_endpoint(endpoint: &str) -> String {
    let trimmed = endpoint.trim();
    let without_scheme = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .unwrap_or(trimmed);
    without_scheme.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_defaults() {
        let config = BucketConfig::new("localhost", 9000, "project-images");
        assert_eq!(config.region, "us-east-1");
        assert!(!config.use_tls);
        assert!(config.public_base_url.is_none());
        assert_eq!(
            config.operation_timeout,
            BucketConfig::DEFAULT_OPERATION_TIMEOUT
        );
    }

    #[test]
    fn test_endpoint_url() {
        let plain = BucketConfig::new("10.0.0.5", 9000, "b");
        assert_eq!(plain.endpoint_url(), "http://10.0.0.5:9000");

        let tls = BucketConfig::new("minio.example.com", 443, "b").with_tls(true);
        assert_eq!(tls.endpoint_url(), "https://minio.example.com:443");
    }

    #[rstest]
    #[case("http://minio.local", "minio.local")]
    #[case("https://minio.local/", "minio.local")]
    #[case("  minio.local  ", "minio.local")]
    fn test_endpoint_normalized(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(BucketConfig::new(raw, 9000, "b").endpoint, expected);
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("undefined")]
    #[case(" null ")]
    fn test_invalid_bucket_names(#[case] name: &str) {
        let config = BucketConfig::new("localhost", 9000, name);
        assert!(matches!(
            config.bucket(),
            Err(StorageError::Configuration(_))
        ));
    }

    #[test]
    fn test_bucket_name_trimmed() {
        let config = BucketConfig::new("localhost", 9000, "  project-images ");
        assert_eq!(config.bucket().unwrap(), "project-images");
    }

    #[test]
    fn test_blank_public_url_ignored() {
        let config =
            BucketConfig::new("localhost", 9000, "b").with_public_base_url(Some("  ".into()));
        assert!(config.public_base_url.is_none());
    }

    #[test]
    fn test_from_settings() {
        let settings = ObjectStoreSettings {
            endpoint: "https://minio.internal/".to_string(),
            use_ssl: true,
            public_url: Some("https://img.example.com".to_string()),
            timeout_secs: 3,
            ..ObjectStoreSettings::default()
        };
        let config = BucketConfig::from(&settings);
        assert_eq!(config.endpoint_url(), "https://minio.internal:9000");
        assert_eq!(config.bucket().unwrap(), "project-images");
        assert_eq!(config.access_key, "minioadmin");
        assert_eq!(config.operation_timeout, Duration::from_secs(3));
        assert_eq!(
            config.public_base_url.as_deref(),
            Some("https://img.example.com")
        );
    }

    #[test]
    fn test_debug_hides_secret() {
        let config = BucketConfig::new("localhost", 9000, "b").with_credentials("ak", "sk-secret");
        let printed = format!("{config:?}");
        assert!(!printed.contains("sk-secret"));
    }
}
