//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// JWT configuration.
    pub jwt: JwtSettings,
    /// Object store configuration.
    #[serde(default)]
    pub object_store: ObjectStoreSettings,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// JWT configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtSettings {
    /// Secret key for signing tokens.
    pub secret: String,
    /// Token expiration in seconds.
    #[serde(default = "default_token_expiry")]
    pub token_expiry_secs: u64,
}

fn default_token_expiry() -> u64 {
    604_800 // 7 days
}

/// Object store (S3-compatible) configuration.
///
/// Loaded as-is; the bucket name is only validated when storage is first used,
/// so a bad value never prevents the server from starting.
#[derive(Clone, Deserialize)]
pub struct ObjectStoreSettings {
    /// Hostname or IP of the S3 API, without scheme or port.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Port of the S3 API (MinIO serves the console on 9001, the API on 9000).
    #[serde(default = "default_object_store_port")]
    pub port: u16,
    /// Whether the API is served over TLS.
    #[serde(default)]
    pub use_ssl: bool,
    /// Access key.
    #[serde(default = "default_credential")]
    pub access_key: String,
    /// Secret key.
    #[serde(default = "default_credential")]
    pub secret_key: String,
    /// Bucket holding uploaded images.
    #[serde(default = "default_bucket_name")]
    pub bucket_name: String,
    /// Public base URL when the store sits behind a reverse proxy or CDN.
    #[serde(default)]
    pub public_url: Option<String>,
    /// Region used when creating the bucket.
    #[serde(default = "default_region")]
    pub region: String,
    /// Per-operation timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ObjectStoreSettings {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            port: default_object_store_port(),
            use_ssl: false,
            access_key: default_credential(),
            secret_key: default_credential(),
            bucket_name: default_bucket_name(),
            public_url: None,
            region: default_region(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl std::fmt::Debug for ObjectStoreSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectStoreSettings")
            .field("endpoint", &self.endpoint)
            .field("port", &self.port)
            .field("use_ssl", &self.use_ssl)
            .field("access_key", &"[hidden]")
            .field("secret_key", &"[hidden]")
            .field("bucket_name", &self.bucket_name)
            .field("public_url", &self.public_url)
            .field("region", &self.region)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

fn default_endpoint() -> String {
    "localhost".to_string()
}

fn default_object_store_port() -> u16 {
    9000
}

fn default_credential() -> String {
    "minioadmin".to_string()
}

fn default_bucket_name() -> String {
    "project-images".to_string()
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

/// Config files for the current `RUN_MODE`, overlaid with `FOLIO__*` variables.
fn sources() -> Result<config::Config, config::ConfigError> {
    let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

    config::Config::builder()
        .add_source(config::File::with_name("config/default").required(false))
        .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
        .add_source(
            config::Environment::with_prefix("FOLIO")
                .separator("__")
                .try_parsing(true),
        )
        .build()
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        sources()?.try_deserialize()
    }
}

impl ObjectStoreSettings {
    /// Loads only the `object_store` section, for tools that never touch
    /// the database.
    ///
    /// # Errors
    ///
    /// Returns an error if the section is present but malformed.
    pub fn load() -> Result<Self, config::ConfigError> {
        match sources()?.get::<Self>("object_store") {
            Ok(settings) => Ok(settings),
            Err(config::ConfigError::NotFound(_)) => Ok(Self::default()),
            Err(e) => Err(e),
        }
    }
}
