//! Configuration loading and types for Waypost.
//!
//! Configuration is read from a YAML file and deserialized into the
//! [`Config`] struct.  Each subsection governs a different part of the
//! system: networking, authorization, object storage, listing behavior,
//! and static asset serving.

use serde::Deserialize;
use std::path::Path;

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Authorization settings.
    #[serde(default)]
    pub auth: AuthConfig,

    /// Object storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Listing behavior for GET /location.
    #[serde(default)]
    pub listing: ListingConfig,

    /// Static asset serving settings.
    #[serde(default)]
    pub assets: AssetsConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind host address.
    #[serde(default = "default_host")]
    pub host: String,

    /// Bind port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Graceful shutdown timeout in seconds.
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            shutdown_timeout: default_shutdown_timeout(),
        }
    }
}

/// Authorization settings.
///
/// The listing endpoint compares the `password` request header against
/// `auth.password`.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Shared secret required on protected routes.
    #[serde(default = "default_password")]
    pub password: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            password: default_password(),
        }
    }
}

/// Object storage backend configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Backend type: `memory` or `aws`.
    #[serde(default = "default_storage_backend")]
    pub backend: String,

    /// Memory store configuration.
    #[serde(default)]
    pub memory: MemoryStorageConfig,

    /// AWS S3 configuration.
    #[serde(default)]
    pub aws: Option<AwsStorageConfig>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_storage_backend(),
            memory: MemoryStorageConfig::default(),
            aws: None,
        }
    }
}

/// In-memory store configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MemoryStorageConfig {
    /// Whether the store retains historical versions of overwritten keys.
    #[serde(default = "default_true")]
    pub versioned: bool,
}

impl Default for MemoryStorageConfig {
    fn default() -> Self {
        Self {
            versioned: default_true(),
        }
    }
}

/// AWS S3 store configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AwsStorageConfig {
    /// Backing S3 bucket name.
    pub bucket: String,
    /// AWS region.
    #[serde(default = "default_region")]
    pub region: String,
    /// Key prefix in the backing bucket.
    #[serde(default)]
    pub prefix: String,
    /// Custom S3-compatible endpoint (e.g. MinIO, LocalStack).
    #[serde(default)]
    pub endpoint_url: String,
    /// Force path-style URL addressing.
    #[serde(default)]
    pub use_path_style: bool,
    /// Explicit AWS access key (falls back to env/credential chain).
    #[serde(default)]
    pub access_key_id: String,
    /// Explicit AWS secret key (falls back to env/credential chain).
    #[serde(default)]
    pub secret_access_key: String,
}

/// Listing behavior configuration.
///
/// When `include_history` is set and the store retains versions, GET
/// /location returns every stored version of every record rather than
/// just the current object at each key.
#[derive(Debug, Clone, Deserialize)]
pub struct ListingConfig {
    /// Include historical versions in the listing.
    #[serde(default = "default_true")]
    pub include_history: bool,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            include_history: default_true(),
        }
    }
}

/// Static asset serving configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AssetsConfig {
    /// Root directory containing index.html, admin.html and resources/.
    #[serde(default = "default_assets_root")]
    pub root_dir: String,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            root_dir: default_assets_root(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: text or json.
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

// -- Defaults ----------------------------------------------------------------

fn default_true() -> bool {
    true
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_shutdown_timeout() -> u64 {
    30
}

fn default_password() -> String {
    "change-me".to_string()
}

fn default_storage_backend() -> String {
    "memory".to_string()
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_assets_root() -> String {
    "./assets".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

// -- Loader ------------------------------------------------------------------

/// Load and parse configuration from a YAML file at `path`.
pub fn load_config<P: AsRef<Path>>(path: P) -> anyhow::Result<Config> {
    let contents = std::fs::read_to_string(path.as_ref())?;
    let config: Config = serde_yaml::from_str(&contents)?;
    Ok(config)
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_yaml_gives_defaults() {
        let config: Config = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.storage.backend, "memory");
        assert!(config.storage.memory.versioned);
        assert!(config.listing.include_history);
        assert_eq!(config.assets.root_dir, "./assets");
    }

    #[test]
    fn test_aws_section_parsed() {
        let yaml = r#"
storage:
  backend: aws
  aws:
    bucket: checkin-data
    region: eu-west-1
    prefix: "waypost/"
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.storage.backend, "aws");
        let aws = config.storage.aws.unwrap();
        assert_eq!(aws.bucket, "checkin-data");
        assert_eq!(aws.region, "eu-west-1");
        assert_eq!(aws.prefix, "waypost/");
        assert!(!aws.use_path_style);
    }

    #[test]
    fn test_listing_flag_override() {
        let yaml = "listing:\n  include_history: false\n";
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert!(!config.listing.include_history);
    }
}
