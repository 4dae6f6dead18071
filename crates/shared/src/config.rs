//! Application configuration management.

use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    pub server: ServerConfig,
    /// Application-level settings.
    pub app: AppSettings,
    /// Secret link defaults.
    #[serde(default)]
    pub links: LinkConfig,
    /// Cryptographic key material.
    pub crypto: CryptoConfig,
    /// Storage disk registry.
    pub storage: StorageSettings,
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

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Application-level settings.
#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    /// Absolute base URL of this deployment, e.g. `https://files.example.com`.
    ///
    /// Its host is the trust anchor for issuance-time host checks, and its
    /// scheme is used when resolving relative URL-mode targets.
    pub public_url: String,
}

/// Defaults applied when a link is issued without explicit overrides.
#[derive(Debug, Clone, Deserialize)]
pub struct LinkConfig {
    /// Disk used for storage-mode links when the caller passes none.
    /// Falls back to the storage registry's default disk.
    #[serde(default)]
    pub default_disk: Option<String>,
    /// Link lifetime in minutes when the caller passes none.
    #[serde(default = "default_expiry_minutes")]
    pub default_expiry_minutes: i64,
    /// Whether storage-mode links delete the file after a completed download.
    #[serde(default)]
    pub default_delete_after_download: bool,
}

fn default_expiry_minutes() -> i64 {
    60
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            default_disk: None,
            default_expiry_minutes: default_expiry_minutes(),
            default_delete_after_download: false,
        }
    }
}

/// Cryptographic key material configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CryptoConfig {
    /// Base64-encoded 32-byte master key. The token-encryption key and the
    /// URL-signing key are both derived from it.
    pub master_key: String,
}

/// Storage disk registry configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    /// Name of the disk used when a link names none.
    pub default_disk: String,
    /// Named disks, each backed by its own provider.
    pub disks: HashMap<String, DiskProvider>,
}

/// Storage provider configuration for a single disk.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DiskProvider {
    /// Local filesystem.
    Fs {
        /// Root directory path.
        root: PathBuf,
    },
    /// S3-compatible storage: Cloudflare R2, Supabase, AWS S3, DigitalOcean Spaces.
    S3 {
        /// S3 endpoint URL.
        endpoint: String,
        /// S3 bucket name.
        bucket: String,
        /// AWS access key ID.
        access_key_id: String,
        /// AWS secret access key.
        secret_access_key: String,
        /// AWS region.
        region: String,
    },
}

impl DiskProvider {
    /// Create a local filesystem provider.
    #[must_use]
    pub fn fs(root: impl Into<PathBuf>) -> Self {
        Self::Fs { root: root.into() }
    }

    /// Create an S3-compatible provider.
    #[must_use]
    pub fn s3(
        endpoint: impl Into<String>,
        bucket: impl Into<String>,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self::S3 {
            endpoint: endpoint.into(),
            bucket: bucket.into(),
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            region: region.into(),
        }
    }

    /// Get the provider name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Fs { .. } => "fs",
            Self::S3 { .. } => "s3",
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("SECLINK").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
