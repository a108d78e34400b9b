//! Configuration loading

use anyhow::{Context, Result};
use axum_server::tls_rustls::RustlsConfig;
use filament_core::ComponentConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub daemon: DaemonConfig,
    /// Resources to host
    #[serde(default, rename = "component")]
    pub components: Vec<ComponentConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Bind address for web server
    #[serde(default = "default_bind")]
    pub bind: String,
    /// TLS configuration (optional - enables HTTPS when present)
    #[serde(default)]
    pub tls: Option<TlsConfig>,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            tls: None,
        }
    }
}

/// TLS/HTTPS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TlsConfig {
    /// Path to certificate file (PEM format)
    pub cert: String,
    /// Path to private key file (PEM format)
    pub key: String,
}

impl TlsConfig {
    /// Read the PEM pair, failing with the path of whichever file is absent
    pub async fn load(&self) -> Result<RustlsConfig> {
        for (what, path) in [("certificate", &self.cert), ("key", &self.key)] {
            if !Path::new(path).is_file() {
                anyhow::bail!("TLS {} not found: {}", what, path);
            }
        }
        RustlsConfig::from_pem_file(&self.cert, &self.key)
            .await
            .with_context(|| format!("Invalid TLS pair {} / {}", self.cert, self.key))
    }
}

fn default_bind() -> String {
    "0.0.0.0:8081".to_string()
}

/// Load configuration from file, falling back to defaults if it does not exist
pub fn load_config(path: &Path) -> Result<Config> {
    if path.exists() {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        info!(
            path = %path.display(),
            components = config.components.len(),
            "Loaded configuration"
        );
        Ok(config)
    } else {
        info!(
            path = %path.display(),
            "Configuration file not found, using defaults"
        );
        Ok(Config::default())
    }
}
