//! Server configuration.
//!
//! Values come from three layers, highest precedence first: command-line
//! flags (or their environment variables), an optional YAML config file,
//! and built-in defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration for the stub server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct ServerConfig {
    /// HTTP port to listen on
    #[serde(default = "default_http_port")]
    pub http_port: u16,

    /// HTTPS port to listen on
    #[serde(default = "default_tls_port")]
    pub tls_port: u16,

    /// TLS certificate file for HTTPS
    #[serde(default)]
    pub tls_cert: Option<PathBuf>,

    /// TLS key file for HTTPS
    #[serde(default)]
    pub tls_key: Option<PathBuf>,

    /// Directory holding the stub JSON files
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Largest request body read for matching, in bytes
    #[serde(default = "default_body_limit")]
    pub body_limit: usize,
}

fn default_http_port() -> u16 {
    8080
}

fn default_tls_port() -> u16 {
    8443
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_body_limit() -> usize {
    1024 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_port: default_http_port(),
            tls_port: default_tls_port(),
            tls_cert: None,
            tls_key: None,
            data_dir: default_data_dir(),
            body_limit: default_body_limit(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from a YAML file.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("unable to read config file {}: {}", path.display(), e))?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> anyhow::Result<Self> {
        // an empty document means "all defaults"
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Apply command-line overrides on top of this configuration.
    pub fn merge(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(port) = overrides.http_port {
            self.http_port = port;
        }
        if let Some(port) = overrides.tls_port {
            self.tls_port = port;
        }
        if overrides.tls_cert.is_some() {
            self.tls_cert = overrides.tls_cert;
        }
        if overrides.tls_key.is_some() {
            self.tls_key = overrides.tls_key;
        }
        if let Some(dir) = overrides.data_dir {
            self.data_dir = dir;
        }
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.http_port == 0 {
            anyhow::bail!("http-port cannot be 0");
        }
        if self.tls_enabled() && self.tls_port == 0 {
            anyhow::bail!("tls-port cannot be 0");
        }
        if self.tls_cert.is_some() != self.tls_key.is_some() {
            anyhow::bail!("tls-cert and tls-key must be set together");
        }
        if self.body_limit == 0 {
            anyhow::bail!("body-limit cannot be 0");
        }
        Ok(())
    }

    /// Whether an HTTPS listener should be started.
    pub fn tls_enabled(&self) -> bool {
        self.tls_cert.is_some() && self.tls_key.is_some()
    }
}

/// Values supplied on the command line; `None` leaves the lower layer alone.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub http_port: Option<u16>,
    pub tls_port: Option<u16>,
    pub tls_cert: Option<PathBuf>,
    pub tls_key: Option<PathBuf>,
    pub data_dir: Option<PathBuf>,
}
