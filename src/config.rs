//! Server configuration.
//!
//! Everything the server needs at startup lives in [`ServerConfig`], built
//! via [`ServerConfigBuilder`]. The converter itself is configured separately
//! (see [`crate::converter::CommandConverter`]) and handed to
//! [`crate::server::Application::build`] alongside this struct.

use crate::error::Pdf2MdError;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Default listen address.
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";

/// Default name reported by `GET /`.
pub const DEFAULT_SERVICE_NAME: &str = "Marker API";

/// Default upload limit: 100 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 100 * 1024 * 1024;

/// Configuration for the conversion server.
///
/// # Example
/// ```rust
/// use pdf2md_server::ServerConfig;
///
/// let config = ServerConfig::builder()
///     .bind_addr("127.0.0.1:0".parse().unwrap())
///     .max_upload_bytes(10 * 1024 * 1024)
///     .build()
///     .unwrap();
/// assert_eq!(config.service_name, "Marker API");
/// ```
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address to listen on. Port 0 picks a free port.
    pub bind_addr: SocketAddr,

    /// Name reported by the root endpoint.
    pub service_name: String,

    /// Directory uploads are staged in. `None` uses the system temp dir.
    pub staging_dir: Option<PathBuf>,

    /// Maximum accepted request body size in bytes. Default: 100 MiB.
    ///
    /// axum's own default (2 MB) rejects most scanned documents, so this is
    /// always applied explicitly.
    pub max_upload_bytes: usize,

    /// Upper bound on a single conversion. `None` waits indefinitely.
    pub convert_timeout_secs: Option<u64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8000)),
            service_name: DEFAULT_SERVICE_NAME.to_string(),
            staging_dir: None,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            convert_timeout_secs: None,
        }
    }
}

impl ServerConfig {
    /// Create a new builder for `ServerConfig`.
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder {
            config: Self::default(),
        }
    }

    /// The conversion timeout as a [`Duration`], if one is configured.
    pub fn convert_timeout(&self) -> Option<Duration> {
        self.convert_timeout_secs.map(Duration::from_secs)
    }
}

/// Builder for [`ServerConfig`].
#[derive(Debug)]
pub struct ServerConfigBuilder {
    config: ServerConfig,
}

impl ServerConfigBuilder {
    pub fn bind_addr(mut self, addr: SocketAddr) -> Self {
        self.config.bind_addr = addr;
        self
    }

    pub fn service_name(mut self, name: impl Into<String>) -> Self {
        self.config.service_name = name.into();
        self
    }

    pub fn staging_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.staging_dir = Some(dir.into());
        self
    }

    pub fn max_upload_bytes(mut self, bytes: usize) -> Self {
        self.config.max_upload_bytes = bytes;
        self
    }

    pub fn convert_timeout_secs(mut self, secs: u64) -> Self {
        self.config.convert_timeout_secs = Some(secs);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ServerConfig, Pdf2MdError> {
        let c = &self.config;
        if c.service_name.trim().is_empty() {
            return Err(Pdf2MdError::InvalidConfig(
                "Service name must not be empty".into(),
            ));
        }
        if c.max_upload_bytes == 0 {
            return Err(Pdf2MdError::InvalidConfig(
                "Upload limit must be ≥ 1 byte".into(),
            ));
        }
        if c.convert_timeout_secs == Some(0) {
            return Err(Pdf2MdError::InvalidConfig(
                "Conversion timeout must be ≥ 1 second".into(),
            ));
        }
        if let Some(ref dir) = c.staging_dir {
            if !dir.is_dir() {
                return Err(Pdf2MdError::InvalidConfig(format!(
                    "Staging directory '{}' does not exist",
                    dir.display()
                )));
            }
        }
        Ok(self.config)
    }
}
