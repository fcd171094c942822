//! Response payloads.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Body of a successful `POST /convert`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionResult {
    /// Extracted Markdown text.
    pub markdown: String,
    /// Filename of the upload, as sent by the client.
    pub filename: String,
}

/// Body of `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
}

impl HealthStatus {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }
}

/// Body of `GET /`: service identity and the routes it serves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceInfo {
    pub name: String,
    pub version: String,
    pub endpoints: BTreeMap<String, String>,
}

impl ServiceInfo {
    pub fn new(name: impl Into<String>) -> Self {
        let endpoints = BTreeMap::from([
            (
                "/convert".to_string(),
                "POST - Convert PDF to Markdown".to_string(),
            ),
            ("/health".to_string(), "GET - Health check".to_string()),
        ]);
        Self {
            name: name.into(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            endpoints,
        }
    }
}
