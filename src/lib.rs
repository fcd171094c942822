//! # pdf2md-server
//!
//! An HTTP service that converts uploaded PDF documents to Markdown by
//! delegating to an external conversion engine (by default
//! [marker](https://github.com/VikParuchuri/marker)'s `marker_single`).
//!
//! ## Request Lifecycle
//!
//! ```text
//! POST /convert (multipart "file")
//!  │
//!  ├─ 1. Validate  filename must end in .pdf (400 otherwise)
//!  ├─ 2. Stage     bytes → uniquely named upload-*.pdf temp file
//!  ├─ 3. Convert   DocumentConverter::convert(path)
//!  ├─ 4. Clean up  temp file removed on every path
//!  └─ 5. Respond   {"markdown": …, "filename": …}  (500 on any failure)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf2md_server::{Application, CommandConverter, ServerConfig};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServerConfig::builder()
//!         .bind_addr("127.0.0.1:8000".parse()?)
//!         .build()?;
//!     let app = Application::build(config, Arc::new(CommandConverter::marker())).await?;
//!     app.run_until_stopped().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2md-server` binary (clap + anyhow + tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod converter;
pub mod error;
pub mod middleware;
pub mod output;
pub mod routes;
pub mod server;
pub mod staging;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ServerConfig, ServerConfigBuilder};
pub use convert::{convert_upload, is_pdf_filename, Upload};
pub use converter::{CommandConverter, ConverterOutput, DocumentConverter, StdoutFormat};
pub use error::{ConverterError, Pdf2MdError};
pub use output::{ConversionResult, HealthStatus, ServiceInfo};
pub use server::{create_router, AppState, Application};
