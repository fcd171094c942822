//! Conversion of one upload, end to end.
//!
//! [`convert_upload`] is the whole request lifecycle minus HTTP:
//!
//! ```text
//! Upload ──▶ validate ──▶ stage ──▶ convert ──▶ cleanup ──▶ normalise
//!           (.pdf?)     (tmp file) (converter) (always)    (into_markdown)
//! ```
//!
//! The cleanup step runs whether the converter succeeded, failed or timed
//! out; only a failed validation skips it, because nothing was staged.

use crate::config::ServerConfig;
use crate::converter::{ConverterOutput, DocumentConverter};
use crate::error::{ConverterError, Pdf2MdError};
use crate::output::ConversionResult;
use crate::staging::StagedUpload;
use axum::body::Bytes;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// A file received in one request.
#[derive(Debug, Clone)]
pub struct Upload {
    pub filename: String,
    pub content: Bytes,
}

impl Upload {
    pub fn new(filename: impl Into<String>, content: impl Into<Bytes>) -> Self {
        Self {
            filename: filename.into(),
            content: content.into(),
        }
    }
}

/// Whether `filename` ends in `.pdf`, ignoring case.
pub fn is_pdf_filename(filename: &str) -> bool {
    filename.to_lowercase().ends_with(".pdf")
}

/// Reject filenames without a `.pdf` extension.
pub fn ensure_pdf(filename: &str) -> Result<(), Pdf2MdError> {
    if is_pdf_filename(filename) {
        Ok(())
    } else {
        Err(Pdf2MdError::InvalidInput {
            filename: filename.to_string(),
        })
    }
}

/// Convert an uploaded PDF to Markdown.
///
/// # Errors
/// - [`Pdf2MdError::InvalidInput`] when the filename is not `.pdf`; nothing
///   is written to disk in that case.
/// - [`Pdf2MdError::ConversionFailed`] when staging or conversion fails.
pub async fn convert_upload(
    converter: &dyn DocumentConverter,
    upload: Upload,
    config: &ServerConfig,
) -> Result<ConversionResult, Pdf2MdError> {
    let total_start = Instant::now();
    let Upload { filename, content } = upload;

    // ── Step 1: Validate ─────────────────────────────────────────────────
    ensure_pdf(&filename)?;
    info!(
        "Starting conversion: {} ({} bytes) via {}",
        filename,
        content.len(),
        converter.name()
    );

    // ── Step 2: Stage ────────────────────────────────────────────────────
    let staged = StagedUpload::write(config.staging_dir.as_deref(), content)
        .await
        .map_err(|e| {
            error!("Failed to stage '{}': {}", filename, e);
            Pdf2MdError::conversion(e)
        })?;

    // ── Step 3: Convert ──────────────────────────────────────────────────
    let outcome = run_converter(converter, staged.path(), config.convert_timeout()).await;

    // ── Step 4: Clean up ─────────────────────────────────────────────────
    if let Err(e) = staged.remove().await {
        warn!("Failed to remove staged upload for '{}': {}", filename, e);
    }

    // ── Step 5: Normalise ────────────────────────────────────────────────
    let output = outcome.map_err(|e| {
        error!("Conversion of '{}' failed: {}", filename, e);
        Pdf2MdError::from(e)
    })?;
    let markdown = output.into_markdown();

    info!(
        "Conversion complete: {} → {} chars in {}ms",
        filename,
        markdown.len(),
        total_start.elapsed().as_millis()
    );

    Ok(ConversionResult { markdown, filename })
}

async fn run_converter(
    converter: &dyn DocumentConverter,
    pdf_path: &Path,
    timeout: Option<Duration>,
) -> Result<ConverterOutput, ConverterError> {
    match timeout {
        Some(limit) => tokio::time::timeout(limit, converter.convert(pdf_path))
            .await
            .map_err(|_| ConverterError::Timeout {
                secs: limit.as_secs(),
            })?,
        None => converter.convert(pdf_path).await,
    }
}
