//! Error types for the pdf2md-server crate.
//!
//! Two error types reflect the two layers a conversion crosses:
//!
//! * [`Pdf2MdError`] — what a request (or server startup) fails with. Every
//!   variant maps to exactly one HTTP status and a `{"detail": ...}` body via
//!   its [`IntoResponse`] impl.
//!
//! * [`ConverterError`] — what the external conversion capability fails
//!   with. The handler does not classify these further: they all collapse
//!   into [`Pdf2MdError::ConversionFailed`] carrying the converter's message.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;
use tracing::warn;

/// Fixed detail returned for uploads without a `.pdf` extension.
pub const INVALID_INPUT_DETAIL: &str = "Only PDF files are supported";

/// All request-level and startup errors of the server.
#[derive(Debug, Error)]
pub enum Pdf2MdError {
    // ── Request errors ────────────────────────────────────────────────────
    /// The uploaded filename does not end in `.pdf` (case-insensitive).
    #[error("Only PDF files are supported")]
    InvalidInput { filename: String },

    /// The multipart request did not carry a `file` field.
    #[error("Missing multipart field 'file'")]
    MissingUpload,

    /// The multipart layer rejected the body (malformed, too large, …).
    #[error("{detail}")]
    UploadRejected { status: StatusCode, detail: String },

    /// Staging or converting the upload failed.
    #[error("Conversion failed: {message}")]
    ConversionFailed { message: String },

    // ── Startup errors ────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Binding or serving the listener failed.
    #[error("Server I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Pdf2MdError {
    /// Wrap any displayable failure as a [`Pdf2MdError::ConversionFailed`].
    pub fn conversion(err: impl std::fmt::Display) -> Self {
        Pdf2MdError::ConversionFailed {
            message: err.to_string(),
        }
    }

    /// Filename of the upload this error rejected, if any.
    pub fn rejected_filename(&self) -> Option<&str> {
        match self {
            Pdf2MdError::InvalidInput { filename } => Some(filename),
            _ => None,
        }
    }

    /// HTTP status this error is reported with.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Pdf2MdError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            Pdf2MdError::MissingUpload => StatusCode::UNPROCESSABLE_ENTITY,
            Pdf2MdError::UploadRejected { status, .. } => *status,
            Pdf2MdError::ConversionFailed { .. }
            | Pdf2MdError::InvalidConfig(_)
            | Pdf2MdError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<axum::extract::multipart::MultipartError> for Pdf2MdError {
    fn from(err: axum::extract::multipart::MultipartError) -> Self {
        Pdf2MdError::UploadRejected {
            status: err.status(),
            detail: err.body_text(),
        }
    }
}

impl From<axum::extract::multipart::MultipartRejection> for Pdf2MdError {
    fn from(rejection: axum::extract::multipart::MultipartRejection) -> Self {
        Pdf2MdError::UploadRejected {
            status: rejection.status(),
            detail: rejection.body_text(),
        }
    }
}

impl From<ConverterError> for Pdf2MdError {
    fn from(err: ConverterError) -> Self {
        Pdf2MdError::conversion(err)
    }
}

/// Error body shared by every failing endpoint.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub detail: String,
}

impl IntoResponse for Pdf2MdError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if let Some(filename) = self.rejected_filename() {
            warn!(filename = %filename, "Rejected upload: {}", self);
        }
        let body = ErrorResponse {
            detail: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// A failure reported by a [`crate::converter::DocumentConverter`].
#[derive(Debug, Error)]
pub enum ConverterError {
    /// The converter program could not be started.
    #[error("failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The converter program exited unsuccessfully.
    #[error("'{program}' exited with {status}: {stderr}")]
    Exited {
        program: String,
        status: String,
        stderr: String,
    },

    /// The converter ran but its output could not be read.
    #[error("invalid converter output: {0}")]
    InvalidOutput(String),

    /// The converter was told to write into a directory but left no Markdown there.
    #[error("converter wrote no Markdown file to '{dir}'")]
    NoOutput { dir: PathBuf },

    /// The conversion did not finish within the configured timeout.
    #[error("timed out after {secs}s")]
    Timeout { secs: u64 },

    /// Filesystem error around the conversion.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Free-form failure raised by an in-process converter.
    #[error("{0}")]
    Failed(String),
}
