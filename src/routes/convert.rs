//! PDF upload endpoint.

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    Json,
};
use tracing::debug;

use crate::convert::{convert_upload, ensure_pdf, Upload};
use crate::error::Pdf2MdError;
use crate::output::ConversionResult;
use crate::server::AppState;

/// Multipart field carrying the PDF.
pub const UPLOAD_FIELD: &str = "file";

/// Convert an uploaded PDF to Markdown.
/// POST /convert
///
/// Fields other than `file` are ignored. A `file` field without a filename
/// is treated as a non-PDF upload.
pub async fn convert_pdf(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ConversionResult>, Pdf2MdError> {
    let mut multipart = multipart?;

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(UPLOAD_FIELD) {
            debug!("Skipping multipart field {:?}", field.name());
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        // Reject before buffering the body.
        ensure_pdf(&filename)?;
        let content = field.bytes().await?;

        let upload = Upload { filename, content };
        let result = convert_upload(state.converter.as_ref(), upload, &state.config).await?;
        return Ok(Json(result));
    }

    Err(Pdf2MdError::MissingUpload)
}
