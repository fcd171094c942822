//! Route definitions.

mod convert;
mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::server::AppState;

pub use convert::{convert_pdf, UPLOAD_FIELD};
pub use health::{health_check, service_info};

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health::service_info))
        .route("/health", get(health::health_check))
        .route("/convert", post(convert::convert_pdf))
        .with_state(state)
}
