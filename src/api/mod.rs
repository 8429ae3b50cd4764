// HTTP surface - one handler per transformation
pub mod drawing;
mod error;
pub mod filters;

pub use error::{ApiError, INVALID_IMAGE_BODY};

use axum::{
    http::{StatusCode, header},
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};

use crate::imaging::ImagingError;

#[derive(Debug, Serialize, Deserialize)]
pub struct WelcomeResponse {
    pub message: String,
}

/// Existing clients match on this exact text, so it does not follow `app.name`.
pub const WELCOME_MESSAGE: &str = "Welcome to PixelPlus Backend!";

pub async fn welcome_handler() -> Json<WelcomeResponse> {
    Json(WelcomeResponse {
        message: WELCOME_MESSAGE.to_string(),
    })
}

/// Run CPU-bound image work off the async executor.
pub(crate) async fn run_blocking<T, F>(task: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ImagingError> + Send + 'static,
    T: Send + 'static,
{
    Ok(tokio::task::spawn_blocking(task).await??)
}

pub(crate) fn png_response(png: Vec<u8>) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "image/png"),
            (header::CACHE_CONTROL, "no-store"),
        ],
        png,
    )
        .into_response()
}
