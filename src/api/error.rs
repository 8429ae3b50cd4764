use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

use crate::imaging::ImagingError;

/// Body of a 400 for undecodable uploads; existing clients match on it.
pub const INVALID_IMAGE_BODY: &str = "Invalid image";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Imaging(#[from] ImagingError),

    #[error("Missing multipart field '{0}'")]
    MissingField(&'static str),

    #[error("{message}")]
    Rejected { status: StatusCode, message: String },

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Imaging(e) => match e {
                ImagingError::InvalidImage(_)
                | ImagingError::InvalidColorFormat(_)
                | ImagingError::InvalidBase64(_) => StatusCode::BAD_REQUEST,
                ImagingError::InvalidGeometry(_) | ImagingError::InvalidParameter(_) => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                ImagingError::Encode(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::MissingField(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Rejected { status, .. } => *status,
            ApiError::Task(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            error!("Request failed: {}", self);
            let body = Json(json!({ "detail": "Internal server error" }));
            return (status, body).into_response();
        }

        warn!("Rejecting request ({}): {}", status, self);
        match self {
            ApiError::Imaging(ImagingError::InvalidImage(_)) => {
                (status, INVALID_IMAGE_BODY).into_response()
            }
            other => (status, Json(json!({ "detail": other.to_string() }))).into_response(),
        }
    }
}

macro_rules! impl_from_rejection {
    ($($rejection:ty),* $(,)?) => {
        $(
            impl From<$rejection> for ApiError {
                fn from(rejection: $rejection) -> Self {
                    ApiError::Rejected {
                        status: rejection.status(),
                        message: rejection.body_text(),
                    }
                }
            }
        )*
    };
}

impl_from_rejection!(JsonRejection, QueryRejection, MultipartRejection, MultipartError);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_error_statuses() {
        let invalid_image = ApiError::from(ImagingError::InvalidImage("truncated".to_string()));
        assert_eq!(invalid_image.status(), StatusCode::BAD_REQUEST);

        let bad_color = ApiError::from(ImagingError::InvalidColorFormat("#zz".to_string()));
        assert_eq!(bad_color.status(), StatusCode::BAD_REQUEST);

        let bad_geometry = ApiError::from(ImagingError::InvalidGeometry("radius".to_string()));
        assert_eq!(bad_geometry.status(), StatusCode::UNPROCESSABLE_ENTITY);

        assert_eq!(
            ApiError::MissingField("file").status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn test_rejection_keeps_status() {
        let rejected = ApiError::Rejected {
            status: StatusCode::PAYLOAD_TOO_LARGE,
            message: "too big".to_string(),
        };
        assert_eq!(rejected.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(rejected.to_string(), "too big");
    }

    #[test]
    fn test_invalid_image_response_is_plain_text() {
        let response =
            ApiError::from(ImagingError::InvalidImage("garbage".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers()["content-type"],
            "text/plain; charset=utf-8"
        );
    }
}
