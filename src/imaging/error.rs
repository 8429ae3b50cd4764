use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImagingError {
    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("Invalid color format: {0}")]
    InvalidColorFormat(String),

    #[error("Invalid base64 payload: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Encoding error: {0}")]
    Encode(#[source] image::ImageError),
}
