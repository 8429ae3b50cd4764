use crate::Config;
use crate::imaging::text::check_face;
use axum::http::HeaderValue;
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Debug, Error)]
pub enum StartupCheckError {
    #[error("Font file missing for face {face}: {path}")]
    FontFileMissing { face: u32, path: String },

    #[error("Invalid font face number: {0}")]
    InvalidFontFace(u32),

    #[error("Invalid limit: {0}")]
    InvalidLimit(String),

    #[error("Invalid CORS origin: {0}")]
    InvalidCorsOrigin(String),
}

impl StartupCheckError {
    /// Critical failures stop the server; the rest only degrade text rendering.
    pub fn is_critical(&self) -> bool {
        matches!(
            self,
            StartupCheckError::InvalidLimit(_) | StartupCheckError::InvalidCorsOrigin(_)
        )
    }
}

pub async fn perform_startup_checks(config: &Config) -> Result<(), Vec<StartupCheckError>> {
    let mut errors = Vec::new();

    info!("Performing startup checks...");

    // Limits
    let limits = &config.limits;
    if limits.max_upload_bytes == 0 {
        errors.push(StartupCheckError::InvalidLimit(
            "max_upload_bytes must be positive".to_string(),
        ));
    }
    if limits.max_coordinate == 0 {
        errors.push(StartupCheckError::InvalidLimit(
            "max_coordinate must be positive".to_string(),
        ));
    }
    if limits.max_thickness == 0 {
        errors.push(StartupCheckError::InvalidLimit(
            "max_thickness must be positive".to_string(),
        ));
    }
    if !limits.max_font_scale.is_finite() || limits.max_font_scale <= 0.0 {
        errors.push(StartupCheckError::InvalidLimit(format!(
            "max_font_scale must be a positive number, got {}",
            limits.max_font_scale
        )));
    }
    if limits.max_polygon_points < 3 {
        errors.push(StartupCheckError::InvalidLimit(
            "max_polygon_points must be at least 3".to_string(),
        ));
    }

    // CORS origins
    if config.cors.allows_any_origin() {
        info!("CORS allows any origin");
    } else {
        for origin in &config.cors.allowed_origins {
            if origin.parse::<HeaderValue>().is_err() {
                error!("CORS origin is not a valid header value: {:?}", origin);
                errors.push(StartupCheckError::InvalidCorsOrigin(origin.clone()));
            }
        }
    }

    // Fonts
    for font in &config.text.fonts {
        if check_face(font.face).is_err() {
            warn!("Font face {} is out of range", font.face);
            errors.push(StartupCheckError::InvalidFontFace(font.face));
            continue;
        }

        // Parsing happens once, when the font book is loaded
        match tokio::fs::metadata(&font.path).await {
            Ok(metadata) if metadata.is_file() => {
                info!("Font for face {} found: {:?}", font.face, font.path);
            }
            Ok(_) => {
                warn!("Font for face {} is not a file: {:?}", font.face, font.path);
                errors.push(StartupCheckError::FontFileMissing {
                    face: font.face,
                    path: font.path.display().to_string(),
                });
            }
            Err(e) => {
                warn!("Font for face {} missing: {:?} ({})", font.face, font.path, e);
                errors.push(StartupCheckError::FontFileMissing {
                    face: font.face,
                    path: font.path.display().to_string(),
                });
            }
        }
    }
    if config.text.fonts.is_empty() {
        info!("No outline fonts configured");
    }

    if errors.is_empty() {
        Ok(())
    } else {
        error!("Startup checks failed with {} errors", errors.len());
        Err(errors)
    }
}
