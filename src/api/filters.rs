use axum::{
    body::Bytes,
    extract::{
        Multipart, Query,
        multipart::MultipartRejection,
        rejection::QueryRejection,
    },
    response::Response,
};
use serde::Deserialize;
use tracing::debug;

use super::{ApiError, png_response, run_blocking};
use crate::imaging::{
    DecodeMode, PixelBuffer,
    adjust::{self, ChannelScale, HsvShift},
    codec,
};

/// Multipart field that carries the uploaded image.
pub const UPLOAD_FIELD: &str = "file";

#[derive(Debug, Deserialize)]
pub struct RgbQuery {
    pub r: Option<f32>,
    pub g: Option<f32>,
    pub b: Option<f32>,
}

#[derive(Debug, Deserialize)]
pub struct HsvQuery {
    pub h: Option<i32>,
    pub s: Option<f32>,
    pub v: Option<f32>,
}

async fn read_upload(mut multipart: Multipart) -> Result<Bytes, ApiError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some(UPLOAD_FIELD) {
            let file_name = field.file_name().map(str::to_owned);
            let data = field.bytes().await?;
            debug!("Received upload {:?} ({} bytes)", file_name, data.len());
            return Ok(data);
        }
    }
    Err(ApiError::MissingField(UPLOAD_FIELD))
}

pub async fn grayscale_handler(
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ApiError> {
    let upload = read_upload(multipart?).await?;

    let png = run_blocking(move || {
        let image = codec::decode(&upload, DecodeMode::Color)?.into_rgb();
        codec::encode_png(&PixelBuffer::Gray(adjust::grayscale(&image)))
    })
    .await?;

    Ok(png_response(png))
}

pub async fn rgb_handler(
    query: Result<Query<RgbQuery>, QueryRejection>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ApiError> {
    let Query(query) = query?;
    let defaults = ChannelScale::default();
    let scale = ChannelScale::new(
        query.r.unwrap_or(defaults.r),
        query.g.unwrap_or(defaults.g),
        query.b.unwrap_or(defaults.b),
    )?;
    let upload = read_upload(multipart?).await?;
    debug!(?scale, "Scaling channels");

    let png = run_blocking(move || {
        let buffer = codec::decode(&upload, DecodeMode::Unchanged)?;
        codec::encode_png(&adjust::scale_channels(buffer, scale))
    })
    .await?;

    Ok(png_response(png))
}

pub async fn hsv_handler(
    query: Result<Query<HsvQuery>, QueryRejection>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ApiError> {
    let Query(query) = query?;
    let defaults = HsvShift::default();
    let shift = HsvShift::new(
        query.h.unwrap_or(defaults.hue),
        query.s.unwrap_or(defaults.saturation),
        query.v.unwrap_or(defaults.value),
    )?;
    let upload = read_upload(multipart?).await?;
    debug!(?shift, "Adjusting HSV");

    let png = run_blocking(move || {
        let image = codec::decode(&upload, DecodeMode::Color)?.into_rgb();
        codec::encode_png(&PixelBuffer::Rgb(adjust::adjust_hsv(image, shift)))
    })
    .await?;

    Ok(png_response(png))
}
