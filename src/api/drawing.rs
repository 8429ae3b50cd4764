use axum::{
    extract::{State, rejection::JsonRejection},
    response::Json,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{ApiError, run_blocking};
use crate::AppState;
use crate::imaging::{
    Circle, DecodeMode, Drawable, ImagingError, Line, PixelBuffer, Polygon, Rectangle, Text,
    codec, color::parse_optional_color, parse_color,
};

fn default_color() -> String {
    "#000000".to_string()
}

fn default_thickness() -> i32 {
    2
}

fn default_font_scale() -> f32 {
    1.0
}

#[derive(Debug, Deserialize)]
pub struct LineRequest {
    pub image: String,
    pub start_x: i32,
    pub start_y: i32,
    pub end_x: i32,
    pub end_y: i32,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default = "default_thickness")]
    pub thickness: i32,
}

#[derive(Debug, Deserialize)]
pub struct RectangleRequest {
    pub image: String,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default)]
    pub fill_color: Option<String>,
    #[serde(default = "default_thickness")]
    pub thickness: i32,
}

#[derive(Debug, Deserialize)]
pub struct CircleRequest {
    pub image: String,
    pub center_x: i32,
    pub center_y: i32,
    pub radius: i32,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default)]
    pub fill_color: Option<String>,
    #[serde(default = "default_thickness")]
    pub thickness: i32,
}

#[derive(Debug, Deserialize)]
pub struct PolygonRequest {
    pub image: String,
    /// `[x, y]` pairs in drawing order.
    pub points: Vec<[i32; 2]>,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default)]
    pub fill_color: Option<String>,
    #[serde(default = "default_thickness")]
    pub thickness: i32,
}

#[derive(Debug, Deserialize)]
pub struct TextRequest {
    pub image: String,
    pub text: String,
    pub x: i32,
    pub y: i32,
    #[serde(default = "default_font_scale")]
    pub font_scale: f32,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default = "default_thickness")]
    pub thickness: i32,
    #[serde(default)]
    pub font_face: u32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DrawingResponse {
    /// PNG data URI.
    pub image: String,
}

/// Decode the payload image, draw `shape` on it and return it as a data URI.
async fn render<S>(image: String, shape: S) -> Result<Json<DrawingResponse>, ApiError>
where
    S: Drawable + Send + 'static,
{
    let data_uri = run_blocking(move || {
        let bytes = codec::decode_data_uri_or_raw(&image)?;
        let mut canvas = codec::decode(&bytes, DecodeMode::Color)?.into_rgb();
        shape.draw(&mut canvas);
        let png = codec::encode_png(&PixelBuffer::Rgb(canvas))?;
        Ok(codec::to_data_uri(&png))
    })
    .await?;

    Ok(Json(DrawingResponse { image: data_uri }))
}

pub async fn line_handler(
    State(app_state): State<AppState>,
    payload: Result<Json<LineRequest>, JsonRejection>,
) -> Result<Json<DrawingResponse>, ApiError> {
    let Json(request) = payload?;
    let limits = &app_state.config.limits;

    let line = Line {
        start: limits.check_vertex("start", (request.start_x, request.start_y))?,
        end: limits.check_vertex("end", (request.end_x, request.end_y))?,
        color: parse_color(&request.color)?,
        width: limits.line_width(request.thickness)?,
    };
    debug!(?line, "Drawing line");

    render(request.image, line).await
}

pub async fn rectangle_handler(
    State(app_state): State<AppState>,
    payload: Result<Json<RectangleRequest>, JsonRejection>,
) -> Result<Json<DrawingResponse>, ApiError> {
    let Json(request) = payload?;
    let limits = &app_state.config.limits;

    let rectangle = Rectangle {
        origin: limits.check_vertex("origin", (request.x, request.y))?,
        width: limits.check_extent("width", request.width)?,
        height: limits.check_extent("height", request.height)?,
        color: parse_color(&request.color)?,
        fill: parse_optional_color(request.fill_color.as_deref())?,
        stroke: limits.stroke(request.thickness)?,
    };
    debug!(?rectangle, "Drawing rectangle");

    render(request.image, rectangle).await
}

pub async fn circle_handler(
    State(app_state): State<AppState>,
    payload: Result<Json<CircleRequest>, JsonRejection>,
) -> Result<Json<DrawingResponse>, ApiError> {
    let Json(request) = payload?;
    let limits = &app_state.config.limits;

    let circle = Circle {
        center: limits.check_vertex("center", (request.center_x, request.center_y))?,
        radius: limits.check_radius(request.radius)?,
        color: parse_color(&request.color)?,
        fill: parse_optional_color(request.fill_color.as_deref())?,
        stroke: limits.stroke(request.thickness)?,
    };
    debug!(?circle, "Drawing circle");

    render(request.image, circle).await
}

pub async fn polygon_handler(
    State(app_state): State<AppState>,
    payload: Result<Json<PolygonRequest>, JsonRejection>,
) -> Result<Json<DrawingResponse>, ApiError> {
    let Json(request) = payload?;
    let limits = &app_state.config.limits;

    if request.points.len() > limits.max_polygon_points {
        return Err(ImagingError::InvalidGeometry(format!(
            "polygon may have at most {} points, got {}",
            limits.max_polygon_points,
            request.points.len()
        ))
        .into());
    }

    let vertices = request
        .points
        .iter()
        .enumerate()
        .map(|(i, &[x, y])| limits.check_vertex(&format!("points[{}]", i), (x, y)))
        .collect::<Result<Vec<_>, _>>()?;

    let polygon = Polygon::new(
        vertices,
        parse_color(&request.color)?,
        parse_optional_color(request.fill_color.as_deref())?,
        limits.stroke(request.thickness)?,
    )?;
    debug!(vertices = polygon.vertices().len(), "Drawing polygon");

    render(request.image, polygon).await
}

pub async fn text_handler(
    State(app_state): State<AppState>,
    payload: Result<Json<TextRequest>, JsonRejection>,
) -> Result<Json<DrawingResponse>, ApiError> {
    let Json(request) = payload?;
    let limits = &app_state.config.limits;
    limits.check_text(&request.text)?;

    let text = Text {
        origin: limits.check_vertex("origin", (request.x, request.y))?,
        scale: limits.font_scale(request.font_scale)?,
        color: parse_color(&request.color)?,
        thickness: limits.line_width(request.thickness)?,
        typeface: app_state.fonts.typeface(request.font_face)?,
        content: request.text,
    };

    render(request.image, text).await
}
