use image::{Rgb, RgbImage};
use imageproc::{
    drawing::{
        draw_filled_circle_mut, draw_filled_rect_mut, draw_hollow_circle_mut,
        draw_hollow_rect_mut, draw_line_segment_mut, draw_polygon_mut,
    },
    point::Point,
    rect::Rect,
};

use super::{Color, ImagingError};
use crate::LimitsConfig;

pub type Vertex = (i32, i32);

/// Anything that can be rasterised onto an RGB canvas in place.
pub trait Drawable {
    fn draw(&self, canvas: &mut RgbImage);
}

/// Outline style for closed shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stroke {
    /// Negative thickness on the wire: fill the shape with the stroke colour.
    Filled,
    Width(u32),
}

impl LimitsConfig {
    pub fn check_vertex(&self, name: &str, vertex: Vertex) -> Result<Vertex, ImagingError> {
        self.check_extent(&format!("{}.x", name), vertex.0)?;
        self.check_extent(&format!("{}.y", name), vertex.1)?;
        Ok(vertex)
    }

    /// Coordinates, widths and heights may point outside the canvas (they are
    /// clipped) but must stay within the configured magnitude.
    pub fn check_extent(&self, name: &str, value: i32) -> Result<i32, ImagingError> {
        if value.unsigned_abs() > self.max_coordinate {
            return Err(ImagingError::InvalidGeometry(format!(
                "{} must be within ±{}, got {}",
                name, self.max_coordinate, value
            )));
        }
        Ok(value)
    }

    pub fn check_radius(&self, radius: i32) -> Result<u32, ImagingError> {
        if radius < 0 {
            return Err(ImagingError::InvalidGeometry(format!(
                "radius must not be negative, got {}",
                radius
            )));
        }
        Ok(self.check_extent("radius", radius)? as u32)
    }

    /// Thickness for open paths (lines, text): strictly positive.
    pub fn line_width(&self, thickness: i32) -> Result<u32, ImagingError> {
        if thickness < 1 || thickness.unsigned_abs() > self.max_thickness {
            return Err(ImagingError::InvalidGeometry(format!(
                "thickness must be between 1 and {}, got {}",
                self.max_thickness, thickness
            )));
        }
        Ok(thickness as u32)
    }

    /// Thickness for closed shapes, where a negative value means filled.
    pub fn stroke(&self, thickness: i32) -> Result<Stroke, ImagingError> {
        if thickness.unsigned_abs() > self.max_thickness {
            return Err(ImagingError::InvalidGeometry(format!(
                "thickness magnitude must be at most {}, got {}",
                self.max_thickness, thickness
            )));
        }
        if thickness < 0 {
            Ok(Stroke::Filled)
        } else {
            self.line_width(thickness).map(Stroke::Width)
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub start: Vertex,
    pub end: Vertex,
    pub color: Color,
    pub width: u32,
}

impl Drawable for Line {
    fn draw(&self, canvas: &mut RgbImage) {
        draw_thick_line(canvas, self.start, self.end, self.color.to_rgb(), self.width);
    }
}

/// Axis-aligned rectangle with corners `origin` and `origin + (width, height)`,
/// both inclusive.
#[derive(Debug, Clone, PartialEq)]
pub struct Rectangle {
    pub origin: Vertex,
    pub width: i32,
    pub height: i32,
    pub color: Color,
    pub fill: Option<Color>,
    pub stroke: Stroke,
}

impl Rectangle {
    fn bounds(&self) -> (Vertex, Vertex) {
        let (x, y) = self.origin;
        let (x2, y2) = (x + self.width, y + self.height);
        ((x.min(x2), y.min(y2)), (x.max(x2), y.max(y2)))
    }

    fn rect(&self) -> Rect {
        let ((left, top), (right, bottom)) = self.bounds();
        Rect::at(left, top).of_size((right - left + 1) as u32, (bottom - top + 1) as u32)
    }
}

impl Drawable for Rectangle {
    fn draw(&self, canvas: &mut RgbImage) {
        if let Some(fill) = self.fill {
            draw_filled_rect_mut(canvas, self.rect(), fill.to_rgb());
        }

        let color = self.color.to_rgb();
        match self.stroke {
            Stroke::Filled => draw_filled_rect_mut(canvas, self.rect(), color),
            Stroke::Width(1) => draw_hollow_rect_mut(canvas, self.rect(), color),
            Stroke::Width(width) => {
                let ((left, top), (right, bottom)) = self.bounds();
                let corners = [(left, top), (right, top), (right, bottom), (left, bottom)];
                draw_closed_path(canvas, &corners, color, width);
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Circle {
    pub center: Vertex,
    pub radius: u32,
    pub color: Color,
    pub fill: Option<Color>,
    pub stroke: Stroke,
}

impl Drawable for Circle {
    fn draw(&self, canvas: &mut RgbImage) {
        let radius = self.radius as i32;
        if let Some(fill) = self.fill {
            draw_filled_circle_mut(canvas, self.center, radius, fill.to_rgb());
        }

        let color = self.color.to_rgb();
        match self.stroke {
            Stroke::Filled => draw_filled_circle_mut(canvas, self.center, radius, color),
            Stroke::Width(1) => draw_hollow_circle_mut(canvas, self.center, radius, color),
            Stroke::Width(width) => draw_ring(canvas, self.center, self.radius, color, width),
        }
    }
}

/// Closed polygon; the edge from the last vertex back to the first is implied.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    vertices: Vec<Vertex>,
    pub color: Color,
    pub fill: Option<Color>,
    pub stroke: Stroke,
}

impl Polygon {
    pub const MIN_VERTICES: usize = 3;

    pub fn new(
        mut vertices: Vec<Vertex>,
        color: Color,
        fill: Option<Color>,
        stroke: Stroke,
    ) -> Result<Self, ImagingError> {
        // Clients sometimes close the path themselves.
        while vertices.len() > 1 && vertices.first() == vertices.last() {
            vertices.pop();
        }

        let mut distinct = vertices.clone();
        distinct.sort_unstable();
        distinct.dedup();
        if distinct.len() < Self::MIN_VERTICES {
            return Err(ImagingError::InvalidGeometry(format!(
                "polygon needs at least {} distinct vertices, got {}",
                Self::MIN_VERTICES,
                distinct.len()
            )));
        }

        Ok(Self {
            vertices,
            color,
            fill,
            stroke,
        })
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    fn points(&self) -> Vec<Point<i32>> {
        self.vertices.iter().map(|&(x, y)| Point::new(x, y)).collect()
    }
}

impl Drawable for Polygon {
    fn draw(&self, canvas: &mut RgbImage) {
        if let Some(fill) = self.fill {
            draw_polygon_mut(canvas, &self.points(), fill.to_rgb());
        }

        let color = self.color.to_rgb();
        match self.stroke {
            Stroke::Filled => draw_polygon_mut(canvas, &self.points(), color),
            Stroke::Width(width) => draw_closed_path(canvas, &self.vertices, color, width),
        }
    }
}

fn draw_closed_path(canvas: &mut RgbImage, vertices: &[Vertex], color: Rgb<u8>, width: u32) {
    for (i, &start) in vertices.iter().enumerate() {
        let end = vertices[(i + 1) % vertices.len()];
        draw_thick_line(canvas, start, end, color, width);
    }
}

/// Segment of the given width with round caps. Width 1 is a plain Bresenham
/// line.
pub fn draw_thick_line(
    canvas: &mut RgbImage,
    start: Vertex,
    end: Vertex,
    color: Rgb<u8>,
    width: u32,
) {
    if width <= 1 {
        draw_line_segment_mut(
            canvas,
            (start.0 as f32, start.1 as f32),
            (end.0 as f32, end.1 as f32),
            color,
        );
        return;
    }

    let half = width as f32 / 2.0;
    let cap_radius = (width / 2) as i32;
    let dx = (end.0 - start.0) as f32;
    let dy = (end.1 - start.1) as f32;
    let length = dx.hypot(dy);

    if length > 0.0 {
        // Offset perpendicular to the segment; with width >= 2 the rounded
        // corners never coincide, which draw_polygon_mut requires.
        let (nx, ny) = (-dy / length * half, dx / length * half);
        let offset = |(x, y): Vertex, sign: f32| {
            Point::new(
                (x as f32 + sign * nx).round() as i32,
                (y as f32 + sign * ny).round() as i32,
            )
        };
        let quad = [
            offset(start, 1.0),
            offset(end, 1.0),
            offset(end, -1.0),
            offset(start, -1.0),
        ];
        draw_polygon_mut(canvas, &quad, color);
    }

    draw_filled_circle_mut(canvas, start, cap_radius, color);
    draw_filled_circle_mut(canvas, end, cap_radius, color);
}

/// Annulus of the given width centred on `radius`.
fn draw_ring(canvas: &mut RgbImage, center: Vertex, radius: u32, color: Rgb<u8>, width: u32) {
    let half = width as f64 / 2.0;
    let outer = radius as f64 + half;
    let inner = (radius as f64 - half).max(0.0);
    let (outer_sq, inner_sq) = (outer * outer, inner * inner);

    let (cx, cy) = (center.0 as i64, center.1 as i64);
    let reach = outer.ceil() as i64;
    let x_range = (cx - reach).max(0)..=(cx + reach).min(canvas.width() as i64 - 1);
    let y_range = (cy - reach).max(0)..=(cy + reach).min(canvas.height() as i64 - 1);

    for y in y_range {
        for x in x_range.clone() {
            let dist_sq = ((x - cx).pow(2) + (y - cy).pow(2)) as f64;
            if dist_sq <= outer_sq && dist_sq >= inner_sq {
                canvas.put_pixel(x as u32, y as u32, color);
            }
        }
    }
}
