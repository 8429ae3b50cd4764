use ab_glyph::{Font, FontVec, PxScale, ScaleFont};
use font8x8::{BASIC_FONTS, UnicodeFonts};
use image::{GrayImage, Luma, Rgb, RgbImage};
use imageproc::{
    distance_transform::Norm,
    drawing::{draw_filled_rect_mut, draw_text_mut},
    morphology::dilate,
    rect::Rect,
};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::draw::{Drawable, Vertex};
use super::{Color, ImagingError};
use crate::{LimitsConfig, TextConfig};

/// Face numbers 0..=7 select a typeface; this flag asks for the italic variant.
pub const ITALIC_FLAG: u32 = 16;
const MAX_FACE: u32 = 7;

/// Outline fonts are rendered at this many pixels per unit of font scale.
const OUTLINE_PX_PER_SCALE: f32 = 30.0;
/// Bitmap cells per unit of font scale; gives a 21px cap height at scale 1.
const BITMAP_CELL_PER_SCALE: f32 = 3.0;
/// Built-in glyphs are 8x8 cells, bit 0 of each row byte is the leftmost
/// column. Capitals fill rows 0..7, so the baseline sits under row 6 and row 7
/// holds descenders.
const GLYPH_SIZE: u32 = 8;
const BASELINE_ROW: u32 = 7;
const FALLBACK: char = '?';
const INK: Luma<u8> = Luma([255]);

#[derive(Clone)]
pub enum Typeface {
    Builtin,
    Outline(Arc<FontVec>),
}

impl fmt::Debug for Typeface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Typeface::Builtin => f.write_str("Builtin"),
            Typeface::Outline(_) => f.write_str("Outline"),
        }
    }
}

/// Outline fonts loaded at startup, keyed by face number.
#[derive(Clone, Default)]
pub struct FontBook {
    faces: HashMap<u32, Arc<FontVec>>,
}

impl FontBook {
    /// Load every configured font. Unreadable or unparsable files are logged
    /// and skipped; those faces fall back to the built-in font.
    pub async fn load(config: &TextConfig) -> Self {
        let mut book = Self::default();

        for entry in &config.fonts {
            if let Err(e) = check_face(entry.face) {
                warn!("Skipping font {:?}: {}", entry.path, e);
                continue;
            }

            let data = match tokio::fs::read(&entry.path).await {
                Ok(data) => data,
                Err(e) => {
                    warn!("Failed to read font {:?}: {}", entry.path, e);
                    continue;
                }
            };

            match FontVec::try_from_vec(data) {
                Ok(font) => {
                    info!("Loaded font face {} from {:?}", entry.face, entry.path);
                    book.insert(entry.face, font);
                }
                Err(_) => warn!("Failed to parse font {:?}", entry.path),
            }
        }

        book
    }

    pub fn insert(&mut self, face: u32, font: FontVec) {
        self.faces.insert(face, Arc::new(font));
    }

    pub fn len(&self) -> usize {
        self.faces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    /// Resolve a face number: exact match first, then the upright variant,
    /// then the built-in bitmap font.
    pub fn typeface(&self, face: u32) -> Result<Typeface, ImagingError> {
        check_face(face)?;

        let font = self
            .faces
            .get(&face)
            .or_else(|| self.faces.get(&(face & !ITALIC_FLAG)));

        Ok(match font {
            Some(font) => Typeface::Outline(font.clone()),
            None => Typeface::Builtin,
        })
    }
}

pub fn check_face(face: u32) -> Result<u32, ImagingError> {
    if (face & !ITALIC_FLAG) > MAX_FACE {
        return Err(ImagingError::InvalidParameter(format!(
            "font_face must be 0-{} optionally combined with {}, got {}",
            MAX_FACE, ITALIC_FLAG, face
        )));
    }
    Ok(face)
}

impl LimitsConfig {
    pub fn font_scale(&self, scale: f32) -> Result<f32, ImagingError> {
        if !scale.is_finite() || scale <= 0.0 || scale > self.max_font_scale {
            return Err(ImagingError::InvalidParameter(format!(
                "font_scale must be greater than 0 and at most {}, got {}",
                self.max_font_scale, scale
            )));
        }
        Ok(scale)
    }

    pub fn check_text(&self, text: &str) -> Result<(), ImagingError> {
        let length = text.chars().count();
        if length > self.max_text_length {
            return Err(ImagingError::InvalidParameter(format!(
                "text must be at most {} characters, got {}",
                self.max_text_length, length
            )));
        }
        Ok(())
    }
}

/// A run of text whose baseline starts at `origin`.
#[derive(Debug, Clone)]
pub struct Text {
    pub content: String,
    pub origin: Vertex,
    pub scale: f32,
    pub color: Color,
    pub thickness: u32,
    pub typeface: Typeface,
}

impl Drawable for Text {
    fn draw(&self, canvas: &mut RgbImage) {
        debug!(
            "Drawing {} chars with {:?} at {:?}",
            self.content.chars().count(),
            self.typeface,
            self.origin
        );

        let (width, height) = canvas.dimensions();
        let coverage = match &self.typeface {
            Typeface::Builtin => self.bitmap_coverage(width, height),
            Typeface::Outline(font) => self.outline_coverage(width, height, font.as_ref()),
        };
        apply_coverage(canvas, &coverage, self.color.to_rgb(), self.stroke_radius());
    }
}

impl Text {
    /// Stroke growth in pixels on each side of the glyph outline.
    fn stroke_radius(&self) -> u8 {
        u8::try_from(self.thickness.saturating_sub(1) / 2).unwrap_or(u8::MAX)
    }

    fn bitmap_coverage(&self, width: u32, height: u32) -> GrayImage {
        let cell = (self.scale * BITMAP_CELL_PER_SCALE).round().max(1.0) as u32;
        let advance = (GLYPH_SIZE * cell) as i32;
        let (x0, baseline) = self.origin;
        let top = baseline - (BASELINE_ROW * cell) as i32;

        let mut coverage = GrayImage::new(width, height);
        for (index, c) in self.content.chars().enumerate() {
            let left = x0 + index as i32 * advance;
            if left >= width as i32 || left + advance <= 0 {
                continue;
            }

            let glyph = BASIC_FONTS
                .get(c)
                .or_else(|| BASIC_FONTS.get(FALLBACK))
                .unwrap_or_default();
            for (row, bits) in glyph.iter().enumerate() {
                for column in 0..GLYPH_SIZE {
                    if (bits >> column) & 1 == 1 {
                        let x = left + (column * cell) as i32;
                        let y = top + (row as u32 * cell) as i32;
                        draw_filled_rect_mut(
                            &mut coverage,
                            Rect::at(x, y).of_size(cell, cell),
                            INK,
                        );
                    }
                }
            }
        }
        coverage
    }

    fn outline_coverage(&self, width: u32, height: u32, font: &FontVec) -> GrayImage {
        let scale = PxScale::from(self.scale * OUTLINE_PX_PER_SCALE);
        let ascent = font.as_scaled(scale).ascent().round() as i32;
        let (x, baseline) = self.origin;

        let mut coverage = GrayImage::new(width, height);
        draw_text_mut(&mut coverage, INK, x, baseline - ascent, scale, font, &self.content);
        coverage
    }
}

/// Paint `color` through a coverage mask, first growing the mask by `radius`
/// pixels. Partial coverage blends with the canvas.
pub fn apply_coverage(canvas: &mut RgbImage, coverage: &GrayImage, color: Rgb<u8>, radius: u8) {
    let grown;
    let mask = if radius == 0 {
        coverage
    } else {
        grown = dilate(coverage, Norm::L2, radius);
        &grown
    };

    for (x, y, Luma([alpha])) in mask.enumerate_pixels() {
        if *alpha == 0 || x >= canvas.width() || y >= canvas.height() {
            continue;
        }
        let alpha = *alpha as u16;
        let pixel = canvas.get_pixel_mut(x, y);
        for (channel, ink) in pixel.0.iter_mut().zip(color.0) {
            let mixed = ink as u16 * alpha + *channel as u16 * (255 - alpha);
            *channel = ((mixed + 127) / 255) as u8;
        }
    }
}
