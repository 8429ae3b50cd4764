//! Whole-image colour adjustments: grayscale, per-channel scaling and HSV
//! shifts.
//!
//! HSV uses the 8-bit convention where hue is stored as half-degrees in
//! `[0, 180)` and saturation/value span `[0, 255]`. Existing clients send hue
//! shifts in that unit.

use image::{GrayImage, Luma, Rgb, RgbImage};

use super::{ImagingError, PixelBuffer};

/// BT.601 luma weights in 14-bit fixed point; they sum to `1 << 14`.
const LUMA_R: u32 = 4899;
const LUMA_G: u32 = 9617;
const LUMA_B: u32 = 1868;
const LUMA_SHIFT: u32 = 14;

const HUE_RANGE: i32 = 180;

/// Per-channel multipliers for [`scale_channels`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelScale {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl ChannelScale {
    pub const MAX: f32 = 2.0;

    pub fn new(r: f32, g: f32, b: f32) -> Result<Self, ImagingError> {
        for (name, value) in [("r", r), ("g", g), ("b", b)] {
            check_factor(name, value)?;
        }
        Ok(Self { r, g, b })
    }
}

impl Default for ChannelScale {
    fn default() -> Self {
        Self {
            r: 1.0,
            g: 1.0,
            b: 1.0,
        }
    }
}

/// Parameters for [`adjust_hsv`]. `hue` is in half-degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HsvShift {
    pub hue: i32,
    pub saturation: f32,
    pub value: f32,
}

impl HsvShift {
    pub const MAX_HUE: i32 = 180;

    pub fn new(hue: i32, saturation: f32, value: f32) -> Result<Self, ImagingError> {
        if !(-Self::MAX_HUE..=Self::MAX_HUE).contains(&hue) {
            return Err(ImagingError::InvalidParameter(format!(
                "h must be between -{} and {}, got {}",
                Self::MAX_HUE,
                Self::MAX_HUE,
                hue
            )));
        }
        check_factor("s", saturation)?;
        check_factor("v", value)?;
        Ok(Self {
            hue,
            saturation,
            value,
        })
    }
}

impl Default for HsvShift {
    fn default() -> Self {
        Self {
            hue: 0,
            saturation: 1.0,
            value: 1.0,
        }
    }
}

fn check_factor(name: &str, value: f32) -> Result<(), ImagingError> {
    if value.is_finite() && (0.0..=ChannelScale::MAX).contains(&value) {
        Ok(())
    } else {
        Err(ImagingError::InvalidParameter(format!(
            "{} must be between 0.0 and {:.1}, got {}",
            name,
            ChannelScale::MAX,
            value
        )))
    }
}

/// Saturating multiply, truncating toward zero like a float-to-u8 cast.
fn scale_u8(value: u8, factor: f32) -> u8 {
    (value as f32 * factor).clamp(0.0, 255.0) as u8
}

pub fn luma(pixel: Rgb<u8>) -> u8 {
    let [r, g, b] = pixel.0;
    let weighted = r as u32 * LUMA_R + g as u32 * LUMA_G + b as u32 * LUMA_B;
    ((weighted + (1 << (LUMA_SHIFT - 1))) >> LUMA_SHIFT) as u8
}

pub fn grayscale(image: &RgbImage) -> GrayImage {
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        Luma([luma(*image.get_pixel(x, y))])
    })
}

/// Multiply the colour channels; alpha is carried through untouched.
pub fn scale_channels(buffer: PixelBuffer, scale: ChannelScale) -> PixelBuffer {
    let factors = [scale.r, scale.g, scale.b];

    match buffer {
        gray @ PixelBuffer::Gray(_) => scale_channels(PixelBuffer::Rgb(gray.into_rgb()), scale),
        PixelBuffer::Rgb(mut img) => {
            for pixel in img.pixels_mut() {
                for (channel, factor) in pixel.0.iter_mut().zip(factors) {
                    *channel = scale_u8(*channel, factor);
                }
            }
            PixelBuffer::Rgb(img)
        }
        PixelBuffer::Rgba(mut img) => {
            for pixel in img.pixels_mut() {
                for (channel, factor) in pixel.0[..3].iter_mut().zip(factors) {
                    *channel = scale_u8(*channel, factor);
                }
            }
            PixelBuffer::Rgba(img)
        }
    }
}

/// RGB to 8-bit HSV: hue in half-degrees `[0, 180)`, saturation and value in
/// `[0, 255]`.
pub fn rgb_to_hsv(pixel: Rgb<u8>) -> [u8; 3] {
    let [r, g, b] = pixel.0.map(|c| c as f32);
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let saturation = if max > 0.0 {
        (delta * 255.0 / max).round()
    } else {
        0.0
    };

    let degrees = if delta == 0.0 {
        0.0
    } else if max == r {
        60.0 * (g - b) / delta
    } else if max == g {
        120.0 + 60.0 * (b - r) / delta
    } else {
        240.0 + 60.0 * (r - g) / delta
    };
    let hue = ((degrees.rem_euclid(360.0) / 2.0).round() as i32).rem_euclid(HUE_RANGE);

    [hue as u8, saturation as u8, max as u8]
}

/// Inverse of [`rgb_to_hsv`].
pub fn hsv_to_rgb(hsv: [u8; 3]) -> Rgb<u8> {
    let degrees = (hsv[0] as f32 * 2.0).rem_euclid(360.0);
    let s = hsv[1] as f32 / 255.0;
    let v = hsv[2] as f32;

    let chroma = v * s;
    let x = chroma * (1.0 - ((degrees / 60.0) % 2.0 - 1.0).abs());
    let m = v - chroma;

    let (r, g, b) = match (degrees / 60.0) as u32 {
        0 => (chroma, x, 0.0),
        1 => (x, chroma, 0.0),
        2 => (0.0, chroma, x),
        3 => (0.0, x, chroma),
        4 => (x, 0.0, chroma),
        _ => (chroma, 0.0, x),
    };

    let to_u8 = |c: f32| (c + m).round().clamp(0.0, 255.0) as u8;
    Rgb([to_u8(r), to_u8(g), to_u8(b)])
}

pub fn adjust_hsv(mut image: RgbImage, shift: HsvShift) -> RgbImage {
    for pixel in image.pixels_mut() {
        let [h, s, v] = rgb_to_hsv(*pixel);
        let hue = (h as i32 + shift.hue).rem_euclid(HUE_RANGE) as u8;
        *pixel = hsv_to_rgb([
            hue,
            scale_u8(s, shift.saturation),
            scale_u8(v, shift.value),
        ]);
    }
    image
}
