use image::Rgb;
use std::fmt;
use std::str::FromStr;

use super::ImagingError;

/// An 8-bit RGB colour as it travels on the wire (`#rrggbb`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Pixel value for drawing. `image` stores channels as R, G, B so no
    /// reordering is needed.
    pub fn to_rgb(self) -> Rgb<u8> {
        Rgb([self.r, self.g, self.b])
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Color {
    type Err = ImagingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_color(s)
    }
}

/// Parse a `#RRGGBB` (or bare `RRGGBB`) hex string. Surrounding whitespace is
/// ignored.
pub fn parse_color(hex: &str) -> Result<Color, ImagingError> {
    let trimmed = hex.trim();
    let digits = trimmed.strip_prefix('#').unwrap_or(trimmed);

    if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(ImagingError::InvalidColorFormat(format!(
            "expected #RRGGBB, got {:?}",
            hex
        )));
    }

    // Only ASCII hex digits remain, so byte slicing is on char boundaries.
    let channel = |i: usize| {
        u8::from_str_radix(&digits[i..i + 2], 16)
            .map_err(|e| ImagingError::InvalidColorFormat(format!("{:?}: {}", hex, e)))
    };

    Ok(Color {
        r: channel(0)?,
        g: channel(2)?,
        b: channel(4)?,
    })
}

/// Parse an optional fill colour; an empty string counts as absent.
pub fn parse_optional_color(hex: Option<&str>) -> Result<Option<Color>, ImagingError> {
    match hex {
        Some(value) if !value.trim().is_empty() => parse_color(value).map(Some),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_black_and_white() {
        assert_eq!(parse_color("#000000").unwrap(), Color::new(0, 0, 0));
        assert_eq!(parse_color("#FFFFFF").unwrap(), Color::new(255, 255, 255));
    }

    #[test]
    fn test_hash_prefix_is_optional() {
        assert_eq!(
            parse_color("ff0000").unwrap(),
            parse_color("#ff0000").unwrap()
        );
        assert_eq!(parse_color("ff0000").unwrap(), Color::new(255, 0, 0));
    }

    #[test]
    fn test_mixed_case_channels() {
        let color = parse_color("#1a2B3c").unwrap();
        assert_eq!(color, Color::new(0x1a, 0x2b, 0x3c));
        assert_eq!(color.to_hex(), "#1a2b3c");
    }

    #[test]
    fn test_rejects_wrong_length() {
        for input in ["", "#", "#fff", "#fffffff", "##ffffff"] {
            assert!(
                matches!(parse_color(input), Err(ImagingError::InvalidColorFormat(_))),
                "{:?} should be rejected",
                input
            );
        }
    }

    #[test]
    fn test_surrounding_whitespace_is_ignored() {
        assert_eq!(parse_color(" #ff0000\n").unwrap(), Color::new(255, 0, 0));
        assert_eq!(
            parse_color(" #ff0000").unwrap(),
            parse_optional_color(Some(" #ff0000")).unwrap().unwrap()
        );
    }

    #[test]
    fn test_rejects_non_hex_digits() {
        assert!(parse_color("#gg0000").is_err());
        assert!(parse_color("#+f+f+f").is_err());
        assert!(parse_color("#ff 000").is_err());
    }

    #[test]
    fn test_from_str_and_rgb_pixel() {
        let color: Color = "#102030".parse().unwrap();
        assert_eq!(color.to_rgb(), Rgb([0x10, 0x20, 0x30]));
    }

    #[test]
    fn test_empty_fill_color_is_absent() {
        assert_eq!(parse_optional_color(None).unwrap(), None);
        assert_eq!(parse_optional_color(Some("")).unwrap(), None);
        assert_eq!(
            parse_optional_color(Some("#00ff00")).unwrap(),
            Some(Color::new(0, 255, 0))
        );
        assert!(parse_optional_color(Some("green")).is_err());
    }
}
