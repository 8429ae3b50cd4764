use crate::imaging::PixelBuffer;
use crate::imaging::adjust::{
    ChannelScale, HsvShift, adjust_hsv, grayscale, hsv_to_rgb, luma, rgb_to_hsv, scale_channels,
};
use image::{GrayImage, Luma, Rgb, RgbImage, Rgba, RgbaImage};

fn sample_rgb() -> RgbImage {
    RgbImage::from_fn(32, 16, |x, y| {
        Rgb([(x * 8) as u8, (y * 16) as u8, ((x + y) * 5) as u8])
    })
}

#[test]
fn test_grayscale_of_pure_red_matches_bt601() {
    assert_eq!(luma(Rgb([255, 0, 0])), 76);
    assert_eq!(luma(Rgb([0, 255, 0])), 150);
    assert_eq!(luma(Rgb([0, 0, 255])), 29);
    assert_eq!(luma(Rgb([255, 255, 255])), 255);
    assert_eq!(luma(Rgb([0, 0, 0])), 0);
}

#[test]
fn test_grayscale_is_single_channel_and_close_to_formula() {
    let source = sample_rgb();
    let gray = grayscale(&source);
    assert_eq!(gray.dimensions(), source.dimensions());

    for (x, y, pixel) in gray.enumerate_pixels() {
        let [r, g, b] = source.get_pixel(x, y).0.map(|c| c as f32);
        let expected = 0.299 * r + 0.587 * g + 0.114 * b;
        assert!(
            (pixel.0[0] as f32 - expected).abs() <= 1.0,
            "pixel ({}, {}): {} vs {}",
            x,
            y,
            pixel.0[0],
            expected
        );
    }
}

#[test]
fn test_identity_scale_changes_nothing() {
    let source = PixelBuffer::Rgb(sample_rgb());
    let scaled = scale_channels(source.clone(), ChannelScale::default());
    assert_eq!(scaled, source);
}

#[test]
fn test_scale_clamps_and_preserves_alpha() {
    let source = PixelBuffer::Rgba(RgbaImage::from_pixel(4, 4, Rgba([200, 100, 50, 77])));
    let scale = ChannelScale::new(2.0, 0.5, 0.0).unwrap();

    match scale_channels(source, scale) {
        PixelBuffer::Rgba(img) => assert_eq!(img.get_pixel(1, 1), &Rgba([255, 50, 0, 77])),
        other => panic!("expected RGBA output, got {} channels", other.channels()),
    }
}

#[test]
fn test_scale_truncates_fractions() {
    let source = PixelBuffer::Rgb(RgbImage::from_pixel(1, 1, Rgb([3, 3, 3])));
    let scale = ChannelScale::new(1.5, 0.5, 1.0).unwrap();

    match scale_channels(source, scale) {
        PixelBuffer::Rgb(img) => assert_eq!(img.get_pixel(0, 0), &Rgb([4, 1, 3])),
        other => panic!("expected RGB output, got {} channels", other.channels()),
    }
}

#[test]
fn test_scale_expands_gray_input() {
    let source = PixelBuffer::Gray(GrayImage::from_pixel(2, 2, Luma([100])));
    let scale = ChannelScale::new(1.0, 2.0, 0.0).unwrap();

    let scaled = scale_channels(source, scale);
    assert_eq!(scaled.channels(), 3);
    assert_eq!(scaled.into_rgb().get_pixel(0, 0), &Rgb([100, 200, 0]));
}

#[test]
fn test_channel_scale_range() {
    assert!(ChannelScale::new(0.0, 1.0, 2.0).is_ok());
    assert!(ChannelScale::new(2.1, 1.0, 1.0).is_err());
    assert!(ChannelScale::new(1.0, -0.1, 1.0).is_err());
    assert!(ChannelScale::new(1.0, 1.0, f32::NAN).is_err());
}

#[test]
fn test_hsv_shift_range() {
    assert!(HsvShift::new(-180, 0.0, 2.0).is_ok());
    assert!(HsvShift::new(180, 1.0, 1.0).is_ok());
    assert!(HsvShift::new(181, 1.0, 1.0).is_err());
    assert!(HsvShift::new(0, 2.5, 1.0).is_err());
    assert!(HsvShift::new(0, 1.0, f32::INFINITY).is_err());
}

#[test]
fn test_hsv_conversion_of_primaries() {
    assert_eq!(rgb_to_hsv(Rgb([255, 0, 0])), [0, 255, 255]);
    assert_eq!(rgb_to_hsv(Rgb([0, 255, 0])), [60, 255, 255]);
    assert_eq!(rgb_to_hsv(Rgb([0, 0, 255])), [120, 255, 255]);
    assert_eq!(rgb_to_hsv(Rgb([128, 128, 128])), [0, 0, 128]);

    assert_eq!(hsv_to_rgb([0, 255, 255]), Rgb([255, 0, 0]));
    assert_eq!(hsv_to_rgb([60, 255, 255]), Rgb([0, 255, 0]));
    assert_eq!(hsv_to_rgb([120, 255, 255]), Rgb([0, 0, 255]));
}

#[test]
fn test_hsv_hue_stays_below_180() {
    // Just below 360 degrees rounds up to 180 half-degrees and must wrap.
    let [hue, _, _] = rgb_to_hsv(Rgb([255, 0, 1]));
    assert!(hue < 180);
}

#[test]
fn test_identity_hsv_is_identity_within_rounding() {
    let source = sample_rgb();
    let adjusted = adjust_hsv(source.clone(), HsvShift::default());

    for (x, y, pixel) in adjusted.enumerate_pixels() {
        let original = source.get_pixel(x, y);
        for channel in 0..3 {
            let diff = (pixel.0[channel] as i32 - original.0[channel] as i32).abs();
            assert!(
                diff <= 6,
                "pixel ({}, {}) channel {}: {:?} vs {:?}",
                x,
                y,
                channel,
                pixel,
                original
            );
        }
    }
}

#[test]
fn test_identity_hsv_is_exact_for_grays_and_primaries() {
    let colors = [
        Rgb([0, 0, 0]),
        Rgb([255, 255, 255]),
        Rgb([90, 90, 90]),
        Rgb([255, 0, 0]),
        Rgb([0, 255, 0]),
        Rgb([0, 0, 255]),
    ];
    for color in colors {
        let adjusted = adjust_hsv(RgbImage::from_pixel(1, 1, color), HsvShift::default());
        assert_eq!(adjusted.get_pixel(0, 0), &color);
    }
}

#[test]
fn test_hue_shift_rotates_red_to_green_and_wraps() {
    let red = RgbImage::from_pixel(2, 2, Rgb([255, 0, 0]));

    let green = adjust_hsv(red.clone(), HsvShift::new(60, 1.0, 1.0).unwrap());
    assert_eq!(green.get_pixel(0, 0), &Rgb([0, 255, 0]));

    // -60 half-degrees from red wraps around to 120 (blue).
    let blue = adjust_hsv(red, HsvShift::new(-60, 1.0, 1.0).unwrap());
    assert_eq!(blue.get_pixel(0, 0), &Rgb([0, 0, 255]));
}

#[test]
fn test_zero_saturation_and_value() {
    let orange = RgbImage::from_pixel(1, 1, Rgb([255, 128, 0]));

    let desaturated = adjust_hsv(orange.clone(), HsvShift::new(0, 0.0, 1.0).unwrap());
    assert_eq!(desaturated.get_pixel(0, 0), &Rgb([255, 255, 255]));

    let black = adjust_hsv(orange, HsvShift::new(0, 1.0, 0.0).unwrap());
    assert_eq!(black.get_pixel(0, 0), &Rgb([0, 0, 0]));
}

#[test]
fn test_value_boost_clamps() {
    let dim = RgbImage::from_pixel(1, 1, Rgb([200, 0, 0]));
    let boosted = adjust_hsv(dim, HsvShift::new(0, 1.0, 2.0).unwrap());
    assert_eq!(boosted.get_pixel(0, 0), &Rgb([255, 0, 0]));
}
