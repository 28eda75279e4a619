//! Conversion between sensor-normalized boxes and display pixels.
//!
//! Normalized boxes use a bottom-left origin; display space is top-left,
//! so the y axis flips during conversion.

use serde::{Deserialize, Serialize};

use super::normalized_rect::NormalizedRect;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// A rectangle in display pixels, origin top-left.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DisplayRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Maps a normalized box into display space.
///
/// Out-of-range input is clamped first. Identical inputs always produce
/// bit-identical output.
pub fn to_display_rect(rect: &NormalizedRect, viewport: Size) -> DisplayRect {
    let r = rect.clamped();
    let w = viewport.width.max(0.0);
    let h = viewport.height.max(0.0);
    DisplayRect {
        x: r.x * w,
        y: (1.0 - r.y - r.height) * h,
        width: r.width * w,
        height: r.height * h,
    }
}

/// Inverse of [`to_display_rect`]. Returns a zero rect for an empty viewport.
pub fn to_normalized_rect(rect: &DisplayRect, viewport: Size) -> NormalizedRect {
    if viewport.width <= 0.0 || viewport.height <= 0.0 {
        return NormalizedRect::new(0.0, 0.0, 0.0, 0.0);
    }
    let width = rect.width / viewport.width;
    let height = rect.height / viewport.height;
    NormalizedRect {
        x: rect.x / viewport.width,
        y: 1.0 - rect.y / viewport.height - height,
        width,
        height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[test]
    fn test_flips_y_axis() {
        // Box hugging the bottom of the frame lands at the bottom in display space.
        let r = NormalizedRect::new(0.25, 0.0, 0.5, 0.1);
        let d = to_display_rect(&r, Size::new(1920.0, 1080.0));
        assert_relative_eq!(d.x, 480.0);
        assert_relative_eq!(d.y, 972.0, epsilon = 1e-9);
        assert_relative_eq!(d.width, 960.0);
        assert_relative_eq!(d.height, 108.0, epsilon = 1e-9);
    }

    #[test]
    fn test_top_left_corner() {
        let r = NormalizedRect::new(0.0, 0.9, 0.1, 0.1);
        let d = to_display_rect(&r, Size::new(100.0, 100.0));
        assert_relative_eq!(d.x, 0.0);
        assert_relative_eq!(d.y, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_out_of_range_is_clamped_not_rejected() {
        let r = NormalizedRect::new(-0.1, 0.95, 0.3, 0.2);
        let d = to_display_rect(&r, Size::new(100.0, 100.0));
        assert_relative_eq!(d.x, 0.0);
        assert_relative_eq!(d.y, 0.0, epsilon = 1e-9);
        assert_relative_eq!(d.width, 30.0);
        assert_relative_eq!(d.height, 5.0, epsilon = 1e-9);
    }

    #[test]
    fn test_repeated_calls_are_bit_identical() {
        let r = NormalizedRect::new(0.123456789, 0.333333333, 0.1, 0.271828);
        let viewport = Size::new(1179.0, 2556.0);
        let first = to_display_rect(&r, viewport);
        for _ in 0..100 {
            assert_eq!(to_display_rect(&r, viewport), first);
        }
    }

    #[rstest]
    #[case(NormalizedRect::new(0.0, 0.0, 1.0, 1.0), Size::new(1920.0, 1080.0))]
    #[case(NormalizedRect::new(0.1, 0.2, 0.3, 0.4), Size::new(640.0, 480.0))]
    #[case(NormalizedRect::new(0.7, 0.05, 0.25, 0.9), Size::new(1179.0, 2556.0))]
    #[case(NormalizedRect::new(0.5, 0.5, 0.0, 0.0), Size::new(3.0, 7.0))]
    fn test_round_trip(#[case] r: NormalizedRect, #[case] viewport: Size) {
        let back = to_normalized_rect(&to_display_rect(&r, viewport), viewport);
        assert_relative_eq!(back.x, r.x, epsilon = 1e-9);
        assert_relative_eq!(back.y, r.y, epsilon = 1e-9);
        assert_relative_eq!(back.width, r.width, epsilon = 1e-9);
        assert_relative_eq!(back.height, r.height, epsilon = 1e-9);
    }

    #[test]
    fn test_zero_viewport() {
        let r = NormalizedRect::new(0.1, 0.1, 0.5, 0.5);
        let d = to_display_rect(&r, Size::new(0.0, 0.0));
        assert_relative_eq!(d.width, 0.0);
        let back = to_normalized_rect(&d, Size::new(0.0, 0.0));
        assert_relative_eq!(back.width, 0.0);
    }
}
