use serde::{Deserialize, Serialize};

/// A bounding box expressed as fractions of the frame, origin bottom-left.
///
/// Detectors are allowed to emit boxes slightly outside `[0, 1]` near frame
/// edges; consumers call [`NormalizedRect::clamped`] instead of rejecting them.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl NormalizedRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Clamps the origin into `[0, 1]`, then shrinks the size so the box
    /// never extends past the frame (`x + width <= 1`, `y + height <= 1`).
    pub fn clamped(&self) -> Self {
        let x = clamp_unit(self.x);
        let y = clamp_unit(self.y);
        let clamped = Self {
            x,
            y,
            width: clamp_unit(self.width).min(1.0 - x),
            height: clamp_unit(self.height).min(1.0 - y),
        };
        if clamped != *self {
            log::trace!("clamped out-of-range box {self:?} to {clamped:?}");
        }
        clamped
    }

    pub fn is_within_unit(&self) -> bool {
        let in_unit = |v: f64| (0.0..=1.0).contains(&v);
        in_unit(self.x)
            && in_unit(self.y)
            && in_unit(self.width)
            && in_unit(self.height)
            && self.x + self.width <= 1.0
            && self.y + self.height <= 1.0
    }

    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn area(&self) -> f64 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    /// Euclidean distance between box centers, in normalized units.
    pub fn center_distance(&self, other: &NormalizedRect) -> f64 {
        let (ax, ay) = self.center();
        let (bx, by) = other.center();
        ((ax - bx).powi(2) + (ay - by).powi(2)).sqrt()
    }
}

fn clamp_unit(v: f64) -> f64 {
    if v.is_nan() {
        0.0
    } else {
        v.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn rect(x: f64, y: f64, w: f64, h: f64) -> NormalizedRect {
        NormalizedRect::new(x, y, w, h)
    }

    // ── Clamping ─────────────────────────────────────────────────────

    #[test]
    fn test_clamped_in_range_is_unchanged() {
        let r = rect(0.1, 0.2, 0.3, 0.4);
        assert_eq!(r.clamped(), r);
    }

    #[test]
    fn test_clamped_negative_origin() {
        let r = rect(-0.05, -0.1, 0.2, 0.2).clamped();
        assert_relative_eq!(r.x, 0.0);
        assert_relative_eq!(r.y, 0.0);
        assert_relative_eq!(r.width, 0.2);
    }

    #[test]
    fn test_clamped_overflowing_right_edge() {
        let r = rect(0.9, 0.5, 0.3, 0.2).clamped();
        assert_relative_eq!(r.x, 0.9);
        assert_relative_eq!(r.width, 0.1, epsilon = 1e-12);
        assert!(r.is_within_unit());
    }

    #[test]
    fn test_clamped_nan_becomes_zero() {
        let r = rect(f64::NAN, 0.5, 0.1, f64::NAN).clamped();
        assert_relative_eq!(r.x, 0.0);
        assert_relative_eq!(r.height, 0.0);
    }

    #[rstest]
    #[case::inside(rect(0.0, 0.0, 1.0, 1.0), true)]
    #[case::negative(rect(-0.1, 0.0, 0.5, 0.5), false)]
    #[case::overflow(rect(0.6, 0.0, 0.5, 0.5), false)]
    fn test_is_within_unit(#[case] r: NormalizedRect, #[case] expected: bool) {
        assert_eq!(r.is_within_unit(), expected);
    }

    // ── Geometry ─────────────────────────────────────────────────────

    #[test]
    fn test_center() {
        let (cx, cy) = rect(0.2, 0.4, 0.2, 0.2).center();
        assert_relative_eq!(cx, 0.3, epsilon = 1e-12);
        assert_relative_eq!(cy, 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_center_distance() {
        let a = rect(0.0, 0.0, 0.2, 0.2);
        let b = rect(0.3, 0.4, 0.2, 0.2);
        assert_relative_eq!(a.center_distance(&b), 0.5, epsilon = 1e-12);
    }
}
