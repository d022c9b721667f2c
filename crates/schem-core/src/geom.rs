#![forbid(unsafe_code)]

//! Pixel-space geometry helpers.
//!
//! The engine works in a right-handed 2-D plane with origin at the top-left
//! of the drawing region (`spec.md` §3 "Coordinate system"). `Unit` is a
//! phantom marker so `euclid`'s checked arithmetic doesn't let us mix this
//! space up with some other one.

pub type Unit = euclid::UnknownUnit;

pub type Point = euclid::Point2D<f64, Unit>;
pub type Vector = euclid::Vector2D<f64, Unit>;
pub type Size = euclid::Size2D<f64, Unit>;

pub fn point(x: f64, y: f64) -> Point {
    euclid::point2(x, y)
}

pub fn vector(x: f64, y: f64) -> Vector {
    euclid::vec2(x, y)
}

/// An axis-aligned rectangle, stored as min/max corners so width/height are
/// always derivable rather than separately mutable (avoids the two going out
/// of sync, which orthogonality checks in the router rely on).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Rect {
    pub fn from_min_max(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    pub fn from_origin_size(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            min_x: x,
            min_y: y,
            max_x: x + width,
            max_y: y + height,
        }
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    pub fn inflate(&self, buffer: f64) -> Self {
        Self {
            min_x: self.min_x - buffer,
            min_y: self.min_y - buffer,
            max_x: self.max_x + buffer,
            max_y: self.max_y + buffer,
        }
    }

    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.min_x < other.max_x
            && self.max_x > other.min_x
            && self.min_y < other.max_y
            && self.max_y > other.min_y
    }
}

/// Round `v` to the nearest multiple of `grid`. `grid <= 0.0` is treated as
/// "no snapping" (returns `v` unchanged) rather than dividing by zero.
pub fn snap(v: f64, grid: f64) -> f64 {
    if grid <= 0.0 {
        return v;
    }
    (v / grid).round() * grid
}

/// Centralized tolerance helper, kept deliberately unused by the rest of the
/// engine today. `spec.md` §9 notes the source uses exact floating-point
/// equality for segment/bend-point comparisons and that a systems-language
/// port should introduce a tolerance here, in one place, only if geometric
/// robustness becomes a problem — so this exists but nothing calls it yet.
pub mod approx {
    pub const EPSILON: f64 = 1e-9;

    pub fn eq(a: f64, b: f64) -> bool {
        (a - b).abs() <= EPSILON
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snap_rounds_to_nearest_multiple() {
        assert_eq!(snap(13.2, 12.7), 12.7);
        assert_eq!(snap(7.5, 12.7), 12.7);
        assert_eq!(snap(0.0, 12.7), 0.0);
    }

    #[test]
    fn snap_with_nonpositive_grid_is_identity() {
        assert_eq!(snap(13.2, 0.0), 13.2);
        assert_eq!(snap(13.2, -1.0), 13.2);
    }

    #[test]
    fn rect_intersects_is_strict() {
        let a = Rect::from_origin_size(0.0, 0.0, 10.0, 10.0);
        let touching = Rect::from_origin_size(10.0, 0.0, 10.0, 10.0);
        let overlapping = Rect::from_origin_size(5.0, 5.0, 10.0, 10.0);
        assert!(!a.intersects(&touching));
        assert!(a.intersects(&overlapping));
    }
}
