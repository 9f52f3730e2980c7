//! Region-of-interest geometry
//!
//! A region is either an axis-aligned rectangle or a circle. Both variants
//! implement [`PixelRegion`], so sampling and hit-testing never branch on
//! the shape outside this module.

use serde::{Deserialize, Serialize};

use crate::color::Sample;

/// Capability interface shared by every ROI shape
pub trait PixelRegion {
    /// Number of lattice points covered by the shape (ignoring image bounds)
    fn area(&self) -> usize;

    /// Whether the pixel at (x, y) belongs to the shape
    fn contains(&self, x: i64, y: i64) -> bool;

    /// Inclusive bounding box `(x0, y0, x1, y1)`
    fn bounds(&self) -> (i64, i64, i64, i64);

    /// Visit every pixel of the shape in row-major order
    fn for_each_pixel<F: FnMut(i64, i64)>(&self, f: F) {
        self.for_each_pixel_within(self.bounds(), f);
    }

    /// Visit the pixels of the shape that also lie in the inclusive `clip` box
    ///
    /// Cost is bounded by the intersection of `clip` with the shape's bounds.
    fn for_each_pixel_within<F: FnMut(i64, i64)>(&self, clip: (i64, i64, i64, i64), mut f: F) {
        let (bx0, by0, bx1, by1) = self.bounds();
        let (x0, y0) = (bx0.max(clip.0), by0.max(clip.1));
        let (x1, y1) = (bx1.min(clip.2), by1.min(clip.3));
        for y in y0..=y1 {
            for x in x0..=x1 {
                if self.contains(x, y) {
                    f(x, y);
                }
            }
        }
    }
}

/// Axis-aligned rectangle: top-left corner plus extent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }
}

impl PixelRegion for Rect {
    fn area(&self) -> usize {
        self.w as usize * self.h as usize
    }

    fn contains(&self, x: i64, y: i64) -> bool {
        let (x0, y0) = (i64::from(self.x), i64::from(self.y));
        x >= x0 && y >= y0 && x < x0 + i64::from(self.w) && y < y0 + i64::from(self.h)
    }

    fn bounds(&self) -> (i64, i64, i64, i64) {
        let (x0, y0) = (i64::from(self.x), i64::from(self.y));
        (
            x0,
            y0,
            x0 + i64::from(self.w) - 1,
            y0 + i64::from(self.h) - 1,
        )
    }
}

/// Circle: center plus integer radius, boundary inclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Circle {
    pub cx: u32,
    pub cy: u32,
    pub r: u32,
}

impl Circle {
    pub fn new(cx: u32, cy: u32, r: u32) -> Self {
        Self { cx, cy, r }
    }
}

impl PixelRegion for Circle {
    /// Saturates at `usize::MAX`; runs in O(r)
    fn area(&self) -> usize {
        let r = i128::from(self.r);
        let r2 = r * r;
        let count: u128 = (-r..=r)
            .map(|dy| 2 * half_chord(r2 - dy * dy) as u128 + 1)
            .sum();
        usize::try_from(count).unwrap_or(usize::MAX)
    }

    fn contains(&self, x: i64, y: i64) -> bool {
        let dx = i128::from(x) - i128::from(self.cx);
        let dy = i128::from(y) - i128::from(self.cy);
        let r = i128::from(self.r);
        dx * dx + dy * dy <= r * r
    }

    fn bounds(&self) -> (i64, i64, i64, i64) {
        let (cx, cy, r) = (i64::from(self.cx), i64::from(self.cy), i64::from(self.r));
        (cx - r, cy - r, cx + r, cy + r)
    }
}

/// Largest `dx >= 0` with `dx² <= rem`
fn half_chord(rem: i128) -> i128 {
    let mut dx = (rem as f64).sqrt() as i128;
    while dx * dx > rem {
        dx -= 1;
    }
    while (dx + 1) * (dx + 1) <= rem {
        dx += 1;
    }
    dx
}

/// ROI geometry as it appears in saved sessions and UI requests
///
/// Serialized as `{"type": "rect", "x", "y", "w", "h"}` or
/// `{"type": "circle", "cx", "cy", "r"}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Geometry {
    Rect(Rect),
    Circle(Circle),
}

impl Geometry {
    /// Zero-width, zero-height or zero-radius shapes cover no pixels
    pub fn is_degenerate(&self) -> bool {
        match self {
            Geometry::Rect(r) => r.w == 0 || r.h == 0,
            Geometry::Circle(c) => c.r == 0,
        }
    }
}

impl PixelRegion for Geometry {
    fn area(&self) -> usize {
        match self {
            Geometry::Rect(r) => r.area(),
            Geometry::Circle(c) => c.area(),
        }
    }

    fn contains(&self, x: i64, y: i64) -> bool {
        match self {
            Geometry::Rect(r) => r.contains(x, y),
            Geometry::Circle(c) => c.contains(x, y),
        }
    }

    fn bounds(&self) -> (i64, i64, i64, i64) {
        match self {
            Geometry::Rect(r) => r.bounds(),
            Geometry::Circle(c) => c.bounds(),
        }
    }
}

impl From<Rect> for Geometry {
    fn from(rect: Rect) -> Self {
        Geometry::Rect(rect)
    }
}

impl From<Circle> for Geometry {
    fn from(circle: Circle) -> Self {
        Geometry::Circle(circle)
    }
}

/// A measured region: identity, immutable geometry and its cached sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Roi {
    pub id: u32,
    pub geometry: Geometry,
    pub sample: Sample,
}
