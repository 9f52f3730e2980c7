//! Color-similarity region growing ("magic wand")
//!
//! Grows a 4-connected region from a seed pixel, accepting every neighbour
//! whose RGB distance to the seed color is within tolerance, and reports
//! the axis-aligned bounding rectangle of the matched pixels.
//!
//! The exact matched mask is discarded: the resulting ROI is the bounding
//! rectangle, so sampling it also averages any non-matching pixels inside
//! that rectangle. This coarsening keeps every ROI a plain rect or circle.

use crate::constants::wand::DEFAULT_TOLERANCE_PERCENT;
use crate::error::{AnalysisError, Result};
use crate::grid::PixelGrid;
use crate::roi::Rect;

/// Seeded flood-fill segmenter
#[derive(Debug, Clone)]
pub struct RegionGrower {
    tolerance_percent: f64,
    max_visits: Option<usize>,
}

impl Default for RegionGrower {
    fn default() -> Self {
        Self::new()
    }
}

impl RegionGrower {
    /// Create a region grower with the default tolerance and no visit limit
    pub fn new() -> Self {
        Self {
            tolerance_percent: DEFAULT_TOLERANCE_PERCENT,
            max_visits: None,
        }
    }

    /// Create a region grower with a custom tolerance (clamped to 0-100%)
    pub fn with_tolerance(tolerance_percent: f64) -> Self {
        Self {
            tolerance_percent: tolerance_percent.clamp(0.0, 100.0),
            max_visits: None,
        }
    }

    /// Abort once more than this many pixels match
    ///
    /// Lets a caller bound the cost of a single click on a very large image.
    pub fn with_max_visits(mut self, max_visits: usize) -> Self {
        self.max_visits = Some(max_visits);
        self
    }

    pub fn tolerance_percent(&self) -> f64 {
        self.tolerance_percent
    }

    /// Grow a region from `(seed_x, seed_y)`
    ///
    /// # Returns
    ///
    /// The bounding rectangle of the connected matching pixels, or `None`
    /// if the seed is outside the image.
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::RegionLimitExceeded` if a visit limit is set
    /// and the region grows beyond it.
    pub fn grow(&self, grid: &PixelGrid, seed_x: u32, seed_y: u32) -> Result<Option<Rect>> {
        let (width, height) = (grid.width(), grid.height());
        if !grid.in_bounds(i64::from(seed_x), i64::from(seed_y)) {
            log::debug!("wand seed ({}, {}) outside {}x{}", seed_x, seed_y, width, height);
            return Ok(None);
        }

        let reference = grid.rgb(seed_x, seed_y);
        let tolerance = self.tolerance_percent / 100.0 * 255.0;
        let tolerance_sq = tolerance * tolerance;
        let matches = |rgb: [u8; 3]| {
            let dr = f64::from(rgb[0]) - f64::from(reference[0]);
            let dg = f64::from(rgb[1]) - f64::from(reference[1]);
            let db = f64::from(rgb[2]) - f64::from(reference[2]);
            dr * dr + dg * dg + db * db <= tolerance_sq
        };

        let w = width as usize;
        let mut seen = vec![false; w * height as usize];
        let mut stack = vec![(seed_x, seed_y)];
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (width, height, 0u32, 0u32);
        let mut matched = 0usize;

        while let Some((x, y)) = stack.pop() {
            let idx = y as usize * w + x as usize;
            if seen[idx] {
                continue;
            }
            seen[idx] = true;
            if !matches(grid.rgb(x, y)) {
                continue;
            }

            matched += 1;
            if let Some(limit) = self.max_visits {
                if matched > limit {
                    log::warn!("wand aborted after {} pixels", limit);
                    return Err(AnalysisError::RegionLimitExceeded { limit });
                }
            }

            min_x = min_x.min(x);
            max_x = max_x.max(x);
            min_y = min_y.min(y);
            max_y = max_y.max(y);

            if x > 0 {
                stack.push((x - 1, y));
            }
            if x + 1 < width {
                stack.push((x + 1, y));
            }
            if y > 0 {
                stack.push((x, y - 1));
            }
            if y + 1 < height {
                stack.push((x, y + 1));
            }
        }

        if matched == 0 {
            return Ok(None);
        }

        let rect = Rect::new(min_x, min_y, max_x - min_x + 1, max_y - min_y + 1);
        log::debug!(
            "wand matched {} pixels from ({}, {}), bounding {:?}",
            matched,
            seed_x,
            seed_y,
            rect
        );
        Ok(Some(rect))
    }
}

/// Grow a region with the given tolerance and no visit limit
pub fn grow(
    grid: &PixelGrid,
    seed_x: u32,
    seed_y: u32,
    tolerance_percent: f64,
) -> Option<Rect> {
    // without a visit limit the grower has no error path
    RegionGrower::with_tolerance(tolerance_percent)
        .grow(grid, seed_x, seed_y)
        .unwrap_or(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 10x10 white image with a red square covering x 2..5, y 3..7
    fn red_square() -> PixelGrid {
        let mut data = vec![255u8; 10 * 10 * 4];
        for y in 3..7 {
            for x in 2..5 {
                let idx = (y * 10 + x) * 4;
                data[idx..idx + 4].copy_from_slice(&[255, 0, 0, 255]);
            }
        }
        PixelGrid::new(10, 10, data).unwrap()
    }

    #[test]
    fn test_uniform_image_zero_tolerance_covers_everything() {
        let grid = PixelGrid::filled(16, 9, [80, 80, 80]).unwrap();
        let rect = grow(&grid, 7, 4, 0.0).unwrap();
        assert_eq!(rect, Rect::new(0, 0, 16, 9));
    }

    #[test]
    fn test_square_is_bounded() {
        let rect = grow(&red_square(), 3, 4, 5.0).unwrap();
        assert_eq!(rect, Rect::new(2, 3, 3, 4));
    }

    #[test]
    fn test_background_seed_returns_full_frame() {
        // Background wraps around the square, so its bounding box is the image
        let rect = grow(&red_square(), 0, 0, 5.0).unwrap();
        assert_eq!(rect, Rect::new(0, 0, 10, 10));
    }

    #[test]
    fn test_large_tolerance_swallows_everything() {
        let rect = grow(&red_square(), 3, 4, 100.0).unwrap();
        assert_eq!(rect, Rect::new(0, 0, 10, 10));
    }

    #[test]
    fn test_out_of_bounds_seed() {
        assert!(grow(&red_square(), 10, 0, 5.0).is_none());
        assert!(grow(&red_square(), 0, 42, 5.0).is_none());
    }

    #[test]
    fn test_diagonal_pixels_not_connected() {
        // Two black pixels touching only at a corner
        let mut data = vec![255u8; 3 * 3 * 4];
        for (x, y) in [(0usize, 0usize), (1, 1)] {
            let idx = (y * 3 + x) * 4;
            data[idx..idx + 3].copy_from_slice(&[0, 0, 0]);
        }
        let grid = PixelGrid::new(3, 3, data).unwrap();
        assert_eq!(grow(&grid, 0, 0, 1.0).unwrap(), Rect::new(0, 0, 1, 1));
    }

    #[test]
    fn test_visit_limit_aborts() {
        let grid = PixelGrid::filled(50, 50, [1, 2, 3]).unwrap();
        let err = RegionGrower::with_tolerance(0.0)
            .with_max_visits(100)
            .grow(&grid, 25, 25)
            .unwrap_err();
        assert!(matches!(err, AnalysisError::RegionLimitExceeded { limit: 100 }));
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_default_tolerance() {
        let grower = RegionGrower::default();
        assert_eq!(grower.tolerance_percent(), 15.0);

        // 20 gray levels apart: distance ~34.6, under 15% of 255 (38.25)
        let mut data = vec![100u8; 8];
        data[4..7].copy_from_slice(&[120, 120, 120]);
        let grid = PixelGrid::new(2, 1, data).unwrap();
        assert_eq!(grower.grow(&grid, 0, 0).unwrap(), Some(Rect::new(0, 0, 2, 1)));
    }

    #[test]
    fn test_visit_limit_counts_matched_pixels() {
        // 4x4 image with a single matching pixel: 16 visits but one match
        let mut data = vec![0u8; 4 * 4 * 4];
        data[..3].copy_from_slice(&[255, 255, 255]);
        let grid = PixelGrid::new(4, 4, data).unwrap();
        let rect = RegionGrower::with_tolerance(0.0)
            .with_max_visits(1)
            .grow(&grid, 0, 0)
            .unwrap();
        assert_eq!(rect, Some(Rect::new(0, 0, 1, 1)));
    }

    #[test]
    fn test_tolerance_clamped() {
        assert_eq!(RegionGrower::with_tolerance(250.0).tolerance_percent(), 100.0);
        assert_eq!(RegionGrower::with_tolerance(-3.0).tolerance_percent(), 0.0);
    }
}
