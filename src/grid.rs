//! Immutable RGBA pixel grid shared by the sampler and the region grower

use crate::error::{AnalysisError, Result};

/// Decoded RGBA8 image, row-major, 4 bytes per pixel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelGrid {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl PixelGrid {
    /// Wrap a decoded RGBA8 buffer
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::InvalidParameter` if either dimension is zero
    /// or the buffer length is not `width * height * 4`.
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(AnalysisError::invalid(
                "dimensions",
                format!("{}x{}", width, height),
            ));
        }
        let expected = width as usize * height as usize * 4;
        if data.len() != expected {
            return Err(AnalysisError::invalid(
                "buffer_len",
                format!("{} (expected {})", data.len(), expected),
            ));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Build a grid filled with a single opaque color
    pub fn filled(width: u32, height: u32, rgb: [u8; 3]) -> Result<Self> {
        let n = width as usize * height as usize;
        let data = std::iter::repeat([rgb[0], rgb[1], rgb[2], 255])
            .take(n)
            .flatten()
            .collect();
        Self::new(width, height, data)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw RGBA bytes
    pub fn as_raw(&self) -> &[u8] {
        &self.data
    }

    /// Inclusive pixel box `(0, 0, width - 1, height - 1)`
    pub fn bounds(&self) -> (i64, i64, i64, i64) {
        (0, 0, i64::from(self.width) - 1, i64::from(self.height) - 1)
    }

    /// Whether (x, y) lies on the grid
    pub fn in_bounds(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && x < i64::from(self.width) && y < i64::from(self.height)
    }

    /// RGB channels of the pixel at (x, y); alpha is ignored
    ///
    /// Callers must stay in bounds.
    #[inline]
    pub fn rgb(&self, x: u32, y: u32) -> [u8; 3] {
        let idx = self.offset(x, y);
        [self.data[idx], self.data[idx + 1], self.data[idx + 2]]
    }

    #[inline]
    fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * 4
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_mismatched_buffer() {
        let err = PixelGrid::new(2, 2, vec![0; 15]).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidParameter { .. }));
    }

    #[test]
    fn test_rejects_zero_dimension() {
        assert!(PixelGrid::new(0, 4, Vec::new()).is_err());
    }

    #[test]
    fn test_pixel_access_row_major() {
        let mut data = vec![0u8; 3 * 2 * 4];
        // pixel (2, 1)
        let idx = (1 * 3 + 2) * 4;
        data[idx..idx + 4].copy_from_slice(&[10, 20, 30, 255]);
        let grid = PixelGrid::new(3, 2, data).unwrap();
        assert_eq!(grid.rgb(2, 1), [10, 20, 30]);
        assert_eq!(grid.rgb(0, 0), [0, 0, 0]);
    }

    #[test]
    fn test_filled_grid() {
        let grid = PixelGrid::filled(4, 3, [1, 2, 3]).unwrap();
        assert_eq!(grid.as_raw().len(), 48);
        assert_eq!(grid.rgb(3, 2), [1, 2, 3]);
        assert!(grid.in_bounds(3, 2));
        assert!(!grid.in_bounds(4, 0));
        assert!(!grid.in_bounds(-1, 0));
        assert_eq!(grid.bounds(), (0, 0, 3, 2));
    }
}
