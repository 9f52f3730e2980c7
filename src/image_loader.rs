//! Pixel source adapter built on the `image` crate
//!
//! Decoding is delegated entirely to `image`; this module only picks the
//! supported formats and converts whatever comes back into an RGBA8
//! [`PixelGrid`]. TIFF files with 16-bit or float samples are narrowed to
//! 8 bits per channel by `image`'s own conversion.

use crate::error::{AnalysisError, Result};
use crate::grid::PixelGrid;
use image::{DynamicImage, RgbaImage};
use std::path::Path;

/// Supported image formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// JPEG image
    Jpeg,
    /// PNG image
    Png,
    /// TIFF image
    Tiff,
}

impl ImageFormat {
    /// Detect format from file extension
    pub fn from_extension(path: &Path) -> Option<ImageFormat> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "jpg" | "jpeg" => Some(ImageFormat::Jpeg),
            "png" => Some(ImageFormat::Png),
            "tiff" | "tif" => Some(ImageFormat::Tiff),
            _ => None,
        }
    }
}

/// Load an image from disk into an RGBA8 pixel grid
///
/// # Errors
///
/// Returns `AnalysisError::InvalidParameter` for unknown extensions and
/// `AnalysisError::ImageLoadError` if the file cannot be opened or decoded.
///
/// # Example
///
/// ```rust,no_run
/// use scan_assay::image_loader::load_image;
/// use std::path::Path;
///
/// let grid = load_image(Path::new("plate.png"))?;
/// println!("Loaded image: {}x{}", grid.width(), grid.height());
/// # Ok::<(), scan_assay::AnalysisError>(())
/// ```
pub fn load_image(path: &Path) -> Result<PixelGrid> {
    let format = ImageFormat::from_extension(path)
        .ok_or_else(|| AnalysisError::invalid("image_format", path.display()))?;

    let img = image::open(path).map_err(|e| {
        AnalysisError::image_load(format!("Failed to decode image: {}", path.display()), e)
    })?;

    log::debug!(
        "decoded {:?} image {}x{} from {}",
        format,
        img.width(),
        img.height(),
        path.display()
    );

    from_dynamic_image(img)
}

/// Convert any decoded image into an RGBA8 pixel grid
pub fn from_dynamic_image(img: DynamicImage) -> Result<PixelGrid> {
    from_rgba_image(img.into_rgba8())
}

/// Wrap an `image` RGBA8 buffer without copying
pub fn from_rgba_image(img: RgbaImage) -> Result<PixelGrid> {
    let (width, height) = img.dimensions();
    PixelGrid::new(width, height, img.into_raw())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn test_format_detection() {
        assert_eq!(
            ImageFormat::from_extension(Path::new("plate.JPG")),
            Some(ImageFormat::Jpeg)
        );
        assert_eq!(
            ImageFormat::from_extension(Path::new("plate.tif")),
            Some(ImageFormat::Tiff)
        );
        assert_eq!(ImageFormat::from_extension(Path::new("plate.heic")), None);
        assert_eq!(ImageFormat::from_extension(Path::new("plate")), None);
    }

    #[test]
    fn test_rgb_image_becomes_opaque_rgba() {
        let mut img = RgbImage::new(2, 1);
        img.put_pixel(0, 0, Rgb([255, 0, 0]));
        img.put_pixel(1, 0, Rgb([0, 0, 255]));

        let grid = from_dynamic_image(DynamicImage::ImageRgb8(img)).unwrap();
        assert_eq!(grid.width(), 2);
        assert_eq!(grid.height(), 1);
        assert_eq!(grid.as_raw(), &[255, 0, 0, 255, 0, 0, 255, 255]);
    }

    #[test]
    fn test_unknown_extension_rejected() {
        let err = load_image(Path::new("plate.xyz")).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidParameter { .. }));
    }

    #[test]
    fn test_missing_file_is_load_error() {
        let err = load_image(Path::new("does/not/exist.png")).unwrap_err();
        assert!(matches!(err, AnalysisError::ImageLoadError { .. }));
    }
}
