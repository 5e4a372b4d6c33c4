//! Downsampling of images that exceed the configured megapixel or dimension caps.

use image::{RgbaImage, imageops};

use crate::error::{EditorError, EditorResult};

/// Dimensions `[width, height]` fits into, or `None` if it already fits.
///
/// The result preserves the aspect ratio within rounding and never exceeds `max_pixels`
/// or `max_dimensions`.
pub fn target_dimensions(
    [width, height]: [u32; 2],
    max_pixels: u64,
    max_dimensions: Option<[u32; 2]>,
) -> Option<[u32; 2]> {
    if width == 0 || height == 0 {
        return None;
    }

    let pixels = u64::from(width) * u64::from(height);
    let mut scale = 1.0_f64;
    if pixels > max_pixels {
        scale = (max_pixels as f64 / pixels as f64).sqrt();
    }
    if let Some([max_width, max_height]) = max_dimensions {
        scale = scale
            .min(f64::from(max_width) / f64::from(width))
            .min(f64::from(max_height) / f64::from(height));
    }
    if scale >= 1.0 {
        return None;
    }

    let mut target_width = ((f64::from(width) * scale).floor() as u32).max(1);
    let mut target_height = ((f64::from(height) * scale).floor() as u32).max(1);

    // floor() keeps us under the cap except for float noise right at the boundary
    while u64::from(target_width) * u64::from(target_height) > max_pixels
        && (target_width > 1 || target_height > 1)
    {
        if target_width >= target_height {
            target_width -= 1;
        } else {
            target_height -= 1;
        }
    }

    Some([target_width, target_height])
}

pub fn exceeds(dimensions: [u32; 2], max_pixels: u64, max_dimensions: Option<[u32; 2]>) -> bool {
    target_dimensions(dimensions, max_pixels, max_dimensions).is_some()
}

pub fn downsample(image: &RgbaImage, [width, height]: [u32; 2]) -> EditorResult<RgbaImage> {
    if width == 0 || height == 0 {
        return Err(EditorError::Resize(format!(
            "cannot resize to {}x{}",
            width, height
        )));
    }
    log::info!(
        "resizing image from {}x{} to {}x{}",
        image.width(),
        image.height(),
        width,
        height
    );
    Ok(imageops::resize(image, width, height, imageops::FilterType::Triangle))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn twelve_megapixels_fit_into_ten() {
        let [width, height] = target_dimensions([4000, 3000], 10_000_000, None).unwrap();
        assert!(u64::from(width) * u64::from(height) <= 10_000_000);
        let ratio = width as f64 / height as f64;
        assert!((ratio - 4.0 / 3.0).abs() < 0.001);
    }

    #[test]
    fn small_images_are_left_alone() {
        assert_eq!(target_dimensions([800, 600], 10_000_000, Some([4096, 4096])), None);
    }

    #[test]
    fn max_dimensions_also_trigger() {
        let target = target_dimensions([8192, 1024], 10_000_000, Some([4096, 4096])).unwrap();
        assert_eq!(target, [4096, 512]);
    }

    #[test]
    fn downsample_rejects_empty_target() {
        let image = RgbaImage::new(4, 4);
        assert!(downsample(&image, [0, 2]).is_err());
        assert_eq!(downsample(&image, [2, 2]).unwrap().dimensions(), (2, 2));
    }
}
