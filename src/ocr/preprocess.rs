use image::imageops::{self, FilterType};
use image::RgbaImage;

/// Enlarges an image by an integer factor with nearest-neighbour sampling.
///
/// Tesseract reads the small in-game font far more reliably at 2x. Factors
/// of 0 or 1 return an unchanged copy.
pub fn upscale_nearest(img: &RgbaImage, factor: u32) -> RgbaImage {
    if factor <= 1 {
        return img.clone();
    }
    let (w, h) = img.dimensions();
    imageops::resize(
        img,
        w.saturating_mul(factor),
        h.saturating_mul(factor),
        FilterType::Nearest,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_upscale_doubles_dimensions() {
        let img = RgbaImage::from_fn(3, 2, |x, y| Rgba([x as u8 * 10, y as u8 * 10, 0, 255]));
        let scaled = upscale_nearest(&img, 2);
        assert_eq!(scaled.dimensions(), (6, 4));
        // Each source pixel becomes a 2x2 block
        assert_eq!(scaled.get_pixel(0, 0), img.get_pixel(0, 0));
        assert_eq!(scaled.get_pixel(1, 1), img.get_pixel(0, 0));
        assert_eq!(scaled.get_pixel(5, 3), img.get_pixel(2, 1));
    }

    #[test]
    fn test_factor_one_is_noop() {
        let img = RgbaImage::from_pixel(4, 4, Rgba([1, 2, 3, 255]));
        assert_eq!(upscale_nearest(&img, 1), img);
        assert_eq!(upscale_nearest(&img, 0), img);
    }
}
