//! Perceptual hashing.

use image::DynamicImage;
use image_hasher::{HashAlg, HasherConfig};

/// Compute the 64-bit perceptual hash of a decoded image, hex-encoded.
pub fn perceptual_hash(image: &DynamicImage) -> String {
    let hasher = HasherConfig::new()
        .hash_alg(HashAlg::DoubleGradient)
        .hash_size(8, 8)
        .to_hasher();
    let hash = hasher.hash_image(image);
    let mut hex = String::with_capacity(hash.as_bytes().len() * 2);
    for byte in hash.as_bytes() {
        hex.push_str(&format!("{byte:02x}"));
    }
    hex
}

/// Decode and hash raw bytes in one step.
pub fn perceptual_hash_of(bytes: &[u8]) -> Result<String, crate::ScreenError> {
    let image = image::load_from_memory(bytes)?;
    Ok(perceptual_hash(&image))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn gradient(width: u32, height: u32, tilt: f32) -> DynamicImage {
        let mut img = RgbImage::new(width, height);
        for (x, y, pixel) in img.enumerate_pixels_mut() {
            let v = ((x as f32 + tilt * y as f32) / (width as f32 + tilt * height as f32) * 255.0)
                as u8;
            *pixel = Rgb([v, v, v]);
        }
        DynamicImage::ImageRgb8(img)
    }

    #[test]
    fn test_hash_is_stable() {
        let img = gradient(64, 64, 1.0);
        assert_eq!(perceptual_hash(&img), perceptual_hash(&img));
    }

    #[test]
    fn test_hash_survives_rescale() {
        // The same picture at a different resolution hashes identically -
        // the property the duplicate index relies on.
        let original = gradient(64, 64, 1.0);
        let rescaled = original.resize_exact(96, 96, image::imageops::FilterType::Triangle);
        assert_eq!(perceptual_hash(&original), perceptual_hash(&rescaled));
    }

    #[test]
    fn test_different_content_differs() {
        let a = gradient(64, 64, 1.0);
        let b = gradient(64, 64, -1.0);
        assert_ne!(perceptual_hash(&a), perceptual_hash(&b));
    }

    #[test]
    fn test_hash_is_hex_64_bit() {
        let hex = perceptual_hash(&gradient(32, 32, 0.5));
        assert_eq!(hex.len(), 16);
        assert!(hex.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
