use image::imageops::FilterType;
use image::{DynamicImage, RgbImage};
use ndarray::Array4;

use crate::error::ServiceError;

/// Decode an upload and turn it into the `[1, size, size, 3]` tensor the network expects.
pub fn preprocess(contents: &[u8], size: u32) -> Result<Array4<f32>, ServiceError> {
    let img = image::load_from_memory(contents)?;
    tracing::debug!(
        width = img.width(),
        height = img.height(),
        color = ?img.color(),
        "Decoded upload"
    );
    Ok(to_input_tensor(&img, size))
}

/// Stretch to `size`×`size` (aspect ratio is not kept) and scale intensities into [0, 1].
pub fn to_input_tensor(img: &DynamicImage, size: u32) -> Array4<f32> {
    let rgb = resize_rgb(img.to_rgb8(), size);
    let side = size as usize;

    Array4::from_shape_fn((1, side, side, 3), |(_, y, x, c)| {
        rgb.get_pixel(x as u32, y as u32)[c] as f32 / 255.0
    })
}

fn resize_rgb(rgb: RgbImage, size: u32) -> RgbImage {
    if rgb.dimensions() == (size, size) {
        return rgb;
    }
    image::imageops::resize(&rgb, size, size, FilterType::Nearest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, ImageOutputFormat, Luma, Rgb};
    use std::io::Cursor;

    fn png_bytes(img: DynamicImage) -> Vec<u8> {
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), ImageOutputFormat::Png)
            .unwrap();
        buf
    }

    #[test]
    fn solid_color_becomes_uniform_tensor() {
        let img = RgbImage::from_pixel(224, 224, Rgb([255, 51, 0]));
        let tensor = preprocess(&png_bytes(DynamicImage::ImageRgb8(img)), 224).unwrap();

        assert_eq!(tensor.shape(), &[1, 224, 224, 3]);
        assert!(tensor.slice(ndarray::s![.., .., .., 0]).iter().all(|&v| v == 1.0));
        assert!(tensor
            .slice(ndarray::s![.., .., .., 1])
            .iter()
            .all(|&v| (v - 0.2).abs() < 1e-6));
        assert!(tensor.slice(ndarray::s![.., .., .., 2]).iter().all(|&v| v == 0.0));
    }

    #[test]
    fn non_square_input_is_stretched() {
        let mut img = RgbImage::from_pixel(400, 100, Rgb([0, 0, 0]));
        // right half white
        for y in 0..100 {
            for x in 200..400 {
                img.put_pixel(x, y, Rgb([255, 255, 255]));
            }
        }

        let tensor = to_input_tensor(&DynamicImage::ImageRgb8(img), 224);
        assert_eq!(tensor.shape(), &[1, 224, 224, 3]);
        assert_eq!(tensor[[0, 0, 10, 0]], 0.0);
        assert_eq!(tensor[[0, 223, 213, 2]], 1.0);
    }

    #[test]
    fn grayscale_is_expanded_to_three_channels() {
        let img = GrayImage::from_pixel(32, 32, Luma([102]));
        let tensor = preprocess(&png_bytes(DynamicImage::ImageLuma8(img)), 224).unwrap();

        assert_eq!(tensor.shape(), &[1, 224, 224, 3]);
        let expected = 102.0 / 255.0;
        assert!(tensor.iter().all(|&v| (v - expected).abs() < 1e-6));
    }

    #[test]
    fn values_stay_in_unit_range() {
        let img = RgbImage::from_fn(64, 48, |x, y| Rgb([(x * 4) as u8, (y * 5) as u8, 255]));
        let tensor = to_input_tensor(&DynamicImage::ImageRgb8(img), 224);
        assert!(tensor.iter().all(|&v| (0.0..=1.0).contains(&v)));
    }

    #[test]
    fn undecodable_bytes_are_a_decode_error() {
        let err = preprocess(b"%PDF-1.4 not an image", 224).unwrap_err();
        assert!(matches!(err, ServiceError::Decode(_)));

        let err = preprocess(&[], 224).unwrap_err();
        assert!(matches!(err, ServiceError::Decode(_)));
    }
}
