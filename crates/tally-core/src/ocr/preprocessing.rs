//! Image binarization ahead of recognition.

use image::{DynamicImage, GrayImage, Luma};
use tracing::debug;

/// Convert to grayscale and apply an adaptive mean threshold.
///
/// Each pixel is compared with the mean of the `block_size` x `block_size`
/// window around it minus `offset`; brighter pixels become white, the rest
/// black. Windows are clipped at the image border.
pub fn binarize(image: &DynamicImage, block_size: u32, offset: i32) -> GrayImage {
    let gray = image.to_luma8();
    let (width, height) = gray.dimensions();
    let radius = (block_size.max(3) / 2) as i64;

    debug!(
        "Binarizing {}x{} image (block {}, offset {})",
        width, height, block_size, offset
    );

    let integral = integral_image(&gray);
    let stride = width as usize + 1;
    let mut out = GrayImage::new(width, height);

    for y in 0..height as i64 {
        let y0 = (y - radius).max(0) as usize;
        let y1 = (y + radius + 1).min(height as i64) as usize;

        for x in 0..width as i64 {
            let x0 = (x - radius).max(0) as usize;
            let x1 = (x + radius + 1).min(width as i64) as usize;

            let sum = integral[y1 * stride + x1] + integral[y0 * stride + x0]
                - integral[y0 * stride + x1]
                - integral[y1 * stride + x0];
            let area = ((x1 - x0) * (y1 - y0)) as i64;
            let threshold = sum as i64 / area - offset as i64;

            let value = gray.get_pixel(x as u32, y as u32)[0] as i64;
            let pixel = if value > threshold { 255 } else { 0 };
            out.put_pixel(x as u32, y as u32, Luma([pixel]));
        }
    }

    out
}

// Summed-area table with a zero first row and column.
fn integral_image(gray: &GrayImage) -> Vec<u64> {
    let (width, height) = gray.dimensions();
    let stride = width as usize + 1;
    let mut table = vec![0u64; stride * (height as usize + 1)];

    for y in 0..height as usize {
        let mut row_sum = 0u64;
        for x in 0..width as usize {
            row_sum += gray.get_pixel(x as u32, y as u32)[0] as u64;
            table[(y + 1) * stride + x + 1] = table[y * stride + x + 1] + row_sum;
        }
    }

    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_image_turns_white() {
        let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(8, 8, Luma([120])));
        let out = binarize(&img, 31, 2);

        assert!(out.pixels().all(|p| p[0] == 255));
    }

    #[test]
    fn test_dark_stroke_on_light_background() {
        let mut gray = GrayImage::from_pixel(9, 9, Luma([200]));
        for y in 0..9 {
            gray.put_pixel(4, y, Luma([20]));
        }

        let out = binarize(&DynamicImage::ImageLuma8(gray), 5, 2);

        assert_eq!(out.get_pixel(4, 4)[0], 0);
        assert_eq!(out.get_pixel(0, 4)[0], 255);
        assert_eq!(out.get_pixel(8, 0)[0], 255);
    }

    #[test]
    fn test_integral_image() {
        let gray = GrayImage::from_raw(2, 2, vec![1, 2, 3, 4]).unwrap();
        let table = integral_image(&gray);

        assert_eq!(table, vec![0, 0, 0, 0, 1, 3, 0, 4, 10]);
    }
}
