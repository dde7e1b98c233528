use image::{GrayImage, Luma, RgbImage};
use ndarray::Array2;

pub fn rgb_to_gray(image: &RgbImage) -> GrayImage {
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let pixel = image.get_pixel(x, y);
        let lum = 0.299 * pixel[0] as f32 + 0.587 * pixel[1] as f32 + 0.114 * pixel[2] as f32;
        Luma([lum.round().clamp(0.0, 255.0) as u8])
    })
}

pub fn window_mean(window: &Array2<f32>) -> f32 {
    if window.is_empty() {
        return 0.0;
    }
    window.sum() / window.len() as f32
}

pub fn window_stddev(window: &Array2<f32>) -> f32 {
    if window.is_empty() {
        return 0.0;
    }
    let mean = window_mean(window);
    let variance = window
        .iter()
        .map(|&v| {
            let diff = v - mean;
            diff * diff
        })
        .sum::<f32>()
        / window.len() as f32;

    variance.sqrt()
}

/// Paint a `side`×`side` square of `value` with top-left corner `(x, y)`,
/// clipped to the image bounds.
pub fn fill_block(image: &mut GrayImage, x: u32, y: u32, side: u32, value: u8) {
    let (width, height) = image.dimensions();

    for yy in y..(y + side).min(height) {
        for xx in x..(x + side).min(width) {
            image.put_pixel(xx, yy, Luma([value]));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn gray_conversion_weights() {
        let mut rgb = RgbImage::new(2, 1);
        rgb.put_pixel(0, 0, Rgb([255, 0, 0]));
        rgb.put_pixel(1, 0, Rgb([100, 100, 100]));

        let gray = rgb_to_gray(&rgb);
        assert_eq!(gray.get_pixel(0, 0)[0], 76); // 0.299 * 255
        assert_eq!(gray.get_pixel(1, 0)[0], 100); // weights sum to 1
    }

    #[test]
    fn window_statistics() {
        let window = Array2::from_shape_vec((2, 2), vec![1.0, 3.0, 5.0, 7.0]).unwrap();
        assert_eq!(window_mean(&window), 4.0);
        assert!((window_stddev(&window) - 5.0f32.sqrt()).abs() < 1e-6);

        let flat = Array2::from_elem((3, 3), 42.0);
        assert_eq!(window_stddev(&flat), 0.0);
    }

    #[test]
    fn empty_window_statistics() {
        let empty = Array2::<f32>::zeros((0, 0));
        assert_eq!(window_mean(&empty), 0.0);
        assert_eq!(window_stddev(&empty), 0.0);
    }

    #[test]
    fn fill_block_clips_at_border() {
        let mut canvas = GrayImage::new(8, 8);
        fill_block(&mut canvas, 6, 6, 4, 200);

        assert_eq!(canvas.get_pixel(6, 6)[0], 200);
        assert_eq!(canvas.get_pixel(7, 7)[0], 200);
        assert_eq!(canvas.get_pixel(5, 5)[0], 0);
    }
}
