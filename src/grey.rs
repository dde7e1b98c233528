use image::GrayImage;
use ndarray::Array2;

/// Read-only view of an 8-bit luminance plane.
///
/// The detector consumes pixels only through this trait, so synthetic
/// planes can be fed to it in tests without touching any file I/O.
pub trait GreyView {
    fn width(&self) -> u32;

    fn height(&self) -> u32;

    fn sample(&self, x: u32, y: u32) -> u8;

    /// Copy the window with top-left corner `(x, y)` into `dst`.
    ///
    /// The window size is taken from the destination's dimensions; the
    /// caller guarantees the window lies inside the plane.
    fn read_block(&self, dst: &mut Array2<f32>, x: u32, y: u32) {
        let (rows, cols) = dst.dim();
        for dy in 0..rows {
            for dx in 0..cols {
                dst[[dy, dx]] = self.sample(x + dx as u32, y + dy as u32) as f32;
            }
        }
    }
}

impl GreyView for GrayImage {
    fn width(&self) -> u32 {
        self.dimensions().0
    }

    fn height(&self) -> u32 {
        self.dimensions().1
    }

    fn sample(&self, x: u32, y: u32) -> u8 {
        self.get_pixel(x, y)[0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn gray_image_view() {
        let mut plane = GrayImage::new(4, 3);
        plane.put_pixel(2, 1, Luma([200]));

        assert_eq!(GreyView::width(&plane), 4);
        assert_eq!(GreyView::height(&plane), 3);
        assert_eq!(plane.sample(2, 1), 200);
        assert_eq!(plane.sample(0, 0), 0);
    }

    #[test]
    fn read_block_copies_window() {
        let plane = GrayImage::from_fn(8, 8, |x, y| Luma([(x + 10 * y) as u8]));
        let mut window = Array2::zeros((2, 2));
        plane.read_block(&mut window, 3, 5);

        assert_eq!(window[[0, 0]], 53.0);
        assert_eq!(window[[0, 1]], 54.0);
        assert_eq!(window[[1, 0]], 63.0);
        assert_eq!(window[[1, 1]], 64.0);
    }
}
