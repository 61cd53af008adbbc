//! Whole-buffer pixel maps: one pixel per byte (or per run of bytes when the
//! buffer is larger than the image), laid out along the gilbert curve or in
//! plain reading order.

use log::debug;

use crate::{
    color::{average_color, byte_class_color, gray, RgbImage},
    curve::gilbert,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum PixelStyle {
    /// Average of [`byte_class_color`] over the bytes of a pixel.
    #[default]
    ByteClass,
    /// Mean byte value on the green ramp.
    Gray,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Layout {
    #[default]
    Hilbert,
    Linear,
}

/// Geometry of a pixel map: image size and how many bytes each pixel covers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelGrid {
    pub width: usize,
    pub height: usize,
    pub bytes_per_pixel: usize,
}

impl PixelGrid {
    /// Smallest grid of `width` columns that shows `len` bytes in at most
    /// `max_height` rows. The grid always has one spare row.
    pub fn fit(len: usize, width: usize, max_height: usize) -> Option<Self> {
        if len == 0 || width == 0 || max_height == 0 {
            return None;
        }
        let capacity = width * max_height;
        let bytes_per_pixel = if len <= capacity {
            1
        } else {
            len / capacity + 1
        };
        Some(Self {
            width,
            height: len / bytes_per_pixel / width + 1,
            bytes_per_pixel,
        })
    }
}

/// Renders `bytes` into an image `width` pixels wide and at most
/// `max_height + 1` rows tall. Unused pixels stay black.
pub fn pixel_map(
    bytes: &[u8],
    width: usize,
    max_height: usize,
    style: PixelStyle,
    layout: Layout,
) -> RgbImage {
    let Some(grid) = PixelGrid::fit(bytes.len(), width, max_height) else {
        return RgbImage::new(0, 0);
    };
    debug!(
        "pixel map: {} bytes on {}x{}, {} bytes per pixel",
        bytes.len(),
        grid.width,
        grid.height,
        grid.bytes_per_pixel
    );

    let mut image = RgbImage::new(grid.width as u32, grid.height as u32);
    let colors = bytes.chunks(grid.bytes_per_pixel).map(|run| match style {
        PixelStyle::ByteClass => average_color(run.iter().map(|&b| byte_class_color(b))),
        PixelStyle::Gray => {
            let sum: u64 = run.iter().map(|&b| u64::from(b)).sum();
            gray((sum / run.len() as u64) as u8)
        }
    });

    match layout {
        Layout::Hilbert => {
            let curve = gilbert(grid.width, grid.height);
            for ((x, y), color) in curve.iter().zip(colors) {
                image.put_pixel(x as u32, y as u32, color);
            }
        }
        Layout::Linear => {
            for (i, color) in colors.enumerate().take(grid.width * grid.height) {
                let (x, y) = (i % grid.width, i / grid.width);
                image.put_pixel(x as u32, y as u32, color);
            }
        }
    }
    image
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::{BLACK, WHITE};
    use image::Rgb;

    #[test]
    fn grid_fits_small_buffers_one_to_one() {
        let grid = PixelGrid::fit(100, 16, 16).unwrap();
        assert_eq!(grid, PixelGrid { width: 16, height: 7, bytes_per_pixel: 1 });
        assert!(PixelGrid::fit(0, 16, 16).is_none());
        assert!(PixelGrid::fit(10, 0, 16).is_none());
    }

    #[test]
    fn grid_downsamples_large_buffers() {
        let grid = PixelGrid::fit(1000, 10, 10).unwrap();
        assert_eq!(grid.bytes_per_pixel, 11);
        assert_eq!(grid.height, 1000 / 11 / 10 + 1);
        assert!(grid.width * grid.height * grid.bytes_per_pixel >= 1000);
    }

    #[test]
    fn linear_layout_reads_in_order() {
        let image = pixel_map(&[0x00, 0x41, 0xff], 2, 4, PixelStyle::ByteClass, Layout::Linear);
        assert_eq!(image.dimensions(), (2, 2));
        let pixels: Vec<Rgb<u8>> = image.pixels().copied().collect();
        assert_eq!(pixels, [BLACK, Rgb([0, 0xf0, 0]), WHITE, BLACK]);
    }

    #[test]
    fn hilbert_layout_places_every_byte_once() {
        let bytes: Vec<u8> = (1..=60).collect();
        let image = pixel_map(&bytes, 8, 8, PixelStyle::Gray, Layout::Hilbert);
        let mut seen: Vec<u8> = image.pixels().map(|p| p.0[1]).filter(|&g| g != 0).collect();
        seen.sort_unstable();
        assert_eq!(seen, bytes);
        // the curve starts in the top-left corner
        assert_eq!(image.get_pixel(0, 0), &Rgb([20, 1, 20]));
    }

    #[test]
    fn gray_averages_runs() {
        let bytes = [10u8, 20, 30, 40, 50, 60];
        let image = pixel_map(&bytes, 1, 2, PixelStyle::Gray, Layout::Linear);
        // 6 bytes in 2 pixels: 4 bytes per pixel
        assert_eq!(image.get_pixel(0, 0), &Rgb([20, 25, 20]));
        assert_eq!(image.get_pixel(0, 1), &Rgb([20, 55, 20]));
    }

    #[test]
    fn empty_input_is_empty_image() {
        let image = pixel_map(&[], 8, 8, PixelStyle::ByteClass, Layout::Hilbert);
        assert_eq!(image.dimensions(), (0, 0));
    }
}
