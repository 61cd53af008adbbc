//! View parameters with their default values.

use crate::{
    color::RgbImage,
    dtype::ElementType,
    entropy::{entropy, EntropyProfile, DEFAULT_BLOCK_SIZE},
    histogram::{histogram_2d, histogram_3d, CloudPoint},
    pixmap::{pixel_map, Layout, PixelStyle},
};

pub use crate::dotplot::DotPlotParams;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HistogramConfig {
    /// Cells with fewer hits are not drawn.
    pub threshold: u32,
    /// Divisor applied to counts before coloring.
    pub scale: f32,
    pub element: ElementType,
    /// Whether 3D trigrams overlap.
    pub overlap: bool,
}

impl Default for HistogramConfig {
    fn default() -> Self {
        Self {
            threshold: 4,
            scale: 100.0,
            element: ElementType::U8,
            overlap: true,
        }
    }
}

impl HistogramConfig {
    pub fn digram_image(&self, bytes: &[u8]) -> RgbImage {
        histogram_2d(bytes, self.element).to_image(self.threshold, self.scale)
    }

    pub fn trigram_cloud(&self, bytes: &[u8]) -> Vec<CloudPoint> {
        histogram_3d(bytes, self.element, self.overlap).points(self.threshold)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EntropyConfig {
    pub block_size: usize,
    /// Stretch the plotted profile to its own min..max range.
    pub normalize: bool,
}

impl Default for EntropyConfig {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            normalize: true,
        }
    }
}

impl EntropyConfig {
    pub fn profile(&self, bytes: &[u8]) -> EntropyProfile {
        entropy(bytes, self.block_size.max(1))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelMapConfig {
    pub width: usize,
    pub max_height: usize,
    pub style: PixelStyle,
    pub layout: Layout,
}

impl Default for PixelMapConfig {
    fn default() -> Self {
        Self {
            width: 512,
            max_height: 1024,
            style: PixelStyle::ByteClass,
            layout: Layout::Hilbert,
        }
    }
}

impl PixelMapConfig {
    pub fn render(&self, bytes: &[u8]) -> RgbImage {
        pixel_map(bytes, self.width, self.max_height, self.style, self.layout)
    }
}

/// Byte range of the input a view is computed over.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Selection {
    pub offset: usize,
    /// `None` runs to the end of the buffer.
    pub length: Option<usize>,
}

impl Selection {
    /// The selected part of `bytes`, clipped to its end.
    pub fn apply<'a>(&self, bytes: &'a [u8]) -> &'a [u8] {
        let start = self.offset.min(bytes.len());
        let end = match self.length {
            Some(length) => start.saturating_add(length).min(bytes.len()),
            None => bytes.len(),
        };
        &bytes[start..end]
    }
}
