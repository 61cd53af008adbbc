//! Byte, digram and trigram histograms.
//!
//! Digrams and trigrams are read as consecutive typed elements (see
//! [`ElementType`]), each reduced to a bucket in `0..=255`, so the 2D table is
//! always 256x256 and the 3D table 256x256x256 regardless of the element width.

use log::trace;
use rayon::prelude::*;

use crate::{
    color::{intensity_color, RgbImage, BLACK},
    dtype::{Decoder, ElementType},
};

pub const AXIS: usize = 256;
pub const CELLS_2D: usize = AXIS * AXIS;
pub const CELLS_3D: usize = AXIS * AXIS * AXIS;

/// Below this many digrams a single-threaded count is faster than fanning out.
const PARALLEL_THRESHOLD: usize = 1 << 20;

/// Minimum digrams per rayon task, so each task amortizes its local table.
const PARALLEL_MIN_LEN: usize = 1 << 18;

/// Byte frequencies scaled so that the most frequent byte is `1.0`.
pub type Histogram1D = [f32; AXIS];

/// Frequency of each byte value, normalized by the largest count. An empty
/// buffer yields all zeros.
pub fn histogram_1d(bytes: &[u8]) -> Histogram1D {
    let mut counts = [0u64; AXIS];
    for &byte in bytes {
        counts[byte as usize] += 1;
    }
    let mut hist = [0f32; AXIS];
    let max = counts.iter().copied().max().unwrap_or(0);
    if max == 0 {
        return hist;
    }
    for (value, &count) in hist.iter_mut().zip(counts.iter()) {
        *value = (count as f64 / max as f64) as f32;
    }
    hist
}

/// Counts of overlapping element pairs, indexed `[first][second]`.
#[derive(Clone, PartialEq, Eq)]
pub struct Histogram2D {
    counts: Vec<u32>,
}

impl Histogram2D {
    pub fn new() -> Self {
        Self {
            counts: vec![0; CELLS_2D],
        }
    }

    pub fn get(&self, a: u8, b: u8) -> u32 {
        self.counts[a as usize * AXIS + b as usize]
    }

    /// Row-major counts, `AXIS * AXIS` long.
    pub fn counts(&self) -> &[u32] {
        &self.counts
    }

    pub fn max(&self) -> u32 {
        self.counts.iter().copied().max().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().map(|&c| u64::from(c)).sum()
    }

    /// `((a, b), count)` for every cell that was hit at least once.
    pub fn nonzero(&self) -> impl Iterator<Item = ((u8, u8), u32)> + '_ {
        self.counts
            .iter()
            .enumerate()
            .filter(|&(_, &count)| count > 0)
            .map(|(i, &count)| (((i / AXIS) as u8, (i % AXIS) as u8), count))
    }

    /// 256x256 image with the first element along y and the second along x.
    /// Cells below `threshold` stay black.
    pub fn to_image(&self, threshold: u32, scale: f32) -> RgbImage {
        let axis = AXIS as u32;
        RgbImage::from_fn(axis, axis, |x, y| {
            intensity_color(self.get(y as u8, x as u8), threshold, scale).unwrap_or(BLACK)
        })
    }

    fn add(&mut self, a: u8, b: u8) {
        let cell = &mut self.counts[a as usize * AXIS + b as usize];
        *cell = cell.saturating_add(1);
    }

    fn merge(mut self, other: Self) -> Self {
        for (dst, src) in self.counts.iter_mut().zip(other.counts) {
            *dst = dst.saturating_add(src);
        }
        self
    }
}

impl Default for Histogram2D {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Histogram2D {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Histogram2D")
            .field("total", &self.total())
            .field("max", &self.max())
            .finish()
    }
}

/// Counts of element triples, indexed `[first][second][third]`.
#[derive(Clone, PartialEq, Eq)]
pub struct Histogram3D {
    counts: Vec<u32>,
}

/// A populated 3D histogram cell with coordinates scaled to `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CloudPoint {
    pub position: [f32; 3],
    pub count: u32,
}

impl Histogram3D {
    pub fn new() -> Self {
        Self {
            counts: vec![0; CELLS_3D],
        }
    }

    pub fn get(&self, a: u8, b: u8, c: u8) -> u32 {
        self.counts[Self::index(a, b, c)]
    }

    pub fn counts(&self) -> &[u32] {
        &self.counts
    }

    pub fn max(&self) -> u32 {
        self.counts.iter().copied().max().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().map(|&c| u64::from(c)).sum()
    }

    /// Cells with at least `threshold` hits, as a point cloud in the unit cube.
    pub fn points(&self, threshold: u32) -> Vec<CloudPoint> {
        let threshold = threshold.max(1);
        self.counts
            .iter()
            .enumerate()
            .filter(|&(_, &count)| count >= threshold)
            .map(|(i, &count)| {
                let a = i / (AXIS * AXIS);
                let b = (i / AXIS) % AXIS;
                let c = i % AXIS;
                CloudPoint {
                    position: [a as f32 / 255.0, b as f32 / 255.0, c as f32 / 255.0],
                    count,
                }
            })
            .collect()
    }

    fn index(a: u8, b: u8, c: u8) -> usize {
        (a as usize * AXIS + b as usize) * AXIS + c as usize
    }

    fn add(&mut self, a: u8, b: u8, c: u8) {
        let cell = &mut self.counts[Self::index(a, b, c)];
        *cell = cell.saturating_add(1);
    }
}

impl Default for Histogram3D {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Histogram3D {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Histogram3D")
            .field("total", &self.total())
            .field("max", &self.max())
            .finish()
    }
}

fn buckets(decoder: &Decoder, bytes: &[u8]) -> Vec<u8> {
    decoder.buckets(bytes).collect()
}

/// Overlapping digram counts over elements of type `ty`. [`ElementType::None`]
/// gives an empty histogram.
pub fn histogram_2d(bytes: &[u8], ty: ElementType) -> Histogram2D {
    let Some(decoder) = ty.decoder() else {
        return Histogram2D::new();
    };
    // U8 buckets are the bytes themselves
    let owned;
    let elements = if ty == ElementType::U8 {
        bytes
    } else {
        owned = buckets(&decoder, bytes);
        &owned[..]
    };
    trace!("histogram_2d: {} {ty} elements", elements.len());

    if elements.len() < PARALLEL_THRESHOLD {
        let mut hist = Histogram2D::new();
        for pair in elements.windows(2) {
            hist.add(pair[0], pair[1]);
        }
        return hist;
    }

    elements
        .par_windows(2)
        .with_min_len(PARALLEL_MIN_LEN)
        .fold(Histogram2D::new, |mut hist, pair| {
            hist.add(pair[0], pair[1]);
            hist
        })
        .reduce(Histogram2D::new, Histogram2D::merge)
}

/// Trigram counts over elements of type `ty`. With `overlap` every element
/// starts a trigram; without, trigrams are disjoint and advance three elements
/// at a time.
pub fn histogram_3d(bytes: &[u8], ty: ElementType, overlap: bool) -> Histogram3D {
    let mut hist = Histogram3D::new();
    let Some(decoder) = ty.decoder() else {
        return hist;
    };
    let owned;
    let elements = if ty == ElementType::U8 {
        bytes
    } else {
        owned = buckets(&decoder, bytes);
        &owned[..]
    };
    let step = if overlap { 1 } else { 3 };
    trace!("histogram_3d: {} {ty} elements, step {step}", elements.len());

    for triple in elements.windows(3).step_by(step) {
        hist.add(triple[0], triple[1], triple[2]);
    }
    hist
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn histogram_1d_normalizes_by_max() {
        let hist = histogram_1d(&[0x00, 0x00, 0xff]);
        assert_eq!(hist[0], 1.0);
        assert_eq!(hist[255], 0.5);
        assert!(hist[1..255].iter().all(|&v| v == 0.0));
    }

    #[test]
    fn histogram_1d_empty_is_zero() {
        let hist = histogram_1d(&[]);
        assert!(hist.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn histogram_2d_u8_digrams() {
        let hist = histogram_2d(&[0x01, 0x02, 0x03], ElementType::U8);
        assert_eq!(hist.get(1, 2), 1);
        assert_eq!(hist.get(2, 3), 1);
        assert_eq!(hist.total(), 2);
        let cells: Vec<_> = hist.nonzero().collect();
        assert_eq!(cells, [((1, 2), 1), ((2, 3), 1)]);
    }

    #[test]
    fn histogram_2d_image_thresholds_cells() {
        let bytes = [1, 2, 1, 2, 1, 2, 1, 2, 1];
        let image = histogram_2d(&bytes, ElementType::U8).to_image(4, 100.0);
        assert_eq!(image.dimensions(), (256, 256));
        // (1, 2) and (2, 1) are both hit four times
        assert_eq!(image.get_pixel(2, 1), &Rgb([20, 61, 20]));
        assert_eq!(image.get_pixel(1, 2), &Rgb([20, 61, 20]));
        assert_eq!(image.get_pixel(0, 0), &BLACK);
        let image = histogram_2d(&bytes, ElementType::U8).to_image(5, 100.0);
        assert!(image.pixels().all(|p| p == &BLACK));
    }

    #[test]
    fn histogram_2d_none_and_short_inputs() {
        assert_eq!(histogram_2d(&[1, 2, 3, 4], ElementType::None).total(), 0);
        assert_eq!(histogram_2d(&[], ElementType::U8).total(), 0);
        assert_eq!(histogram_2d(&[7], ElementType::U8).total(), 0);
        // a single u16 element has no partner
        assert_eq!(histogram_2d(&[1, 2, 3], ElementType::U16).total(), 0);
    }

    #[test]
    fn histogram_2d_u16_scales_to_byte_range() {
        let bytes = [0x00, 0x00, 0xff, 0xff, 0x00, 0x00];
        let hist = histogram_2d(&bytes, ElementType::U16);
        assert_eq!(hist.get(0, 255), 1);
        assert_eq!(hist.get(255, 0), 1);
        assert_eq!(hist.total(), 2);
    }

    #[test]
    fn histogram_2d_u12_masks_high_bits() {
        let bytes = [0xff, 0xff, 0x00, 0xf0];
        let hist = histogram_2d(&bytes, ElementType::U12);
        assert_eq!(hist.get(255, 0), 1);
    }

    #[test]
    fn histogram_2d_float_specials() {
        let mut bytes = Vec::new();
        for v in [f32::NEG_INFINITY, f32::INFINITY, 0.0, f32::NAN] {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        let hist = histogram_2d(&bytes, ElementType::F32);
        assert_eq!(hist.get(0, 255), 1);
        assert_eq!(hist.get(255, 128), 1);
        assert_eq!(hist.get(128, 255), 1);
        assert_eq!(hist.total(), 3);
    }

    #[test]
    fn histogram_2d_parallel_matches_sequential() {
        let bytes: Vec<u8> = (0..PARALLEL_THRESHOLD + 12345)
            .map(|i| (i.wrapping_mul(2654435761) >> 7) as u8)
            .collect();
        let hist = histogram_2d(&bytes, ElementType::U8);
        let mut expected = Histogram2D::new();
        for pair in bytes.windows(2) {
            expected.add(pair[0], pair[1]);
        }
        assert_eq!(hist.total(), bytes.len() as u64 - 1);
        assert!(hist == expected);
    }

    #[test]
    fn histogram_3d_overlap() {
        let bytes = [1, 2, 3, 4, 5, 6];
        let hist = histogram_3d(&bytes, ElementType::U8, true);
        assert_eq!(hist.total(), 4);
        assert_eq!(hist.get(1, 2, 3), 1);
        assert_eq!(hist.get(4, 5, 6), 1);

        let hist = histogram_3d(&bytes, ElementType::U8, false);
        assert_eq!(hist.total(), 2);
        assert_eq!(hist.get(1, 2, 3), 1);
        assert_eq!(hist.get(2, 3, 4), 0);
        assert_eq!(hist.get(4, 5, 6), 1);
    }

    #[test]
    fn histogram_3d_disjoint_steps_whole_elements() {
        let elements: [u16; 6] = [0, 0xffff, 0, 0xffff, 0, 0xffff];
        let bytes: Vec<u8> = elements.iter().flat_map(|v| v.to_le_bytes()).collect();
        let hist = histogram_3d(&bytes, ElementType::U16, false);
        assert_eq!(hist.get(0, 255, 0), 1);
        assert_eq!(hist.get(255, 0, 255), 1);
        assert_eq!(hist.total(), 2);
    }

    #[test]
    fn histogram_3d_point_cloud() {
        let hist = histogram_3d(&[0, 255, 0, 255, 0], ElementType::U8, true);
        let points = hist.points(2);
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].position, [0.0, 1.0, 0.0]);
        assert_eq!(points[0].count, 2);
        assert_eq!(hist.points(1).len(), 2);
        assert!(histogram_3d(&[1, 2, 3], ElementType::None, true).points(1).is_empty());
    }
}
