//! Randomized self-similarity (dot plot) sampler.
//!
//! Cell `(x, y)` of the matrix counts how often sampled bytes near position
//! `x` equal the bytes at the same jitter near position `y`. Long buffers are
//! down-sampled to at most `viewport` cells per side; within each cell a few
//! random jitter offsets stand in for the full comparison.
//!
//! The work is a queue of upper-triangular cells in random order, consumed
//! one cell per [`DotPlot::advance`] call so a front end can draw the matrix
//! while it fills in.

use image::{GrayImage, Luma};
use log::debug;
use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DotPlotParams {
    /// Largest matrix side the caller can display.
    pub viewport: usize,
    /// Number of bytes, from the start of the buffer, covered by the plot.
    pub window_width: usize,
    /// Upper bound on comparisons per cell.
    pub max_samples: usize,
}

impl Default for DotPlotParams {
    fn default() -> Self {
        Self {
            viewport: 512,
            window_width: 10_000,
            max_samples: 10,
        }
    }
}

pub struct DotPlot<'a> {
    data: &'a [u8],
    dim: usize,
    scale: f64,
    queue: Vec<(usize, usize)>,
    cursor: usize,
    jitter: Vec<usize>,
    matrix: Vec<u32>,
}

impl<'a> DotPlot<'a> {
    /// Starts a sampling session over `data`. Nothing is compared until the
    /// session is advanced.
    pub fn configure<R: Rng + ?Sized>(data: &'a [u8], params: DotPlotParams, rng: &mut R) -> Self {
        let window = data.len().min(params.window_width);
        let dim = params.viewport.min(window);
        let scale = if dim < window {
            dim as f64 / window as f64
        } else {
            1.0
        };

        let mut queue = Vec::with_capacity(dim * (dim + 1) / 2);
        for i in 0..dim {
            for j in i..dim {
                queue.push((i, j));
            }
        }
        queue.shuffle(rng);

        // jitter offsets span one down-sampled cell
        let span = ((1.0 / scale).ceil() as usize).max(1);
        let samples = params.max_samples.min(span.saturating_mul(span));
        let jitter = (0..samples).map(|_| rng.gen_range(0..span)).collect();

        debug!(
            "dot plot: {} bytes, window {window}, dim {dim}, scale {scale:.4}, span {span}, {samples} samples",
            data.len()
        );

        Self {
            data,
            dim,
            scale,
            queue,
            cursor: 0,
            jitter,
            matrix: vec![0; dim * dim],
        }
    }

    /// [`DotPlot::configure`] with a reproducible random source.
    pub fn seeded(data: &'a [u8], params: DotPlotParams, seed: u64) -> Self {
        Self::configure(data, params, &mut StdRng::seed_from_u64(seed))
    }

    /// Compares the next queued cell. Returns whether more cells remain.
    pub fn advance(&mut self) -> bool {
        let Some(&(x, y)) = self.queue.get(self.cursor) else {
            return false;
        };
        self.cursor += 1;

        let xo = (x as f64 / self.scale) as usize;
        let yo = (y as f64 / self.scale) as usize;
        for &offset in &self.jitter {
            let (Some(a), Some(b)) = (self.data.get(xo + offset), self.data.get(yo + offset)) else {
                continue;
            };
            if a == b {
                self.matrix[y * self.dim + x] += 1;
                self.matrix[x * self.dim + y] += 1;
            }
        }
        !self.is_done()
    }

    /// Advances up to `steps` cells. Returns whether more cells remain.
    pub fn advance_by(&mut self, steps: usize) -> bool {
        for _ in 0..steps {
            if !self.advance() {
                return false;
            }
        }
        !self.is_done()
    }

    /// Drains the whole queue.
    pub fn run(&mut self) {
        while self.advance() {}
    }

    pub fn is_done(&self) -> bool {
        self.cursor >= self.queue.len()
    }

    pub fn remaining(&self) -> usize {
        self.queue.len() - self.cursor
    }

    /// Fraction of queued cells already compared, `1.0` when there is no work.
    pub fn progress(&self) -> f32 {
        if self.queue.is_empty() {
            return 1.0;
        }
        self.cursor as f32 / self.queue.len() as f32
    }

    /// Side length of the square matrix.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Down-sampling factor from buffer positions to matrix cells.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn jitter(&self) -> &[usize] {
        &self.jitter
    }

    /// Row-major `dim * dim` match counts.
    pub fn matrix(&self) -> &[u32] {
        &self.matrix
    }

    /// Grayscale rendering of the matrix, `dim * dim` bytes.
    ///
    /// The diagonal always matches itself and is left out when picking the
    /// brightest value; that maximum is then lowered to 75% (at least 1) so
    /// that off-diagonal structure saturates.
    pub fn render(&self) -> Vec<u8> {
        let d = self.dim;
        let mut max = 0;
        for y in 0..d {
            for x in (0..d).filter(|&x| x != y) {
                max = max.max(self.matrix[y * d + x]);
            }
        }
        let max = ((f64::from(max) * 0.75) as u32).max(1);
        self.matrix
            .iter()
            .map(|&count| (f64::from(count) / f64::from(max) * 255.0).round().min(255.0) as u8)
            .collect()
    }

    /// [`DotPlot::render`] as a `dim` by `dim` grayscale image.
    pub fn image(&self) -> GrayImage {
        let d = self.dim;
        let values = self.render();
        GrayImage::from_fn(d as u32, d as u32, |x, y| {
            Luma([values[y as usize * d + x as usize]])
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(viewport: usize, window_width: usize, max_samples: usize) -> DotPlotParams {
        DotPlotParams {
            viewport,
            window_width,
            max_samples,
        }
    }

    #[test]
    fn dimensions_follow_smallest_limit() {
        let data = vec![0u8; 1000];
        let plot = DotPlot::seeded(&data, params(64, 500, 10), 1);
        assert_eq!(plot.dim(), 64);
        assert!((plot.scale() - 64.0 / 500.0).abs() < 1e-12);
        assert_eq!(plot.remaining(), 64 * 65 / 2);

        let plot = DotPlot::seeded(&data[..20], params(64, 500, 10), 1);
        assert_eq!(plot.dim(), 20);
        assert_eq!(plot.scale(), 1.0);
        // no down-sampling leaves a single jitter of zero
        assert_eq!(plot.jitter(), [0]);
    }

    #[test]
    fn empty_buffer_has_no_work() {
        let mut plot = DotPlot::seeded(&[], DotPlotParams::default(), 7);
        assert_eq!(plot.dim(), 0);
        assert!(plot.is_done());
        assert!(!plot.advance());
        assert!(plot.render().is_empty());
        assert_eq!(plot.progress(), 1.0);
    }

    #[test]
    fn advance_is_resumable() {
        let data: Vec<u8> = (0..32).map(|i| (i % 4) as u8).collect();
        let mut plot = DotPlot::seeded(&data, params(32, 32, 1), 3);
        let total = plot.remaining();
        assert!(plot.advance_by(10));
        assert_eq!(plot.remaining(), total - 10);
        plot.run();
        assert!(plot.is_done());
        assert_eq!(plot.progress(), 1.0);
    }

    #[test]
    fn identity_matches_periodic_data() {
        let data: Vec<u8> = (0..32).map(|i| (i % 4) as u8).collect();
        let mut plot = DotPlot::seeded(&data, params(32, 32, 1), 3);
        plot.run();
        let d = plot.dim();
        let matrix = plot.matrix();
        for y in 0..d {
            for x in 0..d {
                let expected = if x == y {
                    2
                } else if x % 4 == y % 4 {
                    1
                } else {
                    0
                };
                assert_eq!(matrix[y * d + x], expected, "cell {x},{y}");
            }
        }
        let image = plot.render();
        // off-diagonal max of 1 floors to 1, so matches are white
        assert_eq!(image[1 * d + 5], 255);
        assert_eq!(image[1 * d + 2], 0);
    }

    #[test]
    fn render_lowers_the_off_diagonal_peak() {
        let mut plot = DotPlot::seeded(&[0u8; 3], params(3, 3, 1), 1);
        // off-diagonal peak 8 becomes 6, so 4 lands mid-ramp
        plot.matrix = vec![20, 8, 4, 8, 20, 0, 4, 0, 20];
        assert_eq!(plot.render(), [255, 255, 170, 255, 255, 0, 170, 0, 255]);

        // peak 3 becomes 2 and 1 / 2 rounds up
        plot.matrix = vec![5, 3, 1, 3, 5, 0, 1, 0, 5];
        assert_eq!(plot.render(), [255, 255, 128, 255, 255, 0, 128, 0, 255]);

        let image = plot.image();
        assert_eq!(image.dimensions(), (3, 3));
        assert_eq!(image.get_pixel(2, 0), &Luma([128]));
        assert_eq!(image.get_pixel(2, 1), &Luma([0]));
    }

    #[test]
    fn render_of_a_downsampled_run() {
        let data = vec![0u8; 2000];
        let mut plot = DotPlot::seeded(&data, params(10, 2000, 8), 11);
        assert_eq!(plot.jitter().len(), 8);
        plot.run();
        let d = plot.dim();
        assert_eq!(d, 10);

        let matrix = plot.matrix();
        // every jitter stays in bounds and every byte matches
        assert_eq!(matrix[1], 8);
        assert_eq!(matrix[d + 1], 16);
        let peak = (0..d * d).filter(|i| i / d != i % d).map(|i| matrix[i]).max().unwrap();
        assert_eq!(peak, 8);

        let lowered = ((f64::from(peak) * 0.75) as u32).max(1);
        assert_eq!(lowered, 6);
        let expected: Vec<u8> = matrix
            .iter()
            .map(|&c| (f64::from(c) / f64::from(lowered) * 255.0).round().min(255.0) as u8)
            .collect();
        assert_eq!(plot.render(), expected);
    }

    #[test]
    fn same_seed_same_matrix() {
        let data: Vec<u8> = (0..5000u32).map(|i| (i * 7 % 13) as u8).collect();
        let mut a = DotPlot::seeded(&data, params(40, 5000, 8), 99);
        let mut b = DotPlot::seeded(&data, params(40, 5000, 8), 99);
        a.run();
        b.run();
        assert_eq!(a.matrix(), b.matrix());
        assert_eq!(a.jitter().len(), 8);
    }

    #[test]
    fn jitter_near_the_end_is_skipped() {
        let data = vec![1u8; 10];
        let mut plot = DotPlot::seeded(&data, params(3, 10, 50), 5);
        assert!(plot.jitter().iter().all(|&j| j < 4));
        plot.run();
        let d = plot.dim();
        assert_eq!(d, 3);
        for y in 0..d {
            for x in 0..d {
                assert_eq!(plot.matrix()[y * d + x], plot.matrix()[x * d + y]);
            }
        }
    }
}
