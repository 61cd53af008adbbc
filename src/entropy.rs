//! Block-wise Shannon entropy.
//!
//! The buffer is cut into non-overlapping blocks; each block's byte entropy is
//! reported in bits per byte divided by 8, i.e. `0.0` for a constant block and
//! `1.0` when all 256 byte values are equally frequent.

pub const DEFAULT_BLOCK_SIZE: usize = 256;

/// Entropy series, one value per block.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EntropyProfile {
    block_size: usize,
    len: usize,
    values: Vec<f32>,
}

/// Normalized entropy of a single block. Empty blocks have zero entropy.
pub fn block_entropy(block: &[u8]) -> f32 {
    if block.is_empty() {
        return 0.0;
    }
    let mut counts = [0u32; 256];
    for &byte in block {
        counts[byte as usize] += 1;
    }
    let total = block.len() as f64;
    let bits: f64 = counts
        .iter()
        .filter(|&&count| count > 0)
        .map(|&count| {
            let p = f64::from(count) / total;
            -p * p.log2()
        })
        .sum();
    (bits / 8.0) as f32
}

/// Entropy of each `block_size` block of `bytes`. The last block may be short.
///
/// # Panics
///
/// Panics if `block_size` is zero.
pub fn entropy(bytes: &[u8], block_size: usize) -> EntropyProfile {
    assert!(block_size > 0, "entropy block size must be non-zero");
    EntropyProfile {
        block_size,
        len: bytes.len(),
        values: bytes.chunks(block_size).map(block_entropy).collect(),
    }
}

impl EntropyProfile {
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Byte range of the buffer that block `i` was computed from.
    pub fn block_range(&self, i: usize) -> Option<std::ops::Range<usize>> {
        if i >= self.values.len() {
            return None;
        }
        let start = i * self.block_size;
        Some(start..(start + self.block_size).min(self.len))
    }

    pub fn min(&self) -> Option<f32> {
        self.values.iter().copied().reduce(f32::min)
    }

    pub fn max(&self) -> Option<f32> {
        self.values.iter().copied().reduce(f32::max)
    }

    pub fn mean(&self) -> Option<f32> {
        if self.values.is_empty() {
            return None;
        }
        let sum: f64 = self.values.iter().map(|&v| f64::from(v)).sum();
        Some((sum / self.values.len() as f64) as f32)
    }

    /// [`bin_rows`] over the profile's values.
    pub fn rows(&self, rows: usize, normalize: bool) -> Vec<Option<f32>> {
        bin_rows(&self.values, rows, normalize)
    }
}

/// Bins a series onto `rows` display rows, averaging the values that land on
/// the same row.
///
/// Rows that receive no value repeat the previous row; rows before the first
/// populated one stay `None`. With `normalize` the values are first stretched
/// to the series' own min..max range, otherwise they are used as-is.
pub fn bin_rows(values: &[f32], rows: usize, normalize: bool) -> Vec<Option<f32>> {
    let mut out = vec![None; rows];
    if rows == 0 || values.is_empty() {
        return out;
    }

    let (mut lo, mut hi) = (0.0f32, 1.0f32);
    if normalize {
        lo = values.iter().copied().fold(f32::INFINITY, f32::min);
        hi = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        if lo == hi {
            lo -= 0.5;
            hi += 0.5;
        }
    }

    let mut acc = vec![0f64; rows];
    let mut hits = vec![0u32; rows];
    let len = values.len() as f64;
    for (i, &value) in values.iter().enumerate() {
        let row = ((i as f64 / len) * (rows - 1) as f64).round() as usize;
        acc[row] += f64::from((value - lo) / (hi - lo));
        hits[row] += 1;
    }

    let mut previous = None;
    for (row, slot) in out.iter_mut().enumerate() {
        if hits[row] > 0 {
            previous = Some((acc[row] / f64::from(hits[row])) as f32);
        }
        *slot = previous;
    }
    out
}
