//! Bilinear-style Bayer demosaicing under any of the 24 tile orderings.
//!
//! A Bayer mosaic stores one color sample per pixel in a repeating 2x2 tile
//! holding one red, two green and one blue sample. When the tile order of an
//! unknown buffer is not known, trying all 24 orderings of {R, G0, G1, B} over
//! the tile positions is cheap and usually one of them looks right.

use anyhow::{bail, Result};
use image::Rgb;
use log::debug;

use crate::color::RgbImage;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    R,
    G0,
    G1,
    B,
}

use Role::{B, G0, G1, R};

/// Roles of tile positions `(0,0), (0,1), (1,0), (1,1)` (as `(y, x)`), listed
/// in lexicographic order of permutations of `R, G0, G1, B`.
#[rustfmt::skip]
const PERMUTATIONS: [[Role; 4]; 24] = [
    [R, G0, G1, B], [R, G0, B, G1], [R, G1, G0, B], [R, G1, B, G0],
    [R, B, G0, G1], [R, B, G1, G0], [G0, R, G1, B], [G0, R, B, G1],
    [G0, G1, R, B], [G0, G1, B, R], [G0, B, R, G1], [G0, B, G1, R],
    [G1, R, G0, B], [G1, R, B, G0], [G1, G0, R, B], [G1, G0, B, R],
    [G1, B, R, G0], [G1, B, G0, R], [B, R, G0, G1], [B, R, G1, G0],
    [B, G0, R, G1], [B, G0, G1, R], [B, G1, R, G0], [B, G1, G0, R],
];

/// Index into the 24 tile orderings, validated on construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct BayerPermutation(u8);

impl BayerPermutation {
    pub const COUNT: usize = PERMUTATIONS.len();

    /// # Panics
    ///
    /// Panics if `index` is not in `0..24`. An out-of-range permutation is a
    /// programming error; use [`BayerPermutation::try_from`] for untrusted input.
    pub fn new(index: usize) -> Self {
        assert!(
            index < Self::COUNT,
            "bayer permutation {index} out of range 0..{}",
            Self::COUNT
        );
        Self(index as u8)
    }

    pub fn all() -> impl Iterator<Item = Self> {
        (0..Self::COUNT).map(Self::new)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn roles(self) -> [Role; 4] {
        PERMUTATIONS[self.index()]
    }

    pub fn role_at(self, y: usize, x: usize) -> Role {
        self.roles()[(y % 2) * 2 + x % 2]
    }
}

impl TryFrom<i64> for BayerPermutation {
    type Error = anyhow::Error;

    fn try_from(index: i64) -> Result<Self> {
        match usize::try_from(index) {
            Ok(index) if index < Self::COUNT => Ok(Self(index as u8)),
            _ => bail!("bayer permutation {index} out of range 0..{}", Self::COUNT),
        }
    }
}

/// Edge-aware sample reader: out-of-bounds reads contribute nothing.
struct Mosaic<'a> {
    data: &'a [u8],
    height: usize,
    width: usize,
}

impl Mosaic<'_> {
    fn sample(&self, y: usize, x: usize) -> Option<u32> {
        if y >= self.height || x >= self.width {
            return None;
        }
        self.data.get(y * self.width + x).map(|&v| u32::from(v))
    }

    /// Sum of the in-bounds samples divided by how many there were.
    fn average<const N: usize>(&self, at: [(usize, usize); N]) -> u32 {
        let (sum, n) = at
            .iter()
            .filter_map(|&(y, x)| self.sample(y, x))
            .fold((0, 0), |(sum, n), v| (sum + v, n + 1));
        if n > 1 {
            sum / n
        } else {
            sum
        }
    }

    fn pixel(&self, y: usize, x: usize, role: Role) -> [u8; 3] {
        let here = (y, x);
        let right = (y, x + 1);
        let below = (y + 1, x);
        let diagonal = (y + 1, x + 1);
        let [r, g, b] = match role {
            R => [
                self.average([here]),
                self.average([right, below]),
                self.average([diagonal]),
            ],
            G0 => [
                self.average([right]),
                self.average([here, diagonal]),
                self.average([below]),
            ],
            G1 => [
                self.average([below]),
                self.average([here, diagonal]),
                self.average([right]),
            ],
            B => [
                self.average([diagonal]),
                self.average([right, below]),
                self.average([here]),
            ],
        };
        [r as u8, g as u8, b as u8]
    }
}

/// Reconstructs an RGB image from a single-channel mosaic.
///
/// Each output channel is the average of the in-bounds samples it draws
/// from; samples outside the image or past the end of `bayer` are left out
/// of both the sum and the count. The first channel of each pixel is the
/// value reconstructed for the `R` role, the last for `B`.
pub fn demosaic_image(
    bayer: &[u8],
    height: u32,
    width: u32,
    permutation: BayerPermutation,
) -> RgbImage {
    let (h, w) = (height as usize, width as usize);
    if bayer.len() < h * w {
        debug!(
            "bayer mosaic holds {} of {} samples, missing samples read as empty",
            bayer.len(),
            h * w
        );
    }
    let mosaic = Mosaic {
        data: bayer,
        height: h,
        width: w,
    };
    RgbImage::from_fn(width, height, |x, y| {
        let (y, x) = (y as usize, x as usize);
        Rgb(mosaic.pixel(y, x, permutation.role_at(y, x)))
    })
}

/// [`demosaic_image`] as `height * width * 3` packed RGB bytes.
pub fn demosaic(bayer: &[u8], height: u32, width: u32, permutation: BayerPermutation) -> Vec<u8> {
    demosaic_image(bayer, height, width, permutation).into_raw()
}
