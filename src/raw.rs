//! Interprets a byte buffer as an uncompressed raster image.

use std::{fmt, str::FromStr};

use anyhow::{bail, Context, Result};
use image::{imageops::flip_horizontal_in_place, Rgb};
use log::debug;

use crate::{
    bayer::{demosaic_image, BayerPermutation},
    color::RgbImage,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Channels {
    Rgb,
    Rgba,
    Bgr,
    Bgra,
    Grey,
}

impl Channels {
    const ALL: [Channels; 5] = [Self::Rgb, Self::Rgba, Self::Bgr, Self::Bgra, Self::Grey];

    fn name(self) -> &'static str {
        match self {
            Self::Rgb => "RGB",
            Self::Rgba => "RGBA",
            Self::Bgr => "BGR",
            Self::Bgra => "BGRA",
            Self::Grey => "Grey",
        }
    }

    fn count(self) -> usize {
        match self {
            Self::Rgb | Self::Bgr => 3,
            Self::Rgba | Self::Bgra => 4,
            Self::Grey => 1,
        }
    }

    /// Sample index feeding each of the red, green and blue outputs. Alpha is
    /// never read.
    fn order(self) -> [usize; 3] {
        match self {
            Self::Rgb | Self::Rgba => [0, 1, 2],
            Self::Bgr | Self::Bgra => [2, 1, 0],
            Self::Grey => [0, 0, 0],
        }
    }
}

/// Bits per sample. 12-bit samples sit in the low bits of a little-endian u16.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Depth {
    Eight,
    Twelve,
    Sixteen,
}

impl Depth {
    const ALL: [Depth; 3] = [Self::Eight, Self::Twelve, Self::Sixteen];

    fn bits(self) -> u32 {
        match self {
            Self::Eight => 8,
            Self::Twelve => 12,
            Self::Sixteen => 16,
        }
    }

    fn size(self) -> usize {
        match self {
            Self::Eight => 1,
            Self::Twelve | Self::Sixteen => 2,
        }
    }

    /// Top eight bits of the sample at the front of `b`.
    fn read(self, b: &[u8]) -> u8 {
        match self {
            Self::Eight => b[0],
            Self::Twelve => (u16::from_le_bytes([b[0], b[1]]) >> 4) as u8,
            Self::Sixteen => (u16::from_le_bytes([b[0], b[1]]) >> 8) as u8,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RawLayout {
    Packed { channels: Channels, depth: Depth },
    Bayer8(BayerPermutation),
}

impl Default for RawLayout {
    fn default() -> Self {
        Self::Packed {
            channels: Channels::Rgb,
            depth: Depth::Eight,
        }
    }
}

impl RawLayout {
    /// Every layout, in menu order.
    pub fn all() -> impl Iterator<Item = Self> {
        let packed = Channels::ALL.into_iter().flat_map(|channels| {
            Depth::ALL
                .into_iter()
                .map(move |depth| Self::Packed { channels, depth })
        });
        packed.chain(BayerPermutation::all().map(Self::Bayer8))
    }

    /// Parses names such as `RGB 8`, `BGRA 12`, `Grey 16` or `Bayer 8 - 5`.
    /// Anything after a colon in a Bayer name is ignored.
    pub fn resolve(name: &str) -> Result<Self> {
        let name = name.trim();
        if let Some(rest) = name.strip_prefix("Bayer 8 - ") {
            let index = rest.split(':').next().unwrap_or_default().trim();
            let index: i64 = index
                .parse()
                .with_context(|| format!("invalid bayer permutation in {name:?}"))?;
            return Ok(Self::Bayer8(BayerPermutation::try_from(index)?));
        }

        let Some((channels, bits)) = name.split_once(' ') else {
            bail!("unknown raw layout {name:?}");
        };
        let channels = Channels::ALL.into_iter().find(|c| c.name() == channels);
        let bits = bits.parse::<u32>().ok();
        let depth = Depth::ALL.into_iter().find(|d| Some(d.bits()) == bits);
        match (channels, depth) {
            (Some(channels), Some(depth)) => Ok(Self::Packed { channels, depth }),
            _ => bail!("unknown raw layout {name:?}"),
        }
    }

    /// Decodes `buf[offset..]` into an image `width` pixels wide.
    ///
    /// The image always has one spare row past the last complete one, so a
    /// trailing partial row is shown and unused pixels stay black. An offset
    /// past the end of the buffer yields a blank single-row image.
    pub fn decode(self, buf: &[u8], offset: usize, width: usize, mirror: bool) -> Result<RgbImage> {
        if width == 0 {
            bail!("raw image width must be non-zero");
        }
        let data = buf.get(offset..).unwrap_or_default();

        let mut image = match self {
            Self::Packed { channels, depth } => {
                let pixel_size = channels.count() * depth.size();
                let pixels = data.len() / pixel_size;
                let (w, h) = dimensions(width, pixels / width + 1)?;
                let mut image = RgbImage::new(w, h);
                let order = channels.order();
                for (i, pixel) in data.chunks_exact(pixel_size).enumerate() {
                    let sample = |k: usize| depth.read(&pixel[k * depth.size()..]);
                    let (x, y) = ((i % width) as u32, (i / width) as u32);
                    image.put_pixel(x, y, Rgb(order.map(sample)));
                }
                image
            }
            Self::Bayer8(permutation) => {
                let (w, h) = dimensions(width, data.len() / width + 1)?;
                demosaic_image(data, h, w, permutation)
            }
        };
        debug!(
            "decoded {} bytes at offset {offset} as {self}: {}x{}",
            data.len(),
            image.width(),
            image.height()
        );

        if mirror {
            flip_horizontal_in_place(&mut image);
        }
        Ok(image)
    }
}

fn dimensions(width: usize, height: usize) -> Result<(u32, u32)> {
    let w = u32::try_from(width).context("raw image width out of range")?;
    let h = u32::try_from(height).context("raw image height out of range")?;
    Ok((w, h))
}

impl FromStr for RawLayout {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::resolve(s)
    }
}

impl fmt::Display for RawLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Packed { channels, depth } => write!(f, "{} {}", channels.name(), depth.bits()),
            Self::Bayer8(permutation) => write!(f, "Bayer 8 - {}", permutation.index()),
        }
    }
}
