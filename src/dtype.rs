//! Element types used to interpret a byte buffer as a stream of typed values.
//!
//! Every element is reduced to a bucket in `0..=255` so that histograms over
//! any element type share the same 256-wide axes.

use std::{convert::Infallible, fmt, str::FromStr};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum ElementType {
    #[default]
    U8,
    U12,
    U16,
    U32,
    U64,
    F32,
    F64,
    None,
}

/// Reads one element from the front of a slice and maps it to a bucket.
#[derive(Clone, Copy)]
pub struct Decoder {
    pub stride: usize,
    pub bucket: fn(&[u8]) -> u8,
}

impl Decoder {
    /// Buckets of every complete element in `bytes`. A trailing partial
    /// element is skipped.
    pub fn buckets<'a>(&self, bytes: &'a [u8]) -> impl Iterator<Item = u8> + 'a {
        let bucket = self.bucket;
        bytes.chunks_exact(self.stride).map(bucket)
    }

    pub fn count(&self, bytes: &[u8]) -> usize {
        bytes.len() / self.stride
    }
}

impl ElementType {
    pub const ALL: [ElementType; 7] = [
        Self::U8,
        Self::U12,
        Self::U16,
        Self::U32,
        Self::U64,
        Self::F32,
        Self::F64,
    ];

    /// Looks up a type by its name. Unknown names resolve to [`ElementType::None`].
    pub fn resolve(name: &str) -> Self {
        match name {
            "U8" => Self::U8,
            "U12" => Self::U12,
            "U16" => Self::U16,
            "U32" => Self::U32,
            "U64" => Self::U64,
            "F32" => Self::F32,
            "F64" => Self::F64,
            _ => Self::None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::U8 => "U8",
            Self::U12 => "U12",
            Self::U16 => "U16",
            Self::U32 => "U32",
            Self::U64 => "U64",
            Self::F32 => "F32",
            Self::F64 => "F64",
            Self::None => "NONE",
        }
    }

    /// Width of one element in bytes, zero for [`ElementType::None`].
    pub fn size(self) -> usize {
        self.decoder().map_or(0, |decoder| decoder.stride)
    }

    #[rustfmt::skip]
    pub fn decoder(self) -> Option<Decoder> {
        let decoder = match self {
            Self::U8 =>  Decoder { stride: 1, bucket: read_u8 },
            Self::U12 => Decoder { stride: 2, bucket: read_u12 },
            Self::U16 => Decoder { stride: 2, bucket: read_u16 },
            Self::U32 => Decoder { stride: 4, bucket: read_u32 },
            Self::U64 => Decoder { stride: 8, bucket: read_u64 },
            Self::F32 => Decoder { stride: 4, bucket: read_f32 },
            Self::F64 => Decoder { stride: 8, bucket: read_f64 },
            Self::None => return None,
        };
        Some(decoder)
    }
}

impl FromStr for ElementType {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::resolve(s))
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn le_u16(b: &[u8]) -> u16 {
    u16::from_le_bytes([b[0], b[1]])
}

fn le_u32(b: &[u8]) -> u32 {
    u32::from_le_bytes([b[0], b[1], b[2], b[3]])
}

fn le_u64(b: &[u8]) -> u64 {
    u64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]])
}

/// Linear map of `0..=max` onto `0..=255`, truncating.
fn scale_unsigned(value: u64, max: u64) -> u8 {
    (value as f64 / max as f64 * 255.0) as u8
}

fn read_u8(b: &[u8]) -> u8 {
    b[0]
}

fn read_u12(b: &[u8]) -> u8 {
    scale_unsigned(u64::from(le_u16(b) & 0x0fff), 0x0fff)
}

fn read_u16(b: &[u8]) -> u8 {
    scale_unsigned(u64::from(le_u16(b)), u64::from(u16::MAX))
}

fn read_u32(b: &[u8]) -> u8 {
    scale_unsigned(u64::from(le_u32(b)), u64::from(u32::MAX))
}

fn read_u64(b: &[u8]) -> u8 {
    scale_unsigned(le_u64(b), u64::MAX)
}

fn read_f32(b: &[u8]) -> u8 {
    bucket_f32(f32::from_bits(le_u32(b)))
}

fn read_f64(b: &[u8]) -> u8 {
    bucket_f64(f64::from_bits(le_u64(b)))
}

/// Non-finite values pin to the end selected by their sign bit, everything
/// else is mapped linearly through the type's largest finite magnitude.
fn bucket_float(ratio: f64, non_finite: bool, negative: bool) -> u8 {
    if non_finite {
        return if negative { 0 } else { 255 };
    }
    ((ratio * 255.0 + 255.0) / 2.0).round().clamp(0.0, 255.0) as u8
}

pub fn bucket_f32(value: f32) -> u8 {
    bucket_float(
        f64::from(value) / f64::from(f32::MAX),
        !value.is_finite(),
        value.is_sign_negative(),
    )
}

pub fn bucket_f64(value: f64) -> u8 {
    bucket_float(value / f64::MAX, !value.is_finite(), value.is_sign_negative())
}
