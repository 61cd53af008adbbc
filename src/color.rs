//! Palettes turning bytes and counts into pixels.

use image::{buffer::ConvertBuffer, Rgb, RgbaImage};

pub use image::RgbImage;

pub const BLACK: Rgb<u8> = Rgb([0x00, 0x00, 0x00]);
pub const WHITE: Rgb<u8> = Rgb([0xff, 0xff, 0xff]);

/// Color class of a raw byte: zero, control, printable ASCII, high bytes and
/// `0xff` are each given a distinct color.
#[rustfmt::skip]
pub fn byte_class_color(byte: u8) -> Rgb<u8> {
    match byte {
        0x00 =>        BLACK,
        0x01..=0x1f => Rgb([0x00, 0x00, 0xf0]),
        0x20..=0x7f => Rgb([0x00, 0xf0, 0x00]),
        0x80..=0xfe => Rgb([0xf0, 0x00, 0x00]),
        0xff =>        WHITE,
    }
}

/// Green-channel ramp used for raw magnitudes.
pub fn gray(value: u8) -> Rgb<u8> {
    Rgb([20, value, 20])
}

/// Color of a histogram cell, or `None` when `count` is below `threshold`
/// and the cell should show the background.
///
/// Counts are divided by `scale` and lifted by 0.2 so that any cell above the
/// threshold is visible. A non-positive `scale` is treated as 1.
pub fn intensity_color(count: u32, threshold: u32, scale: f32) -> Option<Rgb<u8>> {
    if count < threshold {
        return None;
    }
    let scale = if scale > 0.0 { scale } else { 1.0 };
    let c = ((count as f32 / scale + 0.2) * 255.0).round().clamp(0.0, 255.0) as u8;
    Some(gray(c))
}

/// Channel-wise mean of `colors`, black when empty.
pub fn average_color<I>(colors: I) -> Rgb<u8>
where
    I: IntoIterator<Item = Rgb<u8>>,
{
    let mut sum = [0u32; 3];
    let mut n = 0u32;
    for Rgb(color) in colors {
        for (acc, channel) in sum.iter_mut().zip(color) {
            *acc += u32::from(channel);
        }
        n += 1;
    }
    if n == 0 {
        return BLACK;
    }
    Rgb(sum.map(|channel| (channel / n).min(255) as u8))
}

/// Opaque RGBA bytes, the layout GPU textures expect.
pub fn to_rgba(image: &RgbImage) -> Vec<u8> {
    let rgba: RgbaImage = image.convert();
    rgba.into_raw()
}
