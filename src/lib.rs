//! Transforms that turn an arbitrary byte buffer into pictures: space-filling
//! curve layouts, digram and trigram histograms, block entropy, raw image
//! decoding with Bayer demosaicing, and a sampled self-similarity dot plot.
//!
//! Everything here works on a borrowed `&[u8]` and hands back owned results;
//! drawing them is left to the caller.

pub mod bayer;
pub mod color;
pub mod config;
pub mod curve;
pub mod dotplot;
pub mod dtype;
pub mod entropy;
pub mod histogram;
pub mod pixmap;
pub mod raw;

pub use bayer::{demosaic, BayerPermutation};
pub use color::RgbImage;
pub use curve::{gilbert, Curve};
pub use dotplot::{DotPlot, DotPlotParams};
pub use dtype::ElementType;
pub use entropy::{entropy, EntropyProfile};
pub use histogram::{histogram_1d, histogram_2d, histogram_3d, Histogram2D, Histogram3D};
pub use pixmap::pixel_map;
pub use raw::RawLayout;
