use std::{
    path::{Path, PathBuf},
    process::exit,
};

use anyhow::{bail, Context, Result};
use binvis::{
    color::to_rgba,
    config::{EntropyConfig, HistogramConfig, PixelMapConfig, Selection},
    entropy::bin_rows,
    histogram::{histogram_1d, histogram_2d},
    pixmap::{Layout, PixelStyle},
    DotPlot, DotPlotParams, ElementType, RawLayout, RgbImage,
};
use clap::{arg, command, value_parser, ArgMatches};
use image::{buffer::ConvertBuffer, RgbaImage};
use log::{error, info, LevelFilter};
use macroquad::{
    color::{Color, BLACK, WHITE, YELLOW},
    math::vec2,
    shapes::draw_rectangle,
    text::draw_text,
    texture::{draw_texture_ex, DrawTextureParams, FilterMode, Texture2D},
    window::{clear_background, next_frame, screen_height, screen_width, Conf},
};

const WINDOW_SIZE: i32 = 1024;
/// Largest image side handed to the GPU.
const MAX_TEXTURE: usize = 8192;
/// Dot plot cells compared between two frames.
const DOTPLOT_STEPS_PER_FRAME: usize = 4096;

const VIEWS: [&str; 7] = [
    "hilbert",
    "linear",
    "digram",
    "histogram",
    "entropy",
    "raw",
    "dotplot",
];

fn config() -> Conf {
    Conf {
        window_title: "binvis".to_owned(),
        window_width: WINDOW_SIZE,
        window_height: WINDOW_SIZE,
        window_resizable: true,
        ..Default::default()
    }
}

fn main() {
    env_logger::builder()
        .filter_level(LevelFilter::Info)
        .format_timestamp(None)
        .format_target(false)
        .init();
    let matches = command!()
        .subcommands([
            command!("stats").alias("i").args([arg!(<FILE> "The input file")
                .required(true)
                .value_parser(value_parser!(PathBuf))]),
            command!("show").alias("s").args([
                arg!(<FILE> "The input file")
                    .required(true)
                    .value_parser(value_parser!(PathBuf)),
                arg!(-v --view <VIEW> "What to draw")
                    .value_parser(VIEWS)
                    .default_value("hilbert"),
                arg!(--offset <BYTES> "Skip this many bytes of the input")
                    .value_parser(value_parser!(usize))
                    .default_value("0"),
                arg!(--length <BYTES> "Only look at this many bytes (default: to the end)")
                    .required(false)
                    .value_parser(value_parser!(usize)),
                arg!(--"type" <TYPE> "Element type of the digram view: U8, U12, U16, U32, U64, F32 or F64")
                    .default_value("U8"),
                arg!(--threshold <COUNT> "Hide digram cells hit fewer times")
                    .value_parser(value_parser!(u32))
                    .default_value("4"),
                arg!(--scale <DIVISOR> "Divide digram counts by this before coloring")
                    .value_parser(value_parser!(f32))
                    .default_value("100"),
                arg!(--"block-size" <BYTES> "Entropy block size")
                    .value_parser(value_parser!(usize))
                    .default_value("256"),
                arg!(--"no-normalize" "Plot entropy on a fixed 0..1 scale instead of its own range"),
                arg!(--layout <LAYOUT> "Raw image layout, e.g. \"RGB 8\", \"Grey 16\" or \"Bayer 8 - 5\"")
                    .default_value("RGB 8"),
                arg!(--width <PIXELS> "Width of the raw image or pixel map")
                    .value_parser(value_parser!(usize))
                    .default_value("512"),
                arg!(--mirror "Flip the raw image left to right"),
                arg!(--gray "Draw the pixel map as byte magnitudes"),
                arg!(--samples <COUNT> "Dot plot comparisons per cell")
                    .value_parser(value_parser!(usize))
                    .default_value("10"),
                arg!(--window <BYTES> "Bytes covered by the dot plot")
                    .value_parser(value_parser!(usize))
                    .default_value("10000"),
                arg!(--seed <SEED> "Dot plot random seed (default: random)")
                    .required(false)
                    .value_parser(value_parser!(u64)),
            ]),
        ])
        .subcommand_required(true)
        .get_matches();
    match matches.subcommand() {
        Some(("stats", args)) => {
            let file = args.get_one::<PathBuf>("FILE").unwrap();
            let bytes = match read_input(file) {
                Ok(bytes) => bytes,
                Err(err) => {
                    error!("{err:#}");
                    exit(1);
                }
            };
            stats(&bytes);
        }
        Some(("show", args)) => {
            let file = args.get_one::<PathBuf>("FILE").unwrap();
            let scene = match read_input(file).and_then(|bytes| Scene::build(&bytes, args)) {
                Ok(scene) => scene,
                Err(err) => {
                    error!("{err:#}");
                    exit(1);
                }
            };
            macroquad::Window::from_config(config(), window(scene));
        }
        _ => unreachable!(),
    }
}

fn read_input(file: &Path) -> Result<Vec<u8>> {
    if !file.exists() || !file.is_file() {
        bail!("Input does not exist or is not a file");
    }
    std::fs::read(file).with_context(|| format!("Could not read {}", file.display()))
}

fn stats(bytes: &[u8]) {
    info!("{} bytes", bytes.len());

    let profile = EntropyConfig::default().profile(bytes);
    if let (Some(min), Some(mean), Some(max)) = (profile.min(), profile.mean(), profile.max()) {
        info!(
            "entropy over {} blocks of {}: min {min:.3}, mean {mean:.3}, max {max:.3}",
            profile.len(),
            profile.block_size()
        );
    }

    let hist = histogram_1d(bytes);
    let mut common: Vec<(usize, f32)> = hist.iter().copied().enumerate().collect();
    common.sort_by(|a, b| b.1.total_cmp(&a.1));
    let common: Vec<String> = common
        .iter()
        .take_while(|&&(_, freq)| freq > 0.0)
        .take(8)
        .map(|&(byte, freq)| format!("{byte:#04x} ({freq:.2})"))
        .collect();
    info!("most common bytes: {}", common.join(", "));

    let digrams = histogram_2d(bytes, ElementType::U8);
    info!(
        "digrams: {} distinct of {}, busiest cell {}",
        digrams.nonzero().count(),
        binvis::histogram::CELLS_2D,
        digrams.max()
    );

    let config = HistogramConfig::default();
    info!(
        "trigram cells hit at least {} times: {}",
        config.threshold,
        config.trigram_cloud(bytes).len()
    );
}

enum Scene {
    Image(RgbImage),
    /// One horizontal bar per display row.
    Bars {
        values: Vec<f32>,
        normalize: bool,
    },
    DotPlot {
        bytes: Vec<u8>,
        params: DotPlotParams,
        seed: u64,
    },
}

impl Scene {
    fn build(bytes: &[u8], args: &ArgMatches) -> Result<Self> {
        let selection = Selection {
            offset: *args.get_one::<usize>("offset").unwrap(),
            length: args.get_one::<usize>("length").copied(),
        };
        let &width = args.get_one::<usize>("width").unwrap();
        let selected = selection.apply(bytes);

        let scene = match args.get_one::<String>("view").unwrap().as_str() {
            view @ ("hilbert" | "linear") => {
                let config = PixelMapConfig {
                    width,
                    layout: if view == "hilbert" {
                        Layout::Hilbert
                    } else {
                        Layout::Linear
                    },
                    style: if args.get_flag("gray") {
                        PixelStyle::Gray
                    } else {
                        PixelStyle::ByteClass
                    },
                    ..Default::default()
                };
                Self::Image(config.render(selected))
            }
            "digram" => {
                let name = args.get_one::<String>("type").unwrap();
                let element = ElementType::resolve(name);
                if element == ElementType::None {
                    bail!("Unknown element type {name:?}");
                }
                let config = HistogramConfig {
                    threshold: *args.get_one::<u32>("threshold").unwrap(),
                    scale: *args.get_one::<f32>("scale").unwrap(),
                    element,
                    ..Default::default()
                };
                Self::Image(config.digram_image(selected))
            }
            "histogram" => Self::Bars {
                values: histogram_1d(selected).to_vec(),
                normalize: false,
            },
            "entropy" => {
                let &block_size = args.get_one::<usize>("block-size").unwrap();
                if block_size == 0 {
                    bail!("Block size must be at least 1");
                }
                let config = EntropyConfig {
                    block_size,
                    normalize: !args.get_flag("no-normalize"),
                };
                Self::Bars {
                    values: config.profile(selected).values().to_vec(),
                    normalize: config.normalize,
                }
            }
            "raw" => {
                let layout = RawLayout::resolve(args.get_one::<String>("layout").unwrap())?;
                Self::Image(layout.decode(selected, 0, width, args.get_flag("mirror"))?)
            }
            "dotplot" => {
                let params = DotPlotParams {
                    window_width: *args.get_one::<usize>("window").unwrap(),
                    max_samples: *args.get_one::<usize>("samples").unwrap(),
                    ..Default::default()
                };
                let seed = args
                    .get_one::<u64>("seed")
                    .copied()
                    .unwrap_or_else(rand::random);
                info!("Dot plot seed {seed}");
                Self::DotPlot {
                    bytes: selected.to_vec(),
                    params,
                    seed,
                }
            }
            _ => unreachable!(),
        };

        if let Self::Image(image) = &scene {
            let (width, height) = image.dimensions();
            if width == 0 || height == 0 {
                bail!("Nothing to draw");
            }
            if width as usize > MAX_TEXTURE || height as usize > MAX_TEXTURE {
                bail!(
                    "A {width}x{height} image is too large to display, narrow the input with --length"
                );
            }
        }
        Ok(scene)
    }
}

async fn window(scene: Scene) {
    match scene {
        Scene::Image(image) => {
            let texture = texture(&image);
            loop {
                clear_background(BLACK);
                draw_fullscreen(&texture);
                next_frame().await
            }
        }
        Scene::Bars { values, normalize } => loop {
            clear_background(BLACK);
            draw_bars(&values, normalize);
            next_frame().await
        },
        Scene::DotPlot {
            bytes,
            params,
            seed,
        } => {
            let mut plot = DotPlot::seeded(&bytes, params, seed);
            let dim = plot.dim().max(1);
            let texture = Texture2D::from_rgba8(dim as u16, dim as u16, &vec![0; dim * dim * 4]);
            texture.set_filter(FilterMode::Nearest);
            let mut dirty = true;
            loop {
                if !plot.is_done() {
                    plot.advance_by(DOTPLOT_STEPS_PER_FRAME);
                    dirty = true;
                }
                if dirty {
                    if plot.dim() > 0 {
                        let rgba: RgbaImage = plot.image().convert();
                        texture.update_from_bytes(dim as u32, dim as u32, rgba.as_raw());
                    }
                    dirty = false;
                }
                clear_background(BLACK);
                draw_fullscreen(&texture);
                if !plot.is_done() {
                    draw_text(
                        &format!("{:.0}%", plot.progress() * 100.0),
                        8.0,
                        24.0,
                        24.0,
                        YELLOW,
                    );
                }
                next_frame().await
            }
        }
    }
}

fn texture(image: &RgbImage) -> Texture2D {
    let (width, height) = image.dimensions();
    let texture = Texture2D::from_rgba8(width as u16, height as u16, &to_rgba(image));
    texture.set_filter(FilterMode::Nearest);
    texture
}

fn draw_fullscreen(texture: &Texture2D) {
    draw_texture_ex(
        texture,
        0.0,
        0.0,
        WHITE,
        DrawTextureParams {
            dest_size: Some(vec2(screen_width(), screen_height())),
            ..Default::default()
        },
    );
}

fn draw_bars(values: &[f32], normalize: bool) {
    let width = screen_width();
    let rows = bin_rows(values, screen_height() as usize, normalize);
    for (y, value) in rows.into_iter().enumerate() {
        let Some(value) = value else {
            continue;
        };
        let value = value.clamp(0.0, 1.0);
        draw_rectangle(
            0.0,
            y as f32,
            value * width,
            1.0,
            Color::new(0.08, value, 0.08, 1.0),
        );
    }
}
