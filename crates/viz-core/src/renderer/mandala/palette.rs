//! Mandala palettes and per-ring gradients.

use crate::canvas::{even_stops, Paint, RadialGradient, Rgba};
use crate::color::ColorMapper;
use crate::config::{ColorPalette, Theme};
use smallvec::SmallVec;

pub type PaletteColors = SmallVec<[Rgba; 6]>;

const AURORA: [Rgba; 5] = [
    Rgba::rgb(0x00, 0xf5, 0xa0),
    Rgba::rgb(0x00, 0xd9, 0xf5),
    Rgba::rgb(0x7b, 0x61, 0xff),
    Rgba::rgb(0xc2, 0x4b, 0xff),
    Rgba::rgb(0xff, 0x6b, 0xd6),
];

const SOLAR: [Rgba; 5] = [
    Rgba::rgb(0xff, 0xf1, 0x76),
    Rgba::rgb(0xff, 0xc1, 0x07),
    Rgba::rgb(0xff, 0x8f, 0x00),
    Rgba::rgb(0xf4, 0x51, 0x1e),
    Rgba::rgb(0xd8, 0x1b, 0x60),
];

const CRYSTAL: [Rgba; 4] = [
    Rgba::rgb(0xe0, 0xf7, 0xff),
    Rgba::rgb(0x8e, 0xc5, 0xfc),
    Rgba::rgb(0x4f, 0x8c, 0xff),
    Rgba::rgb(0xa5, 0xb4, 0xfc),
];

const PSYCHEDELIC: [Rgba; 6] = [
    Rgba::rgb(0xff, 0x00, 0x80),
    Rgba::rgb(0xff, 0x80, 0x00),
    Rgba::rgb(0xff, 0xff, 0x00),
    Rgba::rgb(0x00, 0xff, 0x80),
    Rgba::rgb(0x00, 0x80, 0xff),
    Rgba::rgb(0x80, 0x00, 0xff),
];

const MONO_DARK: [Rgba; 4] = [
    Rgba::rgb(0x3a, 0x3a, 0x44),
    Rgba::rgb(0x80, 0x80, 0x8c),
    Rgba::rgb(0xc8, 0xc8, 0xd0),
    Rgba::rgb(0xff, 0xff, 0xff),
];

const MONO_LIGHT: [Rgba; 4] = [
    Rgba::rgb(0xd0, 0xd0, 0xd8),
    Rgba::rgb(0x90, 0x90, 0x9c),
    Rgba::rgb(0x50, 0x50, 0x5c),
    Rgba::rgb(0x14, 0x14, 0x1c),
];

/// Colors of `palette`. `custom` hex strings are used for
/// [`ColorPalette::Custom`], parsed through `colors`' memo; unparsable
/// entries are dropped and an empty result falls back to aurora.
pub fn palette_colors(
    palette: ColorPalette,
    theme: Theme,
    custom: &[String],
    colors: &mut ColorMapper,
) -> PaletteColors {
    match palette {
        ColorPalette::Aurora => AURORA.iter().copied().collect(),
        ColorPalette::Solar => SOLAR.iter().copied().collect(),
        ColorPalette::Crystal => CRYSTAL.iter().copied().collect(),
        ColorPalette::Psychedelic => PSYCHEDELIC.iter().copied().collect(),
        ColorPalette::Monochrome => match theme {
            Theme::Dark => MONO_DARK.iter().copied().collect(),
            Theme::Light => MONO_LIGHT.iter().copied().collect(),
        },
        ColorPalette::Custom => {
            let parsed: PaletteColors = custom
                .iter()
                .filter_map(|hex| colors.parse_hex(hex))
                .collect();
            if parsed.is_empty() {
                log::warn!("[mandala] no usable custom colors, using aurora");
                AURORA.iter().copied().collect()
            } else {
                parsed
            }
        }
    }
}

/// Color used for the glow shadow: the palette's middle entry.
pub fn glow_color(colors: &[Rgba]) -> Rgba {
    colors.get(colors.len() / 2).copied().unwrap_or(Rgba::WHITE)
}

/// Radial gradient spanning one ring band. Each ring starts one palette
/// entry further along so neighbouring rings differ.
pub fn ring_gradient(colors: &[Rgba], ring: usize, cx: f64, cy: f64, inner: f64, outer: f64) -> Paint {
    let n = colors.len().max(1);
    let rotated: PaletteColors = (0..n)
        .map(|i| colors.get((ring + i) % n).copied().unwrap_or(Rgba::WHITE))
        .collect();
    Paint::Radial(RadialGradient {
        x0: cx,
        y0: cy,
        r0: inner.max(0.0),
        x1: cx,
        y1: cy,
        r1: outer.max(inner.max(0.0)),
        stops: even_stops(&rotated),
    })
}
