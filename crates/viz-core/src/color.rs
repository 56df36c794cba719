//! Bar color resolution.
//!
//! Maps a bar index and magnitude to a fill under one of the [`ColorMode`]s.
//! The `theme` mode bakes a single vertical gradient that every bar shares;
//! the other modes produce one solid color per bar.

use crate::canvas::{even_stops, LinearGradient, Paint, Rgba};
use crate::config::{BarVisualMode, ColorMode, Theme};
use fnv::FnvHashMap;

/// Bar-index tercile boundaries for the `frequency` color mode, as fractions
/// of the bar count. Aesthetic choices, kept adjustable.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrequencyBands {
    pub bass_end: f64,
    pub mid_end: f64,
}

pub const BASS_BAND_END: f64 = 0.33;
pub const MID_BAND_END: f64 = 0.67;

impl Default for FrequencyBands {
    fn default() -> Self {
        Self {
            bass_end: BASS_BAND_END,
            mid_end: MID_BAND_END,
        }
    }
}

const BASS_COLOR: Rgba = Rgba::rgb(255, 72, 72);
const MID_COLOR: Rgba = Rgba::rgb(72, 230, 120);
const TREBLE_COLOR: Rgba = Rgba::rgb(72, 140, 255);

/// Per-frame view of everything that influences bar colors.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColorConfig {
    pub theme: Theme,
    pub bar_count: usize,
    pub canvas_width: f64,
    pub canvas_height: f64,
    pub color_mode: ColorMode,
    pub visual_mode: BarVisualMode,
}

#[derive(Debug, Default)]
pub struct ColorMapper {
    bands: FrequencyBands,
    // (theme, canvas height bits) -> gradient
    theme_gradient: Option<(Theme, u64, Paint)>,
    parsed_hex: FnvHashMap<String, Option<Rgba>>,
}

impl ColorMapper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bands(bands: FrequencyBands) -> Self {
        Self {
            bands,
            ..Self::default()
        }
    }

    pub fn bands(&self) -> FrequencyBands {
        self.bands
    }

    pub fn set_bands(&mut self, bands: FrequencyBands) {
        self.bands = bands;
    }

    /// Drop cached gradients; called on theme change and resize.
    pub fn invalidate(&mut self) {
        self.theme_gradient = None;
    }

    /// The fill shared by every bar, when the mode has one.
    pub fn uniform_fill(&mut self, cfg: &ColorConfig) -> Option<Paint> {
        match cfg.color_mode {
            ColorMode::Theme => Some(self.theme_gradient(cfg).clone()),
            _ => None,
        }
    }

    /// Fill for one bar.
    pub fn fill_for(&mut self, index: usize, magnitude: f64, cfg: &ColorConfig) -> Paint {
        match cfg.color_mode {
            ColorMode::Theme => self.theme_gradient(cfg).clone(),
            _ => Paint::Solid(self.solid_color(index, magnitude, cfg)),
        }
    }

    /// A representative solid color for one bar in any mode.
    pub fn solid_color(&self, index: usize, magnitude: f64, cfg: &ColorConfig) -> Rgba {
        let magnitude = magnitude.clamp(0.0, 1.0);
        let count = cfg.bar_count.max(1) as f64;
        match cfg.color_mode {
            ColorMode::Theme => {
                let (low, high) = cfg.theme.accent_pair();
                lerp_rgb(low, high, magnitude)
            }
            ColorMode::Frequency => {
                let position = index as f64 / count;
                let base = if position < self.bands.bass_end {
                    BASS_COLOR
                } else if position < self.bands.mid_end {
                    MID_COLOR
                } else {
                    TREBLE_COLOR
                };
                base.with_alpha(0.4 + 0.6 * magnitude)
            }
            ColorMode::Rainbow => {
                let hue = index as f64 / count * 360.0;
                hsl_to_rgb(hue, 0.8, 0.45 + 0.15 * magnitude)
            }
            ColorMode::Amplitude => {
                let hue = match cfg.theme {
                    Theme::Dark => 190.0,
                    Theme::Light => 220.0,
                };
                hsl_to_rgb(hue, 0.4 + 0.6 * magnitude, 0.3 + 0.4 * magnitude)
            }
        }
    }

    fn theme_gradient(&mut self, cfg: &ColorConfig) -> &Paint {
        let key = (cfg.theme, cfg.canvas_height.to_bits());
        let stale = !matches!(&self.theme_gradient, Some((t, h, _)) if (*t, *h) == key);
        if stale {
            self.theme_gradient = None;
        }
        let (_, _, paint) = self.theme_gradient.get_or_insert_with(|| {
            let (low, high) = cfg.theme.accent_pair();
            let paint = Paint::Linear(LinearGradient {
                x0: 0.0,
                y0: cfg.canvas_height,
                x1: 0.0,
                y1: 0.0,
                stops: even_stops(&[low, lerp_rgb(low, high, 0.5), high]),
            });
            (key.0, key.1, paint)
        });
        paint
    }

    /// Parse a hex color, memoizing the result (including failures).
    pub fn parse_hex(&mut self, hex: &str) -> Option<Rgba> {
        if let Some(cached) = self.parsed_hex.get(hex) {
            return *cached;
        }
        let parsed = Rgba::from_hex(hex);
        if parsed.is_none() {
            log::warn!("[color] ignoring unparsable color {:?}", hex);
        }
        self.parsed_hex.insert(hex.to_owned(), parsed);
        parsed
    }

    /// Distinct hex strings seen by [`parse_hex`](Self::parse_hex).
    pub fn cached_hex(&self) -> usize {
        self.parsed_hex.len()
    }

    /// Swatch colors for a settings preview: `samples` bars at full scale.
    pub fn preview(&self, cfg: &ColorConfig, samples: usize) -> Vec<Rgba> {
        let samples = samples.max(1);
        let preview_cfg = ColorConfig {
            bar_count: samples,
            ..*cfg
        };
        (0..samples)
            .map(|i| {
                let magnitude = (i + 1) as f64 / samples as f64;
                self.solid_color(i, magnitude, &preview_cfg)
            })
            .collect()
    }
}

/// HSL (hue in degrees, s and l in 0..1) to RGB.
pub fn hsl_to_rgb(hue: f64, saturation: f64, lightness: f64) -> Rgba {
    let h = hue.rem_euclid(360.0) / 60.0;
    let s = saturation.clamp(0.0, 1.0);
    let l = lightness.clamp(0.0, 1.0);
    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let x = c * (1.0 - (h % 2.0 - 1.0).abs());
    let (r1, g1, b1) = match h as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = l - c / 2.0;
    Rgba::rgb(to_u8(r1 + m), to_u8(g1 + m), to_u8(b1 + m))
}

/// Scale RGB channels by `factor`, keeping alpha.
pub fn adjust_brightness(color: Rgba, factor: f64) -> Rgba {
    let f = factor.max(0.0);
    Rgba {
        r: to_u8(color.r as f64 / 255.0 * f),
        g: to_u8(color.g as f64 / 255.0 * f),
        b: to_u8(color.b as f64 / 255.0 * f),
        a: color.a,
    }
}

pub fn lerp_rgb(a: Rgba, b: Rgba, t: f64) -> Rgba {
    let t = t.clamp(0.0, 1.0);
    let mix = |x: u8, y: u8| (x as f64 + (y as f64 - x as f64) * t).round() as u8;
    Rgba {
        r: mix(a.r, b.r),
        g: mix(a.g, b.g),
        b: mix(a.b, b.b),
        a: a.a + (b.a - a.a) * t,
    }
}

#[inline]
fn to_u8(v: f64) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(mode: ColorMode) -> ColorConfig {
        ColorConfig {
            theme: Theme::Dark,
            bar_count: 30,
            canvas_width: 300.0,
            canvas_height: 200.0,
            color_mode: mode,
            visual_mode: BarVisualMode::Standard,
        }
    }

    #[test]
    fn hsl_primaries() {
        assert_eq!(hsl_to_rgb(0.0, 1.0, 0.5), Rgba::rgb(255, 0, 0));
        assert_eq!(hsl_to_rgb(120.0, 1.0, 0.5), Rgba::rgb(0, 255, 0));
        assert_eq!(hsl_to_rgb(240.0, 1.0, 0.5), Rgba::rgb(0, 0, 255));
        assert_eq!(hsl_to_rgb(360.0, 1.0, 0.5), Rgba::rgb(255, 0, 0));
    }

    #[test]
    fn frequency_mode_uses_terciles() {
        let mapper = ColorMapper::new();
        let c = cfg(ColorMode::Frequency);
        let bass = mapper.solid_color(0, 1.0, &c);
        let mid = mapper.solid_color(15, 1.0, &c);
        let treble = mapper.solid_color(29, 1.0, &c);
        assert_eq!((bass.r, bass.g, bass.b), (BASS_COLOR.r, BASS_COLOR.g, BASS_COLOR.b));
        assert_eq!((mid.r, mid.g, mid.b), (MID_COLOR.r, MID_COLOR.g, MID_COLOR.b));
        assert_eq!(
            (treble.r, treble.g, treble.b),
            (TREBLE_COLOR.r, TREBLE_COLOR.g, TREBLE_COLOR.b)
        );
        assert!(mapper.solid_color(0, 0.0, &c).a < bass.a);
    }

    #[test]
    fn theme_gradient_is_cached_until_invalidated() {
        let mut mapper = ColorMapper::new();
        let c = cfg(ColorMode::Theme);
        let a = mapper.fill_for(0, 0.5, &c);
        let b = mapper.fill_for(7, 0.9, &c);
        assert_eq!(a, b);
        assert!(matches!(a, Paint::Linear(_)));

        let light = ColorConfig {
            theme: Theme::Light,
            ..c
        };
        assert_ne!(mapper.fill_for(0, 0.5, &light), a);
        mapper.invalidate();
        assert_eq!(mapper.fill_for(0, 0.5, &c), a);
    }

    #[test]
    fn hex_parsing_is_memoized() {
        let mut mapper = ColorMapper::new();
        assert_eq!(mapper.parse_hex("#ff0000"), Some(Rgba::rgb(255, 0, 0)));
        assert_eq!(mapper.parse_hex("nope"), None);
        assert_eq!(mapper.parsed_hex.len(), 2);
        mapper.parse_hex("#ff0000");
        assert_eq!(mapper.parsed_hex.len(), 2);
    }

    #[test]
    fn brightness_adjustment_saturates() {
        let c = adjust_brightness(Rgba::rgb(200, 100, 0), 2.0);
        assert_eq!(c, Rgba::rgb(255, 200, 0));
        let d = adjust_brightness(Rgba::rgb(200, 100, 0), 0.5);
        assert_eq!(d, Rgba::rgb(100, 50, 0));
    }

    #[test]
    fn preview_has_requested_length() {
        let mapper = ColorMapper::new();
        assert_eq!(mapper.preview(&cfg(ColorMode::Rainbow), 12).len(), 12);
        assert_eq!(mapper.preview(&cfg(ColorMode::Rainbow), 0).len(), 1);
    }
}
