//! User-facing visualization settings.
//!
//! Configs arrive from the settings store (outside this crate), usually as
//! plain JS objects. Out-of-range values are clamped by `normalized()`,
//! never rejected.

use crate::canvas::Rgba;
use crate::constants::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    #[default]
    Dark,
}

impl Theme {
    pub fn background(&self) -> Rgba {
        match self {
            Theme::Light => Rgba::rgb(0xf5, 0xf5, 0xf7),
            Theme::Dark => Rgba::rgb(0x0b, 0x0d, 0x14),
        }
    }

    /// Bottom and top colors of the `theme` bar gradient.
    pub fn accent_pair(&self) -> (Rgba, Rgba) {
        match self {
            Theme::Light => (Rgba::rgb(0x25, 0x63, 0xeb), Rgba::rgb(0x7c, 0x3a, 0xed)),
            Theme::Dark => (Rgba::rgb(0x22, 0xd3, 0xee), Rgba::rgb(0xa8, 0x55, 0xf7)),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisualizationMode {
    #[default]
    Bars,
    Mandala,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    #[default]
    Theme,
    Frequency,
    Rainbow,
    Amplitude,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BarVisualMode {
    #[default]
    #[serde(rename = "standard")]
    Standard,
    #[serde(rename = "wave")]
    Wave,
    #[serde(rename = "mirror")]
    Mirror,
    #[serde(rename = "3d")]
    ThreeD,
    #[serde(rename = "peak-hold")]
    PeakHold,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SymmetryMode {
    #[default]
    #[serde(rename = "none")]
    None,
    #[serde(rename = "mirror-x")]
    MirrorX,
    #[serde(rename = "mirror-y")]
    MirrorY,
    #[serde(rename = "radial-2x")]
    Radial2x,
    #[serde(rename = "radial-4x")]
    Radial4x,
    #[serde(rename = "radial-8x")]
    Radial8x,
    #[serde(rename = "kaleidoscope")]
    Kaleidoscope,
}

impl SymmetryMode {
    /// Fold count for the radial modes.
    pub fn radial_folds(&self) -> Option<usize> {
        match self {
            SymmetryMode::Radial2x => Some(2),
            SymmetryMode::Radial4x => Some(4),
            SymmetryMode::Radial8x => Some(8),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorPalette {
    #[default]
    Aurora,
    Solar,
    Crystal,
    Psychedelic,
    Monochrome,
    Custom,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BarConfig {
    pub bar_count: usize,
    pub color_mode: ColorMode,
    pub visual_mode: BarVisualMode,
    pub peak_decay_rate: f64,
    pub min_frequency_hz: f64,
    pub max_frequency_hz: f64,
    pub sample_rate_hz: f64,
}

impl Default for BarConfig {
    fn default() -> Self {
        Self {
            bar_count: 64,
            color_mode: ColorMode::Theme,
            visual_mode: BarVisualMode::Standard,
            peak_decay_rate: 0.95,
            min_frequency_hz: DEFAULT_MIN_FREQUENCY_HZ,
            max_frequency_hz: DEFAULT_MAX_FREQUENCY_HZ,
            sample_rate_hz: DEFAULT_SAMPLE_RATE_HZ,
        }
    }
}

impl BarConfig {
    pub fn normalized(&self) -> Self {
        let sample_rate_hz = if self.sample_rate_hz.is_finite() && self.sample_rate_hz > 0.0 {
            self.sample_rate_hz
        } else {
            DEFAULT_SAMPLE_RATE_HZ
        };
        let nyquist = sample_rate_hz / 2.0;
        let min_frequency_hz = finite_or(self.min_frequency_hz, DEFAULT_MIN_FREQUENCY_HZ)
            .clamp(0.0, nyquist);
        let max_frequency_hz = finite_or(self.max_frequency_hz, DEFAULT_MAX_FREQUENCY_HZ)
            .clamp(min_frequency_hz, nyquist);
        Self {
            bar_count: self.bar_count.clamp(MIN_BAR_COUNT, MAX_BAR_COUNT),
            color_mode: self.color_mode,
            visual_mode: self.visual_mode,
            peak_decay_rate: finite_or(self.peak_decay_rate, 0.95)
                .clamp(MIN_PEAK_DECAY, MAX_PEAK_DECAY),
            min_frequency_hz,
            max_frequency_hz,
            sample_rate_hz,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MandalaConfig {
    pub segments: usize,
    pub rings: usize,
    pub inner_radius: f64,
    pub outer_radius: f64,
    /// Degrees per second; negative spins counter-clockwise.
    pub rotation_speed: f64,
    pub symmetry_mode: SymmetryMode,
    pub color_palette: ColorPalette,
    /// Hex colors used by [`ColorPalette::Custom`].
    pub custom_colors: Vec<String>,
    pub glow_intensity: f64,
    pub pulse_reactivity: f64,
}

impl Default for MandalaConfig {
    fn default() -> Self {
        Self {
            segments: 24,
            rings: 5,
            inner_radius: 0.15,
            outer_radius: 0.9,
            rotation_speed: 12.0,
            symmetry_mode: SymmetryMode::None,
            color_palette: ColorPalette::Aurora,
            custom_colors: Vec::new(),
            glow_intensity: 0.3,
            pulse_reactivity: 0.5,
        }
    }
}

impl MandalaConfig {
    pub fn normalized(&self) -> Self {
        let mut inner = finite_or(self.inner_radius, 0.15)
            .clamp(MIN_RADIUS_FRACTION, MAX_RADIUS_FRACTION);
        let mut outer = finite_or(self.outer_radius, 0.9)
            .clamp(MIN_RADIUS_FRACTION, MAX_RADIUS_FRACTION);
        if inner > outer {
            std::mem::swap(&mut inner, &mut outer);
        }
        if outer - inner < MIN_RADIUS_FRACTION {
            // keep a non-empty band while staying inside (0, 1)
            outer = (inner + MIN_RADIUS_FRACTION).min(MAX_RADIUS_FRACTION);
            inner = outer - MIN_RADIUS_FRACTION;
        }
        Self {
            segments: self.segments.clamp(MIN_SEGMENTS, MAX_SEGMENTS),
            rings: self.rings.clamp(MIN_RINGS, MAX_RINGS),
            inner_radius: inner,
            outer_radius: outer,
            rotation_speed: finite_or(self.rotation_speed, 0.0)
                .clamp(-MAX_ROTATION_SPEED, MAX_ROTATION_SPEED),
            symmetry_mode: self.symmetry_mode,
            color_palette: self.color_palette,
            custom_colors: self.custom_colors.clone(),
            glow_intensity: finite_or(self.glow_intensity, 0.0).clamp(0.0, 1.0),
            pulse_reactivity: finite_or(self.pulse_reactivity, 0.0).clamp(0.0, 1.0),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum ModeConfig {
    Bars(BarConfig),
    Mandala(MandalaConfig),
}

impl ModeConfig {
    pub fn mode(&self) -> VisualizationMode {
        match self {
            ModeConfig::Bars(_) => VisualizationMode::Bars,
            ModeConfig::Mandala(_) => VisualizationMode::Mandala,
        }
    }

    pub fn default_for(mode: VisualizationMode) -> Self {
        match mode {
            VisualizationMode::Bars => ModeConfig::Bars(BarConfig::default()),
            VisualizationMode::Mandala => ModeConfig::Mandala(MandalaConfig::default()),
        }
    }
}

/// Settings shared by every mode plus the mode-specific block.
///
/// On the wire the mode block is flattened next to `theme` and
/// `sensitivity`, tagged by `mode`:
/// `{ "mode": "bars", "theme": "dark", "sensitivity": 1.2, "barCount": 96 }`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VisualizationConfig {
    #[serde(default)]
    pub theme: Theme,
    #[serde(default = "default_sensitivity")]
    pub sensitivity: f64,
    #[serde(flatten)]
    pub mode: ModeConfig,
}

fn default_sensitivity() -> f64 {
    1.0
}

impl Default for VisualizationConfig {
    fn default() -> Self {
        Self::for_mode(VisualizationMode::Bars)
    }
}

impl VisualizationConfig {
    pub fn for_mode(mode: VisualizationMode) -> Self {
        Self {
            theme: Theme::default(),
            sensitivity: default_sensitivity(),
            mode: ModeConfig::default_for(mode),
        }
    }

    pub fn bars(config: BarConfig) -> Self {
        Self {
            mode: ModeConfig::Bars(config),
            ..Self::for_mode(VisualizationMode::Bars)
        }
    }

    pub fn mandala(config: MandalaConfig) -> Self {
        Self {
            mode: ModeConfig::Mandala(config),
            ..Self::for_mode(VisualizationMode::Mandala)
        }
    }

    #[inline]
    pub fn mode(&self) -> VisualizationMode {
        self.mode.mode()
    }

    pub fn normalized(&self) -> Self {
        Self {
            theme: self.theme,
            sensitivity: finite_or(self.sensitivity, 1.0).max(0.0),
            mode: match &self.mode {
                ModeConfig::Bars(b) => ModeConfig::Bars(b.normalized()),
                ModeConfig::Mandala(m) => ModeConfig::Mandala(m.normalized()),
            },
        }
    }
}

#[inline]
fn finite_or(v: f64, fallback: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bar_config_clamps_out_of_range_values() {
        let cfg = BarConfig {
            bar_count: 1000,
            peak_decay_rate: 0.2,
            ..BarConfig::default()
        }
        .normalized();
        assert_eq!(cfg.bar_count, MAX_BAR_COUNT);
        assert_eq!(cfg.peak_decay_rate, MIN_PEAK_DECAY);

        let cfg = BarConfig {
            bar_count: 2,
            ..BarConfig::default()
        }
        .normalized();
        assert_eq!(cfg.bar_count, MIN_BAR_COUNT);
    }

    #[test]
    fn mandala_config_orders_radii() {
        let cfg = MandalaConfig {
            inner_radius: 0.8,
            outer_radius: 0.2,
            segments: 2,
            rings: 20,
            glow_intensity: 4.0,
            ..MandalaConfig::default()
        }
        .normalized();
        assert!(cfg.inner_radius < cfg.outer_radius);
        assert_eq!(cfg.segments, MIN_SEGMENTS);
        assert_eq!(cfg.rings, MAX_RINGS);
        assert_eq!(cfg.glow_intensity, 1.0);
    }

    #[test]
    fn negative_sensitivity_is_clamped_to_zero() {
        let cfg = VisualizationConfig {
            sensitivity: -3.0,
            ..VisualizationConfig::default()
        }
        .normalized();
        assert_eq!(cfg.sensitivity, 0.0);
    }
}
