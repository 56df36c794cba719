//! Frequency bars.

use super::{RenderCore, Renderer};
use crate::canvas::CanvasHost;
use crate::color::{ColorConfig, ColorMapper};
use crate::config::{BarConfig, ModeConfig, VisualizationConfig, VisualizationMode};
use crate::constants::*;
use crate::effects::{BarEffectConfig, BarEffects, BarSample};

/// Horizontal placement of one bar and the bin it samples.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BarSlot {
    pub x: f64,
    pub width: f64,
    pub bin: usize,
}

/// Bar positions for a canvas width and the bin each bar reads.
///
/// Bins are spread logarithmically between the bins of the configured
/// frequency range, so the low end gets as many bars as the highs. Bin 0
/// (DC) is never sampled.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BarLayout {
    slots: Vec<BarSlot>,
    spacing: f64,
}

impl BarLayout {
    pub fn compute(width: f64, bar_count: usize, bin_count: usize, config: &BarConfig) -> Self {
        let n = bar_count.max(1);
        let width = if width.is_finite() { width.max(0.0) } else { 0.0 };
        // never let gaps eat more than half of a bar's share
        let spacing = BAR_SPACING.min(width / n as f64 / 2.0);
        let bar_width = ((width - spacing * (n - 1) as f64) / n as f64).max(0.0);
        let bins = log_bins(n, bin_count, config);

        let slots = bins
            .into_iter()
            .enumerate()
            .map(|(i, bin)| BarSlot {
                x: i as f64 * (bar_width + spacing),
                width: bar_width,
                bin,
            })
            .collect();
        Self { slots, spacing }
    }

    pub fn slots(&self) -> &[BarSlot] {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn spacing(&self) -> f64 {
        self.spacing
    }

    pub fn bins(&self) -> impl Iterator<Item = usize> + '_ {
        self.slots.iter().map(|s| s.bin)
    }
}

/// Logarithmically spaced bin index for each of `n` bars.
pub fn log_bins(n: usize, bin_count: usize, config: &BarConfig) -> Vec<usize> {
    if bin_count < 2 {
        return vec![0; n];
    }
    let top = bin_count - 1;
    let bin_hz = (config.sample_rate_hz / 2.0) / bin_count as f64;
    let to_bin = |hz: f64| {
        let b = (hz / bin_hz).round();
        if b.is_finite() && b > 0.0 {
            b as usize
        } else {
            0
        }
    };
    let min_bin = to_bin(config.min_frequency_hz).clamp(1, top);
    let max_bin = to_bin(config.max_frequency_hz).clamp(min_bin, top);

    let (lo, hi) = ((min_bin as f64).ln(), (max_bin as f64).ln());
    (0..n)
        .map(|i| {
            let t = if n > 1 { i as f64 / (n - 1) as f64 } else { 0.0 };
            let bin = (lo + t * (hi - lo)).exp().round() as usize;
            bin.clamp(1, top)
        })
        .collect()
}

pub struct BarRenderer<H: CanvasHost> {
    core: RenderCore<H>,
    config: BarConfig,
    sensitivity: f64,
    bin_count: usize,
    layout: BarLayout,
    colors: ColorMapper,
    effects: BarEffects,
    samples: Vec<BarSample>,
}

impl<H: CanvasHost> BarRenderer<H> {
    pub fn new(host: H, budget_ms: f64) -> Self {
        let config = BarConfig::default();
        Self {
            core: RenderCore::new(host, budget_ms),
            effects: BarEffects::new(config.peak_decay_rate),
            config,
            sensitivity: 1.0,
            bin_count: DEFAULT_FREQUENCY_BIN_COUNT,
            layout: BarLayout::default(),
            colors: ColorMapper::new(),
            samples: Vec::new(),
        }
    }

    pub fn config(&self) -> &BarConfig {
        &self.config
    }

    pub fn sensitivity(&self) -> f64 {
        self.sensitivity
    }

    pub fn layout(&self) -> &BarLayout {
        &self.layout
    }

    /// Bars drawn in the last rendered frame.
    pub fn samples(&self) -> &[BarSample] {
        &self.samples
    }

    pub fn peaks(&self) -> &[f64] {
        self.effects.peaks()
    }

    pub fn colors_mut(&mut self) -> &mut ColorMapper {
        &mut self.colors
    }

    /// Clamped to `[8, 256]`; recomputes the layout and resets peaks.
    pub fn set_bar_count(&mut self, count: usize) {
        let count = count.clamp(MIN_BAR_COUNT, MAX_BAR_COUNT);
        if count == self.config.bar_count {
            return;
        }
        self.config.bar_count = count;
        self.effects.reset_peaks();
        self.recompute_layout();
    }

    fn recompute_layout(&mut self) {
        self.layout = BarLayout::compute(
            self.core.width(),
            self.config.bar_count,
            self.bin_count,
            &self.config,
        );
    }

    fn apply_bar_config(&mut self, next: BarConfig) {
        let layout_changed = next.bar_count != self.config.bar_count
            || next.min_frequency_hz != self.config.min_frequency_hz
            || next.max_frequency_hz != self.config.max_frequency_hz
            || next.sample_rate_hz != self.config.sample_rate_hz;
        if next.bar_count != self.config.bar_count {
            self.effects.reset_peaks();
        }
        self.effects.set_decay_rate(next.peak_decay_rate);
        self.config = next;
        if layout_changed {
            self.recompute_layout();
        }
    }
}

impl<H: CanvasHost> Renderer for BarRenderer<H> {
    type Host = H;

    fn core(&self) -> &RenderCore<H> {
        &self.core
    }

    fn core_mut(&mut self) -> &mut RenderCore<H> {
        &mut self.core
    }

    fn mode(&self) -> VisualizationMode {
        VisualizationMode::Bars
    }

    fn render(&mut self, frequency_data: &[u8]) {
        let Self {
            core,
            config,
            sensitivity,
            layout,
            colors,
            effects,
            samples,
            ..
        } = self;
        let sensitivity = *sensitivity;

        core.perform_render(|ctx, frame| {
            samples.clear();
            samples.extend(layout.slots().iter().map(|slot| {
                let value = frequency_data.get(slot.bin).copied().unwrap_or(0);
                let magnitude = (value as f64 / 255.0 * sensitivity).min(1.0);
                BarSample {
                    x: slot.x,
                    width: slot.width,
                    height: magnitude * frame.height * BAR_HEADROOM,
                    magnitude,
                }
            }));

            let fx = BarEffectConfig {
                color: ColorConfig {
                    theme: frame.theme,
                    bar_count: samples.len(),
                    canvas_width: frame.width,
                    canvas_height: frame.height,
                    color_mode: config.color_mode,
                    visual_mode: config.visual_mode,
                },
                peak_decay_rate: config.peak_decay_rate,
            };
            effects.render(ctx, samples, &fx, colors);
        });
    }

    fn update_configuration(&mut self, config: &VisualizationConfig) {
        let config = config.normalized();
        self.sensitivity = config.sensitivity;
        self.set_theme(config.theme);
        match &config.mode {
            ModeConfig::Bars(bars) => self.apply_bar_config(bars.clone()),
            ModeConfig::Mandala(_) => {
                log::debug!("[bars] ignoring mandala settings");
            }
        }
    }

    fn update_frequency_bin_count(&mut self, count: usize) {
        if count == self.bin_count {
            return;
        }
        self.bin_count = count;
        self.recompute_layout();
    }

    fn on_resize(&mut self) {
        self.colors.invalidate();
        self.recompute_layout();
    }

    fn on_theme_change(&mut self) {
        self.colors.invalidate();
    }

    fn on_dispose(&mut self) {
        self.samples.clear();
        self.effects.reset_peaks();
    }
}
