//! Visual treatments for a row of bars.

use crate::canvas::{
    ColorStop, CompositeOp, DrawContext, LinearGradient, Paint, Rgba,
};
use crate::color::{adjust_brightness, ColorConfig, ColorMapper};
use crate::config::{BarVisualMode, Theme};
use crate::constants::*;
use smallvec::smallvec;

/// One bar ready to draw, in CSS pixels. `height` is measured up from the
/// bottom edge of the canvas.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BarSample {
    pub x: f64,
    pub width: f64,
    pub height: f64,
    pub magnitude: f64,
}

/// Per-frame read-only view handed to [`BarEffects::render`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BarEffectConfig {
    pub color: ColorConfig,
    pub peak_decay_rate: f64,
}

impl BarEffectConfig {
    #[inline]
    pub fn visual_mode(&self) -> BarVisualMode {
        self.color.visual_mode
    }
}

/// Draws bars under the configured [`BarVisualMode`] and keeps the peak-hold
/// state between frames.
#[derive(Debug)]
pub struct BarEffects {
    peaks: Vec<f64>,
    decay_rate: f64,
}

impl Default for BarEffects {
    fn default() -> Self {
        Self::new(0.95)
    }
}

impl BarEffects {
    pub fn new(decay_rate: f64) -> Self {
        Self {
            peaks: Vec::new(),
            decay_rate: decay_rate.clamp(MIN_PEAK_DECAY, MAX_PEAK_DECAY),
        }
    }

    pub fn decay_rate(&self) -> f64 {
        self.decay_rate
    }

    /// Clamped to `[0.8, 0.99]`.
    pub fn set_decay_rate(&mut self, rate: f64) {
        let rate = if rate.is_finite() { rate } else { 0.95 };
        self.decay_rate = rate.clamp(MIN_PEAK_DECAY, MAX_PEAK_DECAY);
    }

    pub fn peaks(&self) -> &[f64] {
        &self.peaks
    }

    /// Forget held peaks (bar count changed).
    pub fn reset_peaks(&mut self) {
        self.peaks.clear();
    }

    /// Advance peak-hold state by one frame.
    ///
    /// A rising bar pulls its peak up to exactly its height; otherwise the
    /// peak decays geometrically but never below the live bar.
    pub fn update_peaks(&mut self, bars: &[BarSample]) {
        if self.peaks.len() != bars.len() {
            self.peaks = vec![0.0; bars.len()];
        }
        for (peak, bar) in self.peaks.iter_mut().zip(bars) {
            let h = bar.height.max(0.0);
            if h >= *peak {
                *peak = h;
            } else {
                *peak = (*peak * self.decay_rate).max(h);
                if *peak < 0.5 {
                    *peak = h;
                }
            }
        }
    }

    pub fn render<C: DrawContext>(
        &mut self,
        ctx: &mut C,
        bars: &[BarSample],
        cfg: &BarEffectConfig,
        colors: &mut ColorMapper,
    ) {
        self.set_decay_rate(cfg.peak_decay_rate);
        self.update_peaks(bars);
        match cfg.visual_mode() {
            BarVisualMode::Standard => draw_bars(ctx, bars, &cfg.color, colors),
            BarVisualMode::Wave => draw_wave(ctx, bars, &cfg.color, colors),
            BarVisualMode::Mirror => draw_mirror(ctx, bars, &cfg.color, colors),
            BarVisualMode::ThreeD => draw_3d(ctx, bars, &cfg.color, colors),
            BarVisualMode::PeakHold => {
                draw_bars(ctx, bars, &cfg.color, colors);
                self.draw_peak_caps(ctx, bars, &cfg.color);
            }
        }
    }

    fn draw_peak_caps<C: DrawContext>(&self, ctx: &mut C, bars: &[BarSample], cfg: &ColorConfig) {
        let cap = match cfg.theme {
            Theme::Dark => Rgba::rgba(255, 255, 255, 0.9),
            Theme::Light => Rgba::rgba(20, 20, 28, 0.85),
        };
        ctx.set_fill_style(&Paint::Solid(cap));
        for (bar, peak) in bars.iter().zip(&self.peaks) {
            if *peak <= 0.0 {
                continue;
            }
            let top = (cfg.canvas_height - peak - PEAK_CAP_HEIGHT).max(0.0);
            ctx.fill_rect(bar.x, top, bar.width, PEAK_CAP_HEIGHT);
        }
    }
}

fn draw_bars<C: DrawContext>(
    ctx: &mut C,
    bars: &[BarSample],
    cfg: &ColorConfig,
    colors: &mut ColorMapper,
) {
    let uniform = colors.uniform_fill(cfg);
    if let Some(fill) = &uniform {
        ctx.set_fill_style(fill);
    }
    for (i, bar) in bars.iter().enumerate() {
        if bar.height <= 0.0 {
            continue;
        }
        if uniform.is_none() {
            ctx.set_fill_style(&colors.fill_for(i, bar.magnitude, cfg));
        }
        ctx.fill_rect(bar.x, cfg.canvas_height - bar.height, bar.width, bar.height);
    }
}

fn draw_wave<C: DrawContext>(
    ctx: &mut C,
    bars: &[BarSample],
    cfg: &ColorConfig,
    colors: &mut ColorMapper,
) {
    ctx.set_global_alpha(WAVE_BAR_ALPHA);
    draw_bars(ctx, bars, cfg, colors);
    ctx.set_global_alpha(1.0);

    if bars.len() < 2 {
        return;
    }
    let points: Vec<(f64, f64)> = bars
        .iter()
        .map(|b| (b.x + b.width / 2.0, cfg.canvas_height - b.height))
        .collect();
    let line = cfg.theme.accent_pair().1;

    ctx.begin_path();
    ctx.move_to(points[0].0, points[0].1);
    for pair in points.windows(2).skip(1) {
        let (cx, cy) = pair[0];
        let mid = ((pair[0].0 + pair[1].0) / 2.0, (pair[0].1 + pair[1].1) / 2.0);
        ctx.quadratic_curve_to(cx, cy, mid.0, mid.1);
    }
    let last = points[points.len() - 1];
    ctx.line_to(last.0, last.1);

    ctx.set_stroke_style(&Paint::Solid(line));
    ctx.set_line_width(WAVE_LINE_WIDTH);
    ctx.set_shadow_color(line);
    ctx.set_shadow_blur(WAVE_GLOW_BLUR);
    ctx.stroke();
    ctx.set_shadow_blur(0.0);
}

fn draw_mirror<C: DrawContext>(
    ctx: &mut C,
    bars: &[BarSample],
    cfg: &ColorConfig,
    colors: &mut ColorMapper,
) {
    let mid = cfg.canvas_height / 2.0;
    let half: Vec<BarSample> = bars
        .iter()
        .map(|b| BarSample {
            height: b.height / 2.0,
            ..*b
        })
        .collect();
    let upper = ColorConfig {
        canvas_height: mid,
        ..*cfg
    };

    // Upper half rises from the midline.
    draw_bars(ctx, &half, &upper, colors);

    // Reflection below the midline.
    ctx.save();
    ctx.translate(0.0, cfg.canvas_height);
    ctx.scale(1.0, -1.0);
    draw_bars(ctx, &half, &upper, colors);
    ctx.restore();

    // destination-in clears everything outside the filled shape, so keep
    // the mask to the reflection
    ctx.save();
    ctx.begin_path();
    ctx.rect(0.0, mid, cfg.canvas_width, cfg.canvas_height - mid);
    ctx.clip();
    ctx.set_composite_operation(CompositeOp::DestinationIn);
    ctx.set_fill_style(&Paint::Linear(LinearGradient {
        x0: 0.0,
        y0: mid,
        x1: 0.0,
        y1: cfg.canvas_height,
        stops: smallvec![
            ColorStop::new(0.0, Rgba::rgba(0, 0, 0, MIRROR_FADE_ALPHA)),
            ColorStop::new(1.0, Rgba::rgba(0, 0, 0, 0.0)),
        ],
    }));
    ctx.fill_rect(0.0, mid, cfg.canvas_width, cfg.canvas_height - mid);
    // the mask also cleared the background behind the reflection
    ctx.set_composite_operation(CompositeOp::DestinationOver);
    ctx.set_fill_style(&Paint::Solid(cfg.theme.background()));
    ctx.fill_rect(0.0, mid, cfg.canvas_width, cfg.canvas_height - mid);
    ctx.restore();
}

fn draw_3d<C: DrawContext>(
    ctx: &mut C,
    bars: &[BarSample],
    cfg: &ColorConfig,
    colors: &mut ColorMapper,
) {
    let floor = cfg.canvas_height;
    for (i, bar) in bars.iter().enumerate() {
        if bar.height <= 0.0 {
            continue;
        }
        let base = colors.solid_color(i, bar.magnitude, cfg);
        let depth = bar.magnitude.clamp(0.0, 1.0) * MAX_DEPTH_3D;
        let (x, w, top) = (bar.x, bar.width, floor - bar.height);

        ctx.set_fill_style(&colors.fill_for(i, bar.magnitude, cfg));
        ctx.fill_rect(x, top, w, bar.height);

        if depth <= 0.0 {
            continue;
        }
        // side face
        ctx.set_fill_style(&Paint::Solid(adjust_brightness(base, 0.6)));
        ctx.begin_path();
        ctx.move_to(x + w, top);
        ctx.line_to(x + w + depth, top - depth);
        ctx.line_to(x + w + depth, floor - depth);
        ctx.line_to(x + w, floor);
        ctx.close_path();
        ctx.fill();

        // top face
        ctx.set_fill_style(&Paint::Solid(adjust_brightness(base, 1.3)));
        ctx.begin_path();
        ctx.move_to(x, top);
        ctx.line_to(x + depth, top - depth);
        ctx.line_to(x + w + depth, top - depth);
        ctx.line_to(x + w, top);
        ctx.close_path();
        ctx.fill();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(heights: &[f64]) -> Vec<BarSample> {
        heights
            .iter()
            .enumerate()
            .map(|(i, h)| BarSample {
                x: i as f64 * 10.0,
                width: 8.0,
                height: *h,
                magnitude: h / 100.0,
            })
            .collect()
    }

    #[test]
    fn peak_rises_to_bar_height_exactly() {
        let mut fx = BarEffects::new(0.9);
        fx.update_peaks(&row(&[10.0, 50.0]));
        assert_eq!(fx.peaks(), &[10.0, 50.0]);
        fx.update_peaks(&row(&[30.0, 80.0]));
        assert_eq!(fx.peaks(), &[30.0, 80.0]);
    }

    #[test]
    fn peak_decays_but_not_below_live_bar() {
        let mut fx = BarEffects::new(0.9);
        fx.update_peaks(&row(&[100.0]));
        fx.update_peaks(&row(&[95.0]));
        assert_eq!(fx.peaks(), &[95.0]);
        fx.update_peaks(&row(&[0.0]));
        assert!((fx.peaks()[0] - 85.5).abs() < 1e-9);
    }

    #[test]
    fn decay_rate_is_clamped() {
        let mut fx = BarEffects::new(0.1);
        assert_eq!(fx.decay_rate(), MIN_PEAK_DECAY);
        fx.set_decay_rate(1.5);
        assert_eq!(fx.decay_rate(), MAX_PEAK_DECAY);
        fx.set_decay_rate(f64::NAN);
        assert_eq!(fx.decay_rate(), 0.95);
    }

    #[test]
    fn peaks_reset_when_bar_count_changes() {
        let mut fx = BarEffects::new(0.9);
        fx.update_peaks(&row(&[40.0, 40.0]));
        fx.update_peaks(&row(&[0.0, 0.0, 0.0]));
        assert_eq!(fx.peaks(), &[0.0, 0.0, 0.0]);
    }
}
