//! Radial mandala renderers.
//!
//! Two implementations share the cell geometry in [`geometry`] and the
//! palettes in [`palette`]:
//!
//! - [`MandalaRenderer`] draws the base pattern into an off-screen buffer
//!   and composites rotated/reflected copies of that buffer.
//! - [`OptimizedMandalaRenderer`] batches cells by ring and response level
//!   and re-renders symmetric copies from the same data.

pub mod geometry;
mod optimized;
pub mod palette;

pub use geometry::{MandalaSegment, RotationClock, SymmetryCopy};
pub use optimized::{trig_table, OptimizedMandalaRenderer, TrigTable};

use super::{FrameInfo, RenderCore, Renderer};
use crate::canvas::{CanvasHost, CompositeOp, DrawContext, Paint};
use crate::color::ColorMapper;
use crate::config::{
    ColorPalette, MandalaConfig, ModeConfig, SymmetryMode, Theme, VisualizationConfig,
    VisualizationMode,
};
use crate::constants::*;
use crate::error::RenderError;
use fnv::FnvHashMap;
use geometry::{cell_alpha, derive_segments, ring_bands, symmetry_copies, trace_cell};
use instant::Instant;
use palette::{glow_color, palette_colors, ring_gradient, PaletteColors};

/// Settings and animation state both mandala renderers carry.
#[derive(Debug)]
pub(crate) struct MandalaState {
    pub(crate) config: MandalaConfig,
    pub(crate) sensitivity: f64,
    pub(crate) bin_count: usize,
    pub(crate) clock: RotationClock,
    pub(crate) palette: PaletteColors,
    palette_theme: Theme,
    colors: ColorMapper,
    started: Instant,
}

impl MandalaState {
    pub(crate) fn new() -> Self {
        let config = MandalaConfig::default();
        let theme = Theme::default();
        let mut colors = ColorMapper::new();
        Self {
            palette: palette_colors(
                config.color_palette,
                theme,
                &config.custom_colors,
                &mut colors,
            ),
            colors,
            config,
            sensitivity: 1.0,
            bin_count: DEFAULT_FREQUENCY_BIN_COUNT,
            clock: RotationClock::default(),
            palette_theme: theme,
            started: Instant::now(),
        }
    }

    /// Milliseconds on the renderer's monotonic clock.
    pub(crate) fn now_ms(&self) -> f64 {
        self.started.elapsed().as_secs_f64() * 1000.0
    }

    /// Apply new settings. Returns whether cached gradients are stale.
    pub(crate) fn apply(&mut self, config: &VisualizationConfig) -> bool {
        let config = config.normalized();
        self.sensitivity = config.sensitivity;
        let ModeConfig::Mandala(next) = config.mode else {
            log::debug!("[mandala] ignoring bar settings");
            return false;
        };
        let stale = next.rings != self.config.rings
            || next.color_palette != self.config.color_palette
            || next.custom_colors != self.config.custom_colors
            || next.inner_radius != self.config.inner_radius
            || next.outer_radius != self.config.outer_radius;
        self.config = next;
        if stale {
            self.refresh_palette(self.palette_theme);
        }
        stale
    }

    pub(crate) fn refresh_palette(&mut self, theme: Theme) {
        self.palette_theme = theme;
        self.palette = palette_colors(
            self.config.color_palette,
            theme,
            &self.config.custom_colors,
            &mut self.colors,
        );
    }

    #[inline]
    pub(crate) fn radius(frame: &FrameInfo) -> f64 {
        frame.center_x.min(frame.center_y)
    }

    pub(crate) fn begin_glow<C: DrawContext>(&self, ctx: &mut C) -> bool {
        if self.config.glow_intensity <= 0.0 {
            return false;
        }
        ctx.set_shadow_color(glow_color(&self.palette));
        ctx.set_shadow_blur(self.config.glow_intensity * GLOW_MAX_BLUR);
        true
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct GradientKey {
    ring: usize,
    palette: ColorPalette,
    theme: Theme,
}

pub struct MandalaRenderer<H: CanvasHost> {
    core: RenderCore<H>,
    state: MandalaState,
    gradients: FnvHashMap<GradientKey, Paint>,
    offscreen: Option<H::Context>,
    offscreen_warned: bool,
}

impl<H: CanvasHost> MandalaRenderer<H> {
    pub fn new(host: H, budget_ms: f64) -> Self {
        Self {
            core: RenderCore::new(host, budget_ms),
            state: MandalaState::new(),
            gradients: FnvHashMap::default(),
            offscreen: None,
            offscreen_warned: false,
        }
    }

    pub fn config(&self) -> &MandalaConfig {
        &self.state.config
    }

    /// Current rotation in radians, in `[0, 2π)`.
    pub fn rotation(&self) -> f64 {
        self.state.clock.rotation()
    }

    pub fn has_offscreen(&self) -> bool {
        self.offscreen.is_some()
    }

    pub fn cached_gradients(&self) -> usize {
        self.gradients.len()
    }

    /// Advance the rotation to `timestamp_ms` without drawing.
    pub fn advance_rotation(&mut self, timestamp_ms: f64) -> f64 {
        let speed = self.state.config.rotation_speed;
        self.state.clock.advance(timestamp_ms, speed)
    }

    /// Cells the current frame would draw (base pattern only).
    pub fn derive_segments(&self, frequency_data: &[u8]) -> Vec<MandalaSegment> {
        let frame = self.core.frame_info();
        derive_segments(
            frequency_data,
            &self.state.config,
            self.state.sensitivity,
            self.state.bin_count,
            MandalaState::radius(&frame),
            self.state.clock.rotation(),
        )
    }

    /// Draw a frame at an explicit timestamp.
    pub fn render_at(&mut self, frequency_data: &[u8], timestamp_ms: f64) {
        self.advance_rotation(timestamp_ms);
        let Self {
            core,
            state,
            gradients,
            offscreen,
            ..
        } = self;

        core.perform_render(|ctx, frame| {
            let symmetry = state.config.symmetry_mode;
            match (symmetry, offscreen.as_mut()) {
                (SymmetryMode::None, _) | (_, None) => {
                    draw_pattern(ctx, frequency_data, state, gradients, frame);
                }
                (mode, Some(layer)) => {
                    layer.set_transform(frame.dpr, 0.0, 0.0, frame.dpr, 0.0, 0.0);
                    layer.clear_rect(0.0, 0.0, frame.width, frame.height);
                    draw_pattern(layer, frequency_data, state, gradients, frame);
                    composite_symmetry(ctx, layer, mode, frame);
                }
            }
        });
    }

    fn ensure_offscreen(&mut self, recreate: bool) {
        if self.state.config.symmetry_mode == SymmetryMode::None {
            self.offscreen = None;
            return;
        }
        if self.offscreen.is_some() && !recreate {
            return;
        }
        let frame = self.core.frame_info();
        let w = ((frame.width * frame.dpr).round() as u32).max(1);
        let h = ((frame.height * frame.dpr).round() as u32).max(1);
        self.offscreen = self
            .core
            .host_mut()
            .and_then(|host| host.create_offscreen(w, h));
        if self.offscreen.is_none() && !self.offscreen_warned {
            self.offscreen_warned = true;
            log::warn!(
                "[mandala] {}; drawing without symmetry",
                RenderError::OffscreenUnavailable {
                    width: w,
                    height: h
                }
            );
        }
    }
}

/// Draw the base pattern ring by ring into `ctx`.
fn draw_pattern<C: DrawContext>(
    ctx: &mut C,
    data: &[u8],
    state: &MandalaState,
    gradients: &mut FnvHashMap<GradientKey, Paint>,
    frame: &FrameInfo,
) {
    let radius = MandalaState::radius(frame);
    let segments = derive_segments(
        data,
        &state.config,
        state.sensitivity,
        state.bin_count,
        radius,
        state.clock.rotation(),
    );
    if segments.is_empty() {
        return;
    }
    let bands = ring_bands(&state.config, radius);
    let (cx, cy) = (frame.center_x, frame.center_y);
    let glowing = state.begin_glow(ctx);

    let mut current_ring = None;
    for seg in &segments {
        if current_ring != Some(seg.ring) {
            current_ring = Some(seg.ring);
            let key = GradientKey {
                ring: seg.ring,
                palette: state.config.color_palette,
                theme: frame.theme,
            };
            let paint = gradients.entry(key).or_insert_with(|| {
                let band = bands[seg.ring];
                ring_gradient(&state.palette, seg.ring, cx, cy, band.inner, band.outer)
            });
            ctx.set_fill_style(paint);
        }
        ctx.set_global_alpha(cell_alpha(seg.response));
        ctx.begin_path();
        trace_cell(ctx, cx, cy, seg);
        ctx.fill();
    }

    ctx.set_global_alpha(1.0);
    if glowing {
        ctx.set_shadow_blur(0.0);
    }
}

/// Blit the layer, then each symmetric copy of it about the center.
fn composite_symmetry<C: DrawContext>(
    ctx: &mut C,
    layer: &C,
    mode: SymmetryMode,
    frame: &FrameInfo,
) {
    let (w, h) = (frame.width, frame.height);
    let (cx, cy) = (frame.center_x, frame.center_y);
    ctx.draw_context(layer, 0.0, 0.0, w, h);

    for copy in symmetry_copies(mode) {
        let sx = if copy.flip_x { -copy.scale } else { copy.scale };
        let sy = if copy.flip_y { -copy.scale } else { copy.scale };
        ctx.save();
        ctx.set_composite_operation(copy.composite);
        ctx.set_global_alpha(copy.alpha);
        ctx.translate(cx, cy);
        ctx.rotate(copy.rotation);
        ctx.scale(sx, sy);
        ctx.translate(-cx, -cy);
        ctx.draw_context(layer, 0.0, 0.0, w, h);
        ctx.restore();
    }
    ctx.set_composite_operation(CompositeOp::SourceOver);
}

impl<H: CanvasHost> Renderer for MandalaRenderer<H> {
    type Host = H;

    fn core(&self) -> &RenderCore<H> {
        &self.core
    }

    fn core_mut(&mut self) -> &mut RenderCore<H> {
        &mut self.core
    }

    fn mode(&self) -> VisualizationMode {
        VisualizationMode::Mandala
    }

    fn render(&mut self, frequency_data: &[u8]) {
        let now = self.state.now_ms();
        self.render_at(frequency_data, now);
    }

    fn update_configuration(&mut self, config: &VisualizationConfig) {
        self.set_theme(config.theme);
        if self.state.apply(config) {
            self.gradients.clear();
        }
        if self.core.is_ready() {
            self.ensure_offscreen(false);
        }
    }

    fn update_frequency_bin_count(&mut self, count: usize) {
        self.state.bin_count = count;
    }

    fn on_resize(&mut self) {
        self.gradients.clear();
        self.ensure_offscreen(true);
    }

    fn on_theme_change(&mut self) {
        self.state.refresh_palette(self.core.theme());
        self.gradients.clear();
    }

    fn on_dispose(&mut self) {
        self.offscreen = None;
        self.gradients.clear();
        self.state.clock.reset();
    }
}
