//! Batched mandala renderer.
//!
//! Cells are grouped by `(ring, response level)` so each group costs one
//! `fill_style`/`global_alpha` change and one fill. Symmetric copies are
//! produced by transforming the cells themselves, so no off-screen buffer is
//! needed.

use super::geometry::{cell_alpha, derive_segments, ring_bands, symmetry_copies, SymmetryCopy};
use super::palette::ring_gradient;
use super::{MandalaSegment, MandalaState};
use crate::canvas::{CanvasHost, CompositeOp, DrawContext, Paint};
use crate::config::{MandalaConfig, VisualizationConfig, VisualizationMode};
use crate::constants::*;
use crate::renderer::{FrameInfo, RenderCore, Renderer};
use std::f64::consts::TAU;
use std::sync::OnceLock;

/// Whole-degree sine/cosine lookup.
pub struct TrigTable {
    sin: [f64; TRIG_TABLE_SIZE],
    cos: [f64; TRIG_TABLE_SIZE],
}

impl TrigTable {
    fn build() -> Self {
        let mut sin = [0.0; TRIG_TABLE_SIZE];
        let mut cos = [0.0; TRIG_TABLE_SIZE];
        for i in 0..TRIG_TABLE_SIZE {
            let a = TAU * i as f64 / TRIG_TABLE_SIZE as f64;
            sin[i] = a.sin();
            cos[i] = a.cos();
        }
        Self { sin, cos }
    }

    #[inline]
    fn index(angle: f64) -> usize {
        let turns = angle.rem_euclid(TAU) / TAU;
        (turns * TRIG_TABLE_SIZE as f64).round() as usize % TRIG_TABLE_SIZE
    }

    /// `(sin, cos)` of the nearest tabulated angle.
    #[inline]
    pub fn sin_cos(&self, angle: f64) -> (f64, f64) {
        let i = Self::index(angle);
        (self.sin[i], self.cos[i])
    }
}

static TRIG: OnceLock<TrigTable> = OnceLock::new();

/// Process-wide table, built on first use.
pub fn trig_table() -> &'static TrigTable {
    TRIG.get_or_init(TrigTable::build)
}

#[inline]
fn response_level(response: f64) -> usize {
    ((response.clamp(0.0, 1.0) * RESPONSE_LEVELS as f64) as usize).min(RESPONSE_LEVELS - 1)
}

#[inline]
fn level_alpha(level: usize) -> f64 {
    cell_alpha((level as f64 + 0.5) / RESPONSE_LEVELS as f64)
}

pub struct OptimizedMandalaRenderer<H: CanvasHost> {
    core: RenderCore<H>,
    state: MandalaState,
    /// One gradient per ring; empty means stale.
    gradients: Vec<Paint>,
    buckets: Vec<Vec<MandalaSegment>>,
}

impl<H: CanvasHost> OptimizedMandalaRenderer<H> {
    pub fn new(host: H, budget_ms: f64) -> Self {
        Self {
            core: RenderCore::new(host, budget_ms),
            state: MandalaState::new(),
            gradients: Vec::new(),
            buckets: Vec::new(),
        }
    }

    pub fn config(&self) -> &MandalaConfig {
        &self.state.config
    }

    pub fn rotation(&self) -> f64 {
        self.state.clock.rotation()
    }

    pub fn advance_rotation(&mut self, timestamp_ms: f64) -> f64 {
        let speed = self.state.config.rotation_speed;
        self.state.clock.advance(timestamp_ms, speed)
    }

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

    pub fn render_at(&mut self, frequency_data: &[u8], timestamp_ms: f64) {
        self.advance_rotation(timestamp_ms);
        let Self {
            core,
            state,
            gradients,
            buckets,
        } = self;

        core.perform_render(|ctx, frame| {
            let radius = MandalaState::radius(frame);
            let segments = derive_segments(
                frequency_data,
                &state.config,
                state.sensitivity,
                state.bin_count,
                radius,
                state.clock.rotation(),
            );
            if segments.is_empty() {
                return;
            }
            if gradients.len() != state.config.rings {
                *gradients = ring_bands(&state.config, radius)
                    .iter()
                    .enumerate()
                    .map(|(ring, band)| {
                        ring_gradient(
                            &state.palette,
                            ring,
                            frame.center_x,
                            frame.center_y,
                            band.inner,
                            band.outer,
                        )
                    })
                    .collect();
            }
            fill_buckets(buckets, &segments, state.config.rings);

            let glowing = state.begin_glow(ctx);
            let identity = SymmetryCopy {
                rotation: 0.0,
                flip_x: false,
                flip_y: false,
                scale: 1.0,
                alpha: 1.0,
                composite: CompositeOp::SourceOver,
            };
            draw_buckets(ctx, buckets, gradients, &identity, frame);
            for copy in symmetry_copies(state.config.symmetry_mode) {
                draw_buckets(ctx, buckets, gradients, &copy, frame);
            }
            ctx.set_composite_operation(CompositeOp::SourceOver);
            ctx.set_global_alpha(1.0);
            if glowing {
                ctx.set_shadow_blur(0.0);
            }
        });
    }

    pub fn cached_gradients(&self) -> usize {
        self.gradients.len()
    }
}

fn fill_buckets(buckets: &mut Vec<Vec<MandalaSegment>>, segments: &[MandalaSegment], rings: usize) {
    let needed = rings * RESPONSE_LEVELS;
    buckets.resize_with(needed, Vec::new);
    buckets.truncate(needed);
    for bucket in buckets.iter_mut() {
        bucket.clear();
    }
    for seg in segments {
        let slot = seg.ring * RESPONSE_LEVELS + response_level(seg.response);
        if let Some(bucket) = buckets.get_mut(slot) {
            bucket.push(*seg);
        }
    }
}

fn draw_buckets<C: DrawContext>(
    ctx: &mut C,
    buckets: &[Vec<MandalaSegment>],
    gradients: &[Paint],
    copy: &SymmetryCopy,
    frame: &FrameInfo,
) {
    let (cx, cy) = (frame.center_x, frame.center_y);
    let trig = trig_table();
    ctx.set_composite_operation(copy.composite);

    for (slot, bucket) in buckets.iter().enumerate() {
        if bucket.is_empty() {
            continue;
        }
        let (ring, level) = (slot / RESPONSE_LEVELS, slot % RESPONSE_LEVELS);
        if let Some(paint) = gradients.get(ring) {
            ctx.set_fill_style(paint);
        }
        ctx.set_global_alpha(level_alpha(level) * copy.alpha);
        ctx.begin_path();
        for seg in bucket {
            trace_cell_fast(ctx, cx, cy, &copy.apply(seg), trig);
        }
        ctx.fill();
    }
}

fn trace_cell_fast<C: DrawContext>(ctx: &mut C, cx: f64, cy: f64, seg: &MandalaSegment, trig: &TrigTable) {
    let (start, end) = (seg.start_angle, seg.end_angle);
    let (s0, c0) = trig.sin_cos(start);
    let (s1, c1) = trig.sin_cos(end);
    ctx.move_to(cx + seg.outer_radius * c0, cy + seg.outer_radius * s0);
    ctx.arc(cx, cy, seg.outer_radius, start, end, false);
    ctx.line_to(cx + seg.inner_radius * c1, cy + seg.inner_radius * s1);
    ctx.arc(cx, cy, seg.inner_radius, end, start, true);
    ctx.close_path();
}

impl<H: CanvasHost> Renderer for OptimizedMandalaRenderer<H> {
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
    }

    fn update_frequency_bin_count(&mut self, count: usize) {
        self.state.bin_count = count;
    }

    fn on_resize(&mut self) {
        self.gradients.clear();
    }

    fn on_theme_change(&mut self) {
        self.state.refresh_palette(self.core.theme());
        self.gradients.clear();
    }

    fn on_dispose(&mut self) {
        self.gradients.clear();
        self.buckets.clear();
        self.state.clock.reset();
    }
}
