//! Renderer contract and the shared lifecycle/budget core.
//!
//! Concrete renderers hold a [`RenderCore`] by composition and implement the
//! [`Renderer`] trait. The trait's provided methods run the shared lifecycle
//! (context acquisition, resize, theme) and then call the renderer's hooks.

pub mod bars;
pub mod mandala;

use crate::canvas::{CanvasHost, CompositeOp, DrawContext, Paint};
use crate::config::{Theme, VisualizationConfig, VisualizationMode};
use crate::constants::*;
use crate::error::RenderError;
use crate::zoom::{CanvasRect, ZoomManager};
use instant::Instant;
use serde::Serialize;
use std::collections::VecDeque;

pub use bars::{BarLayout, BarRenderer, BarSlot};
pub use mandala::{MandalaRenderer, MandalaSegment, OptimizedMandalaRenderer};

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceStats {
    pub last_frame_time_ms: f64,
    pub render_budget_ms: f64,
    #[serde(rename = "averageFPS")]
    pub average_fps: f64,
    pub is_performant: bool,
}

impl Default for PerformanceStats {
    fn default() -> Self {
        Self {
            last_frame_time_ms: 0.0,
            render_budget_ms: DEFAULT_RENDER_BUDGET_MS,
            average_fps: ASSUMED_FPS,
            is_performant: true,
        }
    }
}

/// Frame-budget gate and FPS history.
///
/// A frame that runs over budget causes exactly the next frame to be
/// dropped; the frame after that draws again regardless.
#[derive(Debug)]
pub struct FrameBudget {
    budget_ms: f64,
    last_frame_ms: f64,
    skip_next: bool,
    skipped_frames: u64,
    frames_since_sample: u32,
    sample_started: Option<Instant>,
    fps_history: VecDeque<f64>,
}

impl Default for FrameBudget {
    fn default() -> Self {
        Self::new(DEFAULT_RENDER_BUDGET_MS)
    }
}

impl FrameBudget {
    pub fn new(budget_ms: f64) -> Self {
        let budget_ms = if budget_ms.is_finite() && budget_ms > 0.0 {
            budget_ms
        } else {
            DEFAULT_RENDER_BUDGET_MS
        };
        Self {
            budget_ms,
            last_frame_ms: 0.0,
            skip_next: false,
            skipped_frames: 0,
            frames_since_sample: 0,
            sample_started: None,
            fps_history: VecDeque::with_capacity(FPS_HISTORY_LEN),
        }
    }

    pub fn budget_ms(&self) -> f64 {
        self.budget_ms
    }

    pub fn last_frame_ms(&self) -> f64 {
        self.last_frame_ms
    }

    pub fn skipped_frames(&self) -> u64 {
        self.skipped_frames
    }

    /// Whether this frame must be dropped. Consumes the pending skip.
    pub fn should_skip(&mut self) -> bool {
        if self.skip_next {
            self.skip_next = false;
            self.skipped_frames += 1;
            return true;
        }
        false
    }

    /// Record a drawn frame's duration.
    pub fn record(&mut self, elapsed_ms: f64) {
        self.last_frame_ms = elapsed_ms;
        self.skip_next = elapsed_ms > self.budget_ms;

        let now = Instant::now();
        let started = *self.sample_started.get_or_insert(now);
        self.frames_since_sample += 1;
        if self.frames_since_sample >= FPS_SAMPLE_INTERVAL_FRAMES {
            let secs = now.duration_since(started).as_secs_f64();
            if secs > 0.0 {
                self.push_fps_sample(self.frames_since_sample as f64 / secs);
            }
            self.frames_since_sample = 0;
            self.sample_started = Some(now);
        }
    }

    fn push_fps_sample(&mut self, fps: f64) {
        if self.fps_history.len() == FPS_HISTORY_LEN {
            self.fps_history.pop_front();
        }
        self.fps_history.push_back(fps);
    }

    /// Run `draw` unless the frame is dropped; returns whether it ran.
    pub fn run<F: FnOnce()>(&mut self, draw: F) -> bool {
        if self.should_skip() {
            return false;
        }
        let start = Instant::now();
        draw();
        self.record(start.elapsed().as_secs_f64() * 1000.0);
        true
    }

    pub fn average_fps(&self) -> f64 {
        if self.fps_history.is_empty() {
            return ASSUMED_FPS;
        }
        self.fps_history.iter().sum::<f64>() / self.fps_history.len() as f64
    }

    pub fn stats(&self) -> PerformanceStats {
        let average_fps = self.average_fps();
        PerformanceStats {
            last_frame_time_ms: self.last_frame_ms,
            render_budget_ms: self.budget_ms,
            average_fps,
            is_performant: average_fps >= PERFORMANT_FPS && self.last_frame_ms <= self.budget_ms,
        }
    }

    pub fn clear(&mut self) {
        *self = Self::new(self.budget_ms);
    }
}

/// Geometry and theme of the frame being drawn, in CSS pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameInfo {
    pub width: f64,
    pub height: f64,
    pub center_x: f64,
    pub center_y: f64,
    pub dpr: f64,
    pub theme: Theme,
}

/// Lifecycle state every renderer shares: host, context, size, theme, frame
/// budget and the optional viewport transform.
pub struct RenderCore<H: CanvasHost> {
    host: Option<H>,
    ctx: Option<H::Context>,
    width: f64,
    height: f64,
    center_x: f64,
    center_y: f64,
    dpr: f64,
    theme: Theme,
    budget: FrameBudget,
    zoom: Option<ZoomManager>,
    disposed: bool,
}

impl<H: CanvasHost> RenderCore<H> {
    pub fn new(host: H, budget_ms: f64) -> Self {
        Self {
            host: Some(host),
            ctx: None,
            width: 0.0,
            height: 0.0,
            center_x: 0.0,
            center_y: 0.0,
            dpr: 1.0,
            theme: Theme::default(),
            budget: FrameBudget::new(budget_ms),
            zoom: None,
            disposed: false,
        }
    }

    /// Acquire the drawing context and size it to the device pixel ratio.
    pub fn initialize(&mut self) -> Result<(), RenderError> {
        if self.disposed {
            return Err(RenderError::Disposed);
        }
        let host = self.host.as_mut().ok_or(RenderError::Disposed)?;
        let ctx = host
            .acquire_context()
            .ok_or(RenderError::ContextUnavailable)?;
        self.ctx = Some(ctx);
        self.resize();
        Ok(())
    }

    /// Recompute backing-store size and center. Returns `false` when there
    /// is nothing to resize (inert or disposed).
    pub fn resize(&mut self) -> bool {
        let (Some(host), Some(ctx)) = (self.host.as_mut(), self.ctx.as_mut()) else {
            return false;
        };
        let (css_w, css_h) = host.css_size();
        let dpr = host.device_pixel_ratio();
        let dpr = if dpr.is_finite() && dpr > 0.0 { dpr } else { 1.0 };
        let css_w = if css_w.is_finite() { css_w.max(0.0) } else { 0.0 };
        let css_h = if css_h.is_finite() { css_h.max(0.0) } else { 0.0 };

        let backing_w = ((css_w * dpr).round() as u32).max(1);
        let backing_h = ((css_h * dpr).round() as u32).max(1);
        host.set_backing_size(backing_w, backing_h);

        self.width = css_w;
        self.height = css_h;
        self.center_x = css_w / 2.0;
        self.center_y = css_h / 2.0;
        self.dpr = dpr;
        // resizing the backing store resets context state
        ctx.set_transform(dpr, 0.0, 0.0, dpr, 0.0, 0.0);

        if let Some(zoom) = self.zoom.as_mut() {
            zoom.bind_canvas(CanvasRect::new(css_w, css_h));
        }
        log::debug!(
            "[renderer] resized to {}x{} css px ({}x{} device px)",
            css_w,
            css_h,
            backing_w,
            backing_h
        );
        true
    }

    /// Store the theme; returns whether it changed.
    pub fn set_theme(&mut self, theme: Theme) -> bool {
        if self.theme == theme {
            return false;
        }
        self.theme = theme;
        true
    }

    /// Frame template: budget gate, clear, viewport transform, `draw`,
    /// timing. Returns whether the frame was drawn.
    pub fn perform_render<F>(&mut self, draw: F) -> bool
    where
        F: FnOnce(&mut H::Context, &FrameInfo),
    {
        if self.ctx.is_none() {
            return false;
        }
        let frame = self.frame_info();
        let Self {
            ctx, zoom, budget, ..
        } = self;
        let Some(ctx) = ctx.as_mut() else {
            return false;
        };

        let drawn = budget.run(|| {
            ctx.set_transform(frame.dpr, 0.0, 0.0, frame.dpr, 0.0, 0.0);
            ctx.set_global_alpha(1.0);
            ctx.set_composite_operation(CompositeOp::SourceOver);
            ctx.set_fill_style(&Paint::Solid(frame.theme.background()));
            ctx.fill_rect(0.0, 0.0, frame.width, frame.height);

            ctx.save();
            if let Some(zoom) = zoom.as_ref() {
                zoom.apply_transform(ctx);
            }
            draw(ctx, &frame);
            ctx.restore();
        });
        if !drawn {
            log::trace!("[renderer] dropping frame after overrun");
        }
        drawn
    }

    pub fn frame_info(&self) -> FrameInfo {
        FrameInfo {
            width: self.width,
            height: self.height,
            center_x: self.center_x,
            center_y: self.center_y,
            dpr: self.dpr,
            theme: self.theme,
        }
    }

    #[inline]
    pub fn is_ready(&self) -> bool {
        self.ctx.is_some()
    }

    #[inline]
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn center(&self) -> (f64, f64) {
        (self.center_x, self.center_y)
    }

    pub fn dpr(&self) -> f64 {
        self.dpr
    }

    pub fn budget(&self) -> &FrameBudget {
        &self.budget
    }

    pub fn host_mut(&mut self) -> Option<&mut H> {
        self.host.as_mut()
    }

    pub fn performance_stats(&self) -> PerformanceStats {
        self.budget.stats()
    }

    /// Attach a viewport transform, binding it to the current canvas size.
    pub fn attach_zoom(&mut self, mut zoom: ZoomManager) {
        if self.is_ready() {
            zoom.bind_canvas(CanvasRect::new(self.width, self.height));
        }
        self.zoom = Some(zoom);
    }

    pub fn take_zoom(&mut self) -> Option<ZoomManager> {
        self.zoom.take()
    }

    pub fn zoom(&self) -> Option<&ZoomManager> {
        self.zoom.as_ref()
    }

    pub fn zoom_mut(&mut self) -> Option<&mut ZoomManager> {
        self.zoom.as_mut()
    }

    /// Release context and host, clear history, dispose an attached zoom.
    /// Safe to call repeatedly.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        self.ctx = None;
        self.host = None;
        self.budget.clear();
        if let Some(mut zoom) = self.zoom.take() {
            zoom.dispose();
        }
    }
}

/// Public contract of a concrete renderer.
///
/// Implementors provide the core accessors, `render` and the configuration
/// entry points; lifecycle methods are provided and call the `on_*` hooks.
pub trait Renderer {
    type Host: CanvasHost;

    fn core(&self) -> &RenderCore<Self::Host>;
    fn core_mut(&mut self) -> &mut RenderCore<Self::Host>;

    fn mode(&self) -> VisualizationMode;

    /// Draw one frame from `frequency_data` (one byte per bin).
    fn render(&mut self, frequency_data: &[u8]);

    fn update_configuration(&mut self, config: &VisualizationConfig);

    fn update_frequency_bin_count(&mut self, count: usize);

    fn on_resize(&mut self) {}
    fn on_theme_change(&mut self) {}
    fn on_dispose(&mut self) {}

    /// Acquire the context. `false` leaves the renderer inert.
    fn initialize(&mut self) -> bool {
        match self.core_mut().initialize() {
            Ok(()) => {
                self.on_resize();
                true
            }
            Err(e) => {
                log::warn!("[renderer] {:?} initialization failed: {}", self.mode(), e);
                false
            }
        }
    }

    fn resize(&mut self) {
        if self.core_mut().resize() {
            self.on_resize();
        }
    }

    fn set_theme(&mut self, theme: Theme) {
        if self.core_mut().set_theme(theme) {
            self.on_theme_change();
        }
    }

    fn performance_stats(&self) -> PerformanceStats {
        self.core().performance_stats()
    }

    fn attach_zoom_manager(&mut self, zoom: ZoomManager) {
        self.core_mut().attach_zoom(zoom);
    }

    fn take_zoom_manager(&mut self) -> Option<ZoomManager> {
        self.core_mut().take_zoom()
    }

    fn dispose(&mut self) {
        if self.core().is_disposed() {
            return;
        }
        self.on_dispose();
        self.core_mut().dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrun_drops_exactly_one_frame() {
        let mut budget = FrameBudget::new(12.0);
        budget.record(20.0);
        assert!(budget.should_skip());
        assert!(!budget.should_skip());
        assert_eq!(budget.skipped_frames(), 1);
    }

    #[test]
    fn run_skips_the_closure_after_an_overrun() {
        let mut budget = FrameBudget::new(12.0);
        budget.record(20.0);
        let mut calls = 0;
        assert!(!budget.run(|| calls += 1));
        assert!(budget.run(|| calls += 1));
        assert_eq!(calls, 1);
    }

    #[test]
    fn stats_reflect_history() {
        let mut budget = FrameBudget::new(12.0);
        assert_eq!(budget.stats(), PerformanceStats::default());

        budget.push_fps_sample(30.0);
        budget.push_fps_sample(40.0);
        let stats = budget.stats();
        assert_eq!(stats.average_fps, 35.0);
        assert!(!stats.is_performant);
    }

    #[test]
    fn history_keeps_last_ten_samples() {
        let mut budget = FrameBudget::new(12.0);
        for i in 0..15 {
            budget.push_fps_sample(i as f64);
        }
        assert_eq!(budget.fps_history.len(), FPS_HISTORY_LEN);
        assert_eq!(budget.fps_history.front(), Some(&5.0));
    }

    #[test]
    fn slow_frame_is_not_performant() {
        let mut budget = FrameBudget::new(12.0);
        budget.record(13.0);
        assert!(!budget.stats().is_performant);
        budget.should_skip();
        budget.record(4.0);
        assert!(budget.stats().is_performant);
    }

    #[test]
    fn invalid_budget_falls_back_to_default() {
        assert_eq!(FrameBudget::new(-1.0).budget_ms(), DEFAULT_RENDER_BUDGET_MS);
        assert_eq!(FrameBudget::new(f64::NAN).budget_ms(), DEFAULT_RENDER_BUDGET_MS);
    }
}
