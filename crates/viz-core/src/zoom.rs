//! Viewport zoom/pan state machine.
//!
//! Independent of which renderer is active: the [`RendererFactory`] moves
//! the same `ZoomManager` from one renderer to the next so the view survives
//! a mode switch.
//!
//! The transform maps canvas space to screen space as
//! `screen = (canvas - center) * level + center + pan`; [`screen_to_canvas`]
//! is its exact inverse.
//!
//! Eased transitions are driven by an injected [`AnimationScheduler`]: the
//! manager requests a frame, the host calls [`on_animation_frame`] when it
//! fires, and the manager re-requests until the transition completes.
//!
//! [`RendererFactory`]: crate::factory::RendererFactory
//! [`screen_to_canvas`]: ZoomManager::screen_to_canvas
//! [`on_animation_frame`]: ZoomManager::on_animation_frame

use crate::canvas::DrawContext;
use crate::constants::*;
use glam::DVec2;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ZoomConfig {
    pub min_zoom: f64,
    pub max_zoom: f64,
    pub zoom_step: f64,
    pub smooth_transition: bool,
    pub transition_duration_ms: f64,
}

impl Default for ZoomConfig {
    fn default() -> Self {
        Self {
            min_zoom: DEFAULT_MIN_ZOOM,
            max_zoom: DEFAULT_MAX_ZOOM,
            zoom_step: DEFAULT_ZOOM_STEP,
            smooth_transition: true,
            transition_duration_ms: DEFAULT_TRANSITION_MS,
        }
    }
}

impl ZoomConfig {
    pub fn normalized(&self) -> Self {
        let pos = |v: f64, fallback: f64| if v.is_finite() && v > 0.0 { v } else { fallback };
        let mut min_zoom = pos(self.min_zoom, DEFAULT_MIN_ZOOM);
        let mut max_zoom = pos(self.max_zoom, DEFAULT_MAX_ZOOM);
        if min_zoom > max_zoom {
            std::mem::swap(&mut min_zoom, &mut max_zoom);
        }
        Self {
            min_zoom,
            max_zoom,
            zoom_step: pos(self.zoom_step, DEFAULT_ZOOM_STEP),
            smooth_transition: self.smooth_transition,
            transition_duration_ms: if self.transition_duration_ms.is_finite() {
                self.transition_duration_ms.max(0.0)
            } else {
                DEFAULT_TRANSITION_MS
            },
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoomState {
    pub level: f64,
    pub pan_x: f64,
    pub pan_y: f64,
    pub is_dragging: bool,
}

impl Default for ZoomState {
    fn default() -> Self {
        Self {
            level: 1.0,
            pan_x: 0.0,
            pan_y: 0.0,
            is_dragging: false,
        }
    }
}

impl ZoomState {
    #[inline]
    pub fn pan(&self) -> DVec2 {
        DVec2::new(self.pan_x, self.pan_y)
    }
}

/// Size of the bound canvas in CSS pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CanvasRect {
    pub width: f64,
    pub height: f64,
}

impl CanvasRect {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn center(&self) -> DVec2 {
        DVec2::new(self.width / 2.0, self.height / 2.0)
    }
}

/// Visible canvas-space rectangle.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ViewportBounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Partial target of a transition; only present fields are interpolated.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ZoomTarget {
    pub level: Option<f64>,
    pub pan_x: Option<f64>,
    pub pan_y: Option<f64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FrameHandle(pub u64);

/// Source of animation-frame callbacks (`requestAnimationFrame` on the web).
pub trait AnimationScheduler {
    /// Ask for one callback to [`ZoomManager::on_animation_frame`].
    fn request_frame(&mut self) -> FrameHandle;
    fn cancel_frame(&mut self, handle: FrameHandle);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ZoomEventKind {
    Zoom,
    Pan,
    DragStart,
    DragEnd,
}

/// Serializes as `{"type": "zoom", "level": .., "panX": .., "panY": ..}`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ZoomEvent {
    #[serde(rename_all = "camelCase")]
    Zoom { level: f64, pan_x: f64, pan_y: f64 },
    #[serde(rename_all = "camelCase")]
    Pan { pan_x: f64, pan_y: f64 },
    DragStart { x: f64, y: f64 },
    DragEnd,
}

impl ZoomEvent {
    pub fn kind(&self) -> ZoomEventKind {
        match self {
            ZoomEvent::Zoom { .. } => ZoomEventKind::Zoom,
            ZoomEvent::Pan { .. } => ZoomEventKind::Pan,
            ZoomEvent::DragStart { .. } => ZoomEventKind::DragStart,
            ZoomEvent::DragEnd => ZoomEventKind::DragEnd,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Box<dyn FnMut(&ZoomEvent)>;

#[derive(Clone, Copy, Debug)]
struct Transition {
    from: ZoomState,
    target: ZoomTarget,
    started_ms: Option<f64>,
    duration_ms: f64,
}

#[inline]
pub fn ease_out_cubic(p: f64) -> f64 {
    let p = p.clamp(0.0, 1.0);
    1.0 - (1.0 - p).powi(3)
}

pub struct ZoomManager {
    config: ZoomConfig,
    state: ZoomState,
    canvas: Option<CanvasRect>,
    transition: Option<Transition>,
    pending_frame: Option<FrameHandle>,
    scheduler: Option<Box<dyn AnimationScheduler>>,
    listeners: Vec<(ListenerId, ZoomEventKind, Listener)>,
    next_listener: u64,
    drag_last: Option<DVec2>,
    disposed: bool,
}

impl Default for ZoomManager {
    fn default() -> Self {
        Self::new(ZoomConfig::default())
    }
}

impl std::fmt::Debug for ZoomManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZoomManager")
            .field("config", &self.config)
            .field("state", &self.state)
            .field("canvas", &self.canvas)
            .field("transitioning", &self.transition.is_some())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl ZoomManager {
    pub fn new(config: ZoomConfig) -> Self {
        Self {
            config: config.normalized(),
            state: ZoomState::default(),
            canvas: None,
            transition: None,
            pending_frame: None,
            scheduler: None,
            listeners: Vec::new(),
            next_listener: 0,
            drag_last: None,
            disposed: false,
        }
    }

    pub fn with_scheduler(mut self, scheduler: Box<dyn AnimationScheduler>) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    pub fn set_scheduler(&mut self, scheduler: Box<dyn AnimationScheduler>) {
        self.cancel_transition();
        self.scheduler = Some(scheduler);
    }

    pub fn config(&self) -> &ZoomConfig {
        &self.config
    }

    /// Replace the config wholesale; the current level is re-clamped.
    pub fn set_config(&mut self, config: ZoomConfig) {
        self.config = config.normalized();
        let clamped = self.clamp_level(self.state.level);
        if clamped != self.state.level {
            self.state.level = clamped;
            self.emit_zoom();
        }
    }

    pub fn state(&self) -> ZoomState {
        self.state
    }

    pub fn level(&self) -> f64 {
        self.state.level
    }

    pub fn is_bound(&self) -> bool {
        self.canvas.is_some()
    }

    pub fn is_transitioning(&self) -> bool {
        self.transition.is_some()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn bind_canvas(&mut self, rect: CanvasRect) {
        if self.disposed {
            return;
        }
        self.canvas = Some(rect);
    }

    pub fn unbind_canvas(&mut self) {
        self.cancel_transition();
        self.canvas = None;
    }

    #[inline]
    fn clamp_level(&self, level: f64) -> f64 {
        let level = if level.is_finite() { level } else { 1.0 };
        level.clamp(self.config.min_zoom, self.config.max_zoom)
    }

    fn bound(&self, op: &str) -> Option<CanvasRect> {
        if self.canvas.is_none() {
            log::debug!("[zoom] {} ignored: no canvas bound", op);
        }
        self.canvas
    }

    /// Zoom to `level` (clamped). With `center` (screen point) the canvas
    /// point under it stays fixed. `smooth` defaults to the config.
    pub fn set_zoom(&mut self, level: f64, center: Option<DVec2>, smooth: Option<bool>) {
        let Some(rect) = self.bound("set_zoom") else {
            return;
        };
        let new_level = self.clamp_level(level);
        let old_level = self.state.level;
        let mut target = ZoomTarget {
            level: Some(new_level),
            ..ZoomTarget::default()
        };
        if let Some(point) = center {
            let p = point - rect.center();
            let pan = p - (p - self.state.pan()) * (new_level / old_level);
            target.pan_x = Some(pan.x);
            target.pan_y = Some(pan.y);
        }
        self.transition_to(target, smooth);
    }

    pub fn zoom_in(&mut self, center: Option<DVec2>) {
        let level = self.state.level + self.config.zoom_step;
        self.set_zoom(level, center, None);
    }

    pub fn zoom_out(&mut self, center: Option<DVec2>) {
        let level = self.state.level - self.config.zoom_step;
        self.set_zoom(level, center, None);
    }

    /// Animate back to level 1 with no pan.
    pub fn reset_zoom(&mut self, smooth: Option<bool>) {
        if self.bound("reset_zoom").is_none() {
            return;
        }
        let target = ZoomTarget {
            level: Some(1.0),
            pan_x: Some(0.0),
            pan_y: Some(0.0),
        };
        self.transition_to(target, smooth);
    }

    pub fn set_pan(&mut self, x: f64, y: f64) {
        if self.bound("set_pan").is_none() || !x.is_finite() || !y.is_finite() {
            return;
        }
        self.state.pan_x = x;
        self.state.pan_y = y;
        self.emit(ZoomEvent::Pan { pan_x: x, pan_y: y });
    }

    /// Add a drag delta to the pan offset.
    pub fn adjust_pan(&mut self, dx: f64, dy: f64) {
        let (x, y) = (self.state.pan_x + dx, self.state.pan_y + dy);
        self.set_pan(x, y);
    }

    pub fn start_drag(&mut self, x: f64, y: f64) {
        if self.bound("start_drag").is_none() || self.state.is_dragging {
            return;
        }
        self.state.is_dragging = true;
        self.drag_last = Some(DVec2::new(x, y));
        self.emit(ZoomEvent::DragStart { x, y });
    }

    pub fn end_drag(&mut self) {
        if !self.state.is_dragging {
            return;
        }
        self.state.is_dragging = false;
        self.drag_last = None;
        self.emit(ZoomEvent::DragEnd);
    }

    fn transition_to(&mut self, target: ZoomTarget, smooth: Option<bool>) {
        self.cancel_transition();
        let smooth = smooth.unwrap_or(self.config.smooth_transition)
            && self.config.transition_duration_ms > 0.0;
        match (smooth, self.scheduler.as_mut()) {
            (true, Some(scheduler)) => {
                self.pending_frame = Some(scheduler.request_frame());
                self.transition = Some(Transition {
                    from: self.state,
                    target,
                    started_ms: None,
                    duration_ms: self.config.transition_duration_ms,
                });
            }
            _ => {
                self.apply_target(&target, 1.0, self.state);
                self.emit_zoom();
            }
        }
    }

    fn cancel_transition(&mut self) {
        if let Some(handle) = self.pending_frame.take() {
            if let Some(scheduler) = self.scheduler.as_mut() {
                scheduler.cancel_frame(handle);
            }
        }
        self.transition = None;
    }

    fn apply_target(&mut self, target: &ZoomTarget, eased: f64, from: ZoomState) {
        let lerp = |a: f64, b: f64| a + (b - a) * eased;
        if let Some(level) = target.level {
            self.state.level = lerp(from.level, level);
        }
        if let Some(x) = target.pan_x {
            self.state.pan_x = lerp(from.pan_x, x);
        }
        if let Some(y) = target.pan_y {
            self.state.pan_y = lerp(from.pan_y, y);
        }
    }

    /// Advance the in-flight transition; called by the scheduler's frame.
    pub fn on_animation_frame(&mut self, timestamp_ms: f64) {
        self.pending_frame = None;
        let Some(mut transition) = self.transition.take() else {
            return;
        };
        let started = *transition.started_ms.get_or_insert(timestamp_ms);
        let progress = if transition.duration_ms > 0.0 {
            ((timestamp_ms - started) / transition.duration_ms).clamp(0.0, 1.0)
        } else {
            1.0
        };
        self.apply_target(&transition.target, ease_out_cubic(progress), transition.from);
        self.emit_zoom();

        if progress < 1.0 {
            if let Some(scheduler) = self.scheduler.as_mut() {
                self.pending_frame = Some(scheduler.request_frame());
                self.transition = Some(transition);
            } else {
                self.apply_target(&transition.target, 1.0, transition.from);
                self.emit_zoom();
            }
        }
    }

    /// Apply the viewport transform to a context (canvas → screen).
    pub fn apply_transform<C: DrawContext>(&self, ctx: &mut C) {
        let Some(rect) = self.canvas else {
            return;
        };
        let c = rect.center();
        ctx.translate(c.x + self.state.pan_x, c.y + self.state.pan_y);
        ctx.scale(self.state.level, self.state.level);
        ctx.translate(-c.x, -c.y);
    }

    pub fn canvas_to_screen(&self, point: DVec2) -> DVec2 {
        let Some(rect) = self.canvas else {
            return point;
        };
        let c = rect.center();
        (point - c) * self.state.level + c + self.state.pan()
    }

    pub fn screen_to_canvas(&self, point: DVec2) -> DVec2 {
        let Some(rect) = self.canvas else {
            return point;
        };
        let c = rect.center();
        (point - c - self.state.pan()) / self.state.level + c
    }

    /// Canvas-space rectangle currently visible.
    pub fn viewport_bounds(&self) -> Option<ViewportBounds> {
        let rect = self.canvas?;
        let top_left = self.screen_to_canvas(DVec2::ZERO);
        let bottom_right = self.screen_to_canvas(DVec2::new(rect.width, rect.height));
        Some(ViewportBounds {
            x: top_left.x,
            y: top_left.y,
            width: bottom_right.x - top_left.x,
            height: bottom_right.y - top_left.y,
        })
    }

    pub fn subscribe(
        &mut self,
        kind: ZoomEventKind,
        callback: impl FnMut(&ZoomEvent) + 'static,
    ) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, kind, Box::new(callback)));
        id
    }

    /// Returns whether a listener was removed.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _, _)| *lid != id);
        self.listeners.len() != before
    }

    fn emit_zoom(&mut self) {
        let s = self.state;
        self.emit(ZoomEvent::Zoom {
            level: s.level,
            pan_x: s.pan_x,
            pan_y: s.pan_y,
        });
    }

    fn emit(&mut self, event: ZoomEvent) {
        let kind = event.kind();
        for (_, k, cb) in self.listeners.iter_mut() {
            if *k == kind {
                cb(&event);
            }
        }
    }

    // ---------------- Default input bindings ----------------

    /// Wheel zoom centered at the cursor (screen coordinates).
    pub fn handle_wheel(&mut self, delta_y: f64, x: f64, y: f64) {
        if delta_y == 0.0 || !delta_y.is_finite() {
            return;
        }
        let steps = (delta_y.abs() / WHEEL_DELTA_PER_STEP).clamp(0.1, 3.0);
        let delta = steps * self.config.zoom_step;
        let level = if delta_y < 0.0 {
            self.state.level + delta
        } else {
            self.state.level - delta
        };
        self.set_zoom(level, Some(DVec2::new(x, y)), None);
    }

    /// Begin a pan drag; only when zoomed in.
    pub fn handle_pointer_down(&mut self, x: f64, y: f64) {
        if self.state.level > 1.0 {
            self.start_drag(x, y);
        }
    }

    pub fn handle_pointer_move(&mut self, x: f64, y: f64) {
        if !self.state.is_dragging {
            return;
        }
        let now = DVec2::new(x, y);
        let last = self.drag_last.unwrap_or(now);
        self.drag_last = Some(now);
        let d = now - last;
        if d != DVec2::ZERO {
            self.adjust_pan(d.x, d.y);
        }
    }

    pub fn handle_pointer_up(&mut self) {
        self.end_drag();
    }

    /// Reset when zoomed, otherwise zoom to 2x at the cursor.
    pub fn handle_double_click(&mut self, x: f64, y: f64) {
        if self.state.level > 1.0 || self.state.pan() != DVec2::ZERO {
            self.reset_zoom(None);
        } else {
            self.set_zoom(DOUBLE_CLICK_ZOOM, Some(DVec2::new(x, y)), None);
        }
    }

    /// Cancel pending frames and drop listeners. Idempotent.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.cancel_transition();
        self.listeners.clear();
        self.canvas = None;
        self.state.is_dragging = false;
        self.drag_last = None;
        self.disposed = true;
        log::debug!("[zoom] disposed");
    }
}

impl Drop for ZoomManager {
    fn drop(&mut self) {
        self.cancel_transition();
    }
}
