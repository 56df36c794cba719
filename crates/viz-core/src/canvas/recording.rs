//! Headless backend that records draw calls instead of rasterizing them.
//!
//! Used by the host-side test suites and by tooling that wants to inspect
//! what a renderer would draw. A [`RecordingHost`] is cheap to clone; clones
//! share state so a test can keep a handle while a renderer owns another.

use super::{CanvasHost, CompositeOp, DrawContext, Paint, Rgba};
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    Save,
    Restore,
    SetTransform([f64; 6]),
    Translate(f64, f64),
    Rotate(f64),
    Scale(f64, f64),
    ClearRect { x: f64, y: f64, w: f64, h: f64 },
    FillRect { x: f64, y: f64, w: f64, h: f64 },
    BeginPath,
    MoveTo(f64, f64),
    LineTo(f64, f64),
    QuadraticCurveTo { cpx: f64, cpy: f64, x: f64, y: f64 },
    Arc {
        x: f64,
        y: f64,
        radius: f64,
        start: f64,
        end: f64,
        anticlockwise: bool,
    },
    Rect { x: f64, y: f64, w: f64, h: f64 },
    ClosePath,
    Fill,
    Stroke,
    Clip,
    FillStyle(Paint),
    StrokeStyle(Paint),
    LineWidth(f64),
    GlobalAlpha(f64),
    Composite(CompositeOp),
    ShadowBlur(f64),
    ShadowColor(Rgba),
    DrawLayer {
        source: usize,
        x: f64,
        y: f64,
        w: f64,
        h: f64,
    },
}

type CommandLog = Rc<RefCell<Vec<DrawCommand>>>;

/// Context recording into a shared log.
#[derive(Clone, Debug)]
pub struct RecordingContext {
    id: usize,
    log: CommandLog,
}

impl RecordingContext {
    pub fn id(&self) -> usize {
        self.id
    }

    pub fn commands(&self) -> Vec<DrawCommand> {
        self.log.borrow().clone()
    }

    pub fn clear(&self) {
        self.log.borrow_mut().clear();
    }

    #[inline]
    fn push(&mut self, cmd: DrawCommand) {
        self.log.borrow_mut().push(cmd);
    }
}

impl DrawContext for RecordingContext {
    fn save(&mut self) {
        self.push(DrawCommand::Save);
    }
    fn restore(&mut self) {
        self.push(DrawCommand::Restore);
    }
    fn set_transform(&mut self, a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) {
        self.push(DrawCommand::SetTransform([a, b, c, d, e, f]));
    }
    fn translate(&mut self, x: f64, y: f64) {
        self.push(DrawCommand::Translate(x, y));
    }
    fn rotate(&mut self, angle: f64) {
        self.push(DrawCommand::Rotate(angle));
    }
    fn scale(&mut self, x: f64, y: f64) {
        self.push(DrawCommand::Scale(x, y));
    }
    fn clear_rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
        self.push(DrawCommand::ClearRect { x, y, w, h });
    }
    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
        self.push(DrawCommand::FillRect { x, y, w, h });
    }
    fn begin_path(&mut self) {
        self.push(DrawCommand::BeginPath);
    }
    fn move_to(&mut self, x: f64, y: f64) {
        self.push(DrawCommand::MoveTo(x, y));
    }
    fn line_to(&mut self, x: f64, y: f64) {
        self.push(DrawCommand::LineTo(x, y));
    }
    fn quadratic_curve_to(&mut self, cpx: f64, cpy: f64, x: f64, y: f64) {
        self.push(DrawCommand::QuadraticCurveTo { cpx, cpy, x, y });
    }
    fn arc(&mut self, x: f64, y: f64, radius: f64, start: f64, end: f64, anticlockwise: bool) {
        self.push(DrawCommand::Arc {
            x,
            y,
            radius,
            start,
            end,
            anticlockwise,
        });
    }
    fn rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
        self.push(DrawCommand::Rect { x, y, w, h });
    }
    fn close_path(&mut self) {
        self.push(DrawCommand::ClosePath);
    }
    fn fill(&mut self) {
        self.push(DrawCommand::Fill);
    }
    fn stroke(&mut self) {
        self.push(DrawCommand::Stroke);
    }
    fn clip(&mut self) {
        self.push(DrawCommand::Clip);
    }
    fn set_fill_style(&mut self, paint: &Paint) {
        self.push(DrawCommand::FillStyle(paint.clone()));
    }
    fn set_stroke_style(&mut self, paint: &Paint) {
        self.push(DrawCommand::StrokeStyle(paint.clone()));
    }
    fn set_line_width(&mut self, width: f64) {
        self.push(DrawCommand::LineWidth(width));
    }
    fn set_global_alpha(&mut self, alpha: f64) {
        self.push(DrawCommand::GlobalAlpha(alpha));
    }
    fn set_composite_operation(&mut self, op: CompositeOp) {
        self.push(DrawCommand::Composite(op));
    }
    fn set_shadow_blur(&mut self, blur: f64) {
        self.push(DrawCommand::ShadowBlur(blur));
    }
    fn set_shadow_color(&mut self, color: Rgba) {
        self.push(DrawCommand::ShadowColor(color));
    }
    fn draw_context(&mut self, source: &Self, dx: f64, dy: f64, dw: f64, dh: f64) {
        self.push(DrawCommand::DrawLayer {
            source: source.id,
            x: dx,
            y: dy,
            w: dw,
            h: dh,
        });
    }
}

#[derive(Debug)]
struct HostState {
    css_width: f64,
    css_height: f64,
    dpr: f64,
    backing: (u32, u32),
    allow_context: bool,
    allow_offscreen: bool,
    next_id: usize,
    onscreen: Vec<RecordingContext>,
    offscreen: Vec<RecordingContext>,
}

/// Host handing out [`RecordingContext`]s.
#[derive(Clone, Debug)]
pub struct RecordingHost {
    state: Rc<RefCell<HostState>>,
}

impl RecordingHost {
    pub fn new(css_width: f64, css_height: f64, dpr: f64) -> Self {
        Self {
            state: Rc::new(RefCell::new(HostState {
                css_width,
                css_height,
                dpr,
                backing: (0, 0),
                allow_context: true,
                allow_offscreen: true,
                next_id: 0,
                onscreen: Vec::new(),
                offscreen: Vec::new(),
            })),
        }
    }

    /// Simulate the element's CSS box changing.
    pub fn set_css_size(&self, width: f64, height: f64) {
        let mut s = self.state.borrow_mut();
        s.css_width = width;
        s.css_height = height;
    }

    pub fn set_device_pixel_ratio(&self, dpr: f64) {
        self.state.borrow_mut().dpr = dpr;
    }

    /// Make every later context request fail.
    pub fn deny_context(&self) {
        self.state.borrow_mut().allow_context = false;
    }

    /// Undo [`deny_context`](Self::deny_context).
    pub fn allow_context(&self) {
        self.state.borrow_mut().allow_context = true;
    }

    /// Make every later off-screen request fail.
    pub fn deny_offscreen(&self) {
        self.state.borrow_mut().allow_offscreen = false;
    }

    pub fn backing_size(&self) -> (u32, u32) {
        self.state.borrow().backing
    }

    pub fn onscreen_count(&self) -> usize {
        self.state.borrow().onscreen.len()
    }

    pub fn offscreen_count(&self) -> usize {
        self.state.borrow().offscreen.len()
    }

    /// Commands of the most recently acquired on-screen context.
    pub fn commands(&self) -> Vec<DrawCommand> {
        self.state
            .borrow()
            .onscreen
            .last()
            .map(|c| c.commands())
            .unwrap_or_default()
    }

    /// Commands of the most recently created off-screen buffer.
    pub fn offscreen_commands(&self) -> Vec<DrawCommand> {
        self.state
            .borrow()
            .offscreen
            .last()
            .map(|c| c.commands())
            .unwrap_or_default()
    }

    /// Forget everything recorded so far, keeping the contexts alive.
    pub fn clear_commands(&self) {
        let s = self.state.borrow();
        for c in s.onscreen.iter().chain(s.offscreen.iter()) {
            c.clear();
        }
    }

    fn new_context(s: &mut HostState) -> RecordingContext {
        let id = s.next_id;
        s.next_id += 1;
        RecordingContext {
            id,
            log: Rc::new(RefCell::new(Vec::new())),
        }
    }
}

impl CanvasHost for RecordingHost {
    type Context = RecordingContext;

    fn css_size(&self) -> (f64, f64) {
        let s = self.state.borrow();
        (s.css_width, s.css_height)
    }

    fn device_pixel_ratio(&self) -> f64 {
        self.state.borrow().dpr
    }

    fn set_backing_size(&mut self, width: u32, height: u32) {
        self.state.borrow_mut().backing = (width, height);
    }

    fn acquire_context(&mut self) -> Option<RecordingContext> {
        let mut s = self.state.borrow_mut();
        if !s.allow_context {
            return None;
        }
        let ctx = Self::new_context(&mut s);
        s.onscreen.push(ctx.clone());
        Some(ctx)
    }

    fn create_offscreen(&mut self, width: u32, height: u32) -> Option<RecordingContext> {
        let mut s = self.state.borrow_mut();
        if !s.allow_offscreen || width == 0 || height == 0 {
            return None;
        }
        let ctx = Self::new_context(&mut s);
        s.offscreen.push(ctx.clone());
        Some(ctx)
    }
}

/// Filled rectangles in a command list, as `(x, y, w, h)`.
pub fn filled_rects(commands: &[DrawCommand]) -> Vec<(f64, f64, f64, f64)> {
    commands
        .iter()
        .filter_map(|c| match c {
            DrawCommand::FillRect { x, y, w, h } => Some((*x, *y, *w, *h)),
            _ => None,
        })
        .collect()
}

/// Number of times `pred` matches in a command list.
pub fn count_commands(commands: &[DrawCommand], pred: impl Fn(&DrawCommand) -> bool) -> usize {
    commands.iter().filter(|c| pred(c)).count()
}
