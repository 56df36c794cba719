//! `CanvasRenderingContext2d` backend for the engine's drawing traits.

use crate::dom;
use viz_core::canvas::cache::GradientCache;
use viz_core::canvas::{CanvasHost, ColorStops, CompositeOp, DrawContext, Paint, Rgba};
use web_sys as web;

/// The visible canvas element.
#[derive(Clone)]
pub struct WebCanvas {
    canvas: web::HtmlCanvasElement,
}

impl WebCanvas {
    pub fn new(canvas: web::HtmlCanvasElement) -> Self {
        Self { canvas }
    }

    pub fn element(&self) -> &web::HtmlCanvasElement {
        &self.canvas
    }
}

impl CanvasHost for WebCanvas {
    type Context = WebContext;

    fn css_size(&self) -> (f64, f64) {
        let rect = self.canvas.get_bounding_client_rect();
        (rect.width(), rect.height())
    }

    fn device_pixel_ratio(&self) -> f64 {
        dom::device_pixel_ratio()
    }

    fn set_backing_size(&mut self, width: u32, height: u32) {
        self.canvas.set_width(width);
        self.canvas.set_height(height);
    }

    fn acquire_context(&mut self) -> Option<WebContext> {
        match dom::context_2d(&self.canvas, true) {
            Ok(ctx) => Some(WebContext::new(ctx, self.canvas.clone())),
            Err(e) => {
                log::warn!("[canvas] {}", e);
                None
            }
        }
    }

    fn create_offscreen(&mut self, width: u32, height: u32) -> Option<WebContext> {
        let canvas = dom::create_canvas(width, height)
            .and_then(|c| dom::context_2d(&c, false).map(|ctx| (c, ctx)));
        match canvas {
            Ok((canvas, ctx)) => Some(WebContext::new(ctx, canvas)),
            Err(e) => {
                log::warn!("[canvas] off-screen buffer: {}", e);
                None
            }
        }
    }
}

/// A 2D context together with the canvas it draws into, so it can be used
/// as an image source. Native gradients are built once per distinct paint.
pub struct WebContext {
    ctx: web::CanvasRenderingContext2d,
    canvas: web::HtmlCanvasElement,
    gradients: GradientCache<web::CanvasGradient>,
}

impl WebContext {
    fn new(ctx: web::CanvasRenderingContext2d, canvas: web::HtmlCanvasElement) -> Self {
        Self {
            ctx,
            canvas,
            gradients: GradientCache::new(),
        }
    }

    fn add_stops(gradient: &web::CanvasGradient, stops: &ColorStops) {
        for stop in stops {
            _ = gradient.add_color_stop(stop.offset as f32, &stop.color.to_css());
        }
    }

    fn gradient(&mut self, paint: &Paint) -> Option<web::CanvasGradient> {
        let ctx = &self.ctx;
        self.gradients.get_or_build(paint, || match paint {
            Paint::Solid(_) => None,
            Paint::Linear(g) => {
                let gradient = ctx.create_linear_gradient(g.x0, g.y0, g.x1, g.y1);
                Self::add_stops(&gradient, &g.stops);
                Some(gradient)
            }
            Paint::Radial(g) => {
                let gradient = ctx
                    .create_radial_gradient(g.x0, g.y0, g.r0, g.x1, g.y1, g.r1)
                    .ok()?;
                Self::add_stops(&gradient, &g.stops);
                Some(gradient)
            }
        })
    }
}

impl DrawContext for WebContext {
    fn save(&mut self) {
        self.ctx.save();
    }

    fn restore(&mut self) {
        self.ctx.restore();
    }

    fn set_transform(&mut self, a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) {
        _ = self.ctx.set_transform(a, b, c, d, e, f);
    }

    fn translate(&mut self, x: f64, y: f64) {
        _ = self.ctx.translate(x, y);
    }

    fn rotate(&mut self, angle: f64) {
        _ = self.ctx.rotate(angle);
    }

    fn scale(&mut self, x: f64, y: f64) {
        _ = self.ctx.scale(x, y);
    }

    fn clear_rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
        self.ctx.clear_rect(x, y, w, h);
    }

    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
        self.ctx.fill_rect(x, y, w, h);
    }

    fn begin_path(&mut self) {
        self.ctx.begin_path();
    }

    fn move_to(&mut self, x: f64, y: f64) {
        self.ctx.move_to(x, y);
    }

    fn line_to(&mut self, x: f64, y: f64) {
        self.ctx.line_to(x, y);
    }

    fn quadratic_curve_to(&mut self, cpx: f64, cpy: f64, x: f64, y: f64) {
        self.ctx.quadratic_curve_to(cpx, cpy, x, y);
    }

    fn arc(&mut self, x: f64, y: f64, radius: f64, start: f64, end: f64, anticlockwise: bool) {
        _ = self
            .ctx
            .arc_with_anticlockwise(x, y, radius.max(0.0), start, end, anticlockwise);
    }

    fn rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
        self.ctx.rect(x, y, w, h);
    }

    fn close_path(&mut self) {
        self.ctx.close_path();
    }

    fn fill(&mut self) {
        self.ctx.fill();
    }

    fn stroke(&mut self) {
        self.ctx.stroke();
    }

    fn clip(&mut self) {
        self.ctx.clip();
    }

    fn set_fill_style(&mut self, paint: &Paint) {
        match (paint, self.gradient(paint)) {
            (_, Some(g)) => self.ctx.set_fill_style_canvas_gradient(&g),
            (Paint::Solid(c), None) => self.ctx.set_fill_style_str(&c.to_css()),
            _ => {}
        }
    }

    fn set_stroke_style(&mut self, paint: &Paint) {
        match (paint, self.gradient(paint)) {
            (_, Some(g)) => self.ctx.set_stroke_style_canvas_gradient(&g),
            (Paint::Solid(c), None) => self.ctx.set_stroke_style_str(&c.to_css()),
            _ => {}
        }
    }

    fn set_line_width(&mut self, width: f64) {
        self.ctx.set_line_width(width);
    }

    fn set_global_alpha(&mut self, alpha: f64) {
        self.ctx.set_global_alpha(alpha.clamp(0.0, 1.0));
    }

    fn set_composite_operation(&mut self, op: CompositeOp) {
        _ = self.ctx.set_global_composite_operation(op.as_str());
    }

    fn set_shadow_blur(&mut self, blur: f64) {
        self.ctx.set_shadow_blur(blur.max(0.0));
    }

    fn set_shadow_color(&mut self, color: Rgba) {
        self.ctx.set_shadow_color(&color.to_css());
    }

    fn draw_context(&mut self, source: &Self, dx: f64, dy: f64, dw: f64, dh: f64) {
        _ = self
            .ctx
            .draw_image_with_html_canvas_element_and_dw_and_dh(&source.canvas, dx, dy, dw, dh);
    }
}
