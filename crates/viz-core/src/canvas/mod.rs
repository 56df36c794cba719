//! Drawing surface abstraction.
//!
//! Renderers never talk to a browser API directly. They draw through
//! [`DrawContext`], a small subset of a 2D canvas context, and obtain contexts
//! (on-screen and off-screen) from a [`CanvasHost`]. The web front end backs
//! these traits with `CanvasRenderingContext2d`; [`recording`] provides a
//! headless backend that records every call.

pub mod cache;
pub mod recording;

use smallvec::SmallVec;
use std::fmt;

/// 8-bit RGB color with a floating point alpha, mirroring CSS `rgba()`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f64,
}

impl Rgba {
    pub const BLACK: Rgba = Rgba::rgb(0, 0, 0);
    pub const WHITE: Rgba = Rgba::rgb(255, 255, 255);

    #[inline]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    #[inline]
    pub fn rgba(r: u8, g: u8, b: u8, a: f64) -> Self {
        Self {
            r,
            g,
            b,
            a: a.clamp(0.0, 1.0),
        }
    }

    #[inline]
    pub fn with_alpha(self, a: f64) -> Self {
        Self::rgba(self.r, self.g, self.b, a)
    }

    /// Parse `#rgb` or `#rrggbb` (leading `#` optional).
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.trim().trim_start_matches('#');
        let channel = |s: &str| u8::from_str_radix(s, 16).ok();
        match digits.len() {
            3 => {
                let mut out = [0u8; 3];
                for (i, c) in digits.chars().enumerate() {
                    let v = c.to_digit(16)? as u8;
                    out[i] = v * 17;
                }
                Some(Self::rgb(out[0], out[1], out[2]))
            }
            6 => Some(Self::rgb(
                channel(digits.get(0..2)?)?,
                channel(digits.get(2..4)?)?,
                channel(digits.get(4..6)?)?,
            )),
            _ => None,
        }
    }

    /// CSS color string understood by `fillStyle`/`strokeStyle`.
    pub fn to_css(&self) -> String {
        if self.a >= 1.0 {
            format!("rgb({}, {}, {})", self.r, self.g, self.b)
        } else {
            format!("rgba({}, {}, {}, {:.3})", self.r, self.g, self.b, self.a)
        }
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_css())
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColorStop {
    pub offset: f64,
    pub color: Rgba,
}

impl ColorStop {
    #[inline]
    pub fn new(offset: f64, color: Rgba) -> Self {
        Self {
            offset: offset.clamp(0.0, 1.0),
            color,
        }
    }
}

pub type ColorStops = SmallVec<[ColorStop; 6]>;

/// Build stops evenly spread over `[0, 1]`.
pub fn even_stops(colors: &[Rgba]) -> ColorStops {
    let n = colors.len();
    colors
        .iter()
        .enumerate()
        .map(|(i, c)| {
            let offset = if n > 1 { i as f64 / (n - 1) as f64 } else { 0.0 };
            ColorStop::new(offset, *c)
        })
        .collect()
}

#[derive(Clone, Debug, PartialEq)]
pub struct LinearGradient {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
    pub stops: ColorStops,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RadialGradient {
    pub x0: f64,
    pub y0: f64,
    pub r0: f64,
    pub x1: f64,
    pub y1: f64,
    pub r1: f64,
    pub stops: ColorStops,
}

/// Anything assignable to `fillStyle`/`strokeStyle`.
#[derive(Clone, Debug, PartialEq)]
pub enum Paint {
    Solid(Rgba),
    Linear(LinearGradient),
    Radial(RadialGradient),
}

impl From<Rgba> for Paint {
    fn from(c: Rgba) -> Self {
        Paint::Solid(c)
    }
}

/// The compositing modes the renderers rely on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CompositeOp {
    SourceOver,
    Lighter,
    Screen,
    DestinationIn,
    DestinationOver,
}

impl CompositeOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompositeOp::SourceOver => "source-over",
            CompositeOp::Lighter => "lighter",
            CompositeOp::Screen => "screen",
            CompositeOp::DestinationIn => "destination-in",
            CompositeOp::DestinationOver => "destination-over",
        }
    }
}

/// Subset of a 2D drawing context used by the renderers.
pub trait DrawContext {
    fn save(&mut self);
    fn restore(&mut self);

    fn set_transform(&mut self, a: f64, b: f64, c: f64, d: f64, e: f64, f: f64);
    fn translate(&mut self, x: f64, y: f64);
    fn rotate(&mut self, angle: f64);
    fn scale(&mut self, x: f64, y: f64);

    fn clear_rect(&mut self, x: f64, y: f64, w: f64, h: f64);
    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64);

    fn begin_path(&mut self);
    fn move_to(&mut self, x: f64, y: f64);
    fn line_to(&mut self, x: f64, y: f64);
    fn quadratic_curve_to(&mut self, cpx: f64, cpy: f64, x: f64, y: f64);
    fn arc(&mut self, x: f64, y: f64, radius: f64, start: f64, end: f64, anticlockwise: bool);
    fn rect(&mut self, x: f64, y: f64, w: f64, h: f64);
    fn close_path(&mut self);
    fn fill(&mut self);
    fn stroke(&mut self);
    /// Intersect the clip region with the current path. Undone by `restore`.
    fn clip(&mut self);

    fn set_fill_style(&mut self, paint: &Paint);
    fn set_stroke_style(&mut self, paint: &Paint);
    fn set_line_width(&mut self, width: f64);
    fn set_global_alpha(&mut self, alpha: f64);
    fn set_composite_operation(&mut self, op: CompositeOp);
    fn set_shadow_blur(&mut self, blur: f64);
    fn set_shadow_color(&mut self, color: Rgba);

    /// Draw another context of the same backend (an off-screen buffer) into
    /// the destination rectangle, in current user space.
    fn draw_context(&mut self, source: &Self, dx: f64, dy: f64, dw: f64, dh: f64)
    where
        Self: Sized;
}

/// A drawable element: knows its CSS box and hands out contexts.
pub trait CanvasHost {
    type Context: DrawContext;

    /// Size of the element's CSS box in CSS pixels.
    fn css_size(&self) -> (f64, f64);
    fn device_pixel_ratio(&self) -> f64;
    /// Resize the backing store (device pixels).
    fn set_backing_size(&mut self, width: u32, height: u32);
    /// Opaque (alpha-disabled) 2D context, `None` when the platform refuses.
    fn acquire_context(&mut self) -> Option<Self::Context>;
    /// Off-screen buffer of the given device-pixel size.
    fn create_offscreen(&mut self, width: u32, height: u32) -> Option<Self::Context>;
}
