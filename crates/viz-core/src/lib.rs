//! Platform-independent audio visualization engine.
//!
//! Renderers turn one frame of frequency magnitudes (`&[u8]`, one byte per
//! bin) into 2D drawing commands on a [`canvas::DrawContext`]. Nothing here
//! touches the DOM; the web front end supplies a [`canvas::CanvasHost`]
//! backed by an HTML canvas, tests use [`canvas::recording`].

pub mod canvas;
pub mod color;
pub mod config;
pub mod constants;
pub mod effects;
pub mod error;
pub mod factory;
pub mod renderer;
pub mod zoom;

pub use canvas::{CanvasHost, DrawContext};
pub use config::{
    BarConfig, BarVisualMode, ColorMode, ColorPalette, MandalaConfig, ModeConfig, SymmetryMode,
    Theme, VisualizationConfig, VisualizationMode,
};
pub use error::RenderError;
pub use factory::{FactoryOptions, RendererFactory};
pub use renderer::{
    BarRenderer, MandalaRenderer, OptimizedMandalaRenderer, PerformanceStats, Renderer,
};
pub use zoom::{AnimationScheduler, FrameHandle, ZoomConfig, ZoomEvent, ZoomEventKind, ZoomManager};
