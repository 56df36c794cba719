use glam::DVec2;
use viz_core::config::{Theme, VisualizationMode};
use viz_core::zoom::ZoomEventKind;

// WheelEvent.deltaMode values
pub const DOM_DELTA_PIXEL: u32 = 0;
pub const DOM_DELTA_LINE: u32 = 1;
pub const DOM_DELTA_PAGE: u32 = 2;

/// Pixels scrolled per line when the browser reports line deltas.
pub const LINE_HEIGHT_PX: f64 = 16.0;

/// Client coordinates to CSS pixels relative to the canvas' top-left corner.
#[inline]
pub fn client_to_canvas(client_x: f64, client_y: f64, rect_left: f64, rect_top: f64) -> DVec2 {
    DVec2::new(client_x - rect_left, client_y - rect_top)
}

/// Normalise a wheel delta to pixels whatever unit the browser used.
#[inline]
pub fn wheel_delta_px(delta_y: f64, delta_mode: u32, page_height: f64) -> f64 {
    match delta_mode {
        DOM_DELTA_LINE => delta_y * LINE_HEIGHT_PX,
        DOM_DELTA_PAGE => delta_y * page_height.max(1.0),
        _ => delta_y,
    }
}

pub fn parse_theme(s: &str) -> Option<Theme> {
    match s.trim().to_ascii_lowercase().as_str() {
        "light" => Some(Theme::Light),
        "dark" => Some(Theme::Dark),
        _ => None,
    }
}

pub fn parse_mode(s: &str) -> Option<VisualizationMode> {
    match s.trim().to_ascii_lowercase().as_str() {
        "bars" => Some(VisualizationMode::Bars),
        "mandala" => Some(VisualizationMode::Mandala),
        _ => None,
    }
}

/// Event names accepted by `on_zoom_event`.
pub fn parse_zoom_event_kind(s: &str) -> Option<ZoomEventKind> {
    match s.trim() {
        "zoom" => Some(ZoomEventKind::Zoom),
        "pan" => Some(ZoomEventKind::Pan),
        "dragStart" | "dragstart" => Some(ZoomEventKind::DragStart),
        "dragEnd" | "dragend" => Some(ZoomEventKind::DragEnd),
        _ => None,
    }
}
