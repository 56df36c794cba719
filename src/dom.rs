use anyhow::{anyhow, Result};
use wasm_bindgen::{JsCast, JsValue};
use web_sys as web;

#[inline]
pub fn window_document() -> Option<web::Document> {
    web::window().and_then(|w| w.document())
}

pub fn canvas_by_id(id: &str) -> Result<web::HtmlCanvasElement> {
    let document = window_document().ok_or_else(|| anyhow!("no document"))?;
    let el = document
        .get_element_by_id(id)
        .ok_or_else(|| anyhow!("missing #{}", id))?;
    el.dyn_into::<web::HtmlCanvasElement>()
        .map_err(|_| anyhow!("#{} is not a canvas", id))
}

/// Detached canvas used as an off-screen buffer.
pub fn create_canvas(width: u32, height: u32) -> Result<web::HtmlCanvasElement> {
    let document = window_document().ok_or_else(|| anyhow!("no document"))?;
    let canvas = document
        .create_element("canvas")
        .map_err(|e| anyhow!("{:?}", e))?
        .dyn_into::<web::HtmlCanvasElement>()
        .map_err(|_| anyhow!("created element is not a canvas"))?;
    canvas.set_width(width.max(1));
    canvas.set_height(height.max(1));
    Ok(canvas)
}

/// 2D context; `opaque` requests `{ alpha: false }` so the compositor can
/// skip blending the page behind the canvas.
pub fn context_2d(canvas: &web::HtmlCanvasElement, opaque: bool) -> Result<web::CanvasRenderingContext2d> {
    let options = js_sys::Object::new();
    js_sys::Reflect::set(&options, &"alpha".into(), &JsValue::from_bool(!opaque))
        .map_err(|e| anyhow!("{:?}", e))?;
    canvas
        .get_context_with_context_options("2d", &options)
        .map_err(|e| anyhow!("{:?}", e))?
        .ok_or_else(|| anyhow!("2d context refused"))?
        .dyn_into::<web::CanvasRenderingContext2d>()
        .map_err(|_| anyhow!("unexpected context type"))
}

#[inline]
pub fn device_pixel_ratio() -> f64 {
    web::window().map(|w| w.device_pixel_ratio()).unwrap_or(1.0)
}
