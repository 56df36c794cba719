#![cfg(target_arch = "wasm32")]
//! Browser front end: binds the visualization engine to an HTML canvas and
//! exposes it to JavaScript as the `Visualizer` class.
//!
//! The page owns the audio graph and calls `render` once per animation frame
//! with the analyser's byte frequency data.

use crate::canvas::WebCanvas;
use crate::events::EventListeners;
use crate::scheduler::RafScheduler;
use serde::Deserialize;
use std::cell::RefCell;
use std::rc::Rc;
use viz_core::config::{VisualizationConfig, VisualizationMode};
use viz_core::constants::DEFAULT_RENDER_BUDGET_MS;
use viz_core::factory::{FactoryOptions, RendererFactory};
use viz_core::zoom::{ListenerId, ZoomConfig, ZoomManager};
use wasm_bindgen::prelude::*;

mod canvas;
mod dom;
mod events;
mod input;
mod scheduler;

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Info).ok();
    log::info!("viz-web loaded");
    Ok(())
}

fn to_js(e: anyhow::Error) -> JsValue {
    JsValue::from_str(&format!("{:#}", e))
}

/// Constructor options as passed from JavaScript. Every field is optional.
#[derive(Debug, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct JsOptions {
    prefer_optimized_mandala: bool,
    render_budget_ms: f64,
    enable_zoom: bool,
    zoom: ZoomConfig,
}

impl Default for JsOptions {
    fn default() -> Self {
        Self {
            prefer_optimized_mandala: true,
            render_budget_ms: DEFAULT_RENDER_BUDGET_MS,
            enable_zoom: true,
            zoom: ZoomConfig::default(),
        }
    }
}

impl From<JsOptions> for FactoryOptions {
    fn from(o: JsOptions) -> Self {
        FactoryOptions {
            prefer_optimized_mandala: o.prefer_optimized_mandala,
            render_budget_ms: o.render_budget_ms,
            zoom: o.enable_zoom.then_some(o.zoom),
        }
    }
}

#[allow(deprecated)]
fn parse_options(value: &JsValue) -> anyhow::Result<FactoryOptions> {
    if value.is_undefined() || value.is_null() {
        return Ok(FactoryOptions::default());
    }
    let options: JsOptions = value
        .into_serde()
        .map_err(|e| anyhow::anyhow!("invalid options: {}", e))?;
    Ok(options.into())
}

#[allow(deprecated)]
fn to_js_value<T: serde::Serialize>(value: &T) -> JsValue {
    JsValue::from_serde(value).unwrap_or(JsValue::NULL)
}

/// State shared with the DOM handlers and the animation-frame callback.
pub(crate) struct Inner {
    pub(crate) factory: RendererFactory<WebCanvas>,
    zoom_callbacks: Vec<(u32, ListenerId)>,
    next_callback: u32,
}

impl Inner {
    fn zoom(&mut self) -> Option<&mut ZoomManager> {
        let zoom = self.factory.zoom_mut();
        if zoom.is_none() {
            log::debug!("[visualizer] zoom is disabled");
        }
        zoom
    }
}

#[wasm_bindgen]
pub struct Visualizer {
    inner: Rc<RefCell<Inner>>,
    listeners: Option<EventListeners>,
}

impl Visualizer {
    /// Borrow the shared state; `None` when called back from inside a
    /// zoom event callback.
    fn with<R>(&self, f: impl FnOnce(&mut Inner) -> R) -> Option<R> {
        match self.inner.try_borrow_mut() {
            Ok(mut inner) => Some(f(&mut inner)),
            Err(_) => {
                log::warn!("[visualizer] re-entrant call ignored");
                None
            }
        }
    }
}

#[wasm_bindgen]
impl Visualizer {
    /// `new Visualizer(canvasId, "bars" | "mandala", options?)`
    #[wasm_bindgen(constructor)]
    pub fn new(canvas_id: &str, mode: &str, options: JsValue) -> Result<Visualizer, JsValue> {
        let mode = input::parse_mode(mode)
            .ok_or_else(|| JsValue::from_str(&format!("unknown visualization mode {:?}", mode)))?;
        let options = parse_options(&options).map_err(to_js)?;
        let element = dom::canvas_by_id(canvas_id).map_err(to_js)?;

        let factory = RendererFactory::new(WebCanvas::new(element.clone()), options);
        let inner = Rc::new(RefCell::new(Inner {
            factory,
            zoom_callbacks: Vec::new(),
            next_callback: 0,
        }));
        let weak = Rc::downgrade(&inner);

        {
            let mut state = inner.borrow_mut();
            if let Some(zoom) = state.factory.zoom_mut() {
                let weak = weak.clone();
                zoom.set_scheduler(Box::new(RafScheduler::new(move |ts: f64| {
                    let Some(inner) = weak.upgrade() else {
                        return;
                    };
                    let Ok(mut inner) = inner.try_borrow_mut() else {
                        log::debug!("[zoom] frame skipped; visualizer busy");
                        return;
                    };
                    if let Some(zoom) = inner.factory.zoom_mut() {
                        zoom.on_animation_frame(ts);
                    }
                })));
            }
            if !state.factory.set_mode(mode) {
                log::warn!("[visualizer] renderer for {:?} is inert", mode);
            }
        }

        let listeners = options
            .zoom
            .is_some()
            .then(|| events::wire(&element, weak));

        log::info!("[visualizer] attached to #{} in {:?} mode", canvas_id, mode);
        Ok(Visualizer { inner, listeners })
    }

    /// Draw one frame of byte frequency data (`AnalyserNode.getByteFrequencyData`).
    pub fn render(&self, frequency_data: &[u8]) {
        self.with(|i| i.factory.render(frequency_data));
    }

    pub fn resize(&self) {
        self.with(|i| i.factory.resize());
    }

    /// Returns `false` for an unknown theme name.
    pub fn set_theme(&self, theme: &str) -> bool {
        let Some(theme) = input::parse_theme(theme) else {
            log::warn!("[visualizer] unknown theme {:?}", theme);
            return false;
        };
        self.with(|i| i.factory.set_theme(theme)).is_some()
    }

    /// Switch renderer. Returns whether the new renderer is ready to draw.
    pub fn set_mode(&self, mode: &str) -> bool {
        let Some(mode) = input::parse_mode(mode) else {
            log::warn!("[visualizer] unknown mode {:?}", mode);
            return false;
        };
        self.with(|i| i.factory.set_mode(mode)).unwrap_or(false)
    }

    pub fn mode(&self) -> Option<String> {
        let mode = self.with(|i| i.factory.mode()).flatten()?;
        Some(
            match mode {
                VisualizationMode::Bars => "bars",
                VisualizationMode::Mandala => "mandala",
            }
            .to_string(),
        )
    }

    /// Apply a settings object (`{ mode: "bars", barCount: 64, .. }`).
    #[allow(deprecated)]
    pub fn update_configuration(&self, config: JsValue) -> Result<(), JsValue> {
        let config: VisualizationConfig = config
            .into_serde()
            .map_err(|e| JsValue::from_str(&format!("invalid configuration: {}", e)))?;
        self.with(|i| i.factory.update_configuration(&config));
        Ok(())
    }

    pub fn update_frequency_bin_count(&self, count: usize) {
        self.with(|i| i.factory.update_frequency_bin_count(count));
    }

    pub fn performance_stats(&self) -> JsValue {
        self.with(|i| to_js_value(&i.factory.performance_stats()))
            .unwrap_or(JsValue::NULL)
    }

    pub fn zoom_in(&self) {
        self.with(|i| i.zoom().map(|z| z.zoom_in(None)));
    }

    pub fn zoom_out(&self) {
        self.with(|i| i.zoom().map(|z| z.zoom_out(None)));
    }

    pub fn set_zoom(&self, level: f64) {
        self.with(|i| i.zoom().map(|z| z.set_zoom(level, None, None)));
    }

    pub fn reset_zoom(&self) {
        self.with(|i| i.zoom().map(|z| z.reset_zoom(None)));
    }

    /// `{ level, panX, panY, isDragging }`, or `null` when zoom is disabled.
    pub fn zoom_state(&self) -> JsValue {
        self.with(|i| i.factory.zoom().map(|z| to_js_value(&z.state())))
            .flatten()
            .unwrap_or(JsValue::NULL)
    }

    /// Subscribe to `"zoom"`, `"pan"`, `"dragStart"` or `"dragEnd"`. The
    /// returned id is passed to `off_zoom_event`.
    pub fn on_zoom_event(&self, kind: &str, callback: js_sys::Function) -> Result<u32, JsValue> {
        let kind = input::parse_zoom_event_kind(kind)
            .ok_or_else(|| JsValue::from_str(&format!("unknown zoom event {:?}", kind)))?;
        let handle = self.with(|i| {
            let id = i.zoom()?.subscribe(kind, move |event| {
                let payload = to_js_value(event);
                if let Err(e) = callback.call1(&JsValue::NULL, &payload) {
                    log::warn!("[zoom] event callback threw: {:?}", e);
                }
            });
            i.next_callback += 1;
            let handle = i.next_callback;
            i.zoom_callbacks.push((handle, id));
            Some(handle)
        });
        handle
            .flatten()
            .ok_or_else(|| JsValue::from_str("zoom is not available"))
    }

    pub fn off_zoom_event(&self, handle: u32) -> bool {
        self.with(|i| {
            let Some(pos) = i.zoom_callbacks.iter().position(|(h, _)| *h == handle) else {
                return false;
            };
            let (_, id) = i.zoom_callbacks.remove(pos);
            i.zoom().is_some_and(|z| z.unsubscribe(id))
        })
        .unwrap_or(false)
    }

    /// Detach DOM handlers and release the renderer and zoom state.
    pub fn dispose(&mut self) {
        self.listeners = None;
        self.with(|i| {
            i.zoom_callbacks.clear();
            i.factory.dispose();
        });
    }
}
