//! Default zoom/pan input bindings on the canvas element.
//!
//! Every closure is kept alive by [`EventListeners`] and detached again when
//! it is dropped, so disposing a visualizer leaves no handlers behind.

use crate::input;
use crate::Inner;
use std::cell::RefCell;
use std::rc::Weak;
use viz_core::zoom::ZoomManager;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys as web;

type Handler = Closure<dyn FnMut(web::Event)>;

pub struct EventListeners {
    attached: Vec<(web::EventTarget, &'static str, Handler)>,
}

impl EventListeners {
    fn new() -> Self {
        Self {
            attached: Vec::new(),
        }
    }

    fn listen<E, F>(&mut self, target: &web::EventTarget, name: &'static str, passive: bool, mut f: F)
    where
        E: JsCast + 'static,
        F: FnMut(E) + 'static,
    {
        let handler = Closure::wrap(Box::new(move |ev: web::Event| {
            if let Ok(ev) = ev.dyn_into::<E>() {
                f(ev);
            }
        }) as Box<dyn FnMut(web::Event)>);

        let options = web::AddEventListenerOptions::new();
        options.set_passive(passive);
        let added = target.add_event_listener_with_callback_and_add_event_listener_options(
            name,
            handler.as_ref().unchecked_ref(),
            &options,
        );
        if let Err(e) = added {
            log::warn!("[events] could not listen for {}: {:?}", name, e);
            return;
        }
        self.attached.push((target.clone(), name, handler));
    }

    pub fn len(&self) -> usize {
        self.attached.len()
    }
}

impl Drop for EventListeners {
    fn drop(&mut self) {
        for (target, name, handler) in self.attached.drain(..) {
            _ = target.remove_event_listener_with_callback(name, handler.as_ref().unchecked_ref());
        }
        log::debug!("[events] listeners removed");
    }
}

/// Run `f` against the zoom manager unless the visualizer is gone or busy.
fn with_zoom(inner: &Weak<RefCell<Inner>>, f: impl FnOnce(&mut ZoomManager)) {
    let Some(inner) = inner.upgrade() else {
        return;
    };
    let Ok(mut inner) = inner.try_borrow_mut() else {
        log::warn!("[events] visualizer busy; input event dropped");
        return;
    };
    if let Some(zoom) = inner.factory.zoom_mut() {
        f(zoom);
    }
}

fn is_dragging(inner: &Weak<RefCell<Inner>>) -> bool {
    let Some(inner) = inner.upgrade() else {
        return false;
    };
    let dragging = match inner.try_borrow() {
        Ok(inner) => inner.factory.zoom().is_some_and(|z| z.state().is_dragging),
        Err(_) => false,
    };
    dragging
}

fn canvas_point(canvas: &web::HtmlCanvasElement, ev: &web::MouseEvent) -> glam::DVec2 {
    let rect = canvas.get_bounding_client_rect();
    input::client_to_canvas(ev.client_x() as f64, ev.client_y() as f64, rect.left(), rect.top())
}

/// Wheel, pointer and double-click on the canvas plus window resize.
pub fn wire(canvas: &web::HtmlCanvasElement, inner: Weak<RefCell<Inner>>) -> EventListeners {
    let mut listeners = EventListeners::new();
    let target: &web::EventTarget = canvas.as_ref();

    {
        let (canvas, inner) = (canvas.clone(), inner.clone());
        listeners.listen(target, "wheel", false, move |ev: web::WheelEvent| {
            ev.prevent_default();
            let page = canvas.client_height() as f64;
            let dy = input::wheel_delta_px(ev.delta_y(), ev.delta_mode(), page);
            let p = canvas_point(&canvas, &ev);
            with_zoom(&inner, |z| z.handle_wheel(dy, p.x, p.y));
        });
    }

    {
        let (canvas, inner) = (canvas.clone(), inner.clone());
        listeners.listen(target, "pointerdown", true, move |ev: web::PointerEvent| {
            let p = canvas_point(&canvas, &ev);
            with_zoom(&inner, |z| z.handle_pointer_down(p.x, p.y));
            if is_dragging(&inner) {
                _ = canvas.set_pointer_capture(ev.pointer_id());
            }
        });
    }

    {
        let (canvas, inner) = (canvas.clone(), inner.clone());
        listeners.listen(target, "pointermove", true, move |ev: web::PointerEvent| {
            if !is_dragging(&inner) {
                return;
            }
            let p = canvas_point(&canvas, &ev);
            with_zoom(&inner, |z| z.handle_pointer_move(p.x, p.y));
        });
    }

    for name in ["pointerup", "pointercancel"] {
        let (canvas, inner) = (canvas.clone(), inner.clone());
        listeners.listen(target, name, true, move |ev: web::PointerEvent| {
            if canvas.has_pointer_capture(ev.pointer_id()) {
                _ = canvas.release_pointer_capture(ev.pointer_id());
            }
            with_zoom(&inner, |z| z.handle_pointer_up());
        });
    }

    {
        let (canvas, inner) = (canvas.clone(), inner.clone());
        listeners.listen(target, "dblclick", true, move |ev: web::MouseEvent| {
            let p = canvas_point(&canvas, &ev);
            with_zoom(&inner, |z| z.handle_double_click(p.x, p.y));
        });
    }

    if let Some(window) = web::window() {
        let inner = inner.clone();
        listeners.listen(window.as_ref(), "resize", true, move |_: web::Event| {
            let Some(inner) = inner.upgrade() else {
                return;
            };
            if let Ok(mut inner) = inner.try_borrow_mut() {
                inner.factory.resize();
            };
        });
    }

    log::debug!("[events] {} listeners attached", listeners.len());
    listeners
}
