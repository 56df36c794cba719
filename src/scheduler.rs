use viz_core::zoom::{AnimationScheduler, FrameHandle};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys as web;

type FrameCallback = Closure<dyn FnMut(f64)>;

/// `requestAnimationFrame`-backed scheduler for zoom transitions.
///
/// Every request re-arms the same closure; the closure forwards the frame
/// timestamp to whoever owns the zoom manager.
pub struct RafScheduler {
    callback: FrameCallback,
}

impl RafScheduler {
    pub fn new(on_frame: impl FnMut(f64) + 'static) -> Self {
        let callback = Closure::wrap(Box::new(on_frame) as Box<dyn FnMut(f64)>);
        Self { callback }
    }
}

impl AnimationScheduler for RafScheduler {
    fn request_frame(&mut self) -> FrameHandle {
        let id = web::window()
            .and_then(|w| {
                w.request_animation_frame(self.callback.as_ref().unchecked_ref())
                    .ok()
            })
            .unwrap_or(0);
        FrameHandle(id as u64)
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        if let Some(w) = web::window() {
            _ = w.cancel_animation_frame(handle.0 as i32);
        }
    }
}
