//! Browser timer handles: one-shot timeouts, repeating intervals and
//! `requestAnimationFrame` loops. Every handle cancels on `cancel()` or drop,
//! so a page teardown only needs to drop whatever owns them.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::window;

fn no_window() -> JsValue {
    JsValue::from_str("no window")
}

/// Pending one-shot callback.
pub struct Timeout {
    id: Option<i32>,
    closure: Option<Closure<dyn FnMut()>>,
}

impl Timeout {
    pub fn new(delay_ms: f64, callback: impl FnOnce() + 'static) -> Result<Self, JsValue> {
        let win = window().ok_or_else(no_window)?;
        let closure = Closure::once(callback);
        let id = win.set_timeout_with_callback_and_timeout_and_arguments_0(
            closure.as_ref().unchecked_ref(),
            delay_ms.max(0.0) as i32,
        )?;
        Ok(Self {
            id: Some(id),
            closure: Some(closure),
        })
    }

    pub fn cancel(&mut self) {
        if let Some(id) = self.id.take() {
            if let Some(win) = window() {
                win.clear_timeout_with_handle(id);
            }
        }
        self.closure = None;
    }

    /// Fire-and-forget: no handle, and the JS side frees the closure once
    /// it has run.
    pub fn detached(delay_ms: f64, callback: impl FnOnce() + 'static) -> Result<(), JsValue> {
        let win = window().ok_or_else(no_window)?;
        let callback = Closure::once_into_js(callback);
        win.set_timeout_with_callback_and_timeout_and_arguments_0(
            callback.unchecked_ref(),
            delay_ms.max(0.0) as i32,
        )?;
        Ok(())
    }
}

impl Drop for Timeout {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Repeating callback.
pub struct Interval {
    id: Option<i32>,
    _closure: Closure<dyn FnMut()>,
}

impl Interval {
    pub fn new(period_ms: f64, callback: impl FnMut() + 'static) -> Result<Self, JsValue> {
        let win = window().ok_or_else(no_window)?;
        let closure = Closure::wrap(Box::new(callback) as Box<dyn FnMut()>);
        let id = win.set_interval_with_callback_and_timeout_and_arguments_0(
            closure.as_ref().unchecked_ref(),
            period_ms.max(0.0) as i32,
        )?;
        Ok(Self {
            id: Some(id),
            _closure: closure,
        })
    }

    pub fn cancel(&mut self) {
        if let Some(id) = self.id.take() {
            if let Some(win) = window() {
                win.clear_interval_with_handle(id);
            }
        }
    }
}

impl Drop for Interval {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// What a frame body wants to happen next.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopControl {
    Continue,
    Stop,
}

type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>;

/// `requestAnimationFrame` loop. The body receives the frame timestamp (ms).
/// To stop from inside the body return [`LoopControl::Stop`]; `cancel` is for
/// the owner, outside the frame callback.
pub struct FrameLoop {
    raf_id: Rc<Cell<Option<i32>>>,
    callback: FrameCallback,
}

impl FrameLoop {
    pub fn start(mut body: impl FnMut(f64) -> LoopControl + 'static) -> Result<Self, JsValue> {
        let win = window().ok_or_else(no_window)?;
        let raf_id = Rc::new(Cell::new(None));
        let f: FrameCallback = Rc::new(RefCell::new(None));
        let g = f.clone();
        let id_slot = raf_id.clone();
        *g.borrow_mut() = Some(Closure::wrap(Box::new(move |ts: f64| {
            id_slot.set(None);
            if body(ts) == LoopControl::Stop {
                return;
            }
            if let (Some(w), Some(cb)) = (window(), f.borrow().as_ref()) {
                id_slot.set(
                    w.request_animation_frame(cb.as_ref().unchecked_ref())
                        .ok(),
                );
            }
        }) as Box<dyn FnMut(f64)>));

        if let Some(cb) = g.borrow().as_ref() {
            raf_id.set(Some(
                win.request_animation_frame(cb.as_ref().unchecked_ref())?,
            ));
        }
        Ok(Self {
            raf_id,
            callback: g,
        })
    }

    pub fn cancel(&mut self) {
        if let Some(id) = self.raf_id.take() {
            if let Some(win) = window() {
                win.cancel_animation_frame(id).ok();
            }
        }
        // breaks the closure's reference to itself
        self.callback.borrow_mut().take();
    }
}

impl Drop for FrameLoop {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Page clock in ms, same timebase as animation frame timestamps.
pub fn now_ms() -> f64 {
    window()
        .and_then(|w| w.performance())
        .map(|p| p.now())
        .unwrap_or(0.0)
}
