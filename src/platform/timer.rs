//! Owned timer handles
//!
//! Every handle cancels its browser timer when dropped, so a feature stops an
//! in-flight sequence by dropping (or replacing) the handle it holds.
//! Replacing a handle from inside its own callback is fine: the browser has
//! already fired it and the closure is freed once the call returns.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::Window;

/// One-shot `setTimeout`
pub struct Timeout {
    window: Window,
    id: i32,
    _closure: Closure<dyn FnMut()>,
}

impl Timeout {
    pub fn new(window: &Window, delay_ms: u32, callback: impl FnOnce() + 'static) -> Result<Self, JsValue> {
        let closure = Closure::once(callback);
        let id = window.set_timeout_with_callback_and_timeout_and_arguments_0(
            closure.as_ref().unchecked_ref(),
            delay_ms.min(i32::MAX as u32) as i32,
        )?;
        Ok(Self {
            window: window.clone(),
            id,
            _closure: closure,
        })
    }
}

impl Drop for Timeout {
    fn drop(&mut self) {
        self.window.clear_timeout_with_handle(self.id);
    }
}

/// Repeating `setInterval`
pub struct Interval {
    window: Window,
    id: i32,
    _closure: Closure<dyn FnMut()>,
}

impl Interval {
    pub fn new(window: &Window, period_ms: u32, callback: impl FnMut() + 'static) -> Result<Self, JsValue> {
        let closure = Closure::<dyn FnMut()>::new(callback);
        let id = window.set_interval_with_callback_and_timeout_and_arguments_0(
            closure.as_ref().unchecked_ref(),
            period_ms.min(i32::MAX as u32) as i32,
        )?;
        Ok(Self {
            window: window.clone(),
            id,
            _closure: closure,
        })
    }
}

impl Drop for Interval {
    fn drop(&mut self) {
        self.window.clear_interval_with_handle(self.id);
    }
}

/// One `requestAnimationFrame` callback
pub struct AnimationFrame {
    window: Window,
    id: i32,
    _closure: Closure<dyn FnMut(f64)>,
}

impl AnimationFrame {
    pub fn request(window: &Window, callback: impl FnOnce(f64) + 'static) -> Result<Self, JsValue> {
        let closure = Closure::once(callback);
        let id = window.request_animation_frame(closure.as_ref().unchecked_ref())?;
        Ok(Self {
            window: window.clone(),
            id,
            _closure: closure,
        })
    }
}

impl Drop for AnimationFrame {
    fn drop(&mut self) {
        let _ = self.window.cancel_animation_frame(self.id);
    }
}

type FrameSlot = RefCell<Option<AnimationFrame>>;
type FrameTick = Rc<RefCell<dyn FnMut(f64) -> bool>>;

/// Animation-frame loop; `tick` returns `false` to stop
///
/// Dropping the loop cancels the pending frame.
pub struct FrameLoop {
    slot: Rc<FrameSlot>,
}

impl FrameLoop {
    pub fn start(window: &Window, tick: impl FnMut(f64) -> bool + 'static) -> Result<Self, JsValue> {
        let slot = Rc::new(RefCell::new(None));
        let tick: FrameTick = Rc::new(RefCell::new(tick));
        schedule(window, Rc::downgrade(&slot), tick)?;
        Ok(Self { slot })
    }

    /// A frame is still pending
    pub fn is_running(&self) -> bool {
        self.slot.borrow().is_some()
    }
}

impl Drop for FrameLoop {
    fn drop(&mut self) {
        self.slot.borrow_mut().take();
    }
}

fn schedule(window: &Window, slot: Weak<FrameSlot>, tick: FrameTick) -> Result<(), JsValue> {
    let Some(owner) = slot.upgrade() else {
        return Ok(());
    };

    let next_window = window.clone();
    let frame = AnimationFrame::request(window, move |time| {
        let keep_going = (&mut *tick.borrow_mut())(time);
        if keep_going {
            if let Err(err) = schedule(&next_window, slot, tick) {
                log::warn!("Animation frame loop stopped: {:?}", err);
            }
        } else if let Some(owner) = slot.upgrade() {
            owner.borrow_mut().take();
        }
    })?;
    *owner.borrow_mut() = Some(frame);
    Ok(())
}
