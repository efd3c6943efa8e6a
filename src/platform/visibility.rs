//! Visibility sensor over `IntersectionObserver`
//!
//! The scroller is the observation root. Each sensor owns its observer and
//! reports `(target index, is intersecting)` for the targets it was given.

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Element, IntersectionObserver, IntersectionObserverEntry, IntersectionObserverInit};

pub struct VisibilitySensor {
    observer: IntersectionObserver,
    _callback: Closure<dyn FnMut(js_sys::Array, IntersectionObserver)>,
}

impl VisibilitySensor {
    pub fn observe(
        root: &Element,
        targets: &[Element],
        threshold: f64,
        mut on_change: impl FnMut(usize, bool) + 'static,
    ) -> Result<Self, JsValue> {
        let known = targets.to_vec();
        let callback = Closure::<dyn FnMut(js_sys::Array, IntersectionObserver)>::new(
            move |entries: js_sys::Array, _observer: IntersectionObserver| {
                for entry in entries.iter() {
                    let Ok(entry) = entry.dyn_into::<IntersectionObserverEntry>() else {
                        continue;
                    };
                    let target = entry.target();
                    if let Some(index) = known.iter().position(|el| *el == target) {
                        on_change(index, entry.is_intersecting());
                    }
                }
            },
        );

        let init = IntersectionObserverInit::new();
        init.set_root(Some(root));
        init.set_threshold(&JsValue::from_f64(threshold));
        let observer = IntersectionObserver::new_with_options(callback.as_ref().unchecked_ref(), &init)?;
        for target in targets {
            observer.observe(target);
        }

        Ok(Self {
            observer,
            _callback: callback,
        })
    }
}

impl Drop for VisibilitySensor {
    fn drop(&mut self) {
        self.observer.disconnect();
    }
}
