//! Scroll-linked motion: progress bar, chapter reveal and focus tracking

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::prelude::*;

use super::{Page, pigeons};
use crate::consts::REVEAL_THRESHOLD;
use crate::platform::{AnimationFrame, dom};
use crate::sim::intent::SCROLL_INTENT_MS;
use crate::sim::{ChapterFlag, ChapterRect, FocusTracker, ScrollDirection};

pub fn init_progress(page: &Rc<Page>) -> Result<(), JsValue> {
    let Some(fill) = dom::query(&page.document, ".progress-fill") else {
        return Ok(());
    };

    let update = {
        let page = Rc::clone(page);
        move || {
            let scroller = &page.scroller;
            let progress = crate::scroll_progress(
                scroller.scroll_top() as f64,
                scroller.scroll_height() as f64,
                scroller.client_height() as f64,
            );
            dom::set_style(&fill, "transform", &format!("scaleX({progress})"));
        }
    };
    update();

    let on_scroll = update.clone();
    dom::listen_passive(&page.scroller, "scroll", move |_: web_sys::Event| on_scroll())?;
    dom::listen(&page.window, "resize", move |_: web_sys::Event| update())
}

pub fn init_reveal(page: &Rc<Page>) -> Result<(), JsValue> {
    if page.chapters.is_empty() {
        return Ok(());
    }
    let reveal_page = Rc::clone(page);
    page.watch(&page.chapters, REVEAL_THRESHOLD, move |index, visible| {
        if visible {
            reveal_page.set_flag(index, ChapterFlag::Revealed);
        }
    })
}

struct SectionMotion {
    tracker: FocusTracker,
    direction: ScrollDirection,
    pending: Option<AnimationFrame>,
}

/// Publish `--focus`/`--offset` per chapter and keep the active chapter current
pub fn init_section_motion(page: &Rc<Page>) -> Result<(), JsValue> {
    if page.chapters.is_empty() {
        return Ok(());
    }

    let state = Rc::new(RefCell::new(SectionMotion {
        tracker: FocusTracker::new(),
        direction: ScrollDirection::new(page.scroller.scroll_top() as f64),
        pending: None,
    }));

    {
        let page = Rc::clone(page);
        let state = Rc::clone(&state);
        let scroller = page.scroller.clone();
        dom::listen_passive(&scroller, "scroll", move |_: web_sys::Event| {
            let top = page.scroller.scroll_top() as f64;
            if state.borrow_mut().direction.observe(top) {
                page.intent.mark_forward_intent(SCROLL_INTENT_MS);
            }
            request_update(&page, &state);
        })?;
    }
    {
        let page_for_resize = Rc::clone(page);
        let state = Rc::clone(&state);
        dom::listen(&page.window, "resize", move |_: web_sys::Event| {
            request_update(&page_for_resize, &state);
        })?;
    }

    update(page, &state);
    Ok(())
}

/// At most one evaluation per animation frame
fn request_update(page: &Rc<Page>, state: &Rc<RefCell<SectionMotion>>) {
    if state.borrow().pending.is_some() {
        return;
    }
    let frame_page = Rc::clone(page);
    let frame_state = Rc::clone(state);
    let frame = AnimationFrame::request(&page.window, move |_| {
        frame_state.borrow_mut().pending = None;
        update(&frame_page, &frame_state);
    });
    match frame {
        Ok(frame) => state.borrow_mut().pending = Some(frame),
        Err(err) => log::warn!("Focus update not scheduled: {:?}", err),
    }
}

fn update(page: &Rc<Page>, state: &Rc<RefCell<SectionMotion>>) {
    let scroller_top = page.scroller.get_bounding_client_rect().top();
    let rects: Vec<ChapterRect> = page
        .chapters
        .iter()
        .map(|chapter| {
            let rect = chapter.get_bounding_client_rect();
            ChapterRect::new(rect.top() - scroller_top, rect.height())
        })
        .collect();
    let viewport = page.scroller.client_height() as f64;
    let forward = page.intent.has_forward_intent();

    let focus = state.borrow_mut().tracker.evaluate(viewport, &rects, forward);

    for (chapter, sample) in page.chapters.iter().zip(&focus.samples) {
        dom::set_style(chapter, "--focus", &format!("{:.3}", sample.focus));
        dom::set_style(chapter, "--offset", &format!("{:.3}", sample.offset));
    }

    if let Some(active) = focus.active {
        page.set_active(active);
    }
    if let Some(previous) = focus.fly_off {
        pigeons::fly_off(page, previous);
    }
    if let Some(next) = focus.clear_fly_off {
        pigeons::clear_fly_off(page, next);
    }
}
