//! Chapter advance: continue buttons, Enter key and CTA readiness

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Element, HtmlElement, KeyboardEvent, MouseEvent};

use super::{Page, typing};
use crate::consts::CTA_THRESHOLD;
use crate::platform::{Timeout, dom};
use crate::sim::intent::ADVANCE_INTENT_MS;
use crate::sim::{ChapterEvent, ChapterFlag, CtaPoll, CtaReadiness, cta};

fn advance_from(page: &Page, index: usize) {
    if index + 1 >= page.chapter_count() {
        return;
    }
    page.intent.mark_forward_intent(ADVANCE_INTENT_MS);
    log::debug!("Advancing from chapter {}", index);
    page.scroll_to_chapter(index + 1);
}

fn build_cta(page: &Page) -> Result<Element, JsValue> {
    let button = page.document.create_element("button")?;
    button.set_attribute("type", "button")?;
    button.set_class_name("chapter-cta");
    button.set_attribute("aria-label", "Press Enter to continue")?;

    let key = page.document.create_element("span")?;
    key.set_class_name("logon-key");
    key.set_text_content(Some("enter"));
    let text = page.document.create_element("span")?;
    text.set_class_name("logon-cta-text");
    text.set_text_content(Some("to Continue"));

    button.append_child(&key)?;
    button.append_child(&text)?;
    Ok(button)
}

pub fn init_chapter_advance(page: &Rc<Page>) -> Result<(), JsValue> {
    let count = page.chapter_count();
    if count < 2 {
        return Ok(());
    }

    for (index, chapter) in page.chapters.iter().enumerate() {
        let existing = dom::query_in(chapter, ".chapter-cta");
        if index + 1 == count {
            if let Some(cta) = existing {
                cta.remove();
            }
            continue;
        }

        let cta = match existing {
            Some(cta) => cta,
            None => {
                let cta = build_cta(page)?;
                chapter.append_child(&cta)?;
                cta
            }
        };

        let click_page = Rc::clone(page);
        dom::listen(&cta, "click", move |_: MouseEvent| {
            if click_page.has(index, ChapterFlag::CtaReady) {
                advance_from(&click_page, index);
            }
        })?;
    }

    let key_page = Rc::clone(page);
    dom::listen(&page.window, "keydown", move |event: KeyboardEvent| {
        if !cta::is_advance_key(&event.key()) {
            return;
        }
        let editing = event
            .target()
            .and_then(|target| target.dyn_into::<HtmlElement>().ok())
            .is_some_and(|el| cta::is_editing_field(&el.tag_name(), el.is_content_editable()));
        if editing {
            return;
        }

        let active = key_page.active_index();
        let ready = active.is_some_and(|i| key_page.has(i, ChapterFlag::CtaReady));
        let Some(next) = cta::advance_target(active, ready, key_page.chapter_count()) else {
            return;
        };
        event.prevent_default();
        advance_from(&key_page, next - 1);
    })
}

struct CtaSlot {
    readiness: CtaReadiness,
    timer: Option<Timeout>,
}

type CtaSlots = Rc<RefCell<Vec<Option<CtaSlot>>>>;

/// Readiness runs once per chapter, from its first time in view
pub fn init_cta_readiness(page: &Rc<Page>) -> Result<(), JsValue> {
    let count = page.chapter_count();
    if count < 2 {
        return Ok(());
    }

    let slots: CtaSlots = Rc::new(RefCell::new(
        (0..count)
            .map(|index| {
                (index + 1 < count).then(|| CtaSlot {
                    readiness: CtaReadiness::new(page.cta_hold_ms(index)),
                    timer: None,
                })
            })
            .collect(),
    ));

    {
        let page_for_bus = Rc::downgrade(page);
        let slots = Rc::clone(&slots);
        page.subscribe(move |event: &ChapterEvent| {
            if event.flag != ChapterFlag::LinesDone || !event.set {
                return;
            }
            if let Some(page) = page_for_bus.upgrade() {
                poll(&page, &slots, event.chapter);
            }
        });
    }

    let sensor_page = Rc::clone(page);
    page.watch(&page.chapters, CTA_THRESHOLD, move |index, visible| {
        if !visible {
            return;
        }
        let started = {
            let mut slots = slots.borrow_mut();
            let now = sensor_page.now_ms();
            slots
                .get_mut(index)
                .and_then(Option::as_mut)
                .is_some_and(|slot| slot.readiness.start(now))
        };
        if started {
            log::debug!("CTA readiness started for chapter {}", index);
            poll(&sensor_page, &slots, index);
        }
    })
}

fn poll(page: &Rc<Page>, slots: &CtaSlots, index: usize) {
    let outcome = {
        let mut slots = slots.borrow_mut();
        let Some(slot) = slots.get_mut(index).and_then(Option::as_mut) else {
            return;
        };
        slot.timer = None;
        slot.readiness.poll(page.now_ms(), page.has(index, ChapterFlag::LinesDone))
    };

    match outcome {
        CtaPoll::Idle => {}
        CtaPoll::ForceTyping => {
            // LinesDone publishes and re-polls through the bus
            typing::force_complete(page, index);
            return;
        }
        CtaPoll::BecameReady => {
            page.set_flag(index, ChapterFlag::CtaReady);
            return;
        }
    }

    let deadline = {
        let slots = slots.borrow();
        slots
            .get(index)
            .and_then(Option::as_ref)
            .and_then(|slot| slot.readiness.next_deadline())
    };
    let Some(deadline) = deadline else {
        return;
    };
    let wait = (deadline - page.now_ms()).max(0.0).ceil() as u32;
    let next_page = Rc::clone(page);
    let next_slots = Rc::clone(slots);
    let timer = page.timeout(wait, move || poll(&next_page, &next_slots, index));
    if let Some(slot) = slots.borrow_mut().get_mut(index).and_then(Option::as_mut) {
        slot.timer = timer;
    }
}

pub fn init_concept_stack(page: &Rc<Page>) -> Result<(), JsValue> {
    let Some(stack) = dom::query(&page.document, ".prototype-concept-stack") else {
        return Ok(());
    };
    let target = stack.clone();
    dom::listen(&stack, "click", move |_: MouseEvent| {
        let flipped = dom::toggle_class(&target, "is-flipped");
        log::debug!("Concept stack flipped: {}", flipped);
    })
}

pub fn init_waitlist_jump(page: &Rc<Page>) -> Result<(), JsValue> {
    let links = dom::query_all(&page.document, ".waitlist-link");
    if links.is_empty() {
        return Ok(());
    }
    for link in links {
        let link_page = Rc::clone(page);
        dom::listen(&link, "click", move |event: MouseEvent| {
            let target = dom::query(&link_page.document, ".chapter.prototype-cta-section");
            if let Some(target) = target {
                event.prevent_default();
                link_page.scroll_to_element(&target);
            }
        })?;
    }
    Ok(())
}
