//! Pigeon decorations
//!
//! Arrival pigeons latch a class while their chapter is in view. Perched
//! pigeons in the reflection chapters land a few seconds after the chapter's
//! visual is ready, and fly off when a forward transition leaves them. The
//! shift chapter's pixel pigeon plays once per visit.

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::prelude::*;
use web_sys::{AnimationEvent, Element, MouseEvent};

use super::{Page, flash_class};
use crate::consts::{DECORATION_THRESHOLD, PERCHED_ARRIVAL_DELAY_MS, WIGGLE_MS};
use crate::platform::{Timeout, dom};
use crate::sim::{ChapterEvent, ChapterFlag, ChapterKind};

const ARRIVAL_KINDS: [ChapterKind; 3] = [ChapterKind::LookUpBreak, ChapterKind::Product, ChapterKind::BlankBreak];
const PERCHED_KINDS: [ChapterKind; 3] = [ChapterKind::Paint, ChapterKind::Chat, ChapterKind::Snake];

fn perched_in(page: &Page, index: usize) -> Option<Element> {
    page.chapters
        .get(index)
        .and_then(|chapter| dom::query_in(chapter, ".perched-pigeon"))
}

fn chapter_of(page: &Page, element: &Element) -> Option<usize> {
    let chapter = dom::closest(element, crate::consts::CHAPTER_SELECTOR)?;
    page.chapters.iter().position(|c| *c == chapter)
}

/// A forward transition left chapter `index`; a landed pigeon flies off
pub fn fly_off(page: &Page, index: usize) {
    let Some(perched) = perched_in(page, index) else {
        return;
    };
    if !dom::has_class(&perched, "is-landed") {
        return;
    }
    dom::remove_class(&perched, "is-arriving");
    dom::remove_class(&perched, "is-landed");
    dom::add_class(&perched, "fly-off");
}

/// Chapter `index` became active again
pub fn clear_fly_off(page: &Page, index: usize) {
    if let Some(perched) = perched_in(page, index) {
        dom::remove_class(&perched, "fly-off");
    }
}

pub fn init_arrivals(page: &Rc<Page>) -> Result<(), JsValue> {
    for kind in ARRIVAL_KINDS {
        let Some(index) = page.find_kind(kind) else {
            continue;
        };
        let sensor_page = Rc::clone(page);
        page.watch_chapter(index, DECORATION_THRESHOLD, move |visible| {
            if visible {
                sensor_page.set_flag(index, ChapterFlag::Arrival);
            } else {
                sensor_page.clear_flag(index, ChapterFlag::Arrival);
            }
        })?;
    }
    Ok(())
}

pub fn init_shift_pigeon(page: &Rc<Page>) -> Result<(), JsValue> {
    let Some(index) = page.find_kind(ChapterKind::Shift) else {
        return Ok(());
    };
    let in_view = Rc::new(RefCell::new(false));

    let start_if_ready = {
        let in_view = Rc::clone(&in_view);
        move |page: &Page| {
            if *in_view.borrow() && page.has(index, ChapterFlag::VisualReady) && page.set_flag(index, ChapterFlag::PigeonLive) {
                log::debug!("Shift pigeon live");
            }
        }
    };

    {
        let weak = Rc::downgrade(page);
        let start_if_ready = start_if_ready.clone();
        page.subscribe(move |event: &ChapterEvent| {
            if !event.is_set(index, ChapterFlag::VisualReady) {
                return;
            }
            if let Some(page) = weak.upgrade() {
                start_if_ready(&page);
            }
        });
    }

    if let Some(pigeon) = dom::by_id(&page.document, "pixelPigeon") {
        let end_page = Rc::clone(page);
        dom::listen(&pigeon, "animationend", move |event: AnimationEvent| {
            if event.animation_name() == "pigeonFlyOut" {
                end_page.clear_flag(index, ChapterFlag::PigeonLive);
            }
        })?;
    }

    let sensor_page = Rc::clone(page);
    page.watch_chapter(index, DECORATION_THRESHOLD, move |visible| {
        *in_view.borrow_mut() = visible;
        if visible {
            start_if_ready(&sensor_page);
        } else {
            sensor_page.clear_flag(index, ChapterFlag::PigeonLive);
        }
    })
}

/// A pigeon in the middle of its own animation ignores clicks
fn is_busy(page: &Page, pigeon: &Element) -> bool {
    if dom::has_class(pigeon, "is-arriving") || dom::has_class(pigeon, "fly-off") {
        return true;
    }
    let Some(index) = chapter_of(page, pigeon) else {
        return false;
    };
    match page.kind(index) {
        Some(ChapterKind::LookUpBreak) => {
            dom::has_class(pigeon, "look-up-pigeon") && page.has(index, ChapterFlag::Arrival)
        }
        Some(ChapterKind::Shift) => pigeon.id() == "pixelPigeon" && page.has(index, ChapterFlag::PigeonLive),
        _ => false,
    }
}

pub fn init_wiggle(page: &Rc<Page>) -> Result<(), JsValue> {
    for pigeon in dom::query_all(&page.document, ".pixel-pigeon, .perched-pigeon") {
        let slot = Rc::new(RefCell::new(None));
        let click_page = Rc::clone(page);
        let target = pigeon.clone();
        dom::listen(&pigeon, "click", move |_: MouseEvent| {
            if !is_busy(&click_page, &target) {
                flash_class(&click_page, &target, "pigeon-wiggle", WIGGLE_MS, &slot);
            }
        })?;
    }
    Ok(())
}

struct Perch {
    index: usize,
    pigeon: Element,
    in_view: bool,
    timer: Option<Timeout>,
}

type SharedPerch = Rc<RefCell<Perch>>;

pub fn init_perched_arrivals(page: &Rc<Page>) -> Result<(), JsValue> {
    for kind in PERCHED_KINDS {
        let Some(index) = page.find_kind(kind) else {
            continue;
        };
        let Some(pigeon) = perched_in(page, index) else {
            continue;
        };
        let perch = Rc::new(RefCell::new(Perch {
            index,
            pigeon: pigeon.clone(),
            in_view: false,
            timer: None,
        }));

        dom::listen(&pigeon, "animationend", {
            let pigeon = pigeon.clone();
            move |event: AnimationEvent| match event.animation_name().as_str() {
                "perchedArrive" => {
                    dom::remove_class(&pigeon, "is-arriving");
                    dom::add_class(&pigeon, "is-landed");
                }
                "perchedFlyOff" => dom::remove_class(&pigeon, "fly-off"),
                _ => {}
            }
        })?;

        {
            let weak = Rc::downgrade(page);
            let perch = Rc::clone(&perch);
            page.subscribe(move |event: &ChapterEvent| {
                if !event.is_set(index, ChapterFlag::VisualReady) {
                    return;
                }
                if let Some(page) = weak.upgrade() {
                    trigger_arrival(&page, &perch);
                }
            });
        }

        let sensor_page = Rc::clone(page);
        page.watch_chapter(index, DECORATION_THRESHOLD, move |visible| {
            perch.borrow_mut().in_view = visible;
            if visible {
                trigger_arrival(&sensor_page, &perch);
                return;
            }
            let mut perch = perch.borrow_mut();
            perch.timer = None;
            for class in ["is-arriving", "is-landed", "fly-off"] {
                dom::remove_class(&perch.pigeon, class);
            }
        })?;
    }
    Ok(())
}

fn trigger_arrival(page: &Rc<Page>, perch: &SharedPerch) {
    let mut state = perch.borrow_mut();
    if !state.in_view || !page.has(state.index, ChapterFlag::VisualReady) || state.timer.is_some() {
        return;
    }
    if dom::has_class(&state.pigeon, "is-arriving") || dom::has_class(&state.pigeon, "is-landed") {
        return;
    }
    dom::remove_class(&state.pigeon, "fly-off");

    let landing = Rc::clone(perch);
    state.timer = page.timeout(PERCHED_ARRIVAL_DELAY_MS, move || {
        let mut state = landing.borrow_mut();
        state.timer = None;
        if state.in_view {
            dom::add_class(&state.pigeon, "is-arriving");
        }
    });
}
