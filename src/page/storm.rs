//! Notification storm and consumption feed

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Element, KeyboardEvent, MouseEvent};

use super::{Page, flash_class, is_activation_key};
use crate::consts::{DECORATION_THRESHOLD, NOTE_RECYCLE_MS, STORM_THRESHOLD};
use crate::platform::{Timeout, dom};
use crate::sim::surge::{self, SURGE_SETTLE_MS};
use crate::sim::{ChapterFlag, ChapterKind, NoteRecycler, NotificationSurge};

const STORM_WIGGLE_MS: u32 = 420;

pub fn init_icon_fallback(page: &Rc<Page>) -> Result<(), JsValue> {
    for item in dom::query_all(&page.document, ".storm-item") {
        let Some(img) = dom::query_in(&item, "img") else {
            continue;
        };
        dom::listen(&img, "error", move |_: web_sys::Event| {
            dom::add_class(&item, "img-failed");
        })?;
    }
    Ok(())
}

pub fn init_interactions(page: &Rc<Page>) -> Result<(), JsValue> {
    for item in dom::query_all(&page.document, ".storm-item") {
        dom::set_attr(&item, "role", "button");
        dom::set_attr(&item, "tabindex", "0");
        dom::set_attr(&item, "aria-label", "Wiggle notification");

        let slot = Rc::new(RefCell::new(None));
        let wiggle = {
            let page = Rc::clone(page);
            let item = item.clone();
            move || {
                if !page.reduced_motion {
                    flash_class(&page, &item, "storm-wiggle", STORM_WIGGLE_MS, &slot);
                }
            }
        };

        let on_click = wiggle.clone();
        dom::listen(&item, "click", move |_: MouseEvent| on_click())?;
        dom::listen(&item, "keydown", move |event: KeyboardEvent| {
            if is_activation_key(&event.key()) {
                event.prevent_default();
                wiggle();
            }
        })?;
    }
    Ok(())
}

struct Surge {
    items: Vec<Element>,
    surge: NotificationSurge,
    timer: Option<Timeout>,
    /// Pop removal timers, one per card
    pops: Vec<Rc<RefCell<Option<Timeout>>>>,
}

pub fn init_surge(page: &Rc<Page>) -> Result<(), JsValue> {
    let Some(index) = page.find_kind(ChapterKind::NotificationStorm) else {
        return Ok(());
    };
    let items = dom::query_all_in(&page.chapters[index], ".storm-item");
    if items.is_empty() {
        return Ok(());
    }

    let state = Rc::new(RefCell::new(Surge {
        surge: NotificationSurge::new(items.len()),
        pops: items.iter().map(|_| Rc::new(RefCell::new(None))).collect(),
        items,
        timer: None,
    }));

    let sensor_page = Rc::clone(page);
    page.watch_chapter(index, STORM_THRESHOLD, move |visible| {
        if visible {
            let started = {
                let mut state = state.borrow_mut();
                let started = state.surge.start();
                if started {
                    hide_all(&mut state);
                }
                started
            };
            if started {
                log::debug!("Notification surge started");
                show_next(&sensor_page, &state);
            }
        } else {
            let mut state = state.borrow_mut();
            state.surge.reset();
            hide_all(&mut state);
        }
    })
}

fn hide_all(state: &mut Surge) {
    state.timer = None;
    for item in &state.items {
        dom::remove_class(item, "live");
    }
}

fn show_next(page: &Rc<Page>, state: &Rc<RefCell<Surge>>) {
    let mut surge = state.borrow_mut();
    let Some((card, delay)) = surge.surge.next_card() else {
        surge.timer = None;
        return;
    };
    if let Some(item) = surge.items.get(card) {
        dom::add_class(item, "live");
        if !page.reduced_motion {
            flash_class(page, item, "storm-pop", SURGE_SETTLE_MS, &surge.pops[card]);
        }
    }

    let next_page = Rc::clone(page);
    let next_state = Rc::clone(state);
    surge.timer = page.timeout(delay, move || show_next(&next_page, &next_state));
}

pub fn init_consumption_notes(page: &Rc<Page>) -> Result<(), JsValue> {
    let Some(index) = page.find_kind(ChapterKind::ConsumptionFeed) else {
        return Ok(());
    };
    let sensor_page = Rc::clone(page);
    page.watch_chapter(index, DECORATION_THRESHOLD, move |visible| {
        if visible && sensor_page.set_flag(index, ChapterFlag::NotesLive) {
            log::debug!("Consumption notes live");
        }
    })
}

struct Feed {
    root: Element,
    recycler: NoteRecycler,
    timer: Option<Timeout>,
}

impl Feed {
    fn notes(&self) -> Vec<Element> {
        dom::query_all_in(&self.root, ".lockscreen-note")
    }

    fn update_times(&self) {
        for (position, note) in self.notes().iter().enumerate() {
            if let Some(time) = dom::query_in(note, "time") {
                dom::set_text(&time, &surge::note_time_label(position));
            }
        }
    }
}

pub fn init_lockscreen_feed(page: &Rc<Page>) -> Result<(), JsValue> {
    let Some(root) = dom::query(&page.document, ".consumption-section .lockscreen-notifications") else {
        return Ok(());
    };

    let feed = Rc::new(RefCell::new(Feed {
        root: root.clone(),
        recycler: NoteRecycler::default(),
        timer: None,
    }));
    for note in feed.borrow().notes() {
        dom::set_attr(&note, "tabindex", "0");
    }

    {
        let page = Rc::clone(page);
        let feed = Rc::clone(&feed);
        dom::listen(&root, "click", move |event: MouseEvent| {
            if let Some(note) = note_from(&event) {
                recycle(&page, &feed, note);
            }
        })?;
    }
    {
        let page = Rc::clone(page);
        let feed = Rc::clone(&feed);
        dom::listen(&root, "keydown", move |event: KeyboardEvent| {
            if !is_activation_key(&event.key()) {
                return;
            }
            if let Some(note) = note_from(&event) {
                event.prevent_default();
                recycle(&page, &feed, note);
            }
        })?;
    }

    feed.borrow().update_times();
    Ok(())
}

fn note_from(event: &web_sys::Event) -> Option<Element> {
    let target = event.target()?.dyn_into::<Element>().ok()?;
    dom::closest(&target, ".lockscreen-note")
}

/// Move `note` to the end of the feed after its removal animation
fn recycle(page: &Rc<Page>, feed: &Rc<RefCell<Feed>>, note: Element) {
    if !feed.borrow_mut().recycler.try_begin() {
        return;
    }
    dom::add_class(&note, "removing");

    let done = Rc::clone(feed);
    let moved = note.clone();
    let timer = page.timeout(NOTE_RECYCLE_MS, move || {
        let mut feed = done.borrow_mut();
        dom::remove_class(&moved, "removing");
        if let Err(err) = feed.root.append_child(&moved) {
            log::warn!("Lockscreen note not recycled: {:?}", err);
        }
        feed.update_times();
        feed.recycler.finish();
    });
    if timer.is_none() {
        // Nothing will finish the recycle
        feed.borrow_mut().recycler.finish();
        dom::remove_class(&note, "removing");
    }
    feed.borrow_mut().timer = timer;
}
