//! Page orchestrator
//!
//! Reads the chapters out of the scroller, builds the `ChapterStore` and
//! starts one feature per page section. Features never watch each other's DOM
//! classes: flag changes go through the store's event bus, and one subscriber
//! mirrors them onto the chapter elements.

mod advance;
mod chat;
mod coin_rain;
mod counter;
mod motion;
mod paint;
mod pigeons;
mod screen_time;
mod snake;
mod storm;
mod typing;

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use rand::SeedableRng;
use rand_pcg::Pcg32;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, HtmlElement, ScrollBehavior, ScrollToOptions, Window};

use crate::consts::{CHAPTER_SELECTOR, SCROLLER_ID, TYPE_LINE_SELECTOR};
use crate::platform::{PerformanceClock, Timeout, VisibilitySensor, dom};
use crate::settings::Settings;
use crate::sim::{
    Chapter, ChapterCounts, ChapterEvent, ChapterFlag, ChapterKind, ChapterStore, Clock, EventBus,
    ForwardIntent,
};

type FeatureInit = fn(&Rc<Page>) -> Result<(), JsValue>;

/// Features in start order
const FEATURES: &[(&str, FeatureInit)] = &[
    ("progress", motion::init_progress),
    ("reveal", motion::init_reveal),
    ("section motion", motion::init_section_motion),
    ("typewriter", typing::init_typewriter),
    ("mission counter", counter::init_mission_counter),
    ("interest ticker", counter::init_interest_ticker),
    ("storm icons", storm::init_icon_fallback),
    ("storm interactions", storm::init_interactions),
    ("notification surge", storm::init_surge),
    ("arrival pigeons", pigeons::init_arrivals),
    ("pigeon wiggle", pigeons::init_wiggle),
    ("coin rain", coin_rain::init_coin_rain),
    ("screen time", screen_time::init_screen_time),
    ("consumption notes", storm::init_consumption_notes),
    ("lockscreen feed", storm::init_lockscreen_feed),
    ("shift pigeon", pigeons::init_shift_pigeon),
    ("perched pigeons", pigeons::init_perched_arrivals),
    ("chapter advance", advance::init_chapter_advance),
    ("cta readiness", advance::init_cta_readiness),
    ("paint", paint::init_paint),
    ("buddy chat", chat::init_chat),
    ("snake", snake::init_snake),
    ("concept stack", advance::init_concept_stack),
    ("waitlist jump", advance::init_waitlist_jump),
];

/// Shared page state handed to every feature
pub struct Page {
    pub window: Window,
    pub document: Document,
    pub scroller: HtmlElement,
    /// Chapter elements in document order; index = chapter index
    pub chapters: Vec<Element>,
    pub settings: Settings,
    pub reduced_motion: bool,
    pub clock: Rc<dyn Clock>,
    pub intent: ForwardIntent,
    pub bus: EventBus<ChapterEvent>,
    store: RefCell<ChapterStore>,
    rng: RefCell<Pcg32>,
    typing: RefCell<Vec<typing::ChapterTyping>>,
    /// Sensors and handles that live as long as the page
    retained: RefCell<Vec<Box<dyn Any>>>,
}

impl Page {
    /// Read the page; `None` when there is no scroller
    pub fn mount(window: Window, document: Document, settings: Settings) -> Option<Rc<Self>> {
        let scroller = dom::by_id(&document, SCROLLER_ID)?.dyn_into::<HtmlElement>().ok()?;
        let chapters = dom::query_all_in(&scroller, CHAPTER_SELECTOR);

        let mut store = ChapterStore::new(
            chapters
                .iter()
                .enumerate()
                .map(|(index, element)| read_chapter(index, element))
                .collect(),
        );
        // Nothing to wait for on chapters without typed lines
        for index in 0..store.len() {
            if store.get(index).is_some_and(|c| c.line_count == 0) {
                let _ = store.set_flag(index, ChapterFlag::LinesDone);
            }
        }

        let typing = chapters
            .iter()
            .map(|element| typing::ChapterTyping::new(dom::query_all_in(element, TYPE_LINE_SELECTOR)))
            .collect();

        let reduced_motion = settings.effective_reduced_motion(dom::prefers_reduced_motion(&window));
        let clock: Rc<dyn Clock> = Rc::new(PerformanceClock::new(&window));
        let seed = js_sys::Date::now() as u64;

        let page = Rc::new(Self {
            intent: ForwardIntent::new(Rc::clone(&clock)),
            clock,
            window,
            document,
            scroller,
            chapters,
            settings,
            reduced_motion,
            bus: EventBus::new(),
            store: RefCell::new(store),
            rng: RefCell::new(Pcg32::seed_from_u64(seed)),
            typing: RefCell::new(typing),
            retained: RefCell::new(Vec::new()),
        });

        let weak = Rc::downgrade(&page);
        page.bus.subscribe(move |event: &ChapterEvent| {
            if let Some(page) = weak.upgrade() {
                page.mirror_class(event);
            }
        });

        log::info!(
            "Page mounted: {} chapters, seed {}, reduced motion {}",
            page.chapter_count(),
            seed,
            page.reduced_motion
        );
        Some(page)
    }

    /// Start every feature; a failing feature stays off
    pub fn start(self: &Rc<Self>) {
        for (name, init) in FEATURES {
            match init(self) {
                Ok(()) => log::debug!("Feature ready: {}", name),
                Err(err) => log::warn!("Feature {} disabled: {:?}", name, err),
            }
        }
    }

    pub fn chapter_count(&self) -> usize {
        self.chapters.len()
    }

    pub fn kind(&self, index: usize) -> Option<ChapterKind> {
        self.store.borrow().get(index).map(|c| c.kind)
    }

    pub fn find_kind(&self, kind: ChapterKind) -> Option<usize> {
        self.store.borrow().find_kind(kind)
    }

    pub fn has(&self, index: usize, flag: ChapterFlag) -> bool {
        self.store.borrow().has(index, flag)
    }

    pub fn active_index(&self) -> Option<usize> {
        self.store.borrow().active_index()
    }

    pub fn cta_hold_ms(&self, index: usize) -> u32 {
        self.store.borrow().get(index).map_or(0, Chapter::cta_hold_ms)
    }

    /// Set a flag and publish the change; false if it was already set
    pub fn set_flag(&self, index: usize, flag: ChapterFlag) -> bool {
        let event = self.store.borrow_mut().set_flag(index, flag);
        match event {
            Some(event) => {
                self.bus.publish(event);
                true
            }
            None => false,
        }
    }

    pub fn clear_flag(&self, index: usize, flag: ChapterFlag) -> bool {
        let event = self.store.borrow_mut().clear_flag(index, flag);
        match event {
            Some(event) => {
                self.bus.publish(event);
                true
            }
            None => false,
        }
    }

    pub fn set_active(&self, index: usize) {
        let events = self.store.borrow_mut().set_active(index);
        self.bus.publish_all(events);
    }

    pub fn subscribe(&self, listener: impl Fn(&ChapterEvent) + 'static) {
        self.bus.subscribe(listener);
    }

    pub fn now_ms(&self) -> f64 {
        self.clock.now_ms()
    }

    pub fn with_rng<T>(&self, f: impl FnOnce(&mut Pcg32) -> T) -> T {
        f(&mut self.rng.borrow_mut())
    }

    /// Keep a handle alive for the rest of the session
    pub fn retain(&self, handle: impl Any) {
        self.retained.borrow_mut().push(Box::new(handle));
    }

    /// Watch `targets` against the scroller and keep the sensor alive
    pub fn watch(
        &self,
        targets: &[Element],
        threshold: f64,
        on_change: impl FnMut(usize, bool) + 'static,
    ) -> Result<(), JsValue> {
        let sensor = VisibilitySensor::observe(&self.scroller, targets, threshold, on_change)?;
        self.retain(sensor);
        Ok(())
    }

    /// Watch a single chapter
    pub fn watch_chapter(
        &self,
        index: usize,
        threshold: f64,
        mut on_change: impl FnMut(bool) + 'static,
    ) -> Result<(), JsValue> {
        let Some(chapter) = self.chapters.get(index) else {
            return Ok(());
        };
        self.watch(std::slice::from_ref(chapter), threshold, move |_, visible| {
            on_change(visible)
        })
    }

    pub fn timeout(&self, delay_ms: u32, callback: impl FnOnce() + 'static) -> Option<Timeout> {
        match Timeout::new(&self.window, delay_ms, callback) {
            Ok(timer) => Some(timer),
            Err(err) => {
                log::warn!("setTimeout failed: {:?}", err);
                None
            }
        }
    }

    /// Smooth-scroll so `target` sits in the middle of the scroller
    pub fn scroll_to_element(&self, target: &Element) {
        let Some(target) = target.dyn_ref::<HtmlElement>() else {
            return;
        };
        let top = crate::centered_scroll_top(
            target.offset_top() as f64,
            target.offset_height() as f64,
            self.scroller.client_height() as f64,
            self.scroller.scroll_height() as f64,
        );
        let options = ScrollToOptions::new();
        options.set_top(top);
        options.set_behavior(ScrollBehavior::Smooth);
        self.scroller.scroll_to_with_scroll_to_options(&options);
    }

    pub fn scroll_to_chapter(&self, index: usize) {
        if let Some(chapter) = self.chapters.get(index) {
            self.scroll_to_element(chapter);
        }
    }

    fn mirror_class(&self, event: &ChapterEvent) {
        let class = self
            .store
            .borrow()
            .get(event.chapter)
            .and_then(|c| c.class_for(event.flag));
        if let (Some(class), Some(element)) = (class, self.chapters.get(event.chapter)) {
            dom::set_class(element, class, event.set);
        }
    }
}

fn read_chapter(index: usize, element: &Element) -> Chapter {
    let classes = dom::class_names(element);
    let kind = ChapterKind::from_classes(classes.iter().map(String::as_str));
    let counts = ChapterCounts {
        storm_items: dom::query_all_in(element, ".storm-item").len(),
        lockscreen_notes: dom::query_all_in(element, ".lockscreen-note").len(),
    };
    let line_count = dom::query_all_in(element, TYPE_LINE_SELECTOR).len();
    Chapter::new(index, kind, line_count, counts)
}

/// Re-add `class` as a fresh animation and drop it after `duration_ms`
///
/// `slot` holds the removal timer; a new flash replaces the pending one.
pub fn flash_class(page: &Page, element: &Element, class: &'static str, duration_ms: u32, slot: &Rc<RefCell<Option<Timeout>>>) {
    dom::remove_class(element, class);
    dom::restart_animation(element);
    dom::add_class(element, class);

    let target = element.clone();
    let timer = page.timeout(duration_ms, move || dom::remove_class(&target, class));
    *slot.borrow_mut() = timer;
}

/// Enter or Space on a focusable widget
pub fn is_activation_key(key: &str) -> bool {
    matches!(key, "Enter" | " ")
}
