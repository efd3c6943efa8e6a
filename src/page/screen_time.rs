//! Screen-time card: fan intro and the count-up

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::prelude::*;
use web_sys::{Element, KeyboardEvent, MouseEvent};

use super::{Page, is_activation_key};
use crate::consts::{FAN_INTRO_MS, SCREEN_TIME_THRESHOLD};
use crate::platform::{FrameLoop, Timeout, dom};
use crate::sim::ScreenTimeFrame;
use crate::sim::screen_time::buildup_progress;

struct Card {
    stack: Element,
    big_time: Option<Element>,
    bars: Vec<Element>,
    intro_played: bool,
    buildup_played: bool,
    fan_timer: Option<Timeout>,
    frames: Option<FrameLoop>,
}

impl Card {
    fn apply(&self, progress: f64) {
        let frame = ScreenTimeFrame::at(progress, self.bars.len());
        if let Some(big_time) = &self.big_time {
            dom::set_text(big_time, &frame.label);
        }
        for (bar, percent) in self.bars.iter().zip(&frame.bar_percents) {
            dom::set_style(bar, "height", &format!("{percent:.1}%"));
        }
    }

    fn set_fanned(&self, fanned: bool) {
        dom::set_class(&self.stack, "fanned", fanned);
        dom::set_attr(&self.stack, "aria-expanded", if fanned { "true" } else { "false" });
    }
}

type SharedCard = Rc<RefCell<Card>>;

pub fn init_screen_time(page: &Rc<Page>) -> Result<(), JsValue> {
    for stack in dom::query_all(&page.document, ".screen-time-stack") {
        let chapter = dom::closest(&stack, ".chapter");
        let card = Rc::new(RefCell::new(Card {
            big_time: dom::query_in(&stack, ".big-time"),
            bars: dom::query_all_in(&stack, ".week-bars i"),
            stack: stack.clone(),
            intro_played: false,
            buildup_played: false,
            fan_timer: None,
            frames: None,
        }));
        card.borrow().apply(0.0);

        match chapter {
            Some(chapter) if !page.reduced_motion => {
                let sensor_page = Rc::clone(page);
                let card = Rc::clone(&card);
                page.watch(std::slice::from_ref(&chapter), SCREEN_TIME_THRESHOLD, move |_, visible| {
                    if visible {
                        play_intro(&sensor_page, &card);
                        play_buildup(&sensor_page, &card);
                    }
                })?;
            }
            _ => card.borrow().apply(1.0),
        }

        let toggle = {
            let card = Rc::clone(&card);
            move || {
                let card = card.borrow();
                let expand = !dom::has_class(&card.stack, "fanned");
                card.set_fanned(expand);
            }
        };
        let on_click = toggle.clone();
        dom::listen(&stack, "click", move |_: MouseEvent| on_click())?;
        dom::listen(&stack, "keydown", move |event: KeyboardEvent| {
            if is_activation_key(&event.key()) {
                event.prevent_default();
                toggle();
            }
        })?;
    }
    Ok(())
}

fn play_intro(page: &Page, card: &SharedCard) {
    let mut state = card.borrow_mut();
    if state.intro_played {
        return;
    }
    state.intro_played = true;
    state.set_fanned(true);

    let closing = Rc::clone(card);
    state.fan_timer = page.timeout(FAN_INTRO_MS, move || {
        closing.borrow().set_fanned(false);
    });
}

fn play_buildup(page: &Page, card: &SharedCard) {
    {
        let mut state = card.borrow_mut();
        if state.buildup_played {
            return;
        }
        state.buildup_played = true;
        dom::add_class(&state.stack, "counting-up");
    }
    log::debug!("Screen time count-up");

    let start = page.now_ms();
    let weak = Rc::downgrade(card);
    let frames = FrameLoop::start(&page.window, move |now| {
        let Some(card) = weak.upgrade() else {
            return false;
        };
        let progress = buildup_progress(now - start);
        let state = card.borrow();
        state.apply(progress);
        if progress < 1.0 {
            return true;
        }
        dom::remove_class(&state.stack, "counting-up");
        false
    });
    match frames {
        Ok(frames) => card.borrow_mut().frames = Some(frames),
        Err(err) => {
            log::warn!("Screen time count-up not started: {:?}", err);
            let state = card.borrow();
            state.apply(1.0);
            dom::remove_class(&state.stack, "counting-up");
        }
    }
}
