//! Join chapter: mission counter odometer and interest ticker

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::prelude::*;
use web_sys::Element;

use super::Page;
use crate::consts::{JOIN_THRESHOLD, TICKER_INTERVAL_MS};
use crate::platform::{Interval, Timeout, dom};
use crate::sim::odometer::{
    self, COUNTER_DURATION_MS, COUNTER_START, COUNTER_TARGET, DEFAULT_DIGITS, TRACK_DIGITS,
};
use crate::sim::{ChapterKind, CounterRun, Odometer, ReelMotion};

const TICKER_UPDATES: [&str; 6] = [
    "PHX just joined",
    "NYC just joined",
    "ATL just joined",
    "LDN just joined",
    "SFO just joined",
    "CHI just joined",
];

/// Odometer bound to its reel tracks
struct Reels {
    root: Element,
    tracks: Vec<Element>,
    odometer: Odometer,
    /// Digit each wrapping reel snaps to on transitionend
    settling: Vec<Option<u32>>,
}

impl Reels {
    fn build(page: &Page, root: &Element, digits: usize) -> Result<Self, JsValue> {
        root.set_inner_html("");
        let mut tracks = Vec::with_capacity(digits);
        for index in 0..digits {
            let reel = page.document.create_element("span")?;
            reel.set_class_name("digit-reel");

            let track = page.document.create_element("span")?;
            track.set_class_name("digit-track instant");
            dom::set_style(
                &track,
                "transition-duration",
                &format!("{}ms", odometer::reel_transition_ms(digits, index)),
            );
            for n in 0..TRACK_DIGITS {
                let digit = page.document.create_element("span")?;
                digit.set_class_name("digit-char");
                digit.set_text_content(Some(&(n % 10).to_string()));
                track.append_child(&digit)?;
            }

            reel.append_child(&track)?;
            root.append_child(&reel)?;
            tracks.push(track);
        }

        Ok(Self {
            root: root.clone(),
            tracks,
            odometer: Odometer::new(digits),
            settling: vec![None; digits],
        })
    }

    fn show(&mut self, value: u32, instant: bool) {
        let (text, motions) = self.odometer.set_value(value, instant);
        for (index, motion) in motions.into_iter().enumerate() {
            let Some(track) = self.tracks.get(index) else {
                continue;
            };
            match motion {
                ReelMotion::Instant { position } => {
                    dom::add_class(track, "instant");
                    place(track, position);
                }
                ReelMotion::Roll { position } => {
                    dom::remove_class(track, "instant");
                    place(track, position);
                }
                ReelMotion::Wrap { via, settle } => {
                    dom::remove_class(track, "instant");
                    place(track, via);
                    self.settling[index] = Some(settle);
                }
                ReelMotion::Unchanged | ReelMotion::Blocked => {}
            }
        }
        dom::set_attr(&self.root, "aria-label", &odometer::aria_label(&text));
    }

    fn settle(&mut self, index: usize) {
        let Some(digit) = self.settling.get_mut(index).and_then(Option::take) else {
            return;
        };
        if let (Some(position), Some(track)) = (self.odometer.settle(index, digit as u8), self.tracks.get(index)) {
            dom::add_class(track, "instant");
            place(track, position);
        }
    }
}

fn place(track: &Element, position: u32) {
    dom::set_style(
        track,
        "transform",
        &format!("translateY(-{}%)", odometer::track_offset_percent(position)),
    );
}

struct CounterState {
    reels: Reels,
    run: Option<CounterRun>,
    timer: Option<Timeout>,
}

pub fn init_mission_counter(page: &Rc<Page>) -> Result<(), JsValue> {
    let Some(counter) = dom::by_id(&page.document, "missionCount") else {
        return Ok(());
    };
    let Some(join) = page.find_kind(ChapterKind::Join) else {
        return Ok(());
    };

    let digits = counter
        .get_attribute("data-digits")
        .and_then(|value| value.trim().parse::<usize>().ok())
        .filter(|&digits| digits > 0)
        .unwrap_or(DEFAULT_DIGITS);

    let mut reels = Reels::build(page, &counter, digits)?;
    reels.show(COUNTER_START, true);
    let tracks = reels.tracks.clone();

    let state = Rc::new(RefCell::new(CounterState {
        reels,
        run: None,
        timer: None,
    }));

    for (index, track) in tracks.iter().enumerate() {
        let state = Rc::clone(&state);
        dom::listen(track, "transitionend", move |_: web_sys::Event| {
            state.borrow_mut().reels.settle(index);
        })?;
    }

    let sensor_page = Rc::clone(page);
    page.watch_chapter(join, JOIN_THRESHOLD, move |visible| {
        if !visible || state.borrow().run.is_some() {
            return;
        }
        log::debug!("Mission counter running");
        let run = CounterRun::new(COUNTER_START, COUNTER_TARGET, COUNTER_DURATION_MS);
        let delay = run.first_delay_ms();
        state.borrow_mut().run = Some(run);
        schedule(&sensor_page, &state, delay);
    })
}

fn schedule(page: &Rc<Page>, state: &Rc<RefCell<CounterState>>, delay_ms: f64) {
    let next_page = Rc::clone(page);
    let next_state = Rc::clone(state);
    let timer = page.timeout(delay_ms.round() as u32, move || step(&next_page, &next_state));
    state.borrow_mut().timer = timer;
}

fn step(page: &Rc<Page>, state: &Rc<RefCell<CounterState>>) {
    let next = {
        let mut state = state.borrow_mut();
        let CounterState { reels, run, .. } = &mut *state;
        let Some(run) = run.as_mut() else {
            return;
        };
        let step = page.with_rng(|rng| run.tick(rng));
        reels.show(step.value, false);
        step.next_delay_ms
    };
    match next {
        Some(delay) => schedule(page, state, delay),
        None => state.borrow_mut().timer = None,
    }
}

pub fn init_interest_ticker(page: &Rc<Page>) -> Result<(), JsValue> {
    let Some(city) = dom::by_id(&page.document, "interestCity") else {
        return Ok(());
    };
    let Some(join) = page.find_kind(ChapterKind::Join) else {
        return Ok(());
    };

    let ticker: Rc<RefCell<Option<Interval>>> = Rc::new(RefCell::new(None));
    let position = Rc::new(RefCell::new(0usize));
    let sensor_page = Rc::clone(page);
    page.watch_chapter(join, JOIN_THRESHOLD, move |visible| {
        if !visible || ticker.borrow().is_some() {
            return;
        }
        let city = city.clone();
        let position = Rc::clone(&position);
        let interval = Interval::new(&sensor_page.window, TICKER_INTERVAL_MS, move || {
            let mut position = position.borrow_mut();
            *position = (*position + 1) % TICKER_UPDATES.len();
            dom::set_text(&city, TICKER_UPDATES[*position]);
        });
        match interval {
            Ok(interval) => *ticker.borrow_mut() = Some(interval),
            Err(err) => log::warn!("Interest ticker not started: {:?}", err),
        }
    })
}
