//! Typewriter feature
//!
//! Each chapter types once, when it first crosses the typing threshold. The
//! opening chapter types on load. A pass is stepped by a chain of timeouts;
//! the chapter's current timer is the only thing keeping it going.

use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Element, HtmlElement};

use super::Page;
use crate::consts::{TYPE_LINE_SELECTOR, TYPING_THRESHOLD, VISUAL_REVEAL_DELAY_MS};
use crate::platform::{Timeout, dom};
use crate::sim::typewriter::LOGON_TRAILING_MS;
use crate::sim::{Cadence, ChapterFlag, ChapterKind, PassOptions, TypedLine, TypingPass, TypingStep};

/// Typing state of one chapter
pub struct ChapterTyping {
    lines: Vec<Element>,
    pass: Option<TypingPass>,
    step_timer: Option<Timeout>,
    reveal_timers: Vec<Timeout>,
}

impl ChapterTyping {
    pub fn new(lines: Vec<Element>) -> Self {
        Self {
            lines,
            pass: None,
            step_timer: None,
            reveal_timers: Vec::new(),
        }
    }
}

pub fn init_typewriter(page: &Rc<Page>) -> Result<(), JsValue> {
    if page.chapters.is_empty() {
        return Ok(());
    }

    let lines = dom::query_all_in(&page.scroller, TYPE_LINE_SELECTOR);
    reserve_line_heights(page, &lines);
    for line in &lines {
        dom::set_text(line, "");
    }

    let sensor_page = Rc::clone(page);
    page.watch(&page.chapters, TYPING_THRESHOLD, move |index, visible| {
        if visible {
            start_pass(&sensor_page, index);
        }
    })?;

    let first_has_lines = page
        .chapters
        .first()
        .is_some_and(|chapter| dom::query_in(chapter, TYPE_LINE_SELECTOR).is_some());
    if first_has_lines {
        start_pass(page, 0);
    }

    let resize_page = Rc::clone(page);
    dom::listen(&page.window, "resize", move |_: web_sys::Event| {
        reserve_line_heights(&resize_page, &lines);
    })
}

/// Pin each line's height to its fully typed height so the layout never jumps
fn reserve_line_heights(page: &Page, lines: &[Element]) {
    let Some(body) = page.document.body() else {
        return;
    };

    for line in lines {
        let text = line.get_attribute("data-text").unwrap_or_default();
        if text.is_empty() {
            continue;
        }
        let Ok(probe) = line.clone_node().map(|node| node.unchecked_into::<HtmlElement>()) else {
            continue;
        };
        probe.set_text_content(Some(&text));
        let style = probe.style();
        let width = line.get_bounding_client_rect().width();
        for (property, value) in [
            ("position", "absolute".to_string()),
            ("visibility", "hidden".to_string()),
            ("pointer-events", "none".to_string()),
            ("left", "-99999px".to_string()),
            ("top", "0".to_string()),
            ("width", format!("{width}px")),
            ("min-height", "0".to_string()),
        ] {
            let _ = style.set_property(property, &value);
        }

        if body.append_child(&probe).is_err() {
            continue;
        }
        let height = probe.get_bounding_client_rect().height();
        let _ = body.remove_child(&probe);
        dom::set_style(line, "min-height", &format!("{}px", height.ceil()));
    }
}

fn pass_options(page: &Page, kind: ChapterKind) -> PassOptions {
    PassOptions {
        slow_cadence: kind.slow_typing(),
        headline_hold: kind == ChapterKind::Product,
        trailing_pause_ms: if kind == ChapterKind::LogonIntro {
            LOGON_TRAILING_MS
        } else {
            0
        },
        speed: page.settings.typing_multiplier(),
    }
}

fn build_pass(lines: &[Element], options: PassOptions) -> TypingPass {
    let typed = lines
        .iter()
        .map(|line| {
            let classes = dom::class_names(line);
            TypedLine::new(
                line.get_attribute("data-text").unwrap_or_default(),
                Cadence::from_classes(classes.iter().map(String::as_str)),
            )
        })
        .collect();
    TypingPass::new(typed, options)
}

fn start_pass(page: &Rc<Page>, index: usize) {
    if !page.set_flag(index, ChapterFlag::Typed) {
        return;
    }
    let Some(kind) = page.kind(index) else {
        return;
    };
    let options = pass_options(page, kind);
    {
        let mut typing = page.typing.borrow_mut();
        let Some(entry) = typing.get_mut(index) else {
            return;
        };
        entry.pass = Some(build_pass(&entry.lines, options));
    }
    log::debug!("Typing chapter {}", index);
    step_pass(page, index);
}

/// One step, then schedule the next
fn step_pass(page: &Rc<Page>, index: usize) {
    let (step, lines_done) = {
        let mut typing = page.typing.borrow_mut();
        let Some(entry) = typing.get_mut(index) else {
            return;
        };
        let Some(pass) = entry.pass.as_mut() else {
            return;
        };
        let step = page.with_rng(|rng| pass.step(rng));
        match step {
            TypingStep::Typed { line, .. } => {
                if let (Some(element), Some(typed)) = (entry.lines.get(line), pass.line(line)) {
                    dom::add_class(element, "typing");
                    dom::set_text(element, typed.visible());
                }
            }
            TypingStep::LineDone { line, .. } => {
                if let (Some(element), Some(typed)) = (entry.lines.get(line), pass.line(line)) {
                    dom::set_text(element, typed.visible());
                    dom::remove_class(element, "typing");
                    dom::add_class(element, "done");
                }
            }
            TypingStep::Finished => {}
        }
        (step, pass.is_done())
    };

    if lines_done {
        page.set_flag(index, ChapterFlag::LinesDone);
    }

    match step {
        TypingStep::Typed { wait_ms, .. } | TypingStep::LineDone { wait_ms, .. } => {
            let next_page = Rc::clone(page);
            let timer = page.timeout(wait_ms, move || step_pass(&next_page, index));
            if let Some(entry) = page.typing.borrow_mut().get_mut(index) {
                entry.step_timer = timer;
            }
        }
        TypingStep::Finished => {
            if let Some(entry) = page.typing.borrow_mut().get_mut(index) {
                entry.step_timer = None;
            }
            reveal_after_typing(page, index);
        }
    }
}

/// Show every line in full and stop the pass
///
/// Used by the advance failsafe when a pass never finished.
pub fn force_complete(page: &Rc<Page>, index: usize) {
    let Some(kind) = page.kind(index) else {
        return;
    };
    let options = pass_options(page, kind);
    {
        let mut typing = page.typing.borrow_mut();
        let Some(entry) = typing.get_mut(index) else {
            return;
        };
        entry.step_timer = None;
        let pass = entry.pass.get_or_insert_with(|| build_pass(&entry.lines, options));
        pass.finish_all();
        for (element, typed) in entry.lines.iter().zip(pass.lines()) {
            dom::set_text(element, typed.visible());
            dom::remove_class(element, "typing");
            dom::add_class(element, "done");
        }
    }
    log::debug!("Typing failsafe completed chapter {}", index);

    page.set_flag(index, ChapterFlag::Typed);
    page.set_flag(index, ChapterFlag::LinesDone);
    reveal_after_typing(page, index);
}

fn reveal_after_typing(page: &Rc<Page>, index: usize) {
    let mut timers = Vec::new();

    let deferred = page.kind(index).is_some_and(ChapterKind::has_deferred_visual);
    if deferred && !page.has(index, ChapterFlag::VisualReady) {
        let reveal_page = Rc::clone(page);
        timers.extend(page.timeout(VISUAL_REVEAL_DELAY_MS, move || {
            reveal_page.set_flag(index, ChapterFlag::VisualReady);
        }));
    }

    let logon_word = page
        .chapters
        .get(index)
        .and_then(|chapter| dom::query_in(chapter, ".logon-word"));
    if let Some(word) = logon_word {
        if word.get_attribute("data-animated").as_deref() != Some("true") {
            dom::set_attr(&word, "data-animated", "true");
            if page.reduced_motion {
                dom::add_class(&word, "logon-ready");
            } else {
                timers.extend(page.timeout(VISUAL_REVEAL_DELAY_MS, move || {
                    dom::add_class(&word, "logon-ready");
                }));
            }
        }
    }

    if let Some(entry) = page.typing.borrow_mut().get_mut(index) {
        entry.reveal_timers.extend(timers);
    }
}
