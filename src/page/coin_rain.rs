//! Coin rain chapter
//!
//! The simulation runs only while the chapter is in view. Leaving the view
//! drops every coin so the pile rebuilds on the next visit.

use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec2;
use rand::Rng;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, PointerEvent};

use super::Page;
use crate::consts::COIN_RAIN_THRESHOLD;
use crate::platform::{FrameLoop, dom};
use crate::renderer::{context_2d, draw_coin_rain};
use crate::sim::coins::canvas_size_for_shell;
use crate::sim::{ChapterKind, CoinRain};

struct RainView {
    shell: web_sys::Element,
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    rain: CoinRain,
    frames: Option<FrameLoop>,
    last_time: Option<f64>,
    in_view: bool,
}

impl RainView {
    fn sync_size(&mut self) {
        let shell_width = self.shell.get_bounding_client_rect().width() as f32;
        let (width, height) = canvas_size_for_shell(shell_width);
        self.canvas.set_width(width);
        self.canvas.set_height(height);
        self.rain.resize(width as f32, height as f32);
    }

    fn draw(&self) {
        if let Err(err) = draw_coin_rain(&self.ctx, &self.rain) {
            log::warn!("Coin rain draw failed: {:?}", err);
        }
    }

    /// Client coordinates to canvas pixels
    fn to_canvas(&self, event: &PointerEvent) -> Vec2 {
        let rect = self.canvas.get_bounding_client_rect();
        let scale_x = if rect.width() > 0.0 { self.canvas.width() as f64 / rect.width() } else { 1.0 };
        let scale_y = if rect.height() > 0.0 { self.canvas.height() as f64 / rect.height() } else { 1.0 };
        Vec2::new(
            ((event.client_x() as f64 - rect.left()) * scale_x) as f32,
            ((event.client_y() as f64 - rect.top()) * scale_y) as f32,
        )
    }
}

type SharedRain = Rc<RefCell<RainView>>;

pub fn init_coin_rain(page: &Rc<Page>) -> Result<(), JsValue> {
    if !page.settings.coin_rain {
        return Ok(());
    }
    let Some(index) = page.find_kind(ChapterKind::CoinRain) else {
        return Ok(());
    };
    let (Some(shell), Some(canvas)) = (
        dom::by_id(&page.document, "moneyRainShell"),
        dom::by_id(&page.document, "moneyRainCanvas"),
    ) else {
        return Ok(());
    };
    let Ok(canvas) = canvas.dyn_into::<HtmlCanvasElement>() else {
        return Ok(());
    };
    let ctx = context_2d(&canvas)?;

    let seed = page.with_rng(|rng| rng.random::<u64>());
    let view = Rc::new(RefCell::new(RainView {
        shell,
        canvas: canvas.clone(),
        ctx,
        rain: CoinRain::new(0.0, 0.0, seed),
        frames: None,
        last_time: None,
        in_view: false,
    }));
    {
        let mut view = view.borrow_mut();
        view.sync_size();
        view.draw();
    }

    bind_pointer(&canvas, &view)?;

    {
        let view = Rc::clone(&view);
        dom::listen(&page.window, "resize", move |_: web_sys::Event| {
            let mut view = view.borrow_mut();
            view.sync_size();
            view.draw();
        })?;
    }

    let sensor_page = Rc::clone(page);
    page.watch_chapter(index, COIN_RAIN_THRESHOLD, move |visible| {
        view.borrow_mut().in_view = visible;
        if visible {
            start(&sensor_page, &view);
        } else {
            reset(&view);
        }
    })
}

fn start(page: &Page, view: &SharedRain) {
    if view.borrow().frames.as_ref().is_some_and(FrameLoop::is_running) {
        return;
    }
    log::debug!("Coin rain started");
    view.borrow_mut().last_time = None;

    let weak = Rc::downgrade(view);
    let frames = FrameLoop::start(&page.window, move |time| {
        let Some(view) = weak.upgrade() else {
            return false;
        };
        let mut view = view.borrow_mut();
        if !view.in_view {
            return false;
        }
        let last = view.last_time.replace(time).unwrap_or(time);
        let dt = ((time - last) / 1000.0) as f32;
        view.rain.advance(dt);
        view.draw();
        true
    });
    match frames {
        Ok(frames) => view.borrow_mut().frames = Some(frames),
        Err(err) => log::warn!("Coin rain loop not started: {:?}", err),
    }
}

fn reset(view: &SharedRain) {
    let mut view = view.borrow_mut();
    view.frames = None;
    view.rain.reset();
    dom::remove_class(&view.canvas, "dragging");
    view.draw();
}

fn bind_pointer(canvas: &HtmlCanvasElement, view: &SharedRain) -> Result<(), JsValue> {
    {
        let view = Rc::clone(view);
        dom::listen(canvas, "pointerdown", move |event: PointerEvent| {
            let mut view = view.borrow_mut();
            let point = view.to_canvas(&event);
            if view.rain.pointer_down(event.pointer_id(), point) {
                dom::add_class(&view.canvas, "dragging");
                let _ = view.canvas.set_pointer_capture(event.pointer_id());
            }
        })?;
    }
    {
        let view = Rc::clone(view);
        dom::listen(canvas, "pointermove", move |event: PointerEvent| {
            let mut view = view.borrow_mut();
            let point = view.to_canvas(&event);
            view.rain.pointer_move(event.pointer_id(), point);
        })?;
    }
    for name in ["pointerup", "pointercancel"] {
        let view = Rc::clone(view);
        dom::listen(canvas, name, move |event: PointerEvent| {
            let mut view = view.borrow_mut();
            if view.rain.pointer_up(event.pointer_id()) {
                dom::remove_class(&view.canvas, "dragging");
                let _ = view.canvas.release_pointer_capture(event.pointer_id());
            }
        })?;
    }
    Ok(())
}
