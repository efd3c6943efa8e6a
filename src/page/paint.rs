//! Paint chapter

use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec2;
use rand::Rng;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Element, HtmlCanvasElement, MouseEvent};

use super::Page;
use crate::platform::dom;
use crate::renderer::{PaintCanvas, context_2d};
use crate::sim::{PaintOp, PaintSession, PaintTool, Rgba};

struct Painter {
    canvas: HtmlCanvasElement,
    surface: PaintCanvas,
    session: PaintSession,
}

impl Painter {
    fn apply(&mut self, ops: &[PaintOp]) {
        for op in ops {
            if let Err(err) = self.surface.apply(op) {
                log::warn!("Paint op failed: {:?}", err);
            }
        }
    }

    fn point(&self, event: &MouseEvent) -> Vec2 {
        let rect = self.canvas.get_bounding_client_rect();
        let (width, height) = self.surface.size();
        let scale_x = if rect.width() > 0.0 { width as f64 / rect.width() } else { 1.0 };
        let scale_y = if rect.height() > 0.0 { height as f64 / rect.height() } else { 1.0 };
        Vec2::new(
            ((event.client_x() as f64 - rect.left()) * scale_x) as f32,
            ((event.client_y() as f64 - rect.top()) * scale_y) as f32,
        )
    }
}

fn mark_active(buttons: &[Element], active: &Element) {
    for button in buttons {
        dom::set_class(button, "is-active", button == active);
    }
}

pub fn init_paint(page: &Rc<Page>) -> Result<(), JsValue> {
    let Some(canvas) = dom::by_id(&page.document, "reflectionCanvas") else {
        return Ok(());
    };
    let Ok(canvas) = canvas.dyn_into::<HtmlCanvasElement>() else {
        return Ok(());
    };
    let colors = dom::query_all(&page.document, ".paint-color");
    let tools = dom::query_all(&page.document, ".paint-tool");
    if colors.is_empty() || tools.is_empty() {
        return Ok(());
    }

    let initial = colors
        .first()
        .and_then(|button| button.get_attribute("data-color"))
        .map_or(Rgba::BLACK, |hex| Rgba::parse_hex(&hex));
    let seed = page.with_rng(|rng| rng.random::<u64>());
    let surface = PaintCanvas::new(context_2d(&canvas)?, canvas.width(), canvas.height());
    let painter = Rc::new(RefCell::new(Painter {
        canvas: canvas.clone(),
        surface,
        session: PaintSession::new(initial, seed),
    }));

    for button in &colors {
        let Some(hex) = button.get_attribute("data-color") else {
            continue;
        };
        let color = Rgba::parse_hex(&hex);
        let painter = Rc::clone(&painter);
        let all = colors.clone();
        let target = button.clone();
        dom::listen(button, "click", move |_: MouseEvent| {
            painter.borrow_mut().session.set_color(color);
            mark_active(&all, &target);
        })?;
    }

    for button in &tools {
        let Some(tool) = button.get_attribute("data-tool").as_deref().and_then(PaintTool::from_name) else {
            continue;
        };
        let painter = Rc::clone(&painter);
        let all = tools.clone();
        let target = button.clone();
        dom::listen(button, "click", move |_: MouseEvent| {
            let mut painter = painter.borrow_mut();
            painter.session.set_tool(tool);
            dom::set_style(&painter.canvas, "cursor", tool.cursor());
            mark_active(&all, &target);
        })?;
    }

    for button in dom::query_all(&page.document, ".paint-action") {
        if button.get_attribute("data-action").as_deref() != Some("clear") {
            continue;
        }
        let painter = Rc::clone(&painter);
        dom::listen(&button, "click", move |_: MouseEvent| {
            let mut painter = painter.borrow_mut();
            let op = painter.session.clear();
            painter.apply(&[op]);
        })?;
    }

    {
        let painter = Rc::clone(&painter);
        dom::listen(&canvas, "mousedown", move |event: MouseEvent| {
            let mut painter = painter.borrow_mut();
            let point = painter.point(&event);
            let ops = painter.session.pointer_down(point);
            painter.apply(&ops);
            event.prevent_default();
        })?;
    }
    {
        let painter = Rc::clone(&painter);
        dom::listen(&canvas, "mousemove", move |event: MouseEvent| {
            let mut painter = painter.borrow_mut();
            if !painter.session.is_drawing() {
                return;
            }
            let point = painter.point(&event);
            let ops = painter.session.pointer_move(point);
            painter.apply(&ops);
        })?;
    }
    for name in ["mouseup", "mouseleave"] {
        let painter = Rc::clone(&painter);
        dom::listen(&canvas, name, move |_: MouseEvent| {
            let mut painter = painter.borrow_mut();
            let ops = painter.session.pointer_up();
            painter.apply(&ops);
        })?;
    }

    log::debug!("Paint surface {}x{}", canvas.width(), canvas.height());
    Ok(())
}
