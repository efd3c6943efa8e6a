//! Canvas 2D rendering for the interactive chapters
//!
//! Each chapter owns its canvas and context; drawing is immediate mode and
//! reads simulation state directly.

pub mod coins;
pub mod paint;
pub mod snake;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

pub use coins::draw_coin_rain;
pub use paint::PaintCanvas;
pub use snake::draw_snake_board;

/// The canvas's 2D context
pub fn context_2d(canvas: &HtmlCanvasElement) -> Result<CanvasRenderingContext2d, JsValue> {
    canvas
        .get_context("2d")?
        .ok_or_else(|| JsValue::from_str("2d context unavailable"))?
        .dyn_into::<CanvasRenderingContext2d>()
        .map_err(JsValue::from)
}
