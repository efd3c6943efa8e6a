//! Snake board drawing

use std::f64::consts::TAU;

use wasm_bindgen::prelude::*;
use web_sys::CanvasRenderingContext2d;

use crate::sim::snake::{CELL_PX, COLS, ROWS};
use crate::sim::SnakeGame;

const BOARD: &str = "#f7fafc";
const GRID_LINE: &str = "rgba(42, 46, 49, 0.08)";
const FOOD: &str = "#e87a2f";
const HEAD: &str = "#1d5f9e";
const BODY: &str = "#2f7bc0";

/// Board size in pixels
pub fn board_size() -> (u32, u32) {
    ((COLS * CELL_PX) as u32, (ROWS * CELL_PX) as u32)
}

pub fn draw_snake_board(ctx: &CanvasRenderingContext2d, game: &SnakeGame) -> Result<(), JsValue> {
    let cell = CELL_PX as f64;
    let (width, height) = board_size();
    let (width, height) = (width as f64, height as f64);

    ctx.set_fill_style_str(BOARD);
    ctx.fill_rect(0.0, 0.0, width, height);
    ctx.set_stroke_style_str(GRID_LINE);
    ctx.set_line_width(1.0);
    for x in 0..=COLS {
        let px = x as f64 * cell + 0.5;
        ctx.begin_path();
        ctx.move_to(px, 0.0);
        ctx.line_to(px, height);
        ctx.stroke();
    }
    for y in 0..=ROWS {
        let py = y as f64 * cell + 0.5;
        ctx.begin_path();
        ctx.move_to(0.0, py);
        ctx.line_to(width, py);
        ctx.stroke();
    }

    let food = game.food();
    ctx.set_fill_style_str(FOOD);
    ctx.begin_path();
    ctx.arc(
        food.x as f64 * cell + cell / 2.0,
        food.y as f64 * cell + cell / 2.0,
        cell * 0.32,
        0.0,
        TAU,
    )?;
    ctx.fill();

    for (index, segment) in game.body().enumerate() {
        ctx.set_fill_style_str(if index == 0 { HEAD } else { BODY });
        ctx.fill_rect(
            segment.x as f64 * cell + 1.0,
            segment.y as f64 * cell + 1.0,
            cell - 2.0,
            cell - 2.0,
        );
    }
    Ok(())
}
