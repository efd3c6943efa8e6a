//! Coin rain drawing

use std::f64::consts::TAU;

use wasm_bindgen::prelude::*;
use web_sys::CanvasRenderingContext2d;

use crate::sim::{Coin, CoinRain};

const BACKGROUND: &str = "#11161c";
const EDGE_STOPS: [(f32, &str); 3] = [(0.0, "#8b7a4a"), (0.55, "#aa9660"), (1.0, "#6f5f36")];
const HIGHLIGHT: &str = "rgba(189, 174, 134, 0.22)";
const GLYPH: &str = "#4f4531";

/// Clear to the backdrop and draw every coin
pub fn draw_coin_rain(ctx: &CanvasRenderingContext2d, rain: &CoinRain) -> Result<(), JsValue> {
    let world = rain.world();
    let (width, height) = (world.width as f64, world.height as f64);
    ctx.clear_rect(0.0, 0.0, width, height);
    ctx.set_fill_style_str(BACKGROUND);
    ctx.fill_rect(0.0, 0.0, width, height);

    for coin in rain.coins() {
        draw_coin(ctx, coin)?;
    }
    Ok(())
}

fn draw_coin(ctx: &CanvasRenderingContext2d, coin: &Coin) -> Result<(), JsValue> {
    let r = coin.radius as f64;
    ctx.save();
    ctx.translate(coin.pos.x as f64, coin.pos.y as f64)?;
    ctx.rotate(coin.rotation as f64)?;

    let edge = ctx.create_linear_gradient(-r, -r, r, r);
    for (offset, color) in EDGE_STOPS {
        edge.add_color_stop(offset, color)?;
    }
    ctx.set_fill_style_canvas_gradient(&edge);
    ctx.begin_path();
    ctx.arc(0.0, 0.0, r, 0.0, TAU)?;
    ctx.fill();

    ctx.set_fill_style_str(HIGHLIGHT);
    ctx.begin_path();
    ctx.arc(-r * 0.28, -r * 0.24, r * 0.38, 0.0, TAU)?;
    ctx.fill();

    ctx.set_fill_style_str(GLYPH);
    ctx.set_font(&format!("700 {}px \"Segoe UI\", sans-serif", (r * 1.05).round()));
    ctx.set_text_align("center");
    ctx.set_text_baseline("middle");
    ctx.fill_text("$", 0.0, 1.0)?;

    ctx.restore();
    Ok(())
}
