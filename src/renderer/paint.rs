//! Paint canvas
//!
//! Applies `PaintOp`s from the session to the real canvas. Flood fill round
//! trips the pixels through a `Raster`.

use std::f64::consts::TAU;

use wasm_bindgen::Clamped;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, ImageData};

use crate::sim::{PaintOp, Raster, Rgba, ShapeOutline, flood_fill};

pub struct PaintCanvas {
    ctx: CanvasRenderingContext2d,
    width: u32,
    height: u32,
    snapshot: Option<ImageData>,
}

impl PaintCanvas {
    /// Wrap `ctx` and paint it white
    pub fn new(ctx: CanvasRenderingContext2d, width: u32, height: u32) -> Self {
        ctx.set_line_join("round");
        ctx.set_line_cap("round");
        let canvas = Self {
            ctx,
            width,
            height,
            snapshot: None,
        };
        canvas.clear();
        canvas
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn apply(&mut self, op: &PaintOp) -> Result<(), JsValue> {
        match op {
            PaintOp::Stroke { from, to, color, width } => {
                self.ctx.set_stroke_style_str(&color.to_css());
                self.ctx.set_line_width(*width as f64);
                self.ctx.begin_path();
                self.ctx.move_to(from.x as f64, from.y as f64);
                self.ctx.line_to(to.x as f64, to.y as f64);
                self.ctx.stroke();
            }
            PaintOp::Dots { points, size, color } => {
                self.ctx.set_fill_style_str(&color.to_css());
                let size = *size as f64;
                for point in points {
                    self.ctx.fill_rect(point.x as f64, point.y as f64, size, size);
                }
            }
            PaintOp::Snapshot => {
                self.snapshot = Some(self.read_pixels()?);
            }
            PaintOp::Preview { shape, color, width } => {
                let Some(snapshot) = &self.snapshot else {
                    return Ok(());
                };
                self.ctx.put_image_data(snapshot, 0.0, 0.0)?;
                self.ctx.set_stroke_style_str(&color.to_css());
                self.ctx.set_line_width(*width as f64);
                self.ctx.begin_path();
                match *shape {
                    ShapeOutline::Line { from, to } => {
                        self.ctx.move_to(from.x as f64, from.y as f64);
                        self.ctx.line_to(to.x as f64, to.y as f64);
                    }
                    ShapeOutline::Ellipse { center, radii } => {
                        self.ctx.ellipse(
                            center.x as f64,
                            center.y as f64,
                            radii.x as f64,
                            radii.y as f64,
                            0.0,
                            0.0,
                            TAU,
                        )?;
                    }
                }
                self.ctx.stroke();
            }
            PaintOp::ReleaseSnapshot => {
                self.snapshot = None;
            }
            PaintOp::Fill { at, color } => {
                self.fill(*at, *color)?;
            }
            PaintOp::Clear => {
                self.snapshot = None;
                self.clear();
            }
        }
        Ok(())
    }

    fn clear(&self) {
        let (width, height) = (self.width as f64, self.height as f64);
        self.ctx.clear_rect(0.0, 0.0, width, height);
        self.ctx.set_fill_style_str(&Rgba::WHITE.to_css());
        self.ctx.fill_rect(0.0, 0.0, width, height);
    }

    fn read_pixels(&self) -> Result<ImageData, JsValue> {
        self.ctx
            .get_image_data(0.0, 0.0, self.width as f64, self.height as f64)
    }

    fn fill(&self, at: glam::Vec2, color: Rgba) -> Result<(), JsValue> {
        let image = self.read_pixels()?;
        let Some(mut raster) = Raster::from_rgba(self.width as usize, self.height as usize, image.data().0)
        else {
            return Ok(());
        };
        if flood_fill(&mut raster, at, color) == 0 {
            return Ok(());
        }
        let data = raster.into_data();
        let filled = ImageData::new_with_u8_clamped_array_and_sh(Clamped(&data), self.width, self.height)?;
        self.ctx.put_image_data(&filled, 0.0, 0.0)
    }
}
