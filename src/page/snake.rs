//! Snake chapter
//!
//! The game ticks only while its chapter is both in view and active, and only
//! the active chapter receives direction keys.

use std::cell::RefCell;
use std::rc::Rc;

use rand::Rng;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, Element, HtmlCanvasElement, KeyboardEvent};

use super::Page;
use crate::consts::SNAKE_THRESHOLD;
use crate::platform::{Interval, dom};
use crate::renderer::snake::board_size;
use crate::renderer::{context_2d, draw_snake_board};
use crate::sim::snake::TICK_MS;
use crate::sim::{ChapterEvent, ChapterFlag, ChapterKind, Direction, SnakeGame, TickOutcome};

struct Board {
    index: usize,
    ctx: CanvasRenderingContext2d,
    score: Option<Element>,
    game: SnakeGame,
    in_view: bool,
    ticker: Option<Interval>,
}

impl Board {
    fn draw(&self) {
        if let Err(err) = draw_snake_board(&self.ctx, &self.game) {
            log::warn!("Snake draw failed: {:?}", err);
        }
    }

    fn show_score(&self) {
        if let Some(score) = &self.score {
            dom::set_text(score, &format!("Score: {}", self.game.score()));
        }
    }

    fn tick(&mut self) {
        match self.game.tick() {
            TickOutcome::Moved => {}
            TickOutcome::Ate | TickOutcome::Reset => self.show_score(),
        }
        self.draw();
    }
}

type SharedBoard = Rc<RefCell<Board>>;

pub fn init_snake(page: &Rc<Page>) -> Result<(), JsValue> {
    if !page.settings.snake {
        return Ok(());
    }
    let Some(index) = page.find_kind(ChapterKind::Snake) else {
        return Ok(());
    };
    let Some(canvas) = dom::by_id(&page.document, "reflectionSnakeCanvas") else {
        return Ok(());
    };
    let Ok(canvas) = canvas.dyn_into::<HtmlCanvasElement>() else {
        return Ok(());
    };

    let (width, height) = board_size();
    canvas.set_width(width);
    canvas.set_height(height);

    let seed = page.with_rng(|rng| rng.random::<u64>());
    let board = Rc::new(RefCell::new(Board {
        index,
        ctx: context_2d(&canvas)?,
        score: dom::by_id(&page.document, "reflectionSnakeScore"),
        game: SnakeGame::new(seed),
        in_view: false,
        ticker: None,
    }));
    {
        let board = board.borrow();
        board.show_score();
        board.draw();
    }

    {
        let key_page = Rc::clone(page);
        let board = Rc::clone(&board);
        dom::listen(&page.window, "keydown", move |event: KeyboardEvent| {
            if !key_page.has(index, ChapterFlag::Active) {
                return;
            }
            if let Some(direction) = Direction::from_key(&event.key()) {
                event.prevent_default();
                board.borrow_mut().game.set_direction(direction);
            }
        })?;
    }

    {
        let weak = Rc::downgrade(page);
        let board = Rc::clone(&board);
        page.subscribe(move |event: &ChapterEvent| {
            if event.chapter != index || event.flag != ChapterFlag::Active {
                return;
            }
            if let Some(page) = weak.upgrade() {
                sync_loop(&page, &board);
            }
        });
    }

    let sensor_page = Rc::clone(page);
    page.watch_chapter(index, SNAKE_THRESHOLD, move |visible| {
        board.borrow_mut().in_view = visible;
        sync_loop(&sensor_page, &board);
    })
}

/// Run the ticker exactly while the board is playable
fn sync_loop(page: &Page, board: &SharedBoard) {
    let playable = {
        let board = board.borrow();
        board.in_view && page.has(board.index, ChapterFlag::Active)
    };
    let running = board.borrow().ticker.is_some();
    if playable == running {
        return;
    }

    if !playable {
        board.borrow_mut().ticker = None;
        log::debug!("Snake paused");
        return;
    }

    let weak = Rc::downgrade(board);
    let ticker = Interval::new(&page.window, TICK_MS, move || {
        if let Some(board) = weak.upgrade() {
            board.borrow_mut().tick();
        }
    });
    match ticker {
        Ok(ticker) => {
            board.borrow_mut().ticker = Some(ticker);
            log::debug!("Snake running");
        }
        Err(err) => log::warn!("Snake ticker not started: {:?}", err),
    }
}
