//! Snake mini-game
//!
//! Fixed-tick grid game on a wrapping (toroidal) board. Running into yourself
//! restarts the round immediately; there is no game-over screen.

use std::collections::VecDeque;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

/// Board size in cells
pub const COLS: i32 = 40;
pub const ROWS: i32 = 24;
/// Cell edge on the canvas (px)
pub const CELL_PX: i32 = 18;
/// Tick period (ms)
pub const TICK_MS: u32 = 120;
/// Food placement gives up after this many random probes
pub const FOOD_ATTEMPTS: u32 = 500;
/// Used when every probe landed on the snake
pub const FALLBACK_FOOD: GridPos = GridPos { x: 2, y: 2 };

/// A board cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridPos {
    pub x: i32,
    pub y: i32,
}

impl GridPos {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Step one cell in `dir`, wrapping on both axes
    pub fn step(self, dir: Direction) -> Self {
        let (dx, dy) = dir.delta();
        Self {
            x: (self.x + dx).rem_euclid(COLS),
            y: (self.y + dy).rem_euclid(ROWS),
        }
    }
}

/// Heading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    /// Arrow keys or WASD (case-insensitive)
    pub fn from_key(key: &str) -> Option<Self> {
        match key.to_lowercase().as_str() {
            "arrowup" | "w" => Some(Direction::Up),
            "arrowdown" | "s" => Some(Direction::Down),
            "arrowleft" | "a" => Some(Direction::Left),
            "arrowright" | "d" => Some(Direction::Right),
            _ => None,
        }
    }
}

/// What a tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Moved,
    Ate,
    /// Head hit the body; the round restarted
    Reset,
}

/// Snake state
#[derive(Debug, Clone)]
pub struct SnakeGame {
    /// Head first
    body: VecDeque<GridPos>,
    direction: Direction,
    pending: Direction,
    food: GridPos,
    score: u32,
    rng: Pcg32,
}

impl SnakeGame {
    pub fn new(seed: u64) -> Self {
        let mut game = Self {
            body: VecDeque::new(),
            direction: Direction::Right,
            pending: Direction::Right,
            food: GridPos::new(30, 6),
            score: 0,
            rng: Pcg32::seed_from_u64(seed),
        };
        game.reset();
        game
    }

    /// Fresh 4-segment snake heading right, score zero, new food
    pub fn reset(&mut self) {
        self.body = [(7, 12), (6, 12), (5, 12), (4, 12)]
            .into_iter()
            .map(|(x, y)| GridPos::new(x, y))
            .collect();
        self.direction = Direction::Right;
        self.pending = Direction::Right;
        self.score = 0;
        self.food = self.random_food();
    }

    pub fn body(&self) -> impl ExactSizeIterator<Item = &GridPos> {
        self.body.iter()
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    pub fn head(&self) -> Option<GridPos> {
        self.body.front().copied()
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn pending_direction(&self) -> Direction {
        self.pending
    }

    pub fn food(&self) -> GridPos {
        self.food
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    /// Queue a turn for the next tick; a straight reversal is refused
    pub fn set_direction(&mut self, dir: Direction) -> bool {
        if dir == self.direction.opposite() {
            return false;
        }
        self.pending = dir;
        true
    }

    /// Advance one tick
    pub fn tick(&mut self) -> TickOutcome {
        self.direction = self.pending;
        let Some(head) = self.head() else {
            self.reset();
            return TickOutcome::Reset;
        };
        let next = head.step(self.direction);

        // The tail still counts here: it only moves after the check
        if self.body.contains(&next) {
            self.reset();
            return TickOutcome::Reset;
        }

        self.body.push_front(next);
        if next == self.food {
            self.score += 1;
            self.food = self.random_food();
            TickOutcome::Ate
        } else {
            self.body.pop_back();
            TickOutcome::Moved
        }
    }

    fn random_food(&mut self) -> GridPos {
        for _ in 0..FOOD_ATTEMPTS {
            let candidate = GridPos::new(self.rng.random_range(0..COLS), self.rng.random_range(0..ROWS));
            if !self.body.contains(&candidate) {
                return candidate;
            }
        }
        FALLBACK_FOOD
    }
}
