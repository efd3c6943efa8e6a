//! Coin rain simulation
//!
//! Coins pour out of a chute above the canvas, pile up on the floor and can be
//! grabbed and thrown with the pointer. Stepped once per animation frame with
//! the real frame time (capped); the population is bounded by canvas area.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::collision::{HASH_CELL_SIZE, SpatialHash, pair_mut, penetration, resolve_pair, resolve_world_bounds};

/// Longest step integrated in one frame (s); avoids blow-ups after tab resume
pub const MAX_STEP_SECONDS: f32 = 0.032;

/// Coin radius range (px)
pub const MIN_COIN_RADIUS: f32 = 13.5;
pub const COIN_RADIUS_SPREAD: f32 = 6.0;

/// Spawn interval starts here and shrinks by `SPAWN_RAMP_MS` per second in view
pub const SPAWN_INTERVAL_START_MS: f32 = 720.0;
pub const SPAWN_RAMP_MS: f32 = 120.0;
pub const SPAWN_INTERVAL_FLOOR_MS: f32 = 30.0;

/// Gravity ramps from `GRAVITY_START` by `GRAVITY_RAMP` per second to `GRAVITY_MAX` (px/s²)
pub const GRAVITY_START: f32 = 240.0;
pub const GRAVITY_RAMP: f32 = 38.0;
pub const GRAVITY_MAX: f32 = 860.0;

/// Per-step damping
pub const AIR_DAMPING: f32 = 0.994;
pub const SPIN_DAMPING: f32 = 0.98;

/// Collision passes per step: always `RESOLVE_PASSES`, then more until the
/// deepest overlap found in a pass is under `OVERLAP_TOLERANCE` (px)
pub const RESOLVE_PASSES: usize = 2;
pub const MAX_RESOLVE_PASSES: usize = 24;
pub const OVERLAP_TOLERANCE: f32 = 0.5;

/// Sleep bookkeeping
pub const REST_SPEED: f32 = 16.0;
pub const WAKE_SPEED: f32 = 24.0;
pub const REST_FRAMES_TO_SLEEP: u32 = 12;
pub const FLOOR_CONTACT_EPSILON: f32 = 1.5;

/// Population bounds derived from canvas area
pub const MIN_MAX_COINS: usize = 186;
pub const MAX_MAX_COINS: usize = 320;
pub const AREA_PER_COIN: f32 = 2250.0;

/// Canvas never drops below this width; height follows a 14:8 aspect
pub const MIN_CANVAS_WIDTH: f32 = 680.0;

/// Pointer deltas are converted to throw velocity assuming one 60 Hz frame
const DRAG_SAMPLE_SECONDS: f32 = 0.016;

/// A single coin
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Coin {
    pub id: u32,
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub rotation: f32,
    pub spin: f32,
    pub dragging: bool,
    pub sleeping: bool,
    pub rest_frames: u32,
}

impl Coin {
    /// A coin at rest at `pos`
    pub fn at(id: u32, pos: Vec2, radius: f32) -> Self {
        Self {
            id,
            pos,
            vel: Vec2::ZERO,
            radius,
            rotation: 0.0,
            spin: 0.0,
            dragging: false,
            sleeping: false,
            rest_frames: 0,
        }
    }

    /// Clear sleep state so the coin integrates again
    #[inline]
    pub fn wake(&mut self) {
        self.sleeping = false;
        self.rest_frames = 0;
    }

    /// Whether `point` lies on the coin face
    #[inline]
    pub fn contains(&self, point: Vec2) -> bool {
        (point - self.pos).length_squared() <= self.radius * self.radius
    }
}

/// Playfield bounds in canvas pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoinWorld {
    pub width: f32,
    pub height: f32,
    pub floor: f32,
    pub left: f32,
    pub right: f32,
}

impl CoinWorld {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            floor: height - 6.0,
            left: 8.0,
            right: width - 8.0,
        }
    }
}

/// Canvas backing size for a shell of the given CSS width
pub fn canvas_size_for_shell(shell_width: f32) -> (u32, u32) {
    let width = shell_width.round().max(MIN_CANVAS_WIDTH);
    let height = (width * (8.0 / 14.0)).round();
    (width as u32, height as u32)
}

/// Population cap for a canvas
pub fn max_coins_for(width: f32, height: f32) -> usize {
    let by_area = ((width * height) / AREA_PER_COIN).floor() as usize;
    by_area.clamp(MIN_MAX_COINS, MAX_MAX_COINS)
}

#[derive(Debug, Clone, Copy)]
struct Drag {
    coin_id: u32,
    pointer_id: i32,
    prev: Vec2,
}

/// The whole simulation
#[derive(Debug)]
pub struct CoinRain {
    world: CoinWorld,
    coins: Vec<Coin>,
    max_coins: usize,
    elapsed_seconds: f32,
    spawn_accumulator_ms: f32,
    drag: Option<Drag>,
    rng: Pcg32,
    next_id: u32,
    hash: SpatialHash,
    pairs: Vec<(usize, usize)>,
}

impl CoinRain {
    /// Create an empty simulation for a canvas of the given size
    pub fn new(width: f32, height: f32, seed: u64) -> Self {
        Self {
            world: CoinWorld::new(width, height),
            coins: Vec::new(),
            max_coins: max_coins_for(width, height),
            elapsed_seconds: 0.0,
            spawn_accumulator_ms: 0.0,
            drag: None,
            rng: Pcg32::seed_from_u64(seed),
            next_id: 1,
            hash: SpatialHash::new(HASH_CELL_SIZE),
            pairs: Vec::new(),
        }
    }

    pub fn world(&self) -> &CoinWorld {
        &self.world
    }

    pub fn coins(&self) -> &[Coin] {
        &self.coins
    }

    pub fn max_coins(&self) -> usize {
        self.max_coins
    }

    pub fn elapsed_seconds(&self) -> f32 {
        self.elapsed_seconds
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Canvas changed size; the cap follows the new area
    pub fn resize(&mut self, width: f32, height: f32) {
        self.world = CoinWorld::new(width, height);
        self.max_coins = max_coins_for(width, height);
    }

    /// Drop every coin and restart the clock (chapter left view)
    pub fn reset(&mut self) {
        self.coins.clear();
        self.drag = None;
        self.spawn_accumulator_ms = 0.0;
        self.elapsed_seconds = 0.0;
    }

    /// Current spawn interval (ms)
    pub fn spawn_interval_ms(&self) -> f32 {
        (SPAWN_INTERVAL_START_MS - self.elapsed_seconds * SPAWN_RAMP_MS).max(SPAWN_INTERVAL_FLOOR_MS)
    }

    /// Current gravity (px/s²)
    pub fn gravity(&self) -> f32 {
        (GRAVITY_START + self.elapsed_seconds * GRAVITY_RAMP).min(GRAVITY_MAX)
    }

    /// Advance by one animation frame of `frame_seconds` real time
    pub fn advance(&mut self, frame_seconds: f32) {
        let dt = frame_seconds.clamp(0.0, MAX_STEP_SECONDS);
        self.elapsed_seconds += dt;
        self.step(dt);
    }

    fn step(&mut self, dt: f32) {
        self.spawn_due(dt);
        self.integrate(dt);
        self.settle();
        self.update_rest_state();
    }

    /// Run collision passes until the pile stops interpenetrating; returns the pass count
    fn settle(&mut self) -> usize {
        let mut passes = 0;
        while passes < MAX_RESOLVE_PASSES {
            let deepest = self.resolve_collisions();
            for coin in &mut self.coins {
                resolve_world_bounds(coin, &self.world);
            }
            passes += 1;
            if passes >= RESOLVE_PASSES && deepest < OVERLAP_TOLERANCE {
                break;
            }
        }
        passes
    }

    fn spawn_due(&mut self, dt: f32) {
        self.spawn_accumulator_ms += dt * 1000.0;
        let interval = self.spawn_interval_ms();
        while self.spawn_accumulator_ms >= interval && self.coins.len() < self.max_coins {
            self.spawn_accumulator_ms -= interval;
            let coin = self.create_coin();
            self.coins.push(coin);
        }
    }

    fn create_coin(&mut self) -> Coin {
        let width = self.world.width;
        let radius = MIN_COIN_RADIUS + self.rng.random::<f32>() * COIN_RADIUS_SPREAD;
        let chute_half_width = (width * 0.075).max(26.0);
        let jitter = self.rng.random::<f32>() * 2.0 - 1.0;
        let x = crate::clamp_f32(
            width * 0.5 + jitter * chute_half_width,
            radius + 8.0,
            width - radius - 8.0,
        );
        let y = -20.0 - self.rng.random::<f32>() * 32.0;

        let id = self.next_id;
        self.next_id += 1;
        Coin {
            id,
            pos: Vec2::new(x, y),
            vel: Vec2::new((self.rng.random::<f32>() - 0.5) * 20.0, 0.0),
            radius,
            rotation: self.rng.random::<f32>() * std::f32::consts::TAU,
            spin: (self.rng.random::<f32>() - 0.5) * 1.5,
            dragging: false,
            sleeping: false,
            rest_frames: 0,
        }
    }

    fn integrate(&mut self, dt: f32) {
        let gravity = self.gravity();
        for coin in &mut self.coins {
            if coin.dragging || coin.sleeping {
                continue;
            }
            coin.vel.y += gravity * dt;
            coin.pos += coin.vel * dt;
            coin.rotation += coin.spin * dt;
            coin.vel.x *= AIR_DAMPING;
            coin.spin *= SPIN_DAMPING;
            resolve_world_bounds(coin, &self.world);
        }
    }

    /// One pass over every candidate pair; returns the deepest overlap it corrected
    fn resolve_collisions(&mut self) -> f32 {
        self.hash.rebuild(&self.coins);
        self.hash.candidate_pairs(&self.coins, &mut self.pairs);
        let mut deepest = 0.0f32;
        for &(i, j) in &self.pairs {
            let (a, b) = pair_mut(&mut self.coins, i, j);
            if !a.dragging && !b.dragging {
                deepest = deepest.max(penetration(a, b));
            }
            resolve_pair(a, b);
        }
        deepest
    }

    fn update_rest_state(&mut self) {
        let floor = self.world.floor;
        for coin in &mut self.coins {
            if coin.dragging {
                continue;
            }
            let touching_floor = (coin.pos.y + coin.radius - floor).abs() < FLOOR_CONTACT_EPSILON;
            let speed = coin.vel.length();
            if touching_floor && speed < REST_SPEED {
                coin.rest_frames += 1;
                if coin.rest_frames > REST_FRAMES_TO_SLEEP {
                    coin.sleeping = true;
                    coin.vel = Vec2::ZERO;
                    coin.spin = 0.0;
                }
            } else {
                coin.rest_frames = 0;
                if speed > WAKE_SPEED {
                    coin.sleeping = false;
                }
            }
        }
    }

    // === Pointer interaction ===

    /// Try to grab the top-most coin under `point`; returns true on a hit
    pub fn pointer_down(&mut self, pointer_id: i32, point: Vec2) -> bool {
        if self.drag.is_some() {
            return false;
        }
        // Newest coins draw last, so search from the end
        let Some(coin) = self.coins.iter_mut().rev().find(|c| c.contains(point)) else {
            return false;
        };
        coin.dragging = true;
        coin.wake();
        self.drag = Some(Drag {
            coin_id: coin.id,
            pointer_id,
            prev: point,
        });
        true
    }

    /// Move the grabbed coin; velocity tracks the pointer for a throw on release
    pub fn pointer_move(&mut self, pointer_id: i32, point: Vec2) {
        let Some(drag) = self.drag.as_mut() else {
            return;
        };
        if drag.pointer_id != pointer_id {
            return;
        }
        let prev = drag.prev;
        drag.prev = point;
        let coin_id = drag.coin_id;
        if let Some(coin) = self.coins.iter_mut().find(|c| c.id == coin_id) {
            coin.vel = (point - prev) / DRAG_SAMPLE_SECONDS;
            coin.pos = point;
        }
    }

    /// Release the grabbed coin; returns true if this pointer held one
    pub fn pointer_up(&mut self, pointer_id: i32) -> bool {
        match self.drag {
            Some(drag) if drag.pointer_id == pointer_id => {
                if let Some(coin) = self.coins.iter_mut().find(|c| c.id == drag.coin_id) {
                    coin.dragging = false;
                    coin.wake();
                }
                self.drag = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_rain() -> CoinRain {
        CoinRain::new(680.0, 389.0, 7)
    }

    #[test]
    fn test_canvas_size_and_cap() {
        assert_eq!(canvas_size_for_shell(400.0), (680, 389));
        assert_eq!(canvas_size_for_shell(1120.0), (1120, 640));
        assert_eq!(max_coins_for(680.0, 389.0), MIN_MAX_COINS);
        assert_eq!(max_coins_for(1120.0, 640.0), 318);
        assert_eq!(max_coins_for(2000.0, 1143.0), MAX_MAX_COINS);
    }

    #[test]
    fn test_ramps() {
        let mut rain = small_rain();
        assert_eq!(rain.spawn_interval_ms(), 720.0);
        assert_eq!(rain.gravity(), 240.0);
        rain.elapsed_seconds = 10.0;
        assert_eq!(rain.spawn_interval_ms(), SPAWN_INTERVAL_FLOOR_MS);
        assert_eq!(rain.gravity(), 620.0);
        rain.elapsed_seconds = 60.0;
        assert_eq!(rain.gravity(), GRAVITY_MAX);
    }

    #[test]
    fn test_first_coin_after_start_interval() {
        let mut rain = small_rain();
        // The interval shrinks while time accumulates: 20 frames = 640ms vs ~643ms
        for _ in 0..20 {
            rain.advance(0.032);
        }
        assert!(rain.coins().is_empty());
        // 672ms vs ~639ms
        rain.advance(0.032);
        assert_eq!(rain.coins().len(), 1);
        let coin = &rain.coins()[0];
        assert!(coin.radius >= MIN_COIN_RADIUS && coin.radius <= MIN_COIN_RADIUS + COIN_RADIUS_SPREAD);
    }

    #[test]
    fn test_long_frames_are_capped() {
        let mut rain = small_rain();
        rain.advance(5.0);
        assert!((rain.elapsed_seconds() - MAX_STEP_SECONDS).abs() < 1e-6);
        rain.advance(-1.0);
        assert!((rain.elapsed_seconds() - MAX_STEP_SECONDS).abs() < 1e-6);
    }

    #[test]
    fn test_lone_coin_falls_asleep_on_floor() {
        let mut rain = small_rain();
        rain.coins.push(Coin::at(99, Vec2::new(300.0, 40.0), 15.0));
        for _ in 0..300 {
            rain.integrate(0.016);
            rain.resolve_collisions();
            rain.update_rest_state();
        }
        let coin = &rain.coins[0];
        assert!(coin.sleeping);
        assert_eq!(coin.vel, Vec2::ZERO);
        assert!((coin.pos.y + coin.radius - rain.world.floor).abs() < FLOOR_CONTACT_EPSILON);

        // Sleeping coins ignore gravity
        let y = coin.pos.y;
        rain.integrate(0.016);
        assert_eq!(rain.coins[0].pos.y, y);
    }

    #[test]
    fn test_stacked_column_settles_without_overlap() {
        let mut rain = small_rain();
        let floor = rain.world.floor;
        // Ten coins squeezed to half their spacing above the floor
        for i in 0..10 {
            let y = floor - 15.0 - i as f32 * 15.0;
            rain.coins.push(Coin::at(i, Vec2::new(340.0 + (i % 2) as f32 * 0.5, y), 15.0));
        }
        let passes = rain.settle();
        assert!(passes > RESOLVE_PASSES);
        assert!(passes <= MAX_RESOLVE_PASSES);

        let passes = rain.settle();
        assert_eq!(passes, RESOLVE_PASSES);
        for i in 0..rain.coins.len() {
            for j in i + 1..rain.coins.len() {
                assert!(penetration(&rain.coins[i], &rain.coins[j]) < OVERLAP_TOLERANCE);
            }
        }
    }

    #[test]
    fn test_drag_picks_newest_coin_and_throws() {
        let mut rain = small_rain();
        rain.coins.push(Coin::at(1, Vec2::new(200.0, 200.0), 15.0));
        rain.coins.push(Coin::at(2, Vec2::new(205.0, 200.0), 15.0));

        assert!(rain.pointer_down(3, Vec2::new(203.0, 200.0)));
        assert!(rain.coins[1].dragging);
        assert!(!rain.coins[0].dragging);
        // Second pointer cannot steal the drag
        assert!(!rain.pointer_down(4, Vec2::new(200.0, 200.0)));

        rain.pointer_move(3, Vec2::new(211.0, 196.0));
        let dragged = &rain.coins[1];
        assert_eq!(dragged.pos, Vec2::new(211.0, 196.0));
        assert!((dragged.vel.x - 500.0).abs() < 1e-2);
        assert!((dragged.vel.y + 250.0).abs() < 1e-2);

        // Gravity does not touch a held coin
        rain.integrate(0.016);
        assert_eq!(rain.coins[1].pos, Vec2::new(211.0, 196.0));

        assert!(!rain.pointer_up(4));
        assert!(rain.pointer_up(3));
        assert!(!rain.coins[1].dragging);
        assert!(!rain.is_dragging());
    }

    #[test]
    fn test_pointer_miss() {
        let mut rain = small_rain();
        rain.coins.push(Coin::at(1, Vec2::new(200.0, 200.0), 15.0));
        assert!(!rain.pointer_down(1, Vec2::new(260.0, 200.0)));
        assert!(!rain.is_dragging());
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut rain = small_rain();
        for _ in 0..200 {
            rain.advance(0.032);
        }
        assert!(!rain.coins().is_empty());
        rain.reset();
        assert!(rain.coins().is_empty());
        assert_eq!(rain.elapsed_seconds(), 0.0);
        assert_eq!(rain.spawn_interval_ms(), SPAWN_INTERVAL_START_MS);
    }
}
