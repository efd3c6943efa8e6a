//! Collision detection and response for the coin pile
//!
//! Coins are circles. Neighbor queries go through a uniform spatial hash so a
//! full pass over a few hundred coins stays linear instead of quadratic.

use std::collections::HashMap;

use glam::Vec2;

use super::coins::{Coin, CoinWorld};

/// Spatial hash cell edge (px); larger than the biggest coin diameter
pub const HASH_CELL_SIZE: f32 = 96.0;
/// Near-inelastic coin-on-coin bounce
pub const RESTITUTION: f32 = 0.01;
/// Velocity damping applied to both coins after an impulse
pub const CONTACT_DAMPING: f32 = 0.94;
/// Separating speed above which a contact wakes sleeping coins (px/s)
pub const WAKE_SEPARATING_SPEED: f32 = 18.0;

/// Wall bounce keeps this fraction of horizontal speed
pub const WALL_BOUNCE: f32 = 0.35;
/// Floor bounce keeps this fraction of vertical speed
pub const FLOOR_BOUNCE: f32 = 0.04;
/// Floor friction on horizontal speed
pub const FLOOR_FRICTION: f32 = 0.84;
/// Below these speeds floor contact snaps velocity to zero so coins can sleep
pub const FLOOR_SNAP_VY: f32 = 10.0;
pub const FLOOR_SNAP_VX: f32 = 7.0;

/// Uniform grid of coin indices
#[derive(Debug, Default)]
pub struct SpatialHash {
    cell_size: f32,
    buckets: HashMap<(i32, i32), Vec<usize>>,
}

impl SpatialHash {
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size,
            buckets: HashMap::new(),
        }
    }

    /// Cell coordinate containing `pos`
    #[inline]
    pub fn cell_of(&self, pos: Vec2) -> (i32, i32) {
        (
            (pos.x / self.cell_size).floor() as i32,
            (pos.y / self.cell_size).floor() as i32,
        )
    }

    /// Re-bin every coin; buckets are reused between frames
    pub fn rebuild(&mut self, coins: &[Coin]) {
        for bucket in self.buckets.values_mut() {
            bucket.clear();
        }
        for (i, coin) in coins.iter().enumerate() {
            let cell = self.cell_of(coin.pos);
            self.buckets.entry(cell).or_default().push(i);
        }
    }

    /// Indices in the 3x3 block of cells around `cell`
    pub fn neighbors(&self, cell: (i32, i32)) -> impl Iterator<Item = usize> + '_ {
        (-1..=1)
            .flat_map(move |oy| (-1..=1).map(move |ox| (cell.0 + ox, cell.1 + oy)))
            .filter_map(|key| self.buckets.get(&key))
            .flat_map(|bucket| bucket.iter().copied())
    }

    /// Collect every unordered candidate pair `(i, j)` with `i < j`
    ///
    /// Cells are taken from the binning positions, so the pair list is stable
    /// for the whole pass even though coins move while it is resolved.
    pub fn candidate_pairs(&self, coins: &[Coin], out: &mut Vec<(usize, usize)>) {
        out.clear();
        for (i, coin) in coins.iter().enumerate() {
            let cell = self.cell_of(coin.pos);
            out.extend(self.neighbors(cell).filter(|&j| j > i).map(|j| (i, j)));
        }
    }
}

/// Borrow two distinct coins mutably
pub fn pair_mut(coins: &mut [Coin], i: usize, j: usize) -> (&mut Coin, &mut Coin) {
    debug_assert!(i < j);
    let (head, tail) = coins.split_at_mut(j);
    (&mut head[i], &mut tail[0])
}

/// How far two coins interpenetrate (px); zero when apart or touching
#[inline]
pub fn penetration(a: &Coin, b: &Coin) -> f32 {
    (a.radius + b.radius - (b.pos - a.pos).length()).max(0.0)
}

/// Separate two overlapping coins and apply an inelastic impulse
///
/// Each coin moves half the overlap along the contact normal; a dragged coin
/// stays pinned to the pointer. Returns true if the coins were touching.
pub fn resolve_pair(a: &mut Coin, b: &mut Coin) -> bool {
    let delta = b.pos - a.pos;
    let distance_sq = delta.length_squared();
    let min_distance = a.radius + b.radius;
    if distance_sq == 0.0 || distance_sq >= min_distance * min_distance {
        return false;
    }

    let distance = distance_sq.sqrt();
    let normal = delta / distance;
    let overlap = min_distance - distance;

    if !a.dragging {
        a.pos -= normal * overlap * 0.5;
    }
    if !b.dragging {
        b.pos += normal * overlap * 0.5;
    }

    let separating = (b.vel - a.vel).dot(normal);
    if separating > 0.0 {
        return true;
    }

    let impulse = -(1.0 + RESTITUTION) * separating * 0.5;
    if !a.dragging {
        a.vel -= normal * impulse;
        a.vel *= CONTACT_DAMPING;
    }
    if !b.dragging {
        b.vel += normal * impulse;
        b.vel *= CONTACT_DAMPING;
    }

    if separating.abs() > WAKE_SEPARATING_SPEED {
        a.wake();
        b.wake();
    }
    true
}

/// Clamp a coin into the world, reflecting off walls and settling on the floor
pub fn resolve_world_bounds(coin: &mut Coin, world: &CoinWorld) {
    if coin.pos.x - coin.radius < world.left {
        coin.pos.x = world.left + coin.radius;
        coin.vel.x *= -WALL_BOUNCE;
    } else if coin.pos.x + coin.radius > world.right {
        coin.pos.x = world.right - coin.radius;
        coin.vel.x *= -WALL_BOUNCE;
    }

    if coin.pos.y + coin.radius > world.floor {
        coin.pos.y = world.floor - coin.radius;
        coin.vel.y *= -FLOOR_BOUNCE;
        coin.vel.x *= FLOOR_FRICTION;
        if coin.vel.y.abs() < FLOOR_SNAP_VY {
            coin.vel.y = 0.0;
        }
        if coin.vel.x.abs() < FLOOR_SNAP_VX {
            coin.vel.x = 0.0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coin_at(x: f32, y: f32, radius: f32) -> Coin {
        Coin::at(0, Vec2::new(x, y), radius)
    }

    #[test]
    fn test_overlapping_pair_separates_to_contact() {
        let mut a = coin_at(100.0, 100.0, 15.0);
        let mut b = coin_at(110.0, 100.0, 15.0);

        assert!(resolve_pair(&mut a, &mut b));
        let distance = (b.pos - a.pos).length();
        assert!((distance - 30.0).abs() < 1e-3);
        // Symmetric split
        assert!((a.pos.x - 90.0).abs() < 1e-3);
        assert!((b.pos.x - 120.0).abs() < 1e-3);

        // Second pass finds them just touching and leaves positions alone
        let before = (a.pos, b.pos);
        resolve_pair(&mut a, &mut b);
        assert!((a.pos - before.0).length() < 1e-3);
        assert!((b.pos - before.1).length() < 1e-3);
    }

    #[test]
    fn test_dragged_coin_is_not_displaced() {
        let mut a = coin_at(100.0, 100.0, 15.0);
        let mut b = coin_at(110.0, 100.0, 15.0);
        a.dragging = true;
        b.vel = Vec2::new(-200.0, 0.0);

        resolve_pair(&mut a, &mut b);
        assert_eq!(a.pos, Vec2::new(100.0, 100.0));
        assert!(b.pos.x > 110.0);
    }

    #[test]
    fn test_penetration_depth() {
        let a = coin_at(100.0, 100.0, 15.0);
        assert!((penetration(&a, &coin_at(110.0, 100.0, 15.0)) - 20.0).abs() < 1e-4);
        assert_eq!(penetration(&a, &coin_at(130.0, 100.0, 15.0)), 0.0);
        assert_eq!(penetration(&a, &coin_at(180.0, 100.0, 15.0)), 0.0);
    }

    #[test]
    fn test_coincident_coins_are_skipped() {
        let mut a = coin_at(50.0, 50.0, 15.0);
        let mut b = coin_at(50.0, 50.0, 15.0);
        assert!(!resolve_pair(&mut a, &mut b));
    }

    #[test]
    fn test_hard_impact_wakes_sleepers() {
        let mut a = coin_at(100.0, 100.0, 15.0);
        let mut b = coin_at(100.0, 125.0, 15.0);
        b.sleeping = true;
        b.rest_frames = 20;
        a.vel = Vec2::new(0.0, 300.0);

        resolve_pair(&mut a, &mut b);
        assert!(!b.sleeping);
        assert_eq!(b.rest_frames, 0);
    }

    #[test]
    fn test_world_bounds_floor_snap() {
        let world = CoinWorld::new(680.0, 389.0);
        let mut coin = coin_at(200.0, world.floor, 15.0);
        coin.vel = Vec2::new(5.0, 120.0);

        resolve_world_bounds(&mut coin, &world);
        assert_eq!(coin.pos.y, world.floor - 15.0);
        // 120 * 0.04 = 4.8 < 10 and 5 * 0.84 < 7: both snap
        assert_eq!(coin.vel, Vec2::ZERO);
    }

    #[test]
    fn test_world_bounds_wall_reflects() {
        let world = CoinWorld::new(680.0, 389.0);
        let mut coin = coin_at(world.left, 100.0, 15.0);
        coin.vel = Vec2::new(-100.0, 0.0);

        resolve_world_bounds(&mut coin, &world);
        assert_eq!(coin.pos.x, world.left + 15.0);
        assert!((coin.vel.x - 35.0).abs() < 1e-3);
    }

    #[test]
    fn test_spatial_hash_pairs_neighbors_only() {
        let coins = vec![
            coin_at(10.0, 10.0, 15.0),
            coin_at(40.0, 10.0, 15.0),
            coin_at(600.0, 300.0, 15.0),
        ];
        let mut hash = SpatialHash::new(HASH_CELL_SIZE);
        hash.rebuild(&coins);
        let mut pairs = Vec::new();
        hash.candidate_pairs(&coins, &mut pairs);
        assert_eq!(pairs, vec![(0, 1)]);
    }
}
