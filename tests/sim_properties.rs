//! Property tests for the page logic

use glam::Vec2;
use pigeon_manifesto::sim::coins::{COIN_RADIUS_SPREAD, MIN_COIN_RADIUS};
use pigeon_manifesto::sim::cta::GLOBAL_BEAT_MS;
use pigeon_manifesto::sim::{
    Cadence, Chapter, ChapterCounts, ChapterFlag, ChapterKind, ChapterStore, Coin, CoinRain, CtaPoll, CtaReadiness, Direction,
    PassOptions, Raster, Rgba, SnakeGame, TickOutcome, TypedLine, TypingPass, TypingStep, flood_fill, penetration,
    resolve_pair,
};
use proptest::prelude::*;
use rand::SeedableRng;
use rand_pcg::Pcg32;

fn store(len: usize) -> ChapterStore {
    ChapterStore::new(
        (0..len)
            .map(|i| Chapter::new(i, ChapterKind::Plain, 1, ChapterCounts::default()))
            .collect(),
    )
}

/// Deepest overlap between any two coins not held by the pointer
fn deepest_overlap(rain: &CoinRain) -> f32 {
    let coins = rain.coins();
    let mut deepest = 0.0f32;
    for (i, a) in coins.iter().enumerate() {
        for b in &coins[i + 1..] {
            if !a.dragging && !b.dragging {
                deepest = deepest.max(penetration(a, b));
            }
        }
    }
    deepest
}

#[test]
fn settled_pile_keeps_coins_apart() {
    for seed in [1, 7, 42] {
        let mut rain = CoinRain::new(680.0, 389.0, seed);
        for frame in 0..1200 {
            rain.advance(1.0 / 60.0);
            // Last second of a full pile
            if frame >= 1140 {
                let deepest = deepest_overlap(&rain);
                assert!(deepest < 1.5, "seed {seed} frame {frame}: overlap {deepest}");
            }
        }
        assert_eq!(rain.coins().len(), rain.max_coins());
    }
}

fn direction() -> impl Strategy<Value = Direction> {
    prop_oneof![
        Just(Direction::Up),
        Just(Direction::Down),
        Just(Direction::Left),
        Just(Direction::Right),
    ]
}

proptest! {
    #[test]
    fn typed_text_only_grows_and_ends_complete(
        texts in prop::collection::vec("[a-zA-Z .,!?é]{0,24}", 1..5),
        seed in any::<u64>(),
    ) {
        let lines = texts.iter().map(|t| TypedLine::new(t.as_str(), Cadence::Default)).collect();
        let mut pass = TypingPass::new(lines, PassOptions::default());
        let mut rng = Pcg32::seed_from_u64(seed);
        let mut lengths = vec![0usize; texts.len()];

        let budget: usize = texts.iter().map(|t| t.chars().count() + 1).sum();
        for _ in 0..=budget {
            if pass.step(&mut rng) == TypingStep::Finished {
                break;
            }
            for (i, line) in pass.lines().iter().enumerate() {
                let len = line.visible().chars().count();
                prop_assert!(len >= lengths[i]);
                prop_assert!(line.text().starts_with(line.visible()));
                lengths[i] = len;
            }
        }

        prop_assert!(pass.is_done());
        for (line, text) in pass.lines().iter().zip(&texts) {
            prop_assert_eq!(line.visible(), text.as_str());
        }
    }

    #[test]
    fn at_most_one_chapter_is_active(
        len in 1usize..12,
        picks in prop::collection::vec(any::<prop::sample::Index>(), 1..30),
    ) {
        let mut chapters = store(len);
        for pick in &picks {
            let index = pick.index(len);
            chapters.set_active(index);
            let active: Vec<usize> = (0..len)
                .filter(|&i| chapters.has(i, ChapterFlag::Active))
                .collect();
            prop_assert_eq!(active, vec![index]);
            prop_assert_eq!(chapters.active_index(), Some(index));
        }
    }

    #[test]
    fn overlapping_coins_end_at_contact(
        ax in 0.0f32..60.0,
        ay in 0.0f32..60.0,
        bx in 0.0f32..60.0,
        by in 0.0f32..60.0,
        ra in 0.0f32..1.0,
        rb in 0.0f32..1.0,
    ) {
        let ra = MIN_COIN_RADIUS + ra * COIN_RADIUS_SPREAD;
        let rb = MIN_COIN_RADIUS + rb * COIN_RADIUS_SPREAD;
        let mut a = Coin::at(1, Vec2::new(ax, ay), ra);
        let mut b = Coin::at(2, Vec2::new(bx, by), rb);
        let distance = (b.pos - a.pos).length();
        prop_assume!(distance > 0.5 && distance < ra + rb);

        prop_assert!(resolve_pair(&mut a, &mut b));
        let after = (b.pos - a.pos).length();
        prop_assert!((after - (ra + rb)).abs() < 1e-2, "distance {} radii {}", after, ra + rb);
    }

    #[test]
    fn coin_population_respects_cap(
        width in 120.0f32..900.0,
        height in 120.0f32..600.0,
        seed in any::<u64>(),
        frames in 1usize..900,
    ) {
        let mut rain = CoinRain::new(width, height, seed);
        for _ in 0..frames {
            rain.advance(1.0 / 30.0);
            prop_assert!(rain.coins().len() <= rain.max_coins());
        }
    }

    #[test]
    fn snake_moves_grows_and_refuses_reversal(
        seed in any::<u64>(),
        turns in prop::collection::vec(prop::option::of(direction()), 1..200),
    ) {
        let mut game = SnakeGame::new(seed);
        for turn in turns {
            prop_assert!(!game.set_direction(game.direction().opposite()));
            if let Some(dir) = turn {
                game.set_direction(dir);
            }

            let len = game.len();
            let food = game.food();
            let expected = game.head().map(|head| head.step(game.pending_direction()));
            match game.tick() {
                TickOutcome::Moved => {
                    prop_assert_eq!(game.len(), len);
                    prop_assert_eq!(game.head(), expected);
                }
                TickOutcome::Ate => {
                    prop_assert_eq!(game.len(), len + 1);
                    prop_assert_eq!(game.head(), Some(food));
                }
                TickOutcome::Reset => {
                    prop_assert_eq!(game.len(), 4);
                    prop_assert_eq!(game.score(), 0);
                }
            }
        }
    }

    #[test]
    fn fill_stays_inside_an_enclosed_region(
        x0 in 0usize..10,
        y0 in 0usize..10,
        w in 3usize..20,
        h in 3usize..20,
    ) {
        let mut raster = Raster::new(32, 32);
        raster.fill_rect(x0, y0, w, 1, Rgba::BLACK);
        raster.fill_rect(x0, y0 + h - 1, w, 1, Rgba::BLACK);
        raster.fill_rect(x0, y0, 1, h, Rgba::BLACK);
        raster.fill_rect(x0 + w - 1, y0, 1, h, Rgba::BLACK);
        let before = raster.clone();

        let red = Rgba([220, 30, 30, 255]);
        let inside = Vec2::new((x0 + 1) as f32 + 0.5, (y0 + 1) as f32 + 0.5);
        let changed = flood_fill(&mut raster, inside, red);
        prop_assert_eq!(changed, (w - 2) * (h - 2));

        for y in 0..32 {
            for x in 0..32 {
                let interior = x > x0 && x < x0 + w - 1 && y > y0 && y < y0 + h - 1;
                let expected = if interior { Some(red) } else { before.pixel(x, y) };
                prop_assert_eq!(raster.pixel(x, y), expected);
            }
        }
    }

    #[test]
    fn fill_with_the_same_colour_changes_nothing(x in 0.0f32..16.0, y in 0.0f32..16.0) {
        let mut raster = Raster::new(16, 16);
        raster.fill_rect(4, 4, 6, 6, Rgba::BLACK);
        let before = raster.clone();
        let seed = before.pixel(x as usize, y as usize).unwrap_or(Rgba::WHITE);

        prop_assert_eq!(flood_fill(&mut raster, Vec2::new(x, y), seed), 0);
        prop_assert_eq!(raster.data(), before.data());
    }

    #[test]
    fn cta_is_never_ready_before_typing_is_done(
        hold in 0u32..3000,
        typing_done_at in 0.0f64..20_000.0,
        gaps in prop::collection::vec(1.0f64..900.0, 1..80),
    ) {
        let mut readiness = CtaReadiness::new(hold);
        readiness.start(0.0);

        let mut now = 0.0;
        let mut forced = false;
        let mut done_seen_at: Option<f64> = None;
        for gap in gaps {
            now += gap;
            let done = forced || now >= typing_done_at;
            if done && done_seen_at.is_none() {
                done_seen_at = Some(now);
            }
            match readiness.poll(now, done) {
                CtaPoll::ForceTyping => {
                    prop_assert!(!done);
                    forced = true;
                }
                CtaPoll::BecameReady => {
                    let Some(done_at) = done_seen_at else {
                        return Err(TestCaseError::fail("ready before typing finished"));
                    };
                    prop_assert!(now >= done_at + hold as f64 + GLOBAL_BEAT_MS);
                }
                CtaPoll::Idle => {}
            }
            if !done {
                prop_assert!(!readiness.is_ready());
            }
        }
    }
}
