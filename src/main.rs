//! Pigeon manifesto entry point
//!
//! Handles platform-specific initialization and mounts the page.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_page {
    use pigeon_manifesto::Settings;
    use pigeon_manifesto::page::Page;

    pub async fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Pigeon manifesto starting...");

        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");

        let settings = Settings::load();
        // Write back so fields added since the last visit are stored too
        settings.save();

        let Some(page) = Page::mount(window, document, settings) else {
            log::warn!("No manifesto scroller on this page");
            return;
        };
        page.start();
        log::info!("Manifesto running");
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    wasm_page::run().await;
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Pigeon manifesto (native) starting...");
    log::info!("The page runs in the browser - build for wasm32 and serve the manifesto");

    demo::run();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Headless walk through the page logic with a manual clock
#[cfg(not(target_arch = "wasm32"))]
mod demo {
    use std::rc::Rc;

    use glam::Vec2;
    use pigeon_manifesto::sim::intent::ADVANCE_INTENT_MS;
    use pigeon_manifesto::sim::{
        Cadence, Clock, CoinRain, CtaPoll, CtaReadiness, ForwardIntent, ManualClock, PassOptions, SnakeGame, TickOutcome,
        TypedLine, TypingPass, TypingStep,
    };
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    pub fn run() {
        let clock = Rc::new(ManualClock::new(0.0));
        let mut rng = Pcg32::seed_from_u64(0x5eed);

        let typed_ms = type_opening(&mut rng);
        clock.advance(typed_ms as f64);
        log::info!("Opening chapter typed in {} ms", typed_ms);

        let ready_at = hold_cta(&clock, 820);
        log::info!("Continue affordance ready at {:.0} ms", ready_at);

        let intent = ForwardIntent::new(clock.clone());
        intent.mark_forward_intent(ADVANCE_INTENT_MS);
        log::info!("Forward intent after advancing: {}", intent.has_forward_intent());
        clock.advance(ADVANCE_INTENT_MS + 1.0);
        log::info!("Forward intent a beat later: {}", intent.has_forward_intent());

        rain_coins();
        play_snake();
    }

    fn type_opening(rng: &mut Pcg32) -> u32 {
        let lines = vec![
            TypedLine::new("Attention is not a resource.", Cadence::Hero),
            TypedLine::new("It is a life.", Cadence::Deliberate),
        ];
        let mut pass = TypingPass::new(lines, PassOptions::default());
        let mut elapsed = 0;
        loop {
            match pass.step(rng) {
                TypingStep::Typed { wait_ms, .. } | TypingStep::LineDone { wait_ms, .. } => elapsed += wait_ms,
                TypingStep::Finished => break,
            }
        }
        for line in pass.lines() {
            log::info!("> {}", line.visible());
        }
        elapsed
    }

    fn hold_cta(clock: &ManualClock, hold_ms: u32) -> f64 {
        let mut readiness = CtaReadiness::new(hold_ms);
        readiness.start(clock.now_ms());
        loop {
            let now = clock.now_ms();
            if readiness.poll(now, true) == CtaPoll::BecameReady {
                return now;
            }
            let Some(deadline) = readiness.next_deadline() else {
                return now;
            };
            clock.set(deadline);
        }
    }

    fn rain_coins() {
        let mut rain = CoinRain::new(680.0, 389.0, 42);
        for _ in 0..(60 * 8) {
            rain.advance(1.0 / 60.0);
        }
        let sleeping = rain.coins().iter().filter(|c| c.sleeping).count();
        log::info!(
            "Coin rain after 8 s: {} coins ({} asleep, cap {})",
            rain.coins().len(),
            sleeping,
            rain.max_coins()
        );

        if let Some(top) = rain.coins().last().map(|c| c.pos) {
            rain.pointer_down(1, top);
            rain.pointer_move(1, top + Vec2::new(12.0, -30.0));
            rain.pointer_up(1);
            log::info!("Tossed a coin from ({:.0}, {:.0})", top.x, top.y);
        }
    }

    fn play_snake() {
        let mut game = SnakeGame::new(7);
        let mut resets = 0;
        for _ in 0..400 {
            if game.tick() == TickOutcome::Reset {
                resets += 1;
            }
        }
        log::info!("Snake after 400 ticks: score {}, {} resets", game.score(), resets);
    }
}
