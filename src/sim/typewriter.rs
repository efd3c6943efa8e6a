//! Typewriter engine
//!
//! A chapter's lines type one after another, one character per step. The pass
//! itself never sleeps: each step reports how long the caller should wait
//! before stepping again, so an in-flight pass stops as soon as its timer is
//! dropped.

use rand::Rng;

/// Pause between lines (ms)
pub const LINE_PAUSE_MS: u32 = 220;
/// Product chapters let the headline sit before the supporting copy (ms)
pub const HEADLINE_HOLD_MS: u32 = 920;
/// Extra pause after a logon-intro pass (ms)
pub const LOGON_TRAILING_MS: u32 = 650;
/// Cadence multiplier for the slower narrative sections
pub const SLOW_SECTION_FACTOR: f64 = 1.22;

/// Per-line character timing profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cadence {
    /// Live typing with long word gaps
    Hero,
    /// Measured "someone is typing" feel
    Deliberate,
    #[default]
    Default,
}

impl Cadence {
    pub fn from_classes<'a>(classes: impl IntoIterator<Item = &'a str>) -> Self {
        let mut cadence = Cadence::Default;
        for class in classes {
            match class {
                "hero" => return Cadence::Hero,
                "deliberate" => cadence = Cadence::Deliberate,
                _ => {}
            }
        }
        cadence
    }

    /// Delay after `ch` was typed, before the next character (ms)
    pub fn delay_after<R: Rng>(self, ch: char, rng: &mut R) -> u32 {
        let sentence_mark = matches!(ch, '.' | ',' | '!' | '?');
        match self {
            Cadence::Hero => match ch {
                ' ' => 320,
                _ if sentence_mark => 420,
                _ => 126 + rng.random_range(0..52),
            },
            Cadence::Deliberate => match ch {
                ' ' => 265,
                _ if sentence_mark => 430,
                _ => 124 + rng.random_range(0..18),
            },
            Cadence::Default => match ch {
                '.' | ',' => 95,
                _ => 42,
            },
        }
    }
}

/// Typing state of a line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineState {
    Idle,
    Typing,
    Done,
}

/// A line with a monotonic reveal cursor (in chars)
#[derive(Debug, Clone)]
pub struct TypedLine {
    text: String,
    char_count: usize,
    cursor: usize,
    cadence: Cadence,
    state: LineState,
}

impl TypedLine {
    pub fn new(text: impl Into<String>, cadence: Cadence) -> Self {
        let text = text.into();
        let char_count = text.chars().count();
        Self {
            text,
            char_count,
            cursor: 0,
            cadence,
            state: LineState::Idle,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn cadence(&self) -> Cadence {
        self.cadence
    }

    pub fn state(&self) -> LineState {
        self.state
    }

    pub fn is_done(&self) -> bool {
        self.state == LineState::Done
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn char_count(&self) -> usize {
        self.char_count
    }

    /// Currently revealed prefix
    pub fn visible(&self) -> &str {
        let end = self
            .text
            .char_indices()
            .nth(self.cursor)
            .map(|(i, _)| i)
            .unwrap_or(self.text.len());
        &self.text[..end]
    }

    /// Reveal one more character; returns it, or `None` if nothing was left
    pub fn advance(&mut self) -> Option<char> {
        if self.state == LineState::Done {
            return None;
        }
        self.state = LineState::Typing;
        let typed = self.text.chars().nth(self.cursor);
        self.cursor = (self.cursor + 1).min(self.char_count);
        if self.cursor >= self.char_count {
            self.state = LineState::Done;
        }
        typed
    }

    /// Jump to the full text
    pub fn finish(&mut self) {
        self.cursor = self.char_count;
        self.state = LineState::Done;
    }

    pub fn reset(&mut self) {
        self.cursor = 0;
        self.state = LineState::Idle;
    }
}

/// Pass-level timing options
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PassOptions {
    /// Paint/chat/snake sections type slower
    pub slow_cadence: bool,
    /// Hold after the first of several lines (product chapters)
    pub headline_hold: bool,
    /// Added after the last line's pause
    pub trailing_pause_ms: u32,
    /// Multiplier on every wait; 1.0 is normal speed
    pub speed: f64,
}

impl Default for PassOptions {
    fn default() -> Self {
        Self {
            slow_cadence: false,
            headline_hold: false,
            trailing_pause_ms: 0,
            speed: 1.0,
        }
    }
}

/// What a single step did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypingStep {
    /// A character appeared; `len` is the new visible length in chars
    Typed { line: usize, len: usize, wait_ms: u32 },
    /// The line is complete; wait out the inter-line pause
    LineDone { line: usize, wait_ms: u32 },
    Finished,
}

/// Sequential typing of all of a chapter's lines
#[derive(Debug, Clone)]
pub struct TypingPass {
    lines: Vec<TypedLine>,
    current: usize,
    options: PassOptions,
}

impl TypingPass {
    pub fn new(lines: Vec<TypedLine>, options: PassOptions) -> Self {
        Self {
            lines,
            current: 0,
            options,
        }
    }

    pub fn lines(&self) -> &[TypedLine] {
        &self.lines
    }

    pub fn line(&self, index: usize) -> Option<&TypedLine> {
        self.lines.get(index)
    }

    /// Every line reached `done`
    pub fn is_done(&self) -> bool {
        self.lines.iter().all(TypedLine::is_done)
    }

    fn scaled(&self, ms: u32) -> u32 {
        let base = if self.options.slow_cadence {
            (ms as f64 * SLOW_SECTION_FACTOR).round()
        } else {
            ms as f64
        };
        (base * self.options.speed.max(0.0)).round() as u32
    }

    /// Pause owed after line `index` finished
    fn pause_after(&self, index: usize) -> u32 {
        let count = self.lines.len();
        let mut pause = if self.options.headline_hold && index == 0 && count > 1 {
            HEADLINE_HOLD_MS
        } else {
            LINE_PAUSE_MS
        };
        if index + 1 == count {
            pause += self.options.trailing_pause_ms;
        }
        (pause as f64 * self.options.speed.max(0.0)).round() as u32
    }

    /// Perform one step
    ///
    /// The first call shows the first character immediately; a line's last
    /// character completes it in the same step.
    pub fn step<R: Rng>(&mut self, rng: &mut R) -> TypingStep {
        let Some(line) = self.lines.get_mut(self.current) else {
            return TypingStep::Finished;
        };

        let index = self.current;
        let typed = line.advance();
        if line.is_done() {
            self.current += 1;
            return TypingStep::LineDone {
                line: index,
                wait_ms: self.pause_after(index),
            };
        }

        let len = line.cursor();
        let cadence = line.cadence();
        let base = typed.map_or(0, |ch| cadence.delay_after(ch, rng));
        TypingStep::Typed {
            line: index,
            len,
            wait_ms: self.scaled(base),
        }
    }

    /// Force every line to its full text
    pub fn finish_all(&mut self) {
        for line in &mut self.lines {
            line.finish();
        }
        self.current = self.lines.len();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn run(pass: &mut TypingPass) -> Vec<TypingStep> {
        let mut rng = Pcg32::seed_from_u64(7);
        let mut steps = Vec::new();
        loop {
            let step = pass.step(&mut rng);
            steps.push(step);
            if step == TypingStep::Finished {
                return steps;
            }
        }
    }

    #[test]
    fn test_default_cadence() {
        let mut rng = Pcg32::seed_from_u64(1);
        assert_eq!(Cadence::Default.delay_after('a', &mut rng), 42);
        assert_eq!(Cadence::Default.delay_after('.', &mut rng), 95);
        assert_eq!(Cadence::Default.delay_after(',', &mut rng), 95);
        assert_eq!(Cadence::Default.delay_after('!', &mut rng), 42);
    }

    #[test]
    fn test_hero_and_deliberate_cadence() {
        let mut rng = Pcg32::seed_from_u64(1);
        assert_eq!(Cadence::Hero.delay_after(' ', &mut rng), 320);
        assert_eq!(Cadence::Hero.delay_after('?', &mut rng), 420);
        for _ in 0..200 {
            let d = Cadence::Hero.delay_after('x', &mut rng);
            assert!((126..178).contains(&d));
            let d = Cadence::Deliberate.delay_after('x', &mut rng);
            assert!((124..142).contains(&d));
        }
        assert_eq!(Cadence::Deliberate.delay_after(' ', &mut rng), 265);
        assert_eq!(Cadence::Deliberate.delay_after('.', &mut rng), 430);
    }

    #[test]
    fn test_cadence_from_classes() {
        assert_eq!(Cadence::from_classes(["type-line", "hero"]), Cadence::Hero);
        assert_eq!(Cadence::from_classes(["deliberate", "hero"]), Cadence::Hero);
        assert_eq!(Cadence::from_classes(["type-line", "deliberate"]), Cadence::Deliberate);
        assert_eq!(Cadence::from_classes(["type-line"]), Cadence::Default);
    }

    #[test]
    fn test_line_cursor_is_monotonic() {
        let mut line = TypedLine::new("héllo", Cadence::Default);
        assert_eq!(line.state(), LineState::Idle);
        assert_eq!(line.visible(), "");

        let mut last = 0;
        while !line.is_done() {
            line.advance();
            assert!(line.cursor() >= last);
            last = line.cursor();
        }
        assert_eq!(line.visible(), "héllo");
        assert_eq!(line.advance(), None);
        assert_eq!(line.cursor(), 5);
    }

    #[test]
    fn test_empty_line_finishes_on_first_step() {
        let mut pass = TypingPass::new(vec![TypedLine::new("", Cadence::Default)], PassOptions::default());
        let steps = run(&mut pass);
        assert_eq!(
            steps,
            vec![TypingStep::LineDone { line: 0, wait_ms: 220 }, TypingStep::Finished]
        );
    }

    #[test]
    fn test_pass_types_lines_sequentially() {
        let lines = vec![
            TypedLine::new("Hi.", Cadence::Default),
            TypedLine::new("ok", Cadence::Default),
        ];
        let mut pass = TypingPass::new(lines, PassOptions::default());
        let steps = run(&mut pass);
        assert_eq!(
            steps,
            vec![
                TypingStep::Typed { line: 0, len: 1, wait_ms: 42 },
                TypingStep::Typed { line: 0, len: 2, wait_ms: 42 },
                TypingStep::LineDone { line: 0, wait_ms: 220 },
                TypingStep::Typed { line: 1, len: 1, wait_ms: 42 },
                TypingStep::LineDone { line: 1, wait_ms: 220 },
                TypingStep::Finished,
            ]
        );
        assert!(pass.is_done());
    }

    #[test]
    fn test_slow_sections_and_holds() {
        let lines = vec![
            TypedLine::new("a.b", Cadence::Default),
            TypedLine::new("c", Cadence::Default),
        ];
        let options = PassOptions {
            slow_cadence: true,
            headline_hold: true,
            trailing_pause_ms: LOGON_TRAILING_MS,
            speed: 1.0,
        };
        let mut pass = TypingPass::new(lines, options);
        let steps = run(&mut pass);
        assert_eq!(
            steps,
            vec![
                // 42 * 1.22 = 51.24, 95 * 1.22 = 115.9
                TypingStep::Typed { line: 0, len: 1, wait_ms: 51 },
                TypingStep::Typed { line: 0, len: 2, wait_ms: 116 },
                TypingStep::LineDone { line: 0, wait_ms: 920 },
                TypingStep::LineDone { line: 1, wait_ms: 220 + 650 },
                TypingStep::Finished,
            ]
        );
    }

    #[test]
    fn test_speed_multiplier() {
        let lines = vec![TypedLine::new("ab", Cadence::Default)];
        let options = PassOptions {
            speed: 2.0,
            ..PassOptions::default()
        };
        let mut pass = TypingPass::new(lines, options);
        let steps = run(&mut pass);
        assert_eq!(steps[0], TypingStep::Typed { line: 0, len: 1, wait_ms: 84 });
        assert_eq!(steps[1], TypingStep::LineDone { line: 0, wait_ms: 440 });
    }

    #[test]
    fn test_finish_all() {
        let lines = vec![
            TypedLine::new("first", Cadence::Hero),
            TypedLine::new("second", Cadence::Deliberate),
        ];
        let mut pass = TypingPass::new(lines, PassOptions::default());
        let mut rng = Pcg32::seed_from_u64(3);
        pass.step(&mut rng);
        assert!(!pass.is_done());

        pass.finish_all();
        assert!(pass.is_done());
        assert_eq!(pass.line(1).map(TypedLine::visible), Some("second"));
        assert_eq!(pass.step(&mut rng), TypingStep::Finished);
    }
}
