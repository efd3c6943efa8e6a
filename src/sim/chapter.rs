//! Chapter records and lifecycle flags
//!
//! Each chapter is a tagged-state record owned by the orchestrator. Flags are
//! mostly one-way latches; the presentation layer mirrors them as CSS classes
//! by subscribing to the events the store hands back.

use super::events::ChapterEvent;
use super::surge::{consumption_hold_ms, estimate_surge_ms};

/// Section kind, derived from the chapter's class list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChapterKind {
    NotificationStorm,
    ConsumptionFeed,
    CoinRain,
    LogonIntro,
    Paint,
    Chat,
    Snake,
    Shift,
    LookUpBreak,
    BlankBreak,
    AttentionBreak,
    MonetizationBreak,
    KeepScrollingBreak,
    Product,
    Join,
    PrototypeCta,
    Plain,
}

/// Marker class per kind; earlier entries win when a chapter carries several
const KIND_CLASSES: &[(&str, ChapterKind)] = &[
    ("notification-section", ChapterKind::NotificationStorm),
    ("consumption-section", ChapterKind::ConsumptionFeed),
    ("consumption-prelude-section", ChapterKind::CoinRain),
    ("logon-intro", ChapterKind::LogonIntro),
    ("reflection-section", ChapterKind::Paint),
    ("reflection-followup-section", ChapterKind::Chat),
    ("reflection-intent-section", ChapterKind::Snake),
    ("reflection-shift-section", ChapterKind::Shift),
    ("look-up-break", ChapterKind::LookUpBreak),
    ("blank-break", ChapterKind::BlankBreak),
    ("attention-break", ChapterKind::AttentionBreak),
    ("monetization-break", ChapterKind::MonetizationBreak),
    ("keep-scrolling-break", ChapterKind::KeepScrollingBreak),
    ("product", ChapterKind::Product),
    ("join", ChapterKind::Join),
    ("prototype-cta-section", ChapterKind::PrototypeCta),
];

/// Element counts that feed the CTA hold table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChapterCounts {
    pub storm_items: usize,
    pub lockscreen_notes: usize,
}

impl ChapterKind {
    pub fn from_classes<'a>(classes: impl IntoIterator<Item = &'a str>) -> Self {
        let classes: Vec<&str> = classes.into_iter().collect();
        KIND_CLASSES
            .iter()
            .find(|(class, _)| classes.contains(class))
            .map(|&(_, kind)| kind)
            .unwrap_or(ChapterKind::Plain)
    }

    /// Selector-friendly marker class
    pub fn class_name(self) -> Option<&'static str> {
        KIND_CLASSES
            .iter()
            .find(|&&(_, kind)| kind == self)
            .map(|&(class, _)| class)
    }

    /// Paint, chat, snake and shift hold their visual back until typing ends
    pub fn has_deferred_visual(self) -> bool {
        matches!(
            self,
            ChapterKind::Paint | ChapterKind::Chat | ChapterKind::Snake | ChapterKind::Shift
        )
    }

    /// Types at the slower section cadence
    pub fn slow_typing(self) -> bool {
        matches!(self, ChapterKind::Paint | ChapterKind::Chat | ChapterKind::Snake)
    }

    /// Class latched while an arrival decoration is in view
    pub fn arrival_class(self) -> Option<&'static str> {
        match self {
            ChapterKind::LookUpBreak => Some("pigeon-arrive"),
            ChapterKind::Product => Some("product-pigeon-arrive"),
            ChapterKind::BlankBreak => Some("pigeon-crossing"),
            _ => None,
        }
    }

    /// Extra hold before the continue affordance (ms)
    pub fn cta_hold_ms(self, counts: ChapterCounts) -> u32 {
        match self {
            ChapterKind::NotificationStorm => estimate_surge_ms(counts.storm_items),
            ChapterKind::ConsumptionFeed => consumption_hold_ms(counts.lockscreen_notes),
            ChapterKind::CoinRain => 8200,
            ChapterKind::LogonIntro => 820,
            ChapterKind::Paint | ChapterKind::Chat | ChapterKind::Snake => 760,
            ChapterKind::Shift => 6400,
            ChapterKind::LookUpBreak => 1880,
            ChapterKind::BlankBreak => 2520,
            ChapterKind::AttentionBreak
            | ChapterKind::MonetizationBreak
            | ChapterKind::KeepScrollingBreak => 420,
            _ => 220,
        }
    }
}

/// Named chapter state bits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChapterFlag {
    Revealed,
    /// Typing pass has started
    Typed,
    /// Every typed line reached `done`
    LinesDone,
    VisualReady,
    CtaReady,
    /// Closest to the viewport center
    Active,
    /// Kind-specific pigeon arrival decoration
    Arrival,
    NotesLive,
    PigeonLive,
}

impl ChapterFlag {
    pub const ALL: [ChapterFlag; 9] = [
        ChapterFlag::Revealed,
        ChapterFlag::Typed,
        ChapterFlag::LinesDone,
        ChapterFlag::VisualReady,
        ChapterFlag::CtaReady,
        ChapterFlag::Active,
        ChapterFlag::Arrival,
        ChapterFlag::NotesLive,
        ChapterFlag::PigeonLive,
    ];

    fn bit(self) -> u16 {
        1 << (self as u16)
    }
}

/// One narrative section
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chapter {
    pub index: usize,
    pub kind: ChapterKind,
    pub line_count: usize,
    pub counts: ChapterCounts,
    flags: u16,
}

impl Chapter {
    pub fn new(index: usize, kind: ChapterKind, line_count: usize, counts: ChapterCounts) -> Self {
        Self {
            index,
            kind,
            line_count,
            counts,
            flags: 0,
        }
    }

    pub fn has(&self, flag: ChapterFlag) -> bool {
        self.flags & flag.bit() != 0
    }

    /// CSS class mirroring `flag` on this chapter, if any
    pub fn class_for(&self, flag: ChapterFlag) -> Option<&'static str> {
        match flag {
            ChapterFlag::Revealed => Some("revealed"),
            ChapterFlag::Typed => Some("typed"),
            ChapterFlag::LinesDone => None,
            ChapterFlag::VisualReady => Some("visual-ready"),
            ChapterFlag::CtaReady => Some("cta-ready"),
            ChapterFlag::Active => Some("active"),
            ChapterFlag::Arrival => self.kind.arrival_class(),
            ChapterFlag::NotesLive => Some("notes-live"),
            ChapterFlag::PigeonLive => Some("pigeon-live"),
        }
    }

    pub fn cta_hold_ms(&self) -> u32 {
        self.kind.cta_hold_ms(self.counts)
    }
}

/// All chapters of the page, in document order
#[derive(Debug, Clone, Default)]
pub struct ChapterStore {
    chapters: Vec<Chapter>,
}

impl ChapterStore {
    pub fn new(chapters: Vec<Chapter>) -> Self {
        Self { chapters }
    }

    pub fn len(&self) -> usize {
        self.chapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chapters.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Chapter> {
        self.chapters.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Chapter> {
        self.chapters.iter()
    }

    pub fn has(&self, index: usize, flag: ChapterFlag) -> bool {
        self.get(index).is_some_and(|c| c.has(flag))
    }

    /// First chapter of the given kind
    pub fn find_kind(&self, kind: ChapterKind) -> Option<usize> {
        self.chapters.iter().position(|c| c.kind == kind)
    }

    /// Set a flag; returns the change event, or `None` if it was already set
    pub fn set_flag(&mut self, index: usize, flag: ChapterFlag) -> Option<ChapterEvent> {
        let chapter = self.chapters.get_mut(index)?;
        if chapter.has(flag) {
            return None;
        }
        chapter.flags |= flag.bit();
        Some(ChapterEvent::set(index, flag))
    }

    /// Clear a flag; returns the change event, or `None` if it was not set
    pub fn clear_flag(&mut self, index: usize, flag: ChapterFlag) -> Option<ChapterEvent> {
        let chapter = self.chapters.get_mut(index)?;
        if !chapter.has(flag) {
            return None;
        }
        chapter.flags &= !flag.bit();
        Some(ChapterEvent::cleared(index, flag))
    }

    pub fn active_index(&self) -> Option<usize> {
        self.chapters.iter().position(|c| c.has(ChapterFlag::Active))
    }

    /// Move the active flag to `index`, clearing it everywhere else
    pub fn set_active(&mut self, index: usize) -> Vec<ChapterEvent> {
        let mut events = Vec::new();
        for i in 0..self.chapters.len() {
            if i != index {
                events.extend(self.clear_flag(i, ChapterFlag::Active));
            }
        }
        events.extend(self.set_flag(index, ChapterFlag::Active));
        events
    }
}
