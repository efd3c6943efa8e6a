//! Chapter state change notifications
//!
//! Features react to each other's state through this bus instead of watching
//! DOM attributes. Publishing from inside a subscriber is allowed: the event is
//! queued and delivered after the current one finishes.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use super::chapter::ChapterFlag;

/// A chapter flag flipped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChapterEvent {
    pub chapter: usize,
    pub flag: ChapterFlag,
    /// true when the flag was set, false when cleared
    pub set: bool,
}

impl ChapterEvent {
    pub fn set(chapter: usize, flag: ChapterFlag) -> Self {
        Self { chapter, flag, set: true }
    }

    pub fn cleared(chapter: usize, flag: ChapterFlag) -> Self {
        Self { chapter, flag, set: false }
    }

    /// True for "`flag` was just set on `chapter`"
    pub fn is_set(&self, chapter: usize, flag: ChapterFlag) -> bool {
        self.set && self.chapter == chapter && self.flag == flag
    }
}

type Subscriber<E> = Rc<dyn Fn(&E)>;

/// Single-threaded publish/subscribe queue
pub struct EventBus<E> {
    subscribers: RefCell<Vec<Subscriber<E>>>,
    queue: RefCell<VecDeque<E>>,
    dispatching: Cell<bool>,
}

impl<E: 'static> EventBus<E> {
    pub fn new() -> Self {
        Self {
            subscribers: RefCell::new(Vec::new()),
            queue: RefCell::new(VecDeque::new()),
            dispatching: Cell::new(false),
        }
    }

    /// Register a listener for every later event
    pub fn subscribe(&self, listener: impl Fn(&E) + 'static) {
        self.subscribers.borrow_mut().push(Rc::new(listener));
    }

    /// Deliver `event` to every subscriber, in subscription order
    pub fn publish(&self, event: E) {
        self.queue.borrow_mut().push_back(event);
        if self.dispatching.get() {
            return;
        }

        self.dispatching.set(true);
        loop {
            let next = self.queue.borrow_mut().pop_front();
            let Some(event) = next else { break };
            // Snapshot so a listener may subscribe while being called
            let listeners: Vec<Subscriber<E>> = self.subscribers.borrow().clone();
            for listener in &listeners {
                listener(&event);
            }
        }
        self.dispatching.set(false);
    }

    /// Publish every event from an iterator
    pub fn publish_all(&self, events: impl IntoIterator<Item = E>) {
        for event in events {
            self.publish(event);
        }
    }
}

impl<E: 'static> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscribers_see_events_in_order() {
        let bus: EventBus<u32> = EventBus::new();
        let seen = Rc::new(RefCell::new(Vec::new()));

        let log = seen.clone();
        bus.subscribe(move |e| log.borrow_mut().push(("a", *e)));
        let log = seen.clone();
        bus.subscribe(move |e| log.borrow_mut().push(("b", *e)));

        bus.publish(1);
        bus.publish(2);
        assert_eq!(*seen.borrow(), vec![("a", 1), ("b", 1), ("a", 2), ("b", 2)]);
    }

    #[test]
    fn test_reentrant_publish_is_queued() {
        let bus: Rc<EventBus<u32>> = Rc::new(EventBus::new());
        let seen = Rc::new(RefCell::new(Vec::new()));

        let inner = Rc::downgrade(&bus);
        bus.subscribe(move |e| {
            if *e == 1 {
                if let Some(bus) = inner.upgrade() {
                    bus.publish(10);
                }
            }
        });
        let log = seen.clone();
        bus.subscribe(move |e| log.borrow_mut().push(*e));

        bus.publish(1);
        // The second listener still sees 1 before the follow-up event
        assert_eq!(*seen.borrow(), vec![1, 10]);
    }

    #[test]
    fn test_chapter_event_matching() {
        let event = ChapterEvent::set(3, ChapterFlag::VisualReady);
        assert!(event.is_set(3, ChapterFlag::VisualReady));
        assert!(!event.is_set(2, ChapterFlag::VisualReady));
        assert!(!ChapterEvent::cleared(3, ChapterFlag::VisualReady).is_set(3, ChapterFlag::VisualReady));
    }
}
