//! Thread-safe FIFO of body indices.
//!
//! The queue is refilled single-threaded by the coordinator immediately
//! before a phase launches, then drained concurrently by the workers. It is
//! the only dispatch point of a phase: which worker processes which index is
//! non-deterministic, result writes stay safe because they are partitioned
//! by the popped index.

use std::collections::VecDeque;
use std::sync::Mutex;

#[derive(Debug, Default)]
pub struct EventQueue {
    events: Mutex<VecDeque<usize>>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(VecDeque::new()),
        }
    }

    /// Enqueue the indices `0..n` in order. Single-threaded use only, before
    /// the workers are released into a phase.
    pub fn push_all(&self, n: usize) {
        let mut events = self.events.lock().expect("event queue lock poisoned");
        events.extend(0..n);
    }

    /// Remove and return the front index, or `None` once the queue is empty.
    /// Safe to call from many workers concurrently.
    pub fn pop(&self) -> Option<usize> {
        let mut events = self.events.lock().expect("event queue lock poisoned");
        events.pop_front()
    }

    pub fn len(&self) -> usize {
        self.events.lock().expect("event queue lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pops_in_fifo_order() {
        let q = EventQueue::new();
        q.push_all(3);
        assert_eq!(q.len(), 3);
        assert_eq!(q.pop(), Some(0));
        assert_eq!(q.pop(), Some(1));
        assert_eq!(q.pop(), Some(2));
        assert_eq!(q.pop(), None);
        assert!(q.is_empty());
    }

    #[test]
    fn refill_after_drain() {
        let q = EventQueue::new();
        q.push_all(2);
        while q.pop().is_some() {}
        q.push_all(2);
        assert_eq!(q.len(), 2);
    }
}
