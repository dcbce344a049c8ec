//! Same-turn batching of "this entity changed" signals.
//!
//! Entries are flushed in the order they were marked. Repeated markings of
//! the same entity within a turn are not merged: each one yields its own
//! notification.

use log::debug;
use std::fmt::Debug;

#[derive(Debug)]
pub struct ChangeCoalescer<T> {
    pending: Vec<T>,
    flush_scheduled: bool,
}

impl<T> Default for ChangeCoalescer<T> {
    fn default() -> Self {
        ChangeCoalescer {
            pending: Vec::new(),
            flush_scheduled: false,
        }
    }
}

impl<T: Debug> ChangeCoalescer<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `entity`. Returns true when this call scheduled the turn's flush.
    pub fn mark_dirty(&mut self, entity: T) -> bool {
        self.pending.push(entity);
        if self.flush_scheduled {
            false
        } else {
            self.flush_scheduled = true;
            true
        }
    }

    pub fn is_flush_scheduled(&self) -> bool {
        self.flush_scheduled
    }

    pub fn pending(&self) -> &[T] {
        &self.pending
    }

    /// Take the queued entries and clear the scheduled flag. Markings made
    /// while the caller processes the returned batch land in the next turn.
    pub fn take_batch(&mut self) -> Vec<T> {
        self.flush_scheduled = false;
        std::mem::take(&mut self.pending)
    }

    /// Emit one notification per queued entry, in marking order.
    pub fn flush<F: FnMut(T)>(&mut self, mut emit: F) -> usize {
        let batch = self.take_batch();
        debug!("Dispatching {} change(s): {:?}", batch.len(), batch);
        let count = batch.len();
        for entity in batch {
            emit(entity);
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_mark_schedules_single_flush() {
        let mut c = ChangeCoalescer::new();
        assert!(c.mark_dirty("a"));
        assert!(!c.mark_dirty("b"));
        assert!(c.is_flush_scheduled());
        assert_eq!(c.pending(), &["a", "b"]);
    }

    #[test]
    fn repeated_marks_are_not_deduplicated() {
        let mut c = ChangeCoalescer::new();
        c.mark_dirty("lamp");
        c.mark_dirty("lamp");
        let mut seen = Vec::new();
        assert_eq!(c.flush(|e| seen.push(e)), 2);
        assert_eq!(seen, vec!["lamp", "lamp"]);
    }

    #[test]
    fn flush_preserves_order_and_resets() {
        let mut c = ChangeCoalescer::new();
        for e in [3, 1, 2] {
            c.mark_dirty(e);
        }
        let mut seen = Vec::new();
        c.flush(|e| seen.push(e));
        assert_eq!(seen, vec![3, 1, 2]);
        assert!(!c.is_flush_scheduled());
        assert!(c.pending().is_empty());

        assert!(c.mark_dirty(4));
        let mut next = Vec::new();
        c.flush(|e| next.push(e));
        assert_eq!(next, vec![4]);
    }

    #[test]
    fn empty_flush_emits_nothing() {
        let mut c: ChangeCoalescer<u8> = ChangeCoalescer::new();
        assert_eq!(c.flush(|_| panic!("nothing queued")), 0);
    }
}
