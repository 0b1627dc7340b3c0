use std::collections::{BTreeMap, HashMap};

use crate::scheduler::{Fired, TimerHandle};

/// Deadline-ordered timer storage shared by both schedulers
#[derive(Debug)]
pub struct TimerQueue<E> {
    next_id: u64,
    pending: BTreeMap<(u64, u64), E>,
    deadlines: HashMap<u64, u64>,
}

impl<E> TimerQueue<E> {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            pending: BTreeMap::new(),
            deadlines: HashMap::new(),
        }
    }

    pub fn insert(&mut self, deadline_ms: u64, event: E) -> TimerHandle {
        let id = self.next_id;
        self.next_id += 1;
        self.pending.insert((deadline_ms, id), event);
        self.deadlines.insert(id, deadline_ms);
        TimerHandle(id)
    }

    pub fn remove(&mut self, handle: TimerHandle) -> Option<E> {
        let deadline = self.deadlines.remove(&handle.0)?;
        self.pending.remove(&(deadline, handle.0))
    }

    pub fn deadline(&self, handle: TimerHandle) -> Option<u64> {
        self.deadlines.get(&handle.0).copied()
    }

    pub fn next_deadline(&self) -> Option<u64> {
        self.pending.first_key_value().map(|((deadline, _), _)| *deadline)
    }

    pub fn pop_due(&mut self, now_ms: u64) -> Option<Fired<E>> {
        if self.next_deadline()? > now_ms {
            return None;
        }
        let ((due_at_ms, id), event) = self.pending.pop_first()?;
        self.deadlines.remove(&id);
        Some(Fired {
            handle: TimerHandle(id),
            due_at_ms,
            event,
        })
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl<E> Default for TimerQueue<E> {
    fn default() -> Self {
        Self::new()
    }
}
