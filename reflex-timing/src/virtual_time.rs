use crate::queue::TimerQueue;
use crate::scheduler::{Clock, Fired, ManualTime, Scheduler, TimerHandle};

/// Scheduler on a caller-driven clock. Nothing fires until time is moved.
#[derive(Debug)]
pub struct VirtualScheduler<E> {
    now_ms: u64,
    queue: TimerQueue<E>,
}

impl<E> VirtualScheduler<E> {
    pub fn new() -> Self {
        Self::starting_at(0)
    }

    pub fn starting_at(now_ms: u64) -> Self {
        Self {
            now_ms,
            queue: TimerQueue::new(),
        }
    }

    pub fn advance_by(&mut self, delta_ms: u64) {
        self.now_ms = self.now_ms.saturating_add(delta_ms);
    }
}

impl<E> Default for VirtualScheduler<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Clock for VirtualScheduler<E> {
    fn now_ms(&self) -> u64 {
        self.now_ms
    }
}

impl<E> ManualTime for VirtualScheduler<E> {
    fn set_now_ms(&mut self, now_ms: u64) {
        self.now_ms = self.now_ms.max(now_ms);
    }
}

impl<E> Scheduler<E> for VirtualScheduler<E> {
    fn schedule_after(&mut self, delay_ms: u64, event: E) -> TimerHandle {
        self.queue.insert(self.now_ms.saturating_add(delay_ms), event)
    }

    fn cancel(&mut self, handle: TimerHandle) -> bool {
        self.queue.remove(handle).is_some()
    }

    fn remaining_ms(&self, handle: TimerHandle) -> Option<u64> {
        self.queue
            .deadline(handle)
            .map(|deadline| deadline.saturating_sub(self.now_ms))
    }

    fn next_deadline(&self) -> Option<u64> {
        self.queue.next_deadline()
    }

    fn pop_due(&mut self) -> Option<Fired<E>> {
        self.queue.pop_due(self.now_ms)
    }

    fn pending(&self) -> usize {
        self.queue.len()
    }
}
