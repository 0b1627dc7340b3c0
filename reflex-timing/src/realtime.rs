use std::time::Duration;

use tracing::trace;

use crate::queue::TimerQueue;
use crate::scheduler::{Clock, Fired, Scheduler, TimerHandle};
use crate::timer::{HighPrecisionTimer, LatenessStats};

/// Wall-clock scheduler. The owner polls it and sleeps between deadlines.
#[derive(Debug)]
pub struct RealtimeScheduler<E> {
    timer: HighPrecisionTimer,
    queue: TimerQueue<E>,
}

impl<E> RealtimeScheduler<E> {
    pub fn new() -> Self {
        Self::with_timer(HighPrecisionTimer::new())
    }

    pub fn with_timer(timer: HighPrecisionTimer) -> Self {
        Self {
            timer,
            queue: TimerQueue::new(),
        }
    }

    /// Sleeps until the next deadline or `limit_ms`, whichever is earlier.
    /// Returns immediately if either is already in the past.
    pub fn sleep_until_next(&self, limit_ms: Option<u64>) {
        let target = match (self.queue.next_deadline(), limit_ms) {
            (Some(d), Some(l)) => d.min(l),
            (Some(d), None) => d,
            (None, Some(l)) => l,
            (None, None) => return,
        };
        let now = self.now_ms();
        if target > now {
            self.timer.sleep(Duration::from_millis(target - now));
        }
    }

    pub fn lateness_stats(&self) -> LatenessStats {
        self.timer.lateness_stats()
    }
}

impl<E> Default for RealtimeScheduler<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Clock for RealtimeScheduler<E> {
    fn now_ms(&self) -> u64 {
        self.timer.now_ms()
    }
}

impl<E> Scheduler<E> for RealtimeScheduler<E> {
    fn schedule_after(&mut self, delay_ms: u64, event: E) -> TimerHandle {
        let deadline = self.now_ms().saturating_add(delay_ms);
        self.queue.insert(deadline, event)
    }

    fn cancel(&mut self, handle: TimerHandle) -> bool {
        self.queue.remove(handle).is_some()
    }

    fn remaining_ms(&self, handle: TimerHandle) -> Option<u64> {
        let now = self.now_ms();
        self.queue
            .deadline(handle)
            .map(|deadline| deadline.saturating_sub(now))
    }

    fn next_deadline(&self) -> Option<u64> {
        self.queue.next_deadline()
    }

    fn pop_due(&mut self) -> Option<Fired<E>> {
        let now = self.now_ms();
        let fired = self.queue.pop_due(now)?;
        let late_by = now - fired.due_at_ms;
        trace!(handle = fired.handle.id(), late_by_ms = late_by, "timer fired");
        self.timer.record_lateness(Duration::from_millis(late_by));
        Some(fired)
    }

    fn pending(&self) -> usize {
        self.queue.len()
    }
}
