/// Opaque cancellation handle returned by [`Scheduler::schedule_after`].
///
/// Handles are never reused by the scheduler that issued them, so a stale
/// handle can be compared against a live one without ambiguity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(pub(crate) u64);

impl TimerHandle {
    pub fn id(&self) -> u64 {
        self.0
    }
}

/// A timer that has come due, together with the event it was scheduled with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fired<E> {
    pub handle: TimerHandle,
    pub due_at_ms: u64,
    pub event: E,
}

/// Monotonic millisecond clock. Zero is wherever the clock chose to start.
pub trait Clock {
    fn now_ms(&self) -> u64;
}

/// Delayed-event capability consumed by the trial engine
pub trait Scheduler<E>: Clock {
    fn schedule_after(&mut self, delay_ms: u64, event: E) -> TimerHandle;

    /// Returns false if the handle already fired or was cancelled.
    fn cancel(&mut self, handle: TimerHandle) -> bool;

    /// Time left before `handle` comes due, zero if already overdue.
    fn remaining_ms(&self, handle: TimerHandle) -> Option<u64>;

    fn next_deadline(&self) -> Option<u64>;

    /// Removes and returns the earliest timer due at or before `now_ms()`.
    /// Timers with equal deadlines come out in scheduling order.
    fn pop_due(&mut self) -> Option<Fired<E>>;

    fn pending(&self) -> usize;
}

/// Clocks whose time is set by the caller rather than read from hardware
pub trait ManualTime {
    /// Moves the clock forward. Attempts to move it backwards are ignored.
    fn set_now_ms(&mut self, now_ms: u64);
}
