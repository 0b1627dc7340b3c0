//! Time sources and timer scheduling for drill sessions.
//!
//! The engine never sleeps or spawns. It asks a [`Scheduler`] for delayed
//! events and is handed them back through [`Scheduler::pop_due`]. Tests drive
//! a [`VirtualScheduler`]; live sessions use a [`RealtimeScheduler`].

mod queue;
pub mod realtime;
pub mod scheduler;
pub mod timer;
pub mod virtual_time;

pub use queue::TimerQueue;
pub use realtime::RealtimeScheduler;
pub use scheduler::{Clock, Fired, ManualTime, Scheduler, TimerHandle};
pub use timer::{HighPrecisionTimer, LatenessStats};
pub use virtual_time::VirtualScheduler;
