use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Spread of how late timers fired relative to their deadline
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LatenessStats {
    pub samples: usize,
    pub average_ns: f64,
    pub jitter_ns: f64,
    pub min_ns: f64,
    pub max_ns: f64,
}

/// Monotonic session clock with a platform-specific precise sleep
#[derive(Debug, Clone)]
pub struct HighPrecisionTimer {
    start: Instant,
    lateness: VecDeque<Duration>,
    max_samples: usize,
}

impl HighPrecisionTimer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            lateness: VecDeque::with_capacity(1000),
            max_samples: 1000,
        }
    }

    /// Nanoseconds since the timer was created
    pub fn now_ns(&self) -> u64 {
        self.start.elapsed().as_nanos() as u64
    }

    pub fn now_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    pub fn elapsed(&self, since_ns: u64) -> Duration {
        Duration::from_nanos(self.now_ns().saturating_sub(since_ns))
    }

    pub fn record_lateness(&mut self, late_by: Duration) {
        if self.lateness.len() >= self.max_samples {
            self.lateness.pop_front();
        }
        self.lateness.push_back(late_by);
    }

    pub fn lateness_stats(&self) -> LatenessStats {
        if self.lateness.is_empty() {
            return LatenessStats::default();
        }
        let times: Vec<f64> = self.lateness.iter().map(|d| d.as_nanos() as f64).collect();
        let n = times.len() as f64;
        let avg = times.iter().sum::<f64>() / n;
        let var = times.iter().map(|x| (x - avg).powi(2)).sum::<f64>() / n;
        LatenessStats {
            samples: times.len(),
            average_ns: avg,
            jitter_ns: var.sqrt(),
            min_ns: times.iter().copied().fold(f64::INFINITY, f64::min),
            max_ns: times.iter().copied().fold(0.0, f64::max),
        }
    }

    pub fn sleep(&self, duration: Duration) {
        if duration.is_zero() {
            return;
        }
        #[cfg(target_os = "linux")]
        self.linux_sleep(duration);
        #[cfg(not(target_os = "linux"))]
        std::thread::sleep(duration);
    }

    #[cfg(target_os = "linux")]
    fn linux_sleep(&self, duration: Duration) {
        use libc::{clock_nanosleep, timespec, CLOCK_MONOTONIC};

        let req = timespec {
            tv_sec: duration.as_secs() as libc::time_t,
            tv_nsec: duration.subsec_nanos() as libc::c_long,
        };

        // SAFETY: `req` is a valid timespec and a null remainder pointer is allowed.
        unsafe {
            clock_nanosleep(CLOCK_MONOTONIC, 0, &req, std::ptr::null_mut());
        }
    }
}

impl Default for HighPrecisionTimer {
    fn default() -> Self {
        Self::new()
    }
}
