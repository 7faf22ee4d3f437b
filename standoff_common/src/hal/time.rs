//! Fixed-period tick admission.
//!
//! [`PeriodGate`] decides whether a control step may run at a given
//! monotonic timestamp. A step is admitted when at least one period has
//! elapsed since the last admitted step; the gate then restarts from the
//! current time, so periods missed while the caller was busy are absorbed
//! instead of replayed as a burst.

/// Tick admission state over a monotonic microsecond clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodGate {
    period_us: u64,
    last_us: Option<u64>,
}

impl PeriodGate {
    pub const fn new(period_us: u64) -> Self {
        Self {
            period_us,
            last_us: None,
        }
    }

    #[inline]
    pub const fn period_us(&self) -> u64 {
        self.period_us
    }

    /// Timestamp of the last admitted tick.
    #[inline]
    pub const fn last_us(&self) -> Option<u64> {
        self.last_us
    }

    /// Admit a tick at `now_us`. The first poll is always admitted.
    pub fn admit(&mut self, now_us: u64) -> bool {
        let due = match self.last_us {
            None => true,
            Some(last) => now_us.saturating_sub(last) >= self.period_us,
        };
        if due {
            self.last_us = Some(now_us);
        }
        due
    }

    /// Forget the last admitted tick.
    pub fn reset(&mut self) {
        self.last_us = None;
    }
}
