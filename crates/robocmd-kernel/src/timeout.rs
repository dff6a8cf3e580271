//! [`TickTimeout`] – an elapsed-tick countdown.
//!
//! Multi-phase commands keep their timers as explicit state and advance them
//! once per `execute`; nothing in the stack sleeps or waits on a clock.
//!
//! ```rust
//! use robocmd_kernel::TickTimeout;
//!
//! let mut timer = TickTimeout::stopped();
//! timer.restart(2);
//! assert!(!timer.advance());
//! assert!(timer.advance()); // expires on the second tick
//! assert!(timer.is_stopped());
//! ```

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickTimeout {
    remaining: Option<u32>,
}

impl TickTimeout {
    pub const fn stopped() -> Self {
        Self { remaining: None }
    }

    /// Arm the timer to expire on the `ticks`-th call to
    /// [`advance`](TickTimeout::advance).  `0` and `1` both expire on the
    /// next call.
    pub fn restart(&mut self, ticks: u32) {
        self.remaining = Some(ticks);
    }

    pub fn stop(&mut self) {
        self.remaining = None;
    }

    pub fn is_stopped(&self) -> bool {
        self.remaining.is_none()
    }

    /// Count one tick.  Returns `true` exactly once, on the tick the timer
    /// expires; the timer is stopped afterwards.
    pub fn advance(&mut self) -> bool {
        match self.remaining {
            Some(n) if n <= 1 => {
                self.remaining = None;
                true
            }
            Some(n) => {
                self.remaining = Some(n - 1);
                false
            }
            None => false,
        }
    }

    /// Ticks left before expiry, if running.
    pub fn remaining(&self) -> Option<u32> {
        self.remaining
    }
}
