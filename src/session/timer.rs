// src/session/timer.rs

/// Countdown clock for one test session.
///
/// Holds whole seconds remaining. Each `tick()` takes one second off;
/// the expiry signal is latched so it fires exactly once even if the
/// session keeps ticking (or rolls back to Active) afterwards.
#[derive(Debug, Clone)]
pub struct SessionTimer {
    remaining: u32,
    expiry_signaled: bool,
}

impl SessionTimer {
    pub fn new(duration_secs: u32) -> Self {
        Self {
            remaining: duration_secs,
            expiry_signaled: false,
        }
    }

    /// Advances the clock by one second.
    ///
    /// Returns `true` exactly once, on the tick that exhausts the
    /// countdown. Further ticks leave the clock at zero and return
    /// `false`. Delayed ticks are not compensated for; one call is
    /// always exactly one second of test time.
    pub fn tick(&mut self) -> bool {
        if self.remaining > 0 {
            self.remaining -= 1;
        }
        if self.remaining == 0 && !self.expiry_signaled {
            self.expiry_signaled = true;
            return true;
        }
        false
    }

    /// Seconds left on the countdown.
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Whether the expiry signal has fired.
    pub fn is_expired(&self) -> bool {
        self.expiry_signaled
    }
}
