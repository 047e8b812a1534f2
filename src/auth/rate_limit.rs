//! A fixed-window rate limiter for the login and password-recovery endpoints.
//!
//! The limiter bounds abuse, it is not part of the app's correctness: state
//! lives in-process and resets on restart.

use std::time::{Duration, Instant};

use crate::Error;

/// Counts attempts within a fixed time window and rejects the excess.
#[derive(Debug)]
pub struct RateLimiter {
    max_attempts: u32,
    window: Duration,
    attempts: u32,
    window_start: Instant,
}

impl RateLimiter {
    /// Create a limiter that allows `max_attempts` per `window`.
    pub fn new(max_attempts: u32, window: Duration) -> Self {
        Self {
            max_attempts,
            window,
            attempts: 0,
            window_start: Instant::now(),
        }
    }

    /// Record an attempt, rejecting it if the window's budget is spent.
    ///
    /// # Errors
    /// Returns [Error::RateLimited] once more than `max_attempts` attempts
    /// have been made within the current window.
    pub fn try_acquire(&mut self) -> Result<(), Error> {
        self.try_acquire_at(Instant::now())
    }

    fn try_acquire_at(&mut self, now: Instant) -> Result<(), Error> {
        if now.duration_since(self.window_start) >= self.window {
            self.window_start = now;
            self.attempts = 0;
        }

        if self.attempts >= self.max_attempts {
            return Err(Error::RateLimited);
        }

        self.attempts += 1;
        Ok(())
    }
}
