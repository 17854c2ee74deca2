//! One-shot coalescing timer for update rounds.

use std::time::{Duration, Instant};

/// Delay before an update round is announced to the views.
pub const UPDATE_COALESCE_INTERVAL: Duration = Duration::from_millis(80);

/// A restartable one-shot deadline. Polled by the owner; never stacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateTimer {
    interval: Duration,
    deadline: Option<Instant>,
}

impl Default for UpdateTimer {
    fn default() -> Self {
        Self::new(UPDATE_COALESCE_INTERVAL)
    }
}

impl UpdateTimer {
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            deadline: None,
        }
    }

    /// Arms the timer, replacing any pending deadline.
    pub fn start(&mut self, now: Instant) {
        self.deadline = Some(now + self.interval);
    }

    pub fn stop(&mut self) {
        self.deadline = None;
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.deadline.is_some()
    }

    /// Returns true once when the deadline has passed.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}
