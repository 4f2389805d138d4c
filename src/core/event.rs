//! Scheduled events and their ordering keys.

use std::fmt;
use std::time::Duration;

use crate::core::{EventLoop, StressError};

/// Deferred action run when an event comes due.
///
/// The action receives the loop that popped it so it can schedule follow-up
/// events; an error ends the loop.
pub type Action = Box<dyn FnOnce(&mut EventLoop) -> Result<(), StressError>>;

/// Tie-break priority for events due at the same instant (lower runs first).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Priority(pub u8);

impl Priority {
    /// Process starts.
    pub const START: Self = Self(0);
    /// Process stops.
    pub const STOP: Self = Self(1);
    /// One-shot housekeeping, after any start or stop due at the same instant.
    pub const ONESHOT: Self = Self(3);

    /// Raw priority value.
    pub const fn value(self) -> u8 {
        self.0
    }
}

impl Default for Priority {
    fn default() -> Self {
        Self::START
    }
}

/// An action due at a point in scheduler time.
///
/// Times are offsets from the scheduler's start, as reported by its clock.
pub struct Event {
    at: Duration,
    priority: Priority,
    label: String,
    action: Action,
}

impl Event {
    /// Create an event due at `at`.
    pub fn new<F>(at: Duration, priority: Priority, label: impl Into<String>, action: F) -> Self
    where
        F: FnOnce(&mut EventLoop) -> Result<(), StressError> + 'static,
    {
        Self {
            at,
            priority,
            label: label.into(),
            action: Box::new(action),
        }
    }

    /// Due time.
    pub const fn at(&self) -> Duration {
        self.at
    }

    /// Tie-break priority.
    pub const fn priority(&self) -> Priority {
        self.priority
    }

    /// Human-readable description used in logs.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Ordering key: lower tuples are due sooner.
    pub const fn key(&self) -> (Duration, Priority) {
        (self.at, self.priority)
    }

    /// Consume the event and run its action.
    pub fn invoke(self, event_loop: &mut EventLoop) -> Result<(), StressError> {
        (self.action)(event_loop)
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} @ {:.3} ({})",
            self.label,
            self.at.as_secs_f64(),
            self.priority.0
        )
    }
}
