//! Ends the run after a fixed time.

use std::time::Duration;

use crate::core::{EventLoop, ProcessGroupManager, StressError};
use crate::policy::oneshot::{OneShotPolicy, OneShotTask, Rearm};

/// Requests loop exit with `code`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Termination {
    /// Exit code reported by the loop.
    pub code: i32,
}

impl OneShotTask for Termination {
    fn label(&self) -> String {
        "termination".into()
    }

    fn fire(
        &mut self,
        event_loop: &mut EventLoop,
        _: &ProcessGroupManager,
    ) -> Result<Rearm, StressError> {
        tracing::info!(at = event_loop.now().as_secs_f64(), "max time reached");
        event_loop.request_exit(self.code);
        Ok(Rearm::Done)
    }
}

impl OneShotPolicy<Termination> {
    /// Stop the loop cleanly once `max_time` has elapsed.
    pub fn after(max_time: Duration) -> Self {
        Self::new(max_time, Termination::default())
    }
}
