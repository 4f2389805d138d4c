//! Policies built from a task that fires after a fixed interval.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use tracing::debug;

use crate::core::{Event, EventLoop, ProcessGroupManager, Priority, StressError};
use crate::policy::SchedulingPolicy;

/// What a one-shot task wants after firing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rearm {
    /// Fire once only.
    Done,
    /// Fire again one interval from now.
    Again,
}

/// Work run by a [`OneShotPolicy`] when its interval elapses.
pub trait OneShotTask {
    /// Name used in logs and event labels.
    fn label(&self) -> String;

    /// Do the work. Errors end the event loop.
    fn fire(
        &mut self,
        event_loop: &mut EventLoop,
        manager: &ProcessGroupManager,
    ) -> Result<Rearm, StressError>;
}

struct OneShotState<T> {
    task: T,
    manager: Option<ProcessGroupManager>,
    fired: u64,
}

/// Runs a task `interval` after it becomes ready, and again every interval
/// for as long as the task asks to be rearmed.
pub struct OneShotPolicy<T> {
    interval: Duration,
    label: String,
    state: Rc<RefCell<OneShotState<T>>>,
}

impl<T> Clone for OneShotPolicy<T> {
    fn clone(&self) -> Self {
        Self {
            interval: self.interval,
            label: self.label.clone(),
            state: Rc::clone(&self.state),
        }
    }
}

impl<T: OneShotTask + 'static> OneShotPolicy<T> {
    /// Wrap `task` to fire every `interval`.
    pub fn new(interval: Duration, task: T) -> Self {
        let label = task.label();
        Self {
            interval,
            label,
            state: Rc::new(RefCell::new(OneShotState {
                task,
                manager: None,
                fired: 0,
            })),
        }
    }

    /// Interval between becoming ready (or the last firing) and firing.
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Times the task has fired.
    pub fn fired(&self) -> u64 {
        self.state.borrow().fired
    }

    /// Borrow the task.
    pub fn with_task<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.state.borrow().task)
    }

    /// Queue the next firing one interval from now.
    pub fn schedule(&self, event_loop: &mut EventLoop) {
        let policy = self.clone();
        event_loop.schedule(Event::new(
            event_loop.now() + self.interval,
            Priority::ONESHOT,
            self.label.clone(),
            move |el| policy.fire(el),
        ));
    }

    fn fire(&self, event_loop: &mut EventLoop) -> Result<(), StressError> {
        let rearm = {
            let mut guard = self.state.borrow_mut();
            let state = &mut *guard;
            let manager = state.manager.as_ref().ok_or_else(|| {
                StressError::InvalidConfig(format!("`{}` fired before ready", self.label))
            })?;
            state.fired += 1;
            state.task.fire(event_loop, manager)?
        };
        debug!(policy = %self.label, ?rearm, "fired");
        if rearm == Rearm::Again {
            self.schedule(event_loop);
        }
        Ok(())
    }
}

impl<T: OneShotTask + 'static> SchedulingPolicy for OneShotPolicy<T> {
    fn name(&self) -> &str {
        &self.label
    }

    fn ready(
        &self,
        event_loop: &mut EventLoop,
        manager: &ProcessGroupManager,
    ) -> Result<(), StressError> {
        self.state.borrow_mut().manager = Some(manager.clone());
        self.schedule(event_loop);
        Ok(())
    }
}
