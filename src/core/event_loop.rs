//! Single-threaded, time-ordered event loop.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::Duration;

use crate::core::{Event, StressError};
use crate::util::clock::Clock;

/// Wrapper to make `Event` orderable by (time, priority), earliest first,
/// and FIFO among events with equal keys.
struct QueuedEvent {
    event: Event,
    seq: u64,
}

impl QueuedEvent {
    fn sort_key(&self) -> (Duration, u8, u64) {
        (self.event.at(), self.event.priority().value(), self.seq)
    }
}

impl PartialEq for QueuedEvent {
    fn eq(&self, other: &Self) -> bool {
        self.seq == other.seq
    }
}

impl Eq for QueuedEvent {}

impl PartialOrd for QueuedEvent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueuedEvent {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed for max-heap: the smallest key must sit on top.
        other.sort_key().cmp(&self.sort_key())
    }
}

/// Exit request raised by an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitRequest {
    /// Process exit code the driver should report.
    pub code: i32,
}

/// Why a run of the loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    /// An action asked the loop to stop.
    Requested(ExitRequest),
    /// The queue ran empty.
    Drained,
    /// `run_until` reached its deadline.
    Deadline,
}

/// Cooperative scheduler holding a priority queue of [`Event`]s.
///
/// Actions run to completion one at a time on the calling thread; the only
/// blocking point is the clock's sleep until the next event is due.
pub struct EventLoop {
    queue: BinaryHeap<QueuedEvent>,
    clock: Box<dyn Clock>,
    next_seq: u64,
    exit: Option<ExitRequest>,
}

impl EventLoop {
    /// Create an empty loop driven by `clock`.
    pub fn new(clock: impl Clock + 'static) -> Self {
        Self {
            queue: BinaryHeap::with_capacity(64),
            clock: Box::new(clock),
            next_seq: 0,
            exit: None,
        }
    }

    /// Current scheduler time.
    pub fn now(&self) -> Duration {
        self.clock.now()
    }

    /// Queue an event. Events in the past are due immediately.
    pub fn schedule(&mut self, event: Event) {
        tracing::debug!("SCHEDULE {event:?}");
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(QueuedEvent { event, seq });
    }

    /// Remove and return the earliest event without running it.
    pub fn pop(&mut self) -> Option<Event> {
        self.queue.pop().map(|queued| queued.event)
    }

    /// Due time of the earliest queued event.
    pub fn peek_time(&self) -> Option<Duration> {
        self.queue.peek().map(|queued| queued.event.at())
    }

    /// Number of queued events.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// True when nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Ask the loop to stop after the running action returns.
    pub fn request_exit(&mut self, code: i32) {
        tracing::info!(code, "exit requested");
        self.exit = Some(ExitRequest { code });
    }

    /// Pop the earliest event, wait until it is due, and run it.
    ///
    /// Returns `Ok(false)` when the queue is empty. Action errors are
    /// returned unchanged.
    pub fn step(&mut self) -> Result<bool, StressError> {
        let Some(event) = self.pop() else {
            return Ok(false);
        };
        if event.at() > self.clock.now() {
            self.clock.sleep_until(event.at());
        }
        tracing::trace!("RUN {event:?}");
        event.invoke(self)?;
        Ok(true)
    }

    /// Run events until an action requests exit, an action fails, or the
    /// queue drains.
    pub fn run_forever(&mut self) -> Result<LoopExit, StressError> {
        loop {
            if !self.step()? {
                return Ok(LoopExit::Drained);
            }
            if let Some(exit) = self.exit.take() {
                return Ok(LoopExit::Requested(exit));
            }
        }
    }

    /// Run every event due at or before `deadline`, then stop with the
    /// clock at `deadline`.
    pub fn run_until(&mut self, deadline: Duration) -> Result<LoopExit, StressError> {
        while self.peek_time().is_some_and(|at| at <= deadline) {
            self.step()?;
            if let Some(exit) = self.exit.take() {
                return Ok(LoopExit::Requested(exit));
            }
        }
        self.clock.sleep_until(deadline);
        Ok(LoopExit::Deadline)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::core::Priority;
    use crate::util::clock::SimulatedClock;

    fn recording(
        at: u64,
        priority: Priority,
        name: &'static str,
        log: &Rc<RefCell<Vec<&'static str>>>,
    ) -> Event {
        let log = Rc::clone(log);
        Event::new(Duration::from_secs(at), priority, name, move |_| {
            log.borrow_mut().push(name);
            Ok(())
        })
    }

    #[test]
    fn test_runs_in_time_then_priority_order() {
        let clock = SimulatedClock::new();
        let mut el = EventLoop::new(clock.clone());
        let log = Rc::new(RefCell::new(Vec::new()));

        el.schedule(recording(2, Priority::ONESHOT, "oneshot", &log));
        el.schedule(recording(2, Priority::STOP, "stop", &log));
        el.schedule(recording(1, Priority::STOP, "early", &log));
        el.schedule(recording(2, Priority::START, "start", &log));

        assert_eq!(el.run_forever().unwrap(), LoopExit::Drained);
        assert_eq!(*log.borrow(), vec!["early", "start", "stop", "oneshot"]);
        assert_eq!(clock.now(), Duration::from_secs(2));
    }

    #[test]
    fn test_equal_keys_are_fifo() {
        let mut el = EventLoop::new(SimulatedClock::new());
        let log = Rc::new(RefCell::new(Vec::new()));
        el.schedule(recording(1, Priority::START, "a", &log));
        el.schedule(recording(1, Priority::START, "b", &log));
        el.schedule(recording(1, Priority::START, "c", &log));
        el.run_forever().unwrap();
        assert_eq!(*log.borrow(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_past_events_run_without_sleeping() {
        let clock = SimulatedClock::new();
        clock.advance(Duration::from_secs(10));
        let mut el = EventLoop::new(clock.clone());
        let log = Rc::new(RefCell::new(Vec::new()));
        el.schedule(recording(3, Priority::START, "late", &log));
        el.run_forever().unwrap();
        assert_eq!(*log.borrow(), vec!["late"]);
        assert_eq!(clock.now(), Duration::from_secs(10));
    }

    #[test]
    fn test_action_error_ends_loop() {
        let mut el = EventLoop::new(SimulatedClock::new());
        let log = Rc::new(RefCell::new(Vec::new()));
        el.schedule(Event::new(Duration::from_secs(1), Priority::START, "boom", |_| {
            Err(StressError::UntrackedProcess(9))
        }));
        el.schedule(recording(2, Priority::START, "after", &log));
        let err = el.run_forever().unwrap_err();
        assert!(matches!(err, StressError::UntrackedProcess(9)));
        assert!(log.borrow().is_empty());
        assert_eq!(el.len(), 1);
    }

    #[test]
    fn test_exit_request_stops_with_pending_events() {
        let mut el = EventLoop::new(SimulatedClock::new());
        el.schedule(Event::new(Duration::from_secs(1), Priority::ONESHOT, "exit", |el| {
            el.request_exit(0);
            Ok(())
        }));
        el.schedule(Event::new(Duration::from_secs(2), Priority::START, "never", |_| Ok(())));
        assert_eq!(
            el.run_forever().unwrap(),
            LoopExit::Requested(ExitRequest { code: 0 })
        );
        assert_eq!(el.len(), 1);
    }

    #[test]
    fn test_actions_can_schedule_follow_ups() {
        let clock = SimulatedClock::new();
        let mut el = EventLoop::new(clock.clone());
        let log = Rc::new(RefCell::new(Vec::new()));
        let inner = Rc::clone(&log);
        el.schedule(Event::new(Duration::from_secs(1), Priority::START, "first", move |el| {
            let at = el.now() + Duration::from_secs(1);
            el.schedule(recording(at.as_secs(), Priority::START, "second", &inner));
            Ok(())
        }));
        assert_eq!(el.run_until(Duration::from_secs(5)).unwrap(), LoopExit::Deadline);
        assert_eq!(*log.borrow(), vec!["second"]);
        assert_eq!(clock.now(), Duration::from_secs(5));
    }
}
