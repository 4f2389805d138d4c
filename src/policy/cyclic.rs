//! Fixed-pool cyclic scheduling.
//!
//! Each slot repeats forever: wait a random start delay, run the workload
//! for a random time, stop it with SIGINT or SIGKILL, reschedule.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};
use std::time::Duration;

use tracing::{debug, info};

use crate::config::CyclicPoolConfig;
use crate::core::{Event, EventLoop, ProcessGroupManager, Priority, StressError};
use crate::policy::{SchedulingPolicy, Workload};
use crate::util::random::RandomSource;

/// State of one recurring slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    /// Slot identifier; never reused.
    pub id: u64,
    /// Current cycle, starting at 1.
    pub run_number: u32,
    /// Pid of the running process, if started and not yet stopped.
    pub pid: Option<u32>,
}

/// Start and stop times drawn for one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleTimes {
    /// When the start event fires.
    pub start_at: Duration,
    /// When the stop event fires.
    pub stop_at: Duration,
    /// Whether the stop uses SIGKILL.
    pub kill: bool,
}

struct PoolState {
    config: CyclicPoolConfig,
    workload: Workload,
    rng: Box<dyn RandomSource>,
    manager: Option<ProcessGroupManager>,
    slots: BTreeMap<u64, Slot>,
    next_slot: u64,
}

impl PoolState {
    fn manager(&self) -> Result<ProcessGroupManager, StressError> {
        self.manager.clone().ok_or_else(|| {
            StressError::InvalidConfig(format!("pool `{}` used before ready", self.config.name))
        })
    }
}

/// Pool of numbered slots cycling through start, run and stop.
///
/// Cheap to clone; clones share the same slots. Event actions hold clones,
/// which is how a stop event finds its way back to the pool.
#[derive(Clone)]
pub struct CyclicPoolPolicy {
    name: Rc<str>,
    state: Rc<RefCell<PoolState>>,
}

/// Non-owning handle to a [`CyclicPoolPolicy`].
#[derive(Clone)]
pub struct WeakPool {
    name: Rc<str>,
    state: Weak<RefCell<PoolState>>,
}

impl WeakPool {
    /// The pool, if it is still alive.
    pub fn upgrade(&self) -> Option<CyclicPoolPolicy> {
        self.state.upgrade().map(|state| CyclicPoolPolicy {
            name: Rc::clone(&self.name),
            state,
        })
    }
}

impl CyclicPoolPolicy {
    /// Create a pool. Invalid ranges are rejected here, not when drawn.
    pub fn new(
        config: CyclicPoolConfig,
        workload: Workload,
        rng: impl RandomSource + 'static,
    ) -> Result<Self, StressError> {
        config.validate()?;
        let name: Rc<str> = Rc::from(config.name.as_str());
        let next_slot = config.first_slot;
        Ok(Self {
            name,
            state: Rc::new(RefCell::new(PoolState {
                config,
                workload,
                rng: Box::new(rng),
                manager: None,
                slots: BTreeMap::new(),
                next_slot,
            })),
        })
    }

    /// Non-owning handle for policies that grow this pool.
    pub fn downgrade(&self) -> WeakPool {
        WeakPool {
            name: Rc::clone(&self.name),
            state: Rc::downgrade(&self.state),
        }
    }

    /// Number of slots allocated so far.
    pub fn slot_count(&self) -> u64 {
        self.state.borrow().slots.len() as u64
    }

    /// Allocated slot ids, ascending.
    pub fn slot_ids(&self) -> Vec<u64> {
        self.state.borrow().slots.keys().copied().collect()
    }

    /// Snapshot of one slot.
    pub fn slot(&self, id: u64) -> Option<Slot> {
        self.state.borrow().slots.get(&id).copied()
    }

    /// Number of slots with a running process.
    pub fn running_count(&self) -> usize {
        self.state
            .borrow()
            .slots
            .values()
            .filter(|slot| slot.pid.is_some())
            .count()
    }

    /// Allocate `count` new slots above the high-water mark and schedule
    /// their first cycle. With `start_now` the first start has no delay.
    pub fn increase_slot_count(
        &self,
        event_loop: &mut EventLoop,
        count: u64,
        start_now: bool,
    ) -> Result<Vec<u64>, StressError> {
        let first = {
            let mut state = self.state.borrow_mut();
            let first = state.next_slot;
            state.next_slot += count;
            first
        };
        let ids: Vec<u64> = (first..first + count).collect();
        for &id in &ids {
            self.schedule(event_loop, id, 1, start_now)?;
        }
        if count > 0 {
            info!(pool = %self.name, count, total = self.slot_count(), "slots added");
        }
        Ok(ids)
    }

    /// Draw the timing of cycle `run` of `slot` and queue its start and stop.
    pub fn schedule(
        &self,
        event_loop: &mut EventLoop,
        slot: u64,
        run: u32,
        start_now: bool,
    ) -> Result<CycleTimes, StressError> {
        let times = {
            let mut guard = self.state.borrow_mut();
            let state = &mut *guard;
            let cfg = &state.config;
            let running_for = state.rng.int_in(cfg.min_duration_secs, cfg.max_duration_secs);
            let kill = state.rng.chance(cfg.kill_chance);
            let start_in = if start_now {
                0
            } else {
                state.rng.int_in(cfg.min_start_secs, cfg.max_start_secs)
            };
            let start_at = event_loop.now() + Duration::from_secs(start_in);
            let stop_at = start_at + Duration::from_secs(running_for) + cfg.stop_margin();
            state
                .slots
                .entry(slot)
                .and_modify(|s| s.run_number = run)
                .or_insert(Slot {
                    id: slot,
                    run_number: run,
                    pid: None,
                });
            CycleTimes {
                start_at,
                stop_at,
                kill,
            }
        };

        let pool = self.clone();
        event_loop.schedule(Event::new(
            times.start_at,
            Priority::START,
            format!("START {}[{slot}] run {run}", self.name),
            move |_| pool.start(slot, run),
        ));
        let pool = self.clone();
        let kill = times.kill;
        event_loop.schedule(Event::new(
            times.stop_at,
            Priority::STOP,
            format!("END {}[{slot}] run {run} kill={kill}", self.name),
            move |el| pool.stop(el, slot, run, kill),
        ));
        Ok(times)
    }

    fn start(&self, slot: u64, run: u32) -> Result<(), StressError> {
        let (spec, manager) = {
            let mut guard = self.state.borrow_mut();
            let state = &mut *guard;
            let spec = state.workload.launch_spec(slot, run, state.rng.as_mut())?;
            (spec, state.manager()?)
        };
        let tracked = manager.run(&spec)?;
        if let Some(entry) = self.state.borrow_mut().slots.get_mut(&slot) {
            entry.pid = Some(tracked.pid);
        }
        Ok(())
    }

    fn stop(
        &self,
        event_loop: &mut EventLoop,
        slot: u64,
        run: u32,
        kill: bool,
    ) -> Result<(), StressError> {
        let (pid, manager) = {
            let mut state = self.state.borrow_mut();
            let pid = state
                .slots
                .get_mut(&slot)
                .and_then(|entry| entry.pid.take())
                .ok_or_else(|| StressError::SlotNotRunning {
                    pool: self.name.to_string(),
                    slot,
                })?;
            (pid, state.manager()?)
        };
        if kill {
            manager.kill(pid)?;
        } else {
            manager.interrupt(pid)?;
        }
        debug!(pool = %self.name, slot, run, "cycle finished");
        self.schedule(event_loop, slot, run + 1, false)?;
        Ok(())
    }
}

impl SchedulingPolicy for CyclicPoolPolicy {
    fn name(&self) -> &str {
        &self.name
    }

    fn ready(
        &self,
        event_loop: &mut EventLoop,
        manager: &ProcessGroupManager,
    ) -> Result<(), StressError> {
        let initial = {
            let mut state = self.state.borrow_mut();
            state.manager = Some(manager.clone());
            state.config.initial_slots
        };
        self.increase_slot_count(event_loop, initial, false)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::core::GroupSignal;
    use crate::infra::RecordingLauncher;
    use crate::util::clock::SimulatedClock;
    use crate::util::random::StdRandom;

    fn setup(
        config: CyclicPoolConfig,
    ) -> (CyclicPoolPolicy, EventLoop, ProcessGroupManager, Arc<RecordingLauncher>) {
        let launcher = Arc::new(RecordingLauncher::new());
        let manager = ProcessGroupManager::new(launcher.clone());
        let pool = CyclicPoolPolicy::new(config, Workload::Sleeper, StdRandom::seeded(5)).unwrap();
        (pool, EventLoop::new(SimulatedClock::new()), manager, launcher)
    }

    #[test]
    fn test_invalid_config_rejected_at_construction() {
        let cfg = CyclicPoolConfig::new("bad", 1, 10, 1);
        assert!(CyclicPoolPolicy::new(cfg, Workload::Sleeper, StdRandom::seeded(1)).is_err());
    }

    #[test]
    fn test_ready_schedules_start_and_stop_per_slot() {
        let (pool, mut el, manager, _) = setup(CyclicPoolConfig::new("p", 3, 1, 1));
        pool.ready(&mut el, &manager).unwrap();
        assert_eq!(pool.slot_ids(), vec![1, 2, 3]);
        assert_eq!(el.len(), 6);
    }

    #[test]
    fn test_stop_is_strictly_after_start() {
        let cfg = CyclicPoolConfig::new("p", 0, 0, 3)
            .with_start_range(0, 4)
            .with_stop_margin_ms(1);
        let (pool, mut el, manager, _) = setup(cfg);
        pool.ready(&mut el, &manager).unwrap();
        for slot in 1..200 {
            let times = pool.schedule(&mut el, slot, 1, slot % 2 == 0).unwrap();
            assert!(times.stop_at > times.start_at);
        }
    }

    #[test]
    fn test_cycle_restarts_with_next_run_number() {
        let (pool, mut el, manager, launcher) = setup(CyclicPoolConfig::new("p", 1, 1, 1));
        pool.ready(&mut el, &manager).unwrap();

        el.run_until(Duration::from_secs(2)).unwrap();
        let slot = pool.slot(1).unwrap();
        assert_eq!(slot.run_number, 1);
        assert!(slot.pid.is_some());

        el.run_until(Duration::from_secs(3)).unwrap();
        let slot = pool.slot(1).unwrap();
        assert_eq!(slot.run_number, 2);
        let names: Vec<_> = launcher.spawned().into_iter().map(|s| s.nick).collect();
        assert_eq!(names, vec!["dummy-1-1", "dummy-1-2"]);
        assert_eq!(launcher.signals().len(), 1);
        assert_eq!(launcher.signals()[0].1, GroupSignal::Interrupt);
    }

    #[test]
    fn test_kill_chance_one_always_kills() {
        let cfg = CyclicPoolConfig::new("p", 2, 1, 2).with_kill_chance(1.0);
        let (pool, mut el, manager, launcher) = setup(cfg);
        pool.ready(&mut el, &manager).unwrap();
        el.run_until(Duration::from_secs(20)).unwrap();
        let signals = launcher.signals();
        assert!(!signals.is_empty());
        assert!(signals.iter().all(|(_, s)| *s == GroupSignal::Kill));
    }

    #[test]
    fn test_increase_never_reuses_ids() {
        let (pool, mut el, manager, _) = setup(CyclicPoolConfig::new("p", 2, 1, 1));
        pool.ready(&mut el, &manager).unwrap();
        el.run_until(Duration::from_secs(5)).unwrap();
        let added = pool.increase_slot_count(&mut el, 3, true).unwrap();
        assert_eq!(added, vec![3, 4, 5]);
        assert_eq!(pool.slot_count(), 5);
        let added = pool.increase_slot_count(&mut el, 1, false).unwrap();
        assert_eq!(added, vec![6]);
    }

    #[test]
    fn test_immediate_start_has_no_delay() {
        let cfg = CyclicPoolConfig::new("p", 0, 1, 1).with_start_range(5, 5);
        let (pool, mut el, manager, _) = setup(cfg);
        pool.ready(&mut el, &manager).unwrap();
        let now = pool.schedule(&mut el, 1, 1, true).unwrap();
        assert_eq!(now.start_at, Duration::ZERO);
        let later = pool.schedule(&mut el, 2, 1, false).unwrap();
        assert_eq!(later.start_at, Duration::from_secs(5));
    }

    #[test]
    fn test_double_stop_is_an_error() {
        let (pool, mut el, manager, _) = setup(CyclicPoolConfig::new("p", 1, 1, 1));
        pool.ready(&mut el, &manager).unwrap();
        el.run_until(Duration::from_secs(1)).unwrap();
        pool.stop(&mut el, 1, 1, false).unwrap();
        let err = pool.stop(&mut el, 1, 1, false).unwrap_err();
        assert!(matches!(err, StressError::SlotNotRunning { slot: 1, .. }));
    }
}
