//! Core scheduling abstractions: events, the event loop, and process groups.

pub mod activity;
pub mod error;
pub mod event;
pub mod event_loop;
pub mod launch;
pub mod process;

pub use activity::{
    ActivityAction, ActivityRecord, ActivitySink, FileActivitySink, InMemoryActivitySink,
};
pub use error::{AppResult, StressError};
pub use event::{Action, Event, Priority};
pub use event_loop::{EventLoop, ExitRequest, LoopExit};
pub use launch::LaunchSpec;
pub use process::{CleanupGuard, GroupSignal, ProcessGroupManager, ProcessLauncher, TrackedProcess};
