//! Activity sinks.
//!
//! Every spawn and signal is recorded so a run can be reconstructed after the
//! fact: what ran, under which pid, with which arguments, and when it was
//! stopped.

use std::collections::VecDeque;
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Duration;

/// What happened to a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActivityAction {
    /// Process group started.
    Run,
    /// Graceful interrupt sent to the group.
    Interrupt,
    /// Forced kill sent to the group.
    Kill,
}

impl fmt::Display for ActivityAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Run => "RUN",
            Self::Interrupt => "SIGINT",
            Self::Kill => "SIGKILL",
        })
    }
}

/// One recorded process action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityRecord {
    /// Time since the manager was created.
    pub elapsed: Duration,
    /// Action taken.
    pub action: ActivityAction,
    /// Process nickname, e.g. `publisher-3-2`.
    pub nick: String,
    /// Process id (also the process group id).
    pub pid: u32,
    /// Program followed by its arguments.
    pub args: Vec<String>,
}

impl fmt::Display for ActivityRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.3} {} {} {} {:?}",
            self.elapsed.as_secs_f64(),
            self.action,
            self.nick,
            self.pid,
            self.args
        )
    }
}

/// Activity sink abstraction.
pub trait ActivitySink: Send {
    /// Record an activity.
    fn record(&mut self, record: ActivityRecord);
}

/// Bounded in-memory sink for tests and dry runs.
pub struct InMemoryActivitySink {
    records: VecDeque<ActivityRecord>,
    max_records: usize,
}

impl InMemoryActivitySink {
    /// Create a sink keeping at most `max_records` entries.
    pub fn new(max_records: usize) -> Self {
        Self {
            records: VecDeque::with_capacity(max_records.min(1024)),
            max_records,
        }
    }

    /// Snapshot of stored records, oldest first.
    pub fn records(&self) -> Vec<ActivityRecord> {
        self.records.iter().cloned().collect()
    }
}

impl ActivitySink for InMemoryActivitySink {
    fn record(&mut self, record: ActivityRecord) {
        if self.records.len() >= self.max_records {
            self.records.pop_front();
        }
        self.records.push_back(record);
    }
}

/// Line-per-record file sink, flushed after every write.
pub struct FileActivitySink {
    out: BufWriter<File>,
}

impl FileActivitySink {
    /// Create (truncating) the activity file at `path`.
    pub fn create(path: impl AsRef<Path>) -> std::io::Result<Self> {
        Ok(Self {
            out: BufWriter::new(File::create(path)?),
        })
    }
}

impl ActivitySink for FileActivitySink {
    fn record(&mut self, record: ActivityRecord) {
        if let Err(e) = writeln!(self.out, "{record}").and_then(|()| self.out.flush()) {
            tracing::error!("failed to write activity record: {e}");
        }
    }
}
