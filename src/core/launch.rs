//! Command description handed to a process launcher.

use std::path::PathBuf;

/// Everything needed to start one worker process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchSpec {
    /// Nickname used in logs, e.g. `subscriber-4-2`.
    pub nick: String,
    /// Executable path.
    pub program: String,
    /// Arguments after the program.
    pub args: Vec<String>,
    /// Environment overrides applied on top of the scheduler's environment.
    pub env: Vec<(String, String)>,
    /// Log file to delete before starting, so each identity starts fresh.
    pub fresh_log: Option<PathBuf>,
    /// File that receives the child's stderr instead of the inherited one.
    pub stderr_to: Option<PathBuf>,
}

impl LaunchSpec {
    /// Spec for `program` with no arguments.
    pub fn new(nick: impl Into<String>, program: impl Into<String>) -> Self {
        Self {
            nick: nick.into(),
            program: program.into(),
            ..Self::default()
        }
    }

    /// Append arguments.
    #[must_use]
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Append environment overrides.
    #[must_use]
    pub fn with_env(mut self, env: impl IntoIterator<Item = (String, String)>) -> Self {
        self.env.extend(env);
        self
    }

    /// Delete `path` before launch.
    #[must_use]
    pub fn with_fresh_log(mut self, path: impl Into<PathBuf>) -> Self {
        self.fresh_log = Some(path.into());
        self
    }

    /// Redirect stderr to `path`.
    #[must_use]
    pub fn with_stderr_to(mut self, path: impl Into<PathBuf>) -> Self {
        self.stderr_to = Some(path.into());
        self
    }

    /// Program followed by its arguments, as logged.
    pub fn command_line(&self) -> Vec<String> {
        std::iter::once(self.program.clone())
            .chain(self.args.iter().cloned())
            .collect()
    }
}
