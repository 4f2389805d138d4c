//! `stress-scheduler`: run a relay stress scenario.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use parking_lot::Mutex;
use tracing::info;

use stress_scheduler::builders::{build_scenario, system_load_gate, LoadGateParts};
use stress_scheduler::config::{LoadGateConfig, ScenarioConfig, StressEnvironment};
use stress_scheduler::core::{
    AppResult, EventLoop, FileActivitySink, InMemoryActivitySink, LoopExit, ProcessGroupManager,
    StressError,
};
use stress_scheduler::infra::{FixedLoad, OsProcessLauncher, RecordingLauncher};
use stress_scheduler::policy::LoadSample;
use stress_scheduler::runtime::{install_signal_cleanup, run_provisioning, run_scenario};
use stress_scheduler::util::{init_tracing, SimulatedClock, SystemClock};

/// Start, run and stop relay clients at random, growing the load while the
/// host keeps up.
#[derive(Parser, Debug)]
#[command(name = "stress-scheduler", version)]
struct Opts {
    /// Fixed count of client pairs. With --ramp-up this is the maximum
    /// count, 0 meaning unlimited.
    #[clap(required_unless_present = "config")]
    count: Option<u64>,
    /// Stop after this many seconds; 0 runs until interrupted.
    #[clap(long, default_value = "0")]
    max_time: u64,
    /// Gradually increase load in these increments.
    #[clap(short, long, default_value = "0")]
    ramp_up: u64,
    /// Run sleepers instead of publishers and subscribers.
    #[clap(long)]
    dummy: bool,
    /// Run the relays under mutrace.
    #[clap(long)]
    profile: bool,
    /// JSON scenario file. Command-line values override it.
    #[clap(long, env = "STRESS_SCENARIO")]
    config: Option<PathBuf>,
    /// Seed every random draw for a reproducible schedule.
    #[clap(long)]
    seed: Option<u64>,
    /// Dry run: simulate this many seconds without launching anything and
    /// print what would have happened.
    #[clap(long, value_name = "SECS")]
    simulate: Option<u64>,
    /// Write RUN/SIGINT/SIGKILL records to this file.
    #[clap(long)]
    activity_log: Option<PathBuf>,
    /// Increase log verbosity (-v debug, -vv trace).
    #[clap(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Opts {
    fn scenario(&self) -> AppResult<ScenarioConfig> {
        let mut cfg: ScenarioConfig = match &self.config {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("reading {}", path.display()))?;
                serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?
            }
            None => ScenarioConfig::new(0),
        };
        if let Some(count) = self.count {
            cfg.count = count;
        }
        if self.max_time > 0 {
            cfg.max_time_secs = self.max_time;
        }
        if self.ramp_up > 0 {
            cfg.ramp_up = self.ramp_up;
        }
        cfg.dummy |= self.dummy;
        cfg.profile_relays |= self.profile;
        cfg.validate()?;
        Ok(cfg)
    }
}

fn run(cfg: &ScenarioConfig, opts: &Opts) -> AppResult<i32> {
    let env = Arc::new(StressEnvironment::from_process_env()?);
    run_provisioning(&cfg.provision_command)?;
    env.require(&env.artifacts.shared())
        .context("security artifacts missing after provisioning")?;

    let scenario = build_scenario(cfg, env, opts.seed, system_load_gate)?;
    let mut manager = ProcessGroupManager::new(Arc::new(OsProcessLauncher::new()));
    if let Some(path) = &opts.activity_log {
        let sink = FileActivitySink::create(path)
            .with_context(|| format!("opening {}", path.display()))?;
        manager = manager.with_activity(Arc::new(Mutex::new(sink)));
    }
    install_signal_cleanup(&manager)?;

    let mut event_loop = EventLoop::new(SystemClock::new());
    let exit = run_scenario(&scenario.policies, &mut event_loop, &manager, None)?;
    Ok(match exit {
        LoopExit::Requested(request) => request.code,
        LoopExit::Drained | LoopExit::Deadline => 0,
    })
}

fn idle_gate(_: &LoadGateConfig) -> Result<LoadGateParts, StressError> {
    let idle = LoadSample::per_core([0.0; 3], 1);
    Ok((Box::new(FixedLoad(idle)), Box::new(std::io::sink())))
}

fn simulate(cfg: &ScenarioConfig, seed: Option<u64>, horizon: Duration) -> AppResult<i32> {
    let env = StressEnvironment::from_process_env()
        .unwrap_or_else(|_| StressEnvironment::new(".", |_| None))
        .without_artifact_checks();
    let scenario = build_scenario(cfg, Arc::new(env), Some(seed.unwrap_or(0)), idle_gate)?;

    let clock = SimulatedClock::new();
    let sink = Arc::new(Mutex::new(InMemoryActivitySink::new(100_000)));
    let launcher = Arc::new(RecordingLauncher::new());
    let manager = ProcessGroupManager::new(launcher.clone())
        .with_clock(clock.clone())
        .with_activity(sink.clone());
    let mut event_loop = EventLoop::new(clock);

    let exit = run_scenario(&scenario.policies, &mut event_loop, &manager, Some(horizon))?;
    for record in sink.lock().records() {
        println!("{record}");
    }
    info!(
        ?exit,
        spawned = launcher.spawned().len(),
        signalled = launcher.signals().len(),
        "simulation finished"
    );
    Ok(match exit {
        LoopExit::Requested(request) => request.code,
        LoopExit::Drained | LoopExit::Deadline => 0,
    })
}

fn main() -> AppResult<()> {
    let _ = dotenvy::dotenv();
    let opts = Opts::parse();
    init_tracing(opts.verbose);

    let cfg = opts.scenario()?;
    let code = match opts.simulate {
        Some(secs) => simulate(&cfg, opts.seed, Duration::from_secs(secs))?,
        None => run(&cfg, &opts)?,
    };
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}
