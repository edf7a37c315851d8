use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use lagrange_core::{
    builtin_scenarios, run_scenario, MechanicalSystem, Scenario, ScenarioOutcome, SolverSettings,
    SystemKind, TrajectoryExporter,
};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "lagrange")]
#[command(about = "Simulate small mechanical systems and export their trajectories", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    solver: SolverArgs,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the built-in scenarios
    List,
    /// Run one built-in scenario and write its document
    Run {
        /// Scenario name (see `list`)
        name: String,
        /// Output file (defaults to the scenario's file name)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Run a system with its default parameters from an arbitrary initial state
    Simulate {
        /// System name, e.g. double-pendulum
        system: SystemKind,
        /// Initial state, comma separated
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true, required = true)]
        y0: Vec<f64>,
        #[arg(long, default_value_t = 0.0)]
        t_start: f64,
        #[arg(long)]
        t_end: f64,
        #[arg(long, default_value_t = 400)]
        samples: usize,
        /// Output file
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Run every built-in scenario in parallel
    RunAll {
        /// Directory receiving one document per scenario
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },
}

#[derive(Args, Debug, Default)]
struct SolverArgs {
    /// Relative tolerance
    #[arg(long, global = true)]
    rtol: Option<f64>,
    /// Absolute tolerance
    #[arg(long, global = true)]
    atol: Option<f64>,
    /// Maximum number of attempted steps per run
    #[arg(long, global = true)]
    max_steps: Option<usize>,
    /// Wall-clock budget per run, in seconds
    #[arg(long, global = true)]
    max_seconds: Option<f64>,
}

impl SolverArgs {
    fn settings(&self) -> Result<SolverSettings> {
        let mut settings = SolverSettings::default();
        if let Some(rtol) = self.rtol {
            settings.rtol = rtol;
        }
        if let Some(atol) = self.atol {
            settings.atol = atol;
        }
        if let Some(max_steps) = self.max_steps {
            settings.max_steps = max_steps;
        }
        if let Some(seconds) = self.max_seconds {
            let budget = Duration::try_from_secs_f64(seconds)
                .with_context(|| format!("invalid --max-seconds value {seconds}"))?;
            settings.max_wall_time = Some(budget);
        }
        settings.validate()?;
        Ok(settings)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let settings = cli.solver.settings()?;

    match cli.command {
        Commands::List => cmd_list(),
        Commands::Run { name, output } => cmd_run(&name, output, &settings),
        Commands::Simulate {
            system,
            y0,
            t_start,
            t_end,
            samples,
            output,
        } => cmd_simulate(system, y0, (t_start, t_end), samples, output, &settings),
        Commands::RunAll { out_dir } => cmd_run_all(&out_dir, &settings),
    }
}

fn cmd_list() -> Result<()> {
    for scenario in builtin_scenarios() {
        println!(
            "{:<24} y0={:?} t=[{}, {}] samples={} -> {}",
            scenario.name,
            scenario.y0,
            scenario.t_start,
            scenario.t_end,
            scenario.samples,
            scenario.output.display()
        );
    }
    Ok(())
}

fn cmd_run(name: &str, output: Option<PathBuf>, settings: &SolverSettings) -> Result<()> {
    let mut scenario = Scenario::find(name)?;
    if let Some(output) = output {
        scenario.output = output;
    }
    let path = scenario.output.clone();
    execute(&scenario, &path, settings)
}

fn cmd_simulate(
    system: SystemKind,
    y0: Vec<f64>,
    span: (f64, f64),
    samples: usize,
    output: PathBuf,
    settings: &SolverSettings,
) -> Result<()> {
    let scenario = Scenario::new(
        system.name(),
        MechanicalSystem::default_for(system),
        y0,
        span,
        samples,
        output.clone(),
    );
    execute(&scenario, &output, settings)
}

fn cmd_run_all(out_dir: &Path, settings: &SolverSettings) -> Result<()> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create output directory {}", out_dir.display()))?;

    let started = Instant::now();
    let scenarios = builtin_scenarios();
    scenarios
        .par_iter()
        .map(|scenario| execute(scenario, &out_dir.join(&scenario.output), settings))
        .collect::<Result<Vec<()>>>()?;

    info!(
        count = scenarios.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "all scenarios written"
    );
    Ok(())
}

fn execute(scenario: &Scenario, path: &Path, settings: &SolverSettings) -> Result<()> {
    let started = Instant::now();
    let outcome = run_scenario(scenario, settings)
        .with_context(|| format!("scenario '{}' failed", scenario.name))?;
    TrajectoryExporter::default()
        .write(&outcome.document, path)
        .with_context(|| format!("failed to store scenario '{}'", scenario.name))?;
    report(scenario, path, &outcome, started.elapsed());
    Ok(())
}

fn report(scenario: &Scenario, path: &Path, outcome: &ScenarioOutcome, elapsed: Duration) {
    let stats = outcome.stats;
    println!(
        "{}: {} samples, {} accepted / {} rejected steps, energy drift {:.3e}, {:.1} ms -> {}",
        scenario.name,
        outcome.document.times().len(),
        stats.accepted_steps,
        stats.rejected_steps,
        outcome.energy_drift,
        elapsed.as_secs_f64() * 1e3,
        path.display()
    );
}
