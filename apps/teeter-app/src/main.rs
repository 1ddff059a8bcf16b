//! teeter biped simulation CLI.
//!
//! Provides three modes of operation:
//! - `run`: Play runs headless and print distance and fall statistics
//! - `check-config`: Validate a scene TOML file
//! - `info`: Print crate versions and the default configuration

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use teeter_core::config::SceneConfig;
use teeter_sim::random::DEFAULT_TOGGLE_PROBABILITY;
use teeter_sim::{HeadlessConfig, InputScript, InputSource, RandomInput, run_headless};

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

/// Physics-driven biped you walk one limb at a time.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Log at debug level.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Play runs headless and print statistics.
    Run {
        /// Scene config TOML; defaults are used when omitted.
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Maximum steps per run.
        #[arg(short = 'n', long, default_value_t = 1_800)]
        steps: u32,

        /// Number of runs.
        #[arg(short, long, default_value_t = 1)]
        runs: u32,

        /// Input timeline, e.g. "q:0-500,o+p:1000-1400".
        #[arg(long, conflicts_with = "random")]
        script: Option<String>,

        /// Mash the controls randomly.
        #[arg(long)]
        random: bool,

        /// Seed for --random.
        #[arg(short, long, default_value_t = 0)]
        seed: u64,
    },

    /// Validate a scene config file.
    CheckConfig {
        path: PathBuf,
    },

    /// Print crate information.
    Info,
}

// ---------------------------------------------------------------------------
// Mode implementations
// ---------------------------------------------------------------------------

fn load_scene(path: Option<&Path>) -> anyhow::Result<SceneConfig> {
    match path {
        Some(path) => SceneConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => Ok(SceneConfig::default()),
    }
}

fn run_runs(
    config: Option<&Path>,
    steps: u32,
    runs: u32,
    script: Option<&str>,
    random: bool,
    seed: u64,
) -> anyhow::Result<()> {
    let scene = load_scene(config)?;
    let input = match script {
        Some(text) => InputSource::Script(
            InputScript::parse(text).with_context(|| format!("invalid script {text:?}"))?,
        ),
        None if random => {
            InputSource::Random(RandomInput::new(seed, DEFAULT_TOGGLE_PROBABILITY))
        }
        None => InputSource::Manual,
    };

    let step_hz = scene.simulation.step_hz();
    let report = run_headless(
        scene,
        HeadlessConfig {
            runs,
            max_steps: steps,
            input,
        },
    )?;

    for run in &report.runs {
        let seconds = f64::from(run.steps) / step_hz;
        println!(
            "run {}: steps={} ({seconds:.2}s), distance={:.3}, {}",
            run.run,
            run.steps,
            run.distance,
            if run.fell { "fell" } else { "standing" }
        );
    }

    let stats = &report.stats;
    println!(
        "\ntotal: runs={}, falls={}, steps={}",
        report.runs.len(),
        stats.runs_completed,
        stats.total_steps
    );
    if let (Some(best), Some(mean)) = (stats.best(), stats.mean_score()) {
        println!("score: best={best:.3}, mean={mean:.3}");
    }
    Ok(())
}

fn check_config(path: &Path) -> anyhow::Result<()> {
    load_scene(Some(path))?;
    println!("{}: ok", path.display());
    Ok(())
}

fn run_info() -> anyhow::Result<()> {
    println!("teeter v{}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("crates:");
    println!("  teeter-core      {}", env!("CARGO_PKG_VERSION"));
    println!("  teeter-physics   {}", env!("CARGO_PKG_VERSION"));
    println!("  teeter-character {}", env!("CARGO_PKG_VERSION"));
    println!("  teeter-sim       {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("default config:");
    println!("{}", toml::to_string_pretty(&SceneConfig::default())?);
    Ok(())
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive(format!("teeter={level}").parse()?))
        .init();

    match cli.command {
        Some(Commands::Run {
            config,
            steps,
            runs,
            script,
            random,
            seed,
        }) => run_runs(config.as_deref(), steps, runs, script.as_deref(), random, seed),
        Some(Commands::CheckConfig { path }) => check_config(&path),
        Some(Commands::Info) => run_info(),
        None => run_runs(None, 1_800, 1, None, false, 0),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
