//! Piggy Smash Simulator
//!
//! Usage:
//!   ps-sim spin --seed 7                      - One spin, printed as JSON
//!   ps-sim simulate --spins 1000000 --seed 7  - Batch run with RTP report
//!   ps-sim config --format yaml               - Dump the default config

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use rayon::prelude::*;

use ps_slot_lab::{SessionStats, SlotConfig, SlotEngine};

#[derive(Parser)]
#[command(name = "ps-sim", about = "Piggy Smash rules simulator")]
struct Cli {
    /// JSON or YAML config file (defaults to the production config)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play one spin and print the result
    Spin {
        #[arg(short, long)]
        seed: Option<u64>,
        #[arg(long, default_value_t = 10.0)]
        stake: f64,
        /// Include the stage trace
        #[arg(long)]
        trace: bool,
    },
    /// Play many spins and report RTP, hit rate and bonus frequency
    Simulate {
        #[arg(short = 'n', long, default_value_t = 100_000)]
        spins: u64,
        #[arg(short, long, default_value_t = 0)]
        seed: u64,
        #[arg(long, default_value_t = 10.0)]
        stake: f64,
        /// Worker threads (0 = one per core)
        #[arg(short, long, default_value_t = 0)]
        threads: usize,
        /// Print the merged statistics as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the effective configuration
    Config {
        #[arg(short, long, value_enum, default_value_t = Format::Json)]
        format: Format,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Json,
    Yaml,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Spin { seed, stake, trace } => run_spin(config, seed, stake, trace),
        Commands::Simulate {
            spins,
            seed,
            stake,
            threads,
            json,
        } => run_simulation(config, spins, seed, stake, threads, json),
        Commands::Config { format } => print_config(&config, format),
    }
}

fn load_config(path: Option<&Path>) -> Result<SlotConfig> {
    let Some(path) = path else {
        return Ok(SlotConfig::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let is_yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml" | "yml")
    );
    let config = if is_yaml {
        SlotConfig::from_yaml_str(&text)
    } else {
        SlotConfig::from_json_str(&text)
    };
    config.with_context(|| format!("Invalid config {}", path.display()))
}

fn run_spin(config: SlotConfig, seed: Option<u64>, stake: f64, trace: bool) -> Result<()> {
    let mut engine = SlotEngine::with_config(config, seed).context("Failed to create engine")?;
    let result = engine.spin(stake).context("Spin failed")?;

    let mut out = serde_json::to_value(&result)?;
    if trace {
        let trace = serde_json::to_value(engine.last_trace())?;
        if let Some(obj) = out.as_object_mut() {
            obj.insert("trace".into(), trace);
        }
    }
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

fn run_simulation(
    config: SlotConfig,
    spins: u64,
    seed: u64,
    stake: f64,
    threads: usize,
    json: bool,
) -> Result<()> {
    if spins == 0 {
        bail!("--spins must be at least 1");
    }
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .context("Failed to build thread pool")?;
    let workers = pool.current_num_threads() as u64;
    log::info!("Simulating {spins} spins on {workers} threads (seed {seed})");

    let shares: Vec<(u64, u64)> = (0..workers)
        .map(|i| (i, spins / workers + u64::from(i < spins % workers)))
        .filter(|(_, n)| *n > 0)
        .collect();

    let sessions: Vec<SessionStats> = pool.install(|| {
        shares
            .par_iter()
            .map(|&(worker, count)| {
                simulate_worker(config.clone(), seed.wrapping_add(worker), stake, count)
            })
            .collect::<Result<Vec<_>>>()
    })?;

    let mut stats = SessionStats::default();
    for session in &sessions {
        stats.merge(session);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        print_report(&stats);
    }
    Ok(())
}

fn simulate_worker(config: SlotConfig, seed: u64, stake: f64, spins: u64) -> Result<SessionStats> {
    let top_up = config.starting_balance.max(stake);
    let mut engine = SlotEngine::with_config(config, Some(seed))
        .with_context(|| format!("Failed to create engine for seed {seed}"))?;

    for n in 0..spins {
        if engine.balance() < stake {
            engine.deposit(top_up);
        }
        engine
            .spin(stake)
            .with_context(|| format!("Spin {n} failed (seed {seed})"))?;
    }
    log::debug!("worker seed {seed}: {spins} spins, RTP {:.2}%", engine.stats().rtp());
    Ok(engine.stats().clone())
}

fn print_report(stats: &SessionStats) {
    println!("═══════════════════════════════════════════");
    println!(" Spins           {:>14}", stats.total_spins);
    println!(" Wagered         {:>14.2}", stats.total_bet);
    println!(" Won             {:>14.2}", stats.total_win);
    println!(" RTP             {:>13.3}%", stats.rtp());
    println!(" Hit rate        {:>13.3}%", stats.hit_rate());
    match stats.feature_frequency() {
        Some(every) => println!(
            " Lock & Win      {:>14} (1 in {every:.0})",
            stats.features_triggered
        ),
        None => println!(" Lock & Win      {:>14}", 0),
    }
    println!(" Full boards     {:>14}", stats.full_boards);
    println!(" Hammer awards   {:>14}", stats.hammer_awards);
    println!(" Max win         {:>13.1}x", stats.max_win_ratio);
    println!("═══════════════════════════════════════════");
}

fn print_config(config: &SlotConfig, format: Format) -> Result<()> {
    let text = match format {
        Format::Json => config.to_json(),
        Format::Yaml => config.to_yaml(),
    }
    .context("Failed to serialize config")?;
    println!("{text}");
    Ok(())
}
