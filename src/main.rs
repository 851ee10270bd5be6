// Main entrypoint for the safemap demo.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Instant;
use tracing::{info, warn};

use safemap::config::{Config, ConfigTrait};
use safemap::ShardedMap;

const CONFIG_PATH: &str = "cfg/safemap.cfg.yaml";
const CONFIG_PATH_LOCAL: &str = "cfg/safemap.cfg.local.yaml";

/// safemap - sharded concurrent map demo and stress run
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Custom config file path
    #[arg(short, long, value_name = "FILE")]
    cfg: Option<PathBuf>,

    /// Number of stress workers (overrides config)
    #[arg(short, long)]
    workers: Option<usize>,

    /// Operations per stress worker (overrides config)
    #[arg(short, long)]
    ops: Option<usize>,
}

/// Loads the configuration struct from YAML file.
/// Tries local config first, then the default config, then built-in defaults.
/// Returns the config and the path it came from.
fn load_cfg(path: Option<PathBuf>) -> Result<(Config, String)> {
    load_cfg_from(path, &[CONFIG_PATH_LOCAL, CONFIG_PATH])
}

/// Only a missing candidate file falls through; a file that exists but
/// cannot be read or parsed is an error.
fn load_cfg_from(path: Option<PathBuf>, candidates: &[&str]) -> Result<(Config, String)> {
    if let Some(custom_path) = path {
        let cfg = Config::load(&custom_path)
            .with_context(|| format!("failed to load custom config from {:?}", custom_path))?;
        return Ok((cfg, custom_path.display().to_string()));
    }

    for &candidate in candidates {
        if !Path::new(candidate).exists() {
            continue;
        }
        let cfg = Config::load(candidate)
            .with_context(|| format!("failed to load config from {}", candidate))?;
        return Ok((cfg, candidate.to_string()));
    }

    Ok((Config::default(), "<defaults>".to_string()))
}

/// Configures structured logging based on configuration.
fn configure_logger(cfg: &Config) {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let log_level = cfg
        .logs()
        .and_then(|logs| logs.level.as_ref())
        .map(|s| s.as_str())
        .unwrap_or("info");

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    if cfg.is_prod() {
        // Production: JSON format
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        // Development: Pretty console format
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().pretty())
            .init();
    }
}

/// Runs the get-or-set walkthrough.
fn run_example() {
    let m: ShardedMap<String, String> = ShardedMap::new();

    let value = m.get_or_set("a".to_string(), "b".to_string());
    info!(component = "main", event = "get_or_set", key = "a", value = %value, "example");

    let (value, ok) = m.get_or_default("a");
    info!(component = "main", event = "get", key = "a", value = %value, found = ok, "example");
}

/// Sizes of a stress run, checked against overflow up front.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct StressPlan {
    workers: usize,
    ops: usize,
    /// Entries expected to survive (odd offsets of every worker range).
    expected_len: usize,
    /// Set, get and del calls across all workers.
    total_ops: usize,
}

impl StressPlan {
    fn new(workers: usize, ops: usize) -> Result<Self> {
        // Worker ranges end at `workers * ops`, so this bounds every key.
        workers
            .checked_mul(ops)
            .with_context(|| format!("key space overflows: {} workers x {} ops", workers, ops))?;

        let total_ops = ops
            .checked_mul(2)
            .and_then(|n| n.checked_add(ops.div_ceil(2)))
            .and_then(|n| n.checked_mul(workers))
            .with_context(|| format!("op count overflows: {} workers x {} ops", workers, ops))?;

        Ok(Self {
            workers,
            ops,
            expected_len: workers * (ops / 2),
            total_ops,
        })
    }
}

/// Hammers a map from `workers` threads on disjoint key ranges.
fn run_stress(cfg: &Config, plan: StressPlan) -> Result<()> {
    let map: ShardedMap<usize, usize> = ShardedMap::from_config(cfg);
    let StressPlan { workers, ops, .. } = plan;
    let started = Instant::now();

    thread::scope(|s| {
        for w in 0..workers {
            let map = &map;
            s.spawn(move || {
                let base = w * ops;
                for i in base..base + ops {
                    map.set(i, i);
                }
                for i in base..base + ops {
                    map.get(&i);
                }
                for i in (base..base + ops).step_by(2) {
                    map.del(&i);
                }
            });
        }
    });

    let elapsed = started.elapsed();
    let len = map.len();

    info!(
        component = "main",
        event = "stress_done",
        shards = map.shard_count(),
        workers,
        ops_per_worker = ops,
        elapsed = ?elapsed,
        ops_per_sec = (plan.total_ops as f64 / elapsed.as_secs_f64().max(f64::EPSILON)) as u64,
        len,
        "stress run finished"
    );

    if len != plan.expected_len {
        anyhow::bail!("lost updates: expected {} entries, found {}", plan.expected_len, len);
    }
    Ok(())
}

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse();

    // Load configuration
    let (cfg, source) = load_cfg(args.cfg)?;

    // Configure logger (must be done after config is loaded)
    configure_logger(&cfg);
    info!(component = "config", event = "load_success", path = %source, "config loaded");

    run_example();

    let stress = cfg.stress();
    let workers = args.workers.unwrap_or(stress.workers);
    let ops = args.ops.unwrap_or(stress.ops_per_worker);
    if workers == 0 {
        warn!(component = "main", event = "stress_skipped", "no stress workers configured");
        return Ok(());
    }

    let plan = StressPlan::new(workers, ops)?;
    run_stress(&cfg, plan)
}
