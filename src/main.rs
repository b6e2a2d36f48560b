mod analysis;
mod cache;
mod error;
mod experiments;
mod geometry;
mod report;
mod trace;
use anyhow::{Context, Result};
use cache::{CacheConfig, ReplacementPolicy, replay};
use clap::Parser;
use experiments::{ScenarioResult, associativity_sweep, run_scenarios};
use std::path::PathBuf;
use trace::TraceFile;
use tracing_subscriber::EnvFilter;

/// Replays memory reference traces against a set-associative cache.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Size of main memory in bytes
    #[arg(short, long, default_value_t = 64 * 1024)]
    memory: u64,

    /// Size of the cache in bytes
    #[arg(short, long, default_value_t = 1024)]
    cache: u64,

    /// Block/line size in bytes
    #[arg(short, long, default_value_t = 16)]
    line: u64,

    /// Degree of set-associativity (n for an n-way mapping)
    #[arg(short, long, default_value_t = 2)]
    ways: u64,

    /// Replacement policy: L/LRU or F/FIFO
    #[arg(short, long, default_value = "L")]
    policy: ReplacementPolicy,

    /// Run every associativity under both policies instead of a single cache
    #[arg(long)]
    sweep: bool,

    /// Skip the per-access table
    #[arg(short, long)]
    quiet: bool,

    /// Trace files of memory references
    #[arg(required = true)]
    traces: Vec<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = CacheConfig {
        memory_size: args.memory,
        cache_size: args.cache,
        line_size: args.line,
        associativity: args.ways,
        policy: args.policy,
    };
    // Reject bad sizes before touching any trace.
    let geometry = config.geometry().context("Invalid cache configuration")?;

    let traces = load_traces(&args.traces)?;
    if args.sweep {
        let results = run_scenarios(&traces, &associativity_sweep(&config));
        print_section("Associativity Sweep", &results);
        return Ok(());
    }

    for trace in &traces {
        print_config(&config, &trace.name);
        let sim = replay(geometry, config.policy, &trace.entries)
            .with_context(|| format!("Unable to simulate {}", trace.name))?;
        println!("{}", report::render(&sim, !args.quiet)?);
    }
    Ok(())
}

fn print_config(config: &CacheConfig, trace_name: &str) {
    println!("\n--- Memory Sim ---");
    println!("Main Mem size: {}", config.memory_size);
    println!("Cache size   : {}", config.cache_size);
    println!("Line size    : {}", config.line_size);
    println!("Degree of ass: {}", config.associativity);
    println!("Replace Pol  : {}", config.policy);
    println!("Input File   : {trace_name}\n");
}

fn print_section(title: &str, results: &[ScenarioResult]) {
    println!("\n== {title} ==");
    for scenario in results {
        print!("{scenario}");
    }
}

fn load_traces(paths: &[PathBuf]) -> Result<Vec<TraceFile>> {
    let mut traces = Vec::new();
    for path in paths {
        traces.push(TraceFile::load(path)?);
    }
    tracing::info!(count = traces.len(), "loaded traces");
    Ok(traces)
}
