//! Runs the single-line coherence protocol under a seeded interleaving and
//! prints the final sharer list and counters.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use coherence_config::{CoherenceConfig, SchedulerKind};
use coherence_engine::{Simulation, TraceEntry};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "coherence-sim")]
#[command(about = "Simulate a host arbitrating one shared line among N clients")]
struct Args {
    /// TOML config; flags override its fields
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Number of clients
    #[arg(long)]
    clients: Option<u16>,

    /// Local demands to issue before draining
    #[arg(long)]
    demands: Option<u64>,

    #[arg(long)]
    seed: Option<u64>,

    /// `random` or `round-robin`
    #[arg(long)]
    scheduler: Option<SchedulerKind>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Write every delivery as one JSON object per line
    #[arg(long, value_name = "PATH")]
    trace: Option<PathBuf>,
}

struct Run {
    config: CoherenceConfig,
    json: bool,
    trace: Option<PathBuf>,
}

impl Args {
    fn into_run(self) -> anyhow::Result<Run> {
        let mut config = match &self.config {
            Some(path) => CoherenceConfig::load(path.to_string_lossy().into_owned())
                .with_context(|| format!("loading {}", path.display()))?,
            None => CoherenceConfig::default(),
        };
        if let Some(clients) = self.clients {
            config.clients = clients;
        }
        if let Some(demands) = self.demands {
            config.demands = demands;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(scheduler) = self.scheduler {
            config.scheduler = scheduler;
        }
        config.validate()?;
        Ok(Run {
            config,
            json: self.json,
            trace: self.trace,
        })
    }
}

fn main() -> anyhow::Result<()> {
    let Run {
        config,
        json,
        trace,
    } = Args::parse().into_run()?;
    setup_tracing(&config.log_level);

    info!(
        clients = config.clients,
        demands = config.demands,
        seed = config.seed,
        scheduler = ?config.scheduler,
        "starting simulation"
    );

    let mut simulation = Simulation::from_config(&config)?;
    if trace.is_some() {
        simulation = simulation.with_trace();
    }
    let report = simulation.run().context("simulation failed")?;

    if let Some(path) = &trace {
        write_trace(path, &report.trace)
            .with_context(|| format!("writing trace to {}", path.display()))?;
        info!(path = %path.display(), entries = report.trace.len(), "trace written");
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        let sharers: Vec<String> = report.sharers.iter().map(ToString::to_string).collect();
        let stats = &report.stats;
        println!("sharers:            [{}]", sharers.join(", "));
        println!("exclusive granted:  {}", report.exclusive_granted);
        println!("steps:              {}", stats.steps);
        println!("demands issued:     {}", stats.demands_issued);
        println!("requests:           {}", stats.requests);
        println!(
            "grants:             {} ({} shared, {} exclusive)",
            stats.grants(),
            stats.shared_grants,
            stats.exclusive_grants
        );
        println!("invalidations sent: {}", stats.invalidations_sent);
        println!("deferrals:          {}", stats.deferrals);
        println!("ignored:            {}", stats.ignored);
    }
    Ok(())
}

fn write_trace(path: &Path, trace: &[TraceEntry]) -> anyhow::Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    for entry in trace {
        serde_json::to_writer(&mut out, entry)?;
        out.write_all(b"\n")?;
    }
    out.flush()?;
    Ok(())
}

/// `RUST_LOG` wins over the configured level.
fn setup_tracing(level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
