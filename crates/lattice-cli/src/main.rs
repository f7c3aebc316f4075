//! lattice - run an elementary cellular automaton with one actor per cell
//!
//! Usage:
//!   lattice --size 64 --rule 110 --seed 0x1 --generations 40
//!   lattice --row 0001000 --rule 30 --format blocks
//!   lattice --boundary ring --format json
//!
//! Unset flags fall back to `LATTICE_*` environment variables, then to the
//! built-in defaults. Snapshots go to stdout, logs to stderr.

mod render;

use std::io::{self, BufWriter};
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use lattice_runtime::{BoundaryPolicy, Lattice, LatticeConfig, Row, Seed};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use render::{Format, Renderer};

#[derive(Debug, Parser)]
#[command(name = "lattice", version, about = "Elementary cellular automaton on an actor runtime")]
struct Args {
    /// Number of cells
    #[arg(short = 'n', long)]
    size: Option<usize>,

    /// Wolfram rule number (0-255)
    #[arg(short, long)]
    rule: Option<u32>,

    /// Seed integer, bit i is position i (`65536`, `0x10000`, `0b101`)
    #[arg(short, long, conflicts_with = "row")]
    seed: Option<Seed>,

    /// Explicit seed row, left to right (`0010100`). Sets the size if
    /// `--size` is absent.
    #[arg(long)]
    row: Option<Row>,

    /// Generations to compute after the seed
    #[arg(short, long)]
    generations: Option<u64>,

    /// Worker threads for the runtime
    #[arg(short = 'j', long)]
    parallelism: Option<usize>,

    /// Edge handling: `zero` or `ring`
    #[arg(long)]
    boundary: Option<BoundaryPolicy>,

    /// Fail if a generation is not collected within this many milliseconds
    #[arg(long)]
    stall_timeout_ms: Option<u64>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = Format::Digits)]
    format: Format,
}

impl Args {
    /// Overlay the flags onto an environment-derived config.
    fn apply(self, mut config: LatticeConfig) -> LatticeConfig {
        if let Some(row) = self.row {
            if self.size.is_none() {
                config.size = row.len();
            }
            config.seed = Seed::from(row);
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(size) = self.size {
            config.size = size;
        }
        if let Some(rule) = self.rule {
            config.rule = rule;
        }
        if let Some(generations) = self.generations {
            config.generations = generations;
        }
        if let Some(workers) = self.parallelism {
            config.parallelism = Some(workers);
        }
        if let Some(boundary) = self.boundary {
            config.boundary = boundary;
        }
        if let Some(ms) = self.stall_timeout_ms {
            config.stall_timeout = Some(Duration::from_millis(ms));
        }
        config
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lattice=info,lattice_runtime=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let format = args.format;
    let config = args.apply(LatticeConfig::from_env().context("reading LATTICE_* environment")?);

    let mut builder = tokio::runtime::Builder::new_multi_thread();
    if let Some(workers) = config.parallelism.filter(|&w| w > 0) {
        builder.worker_threads(workers);
    }
    let runtime = builder.enable_all().build().context("building tokio runtime")?;

    runtime.block_on(run(config, format))
}

async fn run(config: LatticeConfig, format: Format) -> anyhow::Result<()> {
    let lattice = Lattice::new(config).context("invalid lattice configuration")?;

    let cancel = lattice.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling run");
            cancel.cancel();
        }
    });

    let mut renderer = Renderer::new(format, BufWriter::new(io::stdout()));
    renderer.header(lattice.rule(), lattice.seed())?;

    let summary = lattice.run(&mut renderer).await?;
    renderer.finish().context("writing snapshots")?;

    info!(generations = summary.generations, "Run complete");
    Ok(())
}
