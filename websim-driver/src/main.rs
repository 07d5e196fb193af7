//! CLI entry point for the web-serving topology simulator: loads a sweep
//! matrix (from an optional TOML file, else the built-in default matrix),
//! runs every combination to completion, and appends one summary row per
//! combination to a CSV file. Mirrors how `firezone-relay`'s binary wires
//! up a sans-IO engine with real I/O around it, while the engine itself
//! (`websim-core`) never touches the filesystem.

mod csv_out;
#[cfg(feature = "plot")]
mod plots;
mod sweep;

use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use sweep::SweepConfig;

/// Runs the web-serving topology discrete-event simulation sweep.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Optional TOML file describing the sweep matrix and fixed
    /// parameters. Falls back to the built-in default matrix when omitted.
    #[arg(long, env = "WEBSIM_CONFIG")]
    config: Option<PathBuf>,

    /// Where to append the summary CSV. Any existing file is truncated at
    /// the start of the sweep, matching the reference driver's behavior.
    #[arg(long, env = "WEBSIM_OUT", default_value = "output.csv")]
    out: PathBuf,

    /// Overrides the RNG seed from the config file, if given.
    #[arg(long, env = "WEBSIM_SEED")]
    seed: Option<u64>,

    /// Overrides the simulated horizon (virtual seconds) from the config
    /// file, if given.
    #[arg(long, env = "WEBSIM_HORIZON")]
    horizon_seconds: Option<f64>,

    /// Directory to render per-series plots into. Requires the `plot`
    /// feature; a run without it ignores this flag with a warning.
    #[arg(long, env = "WEBSIM_PLOT_DIR")]
    plot_dir: Option<PathBuf>,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn load_config(cli: &Cli) -> anyhow::Result<SweepConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read sweep config {}", path.display()))?;
            toml::from_str(&raw)
                .with_context(|| format!("failed to parse sweep config {}", path.display()))?
        }
        None => SweepConfig::default(),
    };

    if let Some(seed) = cli.seed {
        config.seed = seed;
    }
    if let Some(horizon) = cli.horizon_seconds {
        config.horizon_seconds = horizon;
    }
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    #[cfg(not(feature = "plot"))]
    if cli.plot_dir.is_some() {
        tracing::warn!("--plot-dir was given but this binary was built without the `plot` feature; ignoring");
    }

    let combinations = sweep::matrix(&config);
    tracing::info!(runs = combinations.len(), "starting sweep");

    let mut writer = csv_out::Writer::create(&cli.out)?;

    for params in &combinations {
        let sim_config = sweep::build_sim_config(&config, params);
        let (summary, _world) = sweep::run_one(&sim_config).with_context(|| {
            format!(
                "run failed for {} clients / {:?} / {:?} / {:?} / {:?}",
                params.num_clients,
                params.strategy,
                params.topology,
                params.service_time_tier,
                params.cache_time_tier,
            )
        })?;

        writer.write_row(params, &summary)?;

        #[cfg(feature = "plot")]
        if let Some(dir) = &cli.plot_dir {
            let run_dir = dir.join(format!(
                "{}_{}_{}_{}_{}",
                params.num_clients,
                params.strategy.as_str(),
                params.topology.as_str(),
                params.service_time_tier.as_str(),
                params.cache_time_tier.as_str(),
            ));
            plots::render_all(_world.metrics(), &run_dir)?;
        }
    }

    writer.flush()?;
    tracing::info!(out = %cli.out.display(), "sweep complete");
    Ok(())
}
