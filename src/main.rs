use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use color_eyre::Result;
use color_eyre::eyre::eyre;
use hostsnap::config::{Config, load_config, load_config_from_path};
use hostsnap::report::{HostReport, SortKey};
use hostsnap::{CpuSnapshot, HostProvider, SnapshotProvider};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "hostsnap",
    about = "Point-in-time host resource snapshots",
    version
)]
struct Cli {
    /// Path to config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Emit the full report as JSON instead of text
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Keep sampling until interrupted
    #[arg(long, default_value_t = false)]
    watch: bool,

    /// Sampling interval for watch mode, in milliseconds
    #[arg(long)]
    interval: Option<u64>,

    /// Number of processes shown in the text report
    #[arg(long)]
    top: Option<usize>,

    /// Process table order: memory, cpu, pid
    #[arg(long)]
    sort: Option<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config_for_cli(&cli);

    if config.general.interval_ms == 0 {
        return Err(eyre!("--interval must be greater than 0"));
    }
    let Some(sort) = SortKey::parse(&config.general.sort) else {
        return Err(eyre!(
            "unknown sort key `{}` (expected memory, cpu, or pid)",
            config.general.sort
        ));
    };
    let json = cli.json || config.output.format == "json";

    let provider = HostProvider::new();

    if cli.watch {
        watch(&provider, &config, sort, json).await
    } else {
        emit_report(&provider, &config, sort, json, None)?;
        Ok(())
    }
}

async fn watch(
    provider: &dyn SnapshotProvider,
    config: &Config,
    sort: SortKey,
    json: bool,
) -> Result<()> {
    let mut interval = tokio::time::interval(Duration::from_millis(config.general.interval_ms));
    let mut previous_cpu: Option<CpuSnapshot> = None;

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let cpu = emit_report(provider, config, sort, json, previous_cpu.as_ref())?;
                previous_cpu = Some(cpu);
                if !json {
                    println!();
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    Ok(())
}

/// Gather and print one report. Returns the CPU counters so watch mode
/// can derive a busy share on the next tick.
fn emit_report(
    provider: &dyn SnapshotProvider,
    config: &Config,
    sort: SortKey,
    json: bool,
    previous_cpu: Option<&CpuSnapshot>,
) -> Result<CpuSnapshot> {
    let mut report = HostReport::gather(provider)?;
    let cpu = report.cpu;

    if json {
        // The JSON surface carries the full listing untouched; ordering
        // and truncation are text-report concerns.
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        report.sort_and_truncate(sort, config.general.top);
        let usage = previous_cpu.and_then(|earlier| report.cpu.usage_since(earlier));
        print!("{}", report.render_text(usage));
    }

    Ok(cpu)
}

fn load_config_for_cli(cli: &Cli) -> Config {
    let mut config = match &cli.config {
        Some(path) => load_config_from_path(path),
        None => load_config(),
    };

    if let Some(interval) = cli.interval {
        config.general.interval_ms = interval;
    }
    if let Some(top) = cli.top {
        config.general.top = top;
    }
    if let Some(ref sort) = cli.sort {
        config.general.sort = sort.clone();
    }

    config
}
