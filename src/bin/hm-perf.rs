use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use harmony_metrics::memory::display_label;
use harmony_metrics::prelude::*;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// HarmonyOS performance sampling and report aggregation
#[derive(Parser)]
#[command(name = "hm-perf", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Aggregate a completed series log into a JSON export
    Aggregate {
        /// Series CSV written by a previous run
        series: PathBuf,
        /// Output path, defaults to the series path with a `.json` extension
        #[arg(long)]
        out: Option<PathBuf>,
        /// `raw`, `iso8601` or `iso8601+HH:MM`
        #[arg(long, default_value = "iso8601")]
        timestamps: TimestampFormat,
    },
    /// Sample a package on a connected device until the duration elapses or Ctrl-C
    Record {
        #[arg(long)]
        package: String,
        /// JSON configuration file; command-line flags override it
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        duration_secs: Option<u64>,
        #[arg(long)]
        interval_ms: Option<u64>,
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
    /// Parse one saved dump and print the sample as JSON
    Parse {
        dump: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(e) = run(Cli::parse()).await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Aggregate { series, out, timestamps } => {
            let export = aggregate_file(&series, timestamps)?;
            let out = out.unwrap_or_else(|| series.with_extension("json"));
            export.write_json(&out)?;
            print_summary(&export);
        },
        Commands::Record { package, config, duration_secs, interval_ms, out_dir } => {
            let mut config = match config {
                Some(path) => SamplerConfig::from_json_file(path)?,
                None => SamplerConfig::default(),
            };
            config.package_name = package;
            if let Some(interval_ms) = interval_ms {
                config.interval_ms = interval_ms;
            }
            if let Some(out_dir) = out_dir {
                config.output_dir = out_dir;
            }
            config.validate()?;
            record(config, duration_secs.map(Duration::from_secs)).await?;
        },
        Commands::Parse { dump } => {
            let text = fs::read_to_string(dump)?;
            let sample = SampleAssembler::default().assemble(&text)?;
            println!("{}", serde_json::to_string_pretty(&sample)?);
        },
    }
    Ok(())
}

async fn record(config: SamplerConfig, duration: Option<Duration>) -> Result<()> {
    let source = Arc::new(HdcShellSource::from_config(&config));
    let mut scheduler = SamplingScheduler::new(config, source);
    scheduler.start()?;

    let deadline = async {
        match duration {
            Some(duration) => tokio::time::sleep(duration).await,
            None => std::future::pending().await,
        }
    };

    tokio::select! {
        _ = deadline => info!("duration elapsed"),
        _ = tokio::signal::ctrl_c() => info!("interrupted"),
        _ = scheduler.terminated() => warn!("sampling ended early"),
    }

    if let Some(report) = scheduler.stop().await? {
        println!("ticks: {} ok, {} dropped, {} unwritten", report.ticks_ok, report.ticks_failed, report.write_failures);
        if let Some(reason) = &report.terminated_by {
            println!("ended early: {reason}");
        }
        println!("series: {}", report.series_path.display());
        if let Some(path) = &report.export_path {
            println!("export: {}", path.display());
        }
        print_summary(&report.export);
    }
    Ok(())
}

fn print_summary(export: &Export) {
    for family in export.families() {
        println!("{} ({})", family.index_key(), family.unit());
        for index in export.family(family) {
            println!(
                "  {:<16} max {:>10.2}  min {:>10.2}  mean {:>10.2}",
                display_label(&index.name),
                index.max,
                index.min,
                index.mean
            );
        }
    }
}
