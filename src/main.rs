use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use vhs_pipeline::{
    config::{Config, Strategy},
    engine::ProcessRequest,
    filtergraph,
    settings::{Preset, VhsSettings},
    video::{JobOutcome, LogProgress},
    VhsEngine,
};

#[derive(Parser)]
#[command(
    name = "vhs-pipeline",
    version,
    about = "Give digital video the look of a worn VHS tape",
    long_about = "Applies chromatic aberration, color drift, tape noise, ghosting, scan lines, tracking glitches, vignetting and a camcorder date stamp to a video, either frame by frame or as a single ffmpeg filter graph."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Configuration file (optional)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Degrade a video file
    Process(ProcessArgs),

    /// Print the ffmpeg filter graph for a set of settings
    Filters(SettingsArgs),

    /// List the built-in presets as JSON
    Presets,
}

#[derive(Args)]
struct SettingsArgs {
    /// Preset to start from (clean, authentic, worn, degraded)
    #[arg(short, long)]
    preset: Option<String>,

    /// JSON file with settings overriding the preset
    #[arg(short, long)]
    settings: Option<PathBuf>,

    /// Stamp today's date instead of the preset's
    #[arg(long)]
    stamp_today: bool,

    /// Frame rate for extraction and encoding (15-60)
    #[arg(long)]
    fps: Option<f64>,
}

#[derive(Args)]
struct ProcessArgs {
    /// Input video file
    #[arg(short, long)]
    input: PathBuf,

    /// Output video file path
    #[arg(short, long)]
    output: PathBuf,

    #[command(flatten)]
    settings: SettingsArgs,

    /// Processing strategy; defaults to the configured one
    #[arg(long, value_enum)]
    strategy: Option<Strategy>,

    /// Seed for reproducible noise and tracking glitches
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Serialize)]
struct PresetEntry {
    name: &'static str,
    settings: VhsSettings,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // Load configuration
    let config = match &cli.config {
        Some(config_path) => {
            info!("Loading configuration from {:?}", config_path);
            Config::from_file(config_path)?
        }
        None => Config::default(),
    };

    match cli.command {
        Command::Presets => print_presets(),
        Command::Filters(args) => {
            let engine = VhsEngine::new(config)?;
            let settings = resolve_settings(&engine, &args)?;
            let graph = filtergraph::compile(&settings).map_err(|e| anyhow::anyhow!(e.user_message()))?;
            println!("{}", graph);
            Ok(())
        }
        Command::Process(args) => process(config, args).await,
    }
}

fn print_presets() -> Result<()> {
    let entries: Vec<PresetEntry> = Preset::ALL
        .into_iter()
        .map(|preset| PresetEntry {
            name: preset.name(),
            settings: preset.settings(),
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&entries)?);
    Ok(())
}

fn resolve_settings(engine: &VhsEngine, args: &SettingsArgs) -> Result<VhsSettings> {
    let mut settings = engine
        .resolve_settings(args.preset.as_deref(), args.settings.as_deref())
        .map_err(|e| anyhow::anyhow!(e.user_message()))?;

    if args.stamp_today {
        settings.date_stamp = true;
        settings.date_stamp_text = chrono::Local::now().format("%b %d %Y").to_string().to_uppercase();
    }
    if let Some(fps) = args.fps {
        settings.target_fps = fps;
    }
    Ok(settings)
}

async fn process(config: Config, args: ProcessArgs) -> Result<()> {
    let threads = config.processing.threads;
    if let Err(e) = rayon::ThreadPoolBuilder::new().num_threads(threads).build_global() {
        warn!("Could not size the worker pool to {} threads: {}", threads, e);
    }

    let strategy = args.strategy.unwrap_or(config.job.strategy);
    let engine = VhsEngine::new(config).context("invalid configuration")?;
    let settings = resolve_settings(&engine, &args.settings)?;

    info!("Starting vhs-pipeline v{}", env!("CARGO_PKG_VERSION"));

    let cancel = engine.cancel_flag();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling job...");
            cancel.cancel();
        }
    });

    let request = ProcessRequest {
        input: args.input,
        output: args.output,
        settings,
        strategy,
        seed: args.seed,
    };

    match engine.process(&request, &LogProgress).await {
        Ok(JobOutcome::Done(summary)) => {
            match summary.output {
                Some(path) => info!("Output saved to: {:?}", path),
                None => warn!("Source has no frames at {} fps; nothing written", request.settings.target_fps),
            }
            Ok(())
        }
        Ok(JobOutcome::Cancelled) => {
            warn!("Cancelled");
            std::process::exit(130);
        }
        Err(failure) => Err(anyhow::anyhow!(failure.user_message())),
    }
}
