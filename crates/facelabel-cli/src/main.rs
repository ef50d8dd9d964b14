use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use facelabel_core::Policy;
use facelabel_engine::{
    spawn_engine, Config, JsonRenderer, Renderer, ScriptedDetector, TextRenderer, Ticker,
};
use std::path::PathBuf;

mod stats;

#[derive(Parser)]
#[command(
    name = "facelabel",
    about = "Debounced real/not-real labels over a face detection stream"
)]
struct Cli {
    /// TOML config file (FACELABEL_* environment variables override it)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the overlay loop over a scripted detection file
    Run {
        /// JSON detection script (array of frames)
        #[arg(short, long)]
        frames: PathBuf,
        /// shared-cooldown, per-face-cooldown or flip
        #[arg(short, long)]
        policy: Option<Policy>,
        /// Seed for reproducible status draws
        #[arg(short, long)]
        seed: Option<u64>,
        /// Milliseconds between ticks
        #[arg(long)]
        tick_ms: Option<u64>,
        /// Forget identities not seen for this many frames
        #[arg(long)]
        evict_after: Option<u64>,
        /// Replay the script until interrupted
        #[arg(long = "loop")]
        looping: bool,
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },
    /// Evaluate the debouncer offline and report label statistics
    Stats {
        #[arg(short, long)]
        policy: Option<Policy>,
        #[arg(short, long)]
        seed: Option<u64>,
        /// Frames to evaluate
        #[arg(long, default_value_t = 100_000)]
        evaluations: u64,
        /// Faces per frame
        #[arg(long, default_value_t = 1)]
        faces: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = Config::load(cli.config.as_deref()).context("loading configuration")?;

    match cli.command {
        Commands::Run {
            frames,
            policy,
            seed,
            tick_ms,
            evict_after,
            looping,
            format,
        } => {
            if let Some(policy) = policy {
                config.policy = policy;
            }
            if let Some(ms) = tick_ms {
                config.tick_interval_ms = ms;
            }
            if seed.is_some() {
                config.seed = seed;
            }
            if evict_after.is_some() {
                config.evict_after_frames = evict_after;
            }
            config.validate()?;

            let detector = ScriptedDetector::load(&frames, looping)?;
            let stdout = std::io::stdout().lock();
            match format {
                Format::Text => run_overlay(&config, detector, TextRenderer::new(stdout)).await?,
                Format::Json => run_overlay(&config, detector, JsonRenderer::new(stdout)).await?,
            }
        }
        Commands::Stats {
            policy,
            seed,
            evaluations,
            faces,
        } => {
            if let Some(policy) = policy {
                config.policy = policy;
            }
            if seed.is_some() {
                config.seed = seed;
            }
            let mut debouncer = config.build_debouncer();
            let summary = stats::sample(&mut debouncer, evaluations, faces);
            println!("policy:         {}", config.policy);
            println!("evaluations:    {}", summary.evaluations);
            println!("real fraction:  {:.4}", summary.real_fraction());
            println!("label changes:  {}", summary.changes);
            match summary.shortest_run {
                Some(run) => println!("shortest run:   {run} frames"),
                None => println!("shortest run:   no change observed"),
            }
        }
    }

    Ok(())
}

async fn run_overlay<Rd: Renderer>(
    config: &Config,
    detector: ScriptedDetector,
    renderer: Rd,
) -> Result<()> {
    let engine = spawn_engine(detector)?;
    let mut ticker = Ticker::new(
        engine,
        config.build_debouncer(),
        renderer,
        config.tick_interval(),
    );

    let stats = ticker
        .run(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::warn!(error = %err, "failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
        })
        .await;

    eprintln!(
        "frames: {}  skipped: {}  overruns: {}  worst pass: {:?}",
        stats.frames, stats.skipped, stats.overruns, stats.worst_case
    );
    Ok(())
}
