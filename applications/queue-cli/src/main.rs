/// Soul Queue - playback queue harness
use clap::{Parser, Subcommand, ValueEnum};
use soul_queue::LoopMode;
use soul_queue_cli::{simulate, CliConfig, SimulateOptions};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "soul-queue")]
#[command(about = "Soul Player playback queue harness", long_about = None)]
struct Cli {
    /// Configuration file path (default: ./soul-queue.toml if present)
    #[arg(short, long, global = true, env = "SOUL_QUEUE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a queue against the simulated backend
    Simulate {
        /// Track URLs, in queue order
        #[arg(required = true)]
        tracks: Vec<String>,

        /// Shuffle before starting
        #[arg(long)]
        shuffle: bool,

        /// Loop mode
        #[arg(long = "loop", value_enum, default_value_t = LoopArg::Off)]
        loop_mode: LoopArg,

        /// Length of every simulated track in seconds
        #[arg(long)]
        track_secs: Option<f64>,

        /// Stop after this many virtual seconds
        #[arg(long)]
        max_secs: Option<f64>,

        /// Seed for deterministic shuffles
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Print the effective configuration as TOML
    ShowConfig,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LoopArg {
    Off,
    All,
    One,
}

impl From<LoopArg> for LoopMode {
    fn from(arg: LoopArg) -> Self {
        match arg {
            LoopArg::Off => LoopMode::Off,
            LoopArg::All => LoopMode::EntireQueue,
            LoopArg::One => LoopMode::SingleTrack,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "soul_queue=debug,soul_queue_cli=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let mut config = CliConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Simulate {
            tracks,
            shuffle,
            loop_mode,
            track_secs,
            max_secs,
            seed,
        } => {
            // Command-line flags win over file and environment
            if let Some(secs) = track_secs {
                config.simulation.track_duration_secs = secs;
            }
            if let Some(secs) = max_secs {
                config.simulation.max_secs = secs;
            }
            if seed.is_some() {
                config.engine.shuffle_seed = seed;
            }
            config.validate()?;

            let options = SimulateOptions {
                tracks,
                shuffle,
                loop_mode: loop_mode.into(),
            };
            let report = simulate(&config, options).await?;

            println!("Played {} track(s):", report.played.len());
            for (i, url) in report.played.iter().enumerate() {
                println!("  {:>3}. {}", i + 1, url);
            }
            println!(
                "{:.2}s simulated, {} handle(s) created, {}",
                report.elapsed_secs,
                report.handles_created,
                if report.finished {
                    "queue finished"
                } else {
                    "time limit reached"
                }
            );
        }
        Commands::ShowConfig => {
            config.validate()?;
            print!("{}", toml::to_string_pretty(&config)?);
        }
    }

    Ok(())
}
