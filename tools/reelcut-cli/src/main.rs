//! Reelcut CLI: turn videos of moving people into highlight reels.
//!
//! Usage:
//!   reelcut process <VIDEO> --out <PATH>     Compile highlights for one video
//!   reelcut batch <VIDEO>... --out-dir <DIR> Process several videos concurrently
//!   reelcut config                           Print the effective configuration
//!   reelcut check                            Check that ffmpeg/ffprobe are usable

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use reelcut_common::config::AppConfig;

mod commands;

use commands::DetectionArgs;

#[derive(Parser)]
#[command(
    name = "reelcut",
    about = "Cut videos down to the moments where someone is moving",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to $XDG_CONFIG_HOME/reelcut/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect moving people in one video and compile a highlight reel
    Process {
        /// Input video
        video: PathBuf,

        /// Output reel path
        #[arg(short, long)]
        out: PathBuf,

        /// Job identifier used to namespace scratch files (random if omitted)
        #[arg(long)]
        job_id: Option<String>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        detection: DetectionArgs,
    },

    /// Process several videos concurrently
    Batch {
        /// Input videos
        #[arg(required = true)]
        videos: Vec<PathBuf>,

        /// Directory for the compiled reels
        #[arg(long)]
        out_dir: Option<PathBuf>,

        /// Videos processed at the same time
        #[arg(short, long, default_value = "2")]
        jobs: usize,

        /// Print the results as JSON
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        detection: DetectionArgs,
    },

    /// Print the effective configuration
    Config,

    /// Check that the media toolchain and pose sidecar are usable
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref());
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    reelcut_common::logging::init_logging(&config.logging);

    match cli.command {
        Commands::Process {
            video,
            out,
            job_id,
            json,
            detection,
        } => {
            detection.apply(&mut config);
            commands::process::run(&config, video, out, job_id, json)
        }
        Commands::Batch {
            videos,
            out_dir,
            jobs,
            json,
            detection,
        } => {
            detection.apply(&mut config);
            commands::batch::run(config, videos, out_dir, jobs, json).await
        }
        Commands::Config => commands::config::run(&config, cli.config),
        Commands::Check => commands::check::run(&config),
    }
}
