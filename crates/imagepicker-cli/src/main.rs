mod commands;
mod terminal;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "imagepicker", about = "Pick, capture and preview images from the terminal")]
#[command(version)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show image dimensions and orientation
    Info(commands::info::InfoArgs),
    /// Decode a downsampled, upright preview
    Sample(commands::sample::SampleArgs),
    /// Pick images and optionally edit them
    Gallery(commands::gallery::GalleryArgs),
    /// Capture a photo from a source file
    Camera(commands::camera::CameraArgs),
    /// Print the default picker config as TOML
    Config(commands::config::ConfigArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match &cli.command {
        Commands::Info(args) => commands::info::run(args),
        Commands::Sample(args) => commands::sample::run(args),
        Commands::Gallery(args) => commands::gallery::run(args),
        Commands::Camera(args) => commands::camera::run(args),
        Commands::Config(args) => commands::config::run(args),
    }
}
