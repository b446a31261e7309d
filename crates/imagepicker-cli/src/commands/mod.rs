pub mod camera;
pub mod config;
pub mod gallery;
pub mod info;
pub mod sample;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use imagepicker_core::{CancellationPolicy, Picked, PickerConfig, Rejection};

/// Options shared by the flow commands.
#[derive(Args)]
pub struct FlowArgs {
    /// Picker config file (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Directory picked images are copied into
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Open the editor before returning
    #[arg(long)]
    pub edit: bool,

    /// Re-encode copies as JPEG at this quality (1-100)
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub quality: Option<u8>,

    /// Reject instead of returning an empty result on cancel
    #[arg(long)]
    pub reject_on_cancel: bool,
}

/// Load the config file if given, then apply command-line overrides.
pub fn load_config(args: &FlowArgs) -> Result<PickerConfig> {
    let mut config = match &args.config {
        Some(path) => PickerConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => PickerConfig::default(),
    };

    if let Some(ref output) = args.output {
        config.files.directory_to_copy = output.clone();
    }
    if args.quality.is_some() {
        config.files.compression = args.quality;
    }
    if args.edit && config.editor.is_none() {
        config.editor = Some(Default::default());
    }
    if args.reject_on_cancel {
        config.cancellation = CancellationPolicy::Reject;
    }
    Ok(config)
}

pub fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")
}

/// Print a flow outcome, turning a rejection into an error.
pub fn report(outcome: std::result::Result<Picked, Rejection>) -> Result<()> {
    let picked = outcome.map_err(|rejection| anyhow::anyhow!("Picker rejected: {rejection}"))?;

    if picked.is_empty() {
        println!("No images selected");
        return Ok(());
    }
    for (index, path) in picked.paths.iter().enumerate() {
        match picked.captions.as_ref().and_then(|c| c.get(index)) {
            Some(caption) if !caption.is_empty() => {
                println!("{}  \"{}\"", path.display(), caption)
            }
            _ => println!("{}", path.display()),
        }
    }
    Ok(())
}

pub fn describe(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
