use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use imagepicker_core::{completion_channel, ImagePicker};

use super::{load_config, report, runtime, FlowArgs};
use crate::terminal::TerminalPlatform;

#[derive(Args)]
pub struct CameraArgs {
    /// Image the simulated camera "captures"
    #[arg(long)]
    pub from: Option<PathBuf>,

    #[command(flatten)]
    pub flow: FlowArgs,

    /// Announce the capture to the media index
    #[arg(long)]
    pub save_to_gallery: bool,

    /// Store the capture in the public pictures directory
    #[arg(long)]
    pub public: bool,

    /// Subdirectory for captures
    #[arg(long)]
    pub relative_dir: Option<PathBuf>,

    /// Start without camera permission
    #[arg(long)]
    pub no_permission: bool,

    /// Editor actions separated by ';'
    #[arg(long)]
    pub actions: Option<String>,

    /// Prompt for editor actions and permission on stdin
    #[arg(short, long)]
    pub interactive: bool,

    /// Directory the platform treats as its pictures directory
    #[arg(long, default_value = "pictures")]
    pub pictures_dir: PathBuf,
}

pub fn run(args: &CameraArgs) -> Result<()> {
    let config = load_config(&args.flow)?;
    let mut params = config.camera.clone();
    params.save_to_gallery |= args.save_to_gallery;
    params.save_as_public |= args.public;
    if args.relative_dir.is_some() {
        params.relative_directory = args.relative_dir.clone();
    }

    let mut platform = TerminalPlatform::new(args.pictures_dir.clone())
        .with_permission(!args.no_permission)
        .interactive(args.interactive)
        .with_script(args.actions.as_deref())?;
    if let Some(ref source) = args.from {
        platform = platform.with_camera_source(source.clone());
    }
    let picker = ImagePicker::from_config(platform, &config);

    let outcome = runtime()?.block_on(async {
        let (completion, result) = completion_channel();
        picker.run_camera_workflow(&params, &completion).await;
        result.await
    });
    report(outcome)
}
