use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use imagepicker_core::{completion_channel, GalleryParams, ImagePicker};

use super::{load_config, report, runtime, FlowArgs};
use crate::terminal::TerminalPlatform;

#[derive(Args)]
pub struct GalleryArgs {
    /// Images to pick
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    #[command(flatten)]
    pub flow: FlowArgs,

    /// Editor actions separated by ';' (e.g. "caption hi; crop 0 0 0.5 0.5; send")
    #[arg(long)]
    pub actions: Option<String>,

    /// Prompt for editor actions on stdin
    #[arg(short, long)]
    pub interactive: bool,

    /// Directory the platform treats as its pictures directory
    #[arg(long, default_value = "pictures")]
    pub pictures_dir: PathBuf,
}

pub fn run(args: &GalleryArgs) -> Result<()> {
    let config = load_config(&args.flow)?;
    let params = GalleryParams {
        allow_multiple: config.gallery.allow_multiple || args.files.len() > 1,
    };

    let platform = TerminalPlatform::new(args.pictures_dir.clone())
        .with_selection(args.files.clone())
        .interactive(args.interactive)
        .with_script(args.actions.as_deref())?;
    let picker = ImagePicker::from_config(platform, &config);

    let outcome = runtime()?.block_on(async {
        let (completion, result) = completion_channel();
        picker.run_gallery_workflow(&params, &completion).await;
        result.await
    });
    report(outcome)
}
