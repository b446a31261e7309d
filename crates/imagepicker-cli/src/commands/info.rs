use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use imagepicker_core::decode::{probe_dimensions, read_orientation, ImageSource};

#[derive(Args)]
pub struct InfoArgs {
    /// Input image file
    pub file: PathBuf,
}

pub fn run(args: &InfoArgs) -> Result<()> {
    let source = ImageSource::from_path(&args.file);
    let (width, height) = probe_dimensions(&source, None)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    let orientation = read_orientation(&source);
    let size = std::fs::metadata(&args.file)?.len();

    let (upright_width, upright_height) = if orientation.swaps_dimensions() {
        (height, width)
    } else {
        (width, height)
    };

    println!("File:        {}", args.file.display());
    println!("Dimensions:  {}x{}", width, height);
    println!("Orientation: {:?} ({}°)", orientation, orientation.rotation_degrees());
    println!("Upright:     {}x{}", upright_width, upright_height);
    println!("File size:   {:.1} KB", size as f64 / 1024.0);

    Ok(())
}
