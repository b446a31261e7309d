use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use imagepicker_core::decode::{decode_sampled_with_info, ClipRect, ImageSource, SampleOptions};
use imagepicker_core::encode::write_jpeg;

#[derive(Args)]
pub struct SampleArgs {
    /// Input image file
    pub file: PathBuf,

    /// Requested width (pixels, or dp with --density)
    #[arg(long, default_value = "800")]
    pub width: u32,

    /// Requested height (pixels, or dp with --density)
    #[arg(long, default_value = "600")]
    pub height: u32,

    /// Treat width/height as density-independent units at this density
    #[arg(long)]
    pub density: Option<f32>,

    /// Decode only this source region: left,top,right,bottom
    #[arg(long)]
    pub clip: Option<String>,

    /// Refuse sources with more pixels than this
    #[arg(long)]
    pub max_pixels: Option<u64>,

    /// JPEG quality for the output
    #[arg(long, default_value = "90")]
    pub quality: u8,

    /// Output file path
    #[arg(short, long, default_value = "preview.jpg")]
    pub output: PathBuf,
}

pub fn run(args: &SampleArgs) -> Result<()> {
    let mut options = match args.density {
        Some(density) => SampleOptions::from_view(args.width, args.height, density),
        None => SampleOptions::new(args.width, args.height),
    };
    if let Some(max_pixels) = args.max_pixels {
        options = options.with_max_pixels(max_pixels);
    }
    let clip = args.clip.as_deref().map(parse_clip).transpose()?;

    let source = ImageSource::from_path(&args.file);
    let (image, report) = decode_sampled_with_info(&source, clip, &options)
        .with_context(|| format!("Failed to decode {}", args.file.display()))?;

    write_jpeg(&image, args.quality, &args.output)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    println!("Source:      {}x{}", report.source_width, report.source_height);
    println!("Requested:   {}x{}", options.width, options.height);
    println!("Sample size: {}", report.sample_size);
    println!("Rotation:    {}°", report.orientation.rotation_degrees());
    println!("Output:      {}x{} -> {}", image.width, image.height, args.output.display());

    Ok(())
}

fn parse_clip(text: &str) -> Result<ClipRect> {
    let values = text
        .split(',')
        .map(|part| part.trim().parse::<u32>())
        .collect::<std::result::Result<Vec<_>, _>>()
        .with_context(|| format!("Invalid clip '{text}'"))?;

    match values.as_slice() {
        &[left, top, right, bottom] if right > left && bottom > top => {
            Ok(ClipRect::new(left, top, right, bottom))
        }
        _ => bail!("Clip must be left,top,right,bottom with right > left and bottom > top"),
    }
}
