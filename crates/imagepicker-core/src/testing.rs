//! Fixtures shared by unit tests across modules.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::{ExtendedColorType, ImageEncoder, ImageFormat, RgbImage};

/// Encode a PNG whose pixels come from `pixel(x, y)`.
pub fn png_bytes(width: u32, height: u32, pixel: impl Fn(u32, u32) -> [u8; 3]) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| image::Rgb(pixel(x, y)));
    let mut buffer = Cursor::new(Vec::new());
    img.write_to(&mut buffer, ImageFormat::Png)
        .expect("PNG encoding of fixture failed");
    buffer.into_inner()
}

fn split_pixel(width: u32) -> impl Fn(u32, u32) -> [u8; 3] {
    move |x, _| {
        if x < width / 2 {
            [255, 0, 0]
        } else {
            [0, 0, 255]
        }
    }
}

/// PNG with a red left half and a blue right half.
pub fn split_image(width: u32, height: u32) -> Vec<u8> {
    png_bytes(width, height, split_pixel(width))
}

/// JPEG with a red left half, a blue right half, and an EXIF APP1 segment
/// carrying `orientation`.
pub fn jpeg_with_orientation(width: u32, height: u32, orientation: u16) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| image::Rgb(split_pixel(width)(x, y)));
    let mut buffer = Cursor::new(Vec::new());
    image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, 95)
        .write_image(img.as_raw(), width, height, ExtendedColorType::Rgb8)
        .expect("JPEG encoding of fixture failed");
    let jpeg = buffer.into_inner();

    // Little-endian TIFF with a single IFD0 entry: Orientation (0x0112), SHORT, count 1
    let mut tiff = Vec::new();
    tiff.extend_from_slice(b"II\x2A\x00");
    tiff.extend_from_slice(&8u32.to_le_bytes());
    tiff.extend_from_slice(&1u16.to_le_bytes());
    tiff.extend_from_slice(&0x0112u16.to_le_bytes());
    tiff.extend_from_slice(&3u16.to_le_bytes());
    tiff.extend_from_slice(&1u32.to_le_bytes());
    tiff.extend_from_slice(&orientation.to_le_bytes());
    tiff.extend_from_slice(&[0, 0]);
    tiff.extend_from_slice(&0u32.to_le_bytes());

    let mut app1 = Vec::new();
    app1.extend_from_slice(b"Exif\0\0");
    app1.extend_from_slice(&tiff);
    let segment_len = (app1.len() + 2) as u16;

    let mut out = Vec::with_capacity(jpeg.len() + app1.len() + 4);
    out.extend_from_slice(&jpeg[0..2]);
    out.extend_from_slice(&[0xFF, 0xE1]);
    out.extend_from_slice(&segment_len.to_be_bytes());
    out.extend_from_slice(&app1);
    out.extend_from_slice(&jpeg[2..]);
    out
}

/// Write `bytes` to `dir/name` and return the path.
pub fn write_file(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, bytes).expect("writing fixture failed");
    path
}
