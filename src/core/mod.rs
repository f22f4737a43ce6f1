use std::io::Cursor;

use anyhow::Result;
use image::{DynamicImage, Limits};

pub mod algorithm;
pub mod coin;
pub mod qr;
pub mod video;

/// Encodes any decoded image as PNG.
pub fn encode_png(image: &DynamicImage) -> Result<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    image.write_to(&mut buffer, image::ImageFormat::Png)?;

    Ok(buffer.into_inner())
}

/// Fails when a `width` x `height` output buffer would exceed the same
/// allocation cap the decoder enforces on uploads.
pub fn ensure_output_fits(width: u32, height: u32, bytes_per_pixel: usize) -> Result<()> {
    let max_alloc = Limits::default().max_alloc.unwrap_or(u64::MAX);
    let needed = u64::from(width)
        .saturating_mul(u64::from(height))
        .saturating_mul(bytes_per_pixel as u64);

    if needed > max_alloc {
        anyhow::bail!("{width}x{height} output needs {needed} bytes, limit is {max_alloc}");
    }
    Ok(())
}
