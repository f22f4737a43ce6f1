use std::io::{BufWriter, Cursor};

use anyhow::{Context, Result};
use bytes::Bytes;
use fast_image_resize::{
    images::Image, FilterType, IntoImageView, ResizeAlg, ResizeOptions, Resizer,
};
use image::{codecs::png, DynamicImage, ImageEncoder, ImageReader};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeMode {
    /// Shrink only, keep aspect ratio, stay within the bounds.
    Fit,
    /// Force the exact bounds, aspect ratio may change.
    Exact,
}

pub struct Resized {
    pub png: Bytes,
    pub width: u32,
    pub height: u32,
}

/// Reads only the header of an encoded image to get its dimensions.
pub fn probe_dimensions(blob: &[u8]) -> Result<(u32, u32)> {
    let reader = ImageReader::new(Cursor::new(blob))
        .with_guessed_format()
        .context("upload image format is unknown")?;
    Ok(reader.into_dimensions()?)
}

pub fn decode(blob: &[u8]) -> Result<DynamicImage> {
    let reader = ImageReader::new(Cursor::new(blob)).with_guessed_format()?;
    if reader.format().is_none() {
        anyhow::bail!("cannot identify image file");
    }
    Ok(reader.decode()?)
}

pub fn target_size(src: (u32, u32), bounds: (u32, u32), mode: ResizeMode) -> (u32, u32) {
    match mode {
        ResizeMode::Exact => bounds,
        ResizeMode::Fit => fit_within(src, bounds),
    }
}

// Thumbnail rounding: of floor/ceil keep whichever lands closer to the source
// aspect ratio, floor on ties, never below 1.
fn fit_within((src_w, src_h): (u32, u32), (max_w, max_h): (u32, u32)) -> (u32, u32) {
    if max_w >= src_w && max_h >= src_h {
        return (src_w, src_h);
    }

    let aspect = src_w as f64 / src_h as f64;
    let (x, y) = (max_w as f64, max_h as f64);

    if x / y >= aspect {
        let w = round_aspect(y * aspect, |n| (aspect - n / y).abs());
        (w, max_h)
    } else {
        let h = round_aspect(x / aspect, |n| {
            if n == 0.0 {
                0.0
            } else {
                (aspect - x / n).abs()
            }
        });
        (max_w, h)
    }
}

fn round_aspect(number: f64, key: impl Fn(f64) -> f64) -> u32 {
    let (lo, hi) = (number.floor(), number.ceil());
    let best = if key(hi) < key(lo) { hi } else { lo };
    (best as u32).max(1)
}

pub fn resize(src_image: &DynamicImage, bounds: (u32, u32), mode: ResizeMode) -> Result<Resized> {
    let (target_width, target_height) =
        target_size((src_image.width(), src_image.height()), bounds, mode);

    if target_width == 0 || target_height == 0 {
        anyhow::bail!("target size must be positive");
    }

    // float layouts cannot be written as PNG
    let normalized;
    let src_image = match src_image {
        DynamicImage::ImageRgb32F(_) | DynamicImage::ImageRgba32F(_) => {
            normalized = DynamicImage::ImageRgba8(src_image.to_rgba8());
            &normalized
        }
        _ => src_image,
    };

    if (target_width, target_height) == (src_image.width(), src_image.height()) {
        return Ok(Resized {
            png: Bytes::from(super::encode_png(src_image)?),
            width: target_width,
            height: target_height,
        });
    }

    let pixel_type = src_image
        .pixel_type()
        .context("unsupported pixel layout")?;
    super::ensure_output_fits(target_width, target_height, pixel_type.size())?;

    let mut dst_image = Image::new(target_width, target_height, pixel_type);

    let options =
        ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Lanczos3));
    let mut resizer = Resizer::new();
    resizer.resize(src_image, &mut dst_image, &options)?;

    let mut writer = BufWriter::new(Vec::new());
    png::PngEncoder::new(&mut writer).write_image(
        dst_image.buffer(),
        target_width,
        target_height,
        src_image.color().into(),
    )?;

    Ok(Resized {
        png: Bytes::from(writer.into_inner()?),
        width: target_width,
        height: target_height,
    })
}
