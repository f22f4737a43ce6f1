use anyhow::{Context, Result};
use image::{DynamicImage, GrayImage, Luma};
use qrcode::{Color, EcLevel, QrCode};

const DARK: Luma<u8> = Luma([0]);
const LIGHT: Luma<u8> = Luma([255]);

/// Encodes `text` at error correction level L, picking the smallest version
/// that fits.
pub fn encode(text: &str) -> Result<QrCode> {
    QrCode::with_error_correction_level(text.as_bytes(), EcLevel::L)
        .with_context(|| format!("cannot encode {} bytes", text.len()))
}

/// Black modules on white, `module_px` pixels per module and a quiet zone of
/// `border` modules on every side.
pub fn rasterize(code: &QrCode, module_px: u32, border: u32) -> Result<GrayImage> {
    let modules = u32::try_from(code.width())?;
    let side = border
        .checked_mul(2)
        .and_then(|b| b.checked_add(modules))
        .and_then(|m| m.checked_mul(module_px))
        .context("qr image dimensions overflow")?;
    super::ensure_output_fits(side, side, 1)?;

    let colors = code.to_colors();
    let width = code.width();

    Ok(GrayImage::from_fn(side, side, |px, py| {
        let (mx, my) = (px / module_px, py / module_px);
        if mx < border || my < border || mx >= border + modules || my >= border + modules {
            return LIGHT;
        }
        let idx = (my - border) as usize * width + (mx - border) as usize;
        match colors[idx] {
            Color::Dark => DARK,
            Color::Light => LIGHT,
        }
    }))
}

pub fn render_png(text: &str, module_px: u32, border: u32) -> Result<Vec<u8>> {
    let code = encode(text)?;
    let img = rasterize(&code, module_px, border)?;
    super::encode_png(&DynamicImage::ImageLuma8(img))
}
