//! Sprite decoding and half-block rendering
//!
//! Sprites are decoded once, cropped to their opaque pixels, downscaled and
//! kept as base64 RGBA so they can live in the serializable app state.
//! Rendering packs two vertical pixels into one terminal cell.

use base64::{engine::general_purpose, Engine as _};
use image::{imageops, imageops::FilterType, RgbaImage};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Longest side kept after decoding, in pixels.
pub const MAX_SPRITE_SIDE: u32 = 48;

/// Pixels with lower alpha are drawn as background.
const ALPHA_THRESHOLD: u8 = 128;

#[derive(thiserror::Error, Debug)]
pub enum SpriteError {
    #[error("cannot decode sprite: {0}")]
    Decode(#[from] image::ImageError),
    #[error("sprite has no visible pixels")]
    Blank,
}

/// Decoded sprite, RGBA8 row-major.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SpriteData {
    pub payload: String,
    pub width: u32,
    pub height: u32,
}

impl SpriteData {
    pub fn from_rgba(image: &RgbaImage) -> Self {
        Self {
            payload: general_purpose::STANDARD.encode(image.as_raw()),
            width: image.width(),
            height: image.height(),
        }
    }

    /// Raw pixels, or `None` when the payload does not match the dimensions.
    pub fn pixels(&self) -> Option<Vec<u8>> {
        let bytes = general_purpose::STANDARD.decode(&self.payload).ok()?;
        let expected = self.width as usize * self.height as usize * 4;
        (bytes.len() == expected).then_some(bytes)
    }

    /// Cells (columns, rows) the sprite occupies when fitted into the given
    /// area. One cell is one pixel wide and two pixels tall.
    pub fn fit(&self, max_cols: u16, max_rows: u16) -> (u16, u16) {
        if self.width == 0 || self.height == 0 || max_cols == 0 || max_rows == 0 {
            return (0, 0);
        }
        let scale = (f64::from(max_cols) / f64::from(self.width))
            .min(f64::from(max_rows) * 2.0 / f64::from(self.height));
        let cols = (f64::from(self.width) * scale).floor().max(1.0) as u16;
        let rows = (f64::from(self.height) * scale / 2.0).ceil().max(1.0) as u16;
        (cols.min(max_cols), rows.min(max_rows))
    }

    /// Half-block lines scaled to fit the area with nearest-neighbour sampling.
    pub fn lines(&self, max_cols: u16, max_rows: u16) -> Vec<Line<'static>> {
        let (cols, rows) = self.fit(max_cols, max_rows);
        let Some(pixels) = self.pixels() else {
            return Vec::new();
        };
        if cols == 0 || rows == 0 {
            return Vec::new();
        }
        let pixel_rows = u32::from(rows) * 2;
        let sample = |col: u16, pixel_row: u32| -> Option<Color> {
            let x = u32::from(col) * self.width / u32::from(cols);
            let y = pixel_row * self.height / pixel_rows;
            if y >= self.height {
                return None;
            }
            let offset = ((y * self.width + x) * 4) as usize;
            let [r, g, b, a] = [
                pixels[offset],
                pixels[offset + 1],
                pixels[offset + 2],
                pixels[offset + 3],
            ];
            (a >= ALPHA_THRESHOLD).then_some(Color::Rgb(r, g, b))
        };

        (0..rows)
            .map(|row| {
                let spans: Vec<Span<'static>> = (0..cols)
                    .map(|col| {
                        let top = sample(col, u32::from(row) * 2);
                        let bottom = sample(col, u32::from(row) * 2 + 1);
                        half_block(top, bottom)
                    })
                    .collect();
                Line::from(spans)
            })
            .collect()
    }
}

fn half_block(top: Option<Color>, bottom: Option<Color>) -> Span<'static> {
    match (top, bottom) {
        (Some(top), Some(bottom)) => Span::styled("▀", Style::default().fg(top).bg(bottom)),
        (Some(top), None) => Span::styled("▀", Style::default().fg(top)),
        (None, Some(bottom)) => Span::styled("▄", Style::default().fg(bottom)),
        (None, None) => Span::raw(" "),
    }
}

/// Decode image bytes (PNG, GIF, ...) into a cropped, downscaled sprite.
pub fn decode_sprite(bytes: &[u8]) -> Result<SpriteData, SpriteError> {
    let image = image::load_from_memory(bytes)?.to_rgba8();
    let (x, y, width, height) = opaque_bounds(&image).ok_or(SpriteError::Blank)?;
    let cropped = imageops::crop_imm(&image, x, y, width, height).to_image();

    let longest = width.max(height);
    let sprite = if longest > MAX_SPRITE_SIDE {
        let scaled_w = (width * MAX_SPRITE_SIDE / longest).max(1);
        let scaled_h = (height * MAX_SPRITE_SIDE / longest).max(1);
        imageops::resize(&cropped, scaled_w, scaled_h, FilterType::Nearest)
    } else {
        cropped
    };
    Ok(SpriteData::from_rgba(&sprite))
}

/// Bounding box `(x, y, width, height)` of the visible pixels.
fn opaque_bounds(image: &RgbaImage) -> Option<(u32, u32, u32, u32)> {
    let mut bounds: Option<(u32, u32, u32, u32)> = None;
    for (x, y, pixel) in image.enumerate_pixels() {
        if pixel[3] < ALPHA_THRESHOLD {
            continue;
        }
        bounds = Some(match bounds {
            None => (x, y, x, y),
            Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
        });
    }
    bounds.map(|(x0, y0, x1, y1)| (x0, y0, x1 - x0 + 1, y1 - y0 + 1))
}
