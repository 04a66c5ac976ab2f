//! Meadow image composition: bloom stickers alpha-blended onto a background.

use std::collections::HashMap;
use std::path::Path;

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};

use super::{MeadowLayout, MeadowSnapshot};
use crate::assets::AssetIndex;
use crate::error::Result;

const SKY: Rgba<u8> = Rgba([204, 228, 247, 255]);
const GROUND: Rgba<u8> = Rgba([120, 176, 96, 255]);

/// Compose the meadow image for a snapshot.
///
/// The background is stretched to the layout size; without one, a plain
/// sky-and-ground canvas is drawn. Sprites that fail to load are skipped
/// with a warning.
pub fn render_meadow(
    snapshot: &MeadowSnapshot,
    layout: &MeadowLayout,
    assets: &AssetIndex,
    background: Option<&Path>,
) -> Result<RgbaImage> {
    let mut canvas = match background {
        Some(path) => {
            let bg = image::open(path)?.to_rgba8();
            imageops::resize(&bg, layout.width, layout.height, FilterType::Triangle)
        }
        None => plain_canvas(layout),
    };

    let mut sprites: HashMap<&str, Option<RgbaImage>> = HashMap::new();
    for placement in &snapshot.placements {
        let sprite = sprites
            .entry(placement.flower_code.as_str())
            .or_insert_with(|| load_sprite(assets, &placement.flower_code, layout.sprite_size));
        if let Some(sprite) = sprite.as_ref() {
            imageops::overlay(&mut canvas, sprite, placement.x as i64, placement.y as i64);
        }
    }
    Ok(canvas)
}

pub fn save_png(image: &RgbaImage, path: &Path) -> Result<()> {
    image.save_with_format(path, image::ImageFormat::Png)?;
    Ok(())
}

fn plain_canvas(layout: &MeadowLayout) -> RgbaImage {
    let (ground_line, _) = layout.y_range();
    RgbaImage::from_fn(layout.width, layout.height, |_, y| {
        if y < ground_line {
            SKY
        } else {
            GROUND
        }
    })
}

/// Load a flower's sticker and fit it inside a `size` x `size` box.
fn load_sprite(assets: &AssetIndex, flower_code: &str, size: u32) -> Option<RgbaImage> {
    let path = assets.sprite_for(flower_code)?;
    let img = match image::open(path) {
        Ok(img) => img.to_rgba8(),
        Err(e) => {
            tracing::warn!(flower = flower_code, path = %path.display(), error = %e, "unreadable sprite");
            return None;
        }
    };
    let (w, h) = img.dimensions();
    let scale = size as f64 / w.max(h).max(1) as f64;
    let new_w = ((w as f64 * scale).round() as u32).max(1);
    let new_h = ((h as f64 * scale).round() as u32).max(1);
    Some(imageops::resize(&img, new_w, new_h, FilterType::Triangle))
}
