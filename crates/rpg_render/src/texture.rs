use rpg_core::{EngineError, EngineResult};
use std::fs;
use std::path::Path;

/// Decodes an image file into straight-alpha RGBA ready for egui upload.
pub fn decode_image(path: &Path) -> EngineResult<egui::ColorImage> {
    let bytes = fs::read(path).map_err(|e| EngineError::missing(path, e))?;
    let image = image::load_from_memory(&bytes)
        .map_err(|e| EngineError::decode(path, e))?
        .to_rgba8();
    let size = [image.width() as usize, image.height() as usize];
    Ok(egui::ColorImage::from_rgba_unmultiplied(size, image.as_raw()))
}
