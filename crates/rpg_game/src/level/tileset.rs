//! Shared tileset catalogs.
//!
//! A tileset image is cut into a fixed 64x64 grid read left-to-right then
//! top-to-bottom, so tile id `n` sits at column `n % columns`, row
//! `n / columns`. Collision sub-rectangles come from the Tiled tileset
//! document when one is used.

use crate::assets::normalize_path;
use rpg_core::json::load_json;
use rpg_core::{EngineError, EngineResult, Rect, ResourceProvider, TextureHandle};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

pub const TILE_SIZE: f32 = 64.0;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct TileCollisionObject {
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
    #[serde(default)]
    pub width: f32,
    #[serde(default)]
    pub height: f32,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct TileObjectGroup {
    #[serde(default)]
    pub objects: Vec<TileCollisionObject>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TileDefinition {
    pub id: u32,
    #[serde(default)]
    pub objectgroup: Option<TileObjectGroup>,
}

/// A Tiled tileset document, standalone or embedded in a level.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct TilesetDocument {
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub imagewidth: Option<u32>,
    #[serde(default)]
    pub imageheight: Option<u32>,
    #[serde(default)]
    pub tiles: Vec<TileDefinition>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TileData {
    pub source: Rect,
    /// Offsets relative to the tile's top-left corner.
    pub collision: Vec<Rect>,
}

#[derive(Debug)]
pub struct Tileset {
    pub path: String,
    pub texture: Option<TextureHandle>,
    pub columns: u32,
    pub rows: u32,
    tiles: Vec<TileData>,
}

impl Tileset {
    pub fn from_grid(
        path: impl Into<String>,
        texture: Option<TextureHandle>,
        image_width: u32,
        image_height: u32,
        definitions: &[TileDefinition],
    ) -> Self {
        let tile = TILE_SIZE as u32;
        let columns = image_width / tile;
        let rows = image_height / tile;

        let mut tiles = Vec::with_capacity((columns * rows) as usize);
        for y in 0..rows {
            for x in 0..columns {
                tiles.push(TileData {
                    source: Rect::new(
                        (x * tile) as f32,
                        (y * tile) as f32,
                        TILE_SIZE,
                        TILE_SIZE,
                    ),
                    collision: Vec::new(),
                });
            }
        }

        for def in definitions {
            let Some(group) = &def.objectgroup else {
                continue;
            };
            match tiles.get_mut(def.id as usize) {
                Some(data) => data.collision.extend(
                    group
                        .objects
                        .iter()
                        .map(|o| Rect::new(o.x, o.y, o.width, o.height)),
                ),
                None => log::warn!(
                    "Tileset collision for tile {} is outside the image grid",
                    def.id
                ),
            }
        }

        Self {
            path: path.into(),
            texture,
            columns,
            rows,
            tiles,
        }
    }

    pub fn tile(&self, id: u32) -> Option<&TileData> {
        self.tiles.get(id as usize)
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }
}

/// Tilesets keyed by normalised source path, shared between levels.
#[derive(Debug, Default)]
pub struct TilesetLibrary {
    cache: HashMap<String, Arc<Tileset>>,
}

impl TilesetLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// `path` is either a Tiled tileset document (`.json`/`.tsj`) or an
    /// image used directly.
    pub fn load<P: ResourceProvider + ?Sized>(
        &mut self,
        path: &Path,
        resources: &mut P,
    ) -> EngineResult<Arc<Tileset>> {
        let key = normalize_path(path);
        if let Some(tileset) = self.cache.get(&key) {
            return Ok(tileset.clone());
        }

        let is_document = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json") || ext.eq_ignore_ascii_case("tsj"));
        let tileset = if is_document {
            let doc: TilesetDocument = load_json(path)?;
            let base = path.parent().unwrap_or_else(|| Path::new(""));
            build_tileset(&key, base, &doc, resources)?
        } else {
            let texture = resources
                .load_texture(&key)
                .ok_or_else(|| EngineError::missing(path, "tileset image could not be loaded"))?;
            Tileset::from_grid(
                key.clone(),
                Some(texture.clone()),
                texture.width(),
                texture.height(),
                &[],
            )
        };

        log::info!(
            "Tileset {key} loaded: {}x{} grid, {} tiles",
            tileset.columns,
            tileset.rows,
            tileset.len()
        );
        let tileset = Arc::new(tileset);
        self.cache.insert(key, tileset.clone());
        Ok(tileset)
    }

    /// A tileset embedded in a level document, cached under its image path.
    pub fn load_embedded<P: ResourceProvider + ?Sized>(
        &mut self,
        doc: &TilesetDocument,
        base: &Path,
        resources: &mut P,
    ) -> EngineResult<Arc<Tileset>> {
        let image = doc
            .image
            .as_deref()
            .ok_or_else(|| EngineError::decode(base, "embedded tileset has no image"))?;
        let key = normalize_path(&base.join(image));
        if let Some(tileset) = self.cache.get(&key) {
            return Ok(tileset.clone());
        }
        let tileset = Arc::new(build_tileset(&key, base, doc, resources)?);
        log::info!(
            "Embedded tileset {key} loaded: {}x{} grid, {} tiles",
            tileset.columns,
            tileset.rows,
            tileset.len()
        );
        self.cache.insert(key, tileset.clone());
        Ok(tileset)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.cache.len()
    }
}

fn build_tileset<P: ResourceProvider + ?Sized>(
    key: &str,
    base: &Path,
    doc: &TilesetDocument,
    resources: &mut P,
) -> EngineResult<Tileset> {
    let image = doc
        .image
        .as_deref()
        .ok_or_else(|| EngineError::decode(key, "tileset document has no image"))?;
    let image_path = normalize_path(&base.join(image));
    let texture = resources.load_texture(&image_path);

    // The document's declared size wins so tiles stay addressable even when
    // the image itself failed to load.
    let (width, height) = match (doc.imagewidth, doc.imageheight, &texture) {
        (Some(w), Some(h), _) => (w, h),
        (_, _, Some(texture)) => (texture.width(), texture.height()),
        _ => {
            return Err(EngineError::missing(
                &image_path,
                "tileset image could not be loaded and the document gives no size",
            ))
        }
    };

    Ok(Tileset::from_grid(key, texture, width, height, &doc.tiles))
}
