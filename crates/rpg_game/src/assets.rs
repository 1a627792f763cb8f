//! Startup asset manifests and the catalog of parsed game data.
//!
//! Textures and fonts live in the backend; this module only reads the
//! manifests that say what to preload. Tilesets, dialogue scripts and
//! textbox styles are plain data and are owned here so levels and widgets
//! can share them.

use crate::config::EngineConfig;
use crate::dialogue::DialogueLibrary;
use crate::gui::textbox::TextboxStyle;
use crate::level::tileset::TilesetLibrary;
use rpg_core::json::load_json;
use rpg_core::{EngineError, EngineResult, ResourceProvider};
use rpg_render::FontSource;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Component, Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct FontManifestEntry {
    pub file: String,
    pub sizes: Vec<u32>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct TextureManifest {
    #[serde(default)]
    pub textures: Vec<String>,
}

/// Lexically cleans a path into a stable cache key: forward slashes, no
/// `.` components, `..` folded into its parent where possible.
pub fn normalize_path(path: &Path) -> String {
    let mut parts: Vec<String> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(parts.last(), Some(last) if last != "..") {
                    parts.pop();
                } else {
                    parts.push("..".to_string());
                }
            }
            Component::RootDir => parts.push(String::new()),
            Component::Prefix(prefix) => {
                parts.push(prefix.as_os_str().to_string_lossy().into_owned())
            }
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
        }
    }
    parts.join("/").replace('\\', "/")
}

/// Every file under `root` with the given extension, sorted for a
/// deterministic load order. A missing root yields nothing.
pub fn collect_files(root: &Path, extension: &str) -> Vec<PathBuf> {
    let mut found = Vec::new();
    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(err) => {
                log::debug!("Cannot scan {}: {err}", dir.display());
                continue;
            }
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                pending.push(path);
            } else if path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
            {
                found.push(path);
            }
        }
    }
    found.sort();
    found
}

pub fn load_font_manifest(path: &Path) -> EngineResult<Vec<FontSource>> {
    let manifest: BTreeMap<String, FontManifestEntry> = load_json(path)?;
    validate_font_manifest(&manifest).map_err(|reason| EngineError::decode(path, reason))?;

    let sources = manifest
        .into_iter()
        .map(|(name, entry)| FontSource {
            name,
            file: PathBuf::from(entry.file),
            sizes: entry.sizes,
        })
        .collect::<Vec<_>>();
    log::info!("Font manifest loaded: {} fonts from {}", sources.len(), path.display());
    Ok(sources)
}

fn validate_font_manifest(manifest: &BTreeMap<String, FontManifestEntry>) -> Result<(), String> {
    for (name, entry) in manifest {
        if entry.sizes.is_empty() {
            return Err(format!("Font manifest validation failed: {name} lists no sizes"));
        }
        if entry.sizes.contains(&0) {
            return Err(format!("Font manifest validation failed: {name} lists size 0"));
        }
    }
    Ok(())
}

pub fn load_texture_manifest(path: &Path) -> EngineResult<TextureManifest> {
    load_json(path)
}

/// Loads every manifest texture plus every `*.png` under `sprite_root`.
/// Individual failures are left to the provider to report.
pub fn preload_textures<P: ResourceProvider + ?Sized>(
    provider: &mut P,
    manifest: &TextureManifest,
    sprite_root: Option<&Path>,
) -> usize {
    let mut paths: Vec<String> = manifest.textures.clone();
    if let Some(root) = sprite_root {
        paths.extend(
            collect_files(root, "png")
                .iter()
                .map(|p| normalize_path(p)),
        );
    }

    let loaded = paths
        .iter()
        .filter(|path| provider.load_texture(path).is_some())
        .count();
    log::info!("Textures preloaded: {loaded}/{}", paths.len());
    loaded
}

/// Keys are textbox type ids written as strings.
pub fn load_textbox_styles(path: &Path) -> EngineResult<HashMap<i32, TextboxStyle>> {
    let raw: HashMap<String, TextboxStyle> = load_json(path)?;
    let mut styles = HashMap::with_capacity(raw.len());
    for (key, style) in raw {
        let id = key.trim().parse::<i32>().map_err(|_| {
            EngineError::decode(
                path,
                format!("Textbox manifest validation failed: type id {key:?} is not an integer"),
            )
        })?;
        styles.insert(id, style);
    }
    log::info!("Textbox styles loaded: {} from {}", styles.len(), path.display());
    Ok(styles)
}

/// Parsed game data shared by every level and widget.
#[derive(Debug)]
pub struct AssetCatalog {
    pub tilesets: TilesetLibrary,
    pub dialogue: DialogueLibrary,
    pub textbox_styles: HashMap<i32, TextboxStyle>,
    pub default_font: String,
    pub default_font_size: u32,
}

impl AssetCatalog {
    pub fn new(default_font: impl Into<String>, default_font_size: u32) -> Self {
        Self {
            tilesets: TilesetLibrary::new(),
            dialogue: DialogueLibrary::new(),
            textbox_styles: HashMap::new(),
            default_font: default_font.into(),
            default_font_size,
        }
    }

    /// Textbox styles and dialogue scripts degrade to empty on failure;
    /// widgets fall back to a built-in style and lazy loading.
    pub fn from_config(config: &EngineConfig) -> Self {
        let mut catalog = Self::new(config.default_font.clone(), config.default_font_size);

        match load_textbox_styles(Path::new(&config.textbox_manifest)) {
            Ok(styles) => catalog.textbox_styles = styles,
            Err(err) => log::warn!("Using built-in textbox style: {err}"),
        }
        catalog.dialogue.preload_dir(Path::new(&config.dialogue_root));
        catalog
    }

    pub fn textbox_style(&self, type_id: i32) -> TextboxStyle {
        match self.textbox_styles.get(&type_id) {
            Some(style) => style.clone(),
            None => {
                log::warn!("Unknown textbox type {type_id}, using built-in style");
                TextboxStyle::default()
            }
        }
    }
}
