//! Installs manifest fonts as named egui font families.
//!
//! Each logical font name becomes `FontFamily::Name(name)`. A font whose
//! file cannot be read (or is not a TrueType/OpenType file) is still
//! registered, aliased to egui's built-in proportional fonts, so text keeps
//! drawing with a placeholder face instead of vanishing.

use egui::{FontDefinitions, FontFamily, FontId};
use rpg_core::FontHandle;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct FontSource {
    pub name: String,
    pub file: PathBuf,
    pub sizes: Vec<u32>,
}

#[derive(Debug, Default)]
pub struct FontRegistry {
    sizes: HashMap<String, Vec<u32>>,
}

impl FontRegistry {
    /// Only sizes listed in the manifest resolve.
    pub fn resolve(&self, name: &str, size: u32) -> Option<FontHandle> {
        let sizes = self.sizes.get(name)?;
        sizes.contains(&size).then(|| FontHandle {
            name: name.to_string(),
            size,
        })
    }

    pub fn font_id(&self, font: &FontHandle) -> FontId {
        let family = if self.sizes.contains_key(&font.name) {
            FontFamily::Name(font.name.as_str().into())
        } else {
            FontFamily::Proportional
        };
        FontId::new(font.size as f32, family)
    }

    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }
}

pub fn build_font_definitions(sources: &[FontSource]) -> (FontDefinitions, FontRegistry) {
    let mut defs = FontDefinitions::default();
    let fallback = defs
        .families
        .get(&FontFamily::Proportional)
        .cloned()
        .unwrap_or_default();
    let mut registry = FontRegistry::default();

    for source in sources {
        let family = FontFamily::Name(source.name.as_str().into());
        match fs::read(&source.file) {
            Ok(bytes) if looks_like_font(&bytes) => {
                defs.font_data.insert(
                    source.name.clone(),
                    egui::FontData::from_owned(bytes).into(),
                );
                let mut chain = vec![source.name.clone()];
                chain.extend(fallback.iter().cloned());
                defs.families.insert(family, chain);
                log::info!(
                    "Font '{}' loaded from {} (sizes {:?})",
                    source.name,
                    source.file.display(),
                    source.sizes
                );
            }
            Ok(_) => {
                log::warn!(
                    "Font '{}' at {} is not a TrueType/OpenType file, using built-in face",
                    source.name,
                    source.file.display()
                );
                defs.families.insert(family, fallback.clone());
            }
            Err(e) => {
                log::warn!(
                    "Font '{}' unavailable ({}: {e}), using built-in face",
                    source.name,
                    source.file.display()
                );
                defs.families.insert(family, fallback.clone());
            }
        }
        registry
            .sizes
            .insert(source.name.clone(), source.sizes.clone());
    }

    (defs, registry)
}

/// sfnt magic: TrueType 1.0, "true", OpenType "OTTO", collections "ttcf".
fn looks_like_font(bytes: &[u8]) -> bool {
    matches!(
        bytes.get(..4),
        Some([0x00, 0x01, 0x00, 0x00]) | Some(b"true") | Some(b"OTTO") | Some(b"ttcf")
    )
}
