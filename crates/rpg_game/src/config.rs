use rpg_core::json::load_json;
use rpg_platform::window::PlatformConfig;
use serde::Deserialize;
use std::path::Path;

pub const CONFIG_PATH: &str = "assets/scripts/engine.json";

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EngineConfig {
    pub window_title: String,
    pub window_width: u32,
    pub window_height: u32,
    /// `None` runs uncapped.
    pub max_fps: Option<u32>,
    pub start_level: String,
    pub font_manifest: String,
    pub texture_manifest: String,
    pub textbox_manifest: String,
    pub dialogue_root: String,
    pub sprite_root: Option<String>,
    pub default_font: String,
    pub default_font_size: u32,
    pub debug: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            window_title: "RPG Project".to_string(),
            window_width: 1200,
            window_height: 700,
            max_fps: Some(60),
            start_level: "assets/levels/debug_room.json".to_string(),
            font_manifest: "assets/scripts/font_manifest.json".to_string(),
            texture_manifest: "assets/scripts/texture_manifest.json".to_string(),
            textbox_manifest: "assets/scripts/textboxes.json".to_string(),
            dialogue_root: "assets/scripts/text".to_string(),
            sprite_root: None,
            default_font: "40573_VIDEOTER".to_string(),
            default_font_size: 32,
            debug: false,
        }
    }
}

impl EngineConfig {
    /// Falls back to defaults when the file is absent or malformed.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            log::info!("No engine config at {}, using defaults", path.display());
            return Self::default();
        }
        match load_json::<EngineConfig>(path) {
            Ok(config) => {
                log::info!("Engine config loaded from {}", path.display());
                config
            }
            Err(err) => {
                log::warn!("Ignoring engine config: {err}");
                Self::default()
            }
        }
    }

    pub fn platform(&self) -> PlatformConfig {
        PlatformConfig {
            title: self.window_title.clone(),
            width: self.window_width,
            height: self.window_height,
        }
    }
}
