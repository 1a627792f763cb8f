//! The Tiled JSON level document.

use crate::level::tileset::TilesetDocument;
use rpg_core::Color;
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize, Clone)]
pub struct LevelDocument {
    #[serde(default)]
    pub backgroundcolor: Option<String>,
    #[serde(default)]
    pub tilesets: Vec<TilesetReference>,
    pub layers: Vec<LayerDocument>,
    #[serde(default)]
    pub properties: Properties,
}

impl LevelDocument {
    pub fn background_color(&self) -> Color {
        self.backgroundcolor
            .as_deref()
            .and_then(Color::from_hex)
            .map(|c| c.with_alpha(255))
            .unwrap_or(Color::BLACK)
    }

    /// Base tile colour before lights are baked in.
    pub fn ambient_color(&self) -> Color {
        self.properties
            .get_str("ambient_color")
            .and_then(Color::from_hex)
            .map(|c| c.with_alpha(255))
            .unwrap_or(Color::BLACK)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct TilesetReference {
    #[serde(default = "first_gid")]
    pub firstgid: u32,
    /// External tileset document or image, relative to the level file.
    #[serde(default)]
    pub source: Option<String>,
    #[serde(flatten)]
    pub embedded: TilesetDocument,
}

fn first_gid() -> u32 {
    1
}

#[derive(Debug, Deserialize, Clone)]
#[serde(tag = "type")]
pub enum LayerDocument {
    #[serde(rename = "tilelayer")]
    Tiles(TileLayerDocument),
    #[serde(rename = "objectgroup")]
    Objects(ObjectGroupDocument),
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TileLayerDocument {
    #[serde(default)]
    pub name: String,
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
    pub data: Vec<u32>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ObjectGroupDocument {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub objects: Vec<ObjectDocument>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ObjectDocument {
    #[serde(default, rename = "type")]
    pub kind: String,
    /// Newer Tiled versions write the object type as `class`.
    #[serde(default)]
    pub class: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
    #[serde(default)]
    pub width: f32,
    #[serde(default)]
    pub height: f32,
    #[serde(default)]
    pub properties: Properties,
}

impl ObjectDocument {
    pub fn object_type(&self) -> &str {
        if self.kind.is_empty() {
            &self.class
        } else {
            &self.kind
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Property {
    pub name: String,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub value: Value,
}

/// Custom properties authored on a map or object, looked up by name.
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(transparent)]
pub struct Properties(pub Vec<Property>);

impl Properties {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.iter().find(|p| p.name == name).map(|p| &p.value)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name)?.as_str()
    }

    /// Numbers may be authored as strings too.
    pub fn get_f32(&self, name: &str) -> Option<f32> {
        match self.get(name)? {
            Value::Number(n) => n.as_f64().map(|v| v as f32),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn get_u8(&self, name: &str) -> Option<u8> {
        self.get_f32(name)
            .map(|v| v.round().clamp(0.0, 255.0) as u8)
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        match self.get(name)? {
            Value::Bool(b) => Some(*b),
            Value::String(s) => s.trim().parse().ok(),
            Value::Number(n) => n.as_f64().map(|v| v != 0.0),
            _ => None,
        }
    }
}
