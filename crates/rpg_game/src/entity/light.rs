use crate::level::map::Properties;
use crate::level::tile::LightSource;
use glam::Vec2;
use rpg_core::Color;

pub const DEFAULT_INTENSITY: f32 = 50.0;

/// A point light baked into tile colours when its level loads.
#[derive(Debug, Clone, PartialEq)]
pub struct Light {
    pub color: Color,
    pub intensity: f32,
}

impl Light {
    pub fn from_properties(props: &Properties) -> Self {
        Self {
            color: Color::rgb(
                props.get_u8("color_r").unwrap_or(255),
                props.get_u8("color_g").unwrap_or(255),
                props.get_u8("color_b").unwrap_or(255),
            ),
            intensity: props.get_f32("intensity").unwrap_or(DEFAULT_INTENSITY).max(0.0),
        }
    }

    pub fn source(&self, origin: Vec2) -> LightSource {
        LightSource {
            origin,
            color: self.color,
            intensity: self.intensity,
        }
    }
}
