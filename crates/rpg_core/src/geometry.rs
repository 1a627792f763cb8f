//! Spatial primitives shared by the simulation and the renderer.
//!
//! All logic compares world-space rectangles. Camera-space rectangles are
//! derived per frame by [`crate::renderable::RenderState::prepare_frame`]
//! and are never fed back into collision or use checks.

use glam::Vec2;
use serde::Deserialize;

/// Light reach in pixels per unit of authored intensity.
pub const LIGHT_RADIUS_PER_INTENSITY: f32 = 6.0;

#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub fn from_pos_size(pos: Vec2, size: Vec2) -> Self {
        Self::new(pos.x, pos.y, size.x, size.y)
    }

    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.w, self.h)
    }

    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.w * 0.5, self.y + self.h * 0.5)
    }

    pub fn translated(&self, offset: Vec2) -> Self {
        Self::new(self.x + offset.x, self.y + offset.y, self.w, self.h)
    }

    /// Scales the rectangle around its own center.
    pub fn scaled_about_center(&self, scale: f32) -> Self {
        let w = self.w * scale;
        let h = self.h * scale;
        Self::new(
            self.x + (self.w - w) * 0.5,
            self.y + (self.h - h) * 0.5,
            w,
            h,
        )
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        rect_intersects(self, other)
    }
}

/// Strict AABB overlap: rectangles that only share an edge do not collide.
pub fn rect_intersects(a: &Rect, b: &Rect) -> bool {
    a.x < b.right() && a.right() > b.x && a.y < b.bottom() && a.bottom() > b.y
}

pub fn distance(dx: f32, dy: f32) -> f32 {
    (dx * dx + dy * dy).sqrt()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    #[serde(default = "opaque")]
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const YELLOW: Color = Color::rgb(255, 255, 0);
    pub const MAGENTA: Color = Color::rgb(255, 0, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Parses `#rrggbb` (or `#aarrggbb`, as Tiled writes colours with alpha).
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        let channel = |i: usize| u8::from_str_radix(digits.get(i..i + 2)?, 16).ok();
        match digits.len() {
            6 => Some(Self::rgb(channel(0)?, channel(2)?, channel(4)?)),
            8 => Some(Self::rgba(channel(2)?, channel(4)?, channel(6)?, channel(0)?)),
            _ => None,
        }
    }

    pub fn is_black(&self) -> bool {
        self.r == 0 && self.g == 0 && self.b == 0
    }

    /// Per-channel additive blend clamped to 255; alpha is kept from `self`.
    pub fn saturating_add(self, other: Color) -> Color {
        Color::rgba(
            self.r.saturating_add(other.r),
            self.g.saturating_add(other.g),
            self.b.saturating_add(other.b),
            self.a,
        )
    }

    pub fn with_alpha(self, a: u8) -> Color {
        Color { a, ..self }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

const fn opaque() -> u8 {
    255
}

pub fn light_radius(intensity: f32) -> f32 {
    intensity.max(0.0) * LIGHT_RADIUS_PER_INTENSITY
}

/// Additive contribution of a light of `color` and `intensity` at `dist`
/// pixels away. Raised-cosine falloff: full colour at the light's center,
/// strictly decreasing, zero at and beyond [`light_radius`].
pub fn light_falloff(dist: f32, color: Color, intensity: f32) -> Color {
    let radius = light_radius(intensity);
    if radius <= 0.0 || dist >= radius {
        return Color::BLACK;
    }
    let t = (dist.max(0.0) / radius).min(1.0);
    let factor = 0.5 * (1.0 + (std::f32::consts::PI * t).cos());
    let scale = |c: u8| (c as f32 * factor).round().clamp(0.0, 255.0) as u8;
    Color::rgb(scale(color.r), scale(color.g), scale(color.b))
}
