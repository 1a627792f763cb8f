use crate::level::tileset::{TileData, Tileset, TILE_SIZE};
use glam::Vec2;
use rpg_core::geometry::{distance, light_falloff};
use rpg_core::render_mode::LightingMode;
use rpg_core::{Color, Rect, RenderState, Renderer, TextureHandle};

const PLACEHOLDER: Color = Color::rgb(90, 90, 110);

/// A light as the bake and the cursor light see it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightSource {
    pub origin: Vec2,
    pub color: Color,
    pub intensity: f32,
}

impl LightSource {
    pub fn contribution_at(&self, point: Vec2) -> Color {
        let d = point - self.origin;
        light_falloff(distance(d.x, d.y), self.color, self.intensity)
    }
}

#[derive(Debug, Clone)]
pub struct Tile {
    pub render: RenderState,
    texture: Option<TextureHandle>,
}

impl Tile {
    pub fn new(world: Vec2, tileset: &Tileset, data: &TileData, base: Color) -> Self {
        let mut render = RenderState::new(world, Vec2::splat(TILE_SIZE));
        render.source = Some(data.source);
        render.color = base;
        Self {
            render,
            texture: tileset.texture.clone(),
        }
    }

    pub fn world_rect(&self) -> Rect {
        self.render.world_rect()
    }

    #[cfg(test)]
    pub fn light_color(&self) -> Color {
        self.render.color
    }

    /// Adds a light's contribution measured from the tile's center.
    pub fn bake_light(&mut self, light: &LightSource) {
        let added = light.contribution_at(self.render.origin());
        self.render.color = self.render.color.saturating_add(added);
    }

    /// Baked colour plus an optional transient light.
    pub fn lit_color(&self, extra: Option<&LightSource>) -> Color {
        match extra {
            Some(light) => self
                .render
                .color
                .saturating_add(light.contribution_at(self.render.origin())),
            None => self.render.color,
        }
    }

    pub fn draw<R: Renderer + ?Sized>(
        &mut self,
        renderer: &mut R,
        camera: Vec2,
        scale: f32,
        lighting: LightingMode,
        light: Color,
    ) {
        self.render.prepare_frame(camera, scale);
        let dest = self.render.rendered;
        let tint = match lighting {
            LightingMode::Disabled => Color::WHITE,
            _ => light,
        };

        match &self.texture {
            Some(texture) => renderer.draw_texture(texture, self.render.source, dest, tint),
            None => renderer.fill_rect(dest, tint_placeholder(tint)),
        }

        match lighting {
            LightingMode::Border => renderer.outline_rect(dest, light),
            LightingMode::Fill => renderer.fill_rect(dest, light.with_alpha(96)),
            LightingMode::Standard | LightingMode::Disabled => {}
        }
    }
}

fn tint_placeholder(tint: Color) -> Color {
    let mul = |a: u8, b: u8| ((a as u16 * b as u16) / 255) as u8;
    Color::rgb(
        mul(PLACEHOLDER.r, tint.r),
        mul(PLACEHOLDER.g, tint.g),
        mul(PLACEHOLDER.b, tint.b),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{DrawCall, HeadlessBackend};

    fn sample_tile(base: Color) -> Tile {
        let tileset = Tileset::from_grid("tiles.png", None, 128, 64, &[]);
        let data = tileset.tile(1).cloned().expect("tile 1");
        Tile::new(Vec2::new(128.0, 64.0), &tileset, &data, base)
    }

    #[test]
    fn bake_accumulates_and_clamps() {
        let mut tile = sample_tile(Color::rgb(200, 0, 0));
        let light = LightSource {
            origin: tile.render.origin(),
            color: Color::rgb(100, 50, 0),
            intensity: 40.0,
        };
        tile.bake_light(&light);
        assert_eq!(tile.light_color(), Color::rgb(255, 50, 0));
        tile.bake_light(&light);
        assert_eq!(tile.light_color(), Color::rgb(255, 100, 0));
    }

    #[test]
    fn closer_tiles_receive_more_light() {
        let light = LightSource {
            origin: Vec2::ZERO,
            color: Color::WHITE,
            intensity: 100.0,
        };
        let near = light.contribution_at(Vec2::new(32.0, 32.0));
        let far = light.contribution_at(Vec2::new(200.0, 32.0));
        assert!(near.r > far.r);
        assert!(light.contribution_at(Vec2::new(5000.0, 0.0)).is_black());
    }

    #[test]
    fn draw_uses_source_rect_and_lighting_mode() {
        let mut tile = sample_tile(Color::rgb(10, 20, 30));
        let mut backend = HeadlessBackend::new();
        tile.draw(
            &mut backend,
            Vec2::new(28.0, 14.0),
            1.0,
            LightingMode::Disabled,
            tile.light_color(),
        );
        tile.draw(
            &mut backend,
            Vec2::ZERO,
            1.0,
            LightingMode::Border,
            tile.light_color(),
        );

        assert_eq!(
            backend.calls[0],
            DrawCall::Fill(
                Rect::new(100.0, 50.0, 64.0, 64.0),
                tint_placeholder(Color::WHITE),
            )
        );
        assert_eq!(
            backend.calls[2],
            DrawCall::Outline(Rect::new(128.0, 64.0, 64.0, 64.0), Color::rgb(10, 20, 30))
        );
        assert_eq!(tile.render.source, Some(Rect::new(64.0, 0.0, 64.0, 64.0)));
    }
}
