use crate::assets::AssetCatalog;
use glam::Vec2;
use rpg_core::{Backend, Color, FontHandle, RenderState, ResourceProvider, TextTexture};

/// A line of text in screen space.
///
/// Static text keeps its rendered texture until the content, colour or
/// font changes. Non-static text is re-rendered on every draw, which suits
/// counters that change each frame.
#[derive(Debug, Clone)]
pub struct Text {
    pub render: RenderState,
    content: String,
    color: Color,
    font_name: Option<String>,
    font_size: Option<u32>,
    font: Option<FontHandle>,
    fixed_size: Option<Vec2>,
    is_static: bool,
    cached: Option<TextTexture>,
    dirty: bool,
}

impl Text {
    pub fn new(content: impl Into<String>, position: Vec2) -> Self {
        Self {
            render: RenderState::new(position, Vec2::ZERO),
            content: content.into(),
            color: Color::WHITE,
            font_name: None,
            font_size: None,
            font: None,
            fixed_size: None,
            is_static: true,
            cached: None,
            dirty: true,
        }
    }

    #[cfg(test)]
    pub fn with_font(mut self, name: impl Into<String>, size: u32) -> Self {
        self.font_name = Some(name.into());
        self.font_size = Some(size);
        self
    }

    /// Default font at a different size.
    pub fn with_font_size(mut self, size: u32) -> Self {
        self.font_size = Some(size);
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn with_static(mut self, is_static: bool) -> Self {
        self.is_static = is_static;
        self
    }

    pub fn text(&self) -> &str {
        &self.content
    }

    #[cfg(test)]
    pub fn color(&self) -> Color {
        self.color
    }

    #[cfg(test)]
    pub fn font(&self) -> Option<&FontHandle> {
        self.font.as_ref()
    }

    pub fn set_text(&mut self, content: &str) {
        if self.content != content {
            self.content = content.to_string();
            self.dirty = true;
        }
    }

    pub fn set_color(&mut self, color: Color) {
        if self.color != color {
            self.color = color;
            self.dirty = true;
        }
    }

    /// Takes effect on the next spawn.
    pub fn set_font(&mut self, name: impl Into<String>, size: u32) {
        self.font_name = Some(name.into());
        self.font_size = Some(size);
        self.font = None;
        self.dirty = true;
    }

    pub fn set_position(&mut self, position: Vec2) {
        self.render.world = position;
    }

    /// Overrides the size measured from the rendered glyphs.
    #[cfg(test)]
    pub fn set_fixed_size(&mut self, size: Option<Vec2>) {
        self.fixed_size = size;
    }

    /// Resolves the font, falling back to the default font and size when
    /// the requested one is not loaded.
    pub fn spawn<P: ResourceProvider + ?Sized>(
        &mut self,
        resources: &mut P,
        assets: &AssetCatalog,
    ) {
        let size = self.font_size.unwrap_or(assets.default_font_size);
        let name = self.font_name.as_deref().unwrap_or(&assets.default_font);
        self.font = resources.load_font(name, size).or_else(|| {
            log::warn!(
                "Font {name}@{size} unavailable, falling back to {}@{}",
                assets.default_font,
                assets.default_font_size
            );
            resources.load_font(&assets.default_font, assets.default_font_size)
        });
        if self.font.is_none() {
            log::warn!("No font available for text {:?}", self.content);
        }
        self.dirty = true;
    }

    pub fn draw(&mut self, backend: &mut dyn Backend) {
        let Some(font) = &self.font else {
            return;
        };
        if self.content.is_empty() {
            return;
        }

        if !self.is_static || self.dirty || self.cached.is_none() {
            self.cached = backend.render_text(font, &self.content, self.color);
            self.dirty = false;
        }
        let Some(texture) = &self.cached else {
            return;
        };

        self.render.size = self.fixed_size.unwrap_or_else(|| texture.size());
        self.render.prepare_screen();
        backend.draw_text(texture, self.render.rendered);
    }

    #[cfg(test)]
    pub fn bounds(&self) -> rpg_core::Rect {
        self.render.world_rect()
    }
}
