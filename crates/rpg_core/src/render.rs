//! Drawing and asset-loading capabilities the simulation is written against.
//!
//! The game never touches GPU types. It draws through [`Renderer`] and
//! loads through [`ResourceProvider`]; the concrete backend decides how a
//! texture or a line of text is represented and stores that behind a
//! type-erased payload in the shared handle.

use crate::geometry::{Color, Rect};
use glam::Vec2;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

type Payload = Arc<dyn Any + Send + Sync>;

/// Shared, read-only texture. Clones are cheap and refer to the same image.
#[derive(Clone)]
pub struct TextureHandle {
    inner: Arc<TextureInner>,
}

struct TextureInner {
    path: String,
    width: u32,
    height: u32,
    payload: Payload,
}

impl TextureHandle {
    pub fn new(
        path: impl Into<String>,
        width: u32,
        height: u32,
        payload: impl Any + Send + Sync,
    ) -> Self {
        Self {
            inner: Arc::new(TextureInner {
                path: path.into(),
                width,
                height,
                payload: Arc::new(payload),
            }),
        }
    }

    pub fn path(&self) -> &str {
        &self.inner.path
    }

    pub fn width(&self) -> u32 {
        self.inner.width
    }

    pub fn height(&self) -> u32 {
        self.inner.height
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.inner.width as f32, self.inner.height as f32)
    }

    pub fn payload<T: Any>(&self) -> Option<&T> {
        self.inner.payload.downcast_ref::<T>()
    }

    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.inner, &b.inner)
    }
}

impl fmt::Debug for TextureHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextureHandle")
            .field("path", &self.inner.path)
            .field("width", &self.inner.width)
            .field("height", &self.inner.height)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FontHandle {
    pub name: String,
    pub size: u32,
}

/// A line of text rasterised (or laid out) by the backend with its colour
/// baked in.
#[derive(Clone)]
pub struct TextTexture {
    width: f32,
    height: f32,
    payload: Payload,
}

impl TextTexture {
    pub fn new(width: f32, height: f32, payload: impl Any + Send + Sync) -> Self {
        Self {
            width,
            height,
            payload: Arc::new(payload),
        }
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    pub fn payload<T: Any>(&self) -> Option<&T> {
        self.payload.downcast_ref::<T>()
    }
}

impl fmt::Debug for TextTexture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextTexture")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

/// Per-frame engine statistics for the debug overlay.
#[derive(Debug, Clone, Default)]
pub struct DebugStats {
    pub fps: f64,
    pub frame_time_ms: f64,
    pub frame: u64,
    pub elapsed: f64,
    pub state: String,
    pub level: Option<String>,
    pub entities: usize,
    pub tiles: usize,
    pub collision_rects: usize,
    pub gui_elements: usize,
    pub lighting: String,
    pub culling: String,
}

pub trait Renderer {
    /// Drawable area in logical pixels.
    fn viewport(&self) -> Vec2;
    fn clear(&mut self, color: Color);
    /// `source` is a pixel sub-rectangle of the texture; `None` samples all of it.
    fn draw_texture(
        &mut self,
        texture: &TextureHandle,
        source: Option<Rect>,
        dest: Rect,
        tint: Color,
    );
    fn draw_text(&mut self, text: &TextTexture, dest: Rect);
    fn fill_rect(&mut self, rect: Rect, color: Color);
    fn outline_rect(&mut self, rect: Rect, color: Color);
    fn present(&mut self);

    fn draw_debug_overlay(&mut self, _stats: &DebugStats) {}
}

pub trait ResourceProvider {
    /// Cached by path; `None` when the file is missing or undecodable.
    fn load_texture(&mut self, path: &str) -> Option<TextureHandle>;
    fn load_font(&mut self, name: &str, size: u32) -> Option<FontHandle>;
    fn render_text(&mut self, font: &FontHandle, text: &str, color: Color) -> Option<TextTexture>;
}

/// Something that can both draw and load, which is what draw code needs
/// for widgets that regenerate their text every frame.
pub trait Backend: Renderer + ResourceProvider {}

impl<T: Renderer + ResourceProvider + ?Sized> Backend for T {}
