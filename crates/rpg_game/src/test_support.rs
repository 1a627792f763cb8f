//! Headless doubles for running states, levels and widgets without a GPU.

use crate::assets::AssetCatalog;
use crate::engine::{EngineRequest, FrameContext, FrameTime};
use crate::fade::ScreenFade;
use glam::Vec2;
use rpg_core::render::DebugStats;
use rpg_core::{Color, FontHandle, Rect, Renderer, ResourceProvider, TextTexture, TextureHandle};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCall {
    Clear(Color),
    Texture {
        path: String,
        source: Option<Rect>,
        dest: Rect,
        tint: Color,
    },
    Text {
        text: String,
        dest: Rect,
    },
    Fill(Rect, Color),
    Outline(Rect, Color),
    Present,
    Overlay,
}

pub struct HeadlessBackend {
    pub viewport: Vec2,
    pub calls: Vec<DrawCall>,
    pub texture_requests: Vec<String>,
    pub text_renders: usize,
    texture_sizes: HashMap<String, (u32, u32)>,
    failing_textures: HashSet<String>,
    cache: HashMap<String, TextureHandle>,
    fonts: Option<HashMap<String, Vec<u32>>>,
}

impl HeadlessBackend {
    /// Every texture loads as 64x64 and every font size resolves.
    pub fn new() -> Self {
        Self {
            viewport: Vec2::new(1200.0, 700.0),
            calls: Vec::new(),
            texture_requests: Vec::new(),
            text_renders: 0,
            texture_sizes: HashMap::new(),
            failing_textures: HashSet::new(),
            cache: HashMap::new(),
            fonts: None,
        }
    }

    /// Restricts fonts to the listed names and sizes.
    pub fn with_fonts(fonts: &[(&str, &[u32])]) -> Self {
        let mut backend = Self::new();
        backend.fonts = Some(
            fonts
                .iter()
                .map(|(name, sizes)| (name.to_string(), sizes.to_vec()))
                .collect(),
        );
        backend
    }

    pub fn set_texture_size(&mut self, path: &str, width: u32, height: u32) {
        self.texture_sizes.insert(path.to_string(), (width, height));
    }

    pub fn fail_texture(&mut self, path: &str) {
        self.failing_textures.insert(path.to_string());
    }

    pub fn texts(&self) -> Vec<String> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                DrawCall::Text { text, .. } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn texture_draws(&self) -> Vec<&DrawCall> {
        self.calls
            .iter()
            .filter(|call| matches!(call, DrawCall::Texture { .. }))
            .collect()
    }
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for HeadlessBackend {
    fn viewport(&self) -> Vec2 {
        self.viewport
    }

    fn clear(&mut self, color: Color) {
        self.calls.push(DrawCall::Clear(color));
    }

    fn draw_texture(
        &mut self,
        texture: &TextureHandle,
        source: Option<Rect>,
        dest: Rect,
        tint: Color,
    ) {
        self.calls.push(DrawCall::Texture {
            path: texture.path().to_string(),
            source,
            dest,
            tint,
        });
    }

    fn draw_text(&mut self, text: &TextTexture, dest: Rect) {
        let text = text.payload::<String>().cloned().unwrap_or_default();
        self.calls.push(DrawCall::Text { text, dest });
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        self.calls.push(DrawCall::Fill(rect, color));
    }

    fn outline_rect(&mut self, rect: Rect, color: Color) {
        self.calls.push(DrawCall::Outline(rect, color));
    }

    fn present(&mut self) {
        self.calls.push(DrawCall::Present);
    }

    fn draw_debug_overlay(&mut self, _stats: &DebugStats) {
        self.calls.push(DrawCall::Overlay);
    }
}

impl ResourceProvider for HeadlessBackend {
    fn load_texture(&mut self, path: &str) -> Option<TextureHandle> {
        self.texture_requests.push(path.to_string());
        if self.failing_textures.contains(path) {
            return None;
        }
        if let Some(handle) = self.cache.get(path) {
            return Some(handle.clone());
        }
        let (width, height) = self.texture_sizes.get(path).copied().unwrap_or((64, 64));
        let handle = TextureHandle::new(path, width, height, ());
        self.cache.insert(path.to_string(), handle.clone());
        Some(handle)
    }

    fn load_font(&mut self, name: &str, size: u32) -> Option<FontHandle> {
        let known = match &self.fonts {
            None => true,
            Some(fonts) => fonts.get(name).is_some_and(|sizes| sizes.contains(&size)),
        };
        known.then(|| FontHandle {
            name: name.to_string(),
            size,
        })
    }

    fn render_text(&mut self, font: &FontHandle, text: &str, _color: Color) -> Option<TextTexture> {
        self.text_renders += 1;
        let width = text.chars().count() as f32 * font.size as f32 * 0.5;
        Some(TextTexture::new(width, font.size as f32, text.to_string()))
    }
}

/// Owns everything a [`FrameContext`] borrows.
pub struct Harness {
    pub backend: HeadlessBackend,
    pub assets: AssetCatalog,
    pub fade: ScreenFade,
    pub requests: Vec<EngineRequest>,
    pub time: FrameTime,
    pub debug: bool,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            backend: HeadlessBackend::new(),
            assets: AssetCatalog::new("40573_VIDEOTER", 32),
            fade: ScreenFade::new(),
            requests: Vec::new(),
            time: FrameTime {
                delta: 0.1,
                elapsed: 0.0,
                fps: 60.0,
            },
            debug: false,
        }
    }

    pub fn ctx(&mut self) -> FrameContext<'_> {
        FrameContext {
            viewport: self.backend.viewport,
            mouse: Vec2::ZERO,
            resources: &mut self.backend,
            assets: &mut self.assets,
            fade: &mut self.fade,
            requests: &mut self.requests,
            time: self.time,
            debug: self.debug,
        }
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

fn unique_suffix() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time before unix epoch")
        .as_nanos();
    format!("{}_{}", std::process::id(), nanos)
}

pub fn temp_file_path(prefix: &str, name_hint: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "rpg_{prefix}_test_{name_hint}_{}.json",
        unique_suffix()
    ))
}

/// A fresh, empty directory under the system temp dir.
pub fn temp_dir(prefix: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("rpg_{prefix}_test_{}", unique_suffix()));
    fs::create_dir_all(&dir).expect("create temp dir");
    dir
}
