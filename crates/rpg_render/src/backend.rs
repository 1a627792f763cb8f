//! wgpu implementation of the `Renderer` / `ResourceProvider` capabilities.
//!
//! Every primitive becomes an egui shape queued in submission order:
//! textured meshes for textures, coloured meshes for rects, galleys for
//! text. `present()` runs one egui pass that paints the queued shapes on
//! the background layer (plus the debug window, if stats were submitted),
//! then composites the tessellated result onto the surface. The phases
//! follow the egui-wgpu requirements:
//!
//!   1. run the egui pass and tessellate
//!   2. upload texture deltas (always, even if the surface is unavailable)
//!   3. update buffers and render into a `forget_lifetime()` pass
//!   4. free textures egui no longer references

use crate::fonts::{build_font_definitions, FontRegistry, FontSource};
use crate::gpu_context::GpuContext;
use crate::texture::decode_image;
use egui::{Color32, FontId, Pos2};
use glam::Vec2;
use rpg_core::render::DebugStats;
use rpg_core::{
    Color, EngineResult, FontHandle, Rect, Renderer, ResourceProvider, TextTexture, TextureHandle,
};
use rpg_devtools::DebugOverlay;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use winit::event::WindowEvent;
use winit::window::Window;

const OUTLINE_THICKNESS: f32 = 1.0;

/// Payload of a `TextTexture` produced by this backend. Layout is redone
/// at draw time (egui caches galleys per frame) so a cached text never
/// points at a stale font atlas.
struct TextJob {
    text: String,
    font: FontId,
    color: Color32,
}

pub struct WgpuBackend {
    window: Arc<Window>,
    gpu: GpuContext,
    egui_ctx: egui::Context,
    egui_winit_state: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
    overlay: DebugOverlay,
    fonts: FontRegistry,
    textures: HashMap<String, TextureHandle>,
    failed_textures: HashSet<String>,
    shapes: Vec<egui::Shape>,
    clear_color: Color,
}

impl WgpuBackend {
    pub fn new(window: Arc<Window>, fonts: &[FontSource]) -> EngineResult<Self> {
        let gpu = GpuContext::new(window.clone())?;

        let egui_ctx = egui::Context::default();
        let (definitions, registry) = build_font_definitions(fonts);
        egui_ctx.set_fonts(definitions);

        let egui_winit_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui_ctx.viewport_id(),
            &*window,
            None,
            None,
            None,
        );
        let mut egui_renderer =
            egui_wgpu::Renderer::new(&gpu.device, gpu.surface_format, None, 1, false);

        // Fonts only become resolvable after a pass has run; widgets measure
        // text before the first frame is drawn.
        let warmup = egui_ctx.run(egui::RawInput::default(), |_| {});
        for (id, delta) in &warmup.textures_delta.set {
            egui_renderer.update_texture(&gpu.device, &gpu.queue, *id, delta);
        }
        log::info!("Render backend ready: {} font(s) registered", registry.len());

        Ok(Self {
            window,
            gpu,
            egui_ctx,
            egui_winit_state,
            egui_renderer,
            overlay: DebugOverlay::new(),
            fonts: registry,
            textures: HashMap::new(),
            failed_textures: HashSet::new(),
            shapes: Vec::new(),
            clear_color: Color::BLACK,
        })
    }

    pub fn window(&self) -> &Arc<Window> {
        &self.window
    }

    /// Returns true when egui consumed the event (pointer over the overlay).
    pub fn handle_window_event(&mut self, event: &WindowEvent) -> bool {
        self.egui_winit_state
            .on_window_event(&self.window, event)
            .consumed
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.gpu.resize(width, height);
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    fn push_colored_rect(&mut self, rect: Rect, color: Color) {
        let mut mesh = egui::Mesh::default();
        mesh.add_colored_rect(to_egui_rect(rect), to_color32(color));
        self.shapes.push(egui::Shape::mesh(mesh));
    }
}

impl Renderer for WgpuBackend {
    fn viewport(&self) -> Vec2 {
        let scale = self.window.scale_factor() as f32;
        Vec2::new(
            self.gpu.size.0 as f32 / scale,
            self.gpu.size.1 as f32 / scale,
        )
    }

    fn clear(&mut self, color: Color) {
        self.clear_color = color;
        self.shapes.clear();
    }

    fn draw_texture(
        &mut self,
        texture: &TextureHandle,
        source: Option<Rect>,
        dest: Rect,
        tint: Color,
    ) {
        let Some(egui_texture) = texture.payload::<egui::TextureHandle>() else {
            log::trace!("Texture '{}' has no GPU payload, skipping", texture.path());
            return;
        };
        let size = texture.size();
        let uv = match source {
            Some(src) if size.x > 0.0 && size.y > 0.0 => egui::Rect::from_min_max(
                Pos2::new(src.x / size.x, src.y / size.y),
                Pos2::new(src.right() / size.x, src.bottom() / size.y),
            ),
            _ => egui::Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0)),
        };
        let mut mesh = egui::Mesh::with_texture(egui_texture.id());
        mesh.add_rect_with_uv(to_egui_rect(dest), uv, to_color32(tint));
        self.shapes.push(egui::Shape::mesh(mesh));
    }

    fn draw_text(&mut self, text: &TextTexture, dest: Rect) {
        let Some(job) = text.payload::<TextJob>() else {
            return;
        };
        let galley = self.egui_ctx.fonts(|fonts| {
            fonts.layout_no_wrap(job.text.clone(), job.font.clone(), job.color)
        });
        self.shapes
            .push(egui::Shape::galley(Pos2::new(dest.x, dest.y), galley, job.color));
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        self.push_colored_rect(rect, color);
    }

    fn outline_rect(&mut self, rect: Rect, color: Color) {
        let t = OUTLINE_THICKNESS;
        let color = to_color32(color);
        let mut mesh = egui::Mesh::default();
        for band in [
            Rect::new(rect.x, rect.y, rect.w, t),
            Rect::new(rect.x, rect.bottom() - t, rect.w, t),
            Rect::new(rect.x, rect.y, t, rect.h),
            Rect::new(rect.right() - t, rect.y, t, rect.h),
        ] {
            mesh.add_colored_rect(to_egui_rect(band), color);
        }
        self.shapes.push(egui::Shape::mesh(mesh));
    }

    fn draw_debug_overlay(&mut self, stats: &DebugStats) {
        self.overlay.submit(stats);
    }

    fn present(&mut self) {
        let raw_input = self.egui_winit_state.take_egui_input(&self.window);
        let shapes = std::mem::take(&mut self.shapes);
        let overlay = &self.overlay;
        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            ctx.layer_painter(egui::LayerId::background())
                .extend(shapes.iter().cloned());
            overlay.show(ctx);
        });
        self.overlay.end_frame();

        self.egui_winit_state
            .handle_platform_output(&self.window, full_output.platform_output);
        let primitives = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);

        let device = &self.gpu.device;
        let queue = &self.gpu.queue;
        for (id, image_delta) in &full_output.textures_delta.set {
            self.egui_renderer
                .update_texture(device, queue, *id, image_delta);
        }

        if let Some((output, view)) = self.gpu.begin_frame() {
            let screen_descriptor = egui_wgpu::ScreenDescriptor {
                size_in_pixels: [self.gpu.size.0, self.gpu.size.1],
                pixels_per_point: full_output.pixels_per_point,
            };
            let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });
            let extra_buffers = self.egui_renderer.update_buffers(
                device,
                queue,
                &mut encoder,
                &primitives,
                &screen_descriptor,
            );

            {
                let mut pass = encoder
                    .begin_render_pass(&wgpu::RenderPassDescriptor {
                        label: Some("Scene Render Pass"),
                        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                            view: &view,
                            resolve_target: None,
                            ops: wgpu::Operations {
                                load: wgpu::LoadOp::Clear(to_wgpu_color(self.clear_color)),
                                store: wgpu::StoreOp::Store,
                            },
                        })],
                        depth_stencil_attachment: None,
                        ..Default::default()
                    })
                    .forget_lifetime();
                self.egui_renderer
                    .render(&mut pass, &primitives, &screen_descriptor);
            }

            queue.submit(extra_buffers.into_iter().chain(std::iter::once(encoder.finish())));
            output.present();
        }

        for id in &full_output.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }
    }
}

impl ResourceProvider for WgpuBackend {
    fn load_texture(&mut self, path: &str) -> Option<TextureHandle> {
        if let Some(handle) = self.textures.get(path) {
            return Some(handle.clone());
        }
        if self.failed_textures.contains(path) {
            return None;
        }
        match decode_image(Path::new(path)) {
            Ok(image) => {
                let [width, height] = image.size;
                let egui_texture =
                    self.egui_ctx
                        .load_texture(path, image, egui::TextureOptions::NEAREST);
                let handle = TextureHandle::new(path, width as u32, height as u32, egui_texture);
                log::debug!("Texture loaded: {path} ({width}x{height})");
                self.textures.insert(path.to_string(), handle.clone());
                Some(handle)
            }
            Err(err) => {
                log::warn!("Texture unavailable, drawing placeholder: {err}");
                self.failed_textures.insert(path.to_string());
                None
            }
        }
    }

    fn load_font(&mut self, name: &str, size: u32) -> Option<FontHandle> {
        let font = self.fonts.resolve(name, size);
        if font.is_none() {
            log::warn!("Font '{name}' at size {size} is not in the font manifest");
        }
        font
    }

    fn render_text(&mut self, font: &FontHandle, text: &str, color: Color) -> Option<TextTexture> {
        let font_id = self.fonts.font_id(font);
        let color = to_color32(color);
        let galley = self.egui_ctx.fonts(|fonts| {
            fonts.layout_no_wrap(text.to_owned(), font_id.clone(), color)
        });
        let size = galley.size();
        Some(TextTexture::new(
            size.x,
            size.y,
            TextJob {
                text: text.to_owned(),
                font: font_id,
                color,
            },
        ))
    }
}

fn to_egui_rect(rect: Rect) -> egui::Rect {
    egui::Rect::from_min_size(Pos2::new(rect.x, rect.y), egui::vec2(rect.w, rect.h))
}

fn to_color32(color: Color) -> Color32 {
    Color32::from_rgba_unmultiplied(color.r, color.g, color.b, color.a)
}

fn to_wgpu_color(color: Color) -> wgpu::Color {
    wgpu::Color {
        r: color.r as f64 / 255.0,
        g: color.g as f64 / 255.0,
        b: color.b as f64 / 255.0,
        a: color.a as f64 / 255.0,
    }
}
