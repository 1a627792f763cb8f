//! RPG Project -- application entry point.
//!
//! winit drives the event loop through `ApplicationHandler`. Window events
//! are translated into `InputEvent`s and queued; each `RedrawRequested`
//! runs exactly one engine frame, which drains that queue first. The frame
//! cap is expressed as `ControlFlow::WaitUntil(next deadline)`.
//!
//! Startup order matters: the font manifest must be read before the
//! backend exists (fonts are installed at creation), and textures are
//! preloaded before the first state is activated.

mod assets;
mod config;
mod dialogue;
mod engine;
mod entity;
mod fade;
mod gui;
mod level;
mod states;
#[cfg(test)]
mod test_support;

use std::path::Path;
use std::time::Instant;

use winit::application::ApplicationHandler;
use winit::event::{ElementState, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::WindowId;

use assets::{load_font_manifest, load_texture_manifest, preload_textures, AssetCatalog};
use config::{EngineConfig, CONFIG_PATH};
use engine::Engine;
use rpg_core::input::{InputEvent, Key, KeyEvent};
use rpg_core::{EngineError, EngineResult};
use rpg_render::WgpuBackend;

/// Pixels per line for mouse wheels that report in lines.
const WHEEL_LINE_HEIGHT: f32 = 40.0;

struct App {
    config: EngineConfig,
    engine: Option<Engine<WgpuBackend>>,
    pending: Vec<InputEvent>,
    failed: bool,
}

impl App {
    fn new(config: EngineConfig) -> Self {
        Self {
            config,
            engine: None,
            pending: Vec::new(),
            failed: false,
        }
    }

    fn bootstrap(&self, event_loop: &ActiveEventLoop) -> EngineResult<Engine<WgpuBackend>> {
        let window = rpg_platform::window::create_window(event_loop, &self.config.platform())
            .map_err(|err| EngineError::RendererInit(format!("window creation: {err}")))?;

        let fonts = load_font_manifest(Path::new(&self.config.font_manifest))?;
        let mut backend = WgpuBackend::new(window, &fonts)?;

        let textures = load_texture_manifest(Path::new(&self.config.texture_manifest))?;
        preload_textures(
            &mut backend,
            &textures,
            self.config.sprite_root.as_deref().map(Path::new),
        );

        let assets = AssetCatalog::from_config(&self.config);
        Ok(Engine::new(
            backend,
            assets,
            &self.config.start_level,
            self.config.max_fps,
            self.config.debug,
        ))
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.engine.is_some() || self.failed {
            return;
        }
        match self.bootstrap(event_loop) {
            Ok(engine) => self.engine = Some(engine),
            Err(err) => {
                log::error!("Startup failed: {err}");
                self.failed = true;
                event_loop.exit();
            }
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let Some(engine) = &self.engine else {
            return;
        };
        match engine.next_frame_deadline() {
            Some(deadline) if deadline > Instant::now() => {
                event_loop.set_control_flow(ControlFlow::WaitUntil(deadline));
            }
            _ => {
                event_loop.set_control_flow(ControlFlow::Poll);
                engine.backend().window().request_redraw();
            }
        }
    }

    fn new_events(&mut self, _event_loop: &ActiveEventLoop, cause: winit::event::StartCause) {
        if let winit::event::StartCause::ResumeTimeReached { .. } = cause {
            if let Some(engine) = &self.engine {
                engine.backend().window().request_redraw();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(engine) = self.engine.as_mut() else {
            return;
        };

        let egui_consumed = engine.backend_mut().handle_window_event(&event);

        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested, exiting.");
                self.pending.push(InputEvent::Quit);
                event_loop.exit();
            }

            WindowEvent::Resized(size) => {
                if size.width > 0 && size.height > 0 {
                    engine.backend_mut().resize(size.width, size.height);
                    log::info!("Resized to {}x{}", size.width, size.height);
                }
            }

            WindowEvent::KeyboardInput { event, .. } if !egui_consumed => {
                if let PhysicalKey::Code(code) = event.physical_key {
                    if let Some(key) = map_key(code) {
                        self.pending.push(InputEvent::Key(KeyEvent {
                            key,
                            pressed: event.state == ElementState::Pressed,
                            repeat: event.repeat,
                        }));
                    }
                }
            }

            WindowEvent::CursorMoved { position, .. } => {
                let scale = engine.backend().window().scale_factor();
                let logical = position.to_logical::<f32>(scale);
                self.pending.push(InputEvent::MouseMoved {
                    x: logical.x,
                    y: logical.y,
                });
            }

            WindowEvent::MouseWheel { delta, .. } if !egui_consumed => {
                let delta = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / WHEEL_LINE_HEIGHT,
                };
                if delta != 0.0 {
                    self.pending.push(InputEvent::MouseWheel { delta });
                }
            }

            WindowEvent::RedrawRequested => {
                engine.run_frame(self.pending.drain(..));
                if !engine.is_running() {
                    log::info!("Engine stopped, exiting.");
                    event_loop.exit();
                }
            }

            _ => {}
        }
    }
}

fn map_key(code: KeyCode) -> Option<Key> {
    match code {
        KeyCode::ArrowLeft => Some(Key::Left),
        KeyCode::ArrowRight => Some(Key::Right),
        KeyCode::ArrowUp => Some(Key::Up),
        KeyCode::ArrowDown => Some(Key::Down),
        KeyCode::KeyW => Some(Key::W),
        KeyCode::KeyA => Some(Key::A),
        KeyCode::KeyS => Some(Key::S),
        KeyCode::KeyD => Some(Key::D),
        KeyCode::KeyE => Some(Key::E),
        KeyCode::Enter | KeyCode::NumpadEnter => Some(Key::Return),
        KeyCode::Escape => Some(Key::Escape),
        KeyCode::Space => Some(Key::Space),
        KeyCode::F1 => Some(Key::F1),
        KeyCode::F2 => Some(Key::F2),
        KeyCode::F3 => Some(Key::F3),
        _ => None,
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("RPG Project v{} starting...", env!("CARGO_PKG_VERSION"));
    let config = EngineConfig::load_or_default(Path::new(CONFIG_PATH));

    let event_loop = match EventLoop::new() {
        Ok(event_loop) => event_loop,
        Err(err) => {
            log::error!("Failed to create event loop: {err}");
            std::process::exit(1);
        }
    };
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(config);
    if let Err(err) = event_loop.run_app(&mut app) {
        log::error!("Event loop error: {err}");
        std::process::exit(1);
    }
    if app.failed {
        std::process::exit(1);
    }
}
