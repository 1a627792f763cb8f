//! The gameplay state: owns the current level, its transition record and
//! the camera that follows the character.

use crate::engine::{EngineRequest, FrameContext, StateId};
use crate::fade::LEVEL_TRANSITION_FADE;
use crate::gui::text::Text;
use crate::gui::{GuiRegistry, Widget};
use crate::level::tile::LightSource;
use crate::level::{Level, LevelTransition, LevelView};
use crate::states::GameState;
use glam::Vec2;
use rpg_core::input::{Key, KeyEvent};
use rpg_core::render::DebugStats;
use rpg_core::render_mode::{CullingMode, LightingMode};
use rpg_core::{Backend, Color, EngineResult, Rect};
use std::path::Path;

pub const FPS_TEXT: &str = "fpsText";
pub const FPS_TEXT_LAYER: usize = 15;
pub const MIN_SCALE: f32 = 0.5;
pub const MAX_SCALE: f32 = 2.0;
const SCALE_STEP: f32 = 0.1;
const CURSOR_LIGHT_COLOR: Color = Color::rgb(255, 240, 200);
const CURSOR_LIGHT_INTENSITY: f32 = 60.0;

pub struct OverworldState {
    gui: GuiRegistry,
    level: Option<Level>,
    transition: LevelTransition,
    /// World-space view; also the culling rect.
    camera: Rect,
    scale: f32,
    lighting: LightingMode,
    culling: CullingMode,
    debug: bool,
    mouse: Vec2,
}

impl OverworldState {
    pub fn new() -> Self {
        Self {
            gui: GuiRegistry::new(),
            level: None,
            transition: LevelTransition::default(),
            camera: Rect::default(),
            scale: 1.0,
            lighting: LightingMode::Standard,
            culling: CullingMode::Standard,
            debug: false,
            mouse: Vec2::ZERO,
        }
    }

    #[cfg(test)]
    pub fn level(&self) -> Option<&Level> {
        self.level.as_ref()
    }

    #[cfg(test)]
    pub fn transition_mut(&mut self) -> &mut LevelTransition {
        &mut self.transition
    }

    #[cfg(test)]
    pub fn camera(&self) -> Rect {
        self.camera
    }

    #[cfg(test)]
    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Drops the level and every widget and clears any pending transition.
    pub fn reset_state(&mut self) {
        if let Some(mut level) = self.level.take() {
            level.free_resources();
        }
        self.on_level_shutdown();
        self.transition = LevelTransition::default();
    }

    /// Replaces the current level. On failure the current level is kept.
    pub fn load_level(&mut self, path: &str, ctx: &mut FrameContext<'_>) -> EngineResult<()> {
        let level = Level::load(Path::new(path), &mut *ctx.resources, ctx.assets)?;
        if let Some(mut old) = self.level.replace(level) {
            old.free_resources();
        }
        Ok(())
    }

    /// Fresh start on a level, as the main menu does.
    pub fn start_level(&mut self, path: &str, ctx: &mut FrameContext<'_>) -> EngineResult<()> {
        self.reset_state();
        self.load_level(path, ctx)?;
        ctx.fade.clear();
        self.on_level_loaded(ctx);
        self.follow_character(ctx.viewport);
        Ok(())
    }

    fn on_level_loaded(&mut self, ctx: &mut FrameContext<'_>) {
        if let Some(level) = &mut self.level {
            level.spawn_entities(&mut *ctx.resources);
        }
        if self.gui.get(FPS_TEXT).is_none() {
            let fps = Text::new("", Vec2::new(10.0, 10.0)).with_static(false);
            if let Err(err) = self.gui.add(FPS_TEXT, FPS_TEXT_LAYER, Widget::Text(fps)) {
                log::warn!("FPS text unavailable: {err}");
            }
        }
        self.gui.spawn_all(&mut *ctx.resources, ctx.assets);
    }

    fn on_level_shutdown(&mut self) {
        self.gui.clear();
    }

    fn perform_level_transition(&mut self, ctx: &mut FrameContext<'_>) -> bool {
        let Some((path, landmark)) = self.transition.take() else {
            return false;
        };
        log::info!("Level transition to {path} at landmark {landmark:?}");

        self.on_level_shutdown();
        if let Some(mut old) = self.level.take() {
            old.free_resources();
        }

        match self.load_level(&path, ctx) {
            Ok(()) => {
                if let Some(level) = &mut self.level {
                    level.place_character_at_landmark(&landmark);
                }
                self.on_level_loaded(ctx);
                self.follow_character(ctx.viewport);
                ctx.fade.fade_from_black(LEVEL_TRANSITION_FADE);
            }
            Err(err) => {
                log::error!("Level transition to {path} failed: {err}");
                ctx.fade.fade_from_black(LEVEL_TRANSITION_FADE);
                ctx.requests.push(EngineRequest::ChangeState(StateId::MainMenu));
            }
        }
        true
    }

    /// Centres the camera on the character; it stays put without one.
    fn follow_character(&mut self, viewport: Vec2) {
        let center = self
            .level
            .as_ref()
            .and_then(Level::character)
            .map(|c| c.core.origin());
        if let Some(center) = center {
            self.camera = Rect::from_pos_size(center - viewport * 0.5, viewport);
        } else {
            self.camera = Rect::from_pos_size(self.camera.position(), viewport);
        }
    }

    fn view(&self) -> LevelView {
        let mut view = LevelView::new(self.camera);
        view.scale = self.scale;
        view.lighting = self.lighting;
        view.culling = self.culling;
        if self.debug {
            view.extra_light = Some(LightSource {
                origin: self.camera.position() + self.mouse,
                color: CURSOR_LIGHT_COLOR,
                intensity: CURSOR_LIGHT_INTENSITY,
            });
        }
        view
    }
}

impl Default for OverworldState {
    fn default() -> Self {
        Self::new()
    }
}

impl GameState for OverworldState {
    fn name(&self) -> &'static str {
        "Overworld"
    }

    fn gui(&self) -> &GuiRegistry {
        &self.gui
    }

    fn gui_mut(&mut self) -> &mut GuiRegistry {
        &mut self.gui
    }

    /// A door fade still running would otherwise black out the next state.
    fn on_state_deactivated(&mut self, ctx: &mut FrameContext<'_>) {
        ctx.fade.cancel_to_black();
        log::debug!(
            "Overworld suspended with level {:?}",
            self.level.as_ref().map(|l| &l.path)
        );
    }

    fn perform_pending_transition(&mut self, ctx: &mut FrameContext<'_>) -> bool {
        self.perform_level_transition(ctx)
    }

    fn update(&mut self, ctx: &mut FrameContext<'_>) {
        self.debug = ctx.debug;
        self.mouse = ctx.mouse;

        if let Some(level) = &mut self.level {
            level.update(ctx, &mut self.gui, &mut self.transition);
        }
        self.gui.update_all(ctx.time.elapsed);

        let fps = if self.debug {
            format!("FPS: {:.0}", ctx.time.fps)
        } else {
            String::new()
        };
        if let Some(text) = self
            .gui
            .get_mut(FPS_TEXT)
            .and_then(|e| e.widget.as_text_mut())
        {
            text.set_text(&fps);
        }

        self.follow_character(ctx.viewport);
    }

    fn draw(&mut self, backend: &mut dyn Backend) {
        let view = self.view();
        if let Some(level) = &mut self.level {
            level.draw(&mut *backend, &view);
            if self.debug {
                level.draw_collision(&mut *backend, &view);
            }
        }
        self.gui.draw_all(backend);
    }

    fn on_keyboard_input(&mut self, event: &KeyEvent, ctx: &mut FrameContext<'_>) {
        if event.is_fresh_press() {
            match event.key {
                Key::Escape => {
                    ctx.requests.push(EngineRequest::ChangeState(StateId::MainMenu));
                    return;
                }
                Key::F1 if ctx.debug => {
                    self.lighting = self.lighting.next();
                    log::info!("{}", self.lighting);
                    return;
                }
                Key::F2 if ctx.debug => {
                    self.culling = self.culling.next();
                    log::info!("{}", self.culling);
                    return;
                }
                _ => {}
            }
        }

        if let Some(level) = &mut self.level {
            level.on_keyboard_input(event);
        }
        self.gui.on_keyboard_input(event, ctx.requests);
    }

    fn on_mouse_wheel(&mut self, delta: f32, ctx: &mut FrameContext<'_>) {
        if !ctx.debug {
            return;
        }
        self.scale = (self.scale + delta.signum() * SCALE_STEP).clamp(MIN_SCALE, MAX_SCALE);
    }

    fn clear_color(&self) -> Color {
        self.level.as_ref().map_or(Color::BLACK, |l| l.background)
    }

    fn fill_debug_stats(&self, stats: &mut DebugStats) {
        stats.gui_elements = self.gui.len();
        stats.lighting = self.lighting.to_string();
        stats.culling = self.culling.to_string();
        if let Some(level) = &self.level {
            let counts = level.stats();
            stats.level = Some(level.path.clone());
            stats.entities = counts.entities;
            stats.tiles = counts.tiles;
            stats.collision_rects = counts.collision_rects;
        }
    }
}
