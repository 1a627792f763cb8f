//! Frame loop and game-state machine.
//!
//! One frame is: drain queued input and route it to the active state, run
//! a pending level transition (which replaces the rest of the update for
//! that frame) or update the fade and the state, render, present. States
//! and GUI callbacks never switch state directly; they push
//! [`EngineRequest`]s that the engine applies after each dispatch.

use crate::assets::AssetCatalog;
use crate::fade::ScreenFade;
use crate::states::main_menu::MainMenuState;
use crate::states::overworld::OverworldState;
use crate::states::GameState;
use glam::Vec2;
use rpg_core::input::{InputEvent, InputState, Key};
use rpg_core::render::DebugStats;
use rpg_core::time::FrameClock;
use rpg_core::{Backend, ResourceProvider};
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateId {
    MainMenu,
    Overworld,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EngineRequest {
    ChangeState(StateId),
    /// Reset the overworld onto a fresh level and switch to it.
    StartLevel(String),
    ToggleDebug,
    Quit,
}

#[derive(Debug, Clone, Copy)]
pub struct FrameTime {
    /// Seconds since the previous frame, clamped.
    pub delta: f32,
    /// Elapsed clock in tenths of a second.
    pub elapsed: f64,
    pub fps: f64,
}

/// Everything a state may touch during one dispatch.
pub struct FrameContext<'a> {
    pub resources: &'a mut dyn ResourceProvider,
    pub assets: &'a mut AssetCatalog,
    pub fade: &'a mut ScreenFade,
    pub requests: &'a mut Vec<EngineRequest>,
    pub time: FrameTime,
    pub debug: bool,
    pub viewport: Vec2,
    /// Cursor in screen space.
    pub mouse: Vec2,
}

/// Engine-owned services, split from the states so a state and its
/// context can be borrowed at the same time.
struct Runtime<B: Backend> {
    backend: B,
    assets: AssetCatalog,
    clock: FrameClock,
    fade: ScreenFade,
    input: InputState,
    requests: Vec<EngineRequest>,
    debug: bool,
}

impl<B: Backend> Runtime<B> {
    fn ctx(&mut self) -> FrameContext<'_> {
        let (x, y) = self.input.mouse_position;
        FrameContext {
            viewport: self.backend.viewport(),
            mouse: Vec2::new(x, y),
            resources: &mut self.backend,
            assets: &mut self.assets,
            fade: &mut self.fade,
            requests: &mut self.requests,
            time: FrameTime {
                delta: self.clock.delta as f32,
                elapsed: self.clock.elapsed,
                fps: self.clock.smoothed_fps,
            },
            debug: self.debug,
        }
    }
}

pub struct Engine<B: Backend> {
    runtime: Runtime<B>,
    main_menu: MainMenuState,
    overworld: OverworldState,
    active: Option<StateId>,
    running: bool,
}

impl<B: Backend> Engine<B> {
    /// Takes ownership of a ready backend and activates the main menu.
    pub fn new(
        backend: B,
        assets: AssetCatalog,
        start_level: &str,
        max_fps: Option<u32>,
        debug: bool,
    ) -> Self {
        let mut engine = Self {
            runtime: Runtime {
                backend,
                assets,
                clock: FrameClock::new(max_fps),
                fade: ScreenFade::new(),
                input: InputState::new(),
                requests: Vec::new(),
                debug,
            },
            main_menu: MainMenuState::new(start_level),
            overworld: OverworldState::new(),
            active: None,
            running: true,
        };
        engine.change_state(StateId::MainMenu);
        engine.apply_requests();
        engine
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    #[cfg(test)]
    pub fn is_debug(&self) -> bool {
        self.runtime.debug
    }

    #[cfg(test)]
    pub fn active_state(&self) -> Option<StateId> {
        self.active
    }

    pub fn backend(&self) -> &B {
        &self.runtime.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.runtime.backend
    }

    #[cfg(test)]
    pub fn overworld(&self) -> &OverworldState {
        &self.overworld
    }

    /// When the next frame may start under the frame cap.
    pub fn next_frame_deadline(&self) -> Option<Instant> {
        self.runtime.clock.next_frame_deadline()
    }

    fn state(&self, id: StateId) -> &dyn GameState {
        match id {
            StateId::MainMenu => &self.main_menu,
            StateId::Overworld => &self.overworld,
        }
    }

    /// Deactivates the current state, if any, then activates `next`.
    pub fn change_state(&mut self, next: StateId) {
        if let Some(current) = self.active.take() {
            let mut ctx = self.runtime.ctx();
            let state: &mut dyn GameState = match current {
                StateId::MainMenu => &mut self.main_menu,
                StateId::Overworld => &mut self.overworld,
            };
            state.on_state_deactivated(&mut ctx);
            log::info!("State {} deactivated", state.name());
        }

        let mut ctx = self.runtime.ctx();
        let state: &mut dyn GameState = match next {
            StateId::MainMenu => &mut self.main_menu,
            StateId::Overworld => &mut self.overworld,
        };
        state.on_state_activated(&mut ctx);
        log::info!("State {} activated", state.name());
        self.active = Some(next);
    }

    /// Applies queued requests, including any queued while applying.
    fn apply_requests(&mut self) {
        while !self.runtime.requests.is_empty() {
            let pending = std::mem::take(&mut self.runtime.requests);
            for request in pending {
                self.apply_request(request);
            }
        }
    }

    fn apply_request(&mut self, request: EngineRequest) {
        match request {
            EngineRequest::ChangeState(next) => self.change_state(next),
            EngineRequest::StartLevel(path) => {
                let result = self.overworld.start_level(&path, &mut self.runtime.ctx());
                match result {
                    Ok(()) => self.change_state(StateId::Overworld),
                    Err(err) => log::error!("Could not start level {path}: {err}"),
                }
            }
            EngineRequest::ToggleDebug => {
                self.runtime.debug = !self.runtime.debug;
                log::info!("Debug mode {}", if self.runtime.debug { "on" } else { "off" });
            }
            EngineRequest::Quit => {
                log::info!("Quit requested");
                self.running = false;
            }
        }
    }

    fn dispatch(&mut self, event: InputEvent) {
        self.runtime.input.apply(&event);
        if let InputEvent::Quit = event {
            self.running = false;
            return;
        }
        let Some(active) = self.active else {
            return;
        };

        let mut ctx = self.runtime.ctx();
        let state: &mut dyn GameState = match active {
            StateId::MainMenu => &mut self.main_menu,
            StateId::Overworld => &mut self.overworld,
        };
        match event {
            InputEvent::Key(key) if key.key == Key::F3 => {
                if key.is_fresh_press() {
                    ctx.requests.push(EngineRequest::ToggleDebug);
                }
            }
            InputEvent::Key(key) => state.on_keyboard_input(&key, &mut ctx),
            InputEvent::MouseWheel { delta } => state.on_mouse_wheel(delta, &mut ctx),
            InputEvent::MouseMoved { .. } | InputEvent::Quit => {}
        }
        self.apply_requests();
    }

    /// Runs one frame stamped with the current time.
    pub fn run_frame(&mut self, events: impl IntoIterator<Item = InputEvent>) {
        self.run_frame_at(Instant::now(), events);
    }

    pub fn run_frame_at(&mut self, now: Instant, events: impl IntoIterator<Item = InputEvent>) {
        self.runtime.clock.begin_frame_at(now);

        for event in events {
            self.dispatch(event);
            if !self.running {
                return;
            }
        }

        self.update();
        self.apply_requests();
        if self.running {
            self.render();
        }
        self.runtime.input.end_frame();
    }

    fn update(&mut self) {
        let Some(active) = self.active else {
            return;
        };
        let mut ctx = self.runtime.ctx();
        let state: &mut dyn GameState = match active {
            StateId::MainMenu => &mut self.main_menu,
            StateId::Overworld => &mut self.overworld,
        };
        if state.perform_pending_transition(&mut ctx) {
            return;
        }
        ctx.fade.update(ctx.time.elapsed);
        state.update(&mut ctx);
    }

    fn render(&mut self) {
        let Some(active) = self.active else {
            return;
        };
        let stats = if self.runtime.debug {
            self.debug_stats()
        } else {
            None
        };
        let state: &mut dyn GameState = match active {
            StateId::MainMenu => &mut self.main_menu,
            StateId::Overworld => &mut self.overworld,
        };
        let backend = &mut self.runtime.backend;
        backend.clear(state.clear_color());
        state.draw(&mut *backend);
        self.runtime.fade.draw(&mut *backend);

        if let Some(stats) = stats {
            backend.draw_debug_overlay(&stats);
        }
        backend.present();
    }

    pub fn debug_stats(&self) -> Option<DebugStats> {
        let state = self.state(self.active?);
        let clock = &self.runtime.clock;
        let mut stats = DebugStats {
            fps: clock.smoothed_fps,
            frame_time_ms: clock.smoothed_frame_time_ms,
            frame: clock.frame_count,
            elapsed: clock.elapsed,
            state: state.name().to_string(),
            ..DebugStats::default()
        };
        state.fill_debug_stats(&mut stats);
        Some(stats)
    }
}
