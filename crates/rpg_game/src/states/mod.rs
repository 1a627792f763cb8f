//! Game states. Exactly one is active; switching fully deactivates the
//! previous one, there is no stack.

pub mod main_menu;
pub mod overworld;

use crate::engine::FrameContext;
use crate::gui::GuiRegistry;
use rpg_core::input::KeyEvent;
use rpg_core::render::DebugStats;
use rpg_core::{Backend, Color};

pub trait GameState {
    fn name(&self) -> &'static str;

    fn gui(&self) -> &GuiRegistry;

    fn gui_mut(&mut self) -> &mut GuiRegistry;

    /// Spawns every registered widget that has not been spawned yet.
    fn on_state_activated(&mut self, ctx: &mut FrameContext<'_>) {
        self.gui_mut().spawn_all(&mut *ctx.resources, ctx.assets);
    }

    fn on_state_deactivated(&mut self, _ctx: &mut FrameContext<'_>) {}

    /// Runs a pending level transition, if any. When this returns true the
    /// engine skips the rest of the frame's update.
    fn perform_pending_transition(&mut self, _ctx: &mut FrameContext<'_>) -> bool {
        false
    }

    fn update(&mut self, ctx: &mut FrameContext<'_>);

    fn draw(&mut self, backend: &mut dyn Backend);

    fn on_keyboard_input(&mut self, event: &KeyEvent, ctx: &mut FrameContext<'_>);

    fn on_mouse_wheel(&mut self, _delta: f32, _ctx: &mut FrameContext<'_>) {}

    fn clear_color(&self) -> Color {
        Color::BLACK
    }

    fn fill_debug_stats(&self, stats: &mut DebugStats) {
        stats.gui_elements = self.gui().len();
    }
}
