//! Debug statistics window drawn with egui on top of the game frame.
//!
//! The overlay owns no egui state of its own: the render backend calls
//! [`DebugOverlay::show`] from inside the same egui pass that paints the
//! scene, after all scene shapes were queued, so the window always lands
//! above the game.

use rpg_core::render::DebugStats;

#[derive(Debug, Default)]
pub struct DebugOverlay {
    stats: Option<DebugStats>,
}

impl DebugOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue stats for the next `show`. The overlay is only visible on
    /// frames that submitted stats.
    pub fn submit(&mut self, stats: &DebugStats) {
        self.stats = Some(stats.clone());
    }

    pub fn is_visible(&self) -> bool {
        self.stats.is_some()
    }

    /// May run more than once per frame when egui requests a discard pass.
    pub fn show(&self, ctx: &egui::Context) {
        let Some(stats) = self.stats.as_ref() else {
            return;
        };
        egui::Window::new("Debug")
            .default_pos([10.0, 40.0])
            .resizable(false)
            .show(ctx, |ui| {
                ui.label(format!("FPS: {:.1}", stats.fps));
                ui.label(format!("Frame time: {:.2} ms", stats.frame_time_ms));
                ui.label(format!("Frame: {}", stats.frame));
                ui.label(format!("Elapsed: {:.1}", stats.elapsed));
                ui.separator();
                ui.label(format!("State: {}", stats.state));
                ui.label(format!(
                    "Level: {}",
                    stats.level.as_deref().unwrap_or("<none>")
                ));
                ui.label(format!("Entities: {}", stats.entities));
                ui.label(format!("Tiles: {}", stats.tiles));
                ui.label(format!("Collision rects: {}", stats.collision_rects));
                ui.label(format!("GUI elements: {}", stats.gui_elements));
                ui.separator();
                ui.label(format!("{}  [F1]", stats.lighting));
                ui.label(format!("{}  [F2]", stats.culling));
            });
    }

    pub fn end_frame(&mut self) {
        self.stats = None;
    }
}
