use crate::engine::{EngineRequest, FrameContext};
use crate::gui::menu::BaseMenu;
use crate::gui::text::Text;
use crate::gui::{GuiRegistry, Widget};
use crate::states::GameState;
use glam::Vec2;
use rpg_core::input::{Key, KeyEvent};
use rpg_core::{Backend, EngineResult};

const TITLE_SIZE: u32 = 48;

pub struct MainMenuState {
    gui: GuiRegistry,
    start_level: String,
    built: bool,
}

impl MainMenuState {
    pub fn new(start_level: impl Into<String>) -> Self {
        Self {
            gui: GuiRegistry::new(),
            start_level: start_level.into(),
            built: false,
        }
    }

    // Built on first activation rather than in `new`, once the backend
    // and asset catalog exist.
    fn build(&mut self) -> EngineResult<()> {
        let mut menu = BaseMenu::new();
        let level = self.start_level.clone();
        menu.add_option("Enter Debug Room", Vec2::new(100.0, 100.0), move || {
            EngineRequest::StartLevel(level.clone())
        });
        menu.add_option("Toggle Debug Mode", Vec2::new(100.0, 140.0), || {
            EngineRequest::ToggleDebug
        });
        menu.add_option("Quit", Vec2::new(100.0, 180.0), || EngineRequest::Quit);
        let layer = self.gui.find_first_free_layer();
        self.gui.add("mainmenu", layer, Widget::Menu(menu))?;

        let title = Text::new(
            format!("RPG Project - v{}", env!("CARGO_PKG_VERSION")),
            Vec2::new(100.0, 20.0),
        )
        .with_font_size(TITLE_SIZE);
        let layer = self.gui.find_first_free_layer();
        self.gui.add("mainmenu_title", layer, Widget::Text(title))?;
        Ok(())
    }
}

impl GameState for MainMenuState {
    fn name(&self) -> &'static str {
        "MainMenu"
    }

    fn gui(&self) -> &GuiRegistry {
        &self.gui
    }

    fn gui_mut(&mut self) -> &mut GuiRegistry {
        &mut self.gui
    }

    fn on_state_activated(&mut self, ctx: &mut FrameContext<'_>) {
        if !self.built {
            if let Err(err) = self.build() {
                log::error!("Main menu could not be built: {err}");
            }
            self.built = true;
        }
        self.gui.spawn_all(&mut *ctx.resources, ctx.assets);
    }

    fn update(&mut self, ctx: &mut FrameContext<'_>) {
        self.gui.update_all(ctx.time.elapsed);
    }

    fn draw(&mut self, backend: &mut dyn Backend) {
        self.gui.draw_all(backend);
    }

    fn on_keyboard_input(&mut self, event: &KeyEvent, ctx: &mut FrameContext<'_>) {
        if event.is_fresh_press() && event.key == Key::Escape {
            ctx.requests.push(EngineRequest::Quit);
            return;
        }
        self.gui.on_keyboard_input(event, ctx.requests);
    }
}
