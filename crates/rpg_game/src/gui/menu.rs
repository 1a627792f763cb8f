use crate::assets::AssetCatalog;
use crate::engine::EngineRequest;
use crate::gui::text::Text;
use glam::Vec2;
use rpg_core::input::{Key, KeyEvent};
use rpg_core::{Backend, Color, ResourceProvider};
use std::fmt;

pub type MenuAction = Box<dyn Fn() -> EngineRequest>;

const SELECTED_COLOR: Color = Color::YELLOW;
const IDLE_COLOR: Color = Color::WHITE;

pub struct MenuOption {
    pub label: String,
    pub text: Text,
    action: MenuAction,
}

impl fmt::Debug for MenuOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MenuOption").field("label", &self.label).finish()
    }
}

/// Vertical list of selectable text options. Up/Down move the selection
/// with wraparound and Return yields the selected option's request.
#[derive(Debug, Default)]
pub struct BaseMenu {
    options: Vec<MenuOption>,
    selected: usize,
}

impl BaseMenu {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the option's text so callers can restyle it.
    pub fn add_option(
        &mut self,
        label: &str,
        position: Vec2,
        action: impl Fn() -> EngineRequest + 'static,
    ) -> &mut Text {
        self.options.push(MenuOption {
            label: label.to_string(),
            text: Text::new(label, position).with_color(IDLE_COLOR),
            action: Box::new(action),
        });
        let index = self.options.len() - 1;
        &mut self.options[index].text
    }

    #[cfg(test)]
    pub fn option(&self, index: usize) -> Option<&MenuOption> {
        self.options.get(index)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.options.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    #[cfg(test)]
    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn spawn<P: ResourceProvider + ?Sized>(
        &mut self,
        resources: &mut P,
        assets: &AssetCatalog,
    ) {
        for option in &mut self.options {
            option.text.spawn(resources, assets);
        }
    }

    pub fn on_keyboard_input(&mut self, event: &KeyEvent) -> Option<EngineRequest> {
        if !event.is_fresh_press() || self.options.is_empty() {
            return None;
        }
        let count = self.options.len();
        match event.key {
            Key::Up => {
                self.selected = (self.selected + count - 1) % count;
                None
            }
            Key::Down => {
                self.selected = (self.selected + 1) % count;
                None
            }
            Key::Return => {
                let option = &self.options[self.selected];
                log::debug!("Menu option {:?} chosen", option.label);
                Some((option.action)())
            }
            _ => None,
        }
    }

    pub fn draw(&mut self, backend: &mut dyn Backend) {
        let selected = self.selected;
        for (i, option) in self.options.iter_mut().enumerate() {
            let color = if i == selected {
                SELECTED_COLOR
            } else {
                IDLE_COLOR
            };
            option.text.set_color(color);
            option.text.draw(backend);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::HeadlessBackend;

    fn menu() -> BaseMenu {
        let mut menu = BaseMenu::new();
        menu.add_option("Enter Debug Room", Vec2::new(100.0, 100.0), || {
            EngineRequest::StartLevel("assets/levels/debug_room.json".to_string())
        });
        menu.add_option("Toggle Debug Mode", Vec2::new(100.0, 140.0), || {
            EngineRequest::ToggleDebug
        });
        menu.add_option("Quit", Vec2::new(100.0, 180.0), || EngineRequest::Quit);
        menu
    }

    #[test]
    fn selection_wraps_both_ways() {
        let mut menu = menu();
        menu.on_keyboard_input(&KeyEvent::press(Key::Up));
        assert_eq!(menu.selected(), 2);
        menu.on_keyboard_input(&KeyEvent::press(Key::Down));
        assert_eq!(menu.selected(), 0);
        menu.on_keyboard_input(&KeyEvent::press(Key::Down));
        assert_eq!(menu.selected(), 1);
    }

    #[test]
    fn return_runs_selected_action() {
        let mut menu = menu();
        menu.on_keyboard_input(&KeyEvent::press(Key::Down));
        assert_eq!(
            menu.on_keyboard_input(&KeyEvent::press(Key::Return)),
            Some(EngineRequest::ToggleDebug)
        );
    }

    #[test]
    fn repeats_and_releases_are_ignored() {
        let mut menu = menu();
        menu.on_keyboard_input(&KeyEvent {
            key: Key::Down,
            pressed: true,
            repeat: true,
        });
        menu.on_keyboard_input(&KeyEvent::release(Key::Down));
        assert_eq!(menu.selected(), 0);
        assert_eq!(
            menu.on_keyboard_input(&KeyEvent::release(Key::Return)),
            None
        );
    }

    #[test]
    fn selected_option_is_highlighted() {
        let mut menu = menu();
        let mut backend = HeadlessBackend::new();
        menu.spawn(&mut backend, &AssetCatalog::new("40573_VIDEOTER", 32));
        menu.on_keyboard_input(&KeyEvent::press(Key::Down));
        menu.draw(&mut backend);

        let colors: Vec<Color> = (0..menu.len())
            .filter_map(|i| menu.option(i))
            .map(|option| option.text.color())
            .collect();
        assert_eq!(colors, vec![IDLE_COLOR, SELECTED_COLOR, IDLE_COLOR]);
        assert_eq!(
            backend.texts(),
            vec!["Enter Debug Room", "Toggle Debug Mode", "Quit"]
        );
    }

    #[test]
    fn empty_menu_ignores_input() {
        let mut menu = BaseMenu::new();
        assert_eq!(menu.on_keyboard_input(&KeyEvent::press(Key::Return)), None);
        assert!(menu.is_empty());
    }
}
