//! Layered registry of on-screen widgets owned by a game state.

pub mod menu;
pub mod text;
pub mod textbox;

use crate::assets::AssetCatalog;
use crate::engine::EngineRequest;
use menu::BaseMenu;
use rpg_core::input::KeyEvent;
use rpg_core::tags::tag;
use rpg_core::{Backend, EngineError, EngineResult, ResourceProvider, TagSet};
use text::Text;
use textbox::Textbox;

pub const MAX_GUI_LAYERS: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GuiId(pub u32);

#[derive(Debug)]
pub enum Widget {
    Text(Text),
    Menu(BaseMenu),
    Textbox(Textbox),
}

impl Widget {
    fn kind_tag(&self) -> &'static str {
        match self {
            Widget::Text(_) => tag::TEXT,
            Widget::Menu(_) => tag::BASE_MENU,
            Widget::Textbox(_) => tag::TEXTBOX,
        }
    }

    #[cfg(test)]
    pub fn as_text(&self) -> Option<&Text> {
        match self {
            Widget::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_text_mut(&mut self) -> Option<&mut Text> {
        match self {
            Widget::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_textbox(&self) -> Option<&Textbox> {
        match self {
            Widget::Textbox(textbox) => Some(textbox),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub struct GuiElement {
    pub id: GuiId,
    pub name: String,
    pub layer: usize,
    pub tags: TagSet,
    pub widget: Widget,
    spawned: bool,
}

impl GuiElement {
    #[cfg(test)]
    pub fn is_spawned(&self) -> bool {
        self.spawned
    }

    fn spawn<P: ResourceProvider + ?Sized>(&mut self, resources: &mut P, assets: &AssetCatalog) {
        match &mut self.widget {
            Widget::Text(text) => text.spawn(resources, assets),
            Widget::Menu(menu) => menu.spawn(resources, assets),
            Widget::Textbox(textbox) => textbox.spawn(resources, assets),
        }
        self.spawned = true;
    }
}

/// Widgets in 16 paint-ordered layers, layer 0 drawn first.
///
/// Names are unique by convention only; lookups return the first match in
/// layer order.
#[derive(Debug)]
pub struct GuiRegistry {
    layers: [Vec<GuiElement>; MAX_GUI_LAYERS],
    next_id: u32,
}

impl GuiRegistry {
    pub fn new() -> Self {
        Self {
            layers: std::array::from_fn(|_| Vec::new()),
            next_id: 1,
        }
    }

    pub fn add(&mut self, name: &str, layer: usize, widget: Widget) -> EngineResult<GuiId> {
        if layer >= MAX_GUI_LAYERS {
            return Err(EngineError::precondition(format!(
                "GUI element {name:?} requested layer {layer}, max is {}",
                MAX_GUI_LAYERS - 1
            )));
        }
        let id = GuiId(self.next_id);
        self.next_id += 1;
        let tags = TagSet::with(&[tag::GUI_ELEMENT, tag::RENDERABLE, widget.kind_tag()]);
        self.layers[layer].push(GuiElement {
            id,
            name: name.to_string(),
            layer,
            tags,
            widget,
            spawned: false,
        });
        log::debug!("GUI element {name:?} registered on layer {layer}");
        Ok(id)
    }

    /// Spawns one element by name; returns false if there is none.
    pub fn spawn_element<P: ResourceProvider + ?Sized>(
        &mut self,
        name: &str,
        resources: &mut P,
        assets: &AssetCatalog,
    ) -> bool {
        match self.get_mut(name) {
            Some(element) => {
                element.spawn(resources, assets);
                true
            }
            None => false,
        }
    }

    /// Spawns every element that has not been spawned yet.
    pub fn spawn_all<P: ResourceProvider + ?Sized>(
        &mut self,
        resources: &mut P,
        assets: &AssetCatalog,
    ) {
        for element in self.layers.iter_mut().flatten() {
            if !element.spawned {
                element.spawn(resources, assets);
            }
        }
    }

    pub fn remove(&mut self, id: GuiId) -> bool {
        for layer in &mut self.layers {
            if let Some(index) = layer.iter().position(|e| e.id == id) {
                let element = layer.remove(index);
                log::debug!(
                    "GUI element {:?} removed from layer {}",
                    element.name,
                    element.layer
                );
                return true;
            }
        }
        false
    }

    pub fn remove_by_name(&mut self, name: &str) -> bool {
        match self.get(name).map(|e| e.id) {
            Some(id) => self.remove(id),
            None => false,
        }
    }

    pub fn get(&self, name: &str) -> Option<&GuiElement> {
        self.layers.iter().flatten().find(|e| e.name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut GuiElement> {
        self.layers.iter_mut().flatten().find(|e| e.name == name)
    }

    /// Least-populated layer, lowest index on ties.
    pub fn find_first_free_layer(&self) -> usize {
        let population = self.layer_population();
        let mut best = 0;
        for (index, &count) in population.iter().enumerate() {
            if count < population[best] {
                best = index;
            }
        }
        best
    }

    pub fn layer_population(&self) -> [usize; MAX_GUI_LAYERS] {
        std::array::from_fn(|i| self.layers[i].len())
    }

    pub fn update_all(&mut self, elapsed: f64) {
        for element in self.layers.iter_mut().flatten() {
            if let Widget::Textbox(textbox) = &mut element.widget {
                textbox.update(elapsed);
            }
        }
    }

    pub fn on_keyboard_input(&mut self, event: &KeyEvent, requests: &mut Vec<EngineRequest>) {
        for element in self.layers.iter_mut().flatten() {
            match &mut element.widget {
                Widget::Menu(menu) => requests.extend(menu.on_keyboard_input(event)),
                Widget::Textbox(textbox) => textbox.on_keyboard_input(event),
                Widget::Text(_) => {}
            }
        }
    }

    pub fn draw_all(&mut self, backend: &mut dyn Backend) {
        for element in self.layers.iter_mut().flatten() {
            if !element.spawned || !element.tags.is_renderable() {
                continue;
            }
            match &mut element.widget {
                Widget::Text(text) => text.draw(backend),
                Widget::Menu(menu) => menu.draw(backend),
                Widget::Textbox(textbox) => textbox.draw(backend),
            }
        }
    }

    pub fn clear(&mut self) {
        for layer in &mut self.layers {
            layer.clear();
        }
    }

    pub fn len(&self) -> usize {
        self.layers.iter().map(Vec::len).sum()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for GuiRegistry {
    fn default() -> Self {
        Self::new()
    }
}
