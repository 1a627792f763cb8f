use crate::entity::{EntityCommand, EntityContext, EntityCore, EntityId, UseResponse};
use crate::gui::textbox::Textbox;
use crate::gui::Widget;
use crate::level::map::Properties;
use rpg_core::json::load_json;
use rpg_core::{EngineResult, ResourceProvider};
use serde::Deserialize;
use std::path::Path;

pub const DEFAULT_USE_DISTANCE: f32 = 96.0;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct NpcActions {
    #[serde(default, rename = "onUse")]
    pub on_use: Option<NpcAction>,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(tag = "action")]
pub enum NpcAction {
    #[serde(rename = "dialogueOpen", rename_all = "camelCase")]
    DialogueOpen {
        #[serde(default)]
        dialogue_box_type: i32,
        message_file: String,
    },
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone)]
pub struct Npc {
    pub name: String,
    pub use_distance: f32,
    sprite: Option<String>,
    action_file: Option<String>,
    actions: NpcActions,
    /// Name of the open dialogue textbox in the GUI registry.
    textbox: Option<String>,
}

impl Npc {
    pub fn from_properties(props: &Properties, fallback_name: &str) -> Self {
        Self {
            name: props
                .get_str("npc_name")
                .unwrap_or(fallback_name)
                .to_string(),
            use_distance: props.get_f32("npc_use_dist").unwrap_or(DEFAULT_USE_DISTANCE),
            sprite: props.get_str("npc_sprite").map(str::to_string),
            action_file: props.get_str("npc_action_file").map(str::to_string),
            actions: NpcActions::default(),
            textbox: None,
        }
    }

    pub fn spawn<P: ResourceProvider + ?Sized>(
        &mut self,
        core: &mut EntityCore,
        resources: &mut P,
    ) {
        if let Some(sprite) = &self.sprite {
            core.texture = resources.load_texture(sprite);
        }
        if let Some(file) = &self.action_file {
            match load_json::<NpcActions>(Path::new(file)) {
                Ok(actions) => self.actions = actions,
                Err(err) => log::warn!("NPC {} has no usable actions: {err}", self.name),
            }
        }
    }

    #[cfg(test)]
    pub fn has_open_textbox(&self) -> bool {
        self.textbox.is_some()
    }

    pub fn on_use(
        &mut self,
        core: &mut EntityCore,
        activator: EntityId,
        ctx: &mut EntityContext<'_, '_>,
    ) -> EngineResult<UseResponse> {
        if self.textbox.is_some() {
            return Ok(UseResponse::IGNORED);
        }

        match &self.actions.on_use {
            Some(NpcAction::DialogueOpen {
                dialogue_box_type,
                message_file,
            }) => {
                let script = ctx.frame.assets.dialogue.get(message_file)?;
                let mut textbox = Textbox::new(*dialogue_box_type);
                textbox.load_dialogue(script.messages.clone());

                let name = format!("{}_textbox", self.name);
                let layer = ctx.gui.find_first_free_layer();
                ctx.gui.add(&name, layer, Widget::Textbox(textbox))?;
                ctx.gui.spawn_element(&name, &mut *ctx.frame.resources, ctx.frame.assets);
                log::debug!(
                    "NPC {} ({}) opened dialogue {message_file} for {activator}",
                    self.name,
                    core.id
                );
                self.textbox = Some(name);
                Ok(UseResponse {
                    engaged: true,
                    freeze_activator: true,
                })
            }
            Some(NpcAction::Unknown) => {
                log::debug!("NPC {} has an unsupported onUse action", self.name);
                Ok(UseResponse::IGNORED)
            }
            None => Ok(UseResponse::IGNORED),
        }
    }

    pub fn update(
        &mut self,
        core: &mut EntityCore,
        ctx: &mut EntityContext<'_, '_>,
    ) -> EngineResult<()> {
        let Some(name) = self.textbox.clone() else {
            return Ok(());
        };

        // A textbox that vanished (GUI cleared) counts as finished too.
        let finished = ctx
            .gui
            .get(&name)
            .and_then(|element| element.widget.as_textbox())
            .map_or(true, Textbox::is_dialogue_finished);
        if finished {
            ctx.gui.remove_by_name(&name);
            self.textbox = None;
            ctx.commands.push(EntityCommand::FinishUse { target: core.id });
        }
        Ok(())
    }

    pub fn on_use_finished(&mut self) {
        self.textbox = None;
    }
}
