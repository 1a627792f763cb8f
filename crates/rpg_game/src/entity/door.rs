use crate::entity::{EntityCommand, EntityContext, EntityCore};
use crate::fade::LEVEL_TRANSITION_FADE;
use crate::level::map::Properties;
use rpg_core::tags::tag;
use rpg_core::EngineResult;

/// Walk-in trigger that fades out and then requests a level transition.
#[derive(Debug, Clone, Default)]
pub struct Door {
    pub level: String,
    pub landmark: String,
    pub enabled: bool,
    already_faded: bool,
    requested: bool,
}

impl Door {
    pub fn from_properties(props: &Properties) -> Self {
        Self {
            level: props.get_str("level").unwrap_or_default().to_string(),
            landmark: props.get_str("landmark_entity").unwrap_or_default().to_string(),
            enabled: props.get_bool("enabled").unwrap_or(true),
            already_faded: false,
            requested: false,
        }
    }

    pub fn update(
        &mut self,
        core: &mut EntityCore,
        ctx: &mut EntityContext<'_, '_>,
    ) -> EngineResult<()> {
        if !self.enabled || self.requested || ctx.transition.is_pending() {
            return Ok(());
        }

        if !self.already_faded {
            let Some(character) = ctx.character else {
                return Ok(());
            };
            if !core.world_rect().intersects(&character.rect) {
                return Ok(());
            }
            log::debug!(
                "Door {} touched, heading to {} at {}",
                core.targetname,
                self.level,
                self.landmark
            );
            ctx.commands.push(EntityCommand::AddTag {
                target: character.id,
                tag: tag::DONT_MOVE,
            });
            ctx.frame.fade.fade_to_black(LEVEL_TRANSITION_FADE);
            self.already_faded = true;
            return Ok(());
        }

        if ctx.frame.fade.is_fading() {
            return Ok(());
        }

        ctx.transition.request(&self.level, &self.landmark);
        self.requested = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{CharacterProbe, Entity, EntityId, EntityKind};
    use crate::gui::GuiRegistry;
    use crate::level::map::ObjectDocument;
    use crate::level::LevelTransition;
    use crate::test_support::Harness;
    use rpg_core::Rect;

    fn door_entity(enabled: bool) -> Entity {
        let object: ObjectDocument = serde_json::from_str(&format!(
            r#"{{ "type": "door", "name": "north_door", "x": 0, "y": 0, "width": 64, "height": 64,
                 "properties": [
                    {{ "name": "level", "value": "assets/levels/hall.json" }},
                    {{ "name": "landmark_entity", "value": "north_exit" }},
                    {{ "name": "enabled", "value": {enabled} }}
                 ] }}"#
        ))
        .expect("door object parses");
        Entity::from_object(EntityId(7), &object).expect("door entity")
    }

    fn tick(
        entity: &mut Entity,
        harness: &mut Harness,
        transition: &mut LevelTransition,
        character: Option<CharacterProbe>,
    ) -> Vec<EntityCommand> {
        let mut gui = GuiRegistry::new();
        let mut commands = Vec::new();
        let elapsed = harness.time.elapsed;
        harness.fade.update(elapsed);
        let mut frame = harness.ctx();
        let mut ctx = EntityContext {
            frame: &mut frame,
            gui: &mut gui,
            transition,
            collision: &[],
            character,
            commands: &mut commands,
        };
        let EntityKind::Door(door) = &mut entity.kind else {
            panic!("expected door");
        };
        door.update(&mut entity.core, &mut ctx).expect("door update");
        commands
    }

    fn probe(x: f32) -> Option<CharacterProbe> {
        Some(CharacterProbe {
            id: EntityId(1),
            rect: Rect::new(x, 0.0, 64.0, 64.0),
            frozen: false,
        })
    }

    #[test]
    fn contact_freezes_fades_then_requests_once() {
        let mut harness = Harness::new();
        let mut transition = LevelTransition::default();
        let mut door = door_entity(true);

        let first = tick(&mut door, &mut harness, &mut transition, probe(32.0));
        assert_eq!(
            first,
            vec![EntityCommand::AddTag {
                target: EntityId(1),
                tag: tag::DONT_MOVE
            }]
        );
        assert!(harness.fade.is_fading());
        assert!(!transition.is_pending());

        // Still fading: nothing new happens.
        harness.time.elapsed = 1.0;
        assert!(tick(&mut door, &mut harness, &mut transition, probe(32.0)).is_empty());
        assert!(!transition.is_pending());

        harness.time.elapsed = 1.0 + LEVEL_TRANSITION_FADE;
        assert!(tick(&mut door, &mut harness, &mut transition, probe(32.0)).is_empty());
        assert!(transition.is_pending());
        assert_eq!(transition.level, "assets/levels/hall.json");
        assert_eq!(transition.landmark, "north_exit");

        let taken = transition.take().expect("pending transition");
        assert_eq!(taken.1, "north_exit");
        tick(&mut door, &mut harness, &mut transition, probe(32.0));
        assert!(!transition.is_pending());
    }

    #[test]
    fn edge_contact_does_not_trigger() {
        let mut harness = Harness::new();
        let mut transition = LevelTransition::default();
        let mut door = door_entity(true);
        assert!(tick(&mut door, &mut harness, &mut transition, probe(64.0)).is_empty());
        assert!(!harness.fade.is_fading());
    }

    #[test]
    fn disabled_door_never_triggers() {
        let mut harness = Harness::new();
        let mut transition = LevelTransition::default();
        let mut door = door_entity(false);
        assert!(tick(&mut door, &mut harness, &mut transition, probe(0.0)).is_empty());
        assert!(!harness.fade.is_fading());
    }
}
