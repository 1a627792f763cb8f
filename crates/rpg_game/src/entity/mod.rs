//! Level entities: a closed set of kinds sharing one core.
//!
//! Entities never hold references to each other. Cross-entity effects
//! (tagging the character, starting or finishing a use interaction) are
//! queued as [`EntityCommand`]s and applied by the owning level once the
//! update pass is over.

pub mod character;
pub mod door;
pub mod enemy;
pub mod light;
pub mod npc;

use crate::engine::FrameContext;
use crate::gui::GuiRegistry;
use crate::level::collision::CollisionRect;
use crate::level::map::{ObjectDocument, Properties};
use crate::level::tile::LightSource;
use crate::level::LevelTransition;
use character::Character;
use door::Door;
use enemy::Enemy;
use glam::Vec2;
use light::Light;
use npc::Npc;
use rpg_core::input::KeyEvent;
use rpg_core::tags::tag;
use rpg_core::{
    Color, EngineResult, Rect, RenderState, Renderer, ResourceProvider, TagSet, TextureHandle,
};
use std::fmt;

const PLACEHOLDER_COLOR: Color = Color::MAGENTA;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u32);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// Built from level data, no resources yet.
    Created,
    /// Resources loaded; becomes `Active` on its first update.
    Spawned,
    Active,
    Destroyed,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UseState {
    /// Set on the target of an interaction; never an ownership edge.
    pub activator: Option<EntityId>,
    pub in_use: bool,
    pub use_distance: f32,
}

impl UseState {
    pub fn is_candidate(&self) -> bool {
        self.use_distance > 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UseResponse {
    pub engaged: bool,
    pub freeze_activator: bool,
}

impl UseResponse {
    pub const IGNORED: UseResponse = UseResponse {
        engaged: false,
        freeze_activator: false,
    };
}

#[derive(Debug, Clone, PartialEq)]
pub enum EntityCommand {
    AddTag { target: EntityId, tag: &'static str },
    TryUse { activator: EntityId },
    FinishUse { target: EntityId },
}

/// What other entities may know about the character during an update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CharacterProbe {
    pub id: EntityId,
    pub rect: Rect,
    pub frozen: bool,
}

impl CharacterProbe {
    pub fn origin(&self) -> Vec2 {
        self.rect.center()
    }
}

pub struct EntityContext<'a, 'f> {
    pub frame: &'a mut FrameContext<'f>,
    pub gui: &'a mut GuiRegistry,
    pub transition: &'a mut LevelTransition,
    pub collision: &'a [CollisionRect],
    pub character: Option<CharacterProbe>,
    pub commands: &'a mut Vec<EntityCommand>,
}

#[derive(Debug, Clone)]
pub struct EntityCore {
    pub id: EntityId,
    pub classname: String,
    pub targetname: String,
    pub tags: TagSet,
    pub render: RenderState,
    pub properties: Properties,
    pub usage: UseState,
    /// Elapsed-clock threshold for throttled logic.
    pub next_update: f64,
    pub lifecycle: Lifecycle,
    pub texture: Option<TextureHandle>,
}

impl EntityCore {
    fn from_object(id: EntityId, object: &ObjectDocument, default_size: Vec2) -> Self {
        let mut size = Vec2::new(object.width, object.height);
        if size == Vec2::ZERO {
            size = default_size;
        }
        Self {
            id,
            classname: object.object_type().to_string(),
            targetname: object.name.clone(),
            tags: TagSet::with(&[tag::ENTITY]),
            render: RenderState::new(Vec2::new(object.x, object.y), size),
            properties: object.properties.clone(),
            usage: UseState::default(),
            next_update: 0.0,
            lifecycle: Lifecycle::Created,
            texture: None,
        }
    }

    pub fn world_rect(&self) -> Rect {
        self.render.world_rect()
    }

    pub fn origin(&self) -> Vec2 {
        self.render.origin()
    }

    pub fn is_frozen(&self) -> bool {
        self.tags.has(tag::DONT_MOVE)
    }
}

#[derive(Debug, Clone)]
pub enum EntityKind {
    Landmark,
    Character(Character),
    Npc(Npc),
    Door(Door),
    Light(Light),
    Enemy(Enemy),
}

#[derive(Debug, Clone)]
pub struct Entity {
    pub core: EntityCore,
    pub kind: EntityKind,
}

impl Entity {
    /// Builds the entity an authored object describes, or `None` for
    /// object types that are not entities.
    pub fn from_object(id: EntityId, object: &ObjectDocument) -> Option<Self> {
        let props = &object.properties;
        let (kind, default_size, tags): (EntityKind, Vec2, &[&str]) = match object.object_type() {
            "character" => (
                EntityKind::Character(Character::from_properties(props)),
                Vec2::splat(64.0),
                &[tag::CHARACTER, tag::RENDERABLE, tag::COLLISION],
            ),
            "npc" => (
                EntityKind::Npc(Npc::from_properties(props, &object.name)),
                Vec2::splat(64.0),
                &[tag::NPC, tag::RENDERABLE, tag::COLLISION],
            ),
            "door" => (
                EntityKind::Door(Door::from_properties(props)),
                Vec2::ZERO,
                &[tag::DOOR, tag::NOT_RENDERING],
            ),
            "landmark" => (EntityKind::Landmark, Vec2::ZERO, &[tag::LANDMARK, tag::NOT_RENDERING]),
            "light" => (
                EntityKind::Light(Light::from_properties(props)),
                Vec2::ZERO,
                &[tag::LIGHT, tag::NOT_RENDERING],
            ),
            "enemy" => (
                EntityKind::Enemy(Enemy::from_properties(props)),
                Vec2::splat(64.0),
                &[tag::ENEMY, tag::RENDERABLE, tag::COLLISION],
            ),
            _ => return None,
        };

        let mut core = EntityCore::from_object(id, object, default_size);
        for t in tags {
            core.tags.add(*t);
        }
        if let EntityKind::Npc(npc) = &kind {
            core.usage.use_distance = npc.use_distance;
        }
        Some(Self { core, kind })
    }

    pub fn id(&self) -> EntityId {
        self.core.id
    }

    pub fn is_character(&self) -> bool {
        self.core.tags.has(tag::CHARACTER)
    }

    pub fn is_landmark(&self) -> bool {
        matches!(self.kind, EntityKind::Landmark)
    }

    pub fn spawn<P: ResourceProvider + ?Sized>(&mut self, resources: &mut P) {
        if self.core.lifecycle != Lifecycle::Created {
            return;
        }
        match &mut self.kind {
            EntityKind::Character(character) => character.spawn(&mut self.core, resources),
            EntityKind::Npc(npc) => npc.spawn(&mut self.core, resources),
            EntityKind::Enemy(enemy) => enemy.spawn(&mut self.core, resources),
            EntityKind::Landmark | EntityKind::Door(_) | EntityKind::Light(_) => {}
        }
        self.core.lifecycle = Lifecycle::Spawned;
        log::trace!("Entity {} ({}) spawned", self.core.id, self.core.classname);
    }

    pub fn update(&mut self, ctx: &mut EntityContext<'_, '_>) -> EngineResult<()> {
        match self.core.lifecycle {
            Lifecycle::Created | Lifecycle::Destroyed => return Ok(()),
            Lifecycle::Spawned => self.core.lifecycle = Lifecycle::Active,
            Lifecycle::Active => {}
        }
        match &mut self.kind {
            EntityKind::Character(character) => character.update(&mut self.core, ctx),
            EntityKind::Npc(npc) => npc.update(&mut self.core, ctx),
            EntityKind::Door(door) => door.update(&mut self.core, ctx),
            EntityKind::Enemy(enemy) => enemy.update(&mut self.core, ctx),
            EntityKind::Landmark | EntityKind::Light(_) => Ok(()),
        }
    }

    pub fn on_use(
        &mut self,
        activator: EntityId,
        ctx: &mut EntityContext<'_, '_>,
    ) -> EngineResult<UseResponse> {
        match &mut self.kind {
            EntityKind::Npc(npc) => npc.on_use(&mut self.core, activator, ctx),
            _ => Ok(UseResponse::IGNORED),
        }
    }

    pub fn on_use_finished(&mut self) {
        if let EntityKind::Npc(npc) = &mut self.kind {
            npc.on_use_finished();
        }
    }

    pub fn on_keyboard_input(&mut self, event: &KeyEvent) {
        if let EntityKind::Character(character) = &mut self.kind {
            character.on_keyboard_input(&self.core, event);
        }
    }

    pub fn light_source(&self) -> Option<LightSource> {
        match &self.kind {
            EntityKind::Light(light) => Some(light.source(self.core.origin())),
            _ => None,
        }
    }

    pub fn destroy(&mut self) {
        self.core.lifecycle = Lifecycle::Destroyed;
    }

    pub fn draw<R: Renderer + ?Sized>(&mut self, renderer: &mut R, camera: Vec2, scale: f32) {
        if !self.core.tags.is_renderable() || self.core.lifecycle == Lifecycle::Created {
            return;
        }
        self.core.render.prepare_frame(camera, scale);
        let texture = match &self.kind {
            EntityKind::Character(character) => character.current_texture(&self.core),
            _ => self.core.texture.as_ref(),
        };
        let dest = self.core.render.rendered;
        match texture {
            Some(texture) => renderer.draw_texture(
                texture,
                self.core.render.source,
                dest,
                self.core.render.color,
            ),
            None => renderer.fill_rect(dest, PLACEHOLDER_COLOR),
        }
    }
}
