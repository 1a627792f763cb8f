use crate::entity::{EntityCommand, EntityContext, EntityCore};
use crate::level::collision::move_and_collide;
use crate::level::map::Properties;
use glam::Vec2;
use rpg_core::input::{Key, KeyEvent};
use rpg_core::{EngineResult, ResourceProvider, TextureHandle};

/// Pixels per second.
pub const DEFAULT_SPEED: f32 = 250.0;
pub const DEFAULT_CHARACTER_SPRITE: &str = "assets/debug/test_cube.png";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Facing {
    Up,
    #[default]
    Down,
    Left,
    Right,
}

impl Facing {
    fn index(self) -> usize {
        match self {
            Facing::Up => 0,
            Facing::Down => 1,
            Facing::Left => 2,
            Facing::Right => 3,
        }
    }
}

/// Held direction keys. Level-triggered: a flag stays set until its key
/// is released.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MoveIntent {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl MoveIntent {
    /// One displacement per held direction, in a fixed order.
    pub fn steps(&self, distance: f32) -> Vec<Vec2> {
        let mut steps = Vec::with_capacity(4);
        if self.up {
            steps.push(Vec2::new(0.0, -distance));
        }
        if self.down {
            steps.push(Vec2::new(0.0, distance));
        }
        if self.left {
            steps.push(Vec2::new(-distance, 0.0));
        }
        if self.right {
            steps.push(Vec2::new(distance, 0.0));
        }
        steps
    }
}

#[derive(Debug, Clone)]
pub struct Character {
    pub speed: f32,
    pub intent: MoveIntent,
    pub facing: Facing,
    wants_use: bool,
    sprite: String,
    directional_paths: [Option<String>; 4],
    directional: [Option<TextureHandle>; 4],
}

impl Character {
    pub fn from_properties(props: &Properties) -> Self {
        let path = |name: &str| props.get_str(name).map(str::to_string);
        Self {
            speed: props.get_f32("speed").unwrap_or(DEFAULT_SPEED),
            intent: MoveIntent::default(),
            facing: Facing::default(),
            wants_use: false,
            sprite: path("sprite").unwrap_or_else(|| DEFAULT_CHARACTER_SPRITE.to_string()),
            directional_paths: [
                path("sprite_up"),
                path("sprite_down"),
                path("sprite_left"),
                path("sprite_right"),
            ],
            directional: Default::default(),
        }
    }

    pub fn spawn<P: ResourceProvider + ?Sized>(
        &mut self,
        core: &mut EntityCore,
        resources: &mut P,
    ) {
        core.texture = resources.load_texture(&self.sprite);
        for (slot, path) in self.directional.iter_mut().zip(&self.directional_paths) {
            *slot = path.as_deref().and_then(|p| resources.load_texture(p));
        }
    }

    pub fn on_keyboard_input(&mut self, core: &EntityCore, event: &KeyEvent) {
        if event.pressed && core.is_frozen() {
            return;
        }

        let facing = match event.key {
            Key::W | Key::Up => {
                self.intent.up = event.pressed;
                Facing::Up
            }
            Key::S | Key::Down => {
                self.intent.down = event.pressed;
                Facing::Down
            }
            Key::A | Key::Left => {
                self.intent.left = event.pressed;
                Facing::Left
            }
            Key::D | Key::Right => {
                self.intent.right = event.pressed;
                Facing::Right
            }
            Key::E => {
                if event.is_fresh_press() {
                    self.wants_use = true;
                }
                return;
            }
            _ => return,
        };

        // Releasing a key never turns the character around.
        if event.pressed {
            self.facing = facing;
        }
    }

    pub fn update(
        &mut self,
        core: &mut EntityCore,
        ctx: &mut EntityContext<'_, '_>,
    ) -> EngineResult<()> {
        if core.is_frozen() {
            self.intent = MoveIntent::default();
            self.wants_use = false;
            return Ok(());
        }

        let steps = self.intent.steps(self.speed * ctx.frame.time.delta);
        if !steps.is_empty() {
            let moved = move_and_collide(core.world_rect(), &steps, ctx.collision);
            core.render.world = moved.rect.position();
        }

        if std::mem::take(&mut self.wants_use) && !core.usage.in_use {
            ctx.commands.push(EntityCommand::TryUse { activator: core.id });
        }
        Ok(())
    }

    pub fn current_texture<'a>(&'a self, core: &'a EntityCore) -> Option<&'a TextureHandle> {
        self.directional[self.facing.index()]
            .as_ref()
            .or(core.texture.as_ref())
    }
}
