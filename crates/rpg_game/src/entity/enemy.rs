use crate::entity::{EntityContext, EntityCore};
use crate::level::collision::move_per_axis;
use crate::level::map::Properties;
use rpg_core::{EngineResult, ResourceProvider};

pub const CHASE_RADIUS: f32 = 600.0;
/// Pixels per second.
pub const ENEMY_SPEED: f32 = 200.0;
/// Elapsed-clock units (tenths of a second) between chase decisions.
pub const THINK_INTERVAL: f64 = 2.0;
pub const DEFAULT_ENEMY_SPRITE: &str = "assets/debug/test_cube.png";

/// Walks straight at the character while it is close and free to move.
///
/// Whether the character is in range is re-checked every
/// [`THINK_INTERVAL`]; movement itself runs every frame.
#[derive(Debug, Clone)]
pub struct Enemy {
    pub speed: f32,
    pub chase_radius: f32,
    sprite: String,
    chasing: bool,
}

impl Enemy {
    pub fn from_properties(props: &Properties) -> Self {
        Self {
            speed: props.get_f32("speed").unwrap_or(ENEMY_SPEED),
            chase_radius: props.get_f32("chase_radius").unwrap_or(CHASE_RADIUS),
            sprite: props
                .get_str("sprite")
                .unwrap_or(DEFAULT_ENEMY_SPRITE)
                .to_string(),
            chasing: false,
        }
    }

    pub fn spawn<P: ResourceProvider + ?Sized>(
        &mut self,
        core: &mut EntityCore,
        resources: &mut P,
    ) {
        core.texture = resources.load_texture(&self.sprite);
    }

    pub fn update(
        &mut self,
        core: &mut EntityCore,
        ctx: &mut EntityContext<'_, '_>,
    ) -> EngineResult<()> {
        let Some(character) = ctx.character else {
            self.chasing = false;
            return Ok(());
        };
        if character.frozen {
            return Ok(());
        }

        let to_character = character.origin() - core.origin();
        let dist = to_character.length();

        let elapsed = ctx.frame.time.elapsed;
        if elapsed >= core.next_update {
            core.next_update = elapsed + THINK_INTERVAL;
            let chasing = dist < self.chase_radius;
            if chasing != self.chasing {
                log::debug!(
                    "Enemy {} {} the character",
                    core.id,
                    if chasing { "chasing" } else { "lost" }
                );
            }
            self.chasing = chasing;
        }
        if !self.chasing || dist <= f32::EPSILON {
            return Ok(());
        }

        let delta = to_character / dist * self.speed * ctx.frame.time.delta;
        let moved = move_per_axis(core.world_rect(), delta, ctx.collision);
        if moved.any_blocked() {
            log::trace!("Enemy {} blocked at {:?}", core.id, moved.rect);
        }
        core.render.world = moved.rect.position();
        Ok(())
    }
}
