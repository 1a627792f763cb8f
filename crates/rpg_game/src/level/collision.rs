//! World-space collision rectangles and step-wise movement against them.
//!
//! Movement is resolved one displacement at a time: each step is committed
//! only if the moved rectangle overlaps no collision rect, otherwise the
//! step is dropped entirely. Feeding a diagonal move as two single-axis
//! steps lets one axis succeed while the other is blocked, which is what
//! produces wall sliding.

use glam::Vec2;
use rpg_core::Rect;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionSource {
    /// Authored on a tileset tile and offset by the tile's origin.
    Tile,
    /// A `collision_rect` object in the level document.
    Object,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionRect {
    pub rect: Rect,
    pub source: CollisionSource,
}

impl CollisionRect {
    pub fn new(rect: Rect, source: CollisionSource) -> Self {
        Self { rect, source }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CollisionMoveResult {
    pub rect: Rect,
    pub blocked_left: bool,
    pub blocked_right: bool,
    pub blocked_up: bool,
    pub blocked_down: bool,
}

impl CollisionMoveResult {
    pub fn any_blocked(&self) -> bool {
        self.blocked_left || self.blocked_right || self.blocked_up || self.blocked_down
    }
}

pub fn is_blocked(collision: &[CollisionRect], test: &Rect) -> bool {
    collision.iter().any(|c| c.rect.intersects(test))
}

/// Applies each displacement in order from the position left by the
/// previous one.
pub fn move_and_collide(
    rect: Rect,
    steps: &[Vec2],
    collision: &[CollisionRect],
) -> CollisionMoveResult {
    let mut result = CollisionMoveResult {
        rect,
        ..Default::default()
    };

    for &step in steps {
        if step == Vec2::ZERO {
            continue;
        }
        let candidate = result.rect.translated(step);
        if !is_blocked(collision, &candidate) {
            result.rect = candidate;
            continue;
        }
        if step.x < 0.0 {
            result.blocked_left = true;
        }
        if step.x > 0.0 {
            result.blocked_right = true;
        }
        if step.y < 0.0 {
            result.blocked_up = true;
        }
        if step.y > 0.0 {
            result.blocked_down = true;
        }
    }

    result
}

/// Splits a free displacement into x then y steps.
pub fn move_per_axis(rect: Rect, delta: Vec2, collision: &[CollisionRect]) -> CollisionMoveResult {
    move_and_collide(
        rect,
        &[Vec2::new(delta.x, 0.0), Vec2::new(0.0, delta.y)],
        collision,
    )
}
