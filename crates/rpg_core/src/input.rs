//! Input events and the per-frame input snapshot.
//!
//! The platform layer translates window events into [`InputEvent`]s and
//! queues them; the engine drains the queue once at the top of each frame.
//! Gameplay reacts to the discrete [`KeyEvent`]s it is forwarded (the
//! character keeps its own movement flags from raw press/release), while
//! [`InputState`] keeps a level-triggered view for debug tooling and the
//! cursor light.

use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Left,
    Right,
    Up,
    Down,
    W,
    A,
    S,
    D,
    E,
    Return,
    Escape,
    Space,
    F1,
    F2,
    F3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: Key,
    pub pressed: bool,
    pub repeat: bool,
}

impl KeyEvent {
    pub fn press(key: Key) -> Self {
        Self {
            key,
            pressed: true,
            repeat: false,
        }
    }

    pub fn release(key: Key) -> Self {
        Self {
            key,
            pressed: false,
            repeat: false,
        }
    }

    /// A fresh press, ignoring OS key-repeat.
    pub fn is_fresh_press(&self) -> bool {
        self.pressed && !self.repeat
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    Quit,
    Key(KeyEvent),
    MouseMoved { x: f32, y: f32 },
    MouseWheel { delta: f32 },
}

pub struct InputState {
    held: HashSet<Key>,
    just_pressed: HashSet<Key>,
    just_released: HashSet<Key>,

    pub mouse_position: (f32, f32),
}

impl InputState {
    pub fn new() -> Self {
        Self {
            held: HashSet::new(),
            just_pressed: HashSet::new(),
            just_released: HashSet::new(),
            mouse_position: (0.0, 0.0),
        }
    }

    pub fn apply(&mut self, event: &InputEvent) {
        match *event {
            InputEvent::Key(KeyEvent { key, pressed, .. }) => {
                if pressed {
                    self.key_down(key);
                } else {
                    self.key_up(key);
                }
            }
            InputEvent::MouseMoved { x, y } => self.mouse_position = (x, y),
            InputEvent::Quit | InputEvent::MouseWheel { .. } => {}
        }
    }

    pub fn key_down(&mut self, key: Key) {
        if self.held.insert(key) {
            self.just_pressed.insert(key);
        }
    }

    pub fn key_up(&mut self, key: Key) {
        if self.held.remove(&key) {
            self.just_released.insert(key);
        }
    }

    pub fn is_held(&self, key: Key) -> bool {
        self.held.contains(&key)
    }

    pub fn is_just_pressed(&self, key: Key) -> bool {
        self.just_pressed.contains(&key)
    }

    pub fn is_just_released(&self, key: Key) -> bool {
        self.just_released.contains(&key)
    }

    pub fn end_frame(&mut self) {
        self.just_pressed.clear();
        self.just_released.clear();
    }
}

impl Default for InputState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_down_sets_held_and_just_pressed() {
        let mut input = InputState::new();
        input.apply(&InputEvent::Key(KeyEvent::press(Key::W)));
        assert!(input.is_held(Key::W));
        assert!(input.is_just_pressed(Key::W));
    }

    #[test]
    fn test_key_up_clears_held_sets_just_released() {
        let mut input = InputState::new();
        input.key_down(Key::A);
        input.apply(&InputEvent::Key(KeyEvent::release(Key::A)));
        assert!(!input.is_held(Key::A));
        assert!(input.is_just_released(Key::A));
    }

    #[test]
    fn test_key_up_without_down_is_no_op() {
        let mut input = InputState::new();
        input.key_up(Key::D);
        assert!(!input.is_just_released(Key::D));
        assert!(!input.is_held(Key::D));
    }

    #[test]
    fn test_end_frame_clears_transient_state() {
        let mut input = InputState::new();
        input.key_down(Key::Return);
        input.key_down(Key::S);
        input.end_frame();
        assert!(!input.is_just_pressed(Key::Return));
        assert!(input.is_held(Key::Return));
        assert!(input.is_held(Key::S));
    }

    #[test]
    fn test_mouse_moved_updates_position() {
        let mut input = InputState::new();
        input.apply(&InputEvent::MouseMoved { x: 100.0, y: 200.0 });
        assert_eq!(input.mouse_position, (100.0, 200.0));
    }

    #[test]
    fn test_repeat_is_not_a_fresh_press() {
        let repeat = KeyEvent {
            key: Key::Down,
            pressed: true,
            repeat: true,
        };
        assert!(!repeat.is_fresh_press());
        assert!(KeyEvent::press(Key::Down).is_fresh_press());
        assert!(!KeyEvent::release(Key::Down).is_fresh_press());
    }
}
