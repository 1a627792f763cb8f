//! Dialogue box: a bordered panel that reveals a queue of messages one
//! character at a time.

use crate::assets::AssetCatalog;
use crate::dialogue::DialogueMessage;
use crate::gui::text::Text;
use glam::Vec2;
use rpg_core::input::{Key, KeyEvent};
use rpg_core::{Backend, Color, Rect, ResourceProvider};
use serde::Deserialize;

/// Layout and colours of one textbox type, as authored in the textbox
/// manifest.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct TextboxStyle {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub text_padding: f32,
    #[serde(rename = "borderSize")]
    pub border_size: f32,
    #[serde(rename = "bgColor")]
    pub bg_color: Color,
    #[serde(rename = "borderColor")]
    pub border_color: Color,
    pub text_size: u32,
    #[serde(rename = "textColor")]
    pub text_color: Color,
}

impl Default for TextboxStyle {
    fn default() -> Self {
        Self {
            x: 50.0,
            y: 450.0,
            width: 1100.0,
            height: 200.0,
            text_padding: 10.0,
            border_size: 4.0,
            bg_color: Color::rgba(0, 0, 0, 200),
            border_color: Color::WHITE,
            text_size: 32,
            text_color: Color::rgb(255, 0, 0),
        }
    }
}

impl TextboxStyle {
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    /// Top, bottom, left and right border bands.
    pub fn border_bands(&self) -> [Rect; 4] {
        let r = self.rect();
        let b = self.border_size;
        [
            Rect::new(r.x, r.y, r.w, b),
            Rect::new(r.x, r.bottom() - b, r.w, b),
            Rect::new(r.x, r.y, b, r.h),
            Rect::new(r.right() - b, r.y, b, r.h),
        ]
    }

    pub fn text_origin(&self) -> Vec2 {
        let inset = self.border_size + self.text_padding;
        Vec2::new(self.x + inset, self.y + inset)
    }
}

#[derive(Debug, Clone)]
pub struct Textbox {
    type_id: i32,
    style: TextboxStyle,
    text: Text,
    messages: Vec<DialogueMessage>,
    /// Messages confirmed so far; the dialogue is over once this reaches
    /// the queue length.
    consumed: usize,
    /// Characters of the current message on screen.
    revealed: usize,
    next_update: f64,
}

impl Textbox {
    pub fn new(type_id: i32) -> Self {
        let style = TextboxStyle::default();
        Self {
            type_id,
            text: Text::new("", style.text_origin()),
            style,
            messages: Vec::new(),
            consumed: 0,
            revealed: 0,
            next_update: 0.0,
        }
    }

    #[cfg(test)]
    pub fn type_id(&self) -> i32 {
        self.type_id
    }

    #[cfg(test)]
    pub fn style(&self) -> &TextboxStyle {
        &self.style
    }

    pub fn load_dialogue(&mut self, messages: Vec<DialogueMessage>) {
        self.messages = messages;
        self.consumed = 0;
        self.reset_text();
    }

    /// Resolves the style for this textbox type and the text font.
    pub fn spawn<P: ResourceProvider + ?Sized>(
        &mut self,
        resources: &mut P,
        assets: &AssetCatalog,
    ) {
        self.style = assets.textbox_style(self.type_id);
        self.text.set_position(self.style.text_origin());
        self.text.set_color(self.style.text_color);
        self.text.set_font(assets.default_font.clone(), self.style.text_size);
        self.text.spawn(resources, assets);
        log::debug!("Textbox type {} spawned", self.type_id);
    }

    fn current(&self) -> Option<&DialogueMessage> {
        self.messages.get(self.consumed)
    }

    #[cfg(test)]
    pub fn displayed_text(&self) -> &str {
        self.text.text()
    }

    pub fn is_current_message_finished(&self) -> bool {
        self.current().map_or(true, |message| {
            self.revealed >= message.text_message.chars().count()
        })
    }

    pub fn is_dialogue_finished(&self) -> bool {
        self.consumed >= self.messages.len()
    }

    fn reset_text(&mut self) {
        self.revealed = 0;
        self.text.set_text("");
    }

    fn show_revealed(&mut self) {
        let shown: String = match self.current() {
            Some(message) => message.text_message.chars().take(self.revealed).collect(),
            None => String::new(),
        };
        self.text.set_text(&shown);
    }

    /// Reveals at most one character, once `elapsed` reaches the threshold
    /// set by the previous reveal.
    pub fn update(&mut self, elapsed: f64) {
        if self.is_dialogue_finished() || self.is_current_message_finished() {
            return;
        }
        if elapsed < self.next_update {
            return;
        }
        let rate = self.current().map_or(0.0, |message| message.text_rate);
        self.revealed += 1;
        self.show_revealed();
        self.next_update = elapsed + rate;
    }

    pub fn on_keyboard_input(&mut self, event: &KeyEvent) {
        if !event.is_fresh_press() || event.key != Key::Return || self.is_dialogue_finished() {
            return;
        }

        if self.is_current_message_finished() {
            self.reset_text();
            self.consumed += 1;
            if self.is_dialogue_finished() {
                self.messages.clear();
                self.consumed = 0;
            }
        } else if self.current().is_some_and(|message| message.can_skip) {
            self.revealed = self.current().map_or(0, |m| m.text_message.chars().count());
            self.show_revealed();
        }
    }

    pub fn draw(&mut self, backend: &mut dyn Backend) {
        backend.fill_rect(self.style.rect(), self.style.bg_color);
        for band in self.style.border_bands() {
            backend.fill_rect(band, self.style.border_color);
        }
        self.text.draw(backend);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{DrawCall, HeadlessBackend};

    fn message(text: &str, rate: f64, can_skip: bool) -> DialogueMessage {
        DialogueMessage {
            text_message: text.to_string(),
            text_rate: rate,
            can_skip,
        }
    }

    fn spawned(messages: Vec<DialogueMessage>) -> (Textbox, HeadlessBackend) {
        let mut backend = HeadlessBackend::new();
        let assets = AssetCatalog::new("40573_VIDEOTER", 32);
        let mut textbox = Textbox::new(0);
        textbox.load_dialogue(messages);
        textbox.spawn(&mut backend, &assets);
        (textbox, backend)
    }

    #[test]
    fn reveal_does_not_advance_without_time() {
        let (mut textbox, _) = spawned(vec![message("Hello", 2.0, false)]);
        textbox.update(10.0);
        assert_eq!(textbox.displayed_text(), "H");
        for _ in 0..5 {
            textbox.update(10.0);
        }
        assert_eq!(textbox.displayed_text(), "H");
        textbox.update(11.9);
        assert_eq!(textbox.displayed_text(), "H");
        textbox.update(12.0);
        assert_eq!(textbox.displayed_text(), "He");
    }

    #[test]
    fn confirm_advances_only_finished_messages() {
        let (mut textbox, _) = spawned(vec![message("Hi", 0.0, false), message("Bye", 0.0, false)]);
        textbox.update(1.0);
        textbox.on_keyboard_input(&KeyEvent::press(Key::Return));
        assert_eq!(textbox.displayed_text(), "H");

        textbox.update(2.0);
        assert!(textbox.is_current_message_finished());
        textbox.on_keyboard_input(&KeyEvent::press(Key::Return));
        assert_eq!(textbox.displayed_text(), "");
        assert!(!textbox.is_dialogue_finished());

        for t in 3..6 {
            textbox.update(t as f64);
        }
        assert_eq!(textbox.displayed_text(), "Bye");
        textbox.on_keyboard_input(&KeyEvent::press(Key::Return));
        assert!(textbox.is_dialogue_finished());
    }

    #[test]
    fn skippable_messages_reveal_at_once() {
        let (mut textbox, _) = spawned(vec![message("Long line", 5.0, true)]);
        textbox.update(0.0);
        textbox.on_keyboard_input(&KeyEvent::press(Key::Return));
        assert_eq!(textbox.displayed_text(), "Long line");
        assert!(textbox.is_current_message_finished());
    }

    #[test]
    fn repeats_and_other_keys_are_ignored() {
        let (mut textbox, _) = spawned(vec![message("A", 0.0, false)]);
        textbox.update(0.0);
        let repeat = KeyEvent {
            key: Key::Return,
            pressed: true,
            repeat: true,
        };
        textbox.on_keyboard_input(&repeat);
        textbox.on_keyboard_input(&KeyEvent::press(Key::Space));
        textbox.on_keyboard_input(&KeyEvent::release(Key::Return));
        assert!(!textbox.is_dialogue_finished());
    }

    #[test]
    fn draws_background_borders_then_text() {
        let (mut textbox, mut backend) = spawned(vec![message("Yo", 0.0, false)]);
        textbox.update(0.0);
        textbox.draw(&mut backend);

        let style = TextboxStyle::default();
        assert_eq!(
            backend.calls[0],
            DrawCall::Fill(style.rect(), style.bg_color)
        );
        assert_eq!(
            backend.calls[1],
            DrawCall::Fill(Rect::new(50.0, 450.0, 1100.0, 4.0), Color::WHITE)
        );
        assert_eq!(
            backend.calls[4],
            DrawCall::Fill(Rect::new(1146.0, 450.0, 4.0, 200.0), Color::WHITE)
        );
        match &backend.calls[5] {
            DrawCall::Text { text, dest } => {
                assert_eq!(text, "Y");
                assert_eq!(dest.position(), Vec2::new(64.0, 464.0));
            }
            other => panic!("expected text, got {other:?}"),
        }
    }

    #[test]
    fn style_defaults_fill_missing_fields() {
        let style: TextboxStyle = serde_json::from_str(r#"{ "width": 600 }"#).expect("parse");
        assert_eq!(style.width, 600.0);
        assert_eq!(style.text_color, Color::rgb(255, 0, 0));
        assert_eq!(style.border_size, 4.0);
    }
}
