//! String tags used for capability checks instead of type inspection.

/// Well-known tag names.
pub mod tag {
    pub const COLLISION: &str = "Collision";
    pub const RENDERABLE: &str = "Renderable";
    pub const NOT_RENDERING: &str = "NotRendering";
    pub const ENTITY: &str = "Entity";
    pub const CHARACTER: &str = "Character";
    pub const NPC: &str = "NPC";
    pub const DOOR: &str = "Door";
    pub const LIGHT: &str = "Light";
    pub const LANDMARK: &str = "Landmark";
    pub const ENEMY: &str = "Enemy";
    pub const DONT_MOVE: &str = "DontMove";
    pub const GUI_ELEMENT: &str = "GUIElement";
    pub const TEXT: &str = "Text";
    pub const TEXTBOX: &str = "Textbox";
    pub const BASE_MENU: &str = "BaseMenu";
}

/// An insertion-ordered set of case-sensitive tags. Adding a tag that is
/// already present is a no-op, so a single `remove` always clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSet {
    tags: Vec<String>,
}

impl TagSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(tags: &[&str]) -> Self {
        let mut set = Self::new();
        for t in tags {
            set.add(*t);
        }
        set
    }

    pub fn add(&mut self, tag: impl Into<String>) {
        let tag = tag.into();
        if !self.has(&tag) {
            self.tags.push(tag);
        }
    }

    pub fn remove(&mut self, tag: &str) -> bool {
        let before = self.tags.len();
        self.tags.retain(|t| t != tag);
        self.tags.len() != before
    }

    pub fn has(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Drawn unless explicitly opted out; an explicit `Renderable` wins over
    /// `NotRendering`.
    pub fn is_renderable(&self) -> bool {
        self.has(tag::RENDERABLE) || !self.has(tag::NOT_RENDERING)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_is_idempotent() {
        let mut tags = TagSet::new();
        tags.add(tag::DONT_MOVE);
        tags.add(tag::DONT_MOVE);
        assert_eq!(tags.len(), 1);
        assert!(tags.remove(tag::DONT_MOVE));
        assert!(!tags.has(tag::DONT_MOVE));
    }

    #[test]
    fn remove_missing_tag_reports_false() {
        let mut tags = TagSet::with(&[tag::ENTITY]);
        assert!(!tags.remove(tag::CHARACTER));
        assert_eq!(tags.len(), 1);
    }

    #[test]
    fn has_is_case_sensitive() {
        let tags = TagSet::with(&[tag::CHARACTER]);
        assert!(tags.has("Character"));
        assert!(!tags.has("character"));
    }

    #[test]
    fn renderable_rules() {
        assert!(TagSet::new().is_renderable());
        assert!(!TagSet::with(&[tag::NOT_RENDERING]).is_renderable());
        assert!(TagSet::with(&[tag::NOT_RENDERING, tag::RENDERABLE]).is_renderable());
    }

    #[test]
    fn iter_preserves_insertion_order() {
        let tags = TagSet::with(&[tag::ENTITY, tag::LIGHT, tag::NOT_RENDERING]);
        let collected: Vec<&str> = tags.iter().collect();
        assert_eq!(collected, vec!["Entity", "Light", "NotRendering"]);
    }
}
