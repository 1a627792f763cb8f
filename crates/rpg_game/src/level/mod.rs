//! A play area: 16 paint-ordered layers of tiles and entities plus the
//! collision rectangles derived from both.

pub mod collision;
pub mod map;
pub mod tile;
pub mod tileset;

use crate::assets::{normalize_path, AssetCatalog};
use crate::engine::FrameContext;
use crate::entity::{CharacterProbe, Entity, EntityCommand, EntityContext, EntityId, Lifecycle};
use crate::gui::GuiRegistry;
use collision::{CollisionRect, CollisionSource};
use glam::Vec2;
use map::{LayerDocument, LevelDocument, ObjectGroupDocument, TileLayerDocument};
use rpg_core::geometry::distance;
use rpg_core::input::KeyEvent;
use rpg_core::json::load_json;
use rpg_core::render_mode::{CullingMode, LightingMode};
use rpg_core::tags::tag;
use rpg_core::{Color, EngineError, EngineResult, Rect, Renderer, ResourceProvider};
use std::collections::VecDeque;
use std::path::Path;
use std::sync::Arc;
use tile::{LightSource, Tile};
use tileset::{Tileset, TILE_SIZE};

pub const MAX_LAYERS: usize = 16;

const TILE_COLLISION_OUTLINE: Color = Color::rgb(255, 0, 0);
const OBJECT_COLLISION_OUTLINE: Color = Color::rgb(255, 160, 0);

/// Tiled stores flip flags in the top bits of a gid.
const GID_MASK: u32 = 0x1FFF_FFFF;

/// One-shot request to swap levels, set by a door and consumed by the
/// owning state before anything else runs that frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LevelTransition {
    pending: bool,
    pub level: String,
    pub landmark: String,
}

impl LevelTransition {
    pub fn request(&mut self, level: &str, landmark: &str) {
        self.pending = true;
        self.level = level.to_string();
        self.landmark = landmark.to_string();
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Returns `(level, landmark)` and resets the record.
    pub fn take(&mut self) -> Option<(String, String)> {
        if !self.pending {
            return None;
        }
        let taken = std::mem::take(self);
        Some((taken.level, taken.landmark))
    }
}

/// Camera and debug settings for one draw pass.
#[derive(Debug, Clone, Copy)]
pub struct LevelView {
    /// World-space rect the screen shows; also the culling rect.
    pub camera: Rect,
    pub scale: f32,
    pub lighting: LightingMode,
    pub culling: CullingMode,
    /// Transient light added at draw time, never baked.
    pub extra_light: Option<LightSource>,
}

impl LevelView {
    pub fn new(camera: Rect) -> Self {
        Self {
            camera,
            scale: 1.0,
            lighting: LightingMode::Standard,
            culling: CullingMode::Standard,
            extra_light: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LevelStats {
    pub entities: usize,
    pub tiles: usize,
    pub collision_rects: usize,
}

#[derive(Debug)]
pub struct Level {
    pub path: String,
    pub background: Color,
    tileset: Option<Arc<Tileset>>,
    tiles: [Vec<Tile>; MAX_LAYERS],
    entities: [Vec<Entity>; MAX_LAYERS],
    collision: Vec<CollisionRect>,
    /// (layer, index) of the character, resolved once at load.
    character_slot: Option<(usize, usize)>,
    next_entity_id: u32,
}

impl Level {
    pub fn empty(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            background: Color::BLACK,
            tileset: None,
            tiles: std::array::from_fn(|_| Vec::new()),
            entities: std::array::from_fn(|_| Vec::new()),
            collision: Vec::new(),
            character_slot: None,
            next_entity_id: 1,
        }
    }

    /// Parses and builds a level. A malformed document fails as a whole;
    /// nothing is partially applied.
    pub fn load<P: ResourceProvider + ?Sized>(
        path: &Path,
        resources: &mut P,
        assets: &mut AssetCatalog,
    ) -> EngineResult<Level> {
        log::info!("Loading level {}", path.display());
        let doc: LevelDocument = load_json(path)?;
        validate_level(&doc).map_err(|reason| EngineError::decode(path, reason))?;

        let base = path.parent().unwrap_or_else(|| Path::new(""));
        let mut level = Level::empty(normalize_path(path));
        level.background = doc.background_color();
        let ambient = doc.ambient_color();

        let first_gid = doc.tilesets.first().map_or(1, |t| t.firstgid);
        level.tileset = match doc.tilesets.first() {
            Some(reference) => Some(match &reference.source {
                Some(source) => assets.tilesets.load(&base.join(source), resources)?,
                None => assets.tilesets.load_embedded(&reference.embedded, base, resources)?,
            }),
            None => None,
        };

        for (index, layer) in doc.layers.iter().enumerate() {
            match layer {
                LayerDocument::Tiles(tiles) => {
                    level.add_tile_layer(index, tiles, first_gid, ambient)
                }
                LayerDocument::Objects(group) => level.add_object_layer(index, group),
                LayerDocument::Unsupported => {
                    log::debug!("Skipping unsupported layer {index} in {}", level.path)
                }
            }
        }

        level.bake_lighting();
        level.character_slot = level.find_character_slot();

        let stats = level.stats();
        log::info!(
            "Level {} loaded: {} entities, {} tiles, {} collision rects",
            level.path,
            stats.entities,
            stats.tiles,
            stats.collision_rects
        );
        Ok(level)
    }

    fn add_tile_layer(
        &mut self,
        index: usize,
        layer: &TileLayerDocument,
        first_gid: u32,
        ambient: Color,
    ) {
        let Some(tileset) = self.tileset.clone() else {
            return;
        };
        let width = layer.width.max(1) as usize;
        let offset = Vec2::new(layer.x, layer.y);

        for (cell, raw_gid) in layer.data.iter().enumerate() {
            let gid = raw_gid & GID_MASK;
            if gid == 0 || gid < first_gid {
                continue;
            }
            let id = gid - first_gid;
            let Some(data) = tileset.tile(id) else {
                log::warn!("Tile id {id} is outside tileset {} (layer {index})", tileset.path);
                continue;
            };
            let grid = Vec2::new((cell % width) as f32, (cell / width) as f32);
            let world = (offset + grid) * TILE_SIZE;

            for sub in &data.collision {
                self.collision
                    .push(CollisionRect::new(sub.translated(world), CollisionSource::Tile));
            }
            self.tiles[index].push(Tile::new(world, &tileset, data, ambient));
        }
    }

    fn add_object_layer(&mut self, index: usize, group: &ObjectGroupDocument) {
        for object in &group.objects {
            match object.object_type() {
                "collision_rect" => self.collision.push(CollisionRect::new(
                    Rect::new(object.x, object.y, object.width, object.height),
                    CollisionSource::Object,
                )),
                "character" if self.has_character() => {
                    log::debug!("Skipping second character {:?} in {}", object.name, self.path);
                }
                kind => {
                    let id = EntityId(self.next_entity_id);
                    match Entity::from_object(id, object) {
                        Some(entity) => {
                            self.next_entity_id += 1;
                            self.entities[index].push(entity);
                        }
                        None => log::debug!("Ignoring object {:?} of type {kind:?}", object.name),
                    }
                }
            }
        }
    }

    fn has_character(&self) -> bool {
        self.entities.iter().flatten().any(Entity::is_character)
    }

    /// Adds every light's contribution to every tile once.
    fn bake_lighting(&mut self) {
        let lights: Vec<LightSource> = self
            .entities
            .iter()
            .flatten()
            .filter_map(Entity::light_source)
            .collect();
        if lights.is_empty() {
            return;
        }
        for tile in self.tiles.iter_mut().flatten() {
            for light in &lights {
                tile.bake_light(light);
            }
        }
        log::debug!("Baked {} lights into {}", lights.len(), self.path);
    }

    fn find_character_slot(&self) -> Option<(usize, usize)> {
        self.entities.iter().enumerate().find_map(|(layer, entities)| {
            entities
                .iter()
                .position(Entity::is_character)
                .map(|index| (layer, index))
        })
    }

    pub fn spawn_entities<P: ResourceProvider + ?Sized>(&mut self, resources: &mut P) {
        for entity in self.entities.iter_mut().flatten() {
            entity.spawn(resources);
        }
    }

    pub fn character(&self) -> Option<&Entity> {
        let (layer, index) = self.character_slot?;
        self.entities[layer].get(index)
    }

    pub fn character_mut(&mut self) -> Option<&mut Entity> {
        let (layer, index) = self.character_slot?;
        self.entities[layer].get_mut(index)
    }

    fn character_probe(&self) -> Option<CharacterProbe> {
        self.character().map(|c| CharacterProbe {
            id: c.id(),
            rect: c.core.world_rect(),
            frozen: c.core.is_frozen(),
        })
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().flatten().find(|e| e.id() == id)
    }

    fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.iter_mut().flatten().find(|e| e.id() == id)
    }

    fn slot_of(&self, id: EntityId) -> Option<(usize, usize)> {
        self.entities.iter().enumerate().find_map(|(layer, entities)| {
            entities
                .iter()
                .position(|e| e.id() == id)
                .map(|index| (layer, index))
        })
    }

    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter().flatten()
    }

    #[cfg(test)]
    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.iter().flatten()
    }

    #[cfg(test)]
    pub fn collision(&self) -> &[CollisionRect] {
        &self.collision
    }

    pub fn find_landmark(&self, name: &str) -> Option<&Entity> {
        self.entities()
            .find(|e| e.is_landmark() && e.core.targetname == name)
    }

    /// Centres the character on the named landmark. Returns false when
    /// either is missing.
    pub fn place_character_at_landmark(&mut self, name: &str) -> bool {
        let Some(point) = self.find_landmark(name).map(|l| l.core.origin()) else {
            log::warn!("Landmark {name:?} not found in {}", self.path);
            return false;
        };
        let Some(character) = self.character_mut() else {
            return false;
        };
        character.core.render.world = point - character.core.render.size * 0.5;
        true
    }

    /// Updates every live entity, then applies the commands they queued.
    /// A failing entity is logged and skipped for this frame.
    pub fn update(
        &mut self,
        frame: &mut FrameContext<'_>,
        gui: &mut GuiRegistry,
        transition: &mut LevelTransition,
    ) {
        let character = self.character_probe();
        let mut commands = Vec::new();
        let collision = &self.collision;
        for entity in self.entities.iter_mut().flatten() {
            let mut ctx = EntityContext {
                frame: &mut *frame,
                gui: &mut *gui,
                transition: &mut *transition,
                collision,
                character,
                commands: &mut commands,
            };
            if let Err(err) = entity.update(&mut ctx) {
                log::warn!(
                    "Entity {} ({}) update failed: {err}",
                    entity.core.id,
                    entity.core.classname
                );
            }
        }
        self.run_commands(commands.into(), frame, gui, transition);
    }

    /// Fires the nearest in-range use target for `activator`. Returns true
    /// when a target engaged.
    #[cfg(test)]
    pub fn try_use(
        &mut self,
        activator: EntityId,
        frame: &mut FrameContext<'_>,
        gui: &mut GuiRegistry,
        transition: &mut LevelTransition,
    ) -> bool {
        let mut follow_up = VecDeque::new();
        let engaged = self.dispatch_use(activator, frame, gui, transition, &mut follow_up);
        self.run_commands(follow_up, frame, gui, transition);
        engaged
    }

    fn run_commands(
        &mut self,
        mut queue: VecDeque<EntityCommand>,
        frame: &mut FrameContext<'_>,
        gui: &mut GuiRegistry,
        transition: &mut LevelTransition,
    ) {
        while let Some(command) = queue.pop_front() {
            match command {
                EntityCommand::AddTag { target, tag } => {
                    if let Some(entity) = self.entity_mut(target) {
                        entity.core.tags.add(tag);
                    }
                }
                EntityCommand::TryUse { activator } => {
                    self.dispatch_use(activator, frame, gui, transition, &mut queue);
                }
                EntityCommand::FinishUse { target } => self.finish_use(target),
            }
        }
    }

    fn dispatch_use(
        &mut self,
        activator: EntityId,
        frame: &mut FrameContext<'_>,
        gui: &mut GuiRegistry,
        transition: &mut LevelTransition,
        queue: &mut VecDeque<EntityCommand>,
    ) -> bool {
        let Some(initiator) = self.entity(activator) else {
            return false;
        };
        if initiator.core.usage.in_use {
            return false;
        }
        let origin = initiator.core.origin();

        let mut nearest: Option<((usize, usize), f32)> = None;
        for (layer, entities) in self.entities.iter().enumerate() {
            for (index, entity) in entities.iter().enumerate() {
                let usage = &entity.core.usage;
                if entity.id() == activator
                    || !usage.is_candidate()
                    || usage.in_use
                    || entity.core.lifecycle == Lifecycle::Created
                    || entity.core.lifecycle == Lifecycle::Destroyed
                {
                    continue;
                }
                let d = entity.core.origin() - origin;
                let dist = distance(d.x, d.y);
                if dist <= usage.use_distance && nearest.map_or(true, |(_, best)| dist < best) {
                    nearest = Some(((layer, index), dist));
                }
            }
        }
        let Some(((layer, index), _)) = nearest else {
            return false;
        };

        let character = self.character_probe();
        let mut commands = Vec::new();
        let response = {
            let target = &mut self.entities[layer][index];
            let mut ctx = EntityContext {
                frame: &mut *frame,
                gui: &mut *gui,
                transition: &mut *transition,
                collision: &self.collision,
                character,
                commands: &mut commands,
            };
            target.on_use(activator, &mut ctx)
        };
        queue.extend(commands);

        let response = match response {
            Ok(response) => response,
            Err(err) => {
                log::warn!(
                    "Use of entity {} by {activator} failed: {err}",
                    self.entities[layer][index].id()
                );
                return false;
            }
        };
        if !response.engaged {
            return false;
        }

        let target = &mut self.entities[layer][index];
        target.core.usage.in_use = true;
        target.core.usage.activator = Some(activator);
        let target_id = target.id();
        if let Some(initiator) = self.entity_mut(activator) {
            initiator.core.usage.in_use = true;
            if response.freeze_activator {
                initiator.core.tags.add(tag::DONT_MOVE);
            }
        }
        log::debug!("Entity {activator} is using {target_id}");
        true
    }

    /// Ends an interaction: clears use state on both sides, drops the
    /// back-reference and unfreezes the activator.
    pub fn finish_use(&mut self, target: EntityId) {
        let Some((layer, index)) = self.slot_of(target) else {
            return;
        };
        let entity = &mut self.entities[layer][index];
        entity.core.usage.in_use = false;
        let activator = entity.core.usage.activator.take();
        entity.on_use_finished();

        if let Some(activator) = activator.and_then(|id| self.entity_mut(id)) {
            activator.core.usage.in_use = false;
            activator.core.tags.remove(tag::DONT_MOVE);
        }
        log::debug!("Use of {target} finished");
    }

    pub fn on_keyboard_input(&mut self, event: &KeyEvent) {
        for entity in self.entities.iter_mut().flatten() {
            entity.on_keyboard_input(event);
        }
    }

    /// Draws tiles then entities for one layer index.
    pub fn draw_layer<R: Renderer + ?Sized>(
        &mut self,
        index: usize,
        renderer: &mut R,
        view: &LevelView,
    ) {
        if index >= MAX_LAYERS {
            return;
        }
        let camera = view.camera.position();

        for tile in &mut self.tiles[index] {
            if view.culling.culls_to_camera() && !tile.world_rect().intersects(&view.camera) {
                continue;
            }
            let light = tile.lit_color(view.extra_light.as_ref());
            if view.culling.culls_unlit() && light.is_black() {
                continue;
            }
            tile.draw(renderer, camera, view.scale, view.lighting, light);
        }

        for entity in &mut self.entities[index] {
            if view.culling.culls_to_camera()
                && !entity.core.world_rect().intersects(&view.camera)
            {
                continue;
            }
            entity.draw(renderer, camera, view.scale);
        }
    }

    /// Paint order is tiles(0), entities(0), tiles(1), entities(1), ...
    pub fn draw<R: Renderer + ?Sized>(&mut self, renderer: &mut R, view: &LevelView) {
        for index in 0..MAX_LAYERS {
            self.draw_layer(index, renderer, view);
        }
    }

    pub fn draw_collision<R: Renderer + ?Sized>(&self, renderer: &mut R, view: &LevelView) {
        let camera = view.camera.position();
        for rect in &self.collision {
            let dest = rect
                .rect
                .translated(-camera)
                .scaled_about_center(view.scale);
            let color = match rect.source {
                CollisionSource::Tile => TILE_COLLISION_OUTLINE,
                CollisionSource::Object => OBJECT_COLLISION_OUTLINE,
            };
            renderer.outline_rect(dest, color);
        }
    }

    /// Drops every entity, tile and collision rect. Safe to call twice.
    pub fn free_resources(&mut self) {
        for entity in self.entities.iter_mut().flatten() {
            entity.destroy();
        }
        for layer in &mut self.entities {
            layer.clear();
        }
        for layer in &mut self.tiles {
            layer.clear();
        }
        self.collision.clear();
        self.character_slot = None;
        self.tileset = None;
    }

    pub fn stats(&self) -> LevelStats {
        LevelStats {
            entities: self.entities.iter().map(Vec::len).sum(),
            tiles: self.tiles.iter().map(Vec::len).sum(),
            collision_rects: self.collision.len(),
        }
    }
}

fn validate_level(doc: &LevelDocument) -> Result<(), String> {
    if doc.layers.len() > MAX_LAYERS {
        return Err(format!(
            "Level validation failed: {} layers, at most {MAX_LAYERS} are supported",
            doc.layers.len()
        ));
    }
    for (index, layer) in doc.layers.iter().enumerate() {
        if let LayerDocument::Tiles(tiles) = layer {
            let expected = tiles.width as usize * tiles.height as usize;
            if tiles.data.len() != expected {
                return Err(format!(
                    "Level validation failed: tile layer {index} has {} cells, expected {expected}",
                    tiles.data.len()
                ));
            }
            if doc.tilesets.is_empty() && tiles.data.iter().any(|&gid| gid & GID_MASK != 0) {
                return Err(format!(
                    "Level validation failed: tile layer {index} has tiles but no tileset"
                ));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityKind;
    use crate::gui::Widget;
    use crate::test_support::{temp_dir, DrawCall, Harness, HeadlessBackend};
    use rpg_core::input::Key;
    use std::fs;
    use std::path::PathBuf;

    fn write_level(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, body).expect("write level");
        path
    }

    fn load(path: &Path, harness: &mut Harness) -> EngineResult<Level> {
        Level::load(path, &mut harness.backend, &mut harness.assets)
    }

    const TWO_CHARACTERS: &str = r##"{
        "backgroundcolor": "#102030",
        "tilesets": [ { "firstgid": 1, "image": "tiles.png", "imagewidth": 256, "imageheight": 128,
                        "tiles": [ { "id": 1, "objectgroup": { "objects": [
                            { "x": 0, "y": 32, "width": 64, "height": 32 } ] } } ] } ],
        "layers": [
            { "type": "tilelayer", "width": 2, "height": 2, "data": [1, 2, 0, 6] },
            { "type": "objectgroup", "objects": [
                { "type": "character", "name": "first", "x": 10, "y": 20,
                  "width": 64, "height": 64 },
                { "type": "character", "name": "second", "x": 300, "y": 300,
                  "width": 64, "height": 64 },
                { "type": "collision_rect", "name": "wall", "x": 0, "y": 500,
                  "width": 200, "height": 10 },
                { "type": "signpost", "name": "ignored", "x": 0, "y": 0 },
                { "type": "landmark", "name": "north_exit", "x": 500, "y": 300 }
            ] }
        ]
    }"##;

    #[test]
    fn first_character_wins() {
        let dir = temp_dir("level");
        let path = write_level(&dir, "room.json", TWO_CHARACTERS);
        let mut harness = Harness::new();
        let level = load(&path, &mut harness).expect("level loads");

        let characters: Vec<&Entity> = level.entities().filter(|e| e.is_character()).collect();
        assert_eq!(characters.len(), 1);
        assert_eq!(characters[0].core.targetname, "first");
        assert_eq!(
            level.character().map(|c| c.core.targetname.as_str()),
            Some("first")
        );
        assert_eq!(level.stats().entities, 2);
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn tiles_and_collision_come_from_the_document() {
        let dir = temp_dir("level");
        let path = write_level(&dir, "room.json", TWO_CHARACTERS);
        let mut harness = Harness::new();
        let level = load(&path, &mut harness).expect("level loads");

        assert_eq!(level.background, Color::rgb(0x10, 0x20, 0x30));
        let positions: Vec<Vec2> = level.tiles().map(|t| t.render.world).collect();
        assert_eq!(
            positions,
            vec![Vec2::new(0.0, 0.0), Vec2::new(64.0, 0.0), Vec2::new(64.0, 64.0)]
        );
        // gid 6 is tile id 5: column 1, row 1 of the 4x2 grid.
        assert_eq!(
            level.tiles().last().and_then(|t| t.render.source),
            Some(Rect::new(64.0, 64.0, 64.0, 64.0))
        );

        let rects: Vec<(Rect, CollisionSource)> = level
            .collision()
            .iter()
            .map(|c| (c.rect, c.source))
            .collect();
        assert_eq!(
            rects,
            vec![
                (Rect::new(64.0, 32.0, 64.0, 32.0), CollisionSource::Tile),
                (Rect::new(0.0, 500.0, 200.0, 10.0), CollisionSource::Object),
            ]
        );
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn collision_outlines_are_coloured_by_origin() {
        let dir = temp_dir("level");
        let path = write_level(&dir, "room.json", TWO_CHARACTERS);
        let mut harness = Harness::new();
        let level = load(&path, &mut harness).expect("level loads");

        let mut backend = HeadlessBackend::new();
        level.draw_collision(
            &mut backend,
            &LevelView::new(Rect::new(0.0, 0.0, 1200.0, 700.0)),
        );
        assert_eq!(
            backend.calls,
            vec![
                DrawCall::Outline(Rect::new(64.0, 32.0, 64.0, 32.0), TILE_COLLISION_OUTLINE),
                DrawCall::Outline(Rect::new(0.0, 500.0, 200.0, 10.0), OBJECT_COLLISION_OUTLINE),
            ]
        );
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn too_many_layers_fail_validation() {
        let dir = temp_dir("level");
        let layers = vec![r#"{ "type": "objectgroup", "objects": [] }"#; MAX_LAYERS + 1].join(",");
        let path = write_level(&dir, "deep.json", &format!(r#"{{ "layers": [{layers}] }}"#));
        let mut harness = Harness::new();
        let err = load(&path, &mut harness).expect_err("17 layers is too many");
        assert!(err.to_string().contains("at most 16"));
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn missing_level_is_an_asset_missing_error() {
        let dir = temp_dir("level");
        let mut harness = Harness::new();
        let err = load(&dir.join("nope.json"), &mut harness).expect_err("absent level");
        assert!(err.is_missing());
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn landmark_centres_the_character() {
        let dir = temp_dir("level");
        let path = write_level(&dir, "room.json", TWO_CHARACTERS);
        let mut harness = Harness::new();
        let mut level = load(&path, &mut harness).expect("level loads");

        assert!(level.place_character_at_landmark("north_exit"));
        let character = level.character().expect("character");
        assert_eq!(character.core.render.world, Vec2::new(468.0, 268.0));
        assert_eq!(
            character.core.world_rect().center(),
            Vec2::new(500.0, 300.0)
        );
        assert!(!level.place_character_at_landmark("south_exit"));
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn lights_are_baked_once_at_load() {
        let dir = temp_dir("level");
        let path = write_level(
            &dir,
            "lit.json",
            r#"{
                "tilesets": [ { "image": "tiles.png", "imagewidth": 128, "imageheight": 64 } ],
                "layers": [
                    { "type": "tilelayer", "width": 2, "height": 1, "data": [1, 1] },
                    { "type": "objectgroup", "objects": [
                        { "type": "light", "name": "lamp", "x": 32, "y": 32,
                          "properties": [ { "name": "intensity", "value": 20 },
                                          { "name": "color_r", "value": 255 },
                                          { "name": "color_g", "value": 0 },
                                          { "name": "color_b", "value": 0 } ] }
                    ] }
                ]
            }"#,
        );
        let mut harness = Harness::new();
        let level = load(&path, &mut harness).expect("level loads");
        let colors: Vec<Color> = level.tiles().map(Tile::light_color).collect();
        assert_eq!(colors[0].r, 255);
        assert_eq!(colors[0].g, 0);
        assert!(colors[1].r < colors[0].r);
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn free_resources_is_idempotent() {
        let dir = temp_dir("level");
        let path = write_level(&dir, "room.json", TWO_CHARACTERS);
        let mut harness = Harness::new();
        let mut level = load(&path, &mut harness).expect("level loads");
        level.free_resources();
        level.free_resources();
        assert_eq!(level.stats(), LevelStats::default());
        assert!(level.character().is_none());
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn layers_paint_tiles_before_entities_per_index() {
        let dir = temp_dir("level");
        let path = write_level(
            &dir,
            "order.json",
            r#"{
                "tilesets": [ { "image": "tiles.png", "imagewidth": 64, "imageheight": 64 } ],
                "layers": [
                    { "type": "tilelayer", "width": 1, "height": 1, "data": [1] },
                    { "type": "objectgroup", "objects": [
                        { "type": "enemy", "name": "grunt", "x": 0, "y": 0 } ] },
                    { "type": "tilelayer", "width": 1, "height": 1, "data": [1] }
                ]
            }"#,
        );
        let mut harness = Harness::new();
        let mut level = load(&path, &mut harness).expect("level loads");
        let mut backend = HeadlessBackend::new();
        level.spawn_entities(&mut backend);

        let mut view = LevelView::new(Rect::new(0.0, 0.0, 1200.0, 700.0));
        view.lighting = LightingMode::Disabled;
        view.culling = CullingMode::NoLights;
        level.draw(&mut backend, &view);

        let paths: Vec<String> = backend
            .calls
            .iter()
            .filter_map(|call| match call {
                DrawCall::Texture { path, .. } => Some(path.clone()),
                _ => None,
            })
            .collect();
        let tiles_png = normalize_path(&dir.join("tiles.png"));
        assert_eq!(
            paths,
            vec![
                tiles_png.clone(),
                crate::entity::enemy::DEFAULT_ENEMY_SPRITE.to_string(),
                tiles_png
            ]
        );
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn standard_culling_skips_offscreen_and_unlit_tiles() {
        let dir = temp_dir("level");
        let path = write_level(
            &dir,
            "cull.json",
            r##"{
                "tilesets": [ { "image": "tiles.png", "imagewidth": 64, "imageheight": 64 } ],
                "properties": [ { "name": "ambient_color", "value": "#202020" } ],
                "layers": [ { "type": "tilelayer", "width": 3, "height": 1, "data": [1, 1, 1] } ]
            }"##,
        );
        let mut harness = Harness::new();
        let mut level = load(&path, &mut harness).expect("level loads");
        let mut backend = HeadlessBackend::new();
        level.draw(
            &mut backend,
            &LevelView::new(Rect::new(0.0, 0.0, 100.0, 64.0)),
        );
        assert_eq!(backend.texture_draws().len(), 2);

        let path = write_level(
            &dir,
            "dark.json",
            r#"{
                "tilesets": [ { "image": "tiles.png", "imagewidth": 64, "imageheight": 64 } ],
                "layers": [ { "type": "tilelayer", "width": 1, "height": 1, "data": [1] } ]
            }"#,
        );
        let mut dark = load(&path, &mut harness).expect("level loads");
        let mut backend = HeadlessBackend::new();
        dark.draw(
            &mut backend,
            &LevelView::new(Rect::new(0.0, 0.0, 100.0, 64.0)),
        );
        assert!(backend.calls.is_empty());
        let _ = fs::remove_dir_all(dir);
    }

    fn npc_level(dir: &Path) -> PathBuf {
        let dialogue = dir.join("greeting.json");
        fs::write(
            &dialogue,
            r#"{ "messages": [ { "text_message": "Hi", "text_rate": 0, "can_skip": false } ] }"#,
        )
        .expect("write dialogue");
        let actions = dir.join("guard_actions.json");
        fs::write(
            &actions,
            format!(
                r#"{{ "onUse": {{ "action": "dialogueOpen", "dialogueBoxType": 0,
                                 "messageFile": "{}" }} }}"#,
                dialogue.display()
            ),
        )
        .expect("write actions");
        write_level(
            dir,
            "town.json",
            &format!(
                r#"{{ "layers": [ {{ "type": "objectgroup", "objects": [
                    {{ "type": "character", "name": "hero", "x": 0, "y": 0,
                       "width": 64, "height": 64 }},
                    {{ "type": "npc", "name": "guard", "x": 80, "y": 0, "width": 64, "height": 64,
                      "properties": [ {{ "name": "npc_action_file", "value": "{}" }} ] }}
                ] }} ] }}"#,
                actions.display()
            ),
        )
    }

    #[test]
    fn use_locks_out_until_finished() {
        let dir = temp_dir("level");
        let path = npc_level(&dir);
        let mut harness = Harness::new();
        let mut level = load(&path, &mut harness).expect("level loads");
        level.spawn_entities(&mut harness.backend);
        let mut gui = GuiRegistry::new();
        let mut transition = LevelTransition::default();
        let hero = level.character().map(Entity::id).expect("hero");
        let guard = level
            .entities()
            .find(|e| matches!(e.kind, EntityKind::Npc(_)))
            .map(Entity::id)
            .expect("guard");

        assert!(level.try_use(
            hero,
            &mut harness.ctx(),
            &mut gui,
            &mut transition,
        ));
        assert!(level
            .entity(hero)
            .is_some_and(|e| e.core.usage.in_use && e.core.is_frozen()));
        assert_eq!(
            level.entity(guard).and_then(|e| e.core.usage.activator),
            Some(hero)
        );
        assert!(gui.get("guard_textbox").is_some());

        assert!(!level.try_use(
            hero,
            &mut harness.ctx(),
            &mut gui,
            &mut transition,
        ));

        level.finish_use(guard);
        assert!(level
            .entity(hero)
            .is_some_and(|e| !e.core.usage.in_use && !e.core.is_frozen()));
        assert_eq!(
            level.entity(guard).and_then(|e| e.core.usage.activator),
            None
        );
        gui.clear();

        assert!(level.try_use(
            hero,
            &mut harness.ctx(),
            &mut gui,
            &mut transition,
        ));
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn dialogue_completion_releases_the_character() {
        let dir = temp_dir("level");
        let path = npc_level(&dir);
        let mut harness = Harness::new();
        let mut level = load(&path, &mut harness).expect("level loads");
        level.spawn_entities(&mut harness.backend);
        let mut gui = GuiRegistry::new();
        let mut transition = LevelTransition::default();

        // First update activates; E queues a use on the next one.
        level.update(&mut harness.ctx(), &mut gui, &mut transition);
        level.on_keyboard_input(&KeyEvent::press(Key::E));
        level.update(&mut harness.ctx(), &mut gui, &mut transition);
        assert!(level.character().is_some_and(|c| c.core.is_frozen()));

        gui.update_all(1.0);
        gui.update_all(2.0);
        let textbox_done = gui
            .get("guard_textbox")
            .and_then(|e| match &e.widget {
                Widget::Textbox(t) => Some(t.is_current_message_finished()),
                _ => None,
            });
        assert_eq!(textbox_done, Some(true));
        gui.on_keyboard_input(&KeyEvent::press(Key::Return), &mut Vec::new());

        level.update(&mut harness.ctx(), &mut gui, &mut transition);
        assert!(gui.get("guard_textbox").is_none());
        assert!(level
            .character()
            .is_some_and(|c| !c.core.is_frozen() && !c.core.usage.in_use));
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn transition_is_taken_once() {
        let mut transition = LevelTransition::default();
        assert_eq!(transition.take(), None);
        transition.request("assets/levels/hall.json", "north_exit");
        assert!(transition.is_pending());
        assert_eq!(
            transition.take(),
            Some(("assets/levels/hall.json".to_string(), "north_exit".to_string()))
        );
        assert!(!transition.is_pending());
        assert_eq!(transition, LevelTransition::default());
    }

    #[test]
    fn shipped_levels_load() {
        let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../assets/levels");
        let mut harness = Harness::new();

        let room = load(&root.join("debug_room.json"), &mut harness).expect("debug room loads");
        let stats = room.stats();
        assert_eq!(stats.tiles, 96);
        assert_eq!(stats.entities, 6);
        // 36 wall tiles plus the table.
        assert_eq!(stats.collision_rects, 37);
        assert!(room.character().is_some());
        assert!(room.find_landmark("from_hall").is_some());

        let hall = load(&root.join("hall.json"), &mut harness).expect("hall loads");
        assert_eq!(hall.stats().collision_rects, 28);
        assert!(hall.find_landmark("from_debug_room").is_some());
        assert_eq!(harness.assets.tilesets.len(), 1);
    }
}
