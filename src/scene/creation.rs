use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use kurbo::Point;

use crate::catalog::manifest::CatalogManifest;
use crate::foundation::core::Canvas;
use crate::foundation::error::{ToonlinkError, ToonlinkResult};
use crate::scene::model::{
    CreationDef, CueDef, MusicDef, PlacementDef, TextDef, TextStyle, Vec2Def,
};
use crate::scene::sanitize::{MAX_TEXT_LEN, sanitize_text};
use crate::schema::validate::{ValidationOptions, ValidationReport, validate_all};

/// Character face slots.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FaceFeature {
    /// Eye art.
    Eyes,
    /// Mouth art.
    Mouth,
}

/// Collections whose array order doubles as z-order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayerKind {
    /// Character accessories.
    Accessory,
    /// Scene stickers.
    Sticker,
    /// Text bubbles.
    Text,
}

/// Direction for z-order reordering.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayerShift {
    /// Swap with the item above (later in the array).
    Up,
    /// Swap with the item below (earlier in the array).
    Down,
}

/// Interactive creation being assembled across the builder stages.
///
/// Wraps a [`CreationDef`] with the mutations the builder screens perform.
/// A published token is never updated in place: remixing decodes into a new
/// `Creation`, mutates the copy, and re-encodes to a new token.
#[derive(Debug, Clone)]
pub struct Creation {
    def: CreationDef,
    canvas: Canvas,
}

impl Creation {
    /// Fresh creation on the default canvas.
    pub fn new() -> Self {
        Self::from_def(CreationDef::new())
    }

    /// Wrap an existing record (e.g. a decoded share token, for remixing).
    pub fn from_def(def: CreationDef) -> Self {
        Self {
            def,
            canvas: Canvas::default(),
        }
    }

    /// Parse a creation from a JSON reader.
    pub fn from_reader<R: std::io::Read>(r: R) -> ToonlinkResult<Self> {
        let def: CreationDef = serde_json::from_reader(r)
            .map_err(|e| ToonlinkError::validation(format!("parse creation JSON: {e}")))?;
        Ok(Self::from_def(def))
    }

    /// Parse a creation from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> ToonlinkResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            ToonlinkError::validation(format!("open creation JSON '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    /// The wrapped record.
    pub fn def(&self) -> &CreationDef {
        &self.def
    }

    /// Consume into the wrapped record (for encoding).
    pub fn into_def(self) -> CreationDef {
        self.def
    }

    /// Canvas the builder is placing onto.
    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    /// Run the full validation suite against this creation.
    pub fn validate(
        &self,
        catalog: Option<&CatalogManifest>,
        opts: &ValidationOptions,
    ) -> ValidationReport {
        validate_all(&self.def, catalog, opts)
    }

    // ---- character stage ----

    /// Select the character body.
    pub fn set_body(&mut self, id: impl Into<String>) {
        self.def.character.body = Some(id.into());
    }

    /// Set the body tint color (`#RRGGBB`).
    pub fn set_body_color(&mut self, color: impl Into<String>) {
        self.def.character.color = color.into();
    }

    /// Move the body center; accessories and face follow because their
    /// positions are stored body-relative.
    pub fn set_body_position(&mut self, p: Point) {
        self.def.character.body_position = Some(p.into());
    }

    /// Resolved body center (canvas center when unset).
    pub fn body_center(&self) -> Point {
        self.def
            .character
            .body_position
            .map(|p| p.to_point())
            .unwrap_or_else(|| self.canvas.center())
    }

    /// Add an accessory and return its index.
    ///
    /// Without an explicit position the body's attachment points provide the
    /// default: an id containing "head"/"feet"/"hand" snaps to the matching
    /// anchor, anything else lands on the body center.
    pub fn add_accessory(
        &mut self,
        id: impl Into<String>,
        position: Option<Vec2Def>,
        catalog: &CatalogManifest,
    ) -> usize {
        let id = id.into();
        let position = position
            .or_else(|| self.default_attachment(&id, catalog))
            .unwrap_or_default();

        self.def
            .character
            .accessories
            .push(PlacementDef::at(id, position));
        self.def.character.accessories.len() - 1
    }

    fn default_attachment(&self, accessory_id: &str, catalog: &CatalogManifest) -> Option<Vec2Def> {
        let body_id = self.def.character.body.as_deref()?;
        let points = catalog.find_asset(body_id)?.attachment_points.as_ref()?;

        if accessory_id.contains("head") {
            points.head
        } else if accessory_id.contains("feet") {
            points.feet
        } else if accessory_id.contains("hand") {
            points.hand
        } else {
            None
        }
    }

    /// Remove the accessory at `index`; out-of-range indices are ignored.
    pub fn remove_accessory(&mut self, index: usize) -> bool {
        if index < self.def.character.accessories.len() {
            self.def.character.accessories.remove(index);
            true
        } else {
            false
        }
    }

    /// Nudge an accessory by a body-relative delta.
    pub fn move_accessory(&mut self, index: usize, dx: f64, dy: f64) {
        if let Some(acc) = self.def.character.accessories.get_mut(index) {
            acc.position.x += dx;
            acc.position.y += dy;
        }
    }

    /// Set a face feature.
    pub fn set_face(&mut self, feature: FaceFeature, id: impl Into<String>) {
        let slot = match feature {
            FaceFeature::Eyes => &mut self.def.character.face.eyes,
            FaceFeature::Mouth => &mut self.def.character.face.mouth,
        };
        *slot = Some(id.into());
    }

    // ---- scene stage ----

    /// Set the scene background.
    pub fn set_background(&mut self, id: impl Into<String>) {
        self.def.scene.background = Some(id.into());
    }

    /// Add a sticker and return its index. Defaults to the canvas center at
    /// the builder's chunky sticker scale.
    pub fn add_sticker(&mut self, id: impl Into<String>, position: Option<Vec2Def>) -> usize {
        let mut sticker =
            PlacementDef::at(id, position.unwrap_or_else(|| self.canvas.center().into()));
        sticker.scale = 1.5;
        self.def.scene.stickers.push(sticker);
        self.def.scene.stickers.len() - 1
    }

    /// Remove the sticker at `index`; out-of-range indices are ignored.
    pub fn remove_sticker(&mut self, index: usize) -> bool {
        if index < self.def.scene.stickers.len() {
            self.def.scene.stickers.remove(index);
            true
        } else {
            false
        }
    }

    /// Add a text bubble (content is sanitized before storage) and return its
    /// index.
    pub fn add_text(
        &mut self,
        content: &str,
        style: TextStyle,
        position: Option<Vec2Def>,
    ) -> usize {
        let position =
            position.unwrap_or(Vec2Def::new(f64::from(self.canvas.width) / 2.0, 200.0));

        self.def.scene.texts.push(TextDef::new(
            sanitize_text(content, MAX_TEXT_LEN),
            style,
            position,
        ));
        self.def.scene.texts.len() - 1
    }

    /// Remove the text at `index`; out-of-range indices are ignored.
    pub fn remove_text(&mut self, index: usize) -> bool {
        if index < self.def.scene.texts.len() {
            self.def.scene.texts.remove(index);
            true
        } else {
            false
        }
    }

    /// Change z-order by swapping with the adjacent element; returns whether
    /// a swap happened.
    pub fn move_layer(&mut self, kind: LayerKind, index: usize, shift: LayerShift) -> bool {
        fn swap<T>(items: &mut [T], index: usize, shift: LayerShift) -> bool {
            match shift {
                LayerShift::Up if index + 1 < items.len() => {
                    items.swap(index, index + 1);
                    true
                }
                LayerShift::Down if index > 0 && index < items.len() => {
                    items.swap(index, index - 1);
                    true
                }
                _ => false,
            }
        }

        match kind {
            LayerKind::Accessory => swap(&mut self.def.character.accessories, index, shift),
            LayerKind::Sticker => swap(&mut self.def.scene.stickers, index, shift),
            LayerKind::Text => swap(&mut self.def.scene.texts, index, shift),
        }
    }

    /// Drop an item at a scene-absolute point, converting into its storage
    /// frame (body-relative for accessories, absolute for stickers/text).
    pub fn place_at(&mut self, kind: LayerKind, index: usize, absolute: Point) {
        match kind {
            LayerKind::Accessory => {
                let rel = absolute - self.body_center();
                if let Some(acc) = self.def.character.accessories.get_mut(index) {
                    acc.position = Vec2Def::new(rel.x, rel.y);
                }
            }
            LayerKind::Sticker => {
                if let Some(sticker) = self.def.scene.stickers.get_mut(index) {
                    sticker.position = absolute.into();
                }
            }
            LayerKind::Text => {
                if let Some(text) = self.def.scene.texts.get_mut(index) {
                    text.position = absolute.into();
                }
            }
        }
    }

    // ---- audio stage ----

    /// Set the looping music track.
    pub fn set_music(&mut self, id: impl Into<String>, volume: f64) {
        self.def.audio.music = Some(MusicDef {
            id: id.into(),
            volume: volume.clamp(0.0, 1.0),
        });
    }

    /// Schedule a one-shot sound effect.
    pub fn add_sfx(&mut self, id: impl Into<String>, time: f64, volume: f64) -> usize {
        self.def.audio.sfx.push(CueDef {
            id: id.into(),
            time,
            volume: volume.clamp(0.0, 1.0),
        });
        self.def.audio.sfx.len() - 1
    }

    /// Remove the sfx cue at `index`; out-of-range indices are ignored.
    pub fn remove_sfx(&mut self, index: usize) -> bool {
        if index < self.def.audio.sfx.len() {
            self.def.audio.sfx.remove(index);
            true
        } else {
            false
        }
    }

    /// Set or replace the voice clip.
    pub fn set_voice(&mut self, id: impl Into<String>, time: f64, volume: f64) {
        self.def.audio.voice = Some(CueDef {
            id: id.into(),
            time,
            volume: volume.clamp(0.0, 1.0),
        });
    }

    /// Remove the voice clip.
    pub fn clear_voice(&mut self) {
        self.def.audio.voice = None;
    }
}

impl Default for Creation {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::manifest::test_fixtures::sample_manifest;

    #[test]
    fn accessory_defaults_to_matching_attachment_point() {
        let catalog = sample_manifest();
        let mut creation = Creation::new();
        creation.set_body("char-body-cat");

        let i = creation.add_accessory("acc-head-crown", None, &catalog);
        assert_eq!(
            creation.def().character.accessories[i].position,
            Vec2Def::new(0.0, -120.0)
        );

        let j = creation.add_accessory("acc-feet-sneakers", None, &catalog);
        assert_eq!(
            creation.def().character.accessories[j].position,
            Vec2Def::new(0.0, 180.0)
        );
    }

    #[test]
    fn accessory_without_anchor_lands_on_body_center() {
        let catalog = sample_manifest();
        let mut creation = Creation::new();
        creation.set_body("char-body-shark"); // no attachment points
        let i = creation.add_accessory("acc-head-crown", None, &catalog);
        assert_eq!(
            creation.def().character.accessories[i].position,
            Vec2Def::default()
        );
    }

    #[test]
    fn move_layer_swaps_adjacent_only() {
        let mut creation = Creation::new();
        creation.add_sticker("a", Some(Vec2Def::new(1.0, 1.0)));
        creation.add_sticker("b", Some(Vec2Def::new(2.0, 2.0)));
        creation.add_sticker("c", Some(Vec2Def::new(3.0, 3.0)));

        assert!(creation.move_layer(LayerKind::Sticker, 0, LayerShift::Up));
        let order: Vec<&str> = creation
            .def()
            .scene
            .stickers
            .iter()
            .map(|s| s.id.as_str())
            .collect();
        assert_eq!(order, ["b", "a", "c"]);

        assert!(!creation.move_layer(LayerKind::Sticker, 2, LayerShift::Up));
        assert!(!creation.move_layer(LayerKind::Sticker, 0, LayerShift::Down));
        assert!(!creation.move_layer(LayerKind::Sticker, 9, LayerShift::Down));
    }

    #[test]
    fn place_at_converts_accessories_to_body_relative() {
        let catalog = sample_manifest();
        let mut creation = Creation::new();
        creation.set_body("char-body-cat");
        creation.set_body_position(Point::new(800.0, 600.0));
        let i = creation.add_accessory("acc-head-crown", None, &catalog);

        creation.place_at(LayerKind::Accessory, i, Point::new(850.0, 500.0));
        assert_eq!(
            creation.def().character.accessories[i].position,
            Vec2Def::new(50.0, -100.0)
        );
    }

    #[test]
    fn added_text_is_sanitized() {
        let mut creation = Creation::new();
        let i = creation.add_text(
            "<script>alert(1)</script>Hi <b>there</b>",
            TextStyle::Bubble,
            None,
        );
        assert_eq!(creation.def().scene.texts[i].content, "Hi there");
        // Default placement: horizontally centered near the top.
        assert_eq!(
            creation.def().scene.texts[i].position,
            Vec2Def::new(960.0, 200.0)
        );
    }

    #[test]
    fn sticker_default_scale_is_chunky() {
        let mut creation = Creation::new();
        let i = creation.add_sticker("sticker-fire", None);
        assert!((creation.def().scene.stickers[i].scale - 1.5).abs() < 1e-12);
    }

    #[test]
    fn audio_volumes_are_clamped() {
        let mut creation = Creation::new();
        creation.set_music("music-chill-lofi-01", 1.7);
        assert!((creation.def().audio.music.as_ref().unwrap().volume - 1.0).abs() < 1e-12);
    }
}
