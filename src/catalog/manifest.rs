use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::foundation::error::{ToonlinkError, ToonlinkResult};
use crate::scene::model::Vec2Def;

/// Named anchor coordinates on a character body, relative to the body center.
///
/// Used to position face features and to default accessory placement
/// consistently across different body art.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttachmentPoints {
    /// Head anchor (eyes target, hat default).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head: Option<Vec2Def>,
    /// Feet anchor (shoe default).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feet: Option<Vec2Def>,
    /// Hand anchor (held-item default).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hand: Option<Vec2Def>,
}

/// Metadata for one catalog asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetMeta {
    /// Opaque asset id referenced by creations.
    pub id: String,
    /// Display name.
    pub name: String,
    /// File reference, relative to the catalog root.
    pub file: String,
    /// Duration in seconds (audio assets).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    /// Anchor points (character bodies).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment_points: Option<AttachmentPoints>,
    /// Whether the asset accepts the body color tint.
    #[serde(default)]
    pub colorizable: bool,
}

/// Catalog browsing categories exposed to the builder screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetCategory {
    /// Character body art.
    CharacterBodies,
    /// Character accessories (hats, glasses, shoes).
    CharacterAccessories,
    /// Face features (eyes and mouths).
    CharacterFaces,
    /// Scene backgrounds.
    Backgrounds,
    /// Scene stickers.
    Stickers,
    /// Looping music tracks.
    Music,
    /// One-shot sound effects, flattened across sub-categories.
    Sfx,
    /// Voice clips.
    Voices,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ImageCategories {
    #[serde(default)]
    characters: CharacterCategories,
    #[serde(default)]
    backgrounds: Vec<AssetMeta>,
    #[serde(default)]
    stickers: Vec<AssetMeta>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct CharacterCategories {
    #[serde(default)]
    bodies: Vec<AssetMeta>,
    #[serde(default)]
    accessories: Vec<AssetMeta>,
    #[serde(default)]
    faces: Vec<AssetMeta>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct AudioCategories {
    #[serde(default)]
    music: Vec<AssetMeta>,
    /// Sound effects grouped by named sub-category ("reactions", "animals", ...).
    #[serde(default)]
    sfx: BTreeMap<String, Vec<AssetMeta>>,
    #[serde(default)]
    voices: Vec<AssetMeta>,
}

/// Read-only lookup model of the external asset manifest.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogManifest {
    /// Manifest version string.
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    images: ImageCategories,
    #[serde(default)]
    audio: AudioCategories,
}

impl CatalogManifest {
    /// Parse a manifest from a JSON reader.
    pub fn from_reader<R: std::io::Read>(r: R) -> ToonlinkResult<Self> {
        let manifest: Self = serde_json::from_reader(r)
            .map_err(|e| ToonlinkError::validation(format!("parse catalog manifest JSON: {e}")))?;
        tracing::info!(version = %manifest.version, "loaded catalog manifest");
        Ok(manifest)
    }

    /// Parse a manifest from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> ToonlinkResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            ToonlinkError::validation(format!("open catalog manifest '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    /// Find asset metadata by id across every category.
    pub fn find_asset(&self, id: &str) -> Option<&AssetMeta> {
        self.all_categories()
            .flat_map(|c| c.iter())
            .find(|a| a.id == id)
    }

    /// Return `true` when `id` resolves in the catalog.
    pub fn contains(&self, id: &str) -> bool {
        self.find_asset(id).is_some()
    }

    /// All assets in one browsing category, in manifest order.
    pub fn assets_by_category(&self, category: AssetCategory) -> Vec<&AssetMeta> {
        match category {
            AssetCategory::CharacterBodies => self.images.characters.bodies.iter().collect(),
            AssetCategory::CharacterAccessories => {
                self.images.characters.accessories.iter().collect()
            }
            AssetCategory::CharacterFaces => self.images.characters.faces.iter().collect(),
            AssetCategory::Backgrounds => self.images.backgrounds.iter().collect(),
            AssetCategory::Stickers => self.images.stickers.iter().collect(),
            AssetCategory::Music => self.audio.music.iter().collect(),
            AssetCategory::Sfx => self.audio.sfx.values().flatten().collect(),
            AssetCategory::Voices => self.audio.voices.iter().collect(),
        }
    }

    /// Return `true` when `id` names an audio asset (music, sfx, or voice).
    pub fn is_audio(&self, id: &str) -> bool {
        self.audio.music.iter().any(|a| a.id == id)
            || self.audio.sfx.values().flatten().any(|a| a.id == id)
            || self.audio.voices.iter().any(|a| a.id == id)
    }

    fn all_categories(&self) -> impl Iterator<Item = &[AssetMeta]> {
        [
            self.images.characters.bodies.as_slice(),
            self.images.characters.accessories.as_slice(),
            self.images.characters.faces.as_slice(),
            self.images.backgrounds.as_slice(),
            self.images.stickers.as_slice(),
            self.audio.music.as_slice(),
            self.audio.voices.as_slice(),
        ]
        .into_iter()
        .chain(self.audio.sfx.values().map(|v| v.as_slice()))
    }
}


#[cfg(test)]
mod tests {
    use super::test_fixtures::sample_manifest;
    use super::*;

    #[test]
    fn finds_assets_across_categories() {
        let m = sample_manifest();
        assert!(m.find_asset("char-body-cat").is_some());
        assert!(m.find_asset("sfx-meow").is_some());
        assert!(m.find_asset("voice-hello").is_some());
        assert!(m.find_asset("nope").is_none());
    }

    #[test]
    fn sfx_category_flattens_sub_categories() {
        let m = sample_manifest();
        let sfx: Vec<&str> = m
            .assets_by_category(AssetCategory::Sfx)
            .iter()
            .map(|a| a.id.as_str())
            .collect();
        assert!(sfx.contains(&"sfx-honk"));
        assert!(sfx.contains(&"sfx-meow"));
    }

    #[test]
    fn attachment_points_parse_from_camel_case() {
        let m = sample_manifest();
        let body = m.find_asset("char-body-cat").unwrap();
        let points = body.attachment_points.as_ref().unwrap();
        assert_eq!(points.head, Some(Vec2Def::new(0.0, -120.0)));
        assert!(body.colorizable);
    }

    #[test]
    fn audio_classification() {
        let m = sample_manifest();
        assert!(m.is_audio("music-chill-lofi-01"));
        assert!(m.is_audio("sfx-honk"));
        assert!(!m.is_audio("bg-space"));
    }
}
