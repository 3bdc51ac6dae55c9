use serde::{Deserialize, Serialize};

/// Wire format version stamped into encoded creations.
pub const WIRE_VERSION: &str = "1.0";

/// Neutral body color; tinting is skipped when the character color equals it.
pub const NEUTRAL_BODY_COLOR: &str = "#808080";

/// 2D position used by placed items.
///
/// Accessory positions are body-center-relative; sticker and text positions
/// are scene-absolute. The two frames are preserved exactly across
/// encode/decode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Vec2Def {
    /// Horizontal coordinate in pixels.
    pub x: f64,
    /// Vertical coordinate in pixels.
    pub y: f64,
}

impl Vec2Def {
    /// Construct from components.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Convert into a kurbo point.
    pub fn to_point(self) -> kurbo::Point {
        kurbo::Point::new(self.x, self.y)
    }
}

impl From<kurbo::Point> for Vec2Def {
    fn from(p: kurbo::Point) -> Self {
        Self { x: p.x, y: p.y }
    }
}

impl<'de> Deserialize<'de> for Vec2Def {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Arr([f64; 2]),
            Obj { x: f64, y: f64 },
        }

        match Repr::deserialize(deserializer)? {
            Repr::Arr([x, y]) => Ok(Self { x, y }),
            Repr::Obj { x, y } => Ok(Self { x, y }),
        }
    }
}

/// The shareable unit: one full character + scene + audio creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreationDef {
    /// Semantic compatibility tag; stamped on encode when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Character layer (body, tint color, accessories, face).
    #[serde(default)]
    pub character: CharacterDef,
    /// Scene layer (background, stickers, text bubbles).
    #[serde(default)]
    pub scene: SceneDef,
    /// Audio timeline (looping music, one-shot cues).
    #[serde(default)]
    pub audio: AudioDef,
    /// Creator metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MetadataDef>,
}

impl CreationDef {
    /// Empty creation with defaults; the builder fills it stage by stage.
    pub fn new() -> Self {
        Self {
            version: Some(WIRE_VERSION.to_owned()),
            character: CharacterDef::default(),
            scene: SceneDef::default(),
            audio: AudioDef::default(),
            metadata: None,
        }
    }
}

impl Default for CreationDef {
    fn default() -> Self {
        Self::new()
    }
}

/// Character layer of a creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterDef {
    /// Body asset id. Presence is a validator concern, not a parse concern.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    /// Body tint color as `#RRGGBB`; the neutral default disables tinting.
    #[serde(default = "default_body_color")]
    pub color: String,
    /// Scene-absolute body center; absent means canvas center.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_position: Option<Vec2Def>,
    /// Accessories in draw order, positioned body-center-relative.
    #[serde(default)]
    pub accessories: Vec<PlacementDef>,
    /// Face features drawn above accessories.
    #[serde(default)]
    pub face: FaceDef,
}

impl Default for CharacterDef {
    fn default() -> Self {
        Self {
            body: None,
            color: default_body_color(),
            body_position: None,
            accessories: Vec::new(),
            face: FaceDef::default(),
        }
    }
}

fn default_body_color() -> String {
    NEUTRAL_BODY_COLOR.to_owned()
}

/// Optional eye/mouth assets anchored at the body's head attachment point.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FaceDef {
    /// Eyes asset id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eyes: Option<String>,
    /// Mouth asset id, drawn a fixed offset below the eyes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mouth: Option<String>,
}

/// A placed accessory or sticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacementDef {
    /// Asset id of the placed image.
    pub id: String,
    /// Position; frame depends on the container (see [`Vec2Def`]).
    #[serde(default)]
    pub position: Vec2Def,
    /// Uniform scale, valid range 0.1..=5.0.
    #[serde(default = "default_scale")]
    pub scale: f64,
    /// Rotation in degrees, valid range -360..=360, applied about the item
    /// center before scaling.
    #[serde(default)]
    pub rotation: f64,
}

impl PlacementDef {
    /// Placement at `position` with neutral scale and rotation.
    pub fn at(id: impl Into<String>, position: Vec2Def) -> Self {
        Self {
            id: id.into(),
            position,
            scale: default_scale(),
            rotation: 0.0,
        }
    }
}

fn default_scale() -> f64 {
    1.0
}

/// Scene layer of a creation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneDef {
    /// Background asset id; absent renders the gradient fallback.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    /// Stickers in draw order (array order doubles as z-order).
    #[serde(default)]
    pub stickers: Vec<PlacementDef>,
    /// Text bubbles drawn above everything else.
    #[serde(default)]
    pub texts: Vec<TextDef>,
}

/// Visual treatment of a text item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextStyle {
    /// Rounded speech bubble with a pointer tail.
    #[default]
    Bubble,
    /// Jagged-edged comic burst.
    Comic,
}

/// One text bubble placed in the scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextDef {
    /// Sanitized text content (at most 100 characters after sanitization).
    pub content: String,
    /// Bubble treatment.
    #[serde(default)]
    pub style: TextStyle,
    /// Scene-absolute center of the text block.
    #[serde(default)]
    pub position: Vec2Def,
    /// Fill color as `#RRGGBB`.
    #[serde(default = "default_text_color")]
    pub color: String,
    /// Font size in pixels.
    #[serde(default = "default_font_size")]
    pub font_size: f64,
    /// Bubble background color as `#RRGGBB`.
    #[serde(default = "default_text_background")]
    pub background_color: String,
    /// Stroke color for the outline pass as `#RRGGBB`.
    #[serde(default = "default_text_outline")]
    pub outline_color: String,
}

impl TextDef {
    /// Text item with the builder's default styling.
    pub fn new(content: impl Into<String>, style: TextStyle, position: Vec2Def) -> Self {
        Self {
            content: content.into(),
            style,
            position,
            color: default_text_color(),
            font_size: default_font_size(),
            background_color: default_text_background(),
            outline_color: default_text_outline(),
        }
    }
}

fn default_text_color() -> String {
    "#FFFFFF".to_owned()
}

fn default_font_size() -> f64 {
    60.0
}

fn default_text_background() -> String {
    "#667eea".to_owned()
}

fn default_text_outline() -> String {
    "#333333".to_owned()
}

/// Audio timeline of a creation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AudioDef {
    /// Looping background music.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub music: Option<MusicDef>,
    /// One-shot sound effects.
    #[serde(default)]
    pub sfx: Vec<CueDef>,
    /// At most one voice clip.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice: Option<CueDef>,
}

/// Background music selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MusicDef {
    /// Music asset id.
    pub id: String,
    /// Volume in 0.0..=1.0.
    #[serde(default = "default_music_volume")]
    pub volume: f64,
}

fn default_music_volume() -> f64 {
    0.8
}

/// A one-shot audio cue scheduled at an elapsed playback time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CueDef {
    /// Audio asset id.
    pub id: String,
    /// Scheduled time in seconds from playback start.
    pub time: f64,
    /// Volume in 0.0..=1.0.
    #[serde(default = "default_cue_volume")]
    pub volume: f64,
}

fn default_cue_volume() -> f64 {
    1.0
}

/// Creator metadata attached to a finalized creation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetadataDef {
    /// Creation timestamp in milliseconds since the Unix epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<i64>,
    /// Display name of the creator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator: Option<String>,
}
