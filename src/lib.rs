//! Toonlink is an engine for assembling cartoon "character + scene + audio"
//! creations from a fixed asset catalog and sharing them as compact URL-safe
//! tokens that fully reconstruct the creation in a viewer.
//!
//! The public API is token-oriented:
//!
//! - Build or decode a [`Creation`] (a validated [`CreationDef`] record)
//! - Encode it with a [`TokenCodec`] into a `/b/{token}` share URL
//! - On the viewing side, decode, run [`validate_all`], preload assets with
//!   an [`AssetLibrary`], map the record to a deterministic [`ScenePlan`],
//!   raster it with a [`SceneRenderer`], and drive audio with a
//!   [`TimelinePlayer`]
#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub(crate) mod catalog;
pub(crate) mod codec;
pub(crate) mod compose;
pub(crate) mod foundation;
pub(crate) mod render;
pub(crate) mod scene;
pub(crate) mod schema;
pub(crate) mod timeline;

pub use crate::foundation::core::{Affine, BezPath, Canvas, Point, Rect, Rgba8Premul, Vec2};
pub use crate::foundation::error::{ToonlinkError, ToonlinkResult};

pub use crate::scene::creation::{Creation, FaceFeature, LayerKind, LayerShift};
pub use crate::scene::model::{
    AudioDef, CharacterDef, CreationDef, CueDef, FaceDef, MetadataDef, MusicDef,
    NEUTRAL_BODY_COLOR, PlacementDef, SceneDef, TextDef, TextStyle, Vec2Def, WIRE_VERSION,
};
pub use crate::scene::sanitize::{MAX_TEXT_LEN, sanitize_text};

pub use crate::codec::token::{
    Compressor, MAX_TOKEN_LEN, TokenCodec, TokenInfo, token_from_path, token_from_query,
};

pub use crate::schema::validate::{
    DEFAULT_MAX_CUE_SECS, ROTATION_RANGE, SCALE_RANGE, ValidationOptions, ValidationReport,
    check_asset_refs, check_audio_timing, check_colors, check_positions, check_ranges,
    check_structure, collect_asset_ids, is_hex_color, validate_all,
};

pub use crate::catalog::library::{
    AssetLibrary, AssetSource, AudioHandle, FsAssetSource, ImageAsset, LibraryStats, PhaseStats,
    PreloadPhase, PreloadProgress, PreloadStats, RetryPolicy,
};
pub use crate::catalog::manifest::{AssetCategory, AssetMeta, AttachmentPoints, CatalogManifest};

pub use crate::compose::hit::{Hit, SizeLookup, hit_test};
pub use crate::compose::plan::{
    DrawOp, FALLBACK_GRADIENT, MOUTH_OFFSET_PX, ScenePlan, body_center, compose_character,
    compose_scene, face_anchor,
};
pub use crate::compose::tint::{needs_tint, parse_hex_rgb, tint_multiply};

pub use crate::render::canvas::FrameRgba;
pub use crate::render::scene::{ImageSource, SceneRenderer};

pub use crate::timeline::player::{
    AudioSink, CueKind, DEFAULT_DURATION_SECS, OneShotCue, PlaybackState, Tick, TimelinePlayer,
};
