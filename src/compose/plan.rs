use kurbo::Point;

use crate::catalog::manifest::CatalogManifest;
use crate::foundation::core::Canvas;
use crate::scene::model::{CreationDef, TextStyle};

/// Vertical offset of the mouth below the eye anchor, in pixels.
pub const MOUTH_OFFSET_PX: f64 = 30.0;

/// Gradient fallback endpoints when no background is set.
pub const FALLBACK_GRADIENT: (&str, &str) = ("#667eea", "#764ba2");

/// One deterministic draw operation. Executing a plan's operations in order
/// reproduces the scene exactly.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    /// Background image stretched to the full canvas.
    Background {
        /// Background asset id.
        asset: String,
    },
    /// Diagonal linear-gradient backdrop used when no background is set.
    GradientBackdrop {
        /// Gradient start color (`#RRGGBB`).
        from: String,
        /// Gradient end color (`#RRGGBB`).
        to: String,
    },
    /// Character body centered at `center`, optionally color-tinted.
    Body {
        /// Body asset id.
        asset: String,
        /// Scene-absolute body center.
        center: Point,
        /// Tint color when the body is colorizable and non-neutral.
        tint: Option<[u8; 3]>,
    },
    /// A placed sprite (accessory or sticker) with rotation applied about its
    /// own center, then scale, then translation to `center`.
    Sprite {
        /// Asset id of the sprite image.
        asset: String,
        /// Scene-absolute center (accessories already resolved from their
        /// body-relative storage frame).
        center: Point,
        /// Uniform scale.
        scale: f64,
        /// Rotation in degrees.
        rotation: f64,
    },
    /// A face feature centered at `center` (unscaled, unrotated).
    Face {
        /// Face asset id.
        asset: String,
        /// Scene-absolute center.
        center: Point,
    },
    /// A text bubble: background shape, then glyph outline pass, then fill.
    Text {
        /// Sanitized text content.
        content: String,
        /// Bubble treatment.
        style: TextStyle,
        /// Scene-absolute center of the text block.
        center: Point,
        /// Glyph fill color.
        color: String,
        /// Font size in pixels.
        font_size: f64,
        /// Bubble background color.
        background_color: String,
        /// Glyph outline color.
        outline_color: String,
    },
}

/// Ordered draw plan for one creation on one canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenePlan {
    /// Canvas the plan targets.
    pub canvas: Canvas,
    /// Draw operations, bottom layer first.
    pub ops: Vec<DrawOp>,
}

/// Resolved scene-absolute body center for a creation.
pub fn body_center(def: &CreationDef, canvas: Canvas) -> Point {
    def.character
        .body_position
        .map(|p| p.to_point())
        .unwrap_or_else(|| canvas.center())
}

/// The body's head attachment offset, when the catalog declares one.
fn head_offset(def: &CreationDef, catalog: &CatalogManifest) -> Option<kurbo::Vec2> {
    def.character
        .body
        .as_deref()
        .and_then(|id| catalog.find_asset(id))
        .and_then(|meta| meta.attachment_points.as_ref())
        .and_then(|points| points.head)
        .map(|p| p.to_point().to_vec2())
}

/// Resolved scene-absolute eye anchor: body center plus the body's head
/// attachment point when the catalog provides one, else the canvas center.
pub fn face_anchor(def: &CreationDef, catalog: &CatalogManifest, canvas: Canvas) -> Point {
    match head_offset(def, catalog) {
        Some(offset) => body_center(def, canvas) + offset,
        None => canvas.center(),
    }
}

/// Character layers (tinted body, accessories, face) around `center`.
///
/// Shared by the full-scene plan and the character-only preview so both
/// views compose the character identically.
fn push_character_ops(
    def: &CreationDef,
    catalog: &CatalogManifest,
    center: Point,
    anchor: Point,
    ops: &mut Vec<DrawOp>,
) {
    let Some(body) = def.character.body.as_deref() else {
        return;
    };

    let colorizable = catalog
        .find_asset(body)
        .map(|meta| meta.colorizable)
        .unwrap_or(false);

    let tint = if crate::compose::tint::needs_tint(colorizable, &def.character.color) {
        crate::compose::tint::parse_hex_rgb(&def.character.color).ok()
    } else {
        None
    };

    ops.push(DrawOp::Body {
        asset: body.to_owned(),
        center,
        tint,
    });

    // Accessories, body-relative offsets resolved to scene space.
    for acc in &def.character.accessories {
        ops.push(DrawOp::Sprite {
            asset: acc.id.clone(),
            center: center + acc.position.to_point().to_vec2(),
            scale: acc.scale,
            rotation: acc.rotation,
        });
    }

    // Face features: eyes on the head anchor, mouth below.
    if let Some(eyes) = def.character.face.eyes.as_deref() {
        ops.push(DrawOp::Face {
            asset: eyes.to_owned(),
            center: anchor,
        });
    }
    if let Some(mouth) = def.character.face.mouth.as_deref() {
        ops.push(DrawOp::Face {
            asset: mouth.to_owned(),
            center: anchor + kurbo::Vec2::new(0.0, MOUTH_OFFSET_PX),
        });
    }
}

/// Map a creation to its deterministic draw plan.
///
/// Layer order is fixed: background (or gradient fallback), body with
/// optional tint, accessories in array order, eyes, mouth, stickers in array
/// order, then texts. Unresolvable catalog metadata never aborts composition;
/// it only disables the features that depend on it (tint, face anchoring).
pub fn compose_scene(def: &CreationDef, catalog: &CatalogManifest, canvas: Canvas) -> ScenePlan {
    let mut ops = Vec::new();

    // 1. Background, stretched, or the gradient fallback.
    match def.scene.background.as_deref() {
        Some(bg) if !bg.is_empty() => ops.push(DrawOp::Background {
            asset: bg.to_owned(),
        }),
        _ => ops.push(DrawOp::GradientBackdrop {
            from: FALLBACK_GRADIENT.0.to_owned(),
            to: FALLBACK_GRADIENT.1.to_owned(),
        }),
    }

    // 2..4. Character stack.
    let center = body_center(def, canvas);
    let anchor = face_anchor(def, catalog, canvas);
    push_character_ops(def, catalog, center, anchor, &mut ops);

    // 5. Stickers in array order; array order doubles as z-order.
    for sticker in &def.scene.stickers {
        ops.push(DrawOp::Sprite {
            asset: sticker.id.clone(),
            center: sticker.position.to_point(),
            scale: sticker.scale,
            rotation: sticker.rotation,
        });
    }

    // 6. Text bubbles topmost.
    for text in &def.scene.texts {
        ops.push(DrawOp::Text {
            content: text.content.clone(),
            style: text.style,
            center: text.position.to_point(),
            color: text.color.clone(),
            font_size: text.font_size,
            background_color: text.background_color.clone(),
            outline_color: text.outline_color.clone(),
        });
    }

    ScenePlan { canvas, ops }
}

/// Character-only preview plan for the builder's first stage.
///
/// Same character layer stack as [`compose_scene`] on a transparent backdrop,
/// with the body pinned to the preview canvas center.
pub fn compose_character(
    def: &CreationDef,
    catalog: &CatalogManifest,
    canvas: Canvas,
) -> ScenePlan {
    let center = canvas.center();
    let anchor = match head_offset(def, catalog) {
        Some(offset) => center + offset,
        None => center,
    };

    let mut ops = Vec::new();
    push_character_ops(def, catalog, center, anchor, &mut ops);
    ScenePlan { canvas, ops }
}
