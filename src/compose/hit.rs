use kurbo::Point;

use crate::compose::plan::body_center;
use crate::foundation::core::Canvas;
use crate::scene::model::{CreationDef, PlacementDef, TextDef};

/// Per-character width factor for the rough text extent estimate.
const TEXT_WIDTH_FACTOR: f64 = 0.6;

/// Line-height factor for the rough text extent estimate.
const TEXT_HEIGHT_FACTOR: f64 = 1.5;

/// What a probe point landed on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Hit {
    /// A sticker, by index into `scene.stickers`.
    Sticker(usize),
    /// A text item, by index into `scene.texts`.
    Text(usize),
    /// An accessory, by index into `character.accessories`.
    Accessory(usize),
    /// The character body itself.
    Body,
}

/// Pixel dimensions of loaded item images, supplied by whoever holds the
/// decoded assets. The composition model never assumes an id resolves.
pub trait SizeLookup {
    /// Natural (unscaled) pixel size of the image behind `id`.
    fn size_of(&self, id: &str) -> Option<(f64, f64)>;
}

impl SizeLookup for std::collections::HashMap<String, (f64, f64)> {
    fn size_of(&self, id: &str) -> Option<(f64, f64)> {
        self.get(id).copied()
    }
}

/// Find the topmost item under `point` (scene-absolute).
///
/// Probe order mirrors draw order, topmost first: stickers, then texts, then
/// accessories, then the body. Within a collection, later array entries sit
/// on top and are probed first. Items whose image size is unknown are
/// treated as unhittable.
pub fn hit_test(
    def: &CreationDef,
    sizes: &dyn SizeLookup,
    canvas: Canvas,
    point: Point,
) -> Option<Hit> {
    for (i, sticker) in def.scene.stickers.iter().enumerate().rev() {
        if placement_contains(sticker, sticker.position.to_point(), sizes, point) {
            return Some(Hit::Sticker(i));
        }
    }

    for (i, text) in def.scene.texts.iter().enumerate().rev() {
        if text_contains(text, point) {
            return Some(Hit::Text(i));
        }
    }

    let center = body_center(def, canvas);

    // Accessory storage is body-relative; the probe point is compared against
    // each accessory's resolved absolute center, consistent with storage.
    for (i, acc) in def.character.accessories.iter().enumerate().rev() {
        let abs = center + acc.position.to_point().to_vec2();
        if placement_contains(acc, abs, sizes, point) {
            return Some(Hit::Accessory(i));
        }
    }

    if let Some(body) = def.character.body.as_deref()
        && let Some((w, h)) = sizes.size_of(body)
        && aabb_contains(center, w / 2.0, h / 2.0, point)
    {
        return Some(Hit::Body);
    }

    None
}

fn placement_contains(
    item: &PlacementDef,
    center: Point,
    sizes: &dyn SizeLookup,
    point: Point,
) -> bool {
    let Some((w, h)) = sizes.size_of(&item.id) else {
        return false;
    };
    aabb_contains(center, w * item.scale / 2.0, h * item.scale / 2.0, point)
}

fn text_contains(text: &TextDef, point: Point) -> bool {
    let w = text.content.chars().count() as f64 * text.font_size * TEXT_WIDTH_FACTOR;
    let h = text.font_size * TEXT_HEIGHT_FACTOR;
    aabb_contains(text.position.to_point(), w / 2.0, h / 2.0, point)
}

fn aabb_contains(center: Point, half_w: f64, half_h: f64, point: Point) -> bool {
    point.x >= center.x - half_w
        && point.x <= center.x + half_w
        && point.y >= center.y - half_h
        && point.y <= center.y + half_h
}
