use std::collections::HashMap;

use fontdue::{Font, FontSettings};
use image::RgbaImage;
use kurbo::{BezPath, Point, Rect, RoundedRect, Vec2};

use crate::compose::plan::{DrawOp, ScenePlan};
use crate::compose::tint::{parse_hex_rgb, tint_multiply};
use crate::foundation::core::Rgba8Premul;
use crate::foundation::error::{ToonlinkError, ToonlinkResult};
use crate::render::canvas::{FrameRgba, Surface};
use crate::scene::model::TextStyle;

/// Inner padding of the bubble background around the text block.
const BUBBLE_PADDING: f64 = 30.0;

/// Corner radius of the bubble background.
const BUBBLE_RADIUS: f64 = 30.0;

/// Inner padding of the comic burst around the text block.
const COMIC_PADDING: f64 = 25.0;

/// Horizontal reach of the comic burst side spikes.
const COMIC_SPIKE: f64 = 10.0;

/// Width of the comic burst outline ring.
const COMIC_OUTLINE: f64 = 4.0;

/// Half-width of the glyph outline stroke (canvas lineWidth 6).
const GLYPH_OUTLINE: i64 = 3;

/// Provider of decoded images for the renderer.
///
/// The renderer never assumes an id resolves; a missing image skips that
/// layer with a warning (the explicit placeholder policy) instead of
/// aborting the frame.
pub trait ImageSource {
    /// Decoded straight-alpha image behind `id`, if loaded.
    fn image(&self, id: &str) -> Option<&RgbaImage>;
}

impl ImageSource for HashMap<String, RgbaImage> {
    fn image(&self, id: &str) -> Option<&RgbaImage> {
        self.get(id)
    }
}

/// Executes scene plans into premultiplied RGBA8 frames.
///
/// Renders are idempotent snapshots of the plan they are given, so the
/// cooperative one-in-flight guard may drop a re-entrant request: the caller
/// either schedules a follow-up render or accepts the dropped frame.
pub struct SceneRenderer {
    font: Option<Font>,
    rendering: bool,
}

impl SceneRenderer {
    /// Renderer without a font; text ops draw their bubble only.
    pub fn new() -> Self {
        Self {
            font: None,
            rendering: false,
        }
    }

    /// Configure the font used for glyph rasterization.
    pub fn set_font(&mut self, font_bytes: &[u8]) -> ToonlinkResult<()> {
        let font = Font::from_bytes(font_bytes, FontSettings::default())
            .map_err(|e| ToonlinkError::validation(format!("load font: {e}")))?;
        self.font = Some(font);
        Ok(())
    }

    /// Execute a plan. Returns `Ok(None)` when a render is already in
    /// flight on this renderer (the frame is dropped, not queued).
    pub fn render(
        &mut self,
        plan: &ScenePlan,
        images: &dyn ImageSource,
    ) -> ToonlinkResult<Option<FrameRgba>> {
        if self.rendering {
            tracing::debug!("render already in flight, dropping frame");
            return Ok(None);
        }

        self.rendering = true;
        let result = self.execute(plan, images);
        self.rendering = false;
        result.map(Some)
    }

    fn execute(&self, plan: &ScenePlan, images: &dyn ImageSource) -> ToonlinkResult<FrameRgba> {
        let mut surface = Surface::new(plan.canvas);

        for op in &plan.ops {
            match op {
                DrawOp::Background { asset } => match images.image(asset) {
                    Some(img) => surface.blit_stretched(img),
                    None => {
                        tracing::warn!(asset = %asset, "background image missing, using gradient");
                        fill_fallback_gradient(&mut surface);
                    }
                },
                DrawOp::GradientBackdrop { from, to } => {
                    let from = parse_hex_rgb(from).unwrap_or([0x66, 0x7e, 0xea]);
                    let to = parse_hex_rgb(to).unwrap_or([0x76, 0x4b, 0xa2]);
                    surface.fill_gradient(from, to);
                }
                DrawOp::Body {
                    asset,
                    center,
                    tint,
                } => match images.image(asset) {
                    Some(img) => match tint {
                        Some(rgb) => {
                            let tinted = tint_multiply(img, *rgb);
                            surface.blit_sprite(&tinted, *center, 1.0, 0.0);
                        }
                        None => surface.blit_sprite(img, *center, 1.0, 0.0),
                    },
                    None => tracing::warn!(asset = %asset, "body image missing, skipping layer"),
                },
                DrawOp::Sprite {
                    asset,
                    center,
                    scale,
                    rotation,
                } => match images.image(asset) {
                    Some(img) => surface.blit_sprite(img, *center, *scale, *rotation),
                    None => tracing::warn!(asset = %asset, "sprite image missing, skipping layer"),
                },
                DrawOp::Face { asset, center } => match images.image(asset) {
                    Some(img) => surface.blit_sprite(img, *center, 1.0, 0.0),
                    None => tracing::warn!(asset = %asset, "face image missing, skipping layer"),
                },
                DrawOp::Text {
                    content,
                    style,
                    center,
                    color,
                    font_size,
                    background_color,
                    outline_color,
                } => {
                    self.draw_text(
                        &mut surface,
                        content,
                        *style,
                        *center,
                        color,
                        *font_size,
                        background_color,
                        outline_color,
                    );
                }
            }
        }

        Ok(surface.into_frame())
    }

    #[allow(clippy::too_many_arguments)]
    fn draw_text(
        &self,
        surface: &mut Surface,
        content: &str,
        style: TextStyle,
        center: Point,
        color: &str,
        font_size: f64,
        background_color: &str,
        outline_color: &str,
    ) {
        let metrics = self.measure(content, font_size);

        // Background shape first, then outline pass, then fill pass.
        let block_h = font_size * 1.2;
        match style {
            TextStyle::Bubble => {
                if let Ok(rgb) = parse_hex_rgb(background_color) {
                    draw_bubble(surface, center, metrics.width, block_h, rgb);
                } else {
                    tracing::warn!(background_color = %background_color, "bad bubble color, skipping shape");
                }
            }
            TextStyle::Comic => {
                if let Ok(rgb) = parse_hex_rgb(background_color) {
                    draw_comic_burst(surface, center, metrics.width, block_h, rgb);
                } else {
                    tracing::warn!(background_color = %background_color, "bad burst color, skipping shape");
                }
            }
        }

        let Some(font) = self.font.as_ref() else {
            tracing::debug!("no font configured, skipping glyph passes");
            return;
        };

        let origin_x = (center.x - metrics.width / 2.0).round() as i64;
        let origin_y = (center.y - metrics.block_height / 2.0).round() as i64;

        if let Ok(rgb) = parse_hex_rgb(outline_color) {
            for dy in [-GLYPH_OUTLINE, 0, GLYPH_OUTLINE] {
                for dx in [-GLYPH_OUTLINE, 0, GLYPH_OUTLINE] {
                    if dx == 0 && dy == 0 {
                        continue;
                    }
                    stamp_glyphs(
                        surface,
                        font,
                        content,
                        font_size,
                        origin_x + dx,
                        origin_y + dy,
                        metrics.ascent,
                        rgb,
                    );
                }
            }
        }

        if let Ok(rgb) = parse_hex_rgb(color) {
            stamp_glyphs(
                surface,
                font,
                content,
                font_size,
                origin_x,
                origin_y,
                metrics.ascent,
                rgb,
            );
        }
    }

    fn measure(&self, content: &str, font_size: f64) -> TextMetrics {
        match self.font.as_ref() {
            Some(font) => {
                let mut width = 0.0f64;
                let mut ascent = 0i64;
                let mut descent = 0i64;
                for ch in content.chars() {
                    let (m, _) = font.rasterize(ch, font_size as f32);
                    ascent = ascent.max(m.height as i64 + i64::from(m.ymin));
                    descent = descent.max(i64::from(-m.ymin));
                    width += f64::from(m.advance_width);
                }
                TextMetrics {
                    width: width.max(1.0),
                    block_height: (ascent + descent).max(1) as f64,
                    ascent,
                }
            }
            // No font: the same rough estimate hit-testing uses.
            None => TextMetrics {
                width: (content.chars().count() as f64 * font_size * 0.6).max(1.0),
                block_height: font_size,
                ascent: font_size as i64,
            },
        }
    }
}

impl Default for SceneRenderer {
    fn default() -> Self {
        Self::new()
    }
}

struct TextMetrics {
    width: f64,
    block_height: f64,
    ascent: i64,
}

fn fill_fallback_gradient(surface: &mut Surface) {
    surface.fill_gradient([0x66, 0x7e, 0xea], [0x76, 0x4b, 0xa2]);
}

/// Rounded speech bubble with a pointer tail below.
fn draw_bubble(surface: &mut Surface, center: Point, text_w: f64, text_h: f64, rgb: [u8; 3]) {
    let color = Rgba8Premul::opaque(rgb[0], rgb[1], rgb[2]);
    let half_w = text_w / 2.0 + BUBBLE_PADDING;
    let half_h = text_h / 2.0 + BUBBLE_PADDING;

    let rect = Rect::new(
        center.x - half_w,
        center.y - half_h,
        center.x + half_w,
        center.y + half_h,
    );
    surface.fill_shape(&RoundedRect::from_rect(rect, BUBBLE_RADIUS), color);

    let mut tail = BezPath::new();
    tail.move_to(center + Vec2::new(0.0, half_h));
    tail.line_to(center + Vec2::new(-20.0, half_h + 30.0));
    tail.line_to(center + Vec2::new(20.0, half_h));
    tail.close_path();
    surface.fill_shape(&tail, color);
}

/// Jagged comic burst with side spikes and a dark outline ring.
fn draw_comic_burst(surface: &mut Surface, center: Point, text_w: f64, text_h: f64, rgb: [u8; 3]) {
    let burst = |pad: f64, spike: f64| -> BezPath {
        let half_w = text_w / 2.0 + pad;
        let half_h = text_h / 2.0 + pad;
        let mut p = BezPath::new();
        p.move_to(center + Vec2::new(-half_w, -half_h));
        p.line_to(center + Vec2::new(half_w, -half_h));
        p.line_to(center + Vec2::new(half_w + spike, 0.0));
        p.line_to(center + Vec2::new(half_w, half_h));
        p.line_to(center + Vec2::new(-half_w, half_h));
        p.line_to(center + Vec2::new(-half_w - spike, 0.0));
        p.close_path();
        p
    };

    // Outline drawn as a slightly larger dark burst underneath.
    surface.fill_shape(
        &burst(COMIC_PADDING + COMIC_OUTLINE, COMIC_SPIKE + COMIC_OUTLINE),
        Rgba8Premul::opaque(0, 0, 0),
    );
    surface.fill_shape(
        &burst(COMIC_PADDING, COMIC_SPIKE),
        Rgba8Premul::opaque(rgb[0], rgb[1], rgb[2]),
    );
}

#[allow(clippy::too_many_arguments)]
fn stamp_glyphs(
    surface: &mut Surface,
    font: &Font,
    content: &str,
    font_size: f64,
    origin_x: i64,
    origin_y: i64,
    ascent: i64,
    rgb: [u8; 3],
) {
    let mut cursor = 0.0f64;
    for ch in content.chars() {
        let (metrics, bitmap) = font.rasterize(ch, font_size as f32);
        let glyph_x = origin_x + cursor.round() as i64 + i64::from(metrics.xmin);
        let glyph_y = origin_y + ascent - (metrics.height as i64 + i64::from(metrics.ymin));
        surface.stamp_mask(
            &bitmap,
            metrics.width,
            metrics.height,
            glyph_x,
            glyph_y,
            rgb,
        );
        cursor += f64::from(metrics.advance_width);
    }
}
