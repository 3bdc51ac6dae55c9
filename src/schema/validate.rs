use kurbo::Point;

use crate::catalog::manifest::CatalogManifest;
use crate::foundation::core::Canvas;
use crate::foundation::error::{ToonlinkError, ToonlinkResult};
use crate::scene::model::CreationDef;

/// Valid uniform-scale range for placed items.
pub const SCALE_RANGE: (f64, f64) = (0.1, 5.0);

/// Valid rotation range in degrees for placed items.
pub const ROTATION_RANGE: (f64, f64) = (-360.0, 360.0);

/// Default upper bound for one-shot cue times, in seconds.
pub const DEFAULT_MAX_CUE_SECS: f64 = 30.0;

/// Knobs for the validation checks.
#[derive(Clone, Copy, Debug)]
pub struct ValidationOptions {
    /// Canvas bounds that placed items must stay within.
    pub canvas: Canvas,
    /// Upper bound for sfx/voice scheduled times, in seconds.
    pub max_cue_secs: f64,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            canvas: Canvas::default(),
            max_cue_secs: DEFAULT_MAX_CUE_SECS,
        }
    }
}

/// Aggregated validation outcome; collected, never fail-fast, so a UI can
/// show every problem at once.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidationReport {
    /// Failed checks, labeled by check kind.
    pub errors: Vec<String>,
    /// Non-fatal observations (e.g. referential check skipped).
    pub warnings: Vec<String>,
}

impl ValidationReport {
    /// `true` when no check failed.
    pub fn valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Run every check against `def` and aggregate the outcome.
///
/// The referential check runs only when a catalog is supplied; its absence is
/// reported as a warning rather than silently skipped.
pub fn validate_all(
    def: &CreationDef,
    catalog: Option<&CatalogManifest>,
    opts: &ValidationOptions,
) -> ValidationReport {
    fn run(errors: &mut Vec<String>, label: &str, res: ToonlinkResult<()>) {
        match res {
            Ok(()) => {}
            // Unwrap the taxonomy prefix; the label already names the check.
            Err(ToonlinkError::Validation(msg)) => errors.push(format!("{label}: {msg}")),
            Err(e) => errors.push(format!("{label}: {e}")),
        }
    }

    let mut report = ValidationReport::default();

    run(&mut report.errors, "structure", check_structure(def));
    match catalog {
        Some(catalog) => run(&mut report.errors, "assets", check_asset_refs(def, catalog)),
        None => report
            .warnings
            .push("catalog not provided, skipping asset id validation".to_owned()),
    }
    run(&mut report.errors, "positions", check_positions(def, opts.canvas));
    run(
        &mut report.errors,
        "audio timing",
        check_audio_timing(def, opts.max_cue_secs),
    );
    run(&mut report.errors, "ranges", check_ranges(def));
    run(&mut report.errors, "colors", check_colors(def));

    report
}

/// Structural check: a renderable creation needs a body and a background.
pub fn check_structure(def: &CreationDef) -> ToonlinkResult<()> {
    if def.character.body.as_deref().is_none_or(str::is_empty) {
        return Err(ToonlinkError::validation("missing character body"));
    }
    if def.scene.background.as_deref().is_none_or(str::is_empty) {
        return Err(ToonlinkError::validation("missing scene background"));
    }
    Ok(())
}

/// Every asset id referenced anywhere in `def`, in collection order.
pub fn collect_asset_ids(def: &CreationDef) -> Vec<&str> {
    let mut ids = Vec::new();

    if let Some(body) = def.character.body.as_deref() {
        ids.push(body);
    }
    ids.extend(def.character.accessories.iter().map(|a| a.id.as_str()));
    if let Some(eyes) = def.character.face.eyes.as_deref() {
        ids.push(eyes);
    }
    if let Some(mouth) = def.character.face.mouth.as_deref() {
        ids.push(mouth);
    }
    if let Some(bg) = def.scene.background.as_deref() {
        ids.push(bg);
    }
    ids.extend(def.scene.stickers.iter().map(|s| s.id.as_str()));
    if let Some(music) = def.audio.music.as_ref() {
        ids.push(&music.id);
    }
    ids.extend(def.audio.sfx.iter().map(|s| s.id.as_str()));
    if let Some(voice) = def.audio.voice.as_ref() {
        ids.push(&voice.id);
    }

    ids.retain(|id| !id.is_empty());
    ids
}

/// Referential check: every referenced id must resolve in the catalog.
///
/// All unresolved ids are reported together, not just the first.
pub fn check_asset_refs(def: &CreationDef, catalog: &CatalogManifest) -> ToonlinkResult<()> {
    let missing: Vec<&str> = collect_asset_ids(def)
        .into_iter()
        .filter(|id| !catalog.contains(id))
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ToonlinkError::validation(format!(
            "unknown asset ids: {}",
            missing.join(", ")
        )))
    }
}

/// Positional check: resolved absolute coordinates of every placed item must
/// stay within the canvas.
///
/// Accessory positions are stored body-center-relative, so they are resolved
/// against the body center (canvas center when unset) before the bounds test.
pub fn check_positions(def: &CreationDef, canvas: Canvas) -> ToonlinkResult<()> {
    let body_center = def
        .character
        .body_position
        .map(|p| p.to_point())
        .unwrap_or_else(|| canvas.center());

    let mut check = |label: &str, index: usize, p: Point| -> ToonlinkResult<()> {
        if canvas.contains(p) {
            Ok(())
        } else {
            Err(ToonlinkError::validation(format!(
                "{label} {index} out of bounds at ({}, {}), canvas {}x{}",
                p.x, p.y, canvas.width, canvas.height
            )))
        }
    };

    for (i, acc) in def.character.accessories.iter().enumerate() {
        check(
            "accessory",
            i,
            body_center + acc.position.to_point().to_vec2(),
        )?;
    }
    for (i, sticker) in def.scene.stickers.iter().enumerate() {
        check("sticker", i, sticker.position.to_point())?;
    }
    for (i, text) in def.scene.texts.iter().enumerate() {
        check("text", i, text.position.to_point())?;
    }

    Ok(())
}

/// Audio timing check: every cue time must be finite and within
/// `[0, max_secs]`.
pub fn check_audio_timing(def: &CreationDef, max_secs: f64) -> ToonlinkResult<()> {
    for (i, sfx) in def.audio.sfx.iter().enumerate() {
        if !sfx.time.is_finite() {
            return Err(ToonlinkError::validation(format!(
                "sfx {i}: time must be a finite number"
            )));
        }
        if sfx.time < 0.0 || sfx.time > max_secs {
            return Err(ToonlinkError::validation(format!(
                "sfx {i}: time {}s outside 0-{max_secs}s",
                sfx.time
            )));
        }
    }

    if let Some(voice) = def.audio.voice.as_ref()
        && (!voice.time.is_finite() || voice.time < 0.0 || voice.time > max_secs)
    {
        return Err(ToonlinkError::validation(format!(
            "voice time {}s outside 0-{max_secs}s",
            voice.time
        )));
    }

    Ok(())
}

/// Numeric-range check: scale and rotation for placed items, volume for every
/// audio entry.
pub fn check_ranges(def: &CreationDef) -> ToonlinkResult<()> {
    let placed = def
        .character
        .accessories
        .iter()
        .enumerate()
        .map(|(i, p)| ("accessory", i, p))
        .chain(
            def.scene
                .stickers
                .iter()
                .enumerate()
                .map(|(i, p)| ("sticker", i, p)),
        );

    for (label, i, item) in placed {
        if item.scale < SCALE_RANGE.0 || item.scale > SCALE_RANGE.1 {
            return Err(ToonlinkError::validation(format!(
                "{label} {i}: scale {} outside {}-{}",
                item.scale, SCALE_RANGE.0, SCALE_RANGE.1
            )));
        }
        if item.rotation < ROTATION_RANGE.0 || item.rotation > ROTATION_RANGE.1 {
            return Err(ToonlinkError::validation(format!(
                "{label} {i}: rotation {} outside {}..{}",
                item.rotation, ROTATION_RANGE.0, ROTATION_RANGE.1
            )));
        }
    }

    let volumes = def
        .audio
        .music
        .as_ref()
        .map(|m| ("music", 0, m.volume))
        .into_iter()
        .chain(def.audio.voice.as_ref().map(|v| ("voice", 0, v.volume)))
        .chain(
            def.audio
                .sfx
                .iter()
                .enumerate()
                .map(|(i, s)| ("sfx", i, s.volume)),
        );

    for (label, i, volume) in volumes {
        if !(0.0..=1.0).contains(&volume) {
            return Err(ToonlinkError::validation(format!(
                "{label} {i}: volume {volume} outside 0-1"
            )));
        }
    }

    Ok(())
}

/// Color check: every hex color field must be 6-digit `#RRGGBB` syntax.
pub fn check_colors(def: &CreationDef) -> ToonlinkResult<()> {
    let mut check = |label: String, value: &str| -> ToonlinkResult<()> {
        if is_hex_color(value) {
            Ok(())
        } else {
            Err(ToonlinkError::validation(format!(
                "{label}: invalid color {value:?}"
            )))
        }
    };

    check("character color".to_owned(), &def.character.color)?;
    for (i, text) in def.scene.texts.iter().enumerate() {
        check(format!("text {i} color"), &text.color)?;
        check(format!("text {i} outline"), &text.outline_color)?;
        check(format!("text {i} background"), &text.background_color)?;
    }

    Ok(())
}

/// `true` when `value` matches `#RRGGBB` (case-insensitive hex digits).
pub fn is_hex_color(value: &str) -> bool {
    let Some(digits) = value.strip_prefix('#') else {
        return false;
    };
    digits.len() == 6 && digits.bytes().all(|b| b.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::manifest::test_fixtures::sample_manifest;
    use crate::scene::model::{CueDef, MusicDef, PlacementDef, TextDef, Vec2Def};

    fn valid_def() -> CreationDef {
        let mut def = CreationDef::new();
        def.character.body = Some("char-body-cat".to_owned());
        def.character.color = "#4A90E2".to_owned();
        def.scene.background = Some("bg-space".to_owned());
        def.audio.music = Some(MusicDef {
            id: "music-chill-lofi-01".to_owned(),
            volume: 0.7,
        });
        def
    }

    fn text_at(x: f64, y: f64) -> TextDef {
        serde_json::from_value(serde_json::json!({
            "content": "hi",
            "position": {"x": x, "y": y}
        }))
        .unwrap()
    }

    #[test]
    fn valid_record_passes_everything() {
        let report = validate_all(
            &valid_def(),
            Some(&sample_manifest()),
            &ValidationOptions::default(),
        );
        assert!(report.valid(), "errors: {:?}", report.errors);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn structure_requires_body_and_background() {
        let mut def = valid_def();
        def.character.body = None;
        assert!(check_structure(&def).is_err());

        let mut def = valid_def();
        def.scene.background = Some(String::new());
        assert!(check_structure(&def).is_err());
    }

    #[test]
    fn referential_error_lists_every_missing_id() {
        let mut def = valid_def();
        def.character.body = Some("char-body-unicorn".to_owned());
        def.scene.stickers.push(PlacementDef::at(
            "sticker-ghost",
            Vec2Def::new(100.0, 100.0),
        ));

        let err = check_asset_refs(&def, &sample_manifest()).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("char-body-unicorn"));
        assert!(msg.contains("sticker-ghost"));
    }

    #[test]
    fn scale_bounds_are_inclusive() {
        for (scale, ok) in [(5.1, false), (5.0, true), (0.1, true), (0.09, false)] {
            let mut def = valid_def();
            let mut acc = PlacementDef::at("acc-head-crown", Vec2Def::new(0.0, -120.0));
            acc.scale = scale;
            def.character.accessories.push(acc);
            assert_eq!(check_ranges(&def).is_ok(), ok, "scale {scale}");
        }
    }

    #[test]
    fn rotation_and_volume_bounds() {
        let mut def = valid_def();
        let mut sticker = PlacementDef::at("sticker-fire", Vec2Def::new(10.0, 10.0));
        sticker.rotation = 400.0;
        def.scene.stickers.push(sticker);
        assert!(check_ranges(&def).is_err());

        let mut def = valid_def();
        def.audio.music.as_mut().unwrap().volume = 1.2;
        assert!(check_ranges(&def).is_err());
    }

    #[test]
    fn cue_timing_names_index_and_value() {
        let mut def = valid_def();
        def.audio.sfx.push(CueDef {
            id: "sfx-honk".to_owned(),
            time: 45.0,
            volume: 1.0,
        });

        let err = check_audio_timing(&def, DEFAULT_MAX_CUE_SECS).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("sfx 0"));
        assert!(msg.contains("45"));
    }

    #[test]
    fn boundary_cue_times_pass() {
        let mut def = valid_def();
        def.audio.sfx.push(CueDef {
            id: "sfx-honk".to_owned(),
            time: 0.0,
            volume: 1.0,
        });
        def.audio.voice = Some(CueDef {
            id: "voice-hello".to_owned(),
            time: 30.0,
            volume: 1.0,
        });
        assert!(check_audio_timing(&def, DEFAULT_MAX_CUE_SECS).is_ok());
    }

    #[test]
    fn sticker_out_of_bounds_is_reported_with_coordinates() {
        let mut def = valid_def();
        def.scene
            .stickers
            .push(PlacementDef::at("sticker-fire", Vec2Def::new(2000.0, 100.0)));

        let err = check_positions(&def, Canvas::default()).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("sticker 0"));
        assert!(msg.contains("2000"));
    }

    #[test]
    fn accessory_bounds_use_resolved_absolute_position() {
        // A negative body-relative offset is fine while the resolved point
        // stays on canvas.
        let mut def = valid_def();
        def.character
            .accessories
            .push(PlacementDef::at("acc-head-crown", Vec2Def::new(-40.0, -130.0)));
        assert!(check_positions(&def, Canvas::default()).is_ok());

        // Moving the body to the left edge pushes the same accessory off.
        def.character.body_position = Some(Vec2Def::new(10.0, 540.0));
        assert!(check_positions(&def, Canvas::default()).is_err());
    }

    #[test]
    fn color_syntax() {
        assert!(is_hex_color("#4A90E2"));
        assert!(is_hex_color("#abcdef"));
        assert!(!is_hex_color("4A90E2"));
        assert!(!is_hex_color("#4A90E"));
        assert!(!is_hex_color("#4A90EZ"));
        assert!(!is_hex_color("#4A90E2FF"));

        let mut def = valid_def();
        def.scene.texts.push(text_at(100.0, 100.0));
        def.scene.texts[0].color = "red".to_owned();
        assert!(check_colors(&def).is_err());
    }

    #[test]
    fn aggregate_report_collects_all_failures() {
        let mut def = valid_def();
        def.character.body = None;
        def.character.color = "blue".to_owned();
        def.audio.sfx.push(CueDef {
            id: "sfx-honk".to_owned(),
            time: 99.0,
            volume: 2.0,
        });

        let report = validate_all(
            &def,
            Some(&sample_manifest()),
            &ValidationOptions::default(),
        );
        assert!(!report.valid());
        assert!(report.errors.iter().any(|e| e.starts_with("structure:")));
        assert!(report.errors.iter().any(|e| e.starts_with("colors:")));
        assert!(report.errors.iter().any(|e| e.starts_with("audio timing:")));
        assert!(report.errors.iter().any(|e| e.starts_with("ranges:")));
    }

    #[test]
    fn missing_catalog_is_a_warning_not_an_error() {
        let report = validate_all(&valid_def(), None, &ValidationOptions::default());
        assert!(report.valid());
        assert_eq!(report.warnings.len(), 1);
    }
}
