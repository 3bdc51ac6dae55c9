//! End-to-end viewer flow: decode a share token, validate it against the
//! catalog, compose the draw plan, raster a frame, and drive the audio
//! timeline.

use std::collections::HashMap;

use image::{Rgba, RgbaImage};
use toonlink::{
    AudioSink, Canvas, CatalogManifest, Compressor, CreationDef, DrawOp, PlaybackState,
    SceneRenderer, Tick, TimelinePlayer, TokenCodec, ToonlinkResult, ValidationOptions,
    collect_asset_ids, compose_scene, validate_all,
};

fn manifest() -> CatalogManifest {
    CatalogManifest::from_reader(include_str!("data/sample_manifest.json").as_bytes()).unwrap()
}

fn sample_creation() -> CreationDef {
    serde_json::from_str(include_str!("data/sample_creation.json")).unwrap()
}

/// Flat 8x8 placeholder art for every image id the creation references.
fn stub_images(def: &CreationDef, catalog: &CatalogManifest) -> HashMap<String, RgbaImage> {
    collect_asset_ids(def)
        .into_iter()
        .filter(|id| !catalog.is_audio(id))
        .map(|id| {
            (
                id.to_owned(),
                RgbaImage::from_pixel(8, 8, Rgba([90, 90, 90, 255])),
            )
        })
        .collect()
}

#[derive(Default)]
struct NullSink {
    one_shots: Vec<String>,
    music_started: bool,
}

impl AudioSink for NullSink {
    fn start_music(&mut self, _id: &str, _volume: f64, _at: f64) -> ToonlinkResult<()> {
        self.music_started = true;
        Ok(())
    }
    fn pause_music(&mut self) {}
    fn rewind_music(&mut self) {}
    fn play_one_shot(&mut self, id: &str, _volume: f64) -> ToonlinkResult<()> {
        self.one_shots.push(id.to_owned());
        Ok(())
    }
    fn stop_one_shots(&mut self) {}
}

#[test]
fn shared_token_reconstructs_and_renders() {
    let catalog = manifest();
    let codec = TokenCodec::new(Compressor::Deflate);

    // Share side.
    let token = codec.encode(&sample_creation()).unwrap();

    // Viewer side.
    let def = codec.decode(&token).unwrap();
    let report = validate_all(&def, Some(&catalog), &ValidationOptions::default());
    assert!(report.valid(), "errors: {:?}", report.errors);

    let plan = compose_scene(&def, &catalog, Canvas::default());
    assert!(matches!(plan.ops[0], DrawOp::Background { .. }));
    // background + body + 2 accessories + eyes + mouth + 2 stickers + 1 text
    assert_eq!(plan.ops.len(), 9);

    let mut renderer = SceneRenderer::new();
    let frame = renderer
        .render(&plan, &stub_images(&def, &catalog))
        .unwrap()
        .expect("no concurrent render in flight");
    assert_eq!((frame.width, frame.height), (1920, 1080));
    assert_eq!(frame.data.len(), 1920 * 1080 * 4);
    // The stretched background makes the frame fully opaque.
    assert!(frame.data.chunks_exact(4).all(|px| px[3] == 255));
}

#[test]
fn validation_fails_against_an_emptier_catalog() {
    let catalog = CatalogManifest::default();
    let report = validate_all(
        &sample_creation(),
        Some(&catalog),
        &ValidationOptions::default(),
    );
    assert!(!report.valid());
    assert!(
        report
            .errors
            .iter()
            .any(|e| e.starts_with("assets:") && e.contains("char-body-cat"))
    );
}

#[test]
fn timeline_plays_through_the_shared_audio_block() {
    let catalog = manifest();
    let def = sample_creation();

    let mut player = TimelinePlayer::from_audio(&def.audio, &catalog);
    assert_eq!(player.duration(), 30.0); // music duration extends the default

    let mut sink = NullSink::default();
    player.play(0.0, &mut sink);
    assert!(sink.music_started);

    // Walk the whole timeline in coarse host ticks.
    let mut t = 0.5;
    loop {
        match player.tick(t, &mut sink) {
            Tick::Advanced => t += 0.5,
            Tick::Finished => break,
            Tick::Idle => panic!("player went idle mid-playback"),
        }
    }

    assert_eq!(player.state(), PlaybackState::Stopped);
    // Cues fired exactly once each, in schedule order.
    assert_eq!(sink.one_shots, ["sfx-honk", "voice-hello", "sfx-meow"]);
}

#[test]
fn remix_decodes_mutates_and_re_encodes_to_a_new_token() {
    let codec = TokenCodec::default();
    let original_token = codec.encode(&sample_creation()).unwrap();

    // Remix: decode into a builder, mutate a copy, encode a fresh token.
    let decoded = codec.decode(&original_token).unwrap();
    let mut remix = toonlink::Creation::from_def(decoded.clone());
    remix.set_body_color("#FF00FF");
    remix.add_sticker("sticker-fire", None);

    let remixed_token = codec.encode(remix.def()).unwrap();
    assert_ne!(remixed_token, original_token);

    // The original token still decodes to the original record.
    assert_eq!(codec.decode(&original_token).unwrap(), decoded);
}
