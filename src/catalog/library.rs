use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use image::RgbaImage;

use crate::catalog::manifest::{AssetMeta, CatalogManifest};
use crate::foundation::error::{ToonlinkError, ToonlinkResult};
use crate::scene::model::CreationDef;
use crate::schema::validate::collect_asset_ids;

/// Byte source behind the catalog (filesystem, HTTP cache, embedded pack).
pub trait AssetSource {
    /// Fetch the raw bytes of a catalog file reference.
    fn fetch(&mut self, file: &str) -> anyhow::Result<Vec<u8>>;
}

/// Filesystem-backed asset source rooted at the catalog directory.
#[derive(Debug, Clone)]
pub struct FsAssetSource {
    root: PathBuf,
}

impl FsAssetSource {
    /// Source reading files below `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl AssetSource for FsAssetSource {
    fn fetch(&mut self, file: &str) -> anyhow::Result<Vec<u8>> {
        let path = self.root.join(file);
        std::fs::read(&path).map_err(|e| anyhow::anyhow!("read '{}': {e}", path.display()))
    }
}

/// Bounded retry configuration for asset loads.
///
/// Images retry more with growing delays; audio retries less with a short
/// fixed delay because it can degrade to a silent placeholder instead of
/// failing.
#[derive(Clone, Copy, Debug)]
pub struct RetryPolicy {
    /// Total image fetch attempts.
    pub image_attempts: u32,
    /// Base image retry delay, multiplied by the attempt number.
    pub image_delay: Duration,
    /// Total audio fetch attempts.
    pub audio_attempts: u32,
    /// Fixed audio retry delay.
    pub audio_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            image_attempts: 3,
            image_delay: Duration::from_millis(1000),
            audio_attempts: 2,
            audio_delay: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    /// Zero-delay policy for tests and offline sources.
    pub fn immediate() -> Self {
        Self {
            image_delay: Duration::ZERO,
            audio_delay: Duration::ZERO,
            ..Self::default()
        }
    }
}

/// A decoded, cached image asset.
#[derive(Debug, Clone)]
pub struct ImageAsset {
    /// Decoded straight-alpha pixels.
    pub image: RgbaImage,
}

impl ImageAsset {
    /// Natural pixel size.
    pub fn size(&self) -> (f64, f64) {
        let (w, h) = self.image.dimensions();
        (f64::from(w), f64::from(h))
    }
}

/// A loaded audio asset, or the typed silent stand-in for one that could not
/// be loaded.
///
/// Downstream code can tell real audio from degraded audio without marker
/// fields; playback treats both as playable so a broken sound never blocks a
/// creation.
#[derive(Debug, Clone)]
pub enum AudioHandle {
    /// Fully fetched audio bytes ("ready" means fully buffered).
    Loaded {
        /// Encoded audio file bytes.
        bytes: Arc<Vec<u8>>,
        /// Duration from catalog metadata, if declared.
        duration: Option<f64>,
    },
    /// Silent placeholder after retries were exhausted.
    Muted {
        /// Why the audio degraded.
        reason: String,
    },
}

impl AudioHandle {
    /// `true` for the silent placeholder.
    pub fn is_muted(&self) -> bool {
        matches!(self, Self::Muted { .. })
    }
}

/// Which preload phase an id belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PreloadPhase {
    /// Body, background, music: needed before anything is shown.
    Critical,
    /// Everything else.
    Secondary,
}

/// Progress callback payload during preloading.
#[derive(Clone, Debug)]
pub struct PreloadProgress {
    /// Assets finished so far (either outcome).
    pub loaded: usize,
    /// Total assets being preloaded.
    pub total: usize,
    /// Id currently being loaded.
    pub current: String,
    /// Phase the current asset belongs to.
    pub phase: PreloadPhase,
}

/// Per-phase preload counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PhaseStats {
    /// Assets attempted.
    pub total: usize,
    /// Assets that loaded (including muted audio placeholders).
    pub loaded: usize,
    /// Assets that terminally failed.
    pub failed: usize,
}

/// Preload outcome across both phases.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PreloadStats {
    /// Critical-phase counters.
    pub critical: PhaseStats,
    /// Secondary-phase counters.
    pub secondary: PhaseStats,
}

/// Cache and loading counters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LibraryStats {
    /// Cached decoded images.
    pub images_cached: usize,
    /// Cached audio handles (loaded or muted).
    pub audio_cached: usize,
    /// Ids with a recorded terminal error.
    pub errors: usize,
}

/// Explicitly constructed asset loading service.
///
/// Owns the manifest lookup plus image/audio caches keyed by asset id.
/// Single-threaded and cooperative: a cache hit never re-fetches, so each id
/// is fetched at most once and every later request for it joins the cached
/// result.
pub struct AssetLibrary<S: AssetSource> {
    manifest: CatalogManifest,
    source: S,
    retry: RetryPolicy,
    images: HashMap<String, Arc<ImageAsset>>,
    audio: HashMap<String, Arc<AudioHandle>>,
    errors: HashMap<String, String>,
}

impl<S: AssetSource> AssetLibrary<S> {
    /// Library over a manifest and byte source with the default retry policy.
    pub fn new(manifest: CatalogManifest, source: S) -> Self {
        Self::with_retry_policy(manifest, source, RetryPolicy::default())
    }

    /// Library with an explicit retry policy.
    pub fn with_retry_policy(manifest: CatalogManifest, source: S, retry: RetryPolicy) -> Self {
        Self {
            manifest,
            source,
            retry,
            images: HashMap::new(),
            audio: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    /// The wrapped manifest.
    pub fn manifest(&self) -> &CatalogManifest {
        &self.manifest
    }

    /// Metadata lookup passthrough.
    pub fn find_asset(&self, id: &str) -> Option<&AssetMeta> {
        self.manifest.find_asset(id)
    }

    /// Load (or fetch from cache) an image asset.
    ///
    /// Terminal failure propagates: the caller owns the placeholder policy
    /// for a missing required image.
    pub fn load_image(&mut self, id: &str) -> ToonlinkResult<Arc<ImageAsset>> {
        if let Some(cached) = self.images.get(id) {
            return Ok(cached.clone());
        }

        let meta = self
            .manifest
            .find_asset(id)
            .ok_or_else(|| ToonlinkError::asset_load(format!("asset not found: {id}")))?
            .clone();

        let mut last_err = String::new();
        for attempt in 1..=self.retry.image_attempts {
            match self.fetch_and_decode_image(&meta.file) {
                Ok(image) => {
                    let asset = Arc::new(ImageAsset { image });
                    self.images.insert(id.to_owned(), asset.clone());
                    return Ok(asset);
                }
                Err(e) => {
                    last_err = e.to_string();
                    if attempt < self.retry.image_attempts {
                        tracing::warn!(
                            id,
                            attempt,
                            of = self.retry.image_attempts,
                            error = %last_err,
                            "image load failed, retrying"
                        );
                        std::thread::sleep(self.retry.image_delay * attempt);
                    }
                }
            }
        }

        self.errors.insert(id.to_owned(), last_err.clone());
        Err(ToonlinkError::asset_load(format!(
            "failed to load {id} after {} attempts: {last_err}",
            self.retry.image_attempts
        )))
    }

    fn fetch_and_decode_image(&mut self, file: &str) -> anyhow::Result<RgbaImage> {
        let bytes = self.source.fetch(file)?;
        let img = image::load_from_memory(&bytes)?;
        Ok(img.to_rgba8())
    }

    /// Load (or fetch from cache) an audio asset.
    ///
    /// Never fails terminally on fetch errors: retries are exhausted into a
    /// cached [`AudioHandle::Muted`] placeholder so missing sound never
    /// blocks viewing. An id absent from the catalog is still an error.
    pub fn load_audio(&mut self, id: &str) -> ToonlinkResult<Arc<AudioHandle>> {
        if let Some(cached) = self.audio.get(id) {
            return Ok(cached.clone());
        }

        let meta = self
            .manifest
            .find_asset(id)
            .ok_or_else(|| ToonlinkError::asset_load(format!("asset not found: {id}")))?
            .clone();

        let mut last_err = String::new();
        for attempt in 1..=self.retry.audio_attempts {
            match self.source.fetch(&meta.file) {
                Ok(bytes) => {
                    let handle = Arc::new(AudioHandle::Loaded {
                        bytes: Arc::new(bytes),
                        duration: meta.duration,
                    });
                    self.audio.insert(id.to_owned(), handle.clone());
                    return Ok(handle);
                }
                Err(e) => {
                    last_err = e.to_string();
                    if attempt < self.retry.audio_attempts {
                        tracing::warn!(
                            id,
                            attempt,
                            of = self.retry.audio_attempts,
                            error = %last_err,
                            "audio load failed, retrying"
                        );
                        std::thread::sleep(self.retry.audio_delay);
                    }
                }
            }
        }

        tracing::warn!(id, error = %last_err, "audio failed to load, using silent placeholder");
        self.errors.insert(id.to_owned(), last_err.clone());
        let handle = Arc::new(AudioHandle::Muted { reason: last_err });
        self.audio.insert(id.to_owned(), handle.clone());
        Ok(handle)
    }

    /// Preload every asset a creation references, critical assets first.
    ///
    /// Individual failures are counted, never propagated; the viewer decides
    /// what to do with an incomplete library.
    pub fn preload(
        &mut self,
        def: &CreationDef,
        mut on_progress: Option<&mut dyn FnMut(PreloadProgress)>,
    ) -> PreloadStats {
        let critical: Vec<String> = [
            def.character.body.clone(),
            def.scene.background.clone(),
            def.audio.music.as_ref().map(|m| m.id.clone()),
        ]
        .into_iter()
        .flatten()
        .collect();

        let secondary: Vec<String> = collect_asset_ids(def)
            .into_iter()
            .map(str::to_owned)
            .filter(|id| !critical.contains(id))
            .collect();

        let total = critical.len() + secondary.len();
        let mut stats = PreloadStats::default();
        let mut done = 0usize;

        let phases = [
            (PreloadPhase::Critical, critical),
            (PreloadPhase::Secondary, secondary),
        ];
        for (phase, ids) in phases {
            for id in ids {
                let ok = if self.manifest.is_audio(&id) {
                    self.load_audio(&id).is_ok()
                } else {
                    self.load_image(&id).is_ok()
                };

                let phase_stats = match phase {
                    PreloadPhase::Critical => &mut stats.critical,
                    PreloadPhase::Secondary => &mut stats.secondary,
                };
                phase_stats.total += 1;
                if ok {
                    phase_stats.loaded += 1;
                } else {
                    phase_stats.failed += 1;
                }

                done += 1;
                if let Some(cb) = on_progress.as_deref_mut() {
                    cb(PreloadProgress {
                        loaded: done,
                        total,
                        current: id,
                        phase,
                    });
                }
            }
        }

        stats
    }

    /// Cache and error counters.
    pub fn stats(&self) -> LibraryStats {
        LibraryStats {
            images_cached: self.images.len(),
            audio_cached: self.audio.len(),
            errors: self.errors.len(),
        }
    }

    /// Recorded terminal errors, by asset id.
    pub fn errors(&self) -> &HashMap<String, String> {
        &self.errors
    }

    /// Drop every cached asset and recorded error.
    pub fn clear_cache(&mut self) {
        self.images.clear();
        self.audio.clear();
        self.errors.clear();
    }

    /// Drop one asset from the caches so the next load re-fetches it.
    pub fn clear_asset(&mut self, id: &str) {
        self.images.remove(id);
        self.audio.remove(id);
        self.errors.remove(id);
    }

    /// Cached image lookup without loading.
    pub fn cached_image(&self, id: &str) -> Option<&RgbaImage> {
        self.images.get(id).map(|a| &a.image)
    }
}

impl<S: AssetSource> crate::render::scene::ImageSource for AssetLibrary<S> {
    fn image(&self, id: &str) -> Option<&RgbaImage> {
        self.cached_image(id)
    }
}

impl<S: AssetSource> crate::compose::hit::SizeLookup for AssetLibrary<S> {
    fn size_of(&self, id: &str) -> Option<(f64, f64)> {
        self.images.get(id).map(|a| a.size())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::manifest::test_fixtures::sample_manifest;

    /// In-memory source that can fail per-file a set number of times.
    #[derive(Default)]
    struct FlakySource {
        files: HashMap<String, Vec<u8>>,
        failures_left: HashMap<String, u32>,
        fetches: Vec<String>,
    }

    impl FlakySource {
        fn with_png(mut self, file: &str) -> Self {
            let img = RgbaImage::from_pixel(2, 3, image::Rgba([1, 2, 3, 255]));
            let mut bytes = Vec::new();
            img.write_to(
                &mut std::io::Cursor::new(&mut bytes),
                image::ImageFormat::Png,
            )
            .unwrap();
            self.files.insert(file.to_owned(), bytes);
            self
        }

        fn with_bytes(mut self, file: &str, bytes: &[u8]) -> Self {
            self.files.insert(file.to_owned(), bytes.to_vec());
            self
        }

        fn failing_first(mut self, file: &str, times: u32) -> Self {
            self.failures_left.insert(file.to_owned(), times);
            self
        }
    }

    impl AssetSource for FlakySource {
        fn fetch(&mut self, file: &str) -> anyhow::Result<Vec<u8>> {
            self.fetches.push(file.to_owned());
            if let Some(left) = self.failures_left.get_mut(file)
                && *left > 0
            {
                *left -= 1;
                anyhow::bail!("transient failure for {file}");
            }
            self.files
                .get(file)
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("no such file {file}"))
        }
    }

    fn library(source: FlakySource) -> AssetLibrary<FlakySource> {
        AssetLibrary::with_retry_policy(sample_manifest(), source, RetryPolicy::immediate())
    }

    const CAT_FILE: &str = "images/characters/bodies/char-body-cat.png";
    const MUSIC_FILE: &str = "audio/music/chill-lofi-01.mp3";

    #[test]
    fn image_load_decodes_and_caches() {
        let mut lib = library(FlakySource::default().with_png(CAT_FILE));

        let a = lib.load_image("char-body-cat").unwrap();
        assert_eq!(a.size(), (2.0, 3.0));

        // Second load joins the cached result: no second fetch.
        let _b = lib.load_image("char-body-cat").unwrap();
        assert_eq!(lib.source.fetches.len(), 1);
        assert_eq!(lib.stats().images_cached, 1);
    }

    #[test]
    fn image_retries_transient_failures() {
        let mut lib = library(
            FlakySource::default()
                .with_png(CAT_FILE)
                .failing_first(CAT_FILE, 2),
        );
        assert!(lib.load_image("char-body-cat").is_ok());
        assert_eq!(lib.source.fetches.len(), 3);
    }

    #[test]
    fn image_terminal_failure_propagates() {
        let mut lib = library(FlakySource::default());
        let err = lib.load_image("char-body-cat").unwrap_err();
        assert!(matches!(err, ToonlinkError::AssetLoad(_)));
        assert_eq!(lib.stats().errors, 1);

        // Unknown ids are their own error, before any fetch.
        let err = lib.load_image("not-in-catalog").unwrap_err();
        assert!(err.to_string().contains("not-in-catalog"));
    }

    #[test]
    fn audio_terminal_failure_degrades_to_muted() {
        let mut lib = library(FlakySource::default());
        let handle = lib.load_audio("music-chill-lofi-01").unwrap();
        assert!(handle.is_muted());
        // Two attempts, then the placeholder is cached.
        assert_eq!(lib.source.fetches.len(), 2);
        let again = lib.load_audio("music-chill-lofi-01").unwrap();
        assert!(again.is_muted());
        assert_eq!(lib.source.fetches.len(), 2);
    }

    #[test]
    fn audio_load_carries_catalog_duration() {
        let mut lib = library(FlakySource::default().with_bytes(MUSIC_FILE, b"mp3!"));
        let handle = lib.load_audio("music-chill-lofi-01").unwrap();
        let AudioHandle::Loaded { duration, bytes } = handle.as_ref() else {
            panic!("expected loaded audio");
        };
        assert_eq!(*duration, Some(30.0));
        assert_eq!(bytes.as_slice(), b"mp3!");
    }

    #[test]
    fn preload_orders_critical_before_secondary() {
        use crate::scene::model::{CueDef, MusicDef, PlacementDef, Vec2Def};

        let mut def = CreationDef::new();
        def.character.body = Some("char-body-cat".to_owned());
        def.scene.background = Some("bg-space".to_owned());
        def.audio.music = Some(MusicDef {
            id: "music-chill-lofi-01".to_owned(),
            volume: 0.7,
        });
        def.character
            .accessories
            .push(PlacementDef::at("acc-head-crown", Vec2Def::new(0.0, 0.0)));
        def.audio.sfx.push(CueDef {
            id: "sfx-honk".to_owned(),
            time: 1.0,
            volume: 1.0,
        });

        let source = FlakySource::default()
            .with_png(CAT_FILE)
            .with_png("images/backgrounds/bg-space.png")
            .with_png("images/accessories/acc-head-crown.png")
            .with_bytes(MUSIC_FILE, b"m")
            .with_bytes("audio/sfx/silly/honk.mp3", b"s");
        let mut lib = library(source);

        let mut seen = Vec::new();
        let mut cb = |p: PreloadProgress| seen.push((p.current.clone(), p.phase));
        let stats = lib.preload(&def, Some(&mut cb));

        assert_eq!(stats.critical.total, 3);
        assert_eq!(stats.critical.failed, 0);
        assert_eq!(stats.secondary.total, 2);

        // Critical phase strictly precedes secondary.
        let first_secondary = seen
            .iter()
            .position(|(_, p)| *p == PreloadPhase::Secondary)
            .unwrap();
        assert!(
            seen[..first_secondary]
                .iter()
                .all(|(_, p)| *p == PreloadPhase::Critical)
        );
        assert_eq!(seen.len(), 5);
    }

    #[test]
    fn preload_counts_failures_without_propagating() {
        let mut def = CreationDef::new();
        def.character.body = Some("char-body-cat".to_owned());

        let mut lib = library(FlakySource::default()); // nothing fetchable
        let stats = lib.preload(&def, None);
        assert_eq!(stats.critical.failed, 1);
    }

    #[test]
    fn clear_asset_forces_refetch() {
        let mut lib = library(FlakySource::default().with_png(CAT_FILE));
        lib.load_image("char-body-cat").unwrap();
        lib.clear_asset("char-body-cat");
        lib.load_image("char-body-cat").unwrap();
        assert_eq!(lib.source.fetches.len(), 2);
    }
}
