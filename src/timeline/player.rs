use crate::catalog::manifest::CatalogManifest;
use crate::foundation::error::ToonlinkResult;
use crate::scene::model::AudioDef;

/// Default playback duration in seconds; music longer than this extends it.
pub const DEFAULT_DURATION_SECS: f64 = 20.0;

/// Playback states of the timeline.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PlaybackState {
    /// Not playing; elapsed time is zero.
    #[default]
    Stopped,
    /// Advancing; ticks fire due cues.
    Playing,
    /// Frozen at the current elapsed time.
    Paused,
}

/// Kind of a one-shot cue.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CueKind {
    /// Sound effect.
    Sfx,
    /// Voice clip.
    Voice,
}

/// One scheduled one-shot audio event.
#[derive(Clone, Debug, PartialEq)]
pub struct OneShotCue {
    /// Audio asset id.
    pub id: String,
    /// Sfx or voice.
    pub kind: CueKind,
    /// Scheduled time in seconds from playback start.
    pub time: f64,
    /// Volume in 0.0..=1.0.
    pub volume: f64,
    fired: bool,
}

/// Audio output the timeline drives.
///
/// The timeline recovers from every sink failure: a rejected one-shot is
/// logged and skipped, a rejected music start degrades to silent playback.
pub trait AudioSink {
    /// Start (or resume) the looping music track at `resume_at_secs`.
    fn start_music(&mut self, id: &str, volume: f64, resume_at_secs: f64) -> ToonlinkResult<()>;
    /// Pause the music track, keeping its position.
    fn pause_music(&mut self);
    /// Rewind the music track to the beginning and pause it.
    fn rewind_music(&mut self);
    /// Fire a one-shot cue from the beginning.
    fn play_one_shot(&mut self, id: &str, volume: f64) -> ToonlinkResult<()>;
    /// Rewind and silence any playing one-shots.
    fn stop_one_shots(&mut self);
}

/// Outcome of one timeline tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tick {
    /// Still playing; the host should schedule the next tick.
    Advanced,
    /// Reached the end of the timeline and auto-stopped.
    Finished,
    /// Not playing; nothing happened.
    Idle,
}

/// Cooperative playback scheduler.
///
/// The host supplies the clock (`now_secs`, any monotonic seconds source) and
/// drives [`TimelinePlayer::tick`] from its per-frame callback; the player
/// never reads wall-clock time itself.
pub struct TimelinePlayer {
    state: PlaybackState,
    music: Option<(String, f64)>,
    cues: Vec<OneShotCue>,
    duration: f64,
    /// Wall-clock instant corresponding to elapsed zero while playing.
    start_offset: f64,
    /// Frozen elapsed time while paused or stopped.
    frozen_elapsed: f64,
    on_time_update: Option<Box<dyn FnMut(f64)>>,
}

impl TimelinePlayer {
    /// Empty timeline with the default duration.
    pub fn new() -> Self {
        Self {
            state: PlaybackState::Stopped,
            music: None,
            cues: Vec::new(),
            duration: DEFAULT_DURATION_SECS,
            start_offset: 0.0,
            frozen_elapsed: 0.0,
            on_time_update: None,
        }
    }

    /// Build a timeline from a creation's audio block, pulling music duration
    /// from catalog metadata.
    pub fn from_audio(audio: &AudioDef, catalog: &CatalogManifest) -> Self {
        let mut player = Self::new();

        if let Some(music) = audio.music.as_ref() {
            let duration = catalog.find_asset(&music.id).and_then(|m| m.duration);
            player.set_music(&music.id, music.volume, duration);
        }
        for sfx in &audio.sfx {
            player.add_cue(&sfx.id, CueKind::Sfx, sfx.time, sfx.volume);
        }
        if let Some(voice) = audio.voice.as_ref() {
            player.add_cue(&voice.id, CueKind::Voice, voice.time, voice.volume);
        }

        player
    }

    /// Observer invoked with the current elapsed time on every tick (and with
    /// zero on stop), for timeline UI.
    pub fn set_time_observer(&mut self, observer: impl FnMut(f64) + 'static) {
        self.on_time_update = Some(Box::new(observer));
    }

    /// Set the looping music track. Total duration becomes the maximum of the
    /// default and the track's own duration.
    pub fn set_music(&mut self, id: &str, volume: f64, duration_secs: Option<f64>) {
        self.music = Some((id.to_owned(), volume.clamp(0.0, 1.0)));
        if let Some(d) = duration_secs {
            self.duration = self.duration.max(d);
        }
    }

    /// Schedule a one-shot cue, keeping the schedule sorted by time so
    /// same-tick events fire in schedule order, not insertion order.
    pub fn add_cue(&mut self, id: &str, kind: CueKind, time: f64, volume: f64) {
        let cue = OneShotCue {
            id: id.to_owned(),
            kind,
            time,
            volume: volume.clamp(0.0, 1.0),
            fired: false,
        };
        let at = self
            .cues
            .partition_point(|existing| existing.time <= cue.time);
        self.cues.insert(at, cue);
    }

    /// Scheduled cues in firing order.
    pub fn cues(&self) -> &[OneShotCue] {
        &self.cues
    }

    /// Total playback duration in seconds.
    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Current state.
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Elapsed playback time at `now_secs`.
    pub fn elapsed(&self, now_secs: f64) -> f64 {
        match self.state {
            PlaybackState::Playing => (now_secs - self.start_offset).max(0.0),
            _ => self.frozen_elapsed,
        }
    }

    /// Start or resume playback. Never fails: a music track that refuses to
    /// start degrades to silent playback with a warning.
    pub fn play(&mut self, now_secs: f64, sink: &mut dyn AudioSink) {
        match self.state {
            PlaybackState::Playing => return,
            PlaybackState::Stopped => {
                // Fresh cycle: every cue may fire again.
                for cue in &mut self.cues {
                    cue.fired = false;
                }
                self.frozen_elapsed = 0.0;
            }
            PlaybackState::Paused => {}
        }

        if let Some((id, volume)) = self.music.as_ref()
            && let Err(e) = sink.start_music(id, *volume, self.frozen_elapsed)
        {
            tracing::warn!(music = %id, error = %e, "music failed to start, playing silent");
        }

        self.start_offset = now_secs - self.frozen_elapsed;
        self.state = PlaybackState::Playing;
    }

    /// Pause playback, freezing the elapsed time.
    pub fn pause(&mut self, now_secs: f64, sink: &mut dyn AudioSink) {
        if self.state != PlaybackState::Playing {
            return;
        }
        self.frozen_elapsed = self.elapsed(now_secs);
        self.state = PlaybackState::Paused;
        sink.pause_music();
    }

    /// Stop playback, rewinding everything and notifying the observer with
    /// time zero.
    pub fn stop(&mut self, sink: &mut dyn AudioSink) {
        self.state = PlaybackState::Stopped;
        self.frozen_elapsed = 0.0;
        self.start_offset = 0.0;
        for cue in &mut self.cues {
            cue.fired = false;
        }
        sink.rewind_music();
        sink.stop_one_shots();
        if let Some(observer) = self.on_time_update.as_mut() {
            observer(0.0);
        }
    }

    /// Advance the timeline from the host's per-frame callback.
    ///
    /// Fires every due, unfired cue in ascending schedule order, invokes the
    /// time observer, and auto-stops once the duration is reached. A cue
    /// whose playback fails is logged and skipped; it never halts the
    /// timeline or the music.
    pub fn tick(&mut self, now_secs: f64, sink: &mut dyn AudioSink) -> Tick {
        if self.state != PlaybackState::Playing {
            return Tick::Idle;
        }

        let elapsed = self.elapsed(now_secs);
        if elapsed >= self.duration {
            self.stop(sink);
            return Tick::Finished;
        }

        for cue in &mut self.cues {
            if cue.time > elapsed {
                break; // sorted: nothing further is due
            }
            if cue.fired {
                continue;
            }
            cue.fired = true;
            if let Err(e) = sink.play_one_shot(&cue.id, cue.volume) {
                tracing::warn!(cue = %cue.id, error = %e, "one-shot failed, skipping");
            }
        }

        if let Some(observer) = self.on_time_update.as_mut() {
            observer(elapsed);
        }

        Tick::Advanced
    }
}

impl Default for TimelinePlayer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TimelinePlayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimelinePlayer")
            .field("state", &self.state)
            .field("music", &self.music)
            .field("cues", &self.cues)
            .field("duration", &self.duration)
            .finish_non_exhaustive()
    }
}
