//! Application state and the controller that owns every state transition.

use std::time::{Duration, Instant};

use crate::audio::TonePlayer;
use crate::errors::SchedulerError;
use crate::events::EventSink;
use crate::params::{audio_constants, clamp_bpm, tempo_constants, DisplayConfig, SoundKind};
use crate::resize::{ImageBlob, ImageSource, ResizeDispatch, ResizeOutcome};
use crate::scheduler::{BeatScheduler, Tick};
use crate::slideshow::SlideshowController;

/// Tempo, run state and timbre
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackState {
    pub is_playing: bool,
    pub bpm: u32,
    pub selected_sound: SoundKind,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self {
            is_playing: false,
            bpm: tempo_constants::DEFAULT_BPM,
            selected_sound: SoundKind::default(),
        }
    }
}

/// Beat flash that switches itself off after a fixed time
#[derive(Debug, Clone)]
pub struct BeatIndicator {
    flash: Duration,
    lit_until: Option<Instant>,
}

impl Default for BeatIndicator {
    fn default() -> Self {
        Self {
            flash: Duration::from_millis(audio_constants::INDICATOR_FLASH_MS),
            lit_until: None,
        }
    }
}

impl BeatIndicator {
    pub fn flash(&mut self, now: Instant) {
        self.lit_until = Some(now + self.flash);
    }

    pub fn is_lit(&self, now: Instant) -> bool {
        self.lit_until.is_some_and(|until| now < until)
    }

    /// When the indicator next changes, if it is lit
    pub fn off_at(&self) -> Option<Instant> {
        self.lit_until
    }
}

/// Everything the session holds in memory
#[derive(Debug, Default)]
pub struct AppState {
    playback: PlaybackState,
    slideshow: SlideshowController,
    display: DisplayConfig,
    indicator: BeatIndicator,
}

impl AppState {
    pub fn playback(&self) -> &PlaybackState {
        &self.playback
    }

    pub fn slideshow(&self) -> &SlideshowController {
        &self.slideshow
    }

    pub fn display(&self) -> &DisplayConfig {
        &self.display
    }

    pub fn indicator(&self) -> &BeatIndicator {
        &self.indicator
    }
}

/// Owns the state, the scheduler, the tone output and the resize dispatcher
pub struct Controller<P, R, S>
where
    P: TonePlayer,
    R: ResizeDispatch,
    S: EventSink<Tick>,
{
    state: AppState,
    scheduler: BeatScheduler<S>,
    tone: P,
    resizer: R,
}

impl<P, R, S> Controller<P, R, S>
where
    P: TonePlayer,
    R: ResizeDispatch,
    S: EventSink<Tick>,
{
    pub fn new(playback: PlaybackState, display: DisplayConfig, tone: P, resizer: R, ticks: S) -> Self {
        let playback = PlaybackState {
            is_playing: false,
            bpm: clamp_bpm(playback.bpm),
            ..playback
        };

        Self {
            state: AppState {
                playback,
                display,
                ..AppState::default()
            },
            scheduler: BeatScheduler::new(ticks),
            tone,
            resizer,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn tone_player(&self) -> &P {
        &self.tone
    }

    pub fn resizer(&self) -> &R {
        &self.resizer
    }

    /// Start ticking at the current tempo (restarts if already running)
    pub fn start(&mut self) -> Result<(), SchedulerError> {
        self.run_timer_at(self.state.playback.bpm)?;
        log::info!("Metronome started at {} BPM", self.state.playback.bpm);
        Ok(())
    }

    /// (Re)start the timer; on failure no timer runs and playback is off
    fn run_timer_at(&mut self, bpm: u32) -> Result<(), SchedulerError> {
        match self.scheduler.start(bpm) {
            Ok(()) => {
                self.state.playback.is_playing = true;
                Ok(())
            }
            Err(e) => {
                self.scheduler.stop();
                self.state.playback.is_playing = false;
                Err(e)
            }
        }
    }

    pub fn stop(&mut self) {
        self.scheduler.stop();
        self.tone.suspend();
        if self.state.playback.is_playing {
            log::info!("Metronome stopped");
        }
        self.state.playback.is_playing = false;
    }

    /// Start/stop toggle
    pub fn toggle(&mut self) -> Result<(), SchedulerError> {
        if self.state.playback.is_playing {
            self.stop();
            Ok(())
        } else {
            self.start()
        }
    }

    /// Set the tempo; a running timer is replaced at the new interval
    pub fn set_bpm(&mut self, bpm: u32) -> Result<(), SchedulerError> {
        let bpm = clamp_bpm(bpm);
        if bpm == self.state.playback.bpm {
            return Ok(());
        }
        self.state.playback.bpm = bpm;
        log::info!("Tempo set to {} BPM", bpm);

        if self.state.playback.is_playing {
            self.run_timer_at(bpm)?;
        }
        Ok(())
    }

    pub fn adjust_bpm(&mut self, delta: i64) -> Result<(), SchedulerError> {
        let bpm = (self.state.playback.bpm as i64 + delta).max(0) as u32;
        self.set_bpm(bpm)
    }

    pub fn set_sound(&mut self, kind: SoundKind) {
        self.state.playback.selected_sound = kind;
        log::info!("Sound set to {}", kind);
    }

    /// Replace the image set and show the image under the cursor
    pub fn load_images(&mut self, images: Vec<ImageSource>) {
        log::info!("Loaded {} image(s)", images.len());
        self.state.slideshow.replace_images(images);
        self.refresh_image();
    }

    /// Install a new display configuration and re-render the current image
    pub fn apply_display(&mut self, config: DisplayConfig) {
        log::debug!(
            "Display: aspect {} box {}x{}",
            config.aspect_ratio,
            config.max_width,
            config.max_height
        );
        self.state.display = config;
        self.refresh_image();
    }

    fn refresh_image(&mut self) {
        if let Some(request) = self.state.slideshow.refresh(self.state.display.bounds()) {
            self.resizer.submit(request);
        }
    }

    /// Handle one beat: play the click, then advance the slideshow
    ///
    /// Returns `false` for ticks from a cancelled timer run.
    pub fn on_tick(&mut self, tick: Tick, now: Instant) -> bool {
        if !self.scheduler.is_current(&tick) {
            log::debug!("Ignoring stale tick {:?}", tick);
            return false;
        }

        self.tone.play(self.state.playback.selected_sound);
        self.state.indicator.flash(now);

        if let Some(request) = self.state.slideshow.advance(self.state.display.bounds()) {
            self.resizer.submit(request);
        }
        true
    }

    /// Handle a finished resize; returns the blob to display if it is fresh
    pub fn on_image_ready(&mut self, outcome: ResizeOutcome) -> Option<&ImageBlob> {
        self.state.slideshow.complete(outcome)
    }
}
