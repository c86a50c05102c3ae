//! Command-line argument parsing.

use std::path::PathBuf;

use clap::Parser;

use crate::app::PlaybackState;
use crate::params::{
    clamp_bpm, display_constants, tempo_constants, AspectRatio, RecordingConfig, RenderConfig,
    SoundKind, ASPECT_PRESETS,
};
use crate::settings::{AspectChoice, DisplayControls};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "beatslide")]
#[command(about = "Metronome with a beat-synced image slideshow", long_about = None)]
pub struct Args {
    /// Image files or directories (directories are scanned, sorted by name)
    #[arg(value_name = "IMAGES")]
    pub images: Vec<PathBuf>,

    /// Tempo in beats per minute (clamped to 30..=300)
    #[arg(long, value_name = "BPM", default_value_t = tempo_constants::DEFAULT_BPM)]
    pub bpm: u32,

    /// Click sound
    #[arg(long, value_enum, default_value_t = SoundKind::Beep)]
    pub sound: SoundKind,

    /// Container aspect: 16:9, 4:3, 3:2, 1:1, 9:16, custom, or any W:H
    #[arg(long, value_name = "RATIO", default_value = "16:9")]
    pub aspect: AspectChoice,

    /// Custom aspect width term
    #[arg(long, value_name = "N", default_value_t = 16)]
    pub custom_width: u32,

    /// Custom aspect height term
    #[arg(long, value_name = "N", default_value_t = 9)]
    pub custom_height: u32,

    /// Resize bounding box width (pixels)
    #[arg(long, value_name = "PIXELS", default_value_t = display_constants::DEFAULT_MAX_WIDTH)]
    pub max_width: u32,

    /// Resize bounding box height (pixels)
    #[arg(long, value_name = "PIXELS", default_value_t = display_constants::DEFAULT_MAX_HEIGHT)]
    pub max_height: u32,

    /// Start ticking immediately
    #[arg(long)]
    pub start: bool,

    /// Open in borderless fullscreen
    #[arg(long)]
    pub fullscreen: bool,

    /// Record audio output to a WAV file
    #[arg(long, value_name = "PATH")]
    pub record: Option<PathBuf>,
}

impl Args {
    /// Initial tempo and timbre (never playing; `--start` is applied after setup)
    pub fn playback_state(&self) -> PlaybackState {
        let bpm = clamp_bpm(self.bpm);
        if bpm != self.bpm {
            log::warn!("BPM {} out of range, using {}", self.bpm, bpm);
        }
        PlaybackState {
            is_playing: false,
            bpm,
            selected_sound: self.sound,
        }
    }

    /// Display controls from flags
    ///
    /// A `W:H` that is not a preset becomes the custom pair.
    pub fn display_controls(&self) -> DisplayControls {
        let mut controls = DisplayControls {
            aspect: self.aspect,
            custom_width: self.custom_width,
            custom_height: self.custom_height,
            max_width: self.max_width,
            max_height: self.max_height,
        };

        if let AspectChoice::Preset(ratio) = self.aspect {
            if !ASPECT_PRESETS.contains(&ratio) {
                controls.aspect = AspectChoice::Custom;
                controls.custom_width = ratio.width;
                controls.custom_height = ratio.height;
            }
        }

        controls
    }

    pub fn render_config(&self) -> RenderConfig {
        RenderConfig {
            fullscreen: self.fullscreen,
            ..RenderConfig::default()
        }
    }

    /// Create recording configuration if recording is enabled
    pub fn recording_config(&self) -> Option<RecordingConfig> {
        self.record.as_ref().map(|path| {
            log::info!("Recording audio to {}", path.display());
            RecordingConfig::new(path)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["beatslide"]);
        assert!(args.images.is_empty());
        assert_eq!(args.playback_state(), PlaybackState::default());
        assert_eq!(args.display_controls(), DisplayControls::default());
        assert!(args.recording_config().is_none());
        assert!(!args.start);
    }

    #[test]
    fn test_bpm_clamped() {
        let args = Args::parse_from(["beatslide", "--bpm", "1000"]);
        assert_eq!(args.playback_state().bpm, tempo_constants::MAX_BPM);
    }

    #[test]
    fn test_sound_and_images() {
        let args = Args::parse_from(["beatslide", "--sound", "cowbell", "a.png", "shots"]);
        assert_eq!(args.playback_state().selected_sound, SoundKind::Cowbell);
        assert_eq!(args.images, vec![PathBuf::from("a.png"), PathBuf::from("shots")]);
    }

    #[test]
    fn test_non_preset_aspect_becomes_custom() {
        let args = Args::parse_from(["beatslide", "--aspect", "21:9"]);
        let controls = args.display_controls();
        assert_eq!(controls.aspect, AspectChoice::Custom);
        assert_eq!(controls.aspect_ratio(), AspectRatio::new(21, 9));
    }

    #[test]
    fn test_custom_aspect_flags() {
        let args = Args::parse_from([
            "beatslide",
            "--aspect",
            "custom",
            "--custom-width",
            "5",
            "--custom-height",
            "4",
            "--max-width",
            "640",
        ]);
        let config = args.display_controls().to_config();
        assert_eq!(config.aspect_ratio, AspectRatio::new(5, 4));
        assert_eq!(config.bounds(), (640, display_constants::DEFAULT_MAX_HEIGHT));
    }
}
