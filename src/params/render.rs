//! Window, tempo and recording configuration.

use std::path::PathBuf;

/// Window and scene configuration
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Window width (pixels)
    pub window_width: u32,

    /// Window height (pixels)
    pub window_height: u32,

    /// Open in borderless fullscreen
    pub fullscreen: bool,

    /// Page background (linear RGB)
    pub background: [f64; 3],

    /// Slideshow container fill (linear RGBA)
    pub container_color: [f32; 4],

    /// Beat indicator side length (pixels)
    pub indicator_size_px: f32,

    /// Indicator margin from the top-left corner (pixels)
    pub indicator_margin_px: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            window_width: 1280,
            window_height: 720,
            fullscreen: false,
            background: [0.02, 0.02, 0.025],
            container_color: [0.08, 0.08, 0.09, 1.0],
            indicator_size_px: 28.0,
            indicator_margin_px: 16.0,
        }
    }
}

/// Audio recording configuration
#[derive(Debug, Clone)]
pub struct RecordingConfig {
    /// WAV file receiving everything sent to the output device
    pub wav_path: PathBuf,
}

impl RecordingConfig {
    pub fn new(wav_path: impl Into<PathBuf>) -> Self {
        Self {
            wav_path: wav_path.into(),
        }
    }
}

/// Tempo constants
pub mod tempo_constants {
    /// Slowest accepted tempo (BPM)
    pub const MIN_BPM: u32 = 30;

    /// Fastest accepted tempo (BPM)
    pub const MAX_BPM: u32 = 300;

    /// Tempo at startup (BPM)
    pub const DEFAULT_BPM: u32 = 120;

    /// Coarse tempo step (Shift + arrow)
    pub const COARSE_BPM_STEP: u32 = 10;
}

/// Clamp a requested tempo into the accepted range
pub fn clamp_bpm(bpm: u32) -> u32 {
    bpm.clamp(tempo_constants::MIN_BPM, tempo_constants::MAX_BPM)
}
