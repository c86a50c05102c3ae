//! Parameter definitions with units and documented defaults.
//!
//! All tunable numbers live here:
//! - Units in names or docs (Hz, seconds, pixels, BPM)
//! - Documented ranges and meanings
//! - Type safety where possible

mod audio;
mod display;
mod render;

// Re-export all types
pub use audio::{audio_constants, Envelope, SoundKind, ToneParams, Waveform};
pub use display::{display_constants, AspectRatio, DisplayConfig, ASPECT_PRESETS};
pub use render::{clamp_bpm, tempo_constants, RecordingConfig, RenderConfig};
