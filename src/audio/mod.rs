//! Metronome click synthesis and playback.
//!
//! Clicks are synthesized per voice (oscillator + gain envelope) and mixed
//! in the cpal output callback.

mod system;
mod tone;

// Re-export public types
pub use system::{AudioSystem, ToneOutput, TonePlayer};
pub use tone::{envelope_gain, oscillator, render_tone, ToneVoice};
