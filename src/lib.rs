//! Beatslide library - Metronome with a beat-synced image slideshow

pub mod app;
pub mod audio;
pub mod cli;
pub mod errors;
pub mod events;
pub mod layout;
pub mod params;
pub mod rendering;
pub mod resize;
pub mod scheduler;
pub mod settings;
pub mod slideshow;
