//! Error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while opening the audio output.
#[derive(Debug, Error)]
pub enum AudioError {
    /// The host has no default output device.
    #[error("no audio output device found")]
    NoOutputDevice,

    /// The device could not report a default configuration.
    #[error("failed to get audio config: {0}")]
    DefaultConfig(#[from] cpal::DefaultStreamConfigError),

    /// The device only offers sample formats the tone mixer cannot write.
    #[error("unsupported output sample format: {0:?}")]
    UnsupportedSampleFormat(cpal::SampleFormat),

    /// Building the output stream failed.
    #[error("failed to build audio stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    /// Starting or resuming the output stream failed.
    #[error("failed to start audio stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),

    /// Pausing the output stream failed.
    #[error("failed to suspend audio stream: {0}")]
    PauseStream(#[from] cpal::PauseStreamError),

    /// The WAV recorder could not be created.
    #[error("failed to create WAV recording: {0}")]
    Recording(#[from] hound::Error),
}

/// Errors that can occur while resizing one image.
#[derive(Debug, Error)]
pub enum ResizeError {
    /// The source file could not be read.
    #[error("failed to read {path:?}: {source}")]
    Read {
        /// File that failed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Neither the content nor the extension identify an image format.
    #[error("unrecognized image format for {0:?}")]
    UnknownFormat(PathBuf),

    /// The image bytes could not be decoded.
    #[error("failed to decode image: {0}")]
    Decode(#[source] image::ImageError),

    /// The resized image could not be encoded.
    #[error("failed to encode resized image: {0}")]
    Encode(#[source] image::ImageError),

    /// The bounding box has a zero dimension.
    #[error("bounding box must be non-empty, got {width}x{height}")]
    EmptyBounds {
        /// Requested box width.
        width: u32,
        /// Requested box height.
        height: u32,
    },
}

/// Errors from the beat scheduler.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Tempo must be strictly positive.
    #[error("BPM must be greater than zero, got {0}")]
    InvalidBpm(u32),

    /// The timer thread could not be spawned.
    #[error("failed to spawn timer thread: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Errors that can occur while collecting an image set.
#[derive(Debug, Error)]
pub enum ImageSetError {
    /// A directory could not be listed.
    #[error("failed to read directory {path:?}: {source}")]
    ReadDir {
        /// Directory that failed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Errors from the wgpu renderer.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Surface creation failed.
    #[error("failed to create surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),

    /// No adapter can present to the window.
    #[error("failed to find suitable GPU adapter")]
    NoAdapter,

    /// Device request failed.
    #[error("failed to request device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),

    /// A displayed blob could not be decoded for upload.
    #[error("failed to decode image for display: {0}")]
    Decode(#[from] image::ImageError),
}
