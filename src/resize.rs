//! Image resizing: fit within a bounding box, never upscale.
//!
//! Resizing happens off the UI thread in a [`ResizeWorker`]. Every request
//! carries an id from the slideshow's monotonic counter so the receiver can
//! tell fresh results from superseded ones.

use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;

use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};

use crate::errors::ResizeError;
use crate::events::EventSink;

/// A user-selected image file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSource {
    pub path: PathBuf,
}

impl ImageSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// File name for log messages
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// Encoded, display-ready image bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageBlob {
    pub bytes: Vec<u8>,

    /// Encoding of `bytes`, when known
    pub format: Option<ImageFormat>,
}

/// Fit `width`x`height` inside `max_width`x`max_height`
///
/// Width is bounded first, then the resulting height. Results are rounded to
/// whole pixels, at least 1, and never exceed the source size.
pub fn fit_within(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    let mut w = width as f64;
    let mut h = height as f64;

    if w > max_width as f64 {
        h *= max_width as f64 / w;
        w = max_width as f64;
    }

    if h > max_height as f64 {
        w *= max_height as f64 / h;
        h = max_height as f64;
    }

    let w = (w.round() as u32).max(1).min(width.max(1));
    let h = (h.round() as u32).max(1).min(height.max(1));
    (w, h)
}

/// Result of a successful resize
#[derive(Debug, Clone)]
pub struct ResizedImage {
    pub width: u32,
    pub height: u32,
    pub blob: ImageBlob,
}

/// Sniff the format from content, falling back to the extension
fn detect_format(bytes: &[u8], path: &Path) -> Option<ImageFormat> {
    image::guess_format(bytes)
        .ok()
        .or_else(|| ImageFormat::from_path(path).ok())
}

/// Decode, shrink to fit and re-encode one image
pub fn resize_image(
    source: &ImageSource,
    max_width: u32,
    max_height: u32,
) -> Result<ResizedImage, ResizeError> {
    if max_width == 0 || max_height == 0 {
        return Err(ResizeError::EmptyBounds {
            width: max_width,
            height: max_height,
        });
    }

    let bytes = fs::read(&source.path).map_err(|e| ResizeError::Read {
        path: source.path.clone(),
        source: e,
    })?;
    let format = detect_format(&bytes, &source.path)
        .ok_or_else(|| ResizeError::UnknownFormat(source.path.clone()))?;

    let image =
        image::load_from_memory_with_format(&bytes, format).map_err(ResizeError::Decode)?;
    let (width, height) = fit_within(image.width(), image.height(), max_width, max_height);

    let resized = if (width, height) == (image.width(), image.height()) {
        image
    } else {
        image.resize_exact(width, height, FilterType::Triangle)
    };

    let blob = encode_preserving_format(&resized, format)?;
    Ok(ResizedImage {
        width,
        height,
        blob,
    })
}

/// Encode in `format` where possible, otherwise as PNG
fn encode_preserving_format(
    image: &DynamicImage,
    format: ImageFormat,
) -> Result<ImageBlob, ResizeError> {
    if format.writing_enabled() {
        // JPEG has no alpha channel
        let converted;
        let to_write = if format == ImageFormat::Jpeg && image.color().has_alpha() {
            converted = DynamicImage::ImageRgb8(image.to_rgb8());
            &converted
        } else {
            image
        };

        let mut cursor = Cursor::new(Vec::new());
        match to_write.write_to(&mut cursor, format) {
            Ok(()) => {
                return Ok(ImageBlob {
                    bytes: cursor.into_inner(),
                    format: Some(format),
                })
            }
            Err(e) => log::debug!("Encoding as {:?} failed ({}), using PNG", format, e),
        }
    }

    let mut cursor = Cursor::new(Vec::new());
    image
        .write_to(&mut cursor, ImageFormat::Png)
        .map_err(ResizeError::Encode)?;
    Ok(ImageBlob {
        bytes: cursor.into_inner(),
        format: Some(ImageFormat::Png),
    })
}

/// One resize job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResizeRequest {
    /// Monotonic id assigned by the slideshow
    pub id: u64,
    pub source: ImageSource,
    pub max_width: u32,
    pub max_height: u32,
}

/// What a finished request produced
#[derive(Debug, Clone)]
pub enum OutcomeImage {
    /// Shrunk to fit the box
    Resized {
        blob: ImageBlob,
        width: u32,
        height: u32,
    },

    /// Resizing failed; the original bytes are shown instead
    Original(ImageBlob),

    /// Not even the original could be read
    Unavailable,
}

/// A finished resize request
#[derive(Debug, Clone)]
pub struct ResizeOutcome {
    pub request_id: u64,
    pub source: ImageSource,
    pub image: OutcomeImage,
}

impl ResizeOutcome {
    /// Blob to display, if any
    pub fn blob(&self) -> Option<&ImageBlob> {
        match &self.image {
            OutcomeImage::Resized { blob, .. } | OutcomeImage::Original(blob) => Some(blob),
            OutcomeImage::Unavailable => None,
        }
    }
}

/// Run one request, falling back to the original image on failure
pub fn run_request(request: &ResizeRequest) -> ResizeOutcome {
    let image = match resize_image(&request.source, request.max_width, request.max_height) {
        Ok(resized) => OutcomeImage::Resized {
            blob: resized.blob,
            width: resized.width,
            height: resized.height,
        },
        Err(e) => {
            log::error!("Error resizing image {}: {}", request.source.name(), e);
            match fs::read(&request.source.path) {
                Ok(bytes) => {
                    let format = detect_format(&bytes, &request.source.path);
                    OutcomeImage::Original(ImageBlob { bytes, format })
                }
                Err(e) => {
                    log::error!("Could not read {}: {}", request.source.name(), e);
                    OutcomeImage::Unavailable
                }
            }
        }
    };

    ResizeOutcome {
        request_id: request.id,
        source: request.source.clone(),
        image,
    }
}

/// Somewhere resize requests can be sent
pub trait ResizeDispatch {
    fn submit(&self, request: ResizeRequest);
}

/// Background thread running resize requests
///
/// When several requests are queued the worker skips straight to the newest.
pub struct ResizeWorker {
    jobs: Option<mpsc::Sender<ResizeRequest>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl ResizeWorker {
    /// Spawn the worker; outcomes are delivered to `sink`
    pub fn spawn<S: EventSink<ResizeOutcome>>(sink: S) -> std::io::Result<Self> {
        let (tx, rx) = mpsc::channel::<ResizeRequest>();

        let handle = thread::Builder::new()
            .name("image-resize".to_string())
            .spawn(move || {
                while let Ok(mut job) = rx.recv() {
                    while let Ok(newer) = rx.try_recv() {
                        log::debug!("Skipping superseded resize request {}", job.id);
                        job = newer;
                    }

                    let outcome = run_request(&job);
                    if !sink.send(outcome) {
                        return;
                    }
                }
            })?;

        Ok(Self {
            jobs: Some(tx),
            handle: Some(handle),
        })
    }
}

impl ResizeDispatch for ResizeWorker {
    fn submit(&self, request: ResizeRequest) {
        if let Some(jobs) = &self.jobs {
            if jobs.send(request).is_err() {
                log::warn!("Resize worker has stopped; request dropped");
            }
        }
    }
}

impl Drop for ResizeWorker {
    fn drop(&mut self) {
        // Closing the channel ends the worker loop
        self.jobs = None;
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
