//! Slideshow controller: one image step per beat.

use std::fs;
use std::path::{Path, PathBuf};

use image::ImageFormat;

use crate::errors::ImageSetError;
use crate::resize::{ImageBlob, ImageSource, ResizeOutcome, ResizeRequest};

/// Ordered image set with a wrapping cursor
#[derive(Debug, Clone, Default)]
pub struct ImageSet {
    images: Vec<ImageSource>,
    current_index: usize,
}

impl ImageSet {
    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Raw cursor; may exceed `len` right after a shorter set replaced a longer one
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    /// Image under the cursor (wrapped)
    pub fn current(&self) -> Option<&ImageSource> {
        if self.images.is_empty() {
            return None;
        }
        self.images.get(self.current_index % self.images.len())
    }

    pub fn images(&self) -> &[ImageSource] {
        &self.images
    }
}

/// Image shown on screen and the request that produced it
#[derive(Debug, Clone)]
pub struct DisplayedImage {
    pub request_id: u64,
    pub source: ImageSource,
    pub blob: ImageBlob,
}

/// Cycles through an [`ImageSet`], issuing resize requests
#[derive(Debug, Default)]
pub struct SlideshowController {
    set: ImageSet,
    next_request_id: u64,
    displayed: Option<DisplayedImage>,
}

impl SlideshowController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn images(&self) -> &ImageSet {
        &self.set
    }

    pub fn is_active(&self) -> bool {
        !self.set.is_empty()
    }

    pub fn displayed(&self) -> Option<&DisplayedImage> {
        self.displayed.as_ref()
    }

    /// Replace the whole set; the cursor is left for the next advance to wrap
    pub fn replace_images(&mut self, images: Vec<ImageSource>) {
        self.set.images = images;
    }

    /// Step to the next image and request it at `bounds`
    ///
    /// Increment first, then wrap, so a cursor left past the end of a
    /// shorter set lands back inside it.
    pub fn advance(&mut self, bounds: (u32, u32)) -> Option<ResizeRequest> {
        if self.set.is_empty() {
            return None;
        }
        self.set.current_index = (self.set.current_index + 1) % self.set.len();
        self.request_current(bounds)
    }

    /// Request the current image again, e.g. after the box changed
    pub fn refresh(&mut self, bounds: (u32, u32)) -> Option<ResizeRequest> {
        self.request_current(bounds)
    }

    fn request_current(&mut self, (max_width, max_height): (u32, u32)) -> Option<ResizeRequest> {
        let source = self.set.current()?.clone();
        self.next_request_id += 1;
        Some(ResizeRequest {
            id: self.next_request_id,
            source,
            max_width,
            max_height,
        })
    }

    /// Id of the most recently issued request (0 before any)
    pub fn latest_request_id(&self) -> u64 {
        self.next_request_id
    }

    /// Accept a finished request if it is newer than what is displayed
    ///
    /// Returns the blob to show, or `None` when the outcome is stale or
    /// carries no image.
    pub fn complete(&mut self, outcome: ResizeOutcome) -> Option<&ImageBlob> {
        if let Some(shown) = &self.displayed {
            if outcome.request_id <= shown.request_id {
                log::debug!(
                    "Dropping stale image {} (request {} <= shown {})",
                    outcome.source.name(),
                    outcome.request_id,
                    shown.request_id
                );
                return None;
            }
        }

        let blob = outcome.blob()?.clone();
        self.displayed = Some(DisplayedImage {
            request_id: outcome.request_id,
            source: outcome.source,
            blob,
        });
        self.displayed.as_ref().map(|d| &d.blob)
    }
}

/// Whether a path looks like an image the decoder handles
fn is_image_path(path: &Path) -> bool {
    ImageFormat::from_path(path)
        .map(|f| f.reading_enabled())
        .unwrap_or(false)
}

/// Expand files and directories into an image set
///
/// Directories contribute their image files sorted by name; explicit files
/// keep their order. Non-image files are skipped.
pub fn collect_image_sources(paths: &[PathBuf]) -> Result<Vec<ImageSource>, ImageSetError> {
    let mut sources = Vec::new();

    for path in paths {
        if path.is_dir() {
            let entries = fs::read_dir(path).map_err(|e| ImageSetError::ReadDir {
                path: path.clone(),
                source: e,
            })?;

            let mut found: Vec<PathBuf> = entries
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| p.is_file() && is_image_path(p))
                .collect();
            found.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
            sources.extend(found.into_iter().map(ImageSource::new));
        } else if is_image_path(path) {
            sources.push(ImageSource::new(path.clone()));
        } else {
            log::warn!("Skipping non-image file {}", path.display());
        }
    }

    Ok(sources)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resize::OutcomeImage;

    fn sources(n: usize) -> Vec<ImageSource> {
        (0..n)
            .map(|i| ImageSource::new(format!("img{}.png", i)))
            .collect()
    }

    fn outcome(request: &ResizeRequest, byte: u8) -> ResizeOutcome {
        ResizeOutcome {
            request_id: request.id,
            source: request.source.clone(),
            image: OutcomeImage::Resized {
                blob: ImageBlob {
                    bytes: vec![byte],
                    format: Some(ImageFormat::Png),
                },
                width: 1,
                height: 1,
            },
        }
    }

    #[test]
    fn test_advance_empty_is_noop() {
        let mut show = SlideshowController::new();
        assert!(show.advance((100, 100)).is_none());
        assert_eq!(show.images().current_index(), 0);
        assert_eq!(show.latest_request_id(), 0);
        assert!(show.displayed().is_none());
    }

    #[test]
    fn test_advance_full_cycle_returns_to_start() {
        let mut show = SlideshowController::new();
        show.replace_images(sources(4));
        show.advance((10, 10));
        let start = show.images().current_index();

        for _ in 0..4 {
            show.advance((10, 10));
        }
        assert_eq!(show.images().current_index(), start);
    }

    #[test]
    fn test_advance_requests_next_image() {
        let mut show = SlideshowController::new();
        show.replace_images(sources(3));

        let req = show.advance((640, 480)).unwrap();
        assert_eq!(req.source, ImageSource::new("img1.png"));
        assert_eq!((req.max_width, req.max_height), (640, 480));
        assert_eq!(req.id, 1);

        let req = show.advance((640, 480)).unwrap();
        assert_eq!(req.source, ImageSource::new("img2.png"));
        let req = show.advance((640, 480)).unwrap();
        assert_eq!(req.source, ImageSource::new("img0.png"));
        assert_eq!(req.id, 3);
    }

    #[test]
    fn test_shorter_set_wraps_on_next_advance() {
        let mut show = SlideshowController::new();
        show.replace_images(sources(5));
        for _ in 0..4 {
            show.advance((10, 10));
        }
        assert_eq!(show.images().current_index(), 4);

        show.replace_images(sources(2));
        // Cursor untouched by the replacement
        assert_eq!(show.images().current_index(), 4);

        // (4 + 1) % 2 == 1
        let req = show.advance((10, 10)).unwrap();
        assert_eq!(show.images().current_index(), 1);
        assert_eq!(req.source, ImageSource::new("img1.png"));
    }

    #[test]
    fn test_refresh_keeps_index() {
        let mut show = SlideshowController::new();
        show.replace_images(sources(3));
        show.advance((10, 10));

        let req = show.refresh((20, 30)).unwrap();
        assert_eq!(show.images().current_index(), 1);
        assert_eq!(req.source, ImageSource::new("img1.png"));
        assert_eq!((req.max_width, req.max_height), (20, 30));
    }

    #[test]
    fn test_stale_completion_is_dropped() {
        let mut show = SlideshowController::new();
        show.replace_images(sources(3));
        let first = show.advance((10, 10)).unwrap();
        let second = show.advance((10, 10)).unwrap();

        // Beat N+1 finishes before beat N
        assert!(show.complete(outcome(&second, 2)).is_some());
        assert!(show.complete(outcome(&first, 1)).is_none());

        let shown = show.displayed().unwrap();
        assert_eq!(shown.request_id, second.id);
        assert_eq!(shown.blob.bytes, vec![2]);
    }

    #[test]
    fn test_in_order_completions_all_display() {
        let mut show = SlideshowController::new();
        show.replace_images(sources(2));
        let a = show.advance((10, 10)).unwrap();
        let b = show.advance((10, 10)).unwrap();

        assert_eq!(show.complete(outcome(&a, 1)).unwrap().bytes, vec![1]);
        assert_eq!(show.complete(outcome(&b, 2)).unwrap().bytes, vec![2]);
    }

    #[test]
    fn test_unavailable_outcome_keeps_display() {
        let mut show = SlideshowController::new();
        show.replace_images(sources(2));
        let a = show.advance((10, 10)).unwrap();
        let b = show.advance((10, 10)).unwrap();
        show.complete(outcome(&a, 1));

        let missing = ResizeOutcome {
            request_id: b.id,
            source: b.source.clone(),
            image: OutcomeImage::Unavailable,
        };
        assert!(show.complete(missing).is_none());
        assert_eq!(show.displayed().unwrap().request_id, a.id);
    }

    #[test]
    fn test_collect_image_sources() {
        let tmp = tempfile::tempdir().unwrap();
        for name in ["b.png", "a.jpg", "notes.txt", "c.gif"] {
            fs::write(tmp.path().join(name), b"x").unwrap();
        }
        let extra = tmp.path().join("z.bmp");
        fs::write(&extra, b"x").unwrap();

        let found = collect_image_sources(&[tmp.path().to_path_buf()]).unwrap();
        let names: Vec<String> = found.iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["a.jpg", "b.png", "c.gif", "z.bmp"]);

        let explicit = collect_image_sources(&[
            tmp.path().join("notes.txt"),
            tmp.path().join("c.gif"),
        ])
        .unwrap();
        assert_eq!(explicit, vec![ImageSource::new(tmp.path().join("c.gif"))]);
    }

    #[test]
    fn test_collect_missing_directory_is_skipped_as_non_image() {
        let found = collect_image_sources(&[PathBuf::from("/no/such/dir")]).unwrap();
        assert!(found.is_empty());
    }
}
