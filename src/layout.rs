//! Screen layout: container framing, image placement and the beat indicator.
//!
//! All rectangles are in window pixels with the origin at the top-left.

use glam::Vec2;

use crate::params::AspectRatio;

/// Axis-aligned rectangle in window pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect {
    pub fn from_center_size(center: Vec2, size: Vec2) -> Self {
        Self {
            min: center - size * 0.5,
            max: center + size * 0.5,
        }
    }

    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// Convert to normalized device coordinates `[left, top, right, bottom]`
    pub fn to_ndc(&self, window: Vec2) -> [f32; 4] {
        let to_ndc = |p: Vec2| Vec2::new(p.x / window.x * 2.0 - 1.0, 1.0 - p.y / window.y * 2.0);
        let top_left = to_ndc(self.min);
        let bottom_right = to_ndc(self.max);
        [top_left.x, top_left.y, bottom_right.x, bottom_right.y]
    }
}

/// Slideshow container: full window width, height from the aspect padding
///
/// When the padded height does not fit the window, the container shrinks
/// to the window height at the same ratio. Centered either way.
pub fn container_rect(window: Vec2, aspect: AspectRatio) -> Rect {
    let mut size = Vec2::new(window.x, window.x * aspect.padding_percent() / 100.0);
    if size.y > window.y {
        size *= window.y / size.y;
    }
    Rect::from_center_size(window * 0.5, size)
}

/// Place an image at its pixel size, centered, shrunk only to fit `container`
pub fn image_rect(container: Rect, image: Vec2) -> Rect {
    let available = container.size();
    let scale = (available.x / image.x).min(available.y / image.y).min(1.0);
    Rect::from_center_size(container.center(), image * scale)
}

/// Square indicator in the top-left corner
pub fn indicator_rect(size_px: f32, margin_px: f32) -> Rect {
    Rect {
        min: Vec2::splat(margin_px),
        max: Vec2::splat(margin_px + size_px),
    }
}
