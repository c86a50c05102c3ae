//! Display framing and resize bounding box parameters.

use std::fmt;
use std::str::FromStr;

/// Layout aspect ratio as a `width:height` pair (visual framing only)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AspectRatio {
    pub width: u32,
    pub height: u32,
}

impl AspectRatio {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width divided by height
    pub fn ratio(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    /// Container bottom padding as a percentage of its width (`100 / ratio`)
    pub fn padding_percent(&self) -> f32 {
        (1.0 / self.ratio()) * 100.0
    }
}

impl Default for AspectRatio {
    fn default() -> Self {
        ASPECT_PRESETS[0]
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.width, self.height)
    }
}

impl FromStr for AspectRatio {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s
            .split_once(':')
            .ok_or_else(|| format!("expected W:H, got '{}'", s))?;
        let width: u32 = w
            .trim()
            .parse()
            .map_err(|e| format!("bad aspect width '{}': {}", w, e))?;
        let height: u32 = h
            .trim()
            .parse()
            .map_err(|e| format!("bad aspect height '{}': {}", h, e))?;
        if width == 0 || height == 0 {
            return Err(format!("aspect terms must be > 0, got '{}'", s));
        }
        Ok(Self { width, height })
    }
}

/// Aspect presets offered by the selector, in cycling order
pub const ASPECT_PRESETS: [AspectRatio; 5] = [
    AspectRatio::new(16, 9),
    AspectRatio::new(4, 3),
    AspectRatio::new(3, 2),
    AspectRatio::new(1, 1),
    AspectRatio::new(9, 16),
];

/// Derived display configuration
///
/// `aspect_ratio` shapes the on-screen container; `max_width`/`max_height`
/// bound the pixel resize. The two are independent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayConfig {
    pub aspect_ratio: AspectRatio,

    /// Resize bounding box width (pixels, > 0)
    pub max_width: u32,

    /// Resize bounding box height (pixels, > 0)
    pub max_height: u32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            aspect_ratio: AspectRatio::default(),
            max_width: display_constants::DEFAULT_MAX_WIDTH,
            max_height: display_constants::DEFAULT_MAX_HEIGHT,
        }
    }
}

impl DisplayConfig {
    /// Resize bounding box
    pub fn bounds(&self) -> (u32, u32) {
        (self.max_width, self.max_height)
    }
}

/// Display constants
pub mod display_constants {
    /// Default resize box width (pixels)
    pub const DEFAULT_MAX_WIDTH: u32 = 1280;

    /// Default resize box height (pixels)
    pub const DEFAULT_MAX_HEIGHT: u32 = 720;

    /// Step for the max width/height keys (pixels)
    pub const DIMENSION_STEP: u32 = 50;

    /// Largest accepted box dimension (pixels)
    pub const MAX_DIMENSION: u32 = 16_384;
}
