//! Settings/display sync: control values to [`DisplayConfig`].

use std::str::FromStr;

use crate::params::{display_constants, AspectRatio, DisplayConfig, ASPECT_PRESETS};

/// Aspect selector value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AspectChoice {
    Preset(AspectRatio),

    /// Use the custom width/height pair
    Custom,
}

impl FromStr for AspectChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("custom") {
            Ok(AspectChoice::Custom)
        } else {
            s.parse().map(AspectChoice::Preset)
        }
    }
}

/// Raw control values as entered by the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayControls {
    pub aspect: AspectChoice,
    pub custom_width: u32,
    pub custom_height: u32,
    pub max_width: u32,
    pub max_height: u32,
}

impl Default for DisplayControls {
    fn default() -> Self {
        Self {
            aspect: AspectChoice::Preset(AspectRatio::default()),
            custom_width: 16,
            custom_height: 9,
            max_width: display_constants::DEFAULT_MAX_WIDTH,
            max_height: display_constants::DEFAULT_MAX_HEIGHT,
        }
    }
}

fn clamp_dimension(value: u32) -> u32 {
    value.clamp(1, display_constants::MAX_DIMENSION)
}

impl DisplayControls {
    /// Aspect ratio currently selected (custom terms clamped to >= 1)
    pub fn aspect_ratio(&self) -> AspectRatio {
        match self.aspect {
            AspectChoice::Preset(ratio) => ratio,
            AspectChoice::Custom => AspectRatio::new(
                clamp_dimension(self.custom_width),
                clamp_dimension(self.custom_height),
            ),
        }
    }

    /// Derive the display configuration; dimensions are clamped, not rejected
    pub fn to_config(&self) -> DisplayConfig {
        DisplayConfig {
            aspect_ratio: self.aspect_ratio(),
            max_width: clamp_dimension(self.max_width),
            max_height: clamp_dimension(self.max_height),
        }
    }

    /// Move the selector to the next preset, then custom, then back
    pub fn cycle_aspect(&mut self) {
        self.aspect = match self.aspect {
            AspectChoice::Preset(current) => {
                match ASPECT_PRESETS.iter().position(|p| *p == current) {
                    Some(i) if i + 1 < ASPECT_PRESETS.len() => {
                        AspectChoice::Preset(ASPECT_PRESETS[i + 1])
                    }
                    Some(_) => AspectChoice::Custom,
                    // A non-preset ratio from the command line
                    None => AspectChoice::Preset(ASPECT_PRESETS[0]),
                }
            }
            AspectChoice::Custom => AspectChoice::Preset(ASPECT_PRESETS[0]),
        };
    }

    pub fn adjust_max_width(&mut self, delta: i64) {
        self.max_width = step_dimension(self.max_width, delta);
    }

    pub fn adjust_max_height(&mut self, delta: i64) {
        self.max_height = step_dimension(self.max_height, delta);
    }

    pub fn adjust_custom_width(&mut self, delta: i64) {
        self.custom_width = step_dimension(self.custom_width, delta);
    }

    pub fn adjust_custom_height(&mut self, delta: i64) {
        self.custom_height = step_dimension(self.custom_height, delta);
    }

    /// Selector label for the window title
    pub fn aspect_label(&self) -> String {
        match self.aspect {
            AspectChoice::Preset(ratio) => ratio.to_string(),
            AspectChoice::Custom => format!("custom {}", self.aspect_ratio()),
        }
    }
}

fn step_dimension(value: u32, delta: i64) -> u32 {
    let stepped = (value as i64 + delta).clamp(1, display_constants::MAX_DIMENSION as i64);
    stepped as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_aspect_choice() {
        assert_eq!("custom".parse::<AspectChoice>().unwrap(), AspectChoice::Custom);
        assert_eq!(
            "4:3".parse::<AspectChoice>().unwrap(),
            AspectChoice::Preset(AspectRatio::new(4, 3))
        );
        assert!("wide".parse::<AspectChoice>().is_err());
    }

    #[test]
    fn test_custom_ratio_used_for_layout_only() {
        let controls = DisplayControls {
            aspect: AspectChoice::Custom,
            custom_width: 2,
            custom_height: 1,
            max_width: 300,
            max_height: 900,
        };
        let config = controls.to_config();
        assert_eq!(config.aspect_ratio, AspectRatio::new(2, 1));
        assert!((config.aspect_ratio.padding_percent() - 50.0).abs() < 1e-4);
        // Box is independent of the ratio
        assert_eq!(config.bounds(), (300, 900));
    }

    #[test]
    fn test_dimensions_clamped_positive() {
        let controls = DisplayControls {
            aspect: AspectChoice::Custom,
            custom_width: 0,
            custom_height: 0,
            max_width: 0,
            max_height: 0,
        };
        let config = controls.to_config();
        assert_eq!(config.bounds(), (1, 1));
        assert_eq!(config.aspect_ratio, AspectRatio::new(1, 1));
    }

    #[test]
    fn test_cycle_aspect_through_presets_and_custom() {
        let mut controls = DisplayControls::default();
        let mut seen = vec![controls.aspect];
        for _ in 0..ASPECT_PRESETS.len() {
            controls.cycle_aspect();
            seen.push(controls.aspect);
        }
        assert_eq!(*seen.last().unwrap(), AspectChoice::Custom);
        controls.cycle_aspect();
        assert_eq!(controls.aspect, AspectChoice::Preset(ASPECT_PRESETS[0]));
    }

    #[test]
    fn test_custom_pair_edits_change_ratio_not_box() {
        let mut controls = DisplayControls {
            aspect: AspectChoice::Custom,
            ..DisplayControls::default()
        };
        let before = controls.to_config();
        assert_eq!(before.aspect_ratio, AspectRatio::new(16, 9));

        controls.adjust_custom_width(5);
        controls.adjust_custom_height(-8);
        let after = controls.to_config();

        assert_eq!(after.aspect_ratio, AspectRatio::new(21, 1));
        assert_eq!(after.bounds(), before.bounds());
        assert_eq!(controls.aspect_label(), "custom 21:1");

        // Never below 1
        controls.adjust_custom_height(-5);
        assert_eq!(controls.custom_height, 1);
    }

    #[test]
    fn test_adjust_dimensions() {
        let mut controls = DisplayControls::default();
        controls.adjust_max_width(-50);
        assert_eq!(controls.max_width, display_constants::DEFAULT_MAX_WIDTH - 50);
        controls.adjust_max_height(-100_000);
        assert_eq!(controls.max_height, 1);
    }
}
