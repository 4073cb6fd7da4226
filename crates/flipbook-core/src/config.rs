//! Viewer configuration
//!
//! Every tunable the viewer uses lives here. The whole tree deserializes from
//! JSON with per-field defaults, so callers only need to supply overrides.

use crate::error::FlipbookError;
use serde::{Deserialize, Serialize};

/// Top-level viewer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlipbookConfig {
    /// Location of the PDF, relative to the hosting page
    pub pdf_url: String,
    pub raster: RasterConfig,
    pub layout: LayoutConfig,
    pub gesture: GestureConfig,
    pub zoom: ZoomConfig,
    pub flip: FlipSettings,
    pub timing: TimingConfig,
    pub share: ShareConfig,
}

impl Default for FlipbookConfig {
    fn default() -> Self {
        Self {
            pdf_url: "./assets/magazine.pdf".to_string(),
            raster: RasterConfig::default(),
            layout: LayoutConfig::default(),
            gesture: GestureConfig::default(),
            zoom: ZoomConfig::default(),
            flip: FlipSettings::default(),
            timing: TimingConfig::default(),
            share: ShareConfig::default(),
        }
    }
}

impl FlipbookConfig {
    /// Parse a (possibly partial) JSON configuration and validate it
    pub fn from_json(json: &str) -> Result<Self, FlipbookError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| FlipbookError::InvalidConfig(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject ranges that would make the clamping math meaningless
    pub fn validate(&self) -> Result<(), FlipbookError> {
        if self.pdf_url.trim().is_empty() {
            return Err(FlipbookError::InvalidConfig("pdf_url is empty".to_string()));
        }

        let r = &self.raster;
        check_range("raster target height", r.min_target_height, r.max_target_height)?;
        if r.min_target_height <= 0.0 {
            return Err(FlipbookError::InvalidConfig(
                "raster min_target_height must be positive".to_string(),
            ));
        }
        if r.viewport_height_fraction <= 0.0 {
            return Err(FlipbookError::InvalidConfig(
                "raster viewport_height_fraction must be positive".to_string(),
            ));
        }
        check_range("fine pointer density", r.min_density, r.max_density_fine)?;
        check_range("coarse pointer density", r.min_density, r.max_density_coarse)?;

        if self.layout.landscape_threshold <= 1.0 {
            return Err(FlipbookError::InvalidConfig(format!(
                "landscape_threshold must be greater than 1 (got {})",
                self.layout.landscape_threshold
            )));
        }

        let g = &self.gesture;
        check_range("gesture scale", g.min_scale, g.max_scale)?;
        if g.min_scale <= 0.0 {
            return Err(FlipbookError::InvalidConfig(
                "gesture min_scale must be positive".to_string(),
            ));
        }
        if g.zoom_lock_threshold < 1.0 {
            return Err(FlipbookError::InvalidConfig(
                "gesture zoom_lock_threshold must be at least 1".to_string(),
            ));
        }

        let z = &self.zoom;
        check_range("zoom", z.min, z.max)?;
        if z.step <= 0.0 {
            return Err(FlipbookError::InvalidConfig(
                "zoom step must be positive".to_string(),
            ));
        }
        if z.initial < z.min || z.initial > z.max {
            return Err(FlipbookError::InvalidConfig(format!(
                "initial zoom {} outside [{}, {}]",
                z.initial, z.min, z.max
            )));
        }

        let f = &self.flip;
        check_range("flip width", f.min_width, f.max_width)?;
        check_range("flip height", f.min_height, f.max_height)?;

        Ok(())
    }
}

fn check_range(name: &str, min: f64, max: f64) -> Result<(), FlipbookError> {
    if !min.is_finite() || !max.is_finite() || min > max {
        return Err(FlipbookError::InvalidConfig(format!(
            "{} range is invalid: [{}, {}]",
            name, min, max
        )));
    }
    Ok(())
}

/// Page rasterization settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RasterConfig {
    /// Share of the viewport height a page may occupy
    pub viewport_height_fraction: f64,
    pub min_target_height: f64,
    pub max_target_height: f64,
    pub min_density: f64,
    /// Upper density bound for mouse/trackpad pointers
    pub max_density_fine: f64,
    /// Upper density bound for touch pointers
    pub max_density_coarse: f64,
    /// Opaque fill painted before each page render
    pub background: String,
}

impl Default for RasterConfig {
    fn default() -> Self {
        Self {
            viewport_height_fraction: 0.86,
            min_target_height: 320.0,
            max_target_height: 1600.0,
            min_density: 1.0,
            max_density_fine: 2.0,
            max_density_coarse: 1.5,
            background: "#ffffff".to_string(),
        }
    }
}

/// Display sequence settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Width/height ratio above which an inner page is split in two
    pub landscape_threshold: f64,
    pub split_landscape: bool,
    /// Prepend a blank page so page 1 sits on the right like a cover
    pub leading_cover_blank: bool,
    pub pad_to_even: bool,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            landscape_threshold: 1.05,
            split_landscape: true,
            leading_cover_blank: true,
            pad_to_even: true,
        }
    }
}

/// Pinch/pan settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    pub enabled: bool,
    pub min_scale: f64,
    pub max_scale: f64,
    /// Above this scale one-finger drags pan instead of flipping
    pub zoom_lock_threshold: f64,
    /// At or below this scale a finished gesture snaps back to identity
    pub reset_threshold: f64,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_scale: 1.0,
            max_scale: 4.0,
            zoom_lock_threshold: 1.02,
            reset_threshold: 1.01,
        }
    }
}

/// Manual zoom buttons
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoomConfig {
    pub min: f64,
    pub max: f64,
    pub step: f64,
    pub initial: f64,
}

impl Default for ZoomConfig {
    fn default() -> Self {
        Self {
            min: 0.75,
            max: 1.75,
            step: 0.15,
            initial: 1.0,
        }
    }
}

impl ZoomConfig {
    pub fn clamp(&self, level: f64) -> f64 {
        if !level.is_finite() {
            return self.initial;
        }
        level.clamp(self.min, self.max)
    }
}

/// How the flip widget sizes itself
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeMode {
    /// Pages keep the rendered size; a resize needs new bitmaps
    Fixed,
    /// The widget scales pages to its container; a resize only needs a layout refresh
    Stretch,
}

/// Settings handed to the page-flip widget
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlipSettings {
    pub size: SizeMode,
    pub min_width: f64,
    pub max_width: f64,
    pub min_height: f64,
    pub max_height: f64,
    pub show_cover: bool,
    pub draw_shadow: bool,
    pub max_shadow_opacity: f64,
    pub swipe_distance: f64,
    pub flipping_time: u32,
    pub use_mouse_events: bool,
    /// Clicking near a page corner turns the page
    pub click_to_flip: bool,
    pub mobile_scroll_support: bool,
    /// Viewports at or below this width show one page at a time
    pub portrait_max_width: f64,
}

impl Default for FlipSettings {
    fn default() -> Self {
        Self {
            size: SizeMode::Fixed,
            min_width: 320.0,
            max_width: 2000.0,
            min_height: 420.0,
            max_height: 2000.0,
            show_cover: true,
            draw_shadow: true,
            max_shadow_opacity: 0.35,
            swipe_distance: 30.0,
            flipping_time: 700,
            use_mouse_events: true,
            click_to_flip: true,
            mobile_scroll_support: true,
            portrait_max_width: 740.0,
        }
    }
}

impl FlipSettings {
    pub fn use_portrait(&self, viewport_width: f64) -> bool {
        viewport_width <= self.portrait_max_width
    }
}

/// Debounce and toast delays, in milliseconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub resize_debounce_ms: i32,
    pub orientation_refresh_ms: Vec<i32>,
    pub share_toast_ms: i32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            resize_debounce_ms: 180,
            orientation_refresh_ms: vec![120, 520],
            share_toast_ms: 900,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShareConfig {
    pub title: String,
    pub text: String,
}

impl Default for ShareConfig {
    fn default() -> Self {
        Self {
            title: "Event Magazine".to_string(),
            text: "Check out this magazine.".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config_is_valid() {
        assert!(FlipbookConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = FlipbookConfig::from_json(
            r#"{"pdf_url": "./book.pdf", "layout": {"landscape_threshold": 1.1}}"#,
        )
        .unwrap();

        assert_eq!(config.pdf_url, "./book.pdf");
        assert_eq!(config.layout.landscape_threshold, 1.1);
        assert!(config.layout.leading_cover_blank);
        assert_eq!(config.gesture, GestureConfig::default());
    }

    #[test]
    fn test_size_mode_is_lowercase() {
        let config = FlipbookConfig::from_json(r#"{"flip": {"size": "stretch"}}"#).unwrap();
        assert_eq!(config.flip.size, SizeMode::Stretch);
    }

    #[test]
    fn test_rejects_inverted_gesture_range() {
        let result = FlipbookConfig::from_json(r#"{"gesture": {"min_scale": 3, "max_scale": 2}}"#);
        assert!(matches!(result, Err(FlipbookError::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_threshold_not_above_one() {
        let result = FlipbookConfig::from_json(r#"{"layout": {"landscape_threshold": 0.9}}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_initial_zoom_outside_range() {
        let result = FlipbookConfig::from_json(r#"{"zoom": {"initial": 3.0}}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_malformed_json() {
        let result = FlipbookConfig::from_json("{not json");
        assert!(matches!(result, Err(FlipbookError::InvalidConfig(_))));
    }

    #[test]
    fn test_zoom_clamp_handles_nan() {
        let zoom = ZoomConfig::default();
        assert_eq!(zoom.clamp(f64::NAN), 1.0);
        assert_eq!(zoom.clamp(5.0), 1.75);
        assert_eq!(zoom.clamp(0.1), 0.75);
    }

    #[test]
    fn test_use_portrait_breakpoint() {
        let flip = FlipSettings::default();
        assert!(flip.use_portrait(740.0));
        assert!(!flip.use_portrait(741.0));
    }
}
