//! Render sizing for PDF pages
//!
//! Works out how large a page should be drawn for the current viewport and how
//! many device pixels back each CSS pixel. The actual drawing happens in the
//! browser; this module only produces numbers.

use crate::config::RasterConfig;
use serde::{Deserialize, Serialize};

/// Page dimensions at scale 1.0 (PDF points for native sizes)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSize {
    pub width: f64,
    pub height: f64,
}

impl PageSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Width / height, or 0 for a degenerate page
    pub fn aspect_ratio(&self) -> f64 {
        if self.height <= 0.0 {
            return 0.0;
        }
        self.width / self.height
    }
}

/// Primary input device, as reported by the `(pointer: coarse)` media query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointerKind {
    Fine,
    Coarse,
}

/// Everything needed to allocate a surface and render one page into it
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RenderPlan {
    pub native: PageSize,
    /// CSS pixel size the page is displayed at
    pub display: PageSize,
    /// Scale passed to the renderer (display scale × density)
    pub render_scale: f64,
    pub pixel_width: u32,
    pub pixel_height: u32,
}

/// Display height for a page, from the viewport and the manual zoom level
pub fn target_height(viewport_height: f64, zoom: f64, config: &RasterConfig) -> f64 {
    let base = if viewport_height.is_finite() && viewport_height > 0.0 {
        viewport_height * config.viewport_height_fraction
    } else {
        config.min_target_height
    };
    let clamped = base.clamp(config.min_target_height, config.max_target_height);
    let zoom = if zoom.is_finite() && zoom > 0.0 { zoom } else { 1.0 };
    clamped * zoom
}

/// Device pixels per CSS pixel, capped lower on touch devices
pub fn density_factor(device_pixel_ratio: f64, pointer: PointerKind, config: &RasterConfig) -> f64 {
    let max = match pointer {
        PointerKind::Fine => config.max_density_fine,
        PointerKind::Coarse => config.max_density_coarse,
    };
    if !device_pixel_ratio.is_finite() {
        return config.min_density;
    }
    device_pixel_ratio.clamp(config.min_density, max)
}

/// Plan the render of a page whose scale-1 size is `native`
pub fn plan_render(
    native: PageSize,
    target_height: f64,
    density: f64,
) -> RenderPlan {
    let display_scale = if native.height > 0.0 {
        target_height / native.height
    } else {
        1.0
    };
    let display = PageSize::new(native.width * display_scale, native.height * display_scale);
    let render_scale = display_scale * density;

    RenderPlan {
        native,
        display,
        render_scale,
        pixel_width: (native.width * render_scale).floor().max(1.0) as u32,
        pixel_height: (native.height * render_scale).floor().max(1.0) as u32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> RasterConfig {
        RasterConfig::default()
    }

    #[test]
    fn test_aspect_ratio() {
        let letter = PageSize::new(612.0, 792.0);
        assert!((letter.aspect_ratio() - 0.7727).abs() < 0.001);
        assert_eq!(PageSize::new(10.0, 0.0).aspect_ratio(), 0.0);
    }

    #[test]
    fn test_target_height_clamps_to_range() {
        assert_eq!(target_height(100.0, 1.0, &config()), 320.0);
        assert_eq!(target_height(10_000.0, 1.0, &config()), 1600.0);
        assert!((target_height(1000.0, 1.0, &config()) - 860.0).abs() < 1e-9);
    }

    #[test]
    fn test_target_height_applies_zoom_after_clamp() {
        assert_eq!(target_height(10_000.0, 1.5, &config()), 2400.0);
        assert_eq!(target_height(0.0, 1.0, &config()), 320.0);
    }

    #[test]
    fn test_density_lower_for_coarse_pointer() {
        assert_eq!(density_factor(3.0, PointerKind::Fine, &config()), 2.0);
        assert_eq!(density_factor(3.0, PointerKind::Coarse, &config()), 1.5);
        assert_eq!(density_factor(0.5, PointerKind::Fine, &config()), 1.0);
        assert_eq!(density_factor(f64::NAN, PointerKind::Fine, &config()), 1.0);
    }

    #[test]
    fn test_plan_render_letter() {
        let plan = plan_render(PageSize::new(612.0, 792.0), 792.0 * 1.25, 2.0);

        assert!((plan.display.height - 990.0).abs() < 1e-9);
        assert!((plan.display.width - 765.0).abs() < 1e-9);
        assert!((plan.render_scale - 2.5).abs() < 1e-9);
        assert_eq!(plan.pixel_width, 1530);
        assert_eq!(plan.pixel_height, 1980);
    }

    #[test]
    fn test_plan_render_degenerate_page() {
        let plan = plan_render(PageSize::new(0.0, 0.0), 800.0, 1.0);
        assert_eq!(plan.pixel_width, 1);
        assert_eq!(plan.pixel_height, 1);
    }
}
