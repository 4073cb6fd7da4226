//! Bindings for the St.PageFlip widget
//!
//! The widget is loaded as a global script, so these bind straight to the
//! `St` namespace rather than going through the bridge module.

use flipbook_core::{FlipSettings, PageSize, SizeMode};
use js_sys::{Array, Function, Reflect};
use serde::Serialize;
use wasm_bindgen::prelude::*;
use web_sys::HtmlElement;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = St)]
    #[derive(Debug, Clone)]
    pub type PageFlip;

    #[wasm_bindgen(constructor, js_namespace = St, catch)]
    fn new(container: &HtmlElement, settings: &JsValue) -> Result<PageFlip, JsValue>;

    #[wasm_bindgen(method, js_name = loadFromHTML, catch)]
    fn load_from_html(this: &PageFlip, items: &Array) -> Result<(), JsValue>;

    #[wasm_bindgen(method)]
    fn on(this: &PageFlip, event: &str, callback: &Function);

    #[wasm_bindgen(method, js_name = flipNext)]
    pub fn flip_next(this: &PageFlip);

    #[wasm_bindgen(method, js_name = flipPrev)]
    pub fn flip_prev(this: &PageFlip);

    #[wasm_bindgen(method, js_name = getSettings)]
    fn settings(this: &PageFlip) -> JsValue;

    #[wasm_bindgen(method, catch)]
    fn update(this: &PageFlip) -> Result<(), JsValue>;

    #[wasm_bindgen(method, catch)]
    fn destroy(this: &PageFlip) -> Result<(), JsValue>;
}

/// Fallback leaf size when no page was rendered
const FALLBACK_PAGE: PageSize = PageSize {
    width: 550.0,
    height: 700.0,
};

/// Settings object in the shape St.PageFlip expects
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetSettings {
    pub width: u32,
    pub height: u32,
    pub size: SizeMode,
    pub min_width: f64,
    pub max_width: f64,
    pub min_height: f64,
    pub max_height: f64,
    pub show_cover: bool,
    pub mobile_scroll_support: bool,
    pub use_mouse_events: bool,
    pub swipe_distance: f64,
    pub start_page: u32,
    pub draw_shadow: bool,
    pub flipping_time: u32,
    pub max_shadow_opacity: f64,
    pub auto_size: bool,
    pub use_portrait: bool,
    pub disable_flip_by_click: bool,
}

impl WidgetSettings {
    pub fn new(
        flip: &FlipSettings,
        page_size: Option<PageSize>,
        start_page: usize,
        viewport_width: f64,
    ) -> Self {
        let page = page_size.unwrap_or(FALLBACK_PAGE);
        Self {
            width: page.width.round().max(1.0) as u32,
            height: page.height.round().max(1.0) as u32,
            size: flip.size,
            min_width: flip.min_width,
            max_width: flip.max_width,
            min_height: flip.min_height,
            max_height: flip.max_height,
            show_cover: flip.show_cover,
            mobile_scroll_support: flip.mobile_scroll_support,
            use_mouse_events: flip.use_mouse_events,
            swipe_distance: flip.swipe_distance,
            start_page: start_page as u32,
            draw_shadow: flip.draw_shadow,
            flipping_time: flip.flipping_time,
            max_shadow_opacity: flip.max_shadow_opacity,
            auto_size: true,
            use_portrait: flip.use_portrait(viewport_width),
            disable_flip_by_click: !flip.click_to_flip,
        }
    }
}

impl PageFlip {
    /// Build a widget over `container` and feed it the page elements
    pub fn create(
        container: &HtmlElement,
        settings: &WidgetSettings,
        pages: &Array,
    ) -> Result<PageFlip, JsValue> {
        let js_settings = serde_wasm_bindgen::to_value(settings)
            .map_err(|e| JsValue::from_str(&format!("Failed to serialize settings: {}", e)))?;
        let flip = PageFlip::new(container, &js_settings)?;
        flip.load_from_html(pages)?;
        Ok(flip)
    }

    /// Subscribe to page turns; the callback receives the new display index
    pub fn on_flip(&self, callback: &Closure<dyn FnMut(JsValue)>) {
        self.on("flip", callback.as_ref().unchecked_ref());
    }

    /// Re-measure the container, switching portrait mode if the viewport crossed the breakpoint
    pub fn refresh_layout(&self, use_portrait: bool) -> Result<(), JsValue> {
        let settings = self.settings();
        if settings.is_object() {
            Reflect::set(
                &settings,
                &JsValue::from_str("usePortrait"),
                &JsValue::from_bool(use_portrait),
            )?;
        }
        self.update()
    }

    pub fn teardown(&self) -> Result<(), JsValue> {
        self.destroy()
    }
}

/// Display index carried by a flip event (`event.data`)
pub fn flip_event_index(event: &JsValue) -> Option<usize> {
    Reflect::get(event, &JsValue::from_str("data"))
        .ok()
        .and_then(|data| data.as_f64())
        .filter(|index| *index >= 0.0)
        .map(|index| index as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_from_page_size() {
        let flip = FlipSettings::default();
        let settings = WidgetSettings::new(&flip, Some(PageSize::new(612.4, 792.6)), 3, 1200.0);

        assert_eq!(settings.width, 612);
        assert_eq!(settings.height, 793);
        assert_eq!(settings.start_page, 3);
        assert!(!settings.use_portrait);
        assert!(!settings.disable_flip_by_click);
        assert!(settings.show_cover);
    }

    #[test]
    fn test_settings_fallback_size_and_portrait() {
        let flip = FlipSettings {
            click_to_flip: false,
            ..FlipSettings::default()
        };
        let settings = WidgetSettings::new(&flip, None, 0, 500.0);

        assert_eq!((settings.width, settings.height), (550, 700));
        assert!(settings.use_portrait);
        assert!(settings.disable_flip_by_click);
    }

    #[test]
    fn test_settings_serialize_camel_case() {
        let settings = WidgetSettings::new(&FlipSettings::default(), None, 0, 1000.0);
        let json = serde_json::to_value(&settings).unwrap();

        assert_eq!(json["size"], "fixed");
        assert_eq!(json["showCover"], true);
        assert_eq!(json["flippingTime"], 700);
        assert_eq!(json["maxShadowOpacity"], 0.35);
        assert!(json.get("disableFlipByClick").is_some());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: the widget never receives a zero-sized leaf
        #[test]
        fn leaf_size_is_positive(w in 0.0f64..3000.0, h in 0.0f64..3000.0, vw in 200.0f64..2500.0) {
            let settings = WidgetSettings::new(&FlipSettings::default(), Some(PageSize::new(w, h)), 0, vw);
            prop_assert!(settings.width >= 1);
            prop_assert!(settings.height >= 1);
            prop_assert_eq!(settings.use_portrait, vw <= 740.0);
        }
    }
}
