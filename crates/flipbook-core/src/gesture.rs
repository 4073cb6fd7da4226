//! Pinch-zoom and pan over the flip viewer
//!
//! Touch input is reduced to a small state machine keyed on how many fingers
//! are down. The output is a single translate + scale transform applied to
//! the viewer container. While zoomed in, one-finger drags belong to this
//! controller so the flip widget never sees them as page swipes.

use crate::config::GestureConfig;
use serde::Serialize;
use tracing::debug;

/// One contact point in client (viewport) CSS pixels.
///
/// The controller only works with differences between points, so the
/// container's position on the page never enters the math.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TouchPoint {
    pub x: f64,
    pub y: f64,
}

impl TouchPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    fn distance(a: TouchPoint, b: TouchPoint) -> f64 {
        ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt()
    }

    fn midpoint(a: TouchPoint, b: TouchPoint) -> TouchPoint {
        TouchPoint::new((a.x + b.x) * 0.5, (a.y + b.y) * 0.5)
    }
}

/// Translate-then-scale transform
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Transform {
    pub scale: f64,
    pub tx: f64,
    pub ty: f64,
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        scale: 1.0,
        tx: 0.0,
        ty: 0.0,
    };

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    /// Value for the CSS `transform` property
    pub fn to_css(&self) -> String {
        format!(
            "translate({:.2}px, {:.2}px) scale({:.4})",
            self.tx, self.ty, self.scale
        )
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GesturePhase {
    Idle,
    Pinching {
        start_distance: f64,
        start_mid: TouchPoint,
        start: Transform,
    },
    Panning {
        offset_x: f64,
        offset_y: f64,
    },
}

/// What the adapter should do with the platform event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TouchResponse {
    /// Stop the event from reaching the flip widget and the browser
    pub consumed: bool,
    /// The transform changed and must be re-applied
    pub changed: bool,
}

/// Screen rectangle of the viewer, for the page-level pinch guard
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ViewerBounds {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl ViewerBounds {
    pub fn contains(&self, point: TouchPoint) -> bool {
        point.x >= self.left
            && point.x <= self.left + self.width
            && point.y >= self.top
            && point.y <= self.top + self.height
    }

    /// Whether the browser's own pinch-zoom must be suppressed for this input.
    /// Multi-finger input and ctrl+wheel are blocked unless every point lies
    /// inside the viewer, where the gesture controller takes over.
    pub fn blocks_native_zoom(&self, points: &[TouchPoint], ctrl_wheel: bool) -> bool {
        if !ctrl_wheel && points.len() < 2 {
            return false;
        }
        points.is_empty() || !points.iter().all(|p| self.contains(*p))
    }
}

#[derive(Debug, Clone)]
pub struct GestureController {
    config: GestureConfig,
    transform: Transform,
    phase: GesturePhase,
    container_width: f64,
    container_height: f64,
}

impl GestureController {
    pub fn new(config: GestureConfig) -> Self {
        Self {
            config,
            transform: Transform::IDENTITY,
            phase: GesturePhase::Idle,
            container_width: 0.0,
            container_height: 0.0,
        }
    }

    pub fn transform(&self) -> Transform {
        self.transform
    }

    pub fn phase(&self) -> GesturePhase {
        self.phase
    }

    pub fn is_zoomed(&self) -> bool {
        self.transform.scale > self.config.zoom_lock_threshold
    }

    pub fn set_container_size(&mut self, width: f64, height: f64) {
        self.container_width = width.max(0.0);
        self.container_height = height.max(0.0);
        self.clamp_translate();
    }

    /// Back to identity and idle
    pub fn reset(&mut self) {
        if !self.transform.is_identity() {
            debug!(scale = self.transform.scale, "gesture reset to identity");
        }
        self.transform = Transform::IDENTITY;
        self.phase = GesturePhase::Idle;
    }

    pub fn touch_start(&mut self, touches: &[TouchPoint]) -> TouchResponse {
        if !self.config.enabled {
            return TouchResponse::default();
        }

        match touches {
            [a, b, ..] => {
                self.phase = GesturePhase::Pinching {
                    start_distance: TouchPoint::distance(*a, *b),
                    start_mid: TouchPoint::midpoint(*a, *b),
                    start: self.transform,
                };
                TouchResponse {
                    consumed: true,
                    changed: false,
                }
            }
            [finger] if self.is_zoomed() => {
                self.phase = GesturePhase::Panning {
                    offset_x: finger.x - self.transform.tx,
                    offset_y: finger.y - self.transform.ty,
                };
                TouchResponse {
                    consumed: true,
                    changed: false,
                }
            }
            _ => TouchResponse::default(),
        }
    }

    pub fn touch_move(&mut self, touches: &[TouchPoint]) -> TouchResponse {
        if !self.config.enabled {
            return TouchResponse::default();
        }

        match (self.phase, touches) {
            (
                GesturePhase::Pinching {
                    start_distance,
                    start_mid,
                    start,
                },
                [a, b, ..],
            ) => {
                let ratio = if start_distance > f64::EPSILON {
                    TouchPoint::distance(*a, *b) / start_distance
                } else {
                    1.0
                };
                let mid = TouchPoint::midpoint(*a, *b);
                self.transform.scale = self.clamp_scale(start.scale * ratio);
                self.transform.tx = start.tx + (mid.x - start_mid.x);
                self.transform.ty = start.ty + (mid.y - start_mid.y);
                self.clamp_translate();
                TouchResponse {
                    consumed: true,
                    changed: true,
                }
            }
            (GesturePhase::Panning { offset_x, offset_y }, [finger, ..]) => {
                self.transform.tx = finger.x - offset_x;
                self.transform.ty = finger.y - offset_y;
                self.clamp_translate();
                TouchResponse {
                    consumed: true,
                    changed: true,
                }
            }
            _ => TouchResponse {
                consumed: self.is_zoomed() && !touches.is_empty(),
                changed: false,
            },
        }
    }

    /// `remaining` is the set of fingers still down after the lift
    pub fn touch_end(&mut self, remaining: &[TouchPoint]) -> TouchResponse {
        if !self.config.enabled {
            return TouchResponse::default();
        }

        let was_active = self.phase != GesturePhase::Idle;
        match self.phase {
            GesturePhase::Pinching { .. } if remaining.len() < 2 => {
                self.phase = GesturePhase::Idle;
            }
            GesturePhase::Panning { .. } if remaining.is_empty() => {
                self.phase = GesturePhase::Idle;
            }
            _ => {}
        }

        let mut changed = false;
        if self.phase == GesturePhase::Idle && self.transform.scale <= self.config.reset_threshold {
            changed = !self.transform.is_identity();
            self.transform = Transform::IDENTITY;
        }

        TouchResponse {
            consumed: was_active,
            changed,
        }
    }

    fn clamp_scale(&self, scale: f64) -> f64 {
        if !scale.is_finite() {
            return self.transform.scale;
        }
        scale.clamp(self.config.min_scale, self.config.max_scale)
    }

    fn clamp_translate(&mut self) {
        let max_x = (self.container_width * (self.transform.scale - 1.0) / 2.0).max(0.0);
        let max_y = (self.container_height * (self.transform.scale - 1.0) / 2.0).max(0.0);
        self.transform.tx = self.transform.tx.clamp(-max_x, max_x);
        self.transform.ty = self.transform.ty.clamp(-max_y, max_y);
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, Clone)]
    enum Step {
        Start(Vec<(f64, f64)>),
        Move(Vec<(f64, f64)>),
        End(Vec<(f64, f64)>),
    }

    fn points() -> impl Strategy<Value = Vec<(f64, f64)>> {
        proptest::collection::vec((-2000.0f64..2000.0, -2000.0f64..2000.0), 0..3)
    }

    fn step() -> impl Strategy<Value = Step> {
        prop_oneof![
            points().prop_map(Step::Start),
            points().prop_map(Step::Move),
            points().prop_map(Step::End),
        ]
    }

    fn to_points(raw: &[(f64, f64)]) -> Vec<TouchPoint> {
        raw.iter().map(|&(x, y)| TouchPoint::new(x, y)).collect()
    }

    proptest! {
        /// Property: any touch sequence keeps scale and translate inside their bounds
        #[test]
        fn transform_always_bounded(
            steps in proptest::collection::vec(step(), 1..40),
            width in 1.0f64..2000.0,
            height in 1.0f64..2000.0,
        ) {
            let config = GestureConfig::default();
            let mut c = GestureController::new(config.clone());
            c.set_container_size(width, height);

            for step in &steps {
                match step {
                    Step::Start(raw) => { c.touch_start(&to_points(raw)); }
                    Step::Move(raw) => { c.touch_move(&to_points(raw)); }
                    Step::End(raw) => { c.touch_end(&to_points(raw)); }
                }
                let t = c.transform();
                prop_assert!(t.scale >= config.min_scale && t.scale <= config.max_scale);
                let max_x = width * (t.scale - 1.0) / 2.0;
                let max_y = height * (t.scale - 1.0) / 2.0;
                prop_assert!(t.tx.abs() <= max_x + 1e-9);
                prop_assert!(t.ty.abs() <= max_y + 1e-9);
            }
        }

        /// Property: a gesture that ends at or below the snap threshold lands exactly on identity
        #[test]
        fn small_scale_snaps_back(end_distance in 100.0f64..101.0) {
            let mut c = GestureController::new(GestureConfig::default());
            c.set_container_size(800.0, 600.0);
            c.touch_start(&[TouchPoint::new(300.0, 300.0), TouchPoint::new(400.0, 300.0)]);
            c.touch_move(&[
                TouchPoint::new(300.0, 300.0),
                TouchPoint::new(300.0 + end_distance, 300.0),
            ]);
            c.touch_end(&[]);
            prop_assert_eq!(c.transform(), Transform::IDENTITY);
        }
    }
}
