//! The pluggable layout strategy contract.
//!
//! A [`Layout`] decides what each item looks like on the canvas: for every
//! item it produces zero or more render descriptors (target transform plus
//! animation parameters), and it supplies the policies the engine consults
//! around them — show/hide animations, loading opt-in, canvas bounds and
//! gesture configuration. The engine treats layouts as opaque strategy
//! objects; grid/stack/row/column variants are separate implementations of
//! this one trait selected by explicit construction.

use crate::dom::{Dom, ElementId};
use crate::geometry::{Point, Rect};
use crate::item::Item;
use crate::reconcile::Render;
use crate::style::{AnimateOptions, StyleValue, Transform};

/// One requested render: the target transform and how to animate into it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RenderDescriptor {
    pub transform: Transform,
    pub animate: AnimateOptions,
}

impl RenderDescriptor {
    /// A descriptor with the given transform and default animation.
    pub fn new(transform: Transform) -> Self {
        Self {
            transform,
            animate: AnimateOptions::default(),
        }
    }

    /// Set the animation options.
    pub fn with_animate(mut self, animate: AnimateOptions) -> Self {
        self.animate = animate;
        self
    }
}

/// What a layout wants drawn for one item.
///
/// The three shapes a layout may answer with: nothing, a single render, or
/// an ordered list. [`into_vec`](Self::into_vec) normalizes all three.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RenderPlan {
    /// The item has no renders under this layout.
    #[default]
    None,
    /// A single render.
    Single(RenderDescriptor),
    /// An ordered list of renders; the position in the list becomes the
    /// render id.
    Many(Vec<RenderDescriptor>),
}

impl RenderPlan {
    /// Normalize to a list.
    pub fn into_vec(self) -> Vec<RenderDescriptor> {
        match self {
            Self::None => Vec::new(),
            Self::Single(descriptor) => vec![descriptor],
            Self::Many(descriptors) => descriptors,
        }
    }
}

/// A decorative render not tied to any item (divider, label, ...).
///
/// The layout owns the element; the engine only animates it and folds its
/// completion into the custom-render cycle.
#[derive(Debug, Clone)]
pub struct CustomRenderDescriptor {
    pub element: ElementId,
    pub transform: Transform,
    pub animate: AnimateOptions,
}

/// Which gesture capabilities are enabled for an element or group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GestureOptions {
    pub pan_x: bool,
    pub pan_y: bool,
    pub swipe_x: bool,
    pub swipe_y: bool,
    pub tap: bool,
    pub press: bool,
    pub scroll: bool,
}

impl Default for GestureOptions {
    fn default() -> Self {
        Self {
            pan_x: true,
            pan_y: true,
            swipe_x: true,
            swipe_y: true,
            tap: true,
            press: true,
            scroll: false,
        }
    }
}

impl GestureOptions {
    /// Whether events of this kind should be processed at all.
    pub fn allows(&self, kind: crate::events::GestureKind) -> bool {
        use crate::events::GestureKind::*;
        match kind {
            PanStart | PanEnd | PanCancel => self.pan_x || self.pan_y,
            PanX => self.pan_x,
            PanY => self.pan_y,
            PanAny => self.pan_x || self.pan_y,
            SwipeX => self.swipe_x,
            SwipeY => self.swipe_y,
            SwipeAny => self.swipe_x || self.swipe_y,
            Tap => self.tap,
            Press => self.press,
            Scroll => self.scroll,
        }
    }
}

/// Gesture configuration a layout attaches to one render.
#[derive(Debug, Clone)]
pub struct RenderGestureOptions {
    /// Cohort id: renders sharing an id move together in one gesture group.
    pub group_id: String,
    /// Enabled capabilities for the group.
    pub gestures: GestureOptions,
    /// Motion tuning for the member engines.
    pub motion: crate::motion::MotionOptions,
}

/// Canvas sizing policy supplied by the layout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasBoundsOptions {
    /// Extra space kept right of the content.
    pub margin_right: f32,
    /// Extra space kept below the content.
    pub margin_bottom: f32,
    /// Clamp canvas width to the frame width.
    pub prevent_overflow_horizontal: bool,
    /// Clamp canvas height to the frame height.
    pub prevent_overflow_vertical: bool,
    /// Keep the canvas narrow enough that no horizontal scrollbar appears.
    pub prevent_scrollbar_horizontal: bool,
    /// Keep the canvas short enough that no vertical scrollbar appears.
    pub prevent_scrollbar_vertical: bool,
    /// Scrollbar thickness assumed by the prevent-scrollbar policies.
    pub scrollbar_size: f32,
}

impl Default for CanvasBoundsOptions {
    fn default() -> Self {
        Self {
            margin_right: 0.0,
            margin_bottom: 0.0,
            prevent_overflow_horizontal: false,
            prevent_overflow_vertical: false,
            prevent_scrollbar_horizontal: false,
            prevent_scrollbar_vertical: false,
            scrollbar_size: 16.0,
        }
    }
}

/// Context handed to layout callbacks.
#[derive(Debug, Clone, Copy)]
pub struct LayoutContext {
    /// The viewport frame rectangle.
    pub frame: Rect,
    /// The scrollable canvas element.
    pub canvas: ElementId,
    /// Number of items currently in view.
    pub visible_count: usize,
}

/// The layout strategy consumed by the reconciliation engine.
///
/// Only [`renders`](Self::renders) is required; every policy hook has a
/// conservative default so simple layouts stay small.
pub trait Layout {
    /// The renders this item should have right now.
    fn renders(&self, item: &Item, ctx: &LayoutContext) -> RenderPlan;

    /// Called once after a render's element is created, before the first
    /// animation toward its target.
    fn initialize_render(&self, _render: &Render, _dom: &mut dyn Dom) {}

    /// Load a render's content (it has become visible or was flagged).
    fn load_render(&self, _render: &Render, _dom: &mut dyn Dom) {}

    /// Unload a render's content.
    fn unload_render(&self, _render: &Render, _dom: &mut dyn Dom) {}

    /// Layout-driven loading opt-in; one of three independent load triggers.
    fn should_load_render(&self, _render: &Render) -> bool {
        false
    }

    /// Animation toward the visible state for newly-added renders.
    fn show_animation(&self) -> RenderDescriptor {
        RenderDescriptor::new(Transform::new().with("opacity", StyleValue::Number(1.0)))
    }

    /// Animation toward the hidden state used by the erase pipeline.
    fn hide_animation(&self) -> RenderDescriptor {
        RenderDescriptor::new(Transform::new().with("opacity", StyleValue::Number(0.0)))
    }

    /// Gesture capabilities of the canvas itself.
    fn canvas_gesture_options(&self) -> GestureOptions {
        GestureOptions::default()
    }

    /// Canvas sizing policy.
    fn canvas_bounds_options(&self) -> CanvasBoundsOptions {
        CanvasBoundsOptions::default()
    }

    /// Item-independent decorative renders for the current cycle.
    fn custom_renders(&self, _ctx: &LayoutContext, _dom: &mut dyn Dom) -> Vec<CustomRenderDescriptor> {
        Vec::new()
    }

    /// Gesture configuration for one render; `None` leaves it inert.
    fn render_gesture_options(&self, _render: &Render) -> Option<RenderGestureOptions> {
        None
    }

    /// Offsets applied when moving to align with a target element.
    fn move_to_element_offsets(&self, _element: ElementId, _dom: &dyn Dom) -> Point {
        Point::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_plan_normalization() {
        assert!(RenderPlan::None.into_vec().is_empty());
        assert_eq!(
            RenderPlan::Single(RenderDescriptor::default()).into_vec().len(),
            1
        );
        assert_eq!(
            RenderPlan::Many(vec![RenderDescriptor::default(); 3])
                .into_vec()
                .len(),
            3
        );
    }

    #[test]
    fn test_gesture_options_filtering() {
        use crate::events::GestureKind;

        let horizontal_only = GestureOptions {
            pan_y: false,
            swipe_y: false,
            ..GestureOptions::default()
        };
        assert!(horizontal_only.allows(GestureKind::PanX));
        assert!(!horizontal_only.allows(GestureKind::PanY));
        assert!(horizontal_only.allows(GestureKind::PanAny));
        assert!(!horizontal_only.allows(GestureKind::SwipeY));
        assert!(!horizontal_only.allows(GestureKind::Scroll));
    }
}
