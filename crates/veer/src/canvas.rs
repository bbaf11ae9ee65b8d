//! The canvas/frame positioning shell.
//!
//! A [`Canvas`] owns two elements: the viewport *frame* and the inner
//! scrollable *canvas* every render is attached under. It sizes the canvas
//! to the laid-out content under the layout's
//! [`CanvasBoundsOptions`](crate::layout::CanvasBoundsOptions) policy and
//! announces the result on the bus. Frame resizes arrive in bursts from the
//! host, so they are debounced before the host re-runs layout.

use std::sync::Arc;
use std::time::Instant;

use veer_core::logging::targets;
use veer_core::{Debouncer, EventBus};

use crate::dom::{Dom, ElementId};
use crate::events::CanvasEvent;
use crate::geometry::{Rect, Size};
use crate::layout::{CanvasBoundsOptions, LayoutContext};

/// The viewport frame and its inner scrollable canvas.
pub struct Canvas {
    frame: ElementId,
    canvas: ElementId,
    resize_debounce: Debouncer,
    events: Arc<EventBus<CanvasEvent>>,
}

impl Canvas {
    /// Create the frame and canvas elements at the given viewport rect.
    pub fn new(
        frame_rect: Rect,
        resize_wait: std::time::Duration,
        dom: &mut dyn Dom,
        events: Arc<EventBus<CanvasEvent>>,
    ) -> Self {
        let frame = dom.create_element("frame");
        dom.set_position(frame, frame_rect.origin);
        dom.set_size(frame, frame_rect.size);

        let canvas = dom.create_element("canvas");
        dom.set_size(canvas, frame_rect.size);
        dom.append_child(frame, canvas);

        Self {
            frame,
            canvas,
            resize_debounce: Debouncer::new(resize_wait),
            events,
        }
    }

    /// The viewport frame element.
    #[inline]
    pub fn frame(&self) -> ElementId {
        self.frame
    }

    /// The scrollable canvas element renders attach under.
    #[inline]
    pub fn canvas(&self) -> ElementId {
        self.canvas
    }

    /// The layout context for the current geometry.
    pub fn layout_context(&self, dom: &dyn Dom, visible_count: usize) -> LayoutContext {
        LayoutContext {
            frame: dom.rect(self.frame),
            canvas: self.canvas,
            visible_count,
        }
    }

    /// Record a host-reported frame resize; the debounce window restarts.
    pub fn frame_resized(&mut self, size: Size, now: Instant, dom: &mut dyn Dom) {
        dom.set_size(self.frame, size);
        self.resize_debounce.trigger_at(now);
    }

    /// Whether the debounced resize has settled. Fires once per burst; the
    /// host reacts by re-running layout and [`resize_to_content`](Self::resize_to_content).
    pub fn poll_resize(&mut self, now: Instant) -> bool {
        self.resize_debounce.poll(now)
    }

    /// Size the canvas to the laid-out content under the given policy and
    /// publish [`CanvasEvent::FrameBoundsChanged`].
    ///
    /// Margins extend past the content's far edges. Overflow prevention
    /// clamps the canvas to the frame. Scrollbar prevention additionally
    /// keeps an axis short of the frame edge by `scrollbar_size` when the
    /// other axis overflows, so the host document shows no scrollbar there.
    pub fn resize_to_content(
        &self,
        content: Rect,
        options: &CanvasBoundsOptions,
        dom: &mut dyn Dom,
    ) -> Rect {
        let frame_rect = dom.rect(self.frame);
        let mut width = content.right() + options.margin_right;
        let mut height = content.bottom() + options.margin_bottom;

        if options.prevent_overflow_horizontal {
            width = width.min(frame_rect.width());
        }
        if options.prevent_overflow_vertical {
            height = height.min(frame_rect.height());
        }
        if options.prevent_scrollbar_horizontal {
            let mut available = frame_rect.width();
            if height > frame_rect.height() {
                // A vertical scrollbar eats horizontal space.
                available -= options.scrollbar_size;
            }
            width = width.min(available);
        }
        if options.prevent_scrollbar_vertical {
            let mut available = frame_rect.height();
            if width > frame_rect.width() {
                available -= options.scrollbar_size;
            }
            height = height.min(available);
        }

        let size = Size::new(width.max(0.0), height.max(0.0));
        dom.set_size(self.canvas, size);
        let bounds = dom.rect(self.canvas);
        tracing::debug!(
            target: targets::CANVAS,
            width = bounds.width(),
            height = bounds.height(),
            "canvas resized"
        );
        self.events.publish(CanvasEvent::FrameBoundsChanged { bounds });
        bounds
    }
}
