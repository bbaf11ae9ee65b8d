//! The gesture-to-motion engine.
//!
//! One [`GestureMotion`] owns the positional state of a single element and
//! answers to the fixed gesture vocabulary in
//! [`GestureKind`](crate::events::GestureKind): pans follow the pointer,
//! swipes launch inertial moves, and settled movements are corrected by
//! snapping. Movement is either *positional* (the element's styled
//! top/left) or *scroll* (the container's scroll offsets).
//!
//! Every logical movement may span two independently-tweened axis
//! animations; the engine counts outstanding axis animations and treats the
//! counter's return to zero as the single movement-complete point, at which
//! snapping runs and [`CanvasEvent::MovementComplete`] is published.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use veer_core::logging::targets;
use veer_core::EventBus;

use crate::animator::{AnimationId, AnimationRequest};
use crate::context::EngineContext;
use crate::dom::{Dom, ElementId};
use crate::error::{Error, Result};
use crate::events::{CanvasEvent, GestureEvent, GestureKind};
use crate::geometry::{Point, Rect, Size};
use crate::style::{AnimateOptions, Easing, StyleValue, Transform};

/// How a gesture moves its element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MovementMode {
    /// Mutate the element's styled top/left.
    #[default]
    Positional,
    /// Mutate the container's scroll offsets.
    Scroll,
}

/// Corrective motion applied after a movement settles.
#[derive(Debug, Clone, Default)]
pub struct SnapOptions {
    /// Snap back inside the bounds rectangle.
    pub to_bounds: bool,
    /// Snap to the nearest visible child of the container carrying this
    /// class name. Takes precedence over [`to_bounds`](Self::to_bounds).
    pub to_nearest_child: Option<String>,
}

/// Tuning for one motion engine.
#[derive(Debug, Clone)]
pub struct MotionOptions {
    /// Movement mode.
    pub mode: MovementMode,
    /// Where the element may be positioned; `None` disables bounds logic.
    pub bounds: Option<Rect>,
    /// Apply linear resistance when pulled past the bounds.
    pub reduce_movement_at_bounds: bool,
    /// Never let the element's edge cross the bound edge.
    pub hard_stop_at_bounds: bool,
    /// Free overflow allowed before resistance kicks in, in px.
    pub distance_threshold: f32,
    /// Inertia distance multiplier (px of travel per px/ms of velocity);
    /// also the divisor for resisted overflow.
    pub distance_scale: f32,
    /// Inertia duration multiplier (ms per px/ms of velocity).
    pub duration_scale: f32,
    /// Duration of pointer-following pan frames.
    pub pan_duration_ms: f64,
    /// Duration of corrective and move-to-element animations.
    pub base_duration_ms: f64,
    /// Easing for inertial swipe animations.
    pub swipe_easing: Easing,
    /// Suppression window for pan signals immediately after a swipe.
    pub swipe_guard: Duration,
    /// Snapping configuration.
    pub snap: SnapOptions,
}

impl Default for MotionOptions {
    fn default() -> Self {
        Self {
            mode: MovementMode::Positional,
            bounds: None,
            reduce_movement_at_bounds: false,
            hard_stop_at_bounds: false,
            distance_threshold: 40.0,
            distance_scale: 500.0,
            duration_scale: 500.0,
            pan_duration_ms: 0.0,
            base_duration_ms: 400.0,
            swipe_easing: Easing::EaseOut,
            swipe_guard: Duration::from_millis(100),
            snap: SnapOptions::default(),
        }
    }
}

/// The allowed position interval for one axis.
///
/// When the element is larger than its bounds the interval inverts: the
/// element may only be dragged so its far edge still covers the bound.
fn position_interval(lo: f32, hi: f32, extent: f32) -> (f32, f32) {
    if extent <= hi - lo {
        (lo, hi - extent)
    } else {
        (hi - extent, lo)
    }
}

/// Linear resistance on overflow beyond the allowed interval.
fn resist(target: f32, min: f32, max: f32, threshold: f32, scale: f32) -> f32 {
    if target > max {
        let overflow = target - max;
        if overflow <= threshold {
            target
        } else {
            max + threshold + (overflow - threshold) / scale
        }
    } else if target < min {
        let overflow = min - target;
        if overflow <= threshold {
            target
        } else {
            min - threshold - (overflow - threshold) / scale
        }
    } else {
        target
    }
}

/// Clamp a move to the allowed interval, shortening its duration
/// proportionally to the distance actually traveled.
fn clamp_with_duration(
    from: f32,
    target: f32,
    min: f32,
    max: f32,
    duration: f64,
) -> (f32, f64) {
    let clamped = target.clamp(min, max);
    let requested = target - from;
    if requested == 0.0 || clamped == target {
        return (clamped, duration);
    }
    let actual = clamped - from;
    (clamped, duration * (f64::from(actual) / f64::from(requested)).abs())
}

/// One movement axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    X,
    Y,
}

impl Axis {
    fn positional_property(self) -> &'static str {
        match self {
            Axis::X => "left",
            Axis::Y => "top",
        }
    }

    fn scroll_property(self) -> &'static str {
        match self {
            Axis::X => "scrollLeft",
            Axis::Y => "scrollTop",
        }
    }
}

/// Per-element gesture state machine producing animation requests.
pub struct GestureMotion {
    element: ElementId,
    container: Option<ElementId>,
    options: MotionOptions,
    /// Position snapshot frozen at the start of the gesture sequence.
    start: Option<Rect>,
    /// Position snapshot updated every gesture frame.
    current: Option<Rect>,
    /// Container rectangle frozen at the start of the sequence.
    parent: Option<Rect>,
    /// Outstanding axis animations of the current logical movement.
    pending: HashSet<AnimationId>,
    animation_count: u32,
    /// Pan suppression deadline following a swipe.
    swipe_guard_until: Option<Instant>,
    /// The pan signal that owns the current sequence, for de-duplication
    /// when several directional handlers observe the same frames.
    pan_owner: Option<GestureKind>,
    /// Whether the in-flight movement is a corrective snap.
    snapping: bool,
    events: Arc<EventBus<CanvasEvent>>,
}

impl GestureMotion {
    /// Create an engine for one element.
    ///
    /// Fails when the configuration is incoherent: scroll movement without
    /// a container, snap-to-bounds with neither bounds nor container, or
    /// snap-to-nearest-child without a container.
    pub fn new(
        element: ElementId,
        container: Option<ElementId>,
        options: MotionOptions,
        events: Arc<EventBus<CanvasEvent>>,
    ) -> Result<Self> {
        if options.mode == MovementMode::Scroll && container.is_none() {
            return Err(Error::MissingContainer);
        }
        if options.snap.to_bounds && options.bounds.is_none() && container.is_none() {
            return Err(Error::MissingBounds);
        }
        if options.snap.to_nearest_child.is_some() && container.is_none() {
            return Err(Error::MissingSnapContainer);
        }
        Ok(Self {
            element,
            container,
            options,
            start: None,
            current: None,
            parent: None,
            pending: HashSet::new(),
            animation_count: 0,
            swipe_guard_until: None,
            pan_owner: None,
            snapping: false,
            events,
        })
    }

    /// The element this engine moves.
    #[inline]
    pub fn element(&self) -> ElementId {
        self.element
    }

    /// The current bounds rectangle.
    #[inline]
    pub fn bounds(&self) -> Option<Rect> {
        self.options.bounds
    }

    /// Replace the bounds rectangle (written by the group coordinator).
    pub fn set_bounds(&mut self, bounds: Option<Rect>) {
        self.options.bounds = bounds;
    }

    /// Whether any axis animation of a logical movement is outstanding.
    #[inline]
    pub fn is_animating(&self) -> bool {
        self.animation_count > 0
    }

    /// Record the current position; on the first call of a sequence also
    /// freeze the start position and the container rectangle.
    pub fn update_position_data(&mut self, dom: &dyn Dom) {
        let current = match self.options.mode {
            MovementMode::Positional => dom.rect(self.element),
            MovementMode::Scroll => {
                // Containers are validated at construction for scroll mode.
                let container = self.container.expect("scroll mode has a container");
                Rect {
                    origin: dom.scroll_offset(container),
                    size: Size::ZERO,
                }
            }
        };
        if self.start.is_none() {
            self.start = Some(current);
            self.parent = Some(
                self.container
                    .map(|c| dom.rect(c))
                    .unwrap_or(Rect::ZERO),
            );
        }
        self.current = Some(current);
    }

    /// Reset every position snapshot.
    ///
    /// Called only once a movement sequence fully settles; snapshots must
    /// survive across the intermediate frames of a pan.
    pub fn clear_position_data(&mut self) {
        self.start = None;
        self.current = None;
        self.parent = None;
    }

    /// The frozen start-of-sequence snapshot.
    pub fn start_position(&self) -> Option<Rect> {
        self.start
    }

    /// Process one gesture signal.
    pub fn handle(&mut self, event: &GestureEvent, ctx: &mut EngineContext<'_>) -> Result<()> {
        self.handle_at(event, Instant::now(), ctx)
    }

    /// [`handle`](Self::handle) with an explicit clock, for deterministic
    /// swipe-guard behavior.
    pub fn handle_at(
        &mut self,
        event: &GestureEvent,
        now: Instant,
        ctx: &mut EngineContext<'_>,
    ) -> Result<()> {
        match event.kind {
            GestureKind::PanStart => self.on_pan_start(now, ctx),
            GestureKind::PanX => self.on_pan(event, Axis::X, now, ctx),
            GestureKind::PanY => self.on_pan(event, Axis::Y, now, ctx),
            GestureKind::PanAny => {
                self.on_pan(event, Axis::X, now, ctx)?;
                self.on_pan(event, Axis::Y, now, ctx)
            }
            GestureKind::PanEnd | GestureKind::PanCancel => self.on_pan_end(now, ctx),
            GestureKind::SwipeX => self.on_swipe(event, Axis::X, now, ctx),
            GestureKind::SwipeY => self.on_swipe(event, Axis::Y, now, ctx),
            GestureKind::SwipeAny => {
                self.on_swipe(event, Axis::X, now, ctx)?;
                self.on_swipe(event, Axis::Y, now, ctx)
            }
            GestureKind::Tap => {
                self.events.publish(CanvasEvent::ElementTapped {
                    element: self.element,
                });
                Ok(())
            }
            GestureKind::Press => {
                self.events.publish(CanvasEvent::ElementPressed {
                    element: self.element,
                });
                Ok(())
            }
            GestureKind::Scroll => {
                self.update_position_data(ctx.dom);
                self.events.publish(CanvasEvent::ElementScrolled {
                    element: self.element,
                });
                Ok(())
            }
        }
    }

    /// Route a completed animation into this engine.
    ///
    /// Returns `true` when the id belonged to this engine. At counter zero
    /// the logical movement is settled: snapping runs, and once nothing is
    /// left in flight the position data is cleared and
    /// [`CanvasEvent::MovementComplete`] is published.
    pub fn animation_finished(
        &mut self,
        id: AnimationId,
        ctx: &mut EngineContext<'_>,
    ) -> Result<bool> {
        if !self.pending.remove(&id) {
            return Ok(false);
        }
        self.animation_count = self.animation_count.saturating_sub(1);
        if self.animation_count == 0 {
            self.on_movement_settled(ctx)?;
        }
        Ok(true)
    }

    fn swipe_guard_active(&self, now: Instant) -> bool {
        self.swipe_guard_until.is_some_and(|until| now < until)
    }

    fn on_pan_start(&mut self, now: Instant, ctx: &mut EngineContext<'_>) -> Result<()> {
        if self.swipe_guard_active(now) {
            return Ok(());
        }
        // An in-flight animation must never fight a new gesture.
        if self.is_animating() {
            self.stop_movement(ctx);
        }
        self.pan_owner = None;
        self.snapping = false;
        self.update_position_data(ctx.dom);
        Ok(())
    }

    /// Stop every in-flight animation and discard stale tracking state.
    fn stop_movement(&mut self, ctx: &mut EngineContext<'_>) {
        tracing::debug!(target: targets::MOTION, "preempting in-flight movement");
        ctx.animator.stop(self.element);
        if let Some(container) = self.container {
            if self.options.mode == MovementMode::Scroll {
                ctx.animator.stop(container);
            }
        }
        self.pending.clear();
        self.animation_count = 0;
        self.snapping = false;
        self.clear_position_data();
    }

    fn on_pan(
        &mut self,
        event: &GestureEvent,
        axis: Axis,
        now: Instant,
        ctx: &mut EngineContext<'_>,
    ) -> Result<()> {
        if self.swipe_guard_active(now) {
            return Ok(());
        }
        // First directional signal of the sequence claims it; other
        // directional handlers reporting the same frames are ignored.
        match self.pan_owner {
            None => self.pan_owner = Some(event.kind),
            Some(owner) if owner != event.kind => return Ok(()),
            Some(_) => {}
        }
        self.update_position_data(ctx.dom);

        let start = self.start.expect("position data recorded above");
        let delta = match axis {
            Axis::X => event.delta.x,
            Axis::Y => event.delta.y,
        };
        let raw_target = match self.options.mode {
            MovementMode::Positional => match axis {
                Axis::X => start.origin.x + delta,
                Axis::Y => start.origin.y + delta,
            },
            // Scroll offsets move against the pointer.
            MovementMode::Scroll => match axis {
                Axis::X => start.origin.x - delta,
                Axis::Y => start.origin.y - delta,
            },
        };

        let (target, duration) =
            self.apply_bounds(axis, raw_target, self.options.pan_duration_ms);
        self.animate_axis(axis, target, duration, Easing::Linear, ctx);
        Ok(())
    }

    fn on_pan_end(&mut self, now: Instant, ctx: &mut EngineContext<'_>) -> Result<()> {
        if self.swipe_guard_active(now) {
            // The swipe that just fired owns this sequence's settlement.
            return Ok(());
        }
        self.pan_owner = None;
        if !self.is_animating() {
            self.on_movement_settled(ctx)?;
        }
        Ok(())
    }

    fn on_swipe(
        &mut self,
        event: &GestureEvent,
        axis: Axis,
        now: Instant,
        ctx: &mut EngineContext<'_>,
    ) -> Result<()> {
        self.swipe_guard_until = Some(now + self.options.swipe_guard);
        self.pan_owner = None;
        self.update_position_data(ctx.dom);

        let current = self.current.expect("position data recorded above");
        let velocity = match axis {
            Axis::X => event.velocity.x,
            Axis::Y => event.velocity.y,
        };
        let from = match axis {
            Axis::X => current.origin.x,
            Axis::Y => current.origin.y,
        };
        // Positive velocity carries content in the negative direction; in
        // scroll mode the offset runs against content, so the sign flips.
        let travel = match self.options.mode {
            MovementMode::Positional => -velocity * self.options.distance_scale,
            MovementMode::Scroll => velocity * self.options.distance_scale,
        };
        let duration = (velocity.abs() * self.options.duration_scale) as f64;

        let (target, duration) = self.apply_bounds(axis, from + travel, duration);
        self.animate_axis(axis, target, duration, self.options.swipe_easing, ctx);
        Ok(())
    }

    /// Apply resistance and hard-stop clamping to a raw axis target.
    fn apply_bounds(&self, axis: Axis, raw_target: f32, duration: f64) -> (f32, f64) {
        // Scroll overflow is already prevented by the container.
        if self.options.mode == MovementMode::Scroll {
            return (raw_target, duration);
        }
        let Some(bounds) = self.options.bounds else {
            return (raw_target, duration);
        };
        let Some(current) = self.current else {
            return (raw_target, duration);
        };

        let (from, extent, lo, hi) = match axis {
            Axis::X => (
                current.origin.x,
                current.size.width,
                bounds.left(),
                bounds.right(),
            ),
            Axis::Y => (
                current.origin.y,
                current.size.height,
                bounds.top(),
                bounds.bottom(),
            ),
        };
        let (min, max) = position_interval(lo, hi, extent);

        let mut target = raw_target;
        let mut duration = duration;
        if self.options.reduce_movement_at_bounds {
            target = resist(
                target,
                min,
                max,
                self.options.distance_threshold,
                self.options.distance_scale,
            );
        }
        if self.options.hard_stop_at_bounds {
            let (clamped, scaled) = clamp_with_duration(from, target, min, max, duration);
            target = clamped;
            duration = scaled;
        }
        (target, duration)
    }

    /// Issue one axis animation and register it for completion tracking.
    fn animate_axis(
        &mut self,
        axis: Axis,
        target: f32,
        duration_ms: f64,
        easing: Easing,
        ctx: &mut EngineContext<'_>,
    ) {
        let (element, property) = match self.options.mode {
            MovementMode::Positional => (self.element, axis.positional_property()),
            MovementMode::Scroll => (
                self.container.expect("scroll mode has a container"),
                axis.scroll_property(),
            ),
        };
        let id = ctx.animator.animate(AnimationRequest {
            element,
            transform: Transform::new().with(property, StyleValue::Px(target)),
            options: AnimateOptions {
                duration_ms,
                delay_ms: 0.0,
                easing,
                instant: duration_ms == 0.0,
            },
        });
        self.pending.insert(id);
        self.animation_count += 1;
    }

    /// Issue an absolute two-axis move.
    ///
    /// Both axis animations must complete before the movement counts as
    /// settled; the counter models two independently-tweened properties
    /// joined into one logical movement.
    pub fn animate_move(&mut self, target: Point, ctx: &mut EngineContext<'_>) {
        let duration = self.options.base_duration_ms;
        self.animate_axis(Axis::X, target.x, duration, self.options.swipe_easing, ctx);
        self.animate_axis(Axis::Y, target.y, duration, self.options.swipe_easing, ctx);
    }

    /// Move to a target element's styled position plus the layout's
    /// alignment offsets.
    pub fn animate_move_to_element(
        &mut self,
        target: ElementId,
        ctx: &mut EngineContext<'_>,
    ) -> Result<()> {
        let position = ctx.dom.position(target);
        let offsets = ctx.layout.move_to_element_offsets(target, ctx.dom);
        self.animate_move(
            Point::new(position.x + offsets.x, position.y + offsets.y),
            ctx,
        );
        Ok(())
    }

    /// Corrective move back inside the bounds after a settled movement.
    ///
    /// No-op unless bounds snapping is enabled, and in scroll mode (the
    /// container already prevents overflow) or without bounds. Returns
    /// whether a corrective move was issued.
    pub fn snap_to_bounds(&mut self, ctx: &mut EngineContext<'_>) -> Result<bool> {
        if !self.options.snap.to_bounds || self.options.mode == MovementMode::Scroll {
            return Ok(false);
        }
        let Some(bounds) = self.options.bounds else {
            return Ok(false);
        };
        let rect = ctx.dom.rect(self.element);
        let (min_x, max_x) = position_interval(bounds.left(), bounds.right(), rect.width());
        let (min_y, max_y) = position_interval(bounds.top(), bounds.bottom(), rect.height());
        let snapped = Point::new(
            rect.origin.x.clamp(min_x, max_x),
            rect.origin.y.clamp(min_y, max_y),
        );
        if snapped == rect.origin {
            return Ok(false);
        }
        tracing::debug!(target: targets::MOTION, "snapping to bounds");
        self.animate_move(snapped, ctx);
        Ok(true)
    }

    /// Corrective move aligning with the nearest matching child of the
    /// container. Returns whether a move was issued.
    pub fn snap_to_nearest_child(&mut self, ctx: &mut EngineContext<'_>) -> Result<bool> {
        let Some(class_name) = self.options.snap.to_nearest_child.clone() else {
            return Ok(false);
        };
        let container = self.container.ok_or(Error::MissingSnapContainer)?;
        let origin = self
            .options
            .bounds
            .map(|b| b.origin)
            .unwrap_or_else(|| ctx.dom.rect(container).origin);

        let nearest = ctx
            .dom
            .children_with_class(container, &class_name)
            .into_iter()
            .filter(|&child| ctx.dom.is_visible(child))
            .map(|child| (child, ctx.dom.position(child).distance_to(origin)))
            .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

        let Some((child, _)) = nearest else {
            return Ok(false);
        };
        tracing::debug!(target: targets::MOTION, "snapping to nearest child");
        self.animate_move_to_element(child, ctx)?;
        Ok(true)
    }

    /// The single movement-complete point: run snapping once, then clear
    /// tracking state and announce completion.
    fn on_movement_settled(&mut self, ctx: &mut EngineContext<'_>) -> Result<()> {
        if !self.snapping {
            // Nearest-child snapping takes precedence over bounds snapping;
            // the two are never blended.
            let issued = if self.snap_to_nearest_child(ctx)? {
                true
            } else {
                self.snap_to_bounds(ctx)?
            };
            if issued {
                self.snapping = true;
                return Ok(());
            }
        }
        self.snapping = false;
        self.clear_position_data();
        self.events.publish(CanvasEvent::MovementComplete {
            element: self.element,
        });
        Ok(())
    }
}
