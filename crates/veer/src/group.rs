//! The gesture group coordinator.
//!
//! A [`GestureGroup`] keeps a cohort of motion engines moving in lockstep:
//! a gesture that originates on any member is re-dispatched to every other
//! member with an element override, so the cohort moves as one without any
//! member re-deriving gesture semantics. The coordinator also owns the
//! shared bounds computation — member engines only read the bounds it
//! writes.

use std::sync::Arc;

use veer_core::logging::targets;
use veer_core::EventBus;

use crate::animator::AnimationId;
use crate::context::EngineContext;
use crate::dom::{Dom, ElementId};
use crate::error::Result;
use crate::events::{CanvasEvent, GestureEvent};
use crate::geometry::Rect;
use crate::layout::GestureOptions;
use crate::motion::{GestureMotion, MotionOptions};

/// Configuration for one gesture group.
#[derive(Debug, Clone, Default)]
pub struct GestureGroupOptions {
    /// Which gesture capabilities the group processes at all. Signals for
    /// disabled capabilities are dropped before reaching any member.
    pub gestures: GestureOptions,
    /// Motion tuning template applied to every member engine. The bounds
    /// field is overwritten by the coordinator's bounds computation.
    pub motion: MotionOptions,
    /// Extra draggable slack past the right edge, in px.
    pub padding_right: f32,
    /// Extra draggable slack past the bottom edge, in px.
    pub padding_bottom: f32,
}

/// A cohort of elements whose motion is mirrored.
pub struct GestureGroup {
    id: String,
    container: ElementId,
    options: GestureGroupOptions,
    members: Vec<GestureMotion>,
    events: Arc<EventBus<CanvasEvent>>,
}

impl GestureGroup {
    /// Create an empty group moving within `container`.
    pub fn new(
        id: impl Into<String>,
        container: ElementId,
        options: GestureGroupOptions,
        events: Arc<EventBus<CanvasEvent>>,
    ) -> Self {
        Self {
            id: id.into(),
            container,
            options,
            members: Vec::new(),
            events,
        }
    }

    /// The group's cohort id.
    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Number of member engines.
    #[inline]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the group has no members.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Whether an element is a member.
    pub fn contains(&self, element: ElementId) -> bool {
        self.members.iter().any(|m| m.element() == element)
    }

    /// The member engines, in insertion order.
    pub fn members(&self) -> &[GestureMotion] {
        &self.members
    }

    /// Add an element to the cohort and recompute the shared bounds.
    ///
    /// Adding an element twice is a no-op.
    pub fn add_member(&mut self, element: ElementId, dom: &dyn Dom) -> Result<()> {
        if self.contains(element) {
            return Ok(());
        }
        let engine = GestureMotion::new(
            element,
            Some(self.container),
            self.options.motion.clone(),
            Arc::clone(&self.events),
        )?;
        self.members.push(engine);
        tracing::debug!(
            target: targets::GROUP,
            group = %self.id,
            members = self.members.len(),
            "member added"
        );
        self.update_bounds(dom);
        Ok(())
    }

    /// Remove an element from the cohort and recompute the shared bounds.
    ///
    /// Returns whether the element was a member.
    pub fn remove_member(&mut self, element: ElementId, dom: &dyn Dom) -> bool {
        let before = self.members.len();
        self.members.retain(|m| m.element() != element);
        let removed = self.members.len() != before;
        if removed {
            tracing::debug!(
                target: targets::GROUP,
                group = %self.id,
                members = self.members.len(),
                "member removed"
            );
            self.update_bounds(dom);
        }
        removed
    }

    /// Recompute every member's allowable bounds from current geometry.
    ///
    /// The union of all member rectangles and the container rectangle
    /// determines the group's draggable slack per axis: members may be
    /// dragged only until the cohort's combined extent aligns with the
    /// container edge (plus the configured padding). When the union does
    /// not exceed the container on an axis there is no slack at all and
    /// each member's bounds collapse to its own position on that axis.
    pub fn update_bounds(&mut self, dom: &dyn Dom) {
        let container_rect = dom.rect(self.container);
        let mut union = container_rect;
        for member in &self.members {
            union = union.union(&dom.rect(member.element()));
        }

        let slack_x = if union.width() > container_rect.width() {
            union.width() - container_rect.width() + self.options.padding_right
        } else {
            0.0
        };
        let slack_y = if union.height() > container_rect.height() {
            union.height() - container_rect.height() + self.options.padding_bottom
        } else {
            0.0
        };

        for member in &mut self.members {
            let rect = dom.rect(member.element());
            member.set_bounds(Some(Rect::new(
                rect.left() - slack_x,
                rect.top() - slack_y,
                rect.width() + slack_x,
                rect.height() + slack_y,
            )));
        }
    }

    /// Dispatch one gesture signal to the whole cohort.
    ///
    /// The originating member receives the event as-is; every other member
    /// receives it retargeted at its own element so it moves identically.
    /// Signals for capabilities the group does not enable are dropped.
    pub fn apply_gesture(
        &mut self,
        event: &GestureEvent,
        ctx: &mut EngineContext<'_>,
    ) -> Result<()> {
        if !self.options.gestures.allows(event.kind) {
            return Ok(());
        }
        for member in &mut self.members {
            if member.element() == event.element {
                member.handle(event, ctx)?;
            } else {
                member.handle(&event.with_element(member.element()), ctx)?;
            }
        }
        Ok(())
    }

    /// Route a completed animation to the member that issued it.
    ///
    /// Returns `true` when some member claimed the id.
    pub fn animation_finished(
        &mut self,
        id: AnimationId,
        ctx: &mut EngineContext<'_>,
    ) -> Result<bool> {
        for member in &mut self.members {
            if member.animation_finished(id, ctx)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Whether any member has an outstanding animation.
    pub fn is_animating(&self) -> bool {
        self.members.iter().any(|m| m.is_animating())
    }
}
