//! The animation engine collaborator.
//!
//! The engine never tweens anything itself: it hands an
//! [`AnimationRequest`] to the injected [`Animator`] and tracks the
//! returned [`AnimationId`]. Completion is delivered by the host — when its
//! animation engine settles an animation, the host feeds the id back into
//! the owning engine (`animation_finished`). [`Animator::stop`] halts and
//! clears any queued work for an element synchronously; it is the
//! preemption hook used when a new gesture lands mid-animation.
//!
//! [`ManualAnimator`] is the headless reference backend: it queues requests
//! and settles them when the host pumps it, which also makes it the test
//! harness for every completion-ordering property in the engine.

use slotmap::{new_key_type, SlotMap};

use crate::dom::{Dom, ElementId};
use crate::style::{AnimateOptions, Transform};

new_key_type! {
    /// A handle to one in-flight animation.
    pub struct AnimationId;
}

/// One animation to run: tween `element` to `transform` under `options`.
#[derive(Debug, Clone)]
pub struct AnimationRequest {
    pub element: ElementId,
    pub transform: Transform,
    pub options: AnimateOptions,
}

/// The injected animation engine.
pub trait Animator {
    /// Start an animation and return its handle.
    fn animate(&mut self, request: AnimationRequest) -> AnimationId;

    /// Synchronously halt and discard every running or queued animation on
    /// the element. No completion is delivered for stopped animations.
    fn stop(&mut self, element: ElementId);
}

/// A queueing [`Animator`] that settles animations when pumped.
///
/// Requests accumulate until the host calls [`finish_all`](Self::finish_all)
/// (or [`finish_one`](Self::finish_one)), at which point the final transform
/// is applied to the document and the completed ids are returned for
/// routing back into the engines.
#[derive(Default)]
pub struct ManualAnimator {
    pending: SlotMap<AnimationId, AnimationRequest>,
    order: Vec<AnimationId>,
    stopped: Vec<ElementId>,
}

impl ManualAnimator {
    /// Create an empty animator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of animations not yet settled.
    pub fn pending_count(&self) -> usize {
        self.order.len()
    }

    /// The queued request for an id, if still pending.
    pub fn request(&self, id: AnimationId) -> Option<&AnimationRequest> {
        self.pending.get(id)
    }

    /// The pending request at a position in request order.
    pub fn request_at(&self, index: usize) -> Option<&AnimationRequest> {
        self.order.get(index).and_then(|&id| self.pending.get(id))
    }

    /// Elements that have been passed to [`Animator::stop`], in call order.
    pub fn stopped_elements(&self) -> &[ElementId] {
        &self.stopped
    }

    /// Settle the oldest pending animation: apply its final transform and
    /// return its id. Returns `None` when nothing is pending.
    pub fn finish_one(&mut self, dom: &mut dyn Dom) -> Option<AnimationId> {
        let id = *self.order.first()?;
        self.order.remove(0);
        let request = self.pending.remove(id)?;
        dom.apply_styles(request.element, &request.transform);
        Some(id)
    }

    /// Settle every pending animation in request order.
    pub fn finish_all(&mut self, dom: &mut dyn Dom) -> Vec<AnimationId> {
        let mut finished = Vec::new();
        while let Some(id) = self.finish_one(dom) {
            finished.push(id);
        }
        finished
    }
}

impl Animator for ManualAnimator {
    fn animate(&mut self, request: AnimationRequest) -> AnimationId {
        let id = self.pending.insert(request);
        self.order.push(id);
        id
    }

    fn stop(&mut self, element: ElementId) {
        self.stopped.push(element);
        let dropped: Vec<AnimationId> = self
            .pending
            .iter()
            .filter(|(_, r)| r.element == element)
            .map(|(id, _)| id)
            .collect();
        for id in dropped {
            self.pending.remove(id);
            self.order.retain(|&o| o != id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::MemoryDom;
    use crate::geometry::{Point, Rect};

    #[test]
    fn test_finish_applies_final_transform() {
        let mut dom = MemoryDom::new();
        let el = dom.create_element_at("panel", Rect::new(0.0, 0.0, 10.0, 10.0));

        let mut animator = ManualAnimator::new();
        let id = animator.animate(AnimationRequest {
            element: el,
            transform: Transform::new().with_px("left", 50.0),
            options: AnimateOptions::default(),
        });

        assert_eq!(animator.pending_count(), 1);
        let finished = animator.finish_all(&mut dom);
        assert_eq!(finished, vec![id]);
        assert_eq!(dom.position(el), Point::new(50.0, 0.0));
    }

    #[test]
    fn test_stop_discards_without_completion() {
        let mut dom = MemoryDom::new();
        let a = dom.create_element("panel");
        let b = dom.create_element("panel");

        let mut animator = ManualAnimator::new();
        animator.animate(AnimationRequest {
            element: a,
            transform: Transform::new().with_px("left", 1.0),
            options: AnimateOptions::default(),
        });
        let keep = animator.animate(AnimationRequest {
            element: b,
            transform: Transform::new().with_px("left", 2.0),
            options: AnimateOptions::default(),
        });

        animator.stop(a);
        assert_eq!(animator.stopped_elements(), &[a]);
        // Only b's animation survives and completes.
        assert_eq!(animator.finish_all(&mut dom), vec![keep]);
    }
}
