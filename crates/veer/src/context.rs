//! The collaborator bundle threaded through engine operations.

use crate::animator::Animator;
use crate::dom::Dom;
use crate::layout::Layout;

/// Borrowed collaborators for one engine operation.
///
/// The engines store no references to their collaborators; the host owns
/// the document backend, the animation engine and the layout, and lends
/// them out per call. This keeps ownership explicit and lets the host swap
/// layouts between cycles.
pub struct EngineContext<'a> {
    pub dom: &'a mut dyn Dom,
    pub animator: &'a mut dyn Animator,
    pub layout: &'a dyn Layout,
}

impl<'a> EngineContext<'a> {
    /// Bundle the three collaborators.
    pub fn new(
        dom: &'a mut dyn Dom,
        animator: &'a mut dyn Animator,
        layout: &'a dyn Layout,
    ) -> Self {
        Self {
            dom,
            animator,
            layout,
        }
    }
}
