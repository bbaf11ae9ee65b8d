//! The render reconciliation engine.
//!
//! The [`Reconciler`] is the single source of truth mapping displayed items
//! to document elements. Each draw cycle asks the layout what every item
//! should look like, diffs that against what is on the canvas, and animates
//! the additions, merges and removals to settlement. Erasing is drawing
//! toward the hidden state and removing the element on completion.
//!
//! Cycle completion is counter-based: every issued render animation
//! increments a global counter and its completion decrements it; the
//! zero-crossing is the one point where `RendersDrawn` fires and the
//! deferred chain (load pass, custom renders, gesture configuration) is
//! queued. The chain runs one step per [`pump`](Reconciler::pump) call so a
//! cycle triggered by the current completion never re-enters the completing
//! callback. Custom renders run the same pipeline on an independent counter.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::sync::Arc;

use veer_core::logging::targets;
use veer_core::EventBus;

use crate::animator::{AnimationId, AnimationRequest};
use crate::context::EngineContext;
use crate::dom::ElementId;
use crate::error::{Error, Result};
use crate::events::{CanvasEvent, GestureEvent};
use crate::group::{GestureGroup, GestureGroupOptions};
use crate::item::Item;
use crate::layout::{LayoutContext, RenderDescriptor};
use crate::style::{AnimateOptions, Transform};

/// One visual instantiation of an item on the canvas.
#[derive(Debug, Clone)]
pub struct Render {
    /// The owning item.
    pub item_id: String,
    /// Ordinal id within the item's render list.
    pub id: u32,
    /// The backing element; always present once the render is drawn.
    pub element: Option<ElementId>,
    /// The current target transform.
    pub transform: Transform,
    /// Timing for the move toward the target.
    pub animate: AnimateOptions,
    /// Whether an animation toward the target is outstanding.
    pub is_animating: bool,
    /// Whether the render is animating toward the hidden state.
    pub is_erasing: bool,
    /// A reload was requested for the next load pass.
    pub load_needed: bool,
    /// Content is currently loaded.
    pub loaded: bool,
    /// Cohort id of the gesture group this render belongs to, if any.
    pub gesture_group: Option<String>,
}

impl Render {
    fn new(item_id: &str, id: u32, element: ElementId) -> Self {
        Self {
            item_id: item_id.to_string(),
            id,
            element: Some(element),
            transform: Transform::new(),
            animate: AnimateOptions::default(),
            is_animating: false,
            is_erasing: false,
            load_needed: false,
            loaded: false,
            gesture_group: None,
        }
    }
}

/// Animation-slot throttling thresholds.
///
/// Large collections trade visual polish for frame-rate stability: renders
/// are bucketed into slots of `items_per_render_slot`, only the first
/// `max_slots_with_animations` slots animate, and each slot's application is
/// staggered by `slot_render_delay_ms` per slot (halved once animation is
/// disabled). The defaults are tuned values, not correctness requirements.
#[derive(Debug, Clone, Copy)]
pub struct ReconcilerOptions {
    pub items_per_render_slot: usize,
    pub max_slots_with_animations: usize,
    pub slot_render_delay_ms: f64,
}

impl Default for ReconcilerOptions {
    fn default() -> Self {
        Self {
            items_per_render_slot: 15,
            max_slots_with_animations: 3,
            slot_render_delay_ms: 100.0,
        }
    }
}

/// One step of the deferred post-cycle chain, in fixed order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CycleStep {
    LoadPass,
    CustomRenders,
    ConfigureGestures,
}

/// Maps items to renders and drives the draw/erase/load lifecycle.
pub struct Reconciler {
    /// item id -> render id -> render.
    renders: HashMap<String, BTreeMap<u32, Render>>,
    /// Items whose removal is in flight.
    erasing_items: HashSet<String>,
    /// In-flight item-render animations.
    pending: HashMap<AnimationId, (String, u32)>,
    /// In-flight custom-render animations.
    pending_custom: HashSet<AnimationId>,
    render_animation_count: u32,
    custom_render_animation_count: u32,
    /// Position of the next render within the current cycle, for slotting.
    cycle_ordinal: usize,
    /// Post-cycle steps not yet pumped.
    deferred: VecDeque<CycleStep>,
    /// Gesture groups keyed by cohort id, created lazily.
    groups: HashMap<String, GestureGroup>,
    /// The layout context of the most recent draw.
    context: Option<LayoutContext>,
    options: ReconcilerOptions,
    events: Arc<EventBus<CanvasEvent>>,
}

impl Reconciler {
    /// Create an empty reconciler.
    pub fn new(options: ReconcilerOptions, events: Arc<EventBus<CanvasEvent>>) -> Self {
        Self {
            renders: HashMap::new(),
            erasing_items: HashSet::new(),
            pending: HashMap::new(),
            pending_custom: HashSet::new(),
            render_animation_count: 0,
            custom_render_animation_count: 0,
            cycle_ordinal: 0,
            deferred: VecDeque::new(),
            groups: HashMap::new(),
            context: None,
            options,
            events,
        }
    }

    /// A single render, if present.
    pub fn render(&self, item_id: &str, render_id: u32) -> Option<&Render> {
        self.renders.get(item_id).and_then(|m| m.get(&render_id))
    }

    /// The render ids currently held for an item.
    pub fn render_ids(&self, item_id: &str) -> Vec<u32> {
        self.renders
            .get(item_id)
            .map(|m| m.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Total number of live renders.
    pub fn render_count(&self) -> usize {
        self.renders.values().map(BTreeMap::len).sum()
    }

    /// Outstanding item-render animations.
    #[inline]
    pub fn render_animation_count(&self) -> u32 {
        self.render_animation_count
    }

    /// Outstanding custom-render animations.
    #[inline]
    pub fn custom_render_animation_count(&self) -> u32 {
        self.custom_render_animation_count
    }

    /// Whether any deferred post-cycle step is queued.
    pub fn has_pending_steps(&self) -> bool {
        !self.deferred.is_empty()
    }

    /// The gesture group for a cohort id, if it has been created.
    pub fn group(&self, id: &str) -> Option<&GestureGroup> {
        self.groups.get(id)
    }

    /// Request a content reload for a render on the next load pass.
    pub fn request_reload(&mut self, item_id: &str, render_id: u32) {
        if let Some(render) = self
            .renders
            .get_mut(item_id)
            .and_then(|m| m.get_mut(&render_id))
        {
            render.load_needed = true;
        }
    }

    /// Draw one item: ask the layout for its renders and reconcile.
    pub fn draw_item(
        &mut self,
        item: &Item,
        lctx: &LayoutContext,
        ctx: &mut EngineContext<'_>,
    ) -> Result<()> {
        let descriptors = ctx.layout.renders(item, lctx).into_vec();
        let new = descriptors
            .into_iter()
            .enumerate()
            .map(|(ordinal, descriptor)| (ordinal as u32, descriptor))
            .collect();
        self.draw_renders(item.id(), new, lctx, ctx)
    }

    /// Reconcile an item's renders against a new id-annotated set.
    ///
    /// Partitions ids into merges (kept), additions (new) and removals
    /// (gone), processed in that order: removal decisions depend on the
    /// previous id set, which additions must not disturb first.
    pub fn draw_renders(
        &mut self,
        item_id: &str,
        new: Vec<(u32, RenderDescriptor)>,
        lctx: &LayoutContext,
        ctx: &mut EngineContext<'_>,
    ) -> Result<()> {
        self.context = Some(*lctx);
        // Drawing an item supersedes any pending whole-item erase.
        self.erasing_items.remove(item_id);

        let previous: BTreeSet<u32> = self
            .renders
            .get(item_id)
            .map(|m| m.keys().copied().collect())
            .unwrap_or_default();
        let incoming: BTreeSet<u32> = new.iter().map(|(id, _)| *id).collect();

        tracing::debug!(
            target: targets::RECONCILE,
            item = item_id,
            merges = previous.intersection(&incoming).count(),
            additions = incoming.difference(&previous).count(),
            removals = previous.difference(&incoming).count(),
            "reconciling renders"
        );

        // Merges.
        for (render_id, descriptor) in new.iter().filter(|(id, _)| previous.contains(id)) {
            let unchanged = {
                let render = self
                    .renders
                    .get_mut(item_id)
                    .and_then(|m| m.get_mut(render_id))
                    .expect("merge id came from the previous set");
                if render.is_erasing {
                    // A re-requested render revives an in-flight erase: the
                    // stale erase animation must neither complete this render
                    // nor finish the element at the hidden state.
                    render.is_erasing = false;
                    render.is_animating = false;
                    if let Some(element) = render.element {
                        ctx.animator.stop(element);
                    }
                    let mut transform = ctx.layout.show_animation().transform;
                    transform.merge(&descriptor.transform);
                    render.transform = transform;
                    render.animate = descriptor.animate.clone();
                    let key = (item_id.to_string(), *render_id);
                    let stale: Vec<AnimationId> = self
                        .pending
                        .iter()
                        .filter(|(_, k)| *k == &key)
                        .map(|(id, _)| *id)
                        .collect();
                    for id in stale {
                        self.pending.remove(&id);
                        self.render_animation_count =
                            self.render_animation_count.saturating_sub(1);
                    }
                    false
                } else {
                    // The incoming target merges over the current one, so an
                    // unchanged render is one whose merge result is what it
                    // already shows.
                    let mut target = render.transform.clone();
                    target.merge(&descriptor.transform);
                    let unchanged = target == render.transform && !render.load_needed;
                    render.transform = target;
                    render.animate = descriptor.animate.clone();
                    unchanged
                }
            };
            // A visually-unchanged merge still runs the completion pipeline
            // so cycle bookkeeping stays correct.
            self.draw_render(item_id, *render_id, unchanged, ctx)?;
        }

        // Additions.
        for (render_id, descriptor) in new.iter().filter(|(id, _)| !previous.contains(id)) {
            let element = ctx.dom.create_element("render");
            if ctx.dom.contains(lctx.canvas, element) {
                tracing::warn!(
                    target: targets::RECONCILE,
                    item = item_id,
                    render = render_id,
                    "element already attached to canvas, skipping"
                );
            } else {
                ctx.dom.append_child(lctx.canvas, element);
            }

            let mut render = Render::new(item_id, *render_id, element);
            // Start from the show state; the descriptor's target wins.
            let mut transform = ctx.layout.show_animation().transform;
            transform.merge(&descriptor.transform);
            render.transform = transform;
            render.animate = descriptor.animate.clone();

            ctx.layout.initialize_render(&render, ctx.dom);
            self.renders
                .entry(item_id.to_string())
                .or_default()
                .insert(*render_id, render);
            self.draw_render(item_id, *render_id, false, ctx)?;
        }

        // Removals.
        for render_id in previous.difference(&incoming) {
            self.erase_render(item_id, *render_id, ctx)?;
        }

        Ok(())
    }

    /// Animate one stored render toward its target.
    ///
    /// Applies slot throttling: renders past the animated slots are applied
    /// instantly with half the stagger delay.
    pub fn draw_render(
        &mut self,
        item_id: &str,
        render_id: u32,
        instant: bool,
        ctx: &mut EngineContext<'_>,
    ) -> Result<()> {
        let (element, transform, mut animate) = {
            let render = self
                .renders
                .get(item_id)
                .and_then(|m| m.get(&render_id))
                .ok_or_else(|| Error::unknown_item(item_id))?;
            let element = render
                .element
                .ok_or_else(|| Error::render_without_element(item_id, render_id))?;
            (element, render.transform.clone(), render.animate.clone())
        };

        let slot = self.cycle_ordinal / self.options.items_per_render_slot;
        self.cycle_ordinal += 1;
        let stagger = self.options.slot_render_delay_ms * slot as f64;
        if instant {
            animate = AnimateOptions::instant();
        } else if slot >= self.options.max_slots_with_animations {
            animate.duration_ms = 0.0;
            animate.instant = true;
            animate.delay_ms = stagger / 2.0;
        } else {
            animate.delay_ms = stagger;
        }

        let id = ctx.animator.animate(AnimationRequest {
            element,
            transform,
            options: animate,
        });
        self.pending.insert(id, (item_id.to_string(), render_id));
        if let Some(render) = self
            .renders
            .get_mut(item_id)
            .and_then(|m| m.get_mut(&render_id))
        {
            render.is_animating = true;
        }
        self.render_animation_count += 1;
        Ok(())
    }

    /// Erase one render: draw toward the hidden state, remove on completion.
    ///
    /// Erasing an absent or already-erasing render is a no-op.
    pub fn erase_render(
        &mut self,
        item_id: &str,
        render_id: u32,
        ctx: &mut EngineContext<'_>,
    ) -> Result<()> {
        let hide = ctx.layout.hide_animation();
        {
            let Some(render) = self
                .renders
                .get_mut(item_id)
                .and_then(|m| m.get_mut(&render_id))
            else {
                return Ok(());
            };
            if render.is_erasing {
                return Ok(());
            }
            render.is_erasing = true;
            render.transform.merge(&hide.transform);
            render.animate = hide.animate;
        }
        self.draw_render(item_id, render_id, false, ctx)
    }

    /// Erase every render of an item and, once the last one completes,
    /// drop the item entry and publish [`CanvasEvent::ItemErased`].
    pub fn erase_item(&mut self, item_id: &str, ctx: &mut EngineContext<'_>) -> Result<()> {
        let ids = self.render_ids(item_id);
        if ids.is_empty() {
            self.renders.remove(item_id);
            self.events.publish(CanvasEvent::ItemErased {
                id: item_id.to_string(),
            });
            return Ok(());
        }
        self.erasing_items.insert(item_id.to_string());
        for render_id in ids {
            self.erase_render(item_id, render_id, ctx)?;
        }
        Ok(())
    }

    /// Animate one item-independent decorative render.
    pub fn draw_custom_render(
        &mut self,
        element: ElementId,
        transform: Transform,
        animate: AnimateOptions,
        ctx: &mut EngineContext<'_>,
    ) {
        let id = ctx.animator.animate(AnimationRequest {
            element,
            transform,
            options: animate,
        });
        self.pending_custom.insert(id);
        self.custom_render_animation_count += 1;
    }

    /// Route a completed animation into the reconciler.
    ///
    /// Returns `true` when the id belonged to an item render, a custom
    /// render, or a gesture-group member. The item-render zero-crossing
    /// publishes `RendersDrawn` and queues the deferred chain; the custom
    /// zero-crossing publishes `CustomRendersDrawn`.
    pub fn animation_finished(
        &mut self,
        id: AnimationId,
        ctx: &mut EngineContext<'_>,
    ) -> Result<bool> {
        if self.pending_custom.remove(&id) {
            self.custom_render_animation_count = self.custom_render_animation_count.saturating_sub(1);
            if self.custom_render_animation_count == 0 {
                self.events.publish(CanvasEvent::CustomRendersDrawn);
            }
            return Ok(true);
        }

        if let Some((item_id, render_id)) = self.pending.remove(&id) {
            self.finish_render(&item_id, render_id, ctx);
            self.render_animation_count = self.render_animation_count.saturating_sub(1);
            if self.render_animation_count == 0 {
                self.cycle_ordinal = 0;
                tracing::debug!(target: targets::RECONCILE, "draw cycle complete");
                self.events.publish(CanvasEvent::RendersDrawn);
                self.deferred.extend([
                    CycleStep::LoadPass,
                    CycleStep::CustomRenders,
                    CycleStep::ConfigureGestures,
                ]);
            }
            return Ok(true);
        }

        for group in self.groups.values_mut() {
            if group.animation_finished(id, ctx)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Per-render completion: clear the animating flag and, for erasing
    /// renders, remove the render (and possibly the whole item entry).
    fn finish_render(&mut self, item_id: &str, render_id: u32, ctx: &mut EngineContext<'_>) {
        let erasing = {
            let Some(render) = self
                .renders
                .get_mut(item_id)
                .and_then(|m| m.get_mut(&render_id))
            else {
                return;
            };
            render.is_animating = false;
            render.is_erasing
        };
        if !erasing {
            return;
        }

        let Some(render) = self
            .renders
            .get_mut(item_id)
            .and_then(|m| m.remove(&render_id))
        else {
            return;
        };
        if let Some(element) = render.element {
            if render.loaded {
                ctx.layout.unload_render(&render, ctx.dom);
            }
            if let Some(group_id) = &render.gesture_group {
                if let Some(group) = self.groups.get_mut(group_id) {
                    group.remove_member(element, &*ctx.dom);
                }
            }
            ctx.dom.remove_element(element);
        }

        let item_empty = self
            .renders
            .get(item_id)
            .map(BTreeMap::is_empty)
            .unwrap_or(true);
        if item_empty && self.erasing_items.remove(item_id) {
            self.renders.remove(item_id);
            self.events.publish(CanvasEvent::ItemErased {
                id: item_id.to_string(),
            });
        }
    }

    /// Run one deferred post-cycle step.
    ///
    /// Returns whether a step ran. The host calls this once per tick; steps
    /// never run inside the animation completion that queued them.
    pub fn pump(&mut self, ctx: &mut EngineContext<'_>) -> Result<bool> {
        let Some(step) = self.deferred.pop_front() else {
            return Ok(false);
        };
        match step {
            CycleStep::LoadPass => self.load_pass(ctx),
            CycleStep::CustomRenders => self.draw_custom_renders(ctx),
            CycleStep::ConfigureGestures => self.configure_gestures(ctx)?,
        }
        Ok(true)
    }

    /// Loading is the OR of three triggers: layout opt-in, an explicit
    /// reload flag, and intersection with the visible frame.
    fn should_load(&self, render: &Render, frame: &crate::geometry::Rect, ctx: &EngineContext<'_>) -> bool {
        if ctx.layout.should_load_render(render) || render.load_needed {
            return true;
        }
        render
            .element
            .map(|element| ctx.dom.rect(element).intersects(frame))
            .unwrap_or(false)
    }

    fn load_pass(&mut self, ctx: &mut EngineContext<'_>) {
        let Some(lctx) = self.context else {
            return;
        };
        let keys: Vec<(String, u32)> = self
            .renders
            .iter()
            .flat_map(|(item_id, m)| m.keys().map(move |id| (item_id.clone(), *id)))
            .collect();

        for (item_id, render_id) in keys {
            let Some(render) = self.render(&item_id, render_id).cloned() else {
                continue;
            };
            if render.is_erasing {
                continue;
            }
            let wanted = self.should_load(&render, &lctx.frame, ctx);
            if wanted && !render.loaded {
                ctx.layout.load_render(&render, ctx.dom);
            } else if !wanted && render.loaded {
                ctx.layout.unload_render(&render, ctx.dom);
            } else {
                continue;
            }
            if let Some(render) = self
                .renders
                .get_mut(&item_id)
                .and_then(|m| m.get_mut(&render_id))
            {
                render.loaded = wanted;
                render.load_needed = false;
            }
        }
    }

    fn draw_custom_renders(&mut self, ctx: &mut EngineContext<'_>) {
        let Some(lctx) = self.context else {
            return;
        };
        let descriptors = ctx.layout.custom_renders(&lctx, ctx.dom);
        if descriptors.is_empty() {
            // A cycle with no decorative overlay is still a settled cycle.
            self.events.publish(CanvasEvent::CustomRendersDrawn);
            return;
        }
        for descriptor in descriptors {
            self.draw_custom_render(
                descriptor.element,
                descriptor.transform,
                descriptor.animate,
                ctx,
            );
        }
    }

    /// (Re)build gesture group membership from the layout's per-render
    /// gesture options. Groups are created lazily the first time a cohort
    /// id is seen.
    fn configure_gestures(&mut self, ctx: &mut EngineContext<'_>) -> Result<()> {
        let Some(lctx) = self.context else {
            return Ok(());
        };
        let snapshot: Vec<Render> = self
            .renders
            .values()
            .flat_map(|m| m.values().cloned())
            .collect();

        for render in snapshot {
            if render.is_erasing {
                continue;
            }
            let Some(element) = render.element else {
                continue;
            };
            match ctx.layout.render_gesture_options(&render) {
                Some(options) => {
                    let group = self
                        .groups
                        .entry(options.group_id.clone())
                        .or_insert_with(|| {
                            GestureGroup::new(
                                options.group_id.clone(),
                                lctx.canvas,
                                GestureGroupOptions {
                                    gestures: options.gestures,
                                    motion: options.motion.clone(),
                                    padding_right: 0.0,
                                    padding_bottom: 0.0,
                                },
                                Arc::clone(&self.events),
                            )
                        });
                    group.add_member(element, &*ctx.dom)?;
                    if let Some(stored) = self
                        .renders
                        .get_mut(&render.item_id)
                        .and_then(|m| m.get_mut(&render.id))
                    {
                        stored.gesture_group = Some(options.group_id);
                    }
                }
                None => {
                    if let Some(group_id) = &render.gesture_group {
                        if let Some(group) = self.groups.get_mut(group_id) {
                            group.remove_member(element, &*ctx.dom);
                        }
                        if let Some(stored) = self
                            .renders
                            .get_mut(&render.item_id)
                            .and_then(|m| m.get_mut(&render.id))
                        {
                            stored.gesture_group = None;
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Dispatch a gesture signal to the group owning its element.
    pub fn apply_gesture(
        &mut self,
        event: &GestureEvent,
        ctx: &mut EngineContext<'_>,
    ) -> Result<()> {
        for group in self.groups.values_mut() {
            if group.contains(event.element) {
                return group.apply_gesture(event, ctx);
            }
        }
        Ok(())
    }

    /// Tear down every gesture group and clear the cohort annotation from
    /// every surviving render, so stale associations cannot leak into the
    /// next cycle.
    pub fn destroy_render_gestures(&mut self) {
        tracing::debug!(
            target: targets::RECONCILE,
            groups = self.groups.len(),
            "destroying render gestures"
        );
        self.groups.clear();
        for renders in self.renders.values_mut() {
            for render in renders.values_mut() {
                render.gesture_group = None;
            }
        }
    }

    #[cfg(test)]
    fn insert_render(&mut self, render: Render) {
        self.renders
            .entry(render.item_id.clone())
            .or_default()
            .insert(render.id, render);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animator::ManualAnimator;
    use crate::dom::{Dom, MemoryDom};
    use crate::geometry::{Rect, Size};
    use crate::item::ItemCollection;
    use crate::layout::{
        CustomRenderDescriptor, GestureOptions, Layout, RenderGestureOptions, RenderPlan,
    };
    use crate::motion::MotionOptions;
    use crate::style::StyleValue;
    use std::cell::RefCell;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// A layout driven by per-item descriptor scripts, recording every hook
    /// invocation.
    #[derive(Default)]
    struct ScriptedLayout {
        plans: RefCell<HashMap<String, Vec<RenderDescriptor>>>,
        initialized: RefCell<Vec<(String, u32)>>,
        loaded: RefCell<Vec<(String, u32)>>,
        unloaded: RefCell<Vec<(String, u32)>>,
        custom: RefCell<Vec<CustomRenderDescriptor>>,
        gesture_group: Option<String>,
    }

    impl ScriptedLayout {
        fn plan(&self, item_id: &str, descriptors: Vec<RenderDescriptor>) {
            self.plans
                .borrow_mut()
                .insert(item_id.to_string(), descriptors);
        }
    }

    impl Layout for ScriptedLayout {
        fn renders(&self, item: &Item, _ctx: &LayoutContext) -> RenderPlan {
            match self.plans.borrow().get(item.id()) {
                Some(descriptors) => RenderPlan::Many(descriptors.clone()),
                None => RenderPlan::None,
            }
        }

        fn initialize_render(&self, render: &Render, dom: &mut dyn Dom) {
            self.initialized
                .borrow_mut()
                .push((render.item_id.clone(), render.id));
            if let Some(element) = render.element {
                dom.set_size(element, Size::new(50.0, 50.0));
            }
        }

        fn load_render(&self, render: &Render, _dom: &mut dyn Dom) {
            self.loaded
                .borrow_mut()
                .push((render.item_id.clone(), render.id));
        }

        fn unload_render(&self, render: &Render, _dom: &mut dyn Dom) {
            self.unloaded
                .borrow_mut()
                .push((render.item_id.clone(), render.id));
        }

        fn custom_renders(
            &self,
            _ctx: &LayoutContext,
            _dom: &mut dyn Dom,
        ) -> Vec<CustomRenderDescriptor> {
            self.custom.borrow_mut().drain(..).collect()
        }

        fn render_gesture_options(&self, _render: &Render) -> Option<RenderGestureOptions> {
            self.gesture_group.as_ref().map(|group_id| RenderGestureOptions {
                group_id: group_id.clone(),
                gestures: GestureOptions::default(),
                motion: MotionOptions::default(),
            })
        }
    }

    struct Rig {
        dom: MemoryDom,
        animator: ManualAnimator,
        layout: ScriptedLayout,
        bus: Arc<EventBus<CanvasEvent>>,
        canvas: ElementId,
    }

    impl Rig {
        fn new() -> Self {
            let mut dom = MemoryDom::new();
            let canvas = dom.create_element_at("canvas", Rect::new(0.0, 0.0, 800.0, 600.0));
            Self {
                dom,
                animator: ManualAnimator::new(),
                layout: ScriptedLayout::default(),
                bus: Arc::new(EventBus::new()),
                canvas,
            }
        }

        fn lctx(&self) -> LayoutContext {
            LayoutContext {
                frame: Rect::new(0.0, 0.0, 800.0, 600.0),
                canvas: self.canvas,
                visible_count: 0,
            }
        }

        fn ctx(&mut self) -> EngineContext<'_> {
            EngineContext::new(&mut self.dom, &mut self.animator, &self.layout)
        }

        fn reconciler(&self) -> Reconciler {
            Reconciler::new(ReconcilerOptions::default(), Arc::clone(&self.bus))
        }

        fn settle(&mut self, reconciler: &mut Reconciler) {
            while let Some(id) = self.animator.finish_one(&mut self.dom) {
                let mut ctx =
                    EngineContext::new(&mut self.dom, &mut self.animator, &self.layout);
                reconciler.animation_finished(id, &mut ctx).unwrap();
            }
        }

        fn pump_all(&mut self, reconciler: &mut Reconciler) {
            loop {
                let mut ctx =
                    EngineContext::new(&mut self.dom, &mut self.animator, &self.layout);
                if !reconciler.pump(&mut ctx).unwrap() {
                    break;
                }
            }
        }
    }

    fn descriptor(left: f32) -> RenderDescriptor {
        RenderDescriptor::new(Transform::new().with_px("left", left))
    }

    fn make_item(id: &str, bus: &Arc<EventBus<CanvasEvent>>) -> Item {
        let mut collection = ItemCollection::new(Arc::clone(bus));
        collection.add_with_id(id, serde_json::Map::new());
        collection.get(id).unwrap().clone()
    }

    #[test]
    fn test_draw_item_creates_renders_with_ordinal_ids() {
        let mut rig = Rig::new();
        let item = make_item("a", &rig.bus);
        rig.layout
            .plan("a", vec![descriptor(0.0), descriptor(60.0)]);

        let mut reconciler = rig.reconciler();
        let lctx = rig.lctx();
        let mut ctx = rig.ctx();
        reconciler.draw_item(&item, &lctx, &mut ctx).unwrap();

        assert_eq!(reconciler.render_ids("a"), vec![0, 1]);
        assert_eq!(reconciler.render_animation_count(), 2);
        assert_eq!(
            rig.layout.initialized.borrow().as_slice(),
            &[("a".to_string(), 0), ("a".to_string(), 1)]
        );
        // Elements attached under the canvas.
        for render_id in [0, 1] {
            let element = reconciler.render("a", render_id).unwrap().element.unwrap();
            assert!(rig.dom.contains(rig.canvas, element));
        }
    }

    #[test]
    fn test_diff_partitions_merge_add_remove() {
        let mut rig = Rig::new();
        let lctx = rig.lctx();
        let mut reconciler = rig.reconciler();

        // Previous set {0, 1, 2}.
        let mut ctx = rig.ctx();
        reconciler
            .draw_renders(
                "a",
                vec![
                    (0, descriptor(0.0)),
                    (1, descriptor(60.0)),
                    (2, descriptor(120.0)),
                ],
                &lctx,
                &mut ctx,
            )
            .unwrap();
        rig.settle(&mut reconciler);
        rig.pump_all(&mut reconciler);
        let erased_element = reconciler.render("a", 0).unwrap().element.unwrap();
        rig.layout.initialized.borrow_mut().clear();

        // New set {1, 2, 3}: 1 and 2 merge, 0 erases, 3 is created.
        let mut ctx = rig.ctx();
        reconciler
            .draw_renders(
                "a",
                vec![
                    (1, descriptor(0.0)),
                    (2, descriptor(60.0)),
                    (3, descriptor(120.0)),
                ],
                &lctx,
                &mut ctx,
            )
            .unwrap();

        assert!(reconciler.render("a", 0).unwrap().is_erasing);
        assert_eq!(
            rig.layout.initialized.borrow().as_slice(),
            &[("a".to_string(), 3)]
        );

        rig.settle(&mut reconciler);
        assert_eq!(reconciler.render_ids("a"), vec![1, 2, 3]);
        assert!(!rig.dom.exists(erased_element));
    }

    #[test]
    fn test_unchanged_merge_runs_instant_pipeline() {
        let mut rig = Rig::new();
        let item = make_item("a", &rig.bus);
        rig.layout.plan("a", vec![descriptor(40.0)]);

        let drawn = Arc::new(AtomicUsize::new(0));
        let drawn2 = Arc::clone(&drawn);
        rig.bus
            .subscribe("canvas:renders:drawn", move |_: &CanvasEvent| {
                drawn2.fetch_add(1, Ordering::SeqCst);
            });

        let mut reconciler = rig.reconciler();
        let lctx = rig.lctx();
        let mut ctx = rig.ctx();
        reconciler.draw_item(&item, &lctx, &mut ctx).unwrap();
        rig.settle(&mut reconciler);
        rig.pump_all(&mut reconciler);
        assert_eq!(drawn.load(Ordering::SeqCst), 1);

        // Same target again: the animation request is instant, but the
        // cycle completes normally.
        let mut ctx = rig.ctx();
        reconciler.draw_item(&item, &lctx, &mut ctx).unwrap();
        let request = rig.animator.request_at(0).unwrap();
        assert!(request.options.instant);
        assert_eq!(request.options.duration_ms, 0.0);

        rig.settle(&mut reconciler);
        assert_eq!(drawn.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_slot_bucketing_thresholds() {
        let mut rig = Rig::new();
        let item = make_item("a", &rig.bus);
        rig.layout.plan(
            "a",
            (0..5).map(|i| descriptor(i as f32 * 60.0)).collect(),
        );

        let mut reconciler = Reconciler::new(
            ReconcilerOptions {
                items_per_render_slot: 2,
                max_slots_with_animations: 1,
                slot_render_delay_ms: 100.0,
            },
            Arc::clone(&rig.bus),
        );
        let lctx = rig.lctx();
        let mut ctx = rig.ctx();
        reconciler.draw_item(&item, &lctx, &mut ctx).unwrap();

        // Slot 0 (renders 0-1) animates with no stagger.
        for index in 0..2 {
            let request = rig.animator.request_at(index).unwrap();
            assert!(!request.options.instant);
            assert_eq!(request.options.delay_ms, 0.0);
        }
        // Slot 1 (renders 2-3) is past the animated slots: instant with
        // half the stagger.
        for index in 2..4 {
            let request = rig.animator.request_at(index).unwrap();
            assert!(request.options.instant);
            assert_eq!(request.options.delay_ms, 50.0);
        }
        // Slot 2 (render 4): instant, half of 200.
        let request = rig.animator.request_at(4).unwrap();
        assert!(request.options.instant);
        assert_eq!(request.options.delay_ms, 100.0);
    }

    #[test]
    fn test_cycle_zero_signals_are_independent() {
        let mut rig = Rig::new();
        let item = make_item("a", &rig.bus);
        rig.layout.plan(
            "a",
            vec![descriptor(0.0), descriptor(60.0), descriptor(120.0)],
        );
        let overlay_a = rig.dom.create_element("divider");
        let overlay_b = rig.dom.create_element("divider");
        rig.layout.custom.borrow_mut().extend([
            CustomRenderDescriptor {
                element: overlay_a,
                transform: Transform::new().with("opacity", StyleValue::Number(1.0)),
                animate: AnimateOptions::default(),
            },
            CustomRenderDescriptor {
                element: overlay_b,
                transform: Transform::new().with("opacity", StyleValue::Number(1.0)),
                animate: AnimateOptions::default(),
            },
        ]);

        let drawn = Arc::new(AtomicUsize::new(0));
        let custom_drawn = Arc::new(AtomicUsize::new(0));
        let drawn2 = Arc::clone(&drawn);
        rig.bus
            .subscribe("canvas:renders:drawn", move |_: &CanvasEvent| {
                drawn2.fetch_add(1, Ordering::SeqCst);
            });
        let custom2 = Arc::clone(&custom_drawn);
        rig.bus
            .subscribe("canvas:custom:renders:drawn", move |_: &CanvasEvent| {
                custom2.fetch_add(1, Ordering::SeqCst);
            });

        let mut reconciler = rig.reconciler();
        let lctx = rig.lctx();
        let mut ctx = rig.ctx();
        reconciler.draw_item(&item, &lctx, &mut ctx).unwrap();
        assert_eq!(reconciler.render_animation_count(), 3);

        // Two of three item completions: no signal yet.
        for _ in 0..2 {
            let id = rig.animator.finish_one(&mut rig.dom).unwrap();
            let mut ctx = rig.ctx();
            reconciler.animation_finished(id, &mut ctx).unwrap();
        }
        assert_eq!(drawn.load(Ordering::SeqCst), 0);

        // Third completion fires the item signal regardless of customs.
        let id = rig.animator.finish_one(&mut rig.dom).unwrap();
        let mut ctx = rig.ctx();
        reconciler.animation_finished(id, &mut ctx).unwrap();
        assert_eq!(drawn.load(Ordering::SeqCst), 1);

        // Load pass, then the custom render step issues both overlays.
        rig.pump_all(&mut reconciler);
        assert_eq!(reconciler.custom_render_animation_count(), 2);

        let id = rig.animator.finish_one(&mut rig.dom).unwrap();
        let mut ctx = rig.ctx();
        reconciler.animation_finished(id, &mut ctx).unwrap();
        assert_eq!(custom_drawn.load(Ordering::SeqCst), 0);

        let id = rig.animator.finish_one(&mut rig.dom).unwrap();
        let mut ctx = rig.ctx();
        reconciler.animation_finished(id, &mut ctx).unwrap();
        assert_eq!(custom_drawn.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_erase_item_removes_everything_and_signals() {
        let mut rig = Rig::new();
        let item = make_item("a", &rig.bus);
        rig.layout.plan("a", vec![descriptor(0.0), descriptor(60.0)]);

        let erased = Arc::new(AtomicUsize::new(0));
        let erased2 = Arc::clone(&erased);
        rig.bus.subscribe("item:erased", move |_: &CanvasEvent| {
            erased2.fetch_add(1, Ordering::SeqCst);
        });

        let mut reconciler = rig.reconciler();
        let lctx = rig.lctx();
        let mut ctx = rig.ctx();
        reconciler.draw_item(&item, &lctx, &mut ctx).unwrap();
        rig.settle(&mut reconciler);
        rig.pump_all(&mut reconciler);

        let elements: Vec<ElementId> = [0, 1]
            .iter()
            .map(|&id| reconciler.render("a", id).unwrap().element.unwrap())
            .collect();

        let mut ctx = rig.ctx();
        reconciler.erase_item("a", &mut ctx).unwrap();
        rig.settle(&mut reconciler);

        assert_eq!(erased.load(Ordering::SeqCst), 1);
        assert!(reconciler.render_ids("a").is_empty());
        for element in elements {
            assert!(!rig.dom.exists(element));
        }
    }

    #[test]
    fn test_redraw_revives_render_mid_erase() {
        let mut rig = Rig::new();
        let lctx = rig.lctx();
        let mut reconciler = rig.reconciler();

        let mut ctx = rig.ctx();
        reconciler
            .draw_renders(
                "a",
                vec![(0, descriptor(0.0)), (1, descriptor(60.0))],
                &lctx,
                &mut ctx,
            )
            .unwrap();
        rig.settle(&mut reconciler);
        rig.pump_all(&mut reconciler);

        // Start erasing render 1 but leave the erase animation in flight.
        let mut ctx = rig.ctx();
        reconciler
            .draw_renders("a", vec![(0, descriptor(0.0))], &lctx, &mut ctx)
            .unwrap();
        assert!(reconciler.render("a", 1).unwrap().is_erasing);

        // The layout asks for render 1 again before the erase completes.
        let mut ctx = rig.ctx();
        reconciler
            .draw_renders(
                "a",
                vec![(0, descriptor(0.0)), (1, descriptor(60.0))],
                &lctx,
                &mut ctx,
            )
            .unwrap();
        assert!(!reconciler.render("a", 1).unwrap().is_erasing);

        rig.settle(&mut reconciler);
        assert_eq!(reconciler.render_ids("a"), vec![0, 1]);
        let revived = reconciler.render("a", 1).unwrap();
        assert!(!revived.is_erasing);
        assert!(rig.dom.exists(revived.element.unwrap()));
        assert_eq!(reconciler.render_animation_count(), 0);
    }

    #[test]
    fn test_deferred_chain_runs_one_step_per_pump() {
        let mut rig = Rig::new();
        let item = make_item("a", &rig.bus);
        rig.layout.plan("a", vec![descriptor(0.0)]);
        let overlay = rig.dom.create_element("divider");
        rig.layout.custom.borrow_mut().push(CustomRenderDescriptor {
            element: overlay,
            transform: Transform::new().with("opacity", StyleValue::Number(1.0)),
            animate: AnimateOptions::default(),
        });

        let mut reconciler = rig.reconciler();
        let lctx = rig.lctx();
        let mut ctx = rig.ctx();
        reconciler.draw_item(&item, &lctx, &mut ctx).unwrap();
        rig.settle(&mut reconciler);
        assert!(reconciler.has_pending_steps());

        // Step one: the load pass only.
        let mut ctx = rig.ctx();
        assert!(reconciler.pump(&mut ctx).unwrap());
        assert_eq!(rig.layout.loaded.borrow().len(), 1);
        assert_eq!(reconciler.custom_render_animation_count(), 0);

        // Step two: custom renders only.
        let mut ctx = rig.ctx();
        assert!(reconciler.pump(&mut ctx).unwrap());
        assert_eq!(reconciler.custom_render_animation_count(), 1);

        // Step three: gesture configuration; then the queue is drained.
        let mut ctx = rig.ctx();
        assert!(reconciler.pump(&mut ctx).unwrap());
        let mut ctx = rig.ctx();
        assert!(!reconciler.pump(&mut ctx).unwrap());
    }

    #[test]
    fn test_load_pass_visibility_trigger() {
        let mut rig = Rig::new();
        let item = make_item("a", &rig.bus);
        // One render inside the 800x600 frame, one far outside it.
        rig.layout
            .plan("a", vec![descriptor(10.0), descriptor(5000.0)]);

        let mut reconciler = rig.reconciler();
        let lctx = rig.lctx();
        let mut ctx = rig.ctx();
        reconciler.draw_item(&item, &lctx, &mut ctx).unwrap();
        rig.settle(&mut reconciler);
        rig.pump_all(&mut reconciler);

        assert_eq!(
            rig.layout.loaded.borrow().as_slice(),
            &[("a".to_string(), 0)]
        );
        assert!(reconciler.render("a", 0).unwrap().loaded);
        assert!(!reconciler.render("a", 1).unwrap().loaded);
    }

    #[test]
    fn test_reload_flag_is_one_shot() {
        let mut rig = Rig::new();
        let item = make_item("a", &rig.bus);
        rig.layout.plan("a", vec![descriptor(5000.0)]);

        let mut reconciler = rig.reconciler();
        let lctx = rig.lctx();
        let mut ctx = rig.ctx();
        reconciler.draw_item(&item, &lctx, &mut ctx).unwrap();
        rig.settle(&mut reconciler);
        rig.pump_all(&mut reconciler);
        // Out of frame, no opt-in: not loaded.
        assert!(!reconciler.render("a", 0).unwrap().loaded);

        reconciler.request_reload("a", 0);
        let mut ctx = rig.ctx();
        reconciler.draw_item(&item, &lctx, &mut ctx).unwrap();
        rig.settle(&mut reconciler);
        rig.pump_all(&mut reconciler);

        let render = reconciler.render("a", 0).unwrap();
        assert!(render.loaded);
        assert!(!render.load_needed);
    }

    #[test]
    fn test_gesture_group_lifecycle() {
        let mut rig = Rig::new();
        rig.layout.gesture_group = Some("panels".to_string());
        let item_a = make_item("a", &rig.bus);
        let item_b = make_item("b", &rig.bus);
        rig.layout.plan("a", vec![descriptor(0.0)]);
        rig.layout.plan("b", vec![descriptor(60.0)]);

        let mut reconciler = rig.reconciler();
        let lctx = rig.lctx();
        let mut ctx = rig.ctx();
        reconciler.draw_item(&item_a, &lctx, &mut ctx).unwrap();
        reconciler.draw_item(&item_b, &lctx, &mut ctx).unwrap();
        rig.settle(&mut reconciler);
        rig.pump_all(&mut reconciler);

        let group = reconciler.group("panels").unwrap();
        assert_eq!(group.len(), 2);
        assert_eq!(
            reconciler.render("a", 0).unwrap().gesture_group.as_deref(),
            Some("panels")
        );

        // Erasing one item drops its member from the group.
        let mut ctx = rig.ctx();
        reconciler.erase_item("a", &mut ctx).unwrap();
        rig.settle(&mut reconciler);
        rig.pump_all(&mut reconciler);
        assert_eq!(reconciler.group("panels").unwrap().len(), 1);

        reconciler.destroy_render_gestures();
        assert!(reconciler.group("panels").is_none());
        assert_eq!(reconciler.render("b", 0).unwrap().gesture_group, None);
    }

    #[test]
    fn test_draw_render_without_element_is_an_error() {
        let mut rig = Rig::new();
        let mut reconciler = rig.reconciler();
        let mut render = Render::new("a", 0, rig.canvas);
        render.element = None;
        reconciler.insert_render(render);

        let mut ctx = rig.ctx();
        let err = reconciler.draw_render("a", 0, false, &mut ctx);
        assert!(matches!(
            err,
            Err(Error::RenderWithoutElement { render_id: 0, .. })
        ));
    }

    #[test]
    fn test_erase_absent_render_is_a_noop() {
        let mut rig = Rig::new();
        let mut reconciler = rig.reconciler();
        let mut ctx = rig.ctx();
        reconciler.erase_render("nope", 7, &mut ctx).unwrap();
        assert_eq!(reconciler.render_animation_count(), 0);
    }
}
