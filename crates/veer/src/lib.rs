//! A gesture-driven kinetic canvas engine.
//!
//! veer turns a collection of data items into a set of positioned,
//! animated renders on a scrollable canvas, and keeps them responsive to
//! pointer gestures:
//!
//! - [`ItemCollection`] holds the data records and computes display
//!   indices under the current filter/sort/reverse configuration.
//! - A [`Layout`] strategy decides what every item looks like: target
//!   transforms, animations, loading and gesture policy.
//! - The [`Reconciler`] diffs the layout's answer against what is on the
//!   canvas and animates additions, merges and removals to settlement.
//! - [`GestureMotion`] engines translate pans and swipes into positional
//!   or scroll movement with inertia, bounds resistance and snapping;
//!   [`GestureGroup`]s mirror one gesture across a cohort of elements.
//! - [`Canvas`] owns the viewport frame and sizes the canvas to content.
//!
//! The engine is headless and single-threaded: document access and
//! animation run behind the [`Dom`] and [`Animator`] traits, lent to each
//! operation through an [`EngineContext`]. [`MemoryDom`] and
//! [`ManualAnimator`] are complete in-memory backends, which is also how
//! the engine is tested. Completion is explicit: when the host's animation
//! engine settles an animation it feeds the id back through
//! `animation_finished`, and deferred post-cycle work runs one step per
//! [`Reconciler::pump`] call.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use veer::{
//!     EngineContext, Item, ItemCollection, Layout, LayoutContext, ManualAnimator,
//!     MemoryDom, Point, Reconciler, ReconcilerOptions, Rect, RenderDescriptor,
//!     RenderPlan, Transform,
//! };
//! use veer_core::EventBus;
//!
//! struct Row;
//!
//! impl Layout for Row {
//!     fn renders(&self, item: &Item, _ctx: &LayoutContext) -> RenderPlan {
//!         let left = item.index() as f32 * 120.0;
//!         RenderPlan::Single(RenderDescriptor::new(Transform::new().with_px("left", left)))
//!     }
//! }
//!
//! let bus = Arc::new(EventBus::new());
//! let mut dom = MemoryDom::new();
//! let mut animator = ManualAnimator::new();
//! let layout = Row;
//!
//! let mut items = ItemCollection::new(Arc::clone(&bus));
//! items.add_with_id("a", serde_json::Map::new());
//! items.reindex();
//!
//! let canvas = dom.create_element_at("canvas", Rect::new(0.0, 0.0, 800.0, 600.0));
//! let lctx = LayoutContext {
//!     frame: Rect::new(0.0, 0.0, 800.0, 600.0),
//!     canvas,
//!     visible_count: 1,
//! };
//!
//! let mut reconciler = Reconciler::new(ReconcilerOptions::default(), Arc::clone(&bus));
//! let item = items.get("a").unwrap().clone();
//! let mut ctx = EngineContext::new(&mut dom, &mut animator, &layout);
//! reconciler.draw_item(&item, &lctx, &mut ctx).unwrap();
//!
//! // The host settles animations and routes completions back in.
//! for id in animator.finish_all(&mut dom) {
//!     let mut ctx = EngineContext::new(&mut dom, &mut animator, &layout);
//!     reconciler.animation_finished(id, &mut ctx).unwrap();
//! }
//!
//! use veer::Dom;
//! let element = reconciler.render("a", 0).unwrap().element.unwrap();
//! assert_eq!(dom.position(element), Point::new(0.0, 0.0));
//! ```

pub mod animator;
pub mod canvas;
pub mod context;
pub mod dom;
pub mod error;
pub mod events;
pub mod geometry;
pub mod group;
pub mod item;
pub mod layout;
pub mod motion;
pub mod reconcile;
pub mod style;

pub use animator::{AnimationId, AnimationRequest, Animator, ManualAnimator};
pub use canvas::Canvas;
pub use context::EngineContext;
pub use dom::{Dom, ElementId, MemoryDom};
pub use error::{Error, Result};
pub use events::{CanvasEvent, GestureEvent, GestureKind};
pub use geometry::{Point, Rect, Size};
pub use group::{GestureGroup, GestureGroupOptions};
pub use item::{Item, ItemCollection, INDEX_FILTERED_OUT};
pub use layout::{
    CanvasBoundsOptions, CustomRenderDescriptor, GestureOptions, Layout, LayoutContext,
    RenderDescriptor, RenderGestureOptions, RenderPlan,
};
pub use motion::{GestureMotion, MotionOptions, MovementMode, SnapOptions};
pub use reconcile::{Reconciler, ReconcilerOptions, Render};
pub use style::{AnimateOptions, Easing, StyleValue, Transform};
