//! Gesture vocabulary and engine bus messages.
//!
//! [`GestureKind`] is the fixed set of gesture signals the motion engine
//! answers to; dispatch over it is always an explicit `match`, never name
//! lookup. [`CanvasEvent`] is the message type the engine publishes on the
//! shared [`EventBus`](veer_core::EventBus).

use veer_core::BusMessage;

use crate::dom::ElementId;
use crate::geometry::{Point, Rect};

/// The gesture signals understood by the motion engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GestureKind {
    /// A pan sequence began (pointer down and moving).
    PanStart,
    /// A horizontal pan frame.
    PanX,
    /// A vertical pan frame.
    PanY,
    /// A free pan frame (both axes).
    PanAny,
    /// The pan sequence ended (pointer released).
    PanEnd,
    /// The pan sequence was cancelled by the input source.
    PanCancel,
    /// A horizontal swipe (release with velocity).
    SwipeX,
    /// A vertical swipe.
    SwipeY,
    /// A free swipe.
    SwipeAny,
    /// A tap.
    Tap,
    /// A press (touch-and-hold).
    Press,
    /// A native scroll of the container.
    Scroll,
}

impl GestureKind {
    /// Whether this is one of the pan signals (including start/end/cancel).
    #[inline]
    pub fn is_pan(self) -> bool {
        matches!(
            self,
            Self::PanStart
                | Self::PanX
                | Self::PanY
                | Self::PanAny
                | Self::PanEnd
                | Self::PanCancel
        )
    }

    /// Whether this is one of the swipe signals.
    #[inline]
    pub fn is_swipe(self) -> bool {
        matches!(self, Self::SwipeX | Self::SwipeY | Self::SwipeAny)
    }

    /// The event-name string for this signal.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PanStart => "pan:start",
            Self::PanX => "pan:x",
            Self::PanY => "pan:y",
            Self::PanAny => "pan:any",
            Self::PanEnd => "pan:end",
            Self::PanCancel => "pan:cancel",
            Self::SwipeX => "swipe:x",
            Self::SwipeY => "swipe:y",
            Self::SwipeAny => "swipe:any",
            Self::Tap => "tap",
            Self::Press => "press",
            Self::Scroll => "scroll",
        }
    }
}

/// A single gesture signal aimed at one element.
///
/// `delta` is cumulative movement since the start of the gesture sequence,
/// not a per-frame step. `velocity` is the release velocity in px/ms; by
/// convention a positive velocity moves content in the negative-coordinate
/// direction (the "inertial drag" feel).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureEvent {
    /// Which signal this is.
    pub kind: GestureKind,
    /// The element the gesture originated on.
    pub element: ElementId,
    /// Current pointer position.
    pub position: Point,
    /// Cumulative pan delta since the sequence started.
    pub delta: Point,
    /// Release velocity in px/ms (zero except for swipes).
    pub velocity: Point,
}

impl GestureEvent {
    /// Create a gesture event with zero deltas and velocity.
    pub fn new(kind: GestureKind, element: ElementId) -> Self {
        Self {
            kind,
            element,
            position: Point::ZERO,
            delta: Point::ZERO,
            velocity: Point::ZERO,
        }
    }

    /// Set the pointer position.
    pub fn with_position(mut self, position: Point) -> Self {
        self.position = position;
        self
    }

    /// Set the cumulative delta.
    pub fn with_delta(mut self, delta: Point) -> Self {
        self.delta = delta;
        self
    }

    /// Set the release velocity.
    pub fn with_velocity(mut self, velocity: Point) -> Self {
        self.velocity = velocity;
        self
    }

    /// The same event retargeted at another element.
    ///
    /// Used by gesture groups to re-dispatch a member's gesture to the rest
    /// of the cohort without re-deriving gesture semantics.
    pub fn with_element(mut self, element: ElementId) -> Self {
        self.element = element;
        self
    }
}

/// Messages published by the engine on the shared event bus.
#[derive(Debug, Clone, PartialEq)]
pub enum CanvasEvent {
    /// An item's data record changed.
    ItemChanged { id: String },
    /// A reindex pass changed at least one display index.
    ItemsReindexed { changed: usize },
    /// An erasing item's last render finished erasing.
    ItemErased { id: String },
    /// A logical movement (both axes) of an element settled, including any
    /// snap that followed it.
    MovementComplete { element: ElementId },
    /// An element was tapped.
    ElementTapped { element: ElementId },
    /// An element was pressed (touch-and-hold).
    ElementPressed { element: ElementId },
    /// A container scrolled under an element.
    ElementScrolled { element: ElementId },
    /// Every item-render animation of the current draw cycle completed.
    RendersDrawn,
    /// Every custom-render animation of the current draw cycle completed.
    CustomRendersDrawn,
    /// The canvas was resized by the positioning shell.
    FrameBoundsChanged { bounds: Rect },
}

impl BusMessage for CanvasEvent {
    fn kind(&self) -> &'static str {
        match self {
            Self::ItemChanged { .. } => "item:changed",
            Self::ItemsReindexed { .. } => "items:reindexed",
            Self::ItemErased { .. } => "item:erased",
            Self::MovementComplete { .. } => "gesture:movement:complete",
            Self::ElementTapped { .. } => "gesture:tap",
            Self::ElementPressed { .. } => "gesture:press",
            Self::ElementScrolled { .. } => "gesture:scroll",
            Self::RendersDrawn => "canvas:renders:drawn",
            Self::CustomRendersDrawn => "canvas:custom:renders:drawn",
            Self::FrameBoundsChanged { .. } => "frame:bounds:changed",
        }
    }
}
