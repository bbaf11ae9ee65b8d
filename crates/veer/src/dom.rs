//! The document access collaborator.
//!
//! The engine never touches a real document tree directly; everything it
//! needs — element creation, styled position, geometry queries, scroll
//! offsets, visibility — goes through the [`Dom`] trait. A browser embedding
//! implements it over real nodes; [`MemoryDom`] is the headless reference
//! backend used by the tests and by server-less hosts.

use slotmap::{new_key_type, SlotMap};

use crate::geometry::{Point, Rect, Size};
use crate::style::{StyleValue, Transform};

new_key_type! {
    /// A handle to one element owned by a [`Dom`] implementation.
    pub struct ElementId;
}

/// Document access as consumed by the engine.
///
/// Coordinates are canvas-relative throughout. `position` is the *styled*
/// top/left pair (what positional movement mutates); `rect` is the laid-out
/// rectangle including size.
pub trait Dom {
    /// Create a detached element with the given class name.
    fn create_element(&mut self, class_name: &str) -> ElementId;

    /// Remove an element (and detach it from its parent).
    ///
    /// Removing an unknown element is a no-op; returns whether anything was
    /// removed.
    fn remove_element(&mut self, id: ElementId) -> bool;

    /// Attach `child` under `parent`.
    fn append_child(&mut self, parent: ElementId, child: ElementId);

    /// Whether `child` is currently attached directly under `parent`.
    fn contains(&self, parent: ElementId, child: ElementId) -> bool;

    /// The laid-out rectangle of an element.
    fn rect(&self, id: ElementId) -> Rect;

    /// The styled top/left position of an element.
    fn position(&self, id: ElementId) -> Point;

    /// Set the styled top/left position of an element.
    fn set_position(&mut self, id: ElementId, position: Point);

    /// Set an element's size.
    fn set_size(&mut self, id: ElementId, size: Size);

    /// Apply a set of style properties to an element.
    fn apply_styles(&mut self, id: ElementId, transform: &Transform);

    /// The scroll offset of a container element.
    fn scroll_offset(&self, id: ElementId) -> Point;

    /// Set the scroll offset of a container element.
    ///
    /// Implementations clamp to the scrollable range the way a browser
    /// does; callers never see overflowed offsets.
    fn set_scroll_offset(&mut self, id: ElementId, offset: Point);

    /// Children of `parent` carrying the given class name.
    fn children_with_class(&self, parent: ElementId, class_name: &str) -> Vec<ElementId>;

    /// Whether an element is currently visible.
    fn is_visible(&self, id: ElementId) -> bool;
}

/// One element in the in-memory tree.
#[derive(Debug, Clone)]
struct ElementNode {
    class_name: String,
    rect: Rect,
    scroll: Point,
    visible: bool,
    parent: Option<ElementId>,
    children: Vec<ElementId>,
    styles: Transform,
}

/// An in-memory [`Dom`] backend.
///
/// Mirrors the subset of document behavior the engine observes: styled
/// `left`/`top` properties move the element's rectangle, scroll offsets are
/// clamped to non-negative values, and class-name child queries walk direct
/// children only.
#[derive(Debug, Default)]
pub struct MemoryDom {
    nodes: SlotMap<ElementId, ElementNode>,
}

impl MemoryDom {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an element with an explicit rectangle.
    pub fn create_element_at(&mut self, class_name: &str, rect: Rect) -> ElementId {
        let id = self.create_element(class_name);
        self.set_rect(id, rect);
        id
    }

    /// Overwrite an element's laid-out rectangle.
    pub fn set_rect(&mut self, id: ElementId, rect: Rect) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.rect = rect;
        }
    }

    /// Set an element's visibility.
    pub fn set_visible(&mut self, id: ElementId, visible: bool) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.visible = visible;
        }
    }

    /// Whether the element exists in the tree.
    pub fn exists(&self, id: ElementId) -> bool {
        self.nodes.contains_key(id)
    }

    /// The element's class name.
    pub fn class_name(&self, id: ElementId) -> Option<&str> {
        self.nodes.get(id).map(|n| n.class_name.as_str())
    }

    /// The last style value applied for a property, if any.
    pub fn style(&self, id: ElementId, name: &str) -> Option<&StyleValue> {
        self.nodes.get(id).and_then(|n| n.styles.get(name))
    }

    /// Number of live elements.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree is empty.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl Dom for MemoryDom {
    fn create_element(&mut self, class_name: &str) -> ElementId {
        self.nodes.insert(ElementNode {
            class_name: class_name.to_string(),
            rect: Rect::ZERO,
            scroll: Point::ZERO,
            visible: true,
            parent: None,
            children: Vec::new(),
            styles: Transform::new(),
        })
    }

    fn remove_element(&mut self, id: ElementId) -> bool {
        let Some(node) = self.nodes.remove(id) else {
            return false;
        };
        if let Some(parent) = node.parent {
            if let Some(parent_node) = self.nodes.get_mut(parent) {
                parent_node.children.retain(|&c| c != id);
            }
        }
        for child in node.children {
            if let Some(child_node) = self.nodes.get_mut(child) {
                child_node.parent = None;
            }
        }
        true
    }

    fn append_child(&mut self, parent: ElementId, child: ElementId) {
        if let Some(child_node) = self.nodes.get_mut(child) {
            if let Some(old_parent) = child_node.parent.replace(parent) {
                if let Some(old) = self.nodes.get_mut(old_parent) {
                    old.children.retain(|&c| c != child);
                }
            }
        } else {
            return;
        }
        if let Some(parent_node) = self.nodes.get_mut(parent) {
            if !parent_node.children.contains(&child) {
                parent_node.children.push(child);
            }
        }
    }

    fn contains(&self, parent: ElementId, child: ElementId) -> bool {
        self.nodes
            .get(child)
            .map(|n| n.parent == Some(parent))
            .unwrap_or(false)
    }

    fn rect(&self, id: ElementId) -> Rect {
        self.nodes.get(id).map(|n| n.rect).unwrap_or(Rect::ZERO)
    }

    fn position(&self, id: ElementId) -> Point {
        self.nodes
            .get(id)
            .map(|n| n.rect.origin)
            .unwrap_or(Point::ZERO)
    }

    fn set_position(&mut self, id: ElementId, position: Point) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.rect = node.rect.moved_to(position);
            node.styles.set("left", StyleValue::Px(position.x));
            node.styles.set("top", StyleValue::Px(position.y));
        }
    }

    fn set_size(&mut self, id: ElementId, size: Size) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.rect = node.rect.resized(size);
        }
    }

    fn apply_styles(&mut self, id: ElementId, transform: &Transform) {
        let Some(node) = self.nodes.get_mut(id) else {
            return;
        };
        node.styles.merge(transform);
        // Positional properties move the laid-out rectangle, as a real
        // document would on style application.
        if let Some(left) = transform.get_f32("left") {
            node.rect.origin.x = left;
        }
        if let Some(top) = transform.get_f32("top") {
            node.rect.origin.y = top;
        }
        // Scroll properties behave like scroll offsets, clamped at zero.
        if let Some(scroll_left) = transform.get_f32("scrollLeft") {
            node.scroll.x = scroll_left.max(0.0);
        }
        if let Some(scroll_top) = transform.get_f32("scrollTop") {
            node.scroll.y = scroll_top.max(0.0);
        }
    }

    fn scroll_offset(&self, id: ElementId) -> Point {
        self.nodes.get(id).map(|n| n.scroll).unwrap_or(Point::ZERO)
    }

    fn set_scroll_offset(&mut self, id: ElementId, offset: Point) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.scroll = Point::new(offset.x.max(0.0), offset.y.max(0.0));
        }
    }

    fn children_with_class(&self, parent: ElementId, class_name: &str) -> Vec<ElementId> {
        let Some(node) = self.nodes.get(parent) else {
            return Vec::new();
        };
        node.children
            .iter()
            .copied()
            .filter(|&c| {
                self.nodes
                    .get(c)
                    .map(|n| n.class_name == class_name)
                    .unwrap_or(false)
            })
            .collect()
    }

    fn is_visible(&self, id: ElementId) -> bool {
        self.nodes.get(id).map(|n| n.visible).unwrap_or(false)
    }
}
