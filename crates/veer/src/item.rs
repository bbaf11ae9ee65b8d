//! Items and the item collection.
//!
//! An [`Item`] is one data record backing zero or more visual renders. The
//! [`ItemCollection`] owns its items, the current filter/sort/reverse
//! configuration, and the display indices: after [`ItemCollection::reindex`]
//! the items passing the filter carry a dense `0..N-1` index in view order
//! and everything else carries `-1`.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{Map, Value};
use veer_core::EventBus;

use crate::events::CanvasEvent;

/// Display index marking an item as excluded from the current view.
pub const INDEX_FILTERED_OUT: i32 = -1;

/// A predicate deciding whether an item is part of the current view.
pub type FilterFn = dyn Fn(&Item) -> bool;

/// A key function producing the sort value for an item.
pub type SortKeyFn = dyn Fn(&Item) -> Value;

/// One data record with a stable identity and a computed display index.
///
/// Serializes with its current index so hosts can export view state as-is.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Item {
    id: String,
    index: i32,
    data: Map<String, Value>,
}

impl Item {
    fn new(id: String, data: Map<String, Value>) -> Self {
        Self {
            id,
            index: INDEX_FILTERED_OUT,
            data,
        }
    }

    /// The item's identity, immutable once set.
    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The display index; [`INDEX_FILTERED_OUT`] when excluded from view.
    #[inline]
    pub fn index(&self) -> i32 {
        self.index
    }

    /// The item's data record.
    #[inline]
    pub fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    /// A single data field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// A single data field as an `f64`.
    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.data.get(key).and_then(Value::as_f64)
    }

    /// Set a data field in place, returning whether the stored value changed.
    pub fn set_value(&mut self, key: impl Into<String>, value: Value) -> bool {
        let key = key.into();
        if self.data.get(&key) == Some(&value) {
            return false;
        }
        self.data.insert(key, value);
        true
    }

    fn set_index(&mut self, index: i32) -> bool {
        if self.index == index {
            return false;
        }
        self.index = index;
        true
    }
}

/// Compare two sort values with a total order: null, then booleans, then
/// numbers, then strings; anything else compares by its JSON rendering.
fn compare_sort_values(a: &Value, b: &Value) -> std::cmp::Ordering {
    use std::cmp::Ordering;

    fn rank(v: &Value) -> u8 {
        match v {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            _ => 4,
        }
    }

    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ if rank(a) != rank(b) => rank(a).cmp(&rank(b)),
        _ => a.to_string().cmp(&b.to_string()),
    }
}

/// An ordered, filterable, sortable set of items.
///
/// Insertion order is retained only as the fallback view order; display
/// order is the `index` assigned by [`reindex`](Self::reindex).
pub struct ItemCollection {
    items: HashMap<String, Item>,
    /// Insertion order of item ids.
    order: Vec<String>,
    filter: Option<Box<FilterFn>>,
    sort_key: Option<Box<SortKeyFn>>,
    reversed: bool,
    next_generated_id: u64,
    events: Arc<EventBus<CanvasEvent>>,
}

impl ItemCollection {
    /// Create an empty collection publishing on the given bus.
    pub fn new(events: Arc<EventBus<CanvasEvent>>) -> Self {
        Self {
            items: HashMap::new(),
            order: Vec::new(),
            filter: None,
            sort_key: None,
            reversed: false,
            next_generated_id: 0,
            events,
        }
    }

    /// Number of items, filtered or not.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the collection holds no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Get an item by id.
    pub fn get(&self, id: &str) -> Option<&Item> {
        self.items.get(id)
    }

    /// Derive an identity for a new data record: a conventional `"id"`
    /// field (number or string) when present, else a generated unique value.
    fn derive_id(&mut self, data: &Map<String, Value>) -> String {
        match data.get("id") {
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::String(s)) => s.clone(),
            _ => {
                let id = format!("item-{}", self.next_generated_id);
                self.next_generated_id += 1;
                id
            }
        }
    }

    /// Insert a data record, deriving its identity. Returns the new id.
    ///
    /// Inserting a record whose derived id already exists replaces that
    /// item's data while keeping its identity and index.
    pub fn add(&mut self, data: Map<String, Value>) -> String {
        let id = self.derive_id(&data);
        self.add_with_id(id.clone(), data);
        id
    }

    /// Insert a data record under an explicit identity.
    pub fn add_with_id(&mut self, id: impl Into<String>, data: Map<String, Value>) {
        let id = id.into();
        match self.items.get_mut(&id) {
            Some(existing) => {
                existing.data = data;
            }
            None => {
                self.items.insert(id.clone(), Item::new(id.clone(), data));
                self.order.push(id);
            }
        }
    }

    /// Remove an item. Removing an unknown id is a no-op.
    pub fn remove(&mut self, id: &str) -> Option<Item> {
        let item = self.items.remove(id)?;
        self.order.retain(|o| o != id);
        Some(item)
    }

    /// Update one data field of an item, publishing
    /// [`CanvasEvent::ItemChanged`] unless `silent` or the value is
    /// unchanged.
    pub fn update_value(
        &mut self,
        id: &str,
        key: impl Into<String>,
        value: Value,
        silent: bool,
    ) -> crate::error::Result<bool> {
        let item = self
            .items
            .get_mut(id)
            .ok_or_else(|| crate::error::Error::unknown_item(id))?;
        let changed = item.set_value(key, value);
        if changed && !silent {
            self.events.publish(CanvasEvent::ItemChanged { id: id.to_string() });
        }
        Ok(changed)
    }

    /// Set the view filter predicate. Takes effect on the next reindex.
    pub fn set_filter(&mut self, filter: impl Fn(&Item) -> bool + 'static) {
        self.filter = Some(Box::new(filter));
    }

    /// Clear the view filter.
    pub fn clear_filter(&mut self) {
        self.filter = None;
    }

    /// Set the sort key function. Takes effect on the next reindex.
    pub fn set_sort_key(&mut self, sort_key: impl Fn(&Item) -> Value + 'static) {
        self.sort_key = Some(Box::new(sort_key));
    }

    /// Clear the sort key (view order falls back to insertion order).
    pub fn clear_sort_key(&mut self) {
        self.sort_key = None;
    }

    /// Set whether the view order is reversed.
    pub fn set_reversed(&mut self, reversed: bool) {
        self.reversed = reversed;
    }

    /// Whether the view order is reversed.
    pub fn is_reversed(&self) -> bool {
        self.reversed
    }

    /// Recompute display indices for the current filter/sort/reverse
    /// configuration.
    ///
    /// Afterwards the items with `index != -1` are exactly the filtered
    /// set, carrying a dense `0..N-1` sequence in view order; everything
    /// else carries `-1`. Idempotent: with no intervening mutation a second
    /// call changes nothing and publishes nothing.
    ///
    /// Returns the number of indices that changed.
    pub fn reindex(&mut self) -> usize {
        // Filtered view in insertion order, then stable-sorted.
        let mut view: Vec<String> = self
            .order
            .iter()
            .filter(|id| {
                let item = &self.items[*id];
                self.filter.as_ref().map(|f| f(item)).unwrap_or(true)
            })
            .cloned()
            .collect();

        if let Some(sort_key) = &self.sort_key {
            view.sort_by(|a, b| {
                compare_sort_values(&sort_key(&self.items[a]), &sort_key(&self.items[b]))
            });
        }
        if self.reversed {
            view.reverse();
        }

        let mut changed = 0;
        let in_view: std::collections::HashSet<&String> = view.iter().collect();
        for id in &self.order {
            if !in_view.contains(id) {
                if self
                    .items
                    .get_mut(id)
                    .is_some_and(|i| i.set_index(INDEX_FILTERED_OUT))
                {
                    changed += 1;
                }
            }
        }
        for (index, id) in view.iter().enumerate() {
            if self
                .items
                .get_mut(id)
                .is_some_and(|i| i.set_index(index as i32))
            {
                changed += 1;
            }
        }

        if changed > 0 {
            tracing::debug!(
                target: veer_core::logging::targets::RECONCILE,
                changed,
                "reindexed items"
            );
            self.events.publish(CanvasEvent::ItemsReindexed { changed });
        }
        changed
    }

    /// The items currently in view, ordered by display index.
    pub fn visible(&self) -> Vec<&Item> {
        let mut view: Vec<&Item> = self
            .items
            .values()
            .filter(|i| i.index() != INDEX_FILTERED_OUT)
            .collect();
        view.sort_by_key(|i| i.index());
        view
    }

    /// Every item, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Item> {
        self.order.iter().map(|id| &self.items[id])
    }
}
