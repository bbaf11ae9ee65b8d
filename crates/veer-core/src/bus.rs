//! Typed event bus for veer.
//!
//! The bus is the only communication channel between the engine's
//! subsystems: item collections announce mutations, motion engines announce
//! settled movements, the reconciler announces completed draw cycles, and
//! the surrounding application wires reactions to any of them.
//!
//! Subscriptions are either *topic* subscriptions (the slot receives only
//! events whose [`BusMessage::kind`] matches) or *wildcard* subscriptions
//! (the slot receives every event).
//!
//! # Example
//!
//! ```
//! use veer_core::bus::{BusMessage, EventBus};
//!
//! #[derive(Clone)]
//! enum Note {
//!     Saved,
//!     Deleted,
//! }
//!
//! impl BusMessage for Note {
//!     fn kind(&self) -> &'static str {
//!         match self {
//!             Note::Saved => "note:saved",
//!             Note::Deleted => "note:deleted",
//!         }
//!     }
//! }
//!
//! let bus = EventBus::new();
//! let id = bus.subscribe("note:saved", |_note: &Note| println!("saved"));
//! bus.publish(Note::Saved);
//! bus.unsubscribe(id).unwrap();
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use slotmap::{new_key_type, SlotMap};

use crate::error::BusError;

new_key_type! {
    /// A unique identifier for a bus subscription.
    ///
    /// Use this ID to remove a specific subscription via
    /// [`EventBus::unsubscribe`]. The ID remains valid until the
    /// subscription is removed or the bus is dropped.
    pub struct SubscriptionId;
}

/// A message that can travel over an [`EventBus`].
///
/// The `kind` string is the message's topic, used for topic-filtered
/// subscriptions and for trace output.
pub trait BusMessage: Clone + 'static {
    /// The topic string identifying this message's type.
    fn kind(&self) -> &'static str;
}

/// Internal storage for a single subscription.
struct Subscription<E> {
    /// The slot to invoke (Arc-wrapped so publishing can run outside the lock).
    slot: Arc<dyn Fn(&E) + Send + Sync>,
    /// Topic filter; `None` receives every event.
    topic: Option<&'static str>,
}

/// A publish/subscribe event bus with topic and wildcard subscriptions.
///
/// Publishing is synchronous: every matching slot runs before
/// [`publish`](Self::publish) returns. The subscriber list is cloned out of
/// the internal lock before slots run, so a slot may publish further events
/// or mutate subscriptions without deadlocking.
pub struct EventBus<E> {
    /// All active subscriptions.
    subscriptions: Mutex<SlotMap<SubscriptionId, Subscription<E>>>,
    /// Whether publishing is temporarily blocked.
    blocked: AtomicBool,
}

impl<E: BusMessage> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: BusMessage> EventBus<E> {
    /// Create a new bus with no subscriptions.
    pub fn new() -> Self {
        Self {
            subscriptions: Mutex::new(SlotMap::with_key()),
            blocked: AtomicBool::new(false),
        }
    }

    /// Subscribe a slot to a single topic.
    ///
    /// The slot is invoked for every published event whose
    /// [`BusMessage::kind`] equals `topic`.
    pub fn subscribe<F>(&self, topic: &'static str, slot: F) -> SubscriptionId
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        self.subscriptions.lock().insert(Subscription {
            slot: Arc::new(slot),
            topic: Some(topic),
        })
    }

    /// Subscribe a wildcard slot that receives every published event.
    pub fn subscribe_any<F>(&self, slot: F) -> SubscriptionId
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        self.subscriptions.lock().insert(Subscription {
            slot: Arc::new(slot),
            topic: None,
        })
    }

    /// Remove a subscription by ID.
    ///
    /// Fails with [`BusError::InvalidSubscription`] when the ID is unknown
    /// or has already been removed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> crate::error::Result<()> {
        self.subscriptions
            .lock()
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| BusError::InvalidSubscription.into())
    }

    /// Remove every subscription.
    pub fn unsubscribe_all(&self) {
        self.subscriptions.lock().clear();
    }

    /// The number of active subscriptions.
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.lock().len()
    }

    /// Block or unblock publishing.
    ///
    /// While blocked, [`publish`](Self::publish) drops events without
    /// invoking any slot. Returns the previous blocked state.
    pub fn set_blocked(&self, blocked: bool) -> bool {
        self.blocked.swap(blocked, Ordering::SeqCst)
    }

    /// Whether publishing is currently blocked.
    pub fn is_blocked(&self) -> bool {
        self.blocked.load(Ordering::SeqCst)
    }

    /// Publish an event to every matching subscription.
    pub fn publish(&self, event: E) {
        if self.is_blocked() {
            return;
        }

        tracing::trace!(target: crate::logging::targets::BUS, kind = event.kind(), "publish");

        // Snapshot matching slots so subscribers can re-enter the bus.
        let slots: Vec<Arc<dyn Fn(&E) + Send + Sync>> = {
            let subscriptions = self.subscriptions.lock();
            subscriptions
                .values()
                .filter(|s| s.topic.is_none() || s.topic == Some(event.kind()))
                .map(|s| Arc::clone(&s.slot))
                .collect()
        };

        for slot in slots {
            slot(&event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[derive(Clone, Debug, PartialEq)]
    enum TestEvent {
        Ping,
        Pong,
    }

    impl BusMessage for TestEvent {
        fn kind(&self) -> &'static str {
            match self {
                TestEvent::Ping => "ping",
                TestEvent::Pong => "pong",
            }
        }
    }

    #[test]
    fn test_topic_subscription_filters_by_kind() {
        let bus = EventBus::new();
        let count = Arc::new(AtomicUsize::new(0));

        let count2 = Arc::clone(&count);
        bus.subscribe("ping", move |_: &TestEvent| {
            count2.fetch_add(1, Ordering::SeqCst);
        });

        bus.publish(TestEvent::Ping);
        bus.publish(TestEvent::Pong);
        bus.publish(TestEvent::Ping);

        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_wildcard_receives_every_event() {
        let bus = EventBus::new();
        let count = Arc::new(AtomicUsize::new(0));

        let count2 = Arc::clone(&count);
        bus.subscribe_any(move |_: &TestEvent| {
            count2.fetch_add(1, Ordering::SeqCst);
        });

        bus.publish(TestEvent::Ping);
        bus.publish(TestEvent::Pong);

        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_unsubscribe() {
        let bus = EventBus::new();
        let count = Arc::new(AtomicUsize::new(0));

        let count2 = Arc::clone(&count);
        let id = bus.subscribe("ping", move |_: &TestEvent| {
            count2.fetch_add(1, Ordering::SeqCst);
        });

        assert!(bus.unsubscribe(id).is_ok());
        // Second removal reports the stale ID.
        assert!(matches!(
            bus.unsubscribe(id),
            Err(crate::error::CoreError::Bus(BusError::InvalidSubscription))
        ));

        bus.publish(TestEvent::Ping);
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_blocked_bus_drops_events() {
        let bus = EventBus::new();
        let count = Arc::new(AtomicUsize::new(0));

        let count2 = Arc::clone(&count);
        bus.subscribe_any(move |_: &TestEvent| {
            count2.fetch_add(1, Ordering::SeqCst);
        });

        bus.set_blocked(true);
        bus.publish(TestEvent::Ping);
        assert_eq!(count.load(Ordering::SeqCst), 0);

        bus.set_blocked(false);
        bus.publish(TestEvent::Ping);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_reentrant_publish_does_not_deadlock() {
        let bus = Arc::new(EventBus::new());
        let count = Arc::new(AtomicUsize::new(0));

        let bus2 = Arc::clone(&bus);
        let count2 = Arc::clone(&count);
        bus.subscribe("ping", move |_: &TestEvent| {
            count2.fetch_add(1, Ordering::SeqCst);
            bus2.publish(TestEvent::Pong);
        });

        let count3 = Arc::clone(&count);
        bus.subscribe("pong", move |_: &TestEvent| {
            count3.fetch_add(1, Ordering::SeqCst);
        });

        bus.publish(TestEvent::Ping);
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_subscription_count() {
        let bus = EventBus::<TestEvent>::new();
        assert_eq!(bus.subscription_count(), 0);
        let a = bus.subscribe("ping", |_| {});
        let _b = bus.subscribe_any(|_| {});
        assert_eq!(bus.subscription_count(), 2);
        bus.unsubscribe(a).unwrap();
        assert_eq!(bus.subscription_count(), 1);
        bus.unsubscribe_all();
        assert_eq!(bus.subscription_count(), 0);
    }
}
