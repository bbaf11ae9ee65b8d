//! Core systems for veer: event bus, debouncing, and logging targets.
//!
//! This crate holds the collaborator-agnostic plumbing shared by the veer
//! engine crates:
//!
//! - [`bus`] — a typed publish/subscribe event bus with topic and wildcard
//!   subscriptions, the sole channel between engine subsystems
//! - [`debounce`] — a deterministic trailing-edge debouncer
//! - [`logging`] — `tracing` target constants for log filtering
//! - [`error`] — core error types
//!
//! veer is single-threaded and cooperative: nothing here spawns threads or
//! blocks. The bus delivers synchronously; the debouncer is driven by the
//! caller's clock.

pub mod bus;
pub mod debounce;
pub mod error;
pub mod logging;

pub use bus::{BusMessage, EventBus, SubscriptionId};
pub use debounce::Debouncer;
pub use error::{BusError, CoreError, Result};
