//! Logging facilities for veer.
//!
//! veer uses the `tracing` crate for instrumentation. To see logs, install a
//! tracing subscriber in your application:
//!
//! ```ignore
//! fn main() {
//!     tracing_subscriber::fmt::init();
//!
//!     // Your application code...
//! }
//! ```

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Core crate target.
    pub const CORE: &str = "veer_core";
    /// Event bus target.
    pub const BUS: &str = "veer_core::bus";
    /// Debouncer target.
    pub const DEBOUNCE: &str = "veer_core::debounce";
    /// Gesture-to-motion engine target.
    pub const MOTION: &str = "veer::motion";
    /// Gesture group coordinator target.
    pub const GROUP: &str = "veer::group";
    /// Render reconciliation target.
    pub const RECONCILE: &str = "veer::reconcile";
    /// Canvas shell target.
    pub const CANVAS: &str = "veer::canvas";
}
