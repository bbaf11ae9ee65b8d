//! Error types for the veer engine.

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the engine.
///
/// Configuration and contract violations are fatal at the call site: the
/// engines never continue with a misconfigured instance or malformed
/// arguments. Redundant-but-valid calls (double-remove, double-clear) are
/// defined as no-ops and never produce these errors.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Scroll-based movement or scroll gestures were requested without a
    /// container element.
    #[error("scroll movement requires a container element")]
    MissingContainer,

    /// Snap-to-bounds was requested with neither bounds nor a container to
    /// derive them from.
    #[error("snap-to-bounds requires bounds or a container element")]
    MissingBounds,

    /// Snap-to-nearest-child was requested without a container to search.
    #[error("snap-to-nearest-child requires a container element")]
    MissingSnapContainer,

    /// An operation that needs an element was given a render without one.
    #[error("render {render_id} of item '{item_id}' has no element")]
    RenderWithoutElement { item_id: String, render_id: u32 },

    /// An operation referenced an item unknown to the collection.
    #[error("unknown item '{0}'")]
    UnknownItem(String),

    /// An operation referenced an element unknown to the target of the call.
    #[error("unknown element for {context}")]
    UnknownElement { context: &'static str },
}

impl Error {
    /// Create a render-without-element error.
    pub fn render_without_element(item_id: impl Into<String>, render_id: u32) -> Self {
        Self::RenderWithoutElement {
            item_id: item_id.into(),
            render_id,
        }
    }

    /// Create an unknown-item error.
    pub fn unknown_item(id: impl Into<String>) -> Self {
        Self::UnknownItem(id.into())
    }
}
