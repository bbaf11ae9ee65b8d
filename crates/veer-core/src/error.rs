//! Error types for veer core systems.

use std::fmt;

/// The main error type for veer core operations.
#[derive(Debug)]
pub enum CoreError {
    /// Event bus error.
    Bus(BusError),
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bus(err) => write!(f, "Bus error: {err}"),
        }
    }
}

impl std::error::Error for CoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Bus(err) => Some(err),
        }
    }
}

/// Event-bus specific errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BusError {
    /// The subscription ID is invalid or has already been removed.
    InvalidSubscription,
}

impl fmt::Display for BusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSubscription => write!(f, "Invalid or removed subscription ID"),
        }
    }
}

impl std::error::Error for BusError {}

impl From<BusError> for CoreError {
    fn from(err: BusError) -> Self {
        Self::Bus(err)
    }
}

/// A specialized Result type for veer core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
