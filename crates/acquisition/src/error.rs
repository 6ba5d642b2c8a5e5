//! Error types for position acquisition.

use thiserror::Error;

/// Failures reported by a position source.
///
/// Mirrors what platform location services report to a watcher.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    /// The user or platform refused location access
    #[error("Location permission denied")]
    PermissionDenied,

    /// The platform could not determine a position
    #[error("Position unavailable: {0}")]
    Unavailable(String),

    /// The platform gave up waiting for a fix
    #[error("Location service timed out")]
    Timeout,

    /// No location service on this device
    #[error("Geolocation is not supported")]
    Unsupported,
}

/// Errors that end an acquisition without a fix.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AcquisitionError {
    /// Time limit reached before any sample arrived
    #[error("No position received within {timeout_ms} ms")]
    Timeout { timeout_ms: u64 },

    /// The source finished without delivering a sample
    #[error("Position source ended without a sample")]
    NoSample,

    /// The source reported an error
    #[error("Position source error: {0}")]
    Source(#[from] SourceError),

    /// The caller abandoned the acquisition
    #[error("Acquisition cancelled")]
    Cancelled,

    /// Invalid acquisition thresholds
    #[error("Invalid acquisition configuration: {0}")]
    Config(String),
}

/// Result type for acquisition operations.
pub type AcquisitionResult<T> = Result<T, AcquisitionError>;
