//! Core error types

use thiserror::Error;

/// Errors raised while validating geofence inputs or running an admission check.
///
/// None of these are retried by the checker. A caller gating a write must treat
/// every variant as a denial.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeofenceError {
    /// Latitude/longitude non-finite, out of range, or missing when required
    #[error("Invalid coordinate: {0}")]
    InvalidCoordinate(String),

    /// Radius non-positive or non-finite, or policy settings incomplete
    #[error("Invalid policy: {0}")]
    InvalidPolicy(String),

    /// Policy is enabled but no usable position sample was supplied
    #[error("Position unavailable: {0}")]
    PositionUnavailable(String),
}

/// Result type for geofence operations.
pub type Result<T> = std::result::Result<T, GeofenceError>;
