//! Error types for gated attendance operations.

use crate::types::{InstitutionId, Role};
use geofence_core::{DenialReport, GeofenceError};
use thiserror::Error;

/// Errors raised by the policy store
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    /// No policy stored for the institution
    #[error("Institution not found: {0}")]
    InstitutionNotFound(InstitutionId),

    /// The actor may not change policy settings
    #[error("Role {role:?} may not change geolocation settings")]
    Forbidden { role: Role },

    /// The settings change failed validation
    #[error(transparent)]
    Invalid(#[from] GeofenceError),

    /// Lock poisoned by a panicking writer
    #[error("Policy store unavailable: {0}")]
    Unavailable(String),
}

/// Errors that stop a gated action
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GateError {
    /// The actor's role cannot perform the action at all
    #[error("Role {role:?} may not record attendance")]
    Forbidden { role: Role },

    /// The sample lies outside the institution's radius
    #[error("Outside the permitted area. {0}")]
    OutsideRadius(DenialReport),

    /// Invalid input, misconfigured policy, or missing position
    #[error(transparent)]
    Geofence(#[from] GeofenceError),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// Attendance records unavailable
    #[error("Attendance book unavailable: {0}")]
    Unavailable(String),
}

impl GateError {
    /// True when the institution's settings, not the user, are at fault
    pub fn is_misconfiguration(&self) -> bool {
        matches!(self, GateError::Geofence(GeofenceError::InvalidPolicy(_)))
    }
}

/// Result type for gated operations.
pub type GateResult<T> = Result<T, GateError>;
