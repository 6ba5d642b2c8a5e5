//! Admission gate for attendance recording.
//!
//! Teachers may record attendance only while inside their institution's
//! geofence. Admins are exempt; students cannot record at all. Every failure
//! is an explicit error, never a silent admit.

use crate::error::{GateError, GateResult};
use crate::store::PolicyStore;
use crate::types::{Actor, Role};
use chrono::{DateTime, Utc};
use geofence_core::{check_admission, AdmissionResult, PositionSample, RawPositionSample};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Coordinates attached to a gated write for audit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationStamp {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy_meters: Option<f64>,
    pub captured_at: DateTime<Utc>,
    pub distance_meters: f64,
}

impl LocationStamp {
    fn new(sample: &PositionSample, result: &AdmissionResult) -> Self {
        Self {
            latitude: sample.coordinate.latitude(),
            longitude: sample.coordinate.longitude(),
            accuracy_meters: sample.accuracy_meters,
            captured_at: sample.captured_at,
            distance_meters: result.distance_meters,
        }
    }
}

/// Why a gated action may proceed
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum GateDecision {
    /// The actor's role is not location-restricted
    Exempt,
    /// The institution has no active geofence
    Unrestricted,
    /// Inside the geofence
    Admitted {
        result: AdmissionResult,
        stamp: LocationStamp,
    },
}

impl GateDecision {
    pub fn stamp(&self) -> Option<&LocationStamp> {
        match self {
            GateDecision::Admitted { stamp, .. } => Some(stamp),
            _ => None,
        }
    }
}

/// Checks actors against their institution's geofence policy
pub struct AttendanceGate<S: PolicyStore + ?Sized> {
    store: Arc<S>,
}

impl<S: PolicyStore + ?Sized> Clone for AttendanceGate<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: PolicyStore + ?Sized> AttendanceGate<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Decide whether `actor` may perform a location-restricted write from
    /// `location`.
    pub fn admit(
        &self,
        actor: &Actor,
        location: Option<&RawPositionSample>,
    ) -> GateResult<GateDecision> {
        match actor.role {
            Role::Admin => {
                debug!(user = %actor.user_id, "Admin exempt from geolocation gate");
                return Ok(GateDecision::Exempt);
            }
            Role::Student => return Err(GateError::Forbidden { role: actor.role }),
            Role::Teacher => {}
        }

        let record = self.store.snapshot(actor.institution)?;
        let policy = record.resolve().map_err(|e| {
            warn!(
                institution = %actor.institution,
                error = %e,
                "Geolocation settings are unusable; contact an administrator"
            );
            GateError::from(e)
        })?;

        if !policy.enabled {
            return Ok(GateDecision::Unrestricted);
        }

        let sample = location.map(PositionSample::try_from).transpose()?;
        let result = check_admission(&policy, sample.as_ref())?;

        match (result.denial_report(), sample) {
            (Some(report), _) => {
                warn!(
                    user = %actor.user_id,
                    institution = %actor.institution,
                    distance_m = result.distance_meters,
                    radius_m = result.allowed_radius_meters,
                    "Attendance denied outside geofence"
                );
                Err(GateError::OutsideRadius(report))
            }
            (None, Some(sample)) => {
                info!(
                    user = %actor.user_id,
                    institution = %actor.institution,
                    distance_m = result.distance_meters,
                    "Attendance admitted inside geofence"
                );
                Ok(GateDecision::Admitted {
                    stamp: LocationStamp::new(&sample, &result),
                    result,
                })
            }
            // an enabled policy always requires a sample
            (None, None) => Err(GateError::Geofence(
                geofence_core::GeofenceError::PositionUnavailable(
                    "Geolocation is required for this action".to_string(),
                ),
            )),
        }
    }
}
