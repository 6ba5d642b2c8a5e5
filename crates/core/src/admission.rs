//! Geofence admission check.
//!
//! [`check_admission`] decides whether a position sample lies within an
//! institution's configured radius of its anchor. It is a pure function of its
//! inputs: it never acquires positions, persists, logs, or retries. Errors are
//! never turned into an "allow".

use crate::error::{GeofenceError, Result};
use crate::policy::GeoPolicy;
use crate::sample::PositionSample;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of an admission check
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdmissionResult {
    /// Whether the gated action may proceed
    pub allowed: bool,
    /// Great-circle distance between sample and anchor (full precision)
    pub distance_meters: f64,
    /// Echo of the policy radius
    pub allowed_radius_meters: f64,
    /// `distance_meters - allowed_radius_meters`, present only when denied
    pub shortfall_meters: Option<f64>,
}

impl AdmissionResult {
    /// Human-facing summary of a denial; `None` when admitted
    pub fn denial_report(&self) -> Option<DenialReport> {
        let shortfall = self.shortfall_meters?;
        Some(DenialReport {
            distance_m: self.distance_meters.round(),
            allowed_radius_m: self.allowed_radius_meters.round(),
            shortfall_m: shortfall.round(),
        })
    }
}

/// Denial figures rounded to whole meters for display
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DenialReport {
    pub distance_m: f64,
    pub allowed_radius_m: f64,
    pub shortfall_m: f64,
}

impl fmt::Display for DenialReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "You are {:.0} m away, but only {:.0} m is permitted.",
            self.distance_m, self.allowed_radius_m
        )
    }
}

/// Decide whether `sample` is admitted under `policy`.
///
/// - A disabled policy admits immediately; the sample may be absent and is
///   ignored when present.
/// - An enabled policy needs a finite positive radius
///   ([`GeofenceError::InvalidPolicy`]) and a sample
///   ([`GeofenceError::PositionUnavailable`]).
/// - The radius boundary is inclusive.
pub fn check_admission(
    policy: &GeoPolicy,
    sample: Option<&PositionSample>,
) -> Result<AdmissionResult> {
    if !policy.enabled {
        return Ok(AdmissionResult {
            allowed: true,
            distance_meters: 0.0,
            allowed_radius_meters: policy.radius_meters,
            shortfall_meters: None,
        });
    }

    policy.validate_radius()?;

    let sample = sample.ok_or_else(|| {
        GeofenceError::PositionUnavailable(
            "Geolocation is required for this action; no position was supplied".to_string(),
        )
    })?;

    let distance_meters = sample.coordinate.haversine_distance(&policy.anchor);
    let allowed = distance_meters <= policy.radius_meters;

    Ok(AdmissionResult {
        allowed,
        distance_meters,
        allowed_radius_meters: policy.radius_meters,
        shortfall_meters: (!allowed).then(|| distance_meters - policy.radius_meters),
    })
}
