//! Core functionality for location-gated actions.
//!
//! This crate provides the validated coordinate and policy types, the
//! haversine distance, and the pure [`check_admission`] operation used to
//! gate actions such as attendance recording by proximity to an institution.

pub mod admission;
pub mod config;
pub mod coordinate;
pub mod error;
pub mod logging;
pub mod policy;
pub mod sample;

pub use admission::{check_admission, AdmissionResult, DenialReport};
pub use config::{AcquisitionConfig, Config, ConfigError, LoggingConfig};
pub use coordinate::{distance_meters, parse_maps_link, GeoCoordinate, EARTH_RADIUS_M};
pub use error::{GeofenceError, Result};
pub use policy::{GeoPolicy, PolicyRecord, PolicyUpdate};
pub use sample::{PositionSample, RawPositionSample};
