//! Validated geographic coordinates and great-circle distance.
//!
//! A [`GeoCoordinate`] can only be built through [`GeoCoordinate::new`], so
//! every value that reaches the distance math is finite and in range. Loose
//! textual input (manual entry, map links) is parsed at the boundary and
//! funnelled through the same factory.

use crate::error::{GeofenceError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Mean Earth radius used by the haversine formula (meters)
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Geographic coordinates (latitude, longitude) in degrees
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "RawCoordinate")]
pub struct GeoCoordinate {
    latitude: f64,
    longitude: f64,
}

/// Unvalidated wire form of a coordinate
#[derive(Debug, Clone, Copy, Deserialize)]
struct RawCoordinate {
    latitude: f64,
    longitude: f64,
}

impl TryFrom<RawCoordinate> for GeoCoordinate {
    type Error = GeofenceError;

    fn try_from(raw: RawCoordinate) -> Result<Self> {
        GeoCoordinate::new(raw.latitude, raw.longitude)
    }
}

impl GeoCoordinate {
    /// Create a new geographic coordinate
    ///
    /// # Arguments
    /// * `latitude` - Latitude in degrees (-90 to 90)
    /// * `longitude` - Longitude in degrees (-180 to 180)
    ///
    /// # Returns
    /// * `Ok(GeoCoordinate)` - Valid coordinate
    /// * `Err(GeofenceError::InvalidCoordinate)` - Non-finite or out of range
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        if !latitude.is_finite() || !longitude.is_finite() {
            return Err(GeofenceError::InvalidCoordinate(format!(
                "Coordinates must be finite, got ({}, {})",
                latitude, longitude
            )));
        }
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(GeofenceError::InvalidCoordinate(format!(
                "Latitude must be between -90 and 90, got {}",
                latitude
            )));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(GeofenceError::InvalidCoordinate(format!(
                "Longitude must be between -180 and 180, got {}",
                longitude
            )));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Build a coordinate from optional components, failing when either is absent
    pub fn from_parts(latitude: Option<f64>, longitude: Option<f64>) -> Result<Self> {
        match (latitude, longitude) {
            (Some(lat), Some(lon)) => Self::new(lat, lon),
            _ => Err(GeofenceError::InvalidCoordinate(
                "Latitude and longitude are both required".to_string(),
            )),
        }
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// True for the (0, 0) sentinel that unset numeric columns collapse to
    pub fn is_null_island(&self) -> bool {
        self.latitude == 0.0 && self.longitude == 0.0
    }

    /// Calculate haversine distance to another coordinate in meters
    ///
    /// This uses the haversine formula to calculate great-circle distance
    /// between two points on Earth's surface. It stays correct near the
    /// poles and across the antimeridian.
    pub fn haversine_distance(&self, other: &GeoCoordinate) -> f64 {
        let lat1_rad = self.latitude.to_radians();
        let lat2_rad = other.latitude.to_radians();
        let delta_lat = (other.latitude - self.latitude).to_radians();
        let delta_lon = (other.longitude - self.longitude).to_radians();

        let a = (delta_lat / 2.0).sin().powi(2)
            + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
        // rounding can push `a` a hair outside [0, 1]
        let a = a.clamp(0.0, 1.0);

        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

        EARTH_RADIUS_M * c
    }
}

/// Great-circle distance between two coordinates in meters
pub fn distance_meters(a: &GeoCoordinate, b: &GeoCoordinate) -> f64 {
    a.haversine_distance(b)
}

impl fmt::Display for GeoCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}, {:.6}", self.latitude, self.longitude)
    }
}

impl FromStr for GeoCoordinate {
    type Err = GeofenceError;

    /// Parse manual entry of the form `"lat,lon"` (whitespace tolerated)
    fn from_str(s: &str) -> Result<Self> {
        parse_pair(s).ok_or_else(|| {
            GeofenceError::InvalidCoordinate(format!(
                "Expected \"latitude,longitude\", got {:?}",
                s
            ))
        })?
    }
}

/// Extract a coordinate from a map share link.
///
/// Recognised forms:
/// - `...?q=41.3111,69.2797` or `...&q=41.3111,69.2797`
/// - `.../@41.3111,69.2797,17z`
///
/// Short links carry no coordinates and are rejected; the caller should fall
/// back to manual entry.
pub fn parse_maps_link(url: &str) -> Result<GeoCoordinate> {
    let from_query = url
        .split(['?', '&'])
        .skip(1)
        .find_map(|param| param.strip_prefix("q="))
        .and_then(parse_pair);
    if let Some(parsed) = from_query {
        return parsed;
    }

    let from_at = url.split_once('@').and_then(|(_, rest)| {
        let mut parts = rest.splitn(3, ',');
        let lat = parts.next()?;
        let lon = parts.next()?;
        // drop anything after the longitude, e.g. "69.2797/data=..."
        let lon = lon.split(['/', '?']).next()?;
        parse_pair(&format!("{},{}", lat, lon))
    });
    if let Some(parsed) = from_at {
        return parsed;
    }

    Err(GeofenceError::InvalidCoordinate(format!(
        "No coordinates found in link: {}",
        url
    )))
}

/// Parse `"lat,lon"`. `None` when the text is not two numbers; `Some(Err)`
/// when it is two numbers that fail validation.
fn parse_pair(text: &str) -> Option<Result<GeoCoordinate>> {
    let (lat, lon) = text.split_once(',')?;
    let lat = parse_degrees(lat)?;
    let lon = parse_degrees(lon)?;
    Some(GeoCoordinate::new(lat, lon))
}

fn parse_degrees(text: &str) -> Option<f64> {
    let text = text.trim();
    let text = text.strip_prefix('+').unwrap_or(text);
    // only plain decimals; rejects "inf", "NaN" and exponent forms
    if text.is_empty()
        || !text
            .chars()
            .all(|c| c.is_ascii_digit() || c == '.' || c == '-')
    {
        return None;
    }
    text.parse().ok()
}
