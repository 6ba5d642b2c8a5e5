//! Institution geofence policies.
//!
//! [`PolicyRecord`] is the stored shape (nullable columns, as persisted by the
//! policy store). [`GeoPolicy`] is what the admission check consumes.

use crate::coordinate::GeoCoordinate;
use crate::error::{GeofenceError, Result};
use serde::{Deserialize, Serialize};

/// Geofence policy for one institution
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPolicy {
    /// Whether the location gate is active
    pub enabled: bool,
    /// Reference point (institution location)
    pub anchor: GeoCoordinate,
    /// Allowed distance from the anchor in meters
    pub radius_meters: f64,
}

impl GeoPolicy {
    /// An active policy. The radius is checked at admission time.
    pub fn enabled(anchor: GeoCoordinate, radius_meters: f64) -> Self {
        Self {
            enabled: true,
            anchor,
            radius_meters,
        }
    }

    /// A policy that admits everyone
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            anchor: GeoCoordinate::default(),
            radius_meters: 0.0,
        }
    }

    /// Check that the radius is a finite positive number of meters
    pub fn validate_radius(&self) -> Result<()> {
        validate_radius(self.radius_meters)
    }
}

pub(crate) fn validate_radius(radius_meters: f64) -> Result<()> {
    if !radius_meters.is_finite() || radius_meters <= 0.0 {
        return Err(GeofenceError::InvalidPolicy(format!(
            "Radius must be a finite positive number of meters, got {}",
            radius_meters
        )));
    }
    Ok(())
}

/// Stored policy settings of an institution
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolicyRecord {
    #[serde(default)]
    pub geolocation_enabled: bool,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    /// Radius in meters
    #[serde(default)]
    pub geolocation_radius: Option<f64>,
}

impl PolicyRecord {
    /// Resolve the stored settings into a policy the checker can run.
    ///
    /// A disabled record always resolves. An enabled record needs an anchor
    /// and a radius; an anchor stored as (0, 0) counts as unset.
    pub fn resolve(&self) -> Result<GeoPolicy> {
        if !self.geolocation_enabled {
            let anchor =
                GeoCoordinate::from_parts(self.latitude, self.longitude).unwrap_or_default();
            return Ok(GeoPolicy {
                enabled: false,
                anchor,
                radius_meters: self.geolocation_radius.unwrap_or(0.0),
            });
        }

        let (Some(lat), Some(lon), Some(radius)) =
            (self.latitude, self.longitude, self.geolocation_radius)
        else {
            return Err(GeofenceError::InvalidPolicy(
                "Geolocation settings are incomplete; anchor and radius are required".to_string(),
            ));
        };

        let anchor = GeoCoordinate::new(lat, lon)?;
        if anchor.is_null_island() {
            return Err(GeofenceError::InvalidPolicy(
                "Geolocation settings are incomplete; anchor is not configured".to_string(),
            ));
        }
        validate_radius(radius)?;

        Ok(GeoPolicy::enabled(anchor, radius))
    }

    /// Apply an administrator's settings change, returning the new record.
    ///
    /// Enabling requires every field and validates them. Disabling clears the
    /// anchor and radius.
    pub fn apply(&self, update: &PolicyUpdate) -> Result<PolicyRecord> {
        if !update.enabled {
            return Ok(PolicyRecord::default());
        }

        let (Some(lat), Some(lon), Some(radius)) =
            (update.latitude, update.longitude, update.radius_meters)
        else {
            return Err(GeofenceError::InvalidPolicy(
                "Latitude, longitude and radius are all required when geolocation is enabled"
                    .to_string(),
            ));
        };

        GeoCoordinate::new(lat, lon)?;
        validate_radius(radius)?;

        Ok(PolicyRecord {
            geolocation_enabled: true,
            latitude: Some(lat),
            longitude: Some(lon),
            geolocation_radius: Some(radius),
        })
    }
}

/// Settings change submitted by an administrator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyUpdate {
    pub enabled: bool,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub radius_meters: Option<f64>,
}

impl PolicyUpdate {
    pub fn enable(anchor: GeoCoordinate, radius_meters: f64) -> Self {
        Self {
            enabled: true,
            latitude: Some(anchor.latitude()),
            longitude: Some(anchor.longitude()),
            radius_meters: Some(radius_meters),
        }
    }

    pub fn disable() -> Self {
        Self {
            enabled: false,
            latitude: None,
            longitude: None,
            radius_meters: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tashkent_record() -> PolicyRecord {
        PolicyRecord {
            geolocation_enabled: true,
            latitude: Some(41.3111),
            longitude: Some(69.2797),
            geolocation_radius: Some(500.0),
        }
    }

    #[test]
    fn test_resolve_enabled() {
        let policy = tashkent_record().resolve().unwrap();
        assert!(policy.enabled);
        assert_eq!(policy.radius_meters, 500.0);
        assert_eq!(policy.anchor.latitude(), 41.3111);
    }

    #[test]
    fn test_resolve_disabled_without_fields() {
        let policy = PolicyRecord::default().resolve().unwrap();
        assert!(!policy.enabled);
    }

    #[test]
    fn test_resolve_disabled_keeps_stored_anchor() {
        let record = PolicyRecord {
            geolocation_enabled: false,
            ..tashkent_record()
        };
        let policy = record.resolve().unwrap();
        assert!(!policy.enabled);
        assert_eq!(policy.anchor.longitude(), 69.2797);
        assert_eq!(policy.radius_meters, 500.0);

        let half_set = PolicyRecord {
            geolocation_enabled: false,
            longitude: None,
            ..tashkent_record()
        };
        assert_eq!(
            half_set.resolve().unwrap().anchor,
            GeoCoordinate::default()
        );
    }

    #[test]
    fn test_resolve_incomplete() {
        let mut record = tashkent_record();
        record.geolocation_radius = None;
        assert!(matches!(
            record.resolve(),
            Err(GeofenceError::InvalidPolicy(_))
        ));

        let mut record = tashkent_record();
        record.longitude = None;
        assert!(matches!(
            record.resolve(),
            Err(GeofenceError::InvalidPolicy(_))
        ));
    }

    #[test]
    fn test_resolve_null_island_anchor() {
        let mut record = tashkent_record();
        record.latitude = Some(0.0);
        record.longitude = Some(0.0);
        assert!(matches!(
            record.resolve(),
            Err(GeofenceError::InvalidPolicy(_))
        ));
    }

    #[test]
    fn test_resolve_bad_anchor_and_radius() {
        let mut record = tashkent_record();
        record.latitude = Some(120.0);
        assert!(matches!(
            record.resolve(),
            Err(GeofenceError::InvalidCoordinate(_))
        ));

        let mut record = tashkent_record();
        record.geolocation_radius = Some(-10.0);
        assert!(matches!(
            record.resolve(),
            Err(GeofenceError::InvalidPolicy(_))
        ));
    }

    #[test]
    fn test_apply_enable_requires_all_fields() {
        let update = PolicyUpdate {
            enabled: true,
            latitude: Some(41.3),
            longitude: None,
            radius_meters: Some(200.0),
        };
        let err = PolicyRecord::default().apply(&update).unwrap_err();
        assert!(matches!(err, GeofenceError::InvalidPolicy(_)));
    }

    #[test]
    fn test_apply_validates_values() {
        let record = PolicyRecord::default();
        let bad_lat = PolicyUpdate {
            enabled: true,
            latitude: Some(-91.0),
            longitude: Some(69.0),
            radius_meters: Some(200.0),
        };
        assert!(matches!(
            record.apply(&bad_lat),
            Err(GeofenceError::InvalidCoordinate(_))
        ));

        let zero_radius = PolicyUpdate {
            radius_meters: Some(0.0),
            ..PolicyUpdate::enable(GeoCoordinate::new(41.3, 69.2).unwrap(), 1.0)
        };
        assert!(matches!(
            record.apply(&zero_radius),
            Err(GeofenceError::InvalidPolicy(_))
        ));
    }

    #[test]
    fn test_apply_disable_clears_fields() {
        let record = tashkent_record().apply(&PolicyUpdate::disable()).unwrap();
        assert_eq!(record, PolicyRecord::default());
    }

    #[test]
    fn test_record_json_shape() {
        let record: PolicyRecord = serde_json::from_str(
            r#"{"geolocation_enabled": true, "latitude": 41.3111,
                "longitude": 69.2797, "geolocation_radius": 500}"#,
        )
        .unwrap();
        assert_eq!(record, tashkent_record());
    }
}
