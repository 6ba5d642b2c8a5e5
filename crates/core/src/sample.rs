//! Position samples produced by a position source

use crate::coordinate::GeoCoordinate;
use crate::error::{GeofenceError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single observed position
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionSample {
    /// Observed coordinate
    pub coordinate: GeoCoordinate,
    /// Reported accuracy radius in meters, if the source provides one
    pub accuracy_meters: Option<f64>,
    /// When the fix was taken
    pub captured_at: DateTime<Utc>,
}

/// Wire form of a position sample, as delivered by a position source or
/// submitted alongside a gated action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPositionSample {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub accuracy_meters: Option<f64>,
    #[serde(default = "Utc::now")]
    pub captured_at: DateTime<Utc>,
}

impl PositionSample {
    /// Build a validated sample.
    ///
    /// Accuracy, when present, must be finite and non-negative.
    pub fn new(
        latitude: f64,
        longitude: f64,
        accuracy_meters: Option<f64>,
        captured_at: DateTime<Utc>,
    ) -> Result<Self> {
        let coordinate = GeoCoordinate::new(latitude, longitude)?;
        Self::at(coordinate, accuracy_meters, captured_at)
    }

    /// Build a sample from an already validated coordinate
    pub fn at(
        coordinate: GeoCoordinate,
        accuracy_meters: Option<f64>,
        captured_at: DateTime<Utc>,
    ) -> Result<Self> {
        if let Some(accuracy) = accuracy_meters {
            if !accuracy.is_finite() || accuracy < 0.0 {
                return Err(GeofenceError::InvalidCoordinate(format!(
                    "Accuracy must be a finite non-negative number of meters, got {}",
                    accuracy
                )));
            }
        }
        Ok(Self {
            coordinate,
            accuracy_meters,
            captured_at,
        })
    }

    /// Accuracy used for ranking samples; unknown accuracy ranks last
    pub fn effective_accuracy(&self) -> f64 {
        self.accuracy_meters.unwrap_or(f64::INFINITY)
    }

    pub fn to_raw(&self) -> RawPositionSample {
        RawPositionSample {
            latitude: self.coordinate.latitude(),
            longitude: self.coordinate.longitude(),
            accuracy_meters: self.accuracy_meters,
            captured_at: self.captured_at,
        }
    }
}

impl TryFrom<RawPositionSample> for PositionSample {
    type Error = GeofenceError;

    fn try_from(raw: RawPositionSample) -> Result<Self> {
        PositionSample::new(
            raw.latitude,
            raw.longitude,
            raw.accuracy_meters,
            raw.captured_at,
        )
    }
}

impl TryFrom<&RawPositionSample> for PositionSample {
    type Error = GeofenceError;

    fn try_from(raw: &RawPositionSample) -> Result<Self> {
        PositionSample::try_from(raw.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_validation() {
        let now = Utc::now();
        assert!(PositionSample::new(41.3, 69.2, Some(12.0), now).is_ok());
        assert!(PositionSample::new(41.3, 69.2, None, now).is_ok());
        assert!(PositionSample::new(95.0, 69.2, None, now).is_err());
        assert!(PositionSample::new(41.3, 69.2, Some(-1.0), now).is_err());
        assert!(PositionSample::new(41.3, 69.2, Some(f64::NAN), now).is_err());
    }

    #[test]
    fn test_effective_accuracy() {
        let now = Utc::now();
        let known = PositionSample::new(41.3, 69.2, Some(25.0), now).unwrap();
        let unknown = PositionSample::new(41.3, 69.2, None, now).unwrap();
        assert_eq!(known.effective_accuracy(), 25.0);
        assert!(unknown.effective_accuracy().is_infinite());
    }

    #[test]
    fn test_raw_sample_from_json() {
        let raw: RawPositionSample = serde_json::from_str(
            r#"{"latitude": 41.3111, "longitude": 69.2797, "accuracy_meters": 30.0,
                "captured_at": "2024-05-01T08:30:00Z"}"#,
        )
        .unwrap();
        let sample = PositionSample::try_from(raw).unwrap();
        assert_eq!(sample.accuracy_meters, Some(30.0));
        assert_eq!(sample.captured_at.to_rfc3339(), "2024-05-01T08:30:00+00:00");
    }

    #[test]
    fn test_raw_sample_out_of_range() {
        let raw = RawPositionSample {
            latitude: 41.0,
            longitude: -200.0,
            accuracy_meters: None,
            captured_at: Utc::now(),
        };
        assert!(matches!(
            PositionSample::try_from(&raw),
            Err(GeofenceError::InvalidCoordinate(_))
        ));
    }
}
