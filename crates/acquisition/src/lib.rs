//! Position acquisition for location-gated actions.
//!
//! Acquisition is kept apart from the admission decision: this crate watches a
//! [`PositionSource`] and returns the best fix it could get within bounds, and
//! the caller then hands that fix to `geofence_core::check_admission`.
//!
//! # Example
//! ```no_run
//! use geofence_acquisition::{PositionAcquirer, ScriptedSource};
//! use geofence_core::AcquisitionConfig;
//!
//! # async fn run(source: ScriptedSource) -> Result<(), Box<dyn std::error::Error>> {
//! let acquirer = PositionAcquirer::new(AcquisitionConfig::default())?;
//! let fix = acquirer.acquire(&source).await?;
//! if let Some(sample) = fix.trusted_sample() {
//!     tracing::info!(accuracy = ?sample.accuracy_meters, "Got a usable fix");
//! }
//! # Ok(())
//! # }
//! ```

pub mod acquire;
pub mod error;
pub mod source;

pub use acquire::{AcquiredFix, PositionAcquirer, Reliability};
pub use error::{AcquisitionError, AcquisitionResult, SourceError};
pub use source::{
    ChannelSource, PositionFeed, PositionSource, PositionWatch, ScriptStep, ScriptedSource,
    SourceEvent,
};
