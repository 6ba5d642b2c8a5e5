//! Best-sample acquisition.
//!
//! Single fixes are often far off, especially indoors or with IP-based
//! location, so the acquirer watches a source and keeps the most accurate
//! sample until one of these happens first:
//!
//! - a sample meets the target accuracy
//! - the attempt limit is reached
//! - the time limit elapses
//! - the source stops
//!
//! A fix whose accuracy is worse than the configured ceiling is returned but
//! marked [`Reliability::Unreliable`]; callers should offer manual entry
//! rather than treat it as ground truth.

use crate::error::{AcquisitionError, AcquisitionResult};
use crate::source::PositionSource;
use geofence_core::{AcquisitionConfig, PositionSample};
use serde::{Deserialize, Serialize};
use std::future::Future;
use tokio::sync::oneshot;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Whether a fix is trustworthy enough to gate on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reliability {
    Reliable,
    /// Accuracy unknown or worse than the configured ceiling
    Unreliable,
}

/// The sample chosen by an acquisition run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AcquiredFix {
    pub sample: PositionSample,
    /// Number of samples seen
    pub attempts: u32,
    pub reliability: Reliability,
}

impl AcquiredFix {
    pub fn is_reliable(&self) -> bool {
        self.reliability == Reliability::Reliable
    }

    /// The sample, only if it is reliable enough to feed an admission check
    pub fn trusted_sample(&self) -> Option<&PositionSample> {
        self.is_reliable().then_some(&self.sample)
    }

    /// User-facing hint for unreliable fixes
    pub fn warning(&self) -> Option<String> {
        if self.is_reliable() {
            return None;
        }
        Some(match self.sample.accuracy_meters {
            Some(accuracy) => format!(
                "Location accuracy is low ({:.0} km). Devices without GPS report approximate positions; enter coordinates manually.",
                accuracy / 1000.0
            ),
            None => "Location accuracy is unknown; enter coordinates manually.".to_string(),
        })
    }
}

/// Why polling stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StopReason {
    TargetReached,
    AttemptsExhausted,
    TimedOut,
    SourceEnded,
}

/// Watches a position source and picks the best sample
#[derive(Debug, Clone)]
pub struct PositionAcquirer {
    config: AcquisitionConfig,
}

impl PositionAcquirer {
    pub fn new(config: AcquisitionConfig) -> AcquisitionResult<Self> {
        config
            .validate()
            .map_err(|e| AcquisitionError::Config(e.to_string()))?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &AcquisitionConfig {
        &self.config
    }

    /// Acquire a fix. Dropping the returned future abandons the acquisition.
    pub async fn acquire<S>(&self, source: &S) -> AcquisitionResult<AcquiredFix>
    where
        S: PositionSource + ?Sized,
    {
        self.run(source, std::future::pending::<()>()).await
    }

    /// Acquire a fix, giving up with [`AcquisitionError::Cancelled`] when
    /// `cancel` fires. Dropping the sender without sending does not cancel.
    pub async fn acquire_cancellable<S>(
        &self,
        source: &S,
        cancel: oneshot::Receiver<()>,
    ) -> AcquisitionResult<AcquiredFix>
    where
        S: PositionSource + ?Sized,
    {
        let cancelled = async move {
            if cancel.await.is_err() {
                std::future::pending::<()>().await;
            }
        };
        self.run(source, cancelled).await
    }

    async fn run<S, C>(&self, source: &S, cancelled: C) -> AcquisitionResult<AcquiredFix>
    where
        S: PositionSource + ?Sized,
        C: Future<Output = ()>,
    {
        let mut watch = source.watch();
        let deadline = tokio::time::sleep_until(Instant::now() + self.config.timeout());
        tokio::pin!(deadline);
        tokio::pin!(cancelled);

        let mut best: Option<PositionSample> = None;
        let mut attempts: u32 = 0;

        let reason = loop {
            tokio::select! {
                biased;

                _ = &mut cancelled => {
                    debug!(attempts, "Position acquisition cancelled");
                    return Err(AcquisitionError::Cancelled);
                }
                _ = &mut deadline => break StopReason::TimedOut,
                event = watch.next() => match event {
                    Some(Ok(sample)) => {
                        attempts += 1;
                        let accuracy = sample.effective_accuracy();
                        debug!(
                            attempt = attempts,
                            max_attempts = self.config.max_attempts,
                            latitude = sample.coordinate.latitude(),
                            longitude = sample.coordinate.longitude(),
                            accuracy_m = accuracy,
                            "Position sample received"
                        );

                        let improves = best
                            .as_ref()
                            .map_or(true, |b| accuracy < b.effective_accuracy());
                        if improves {
                            best = Some(sample);
                        }

                        if accuracy <= self.config.target_accuracy_m {
                            break StopReason::TargetReached;
                        }
                        if attempts >= self.config.max_attempts {
                            break StopReason::AttemptsExhausted;
                        }
                    }
                    Some(Err(e)) => {
                        warn!(attempts, error = %e, "Position source failed");
                        return Err(AcquisitionError::Source(e));
                    }
                    None => break StopReason::SourceEnded,
                },
            }
        };

        self.finish(best, attempts, reason)
    }

    fn finish(
        &self,
        best: Option<PositionSample>,
        attempts: u32,
        reason: StopReason,
    ) -> AcquisitionResult<AcquiredFix> {
        let Some(sample) = best else {
            warn!(?reason, "Position acquisition produced no sample");
            return Err(match reason {
                StopReason::TimedOut => AcquisitionError::Timeout {
                    timeout_ms: self.config.timeout_ms,
                },
                _ => AcquisitionError::NoSample,
            });
        };

        let accuracy = sample.effective_accuracy();
        let reliability = if accuracy > self.config.max_acceptable_accuracy_m {
            warn!(
                accuracy_m = accuracy,
                ceiling_m = self.config.max_acceptable_accuracy_m,
                "Best position fix is too inaccurate to trust"
            );
            Reliability::Unreliable
        } else {
            Reliability::Reliable
        };

        info!(
            ?reason,
            attempts,
            latitude = sample.coordinate.latitude(),
            longitude = sample.coordinate.longitude(),
            accuracy_m = accuracy,
            "Position fix acquired"
        );

        Ok(AcquiredFix {
            sample,
            attempts,
            reliability,
        })
    }
}
