//! Position sources.
//!
//! A [`PositionSource`] hands out [`PositionWatch`] subscriptions that deliver
//! successive samples (or an error) as the underlying location service
//! produces them. Dropping the watch ends the subscription.

use crate::error::SourceError;
use geofence_core::PositionSample;
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// One delivery from a position source
pub type SourceEvent = Result<PositionSample, SourceError>;

/// Default buffer for pushed samples
const DEFAULT_FEED_CAPACITY: usize = 32;

/// Something that can be watched for position fixes
pub trait PositionSource: Send + Sync {
    /// Start a new subscription
    fn watch(&self) -> PositionWatch;
}

/// An active subscription to a position source
#[derive(Debug)]
pub struct PositionWatch {
    rx: mpsc::Receiver<SourceEvent>,
    producer: Option<JoinHandle<()>>,
}

impl PositionWatch {
    pub fn new(rx: mpsc::Receiver<SourceEvent>) -> Self {
        Self { rx, producer: None }
    }

    /// Tie a producer task to this watch; it is aborted when the watch drops
    pub fn with_producer(mut self, producer: JoinHandle<()>) -> Self {
        self.producer = Some(producer);
        self
    }

    /// A watch that fails immediately with `error`
    pub fn failed(error: SourceError) -> Self {
        let (tx, rx) = mpsc::channel(1);
        // capacity 1 and a fresh channel, so this cannot be full
        let _ = tx.try_send(Err(error));
        Self::new(rx)
    }

    /// Next event, or `None` once the source has stopped
    pub async fn next(&mut self) -> Option<SourceEvent> {
        self.rx.recv().await
    }
}

impl Drop for PositionWatch {
    fn drop(&mut self) {
        if let Some(producer) = self.producer.take() {
            producer.abort();
        }
    }
}

/// A source fed by pushing samples through a [`PositionFeed`].
///
/// Only one watch can be active; later watches fail with
/// [`SourceError::Unavailable`].
#[derive(Debug)]
pub struct ChannelSource {
    rx: Mutex<Option<mpsc::Receiver<SourceEvent>>>,
}

/// Sending half of a [`ChannelSource`]
#[derive(Debug, Clone)]
pub struct PositionFeed {
    tx: mpsc::Sender<SourceEvent>,
}

impl ChannelSource {
    pub fn new() -> (Self, PositionFeed) {
        Self::with_capacity(DEFAULT_FEED_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> (Self, PositionFeed) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (
            Self {
                rx: Mutex::new(Some(rx)),
            },
            PositionFeed { tx },
        )
    }
}

impl PositionSource for ChannelSource {
    fn watch(&self) -> PositionWatch {
        let taken = match self.rx.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        match taken {
            Some(rx) => PositionWatch::new(rx),
            None => PositionWatch::failed(SourceError::Unavailable(
                "position feed is already being watched".to_string(),
            )),
        }
    }
}

impl PositionFeed {
    /// Deliver a sample. Returns `false` once nobody is watching.
    pub async fn push(&self, sample: PositionSample) -> bool {
        self.tx.send(Ok(sample)).await.is_ok()
    }

    /// Deliver an error. Returns `false` once nobody is watching.
    pub async fn fail(&self, error: SourceError) -> bool {
        self.tx.send(Err(error)).await.is_ok()
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// One step of a scripted run
#[derive(Debug, Clone)]
pub struct ScriptStep {
    /// Wait before delivering the event
    pub delay: Duration,
    pub event: SourceEvent,
}

/// Replays a fixed sequence of events on a tokio task.
///
/// Each watch replays the whole script from the start. `watch` must be called
/// from within a tokio runtime.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSource {
    steps: Vec<ScriptStep>,
}

impl ScriptedSource {
    pub fn new(steps: Vec<ScriptStep>) -> Self {
        Self { steps }
    }

    /// Deliver `samples` one after another, `interval` apart
    pub fn from_samples(samples: Vec<PositionSample>, interval: Duration) -> Self {
        Self::new(
            samples
                .into_iter()
                .map(|sample| ScriptStep {
                    delay: interval,
                    event: Ok(sample),
                })
                .collect(),
        )
    }

    pub fn then(mut self, delay: Duration, event: SourceEvent) -> Self {
        self.steps.push(ScriptStep { delay, event });
        self
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl PositionSource for ScriptedSource {
    fn watch(&self) -> PositionWatch {
        let (tx, rx) = mpsc::channel(self.steps.len().max(1));
        let steps = self.steps.clone();
        let producer = tokio::spawn(async move {
            for step in steps {
                if !step.delay.is_zero() {
                    tokio::time::sleep(step.delay).await;
                }
                if tx.send(step.event).await.is_err() {
                    break;
                }
            }
        });
        PositionWatch::new(rx).with_producer(producer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample(accuracy: f64) -> PositionSample {
        PositionSample::new(41.3111, 69.2797, Some(accuracy), Utc::now()).unwrap()
    }

    #[tokio::test]
    async fn test_channel_source_delivers_in_order() {
        let (source, feed) = ChannelSource::new();
        let mut watch = source.watch();

        assert!(feed.push(sample(50.0)).await);
        assert!(feed.fail(SourceError::Timeout).await);

        let first = watch.next().await.unwrap().unwrap();
        assert_eq!(first.accuracy_meters, Some(50.0));
        assert_eq!(watch.next().await.unwrap(), Err(SourceError::Timeout));
    }

    #[tokio::test]
    async fn test_channel_source_single_watch() {
        let (source, _feed) = ChannelSource::new();
        let _first = source.watch();
        let mut second = source.watch();
        assert!(matches!(
            second.next().await,
            Some(Err(SourceError::Unavailable(_)))
        ));
    }

    #[tokio::test]
    async fn test_feed_sees_dropped_watch() {
        let (source, feed) = ChannelSource::new();
        drop(source.watch());
        assert!(feed.is_closed());
        assert!(!feed.push(sample(10.0)).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_scripted_source_replays_then_ends() {
        let source = ScriptedSource::from_samples(
            vec![sample(300.0), sample(40.0)],
            Duration::from_millis(500),
        );
        assert_eq!(source.len(), 2);

        let mut watch = source.watch();
        assert_eq!(
            watch.next().await.unwrap().unwrap().accuracy_meters,
            Some(300.0)
        );
        assert_eq!(
            watch.next().await.unwrap().unwrap().accuracy_meters,
            Some(40.0)
        );
        assert!(watch.next().await.is_none());
    }

    #[tokio::test]
    async fn test_failed_watch() {
        let mut watch = PositionWatch::failed(SourceError::Unsupported);
        assert_eq!(watch.next().await, Some(Err(SourceError::Unsupported)));
        assert!(watch.next().await.is_none());
    }
}
