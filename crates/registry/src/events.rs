//! Post-commit event publication.
//!
//! Writers hand envelopes to an [`EventSink`] after their transaction has
//! committed; the hand-off never blocks and never fails the write. The NATS
//! implementation drains a channel from a single background task, so events
//! from one process reach the stream in commit order.

use std::sync::Mutex;

use tokio::sync::mpsc;
use tracing::{error, info, warn};

use atlas_model::{event::EVENT_SUBJECT_PREFIX, EventEnvelope};

use serde::Deserialize;
use thiserror::Error;

/// Connection settings. Field names match the `eventbus.*` section of the
/// service configuration document. The consumer fields describe the durable
/// consumer downstream subscribers attach with; the publisher itself only
/// needs the servers and the stream.
#[derive(Debug, Clone, Deserialize)]
pub struct EventBusConfig {
    pub servers: Vec<String>,
    #[serde(default = "default_stream_name")]
    pub stream_name: String,
    #[serde(default = "default_consumer_name")]
    pub consumer_name: String,
    #[serde(default = "default_max_deliver")]
    pub max_deliver: i64,
    /// Ack wait for downstream consumers, seconds.
    #[serde(default = "default_ack_wait")]
    pub ack_wait: u64,
    #[serde(default = "default_max_ack_pending")]
    pub max_ack_pending: i64,
}

fn default_stream_name() -> String {
    "ATLAS_EVENTS".to_string()
}

fn default_consumer_name() -> String {
    "atlas-registry".to_string()
}

fn default_max_deliver() -> i64 {
    5
}

fn default_ack_wait() -> u64 {
    30
}

fn default_max_ack_pending() -> i64 {
    1000
}

#[derive(Error, Debug)]
pub enum EventBusError {
    #[error("failed to connect to event bus: {0}")]
    Connect(String),

    #[error("failed to ensure event stream: {0}")]
    Stream(String),
}

/// Where managers enqueue envelopes. Implementations must not block and must
/// not surface failures to the caller.
pub trait EventSink: Send + Sync {
    fn enqueue(&self, envelope: EventEnvelope);
}

/// Drops every event. For wiring where no bus is configured.
pub struct NullSink;

impl EventSink for NullSink {
    fn enqueue(&self, _envelope: EventEnvelope) {}
}

/// Collects events in memory, in enqueue order. Test double.
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<EventEnvelope>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drain(&self) -> Vec<EventEnvelope> {
        std::mem::take(&mut self.events.lock().expect("recording sink poisoned"))
    }

    pub fn len(&self) -> usize {
        self.events.lock().expect("recording sink poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EventSink for RecordingSink {
    fn enqueue(&self, envelope: EventEnvelope) {
        self.events
            .lock()
            .expect("recording sink poisoned")
            .push(envelope);
    }
}

/// JetStream-backed publisher. `enqueue` pushes onto an unbounded channel;
/// one background task publishes sequentially and awaits each ack, keeping
/// per-process commit order on the stream.
pub struct NatsEventBus {
    tx: mpsc::UnboundedSender<EventEnvelope>,
}

impl NatsEventBus {
    pub async fn connect(config: &EventBusConfig) -> Result<Self, EventBusError> {
        let servers = config.servers.join(",");
        info!(%servers, stream = %config.stream_name, "connecting to event bus");

        let client = async_nats::connect(servers.as_str())
            .await
            .map_err(|e| EventBusError::Connect(e.to_string()))?;
        let jetstream = async_nats::jetstream::new(client);

        jetstream
            .get_or_create_stream(async_nats::jetstream::stream::Config {
                name: config.stream_name.clone(),
                subjects: vec![format!("{EVENT_SUBJECT_PREFIX}.>")],
                ..Default::default()
            })
            .await
            .map_err(|e| EventBusError::Stream(e.to_string()))?;

        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(publish_loop(jetstream, rx));

        info!("event bus connected");
        Ok(Self { tx })
    }
}

impl EventSink for NatsEventBus {
    fn enqueue(&self, envelope: EventEnvelope) {
        let event_type = envelope.event_type;
        if self.tx.send(envelope).is_err() {
            error!(%event_type, "event publisher task is gone, dropping event");
            metrics::counter!("atlas_events_failed_total", "event_type" => event_type.as_str())
                .increment(1);
        }
    }
}

async fn publish_loop(
    jetstream: async_nats::jetstream::Context,
    mut rx: mpsc::UnboundedReceiver<EventEnvelope>,
) {
    while let Some(envelope) = rx.recv().await {
        let subject = envelope.subject();
        let event_type = envelope.event_type;
        let payload = match serde_json::to_vec(&envelope) {
            Ok(p) => p,
            Err(e) => {
                error!(%subject, "event serialization failed: {e}");
                metrics::counter!("atlas_events_failed_total", "event_type" => event_type.as_str())
                    .increment(1);
                continue;
            }
        };

        let published = match jetstream.publish(subject.clone(), payload.into()).await {
            Ok(ack) => ack.await.map(|_| ()),
            Err(e) => Err(e.into()),
        };
        match published {
            Ok(()) => {
                metrics::counter!("atlas_events_published_total", "event_type" => event_type.as_str())
                    .increment(1);
            }
            Err(e) => {
                // At-least-once is the stream's job; a failed publish after a
                // committed write is logged and counted, never retried into
                // reordering.
                warn!(%subject, "event publish failed: {e}");
                metrics::counter!("atlas_events_failed_total", "event_type" => event_type.as_str())
                    .increment(1);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atlas_model::EventType;

    #[test]
    fn recording_sink_preserves_order() {
        let sink = RecordingSink::new();
        sink.enqueue(EventEnvelope::new(
            EventType::QualityFlagRaised,
            "test",
            &serde_json::json!({"n": 1}),
        ));
        sink.enqueue(EventEnvelope::new(
            EventType::QualityFlagResolved,
            "test",
            &serde_json::json!({"n": 2}),
        ));

        let events = sink.drain();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event_type, EventType::QualityFlagRaised);
        assert_eq!(events[1].event_type, EventType::QualityFlagResolved);
        assert!(sink.is_empty());
    }

    #[test]
    fn config_defaults() {
        let config: EventBusConfig = serde_json::from_value(serde_json::json!({
            "servers": ["nats://localhost:4222"],
        }))
        .unwrap();
        assert_eq!(config.stream_name, "ATLAS_EVENTS");
        assert_eq!(config.max_deliver, 5);
        assert_eq!(config.max_ack_pending, 1000);
    }
}
