//! Kafka-compatible event publisher implementation.
//!
//! Publishes lifecycle events as JSON envelopes to a single topic, keyed by
//! the affected entity's id so events about the same hold, order, or show
//! stay ordered within their partition. Works against Redpanda, Apache
//! Kafka, or any other Kafka-protocol broker.

use rdkafka::config::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::util::Timeout;
use std::time::Duration;

use crate::error::{BookingError, Result};
use crate::events::{BookingEvent, EventEnvelope};
use crate::providers::EventPublisher;

/// Kafka-backed [`EventPublisher`].
#[derive(Clone)]
pub struct KafkaEventPublisher {
    /// Kafka producer for publishing events.
    producer: FutureProducer,
    /// Topic receiving all lifecycle events.
    topic: String,
    /// Producer send timeout.
    timeout: Duration,
}

impl KafkaEventPublisher {
    /// Create a new publisher.
    ///
    /// # Arguments
    ///
    /// * `brokers` - Comma-separated broker addresses (e.g., "localhost:9092")
    /// * `topic` - Topic receiving the lifecycle events
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::EventBus`] if the producer cannot be created.
    pub fn new(brokers: &str, topic: &str) -> Result<Self> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("message.timeout.ms", "5000")
            .set("compression.type", "lz4")
            .create()
            .map_err(|e| BookingError::EventBus(format!("Failed to create producer: {e}")))?;

        Ok(Self {
            producer,
            topic: topic.to_string(),
            timeout: Duration::from_secs(5),
        })
    }
}

impl EventPublisher for KafkaEventPublisher {
    async fn publish(&self, event: &BookingEvent) -> Result<()> {
        let envelope = EventEnvelope::wrap(event)?;
        let payload = serde_json::to_vec(&envelope)
            .map_err(|e| BookingError::Serialization(e.to_string()))?;
        let key = event.entity_key();

        let record = FutureRecord::to(&self.topic).payload(&payload).key(&key);

        match self.producer.send(record, Timeout::After(self.timeout)).await {
            Ok((partition, offset)) => {
                tracing::debug!(
                    topic = %self.topic,
                    partition = partition,
                    offset = offset,
                    event_type = event.event_type(),
                    "Event published"
                );
                metrics::counter!("booking.events.published", "event_type" => event.event_type())
                    .increment(1);
                Ok(())
            }
            Err((e, _)) => {
                metrics::counter!("booking.events.dropped", "event_type" => event.event_type())
                    .increment(1);
                Err(BookingError::EventBus(format!(
                    "Failed to publish {}: {e}",
                    event.event_type()
                )))
            }
        }
    }
}
