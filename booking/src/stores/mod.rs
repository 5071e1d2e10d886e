//! Production store implementations.
//!
//! Redis for the ephemeral coordinator, PostgreSQL for durable orders, and
//! a Kafka-compatible producer for the event bus.

mod events_kafka;
mod orders_postgres;
mod seat_lock_redis;

pub use events_kafka::KafkaEventPublisher;
pub use orders_postgres::PostgresBookingRepository;
pub use seat_lock_redis::RedisSeatCoordinator;
