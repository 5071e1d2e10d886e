//! Event publisher trait.

use crate::error::Result;
use crate::events::BookingEvent;

/// Fire-and-forget publication of lifecycle events.
///
/// Delivery is at-least-once; consumers deduplicate on the entity id. The
/// reservation core treats publication failure as log-and-continue, so
/// implementations should fail fast rather than retry inline.
pub trait EventPublisher: Send + Sync {
    /// Publish one event.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::BookingError::EventBus`] if the bus rejects
    /// the message.
    async fn publish(&self, event: &BookingEvent) -> Result<()>;
}
