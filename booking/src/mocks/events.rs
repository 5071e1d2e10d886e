//! Mock event publisher for testing.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::{BookingError, Result};
use crate::events::BookingEvent;
use crate::providers::EventPublisher;

/// Mock event publisher that captures everything it is asked to send.
#[derive(Debug, Clone, Default)]
pub struct MockEventPublisher {
    events: Arc<Mutex<Vec<BookingEvent>>>,
    fail: Arc<AtomicBool>,
}

impl MockEventPublisher {
    /// Create an empty publisher.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `publish` call fail, to check that event failures are
    /// swallowed.
    pub fn fail_next_publish(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    /// Everything published so far.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn published(&self) -> Result<Vec<BookingEvent>> {
        Ok(self
            .events
            .lock()
            .map_err(|_| BookingError::EventBus("Mutex lock failed".to_string()))?
            .clone())
    }

    /// The event types published so far, in order.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn event_types(&self) -> Result<Vec<&'static str>> {
        Ok(self.published()?.iter().map(BookingEvent::event_type).collect())
    }
}

impl EventPublisher for MockEventPublisher {
    fn publish(&self, event: &BookingEvent) -> impl Future<Output = Result<()>> + Send {
        let events = Arc::clone(&self.events);
        let fail = Arc::clone(&self.fail);
        let event = event.clone();

        async move {
            if fail.swap(false, Ordering::SeqCst) {
                return Err(BookingError::EventBus(
                    "Simulated publish failure".to_string(),
                ));
            }

            events
                .lock()
                .map_err(|_| BookingError::EventBus("Mutex lock failed".to_string()))?
                .push(event);
            Ok(())
        }
    }
}
