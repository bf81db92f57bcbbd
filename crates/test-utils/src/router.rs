use std::sync::{Arc, Mutex};

use vercre_keypairs::{EventRouter, KeyPairEvent, Result};

/// Event router recording published events. Clones share the same log.
#[derive(Clone, Debug, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<KeyPairEvent>>>,
}

impl EventLog {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Events published so far, in order.
    ///
    /// # Panics
    ///
    /// If the log's lock is poisoned.
    #[must_use]
    pub fn events(&self) -> Vec<KeyPairEvent> {
        self.events.lock().expect("event log lock poisoned").clone()
    }
}

impl EventRouter for EventLog {
    fn publish(&self, event: KeyPairEvent) -> Result<()> {
        tracing::debug!(?event, "event published");
        self.events.lock().expect("event log lock poisoned").push(event);
        Ok(())
    }
}
