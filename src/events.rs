//! # Key-Pair Events
//!
//! Bridges lifecycle notifications to an external [`EventRouter`]. Register a
//! [`KeyPairEventPublisher`] with the service's observable to have every transition published
//! as a [`KeyPairEvent`].

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::model::KeyPairResource;
use crate::observable::KeyPairListener;
use crate::provider::{Clock, EventRouter, SystemClock};

/// Event emitted for a key-pair lifecycle transition.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum KeyPairEvent {
    /// A key pair was created.
    Added(KeyPairEventPayload),

    /// A key pair was rotated.
    Rotated(KeyPairEventPayload),

    /// A key pair was revoked.
    Revoked(KeyPairEventPayload),
}

impl KeyPairEvent {
    /// The event payload.
    #[must_use]
    pub const fn payload(&self) -> &KeyPairEventPayload {
        match self {
            Self::Added(payload) | Self::Rotated(payload) | Self::Revoked(payload) => payload,
        }
    }
}

/// Details common to all key-pair events.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct KeyPairEventPayload {
    /// The participant owning the key pair.
    pub participant_id: String,

    /// ID of the affected key-pair record.
    pub key_pair_resource_id: String,

    /// Logical key identifier of the affected key pair.
    pub key_id: String,

    /// Time the event was raised.
    pub timestamp: DateTime<Utc>,
}

/// [`KeyPairListener`] publishing each notification to an [`EventRouter`].
pub struct KeyPairEventPublisher<R: EventRouter> {
    router: R,
    clock: Arc<dyn Clock>,
}

impl<R: EventRouter> KeyPairEventPublisher<R> {
    /// Create a publisher for `router` using the system clock.
    pub fn new(router: R) -> Self {
        Self {
            router,
            clock: Arc::new(SystemClock),
        }
    }

    /// Timestamp events using `clock`.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    fn payload(&self, resource: &KeyPairResource) -> KeyPairEventPayload {
        KeyPairEventPayload {
            participant_id: resource.participant_id.clone(),
            key_pair_resource_id: resource.id.clone(),
            key_id: resource.key_id.clone(),
            timestamp: self.clock.now(),
        }
    }
}

impl<R: EventRouter> KeyPairListener for KeyPairEventPublisher<R> {
    fn added(&self, resource: &KeyPairResource) -> Result<()> {
        self.router.publish(KeyPairEvent::Added(self.payload(resource)))
    }

    fn rotated(&self, resource: &KeyPairResource) -> Result<()> {
        self.router.publish(KeyPairEvent::Rotated(self.payload(resource)))
    }

    fn revoked(&self, resource: &KeyPairResource) -> Result<()> {
        self.router.publish(KeyPairEvent::Revoked(self.payload(resource)))
    }
}
