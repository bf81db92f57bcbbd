//! # Provider Traits
//!
//! Collaborators the lifecycle service depends on. Implementations are supplied by the
//! deployment: a persistent metadata store for key-pair records, a secret vault for private
//! keys, a time source and an event router.

use chrono::{DateTime, Utc};

use crate::Result;
use crate::events::KeyPairEvent;
use crate::model::{KeyPairResource, KeyPairState};

/// [`KeyPairResourceStore`] persists key-pair metadata records.
///
/// Implementations report expected failures (duplicate IDs, missing records, connectivity) as
/// `Err::StoreFailure` errors carrying a detail message. The service propagates the error to its
/// caller unmodified.
pub trait KeyPairResourceStore: Send + Sync {
    /// Persist a new record.
    fn create(&self, resource: &KeyPairResource) -> impl Future<Output = Result<()>> + Send;

    /// Replace an existing record, matched by ID.
    fn update(&self, resource: &KeyPairResource) -> impl Future<Output = Result<()>> + Send;

    /// Return every record matching `query`. An empty result is not an error.
    fn query(
        &self, query: &KeyPairQuery,
    ) -> impl Future<Output = Result<Vec<KeyPairResource>>> + Send;
}

/// [`SecretVault`] holds private key material addressed by alias.
///
/// Implementations report failures as `Err::VaultFailure` errors, including deleting an alias
/// that does not exist.
pub trait SecretVault: Send + Sync {
    /// Store `secret` under `alias`, replacing any existing value.
    fn store_secret(&self, alias: &str, secret: &str) -> impl Future<Output = Result<()>> + Send;

    /// Delete the secret stored under `alias`.
    fn delete_secret(&self, alias: &str) -> impl Future<Output = Result<()>> + Send;

    /// Return the secret stored under `alias`, if any.
    fn resolve_secret(&self, alias: &str) -> impl Future<Output = Result<Option<String>>> + Send;
}

/// Time source used to timestamp state transitions and events.
pub trait Clock: Send + Sync {
    /// The current time.
    fn now(&self) -> DateTime<Utc>;
}

/// [`Clock`] reading the system time.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// [`EventRouter`] delivers key-pair events to downstream subscribers.
pub trait EventRouter: Send + Sync {
    /// Publish `event`.
    ///
    /// # Errors
    ///
    /// Returns an error if the event cannot be accepted for delivery.
    fn publish(&self, event: KeyPairEvent) -> Result<()>;
}

/// Filter for [`KeyPairResourceStore::query`]. Unset fields match any record.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KeyPairQuery {
    /// Match the record ID.
    pub id: Option<String>,

    /// Match the owning participant.
    pub participant_id: Option<String>,

    /// Match the vault alias of the private key.
    pub private_key_alias: Option<String>,

    /// Match the lifecycle state.
    pub state: Option<KeyPairState>,

    /// Match the default-pair flag.
    pub is_default_pair: Option<bool>,
}

impl KeyPairQuery {
    /// Query for the record with `id`.
    pub fn by_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    /// Query for records owned by `participant_id`.
    pub fn by_participant(participant_id: impl Into<String>) -> Self {
        Self {
            participant_id: Some(participant_id.into()),
            ..Self::default()
        }
    }

    /// Query for records whose private key is held under `alias`.
    pub fn by_alias(alias: impl Into<String>) -> Self {
        Self {
            private_key_alias: Some(alias.into()),
            ..Self::default()
        }
    }

    /// Restrict to records in `state`.
    #[must_use]
    pub const fn state(mut self, state: KeyPairState) -> Self {
        self.state = Some(state);
        self
    }

    /// Restrict to records with the given default-pair flag.
    #[must_use]
    pub const fn default_pair(mut self, is_default_pair: bool) -> Self {
        self.is_default_pair = Some(is_default_pair);
        self
    }

    /// Whether `resource` satisfies the query.
    #[must_use]
    pub fn matches(&self, resource: &KeyPairResource) -> bool {
        self.id.as_ref().is_none_or(|id| id == &resource.id)
            && self.participant_id.as_ref().is_none_or(|p| p == &resource.participant_id)
            && self.private_key_alias.as_ref().is_none_or(|a| a == &resource.private_key_alias)
            && self.state.is_none_or(|s| s == resource.state)
            && self.is_default_pair.is_none_or(|d| d == resource.is_default_pair)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resource(state: KeyPairState, is_default_pair: bool) -> KeyPairResource {
        let now = Utc::now();
        KeyPairResource {
            id: "kp-1".to_string(),
            participant_id: "participant-1".to_string(),
            key_id: "key-1".to_string(),
            private_key_alias: "alias-1".to_string(),
            serialized_public_key: "pem".to_string(),
            state,
            is_default_pair,
            use_duration: 1000,
            created_at: now,
            state_changed_at: now,
        }
    }

    #[test]
    fn query_matches() {
        let created = resource(KeyPairState::Created, true);

        assert!(KeyPairQuery::default().matches(&created));
        assert!(KeyPairQuery::by_id("kp-1").matches(&created));
        assert!(!KeyPairQuery::by_id("kp-2").matches(&created));

        let current_default = KeyPairQuery::by_participant("participant-1")
            .state(KeyPairState::Created)
            .default_pair(true);
        assert!(current_default.matches(&created));
        assert!(!current_default.matches(&resource(KeyPairState::Rotated, true)));
        assert!(!current_default.matches(&resource(KeyPairState::Created, false)));
        assert!(!KeyPairQuery::by_participant("participant-2").matches(&created));

        let live_alias = KeyPairQuery::by_alias("alias-1").state(KeyPairState::Created);
        assert!(live_alias.matches(&created));
        assert!(!live_alias.matches(&resource(KeyPairState::Revoked, false)));
        assert!(!KeyPairQuery::by_alias("alias-2").matches(&created));
    }
}
