//! # Key-Pair Service
//!
//! Creation, rotation and revocation of participant key pairs.
//!
//! The service holds no state of its own. Record state lives in the [`KeyPairResourceStore`] and
//! private keys in the [`SecretVault`]; the two are not updated atomically. Writes are ordered so
//! that a partial failure leaves an orphaned secret rather than a record pointing at a missing
//! one: the vault is written before a record is created, and a record is updated before its
//! secret is deleted.

use std::sync::Arc;

use tracing::{debug, info};

use crate::config::KeyPairConfig;
use crate::error::Err;
use crate::generator::{DefaultKeyGenerator, KeyGenerator};
use crate::model::{KeyDescriptor, KeyMaterial, KeyPairResource, KeyPairState};
use crate::observable::{KeyPairListener, KeyPairObservable};
use crate::provider::{Clock, KeyPairQuery, KeyPairResourceStore, SecretVault, SystemClock};
use crate::{Result, tracerr};

/// Orchestrates key-pair lifecycle operations over a metadata store and a secret vault.
pub struct KeyPairService<S, V> {
    store: S,
    vault: V,
    observable: KeyPairObservable,
    generator: Box<dyn KeyGenerator>,
    clock: Arc<dyn Clock>,
    config: KeyPairConfig,
}

impl<S, V> KeyPairService<S, V>
where
    S: KeyPairResourceStore,
    V: SecretVault,
{
    /// Create a service notifying the listeners registered with `observable`.
    pub fn new(store: S, vault: V, observable: KeyPairObservable) -> Self {
        Self {
            store,
            vault,
            observable,
            generator: Box::new(DefaultKeyGenerator),
            clock: Arc::new(SystemClock),
            config: KeyPairConfig::default(),
        }
    }

    /// Use `clock` to timestamp records.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Use `generator` to create key material.
    #[must_use]
    pub fn with_generator(mut self, generator: impl KeyGenerator + 'static) -> Self {
        self.generator = Box::new(generator);
        self
    }

    /// Apply `config`.
    #[must_use]
    pub fn with_config(mut self, config: KeyPairConfig) -> Self {
        self.config = config;
        self
    }

    /// Register an additional lifecycle listener.
    pub fn register_listener(&mut self, listener: impl KeyPairListener + 'static) {
        self.observable.register_listener(listener);
    }

    /// The observable notified of lifecycle transitions.
    pub const fn observable(&self) -> &KeyPairObservable {
        &self.observable
    }

    /// The metadata store.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// The secret vault.
    pub const fn vault(&self) -> &V {
        &self.vault
    }

    /// Add a key pair for `participant_id`.
    ///
    /// When the descriptor carries generator params, a key pair is generated and its private key
    /// stored in the vault under the descriptor's alias before the record is persisted. When it
    /// carries a public key, no vault write occurs.
    ///
    /// When `make_default` is set (and configured to do so), the participant's current default
    /// key pair loses its default flag.
    ///
    /// # Errors
    ///
    /// * `Err::InvalidDescriptor` - the descriptor is malformed or ambiguous, its key ID is
    ///   already used by one of the participant's active key pairs, or its private key alias is
    ///   held by another active key pair. Nothing is written.
    /// * `Err::UnsupportedAlgorithm` - the generator params cannot be satisfied.
    /// * `Err::VaultFailure` / `Err::StoreFailure` - propagated from the collaborators.
    /// * Any error returned by a listener.
    pub async fn add_key_pair(
        &self, participant_id: &str, descriptor: &KeyDescriptor, make_default: bool,
    ) -> Result<KeyPairResource> {
        // TODO: verify the participant exists once participant contexts publish lifecycle events
        let key = self.new_key(descriptor)?;
        let active = self.check_conflicts(participant_id, descriptor, None).await?;
        self.insert(participant_id, descriptor, key, make_default, &active).await
    }

    /// Rotate the key pair `old_id`, optionally replacing it with a new key pair.
    ///
    /// The old record is marked `Rotated` with `new_use_duration` and its private key deleted
    /// from the vault. A replacement inherits the old record's participant and default flag.
    /// Returns the replacement, if one was requested.
    ///
    /// The replacement descriptor is checked before the old record is touched, so a rejected
    /// replacement leaves the old key pair active.
    ///
    /// # Errors
    ///
    /// * `Err::NotFound` - no record with `old_id` exists.
    /// * `Err::InvalidState` - the record is already rotated or revoked.
    /// * Any error [`Self::add_key_pair`] returns for the replacement.
    pub async fn rotate_key_pair(
        &self, old_id: &str, new_descriptor: Option<&KeyDescriptor>, new_use_duration: u64,
    ) -> Result<Option<KeyPairResource>> {
        let state = KeyPairState::Rotated;
        self.retire_and_replace(old_id, state, Some(new_use_duration), new_descriptor).await
    }

    /// Revoke the key pair `old_id`, optionally replacing it with a new key pair.
    ///
    /// The old record is marked `Revoked` and its private key deleted from the vault. A
    /// replacement inherits the old record's participant and default flag. Returns the
    /// replacement, if one was requested.
    ///
    /// # Errors
    ///
    /// * `Err::NotFound` - no record with `old_id` exists.
    /// * `Err::InvalidState` - the record is already rotated or revoked.
    /// * Any error [`Self::add_key_pair`] returns for the replacement.
    pub async fn revoke_key(
        &self, old_id: &str, new_descriptor: Option<&KeyDescriptor>,
    ) -> Result<Option<KeyPairResource>> {
        self.retire_and_replace(old_id, KeyPairState::Revoked, None, new_descriptor).await
    }

    /// Records matching `query`.
    ///
    /// # Errors
    ///
    /// * `Err::StoreFailure` - propagated from the store.
    pub async fn query_key_pairs(&self, query: &KeyPairQuery) -> Result<Vec<KeyPairResource>> {
        self.store.query(query).await
    }

    /// The participant's current (non-terminal) default key pair.
    ///
    /// # Errors
    ///
    /// * `Err::StoreFailure` - propagated from the store.
    pub async fn default_key_pair(&self, participant_id: &str) -> Result<Option<KeyPairResource>> {
        let query = KeyPairQuery::by_participant(participant_id)
            .state(KeyPairState::Created)
            .default_pair(true);
        Ok(self.store.query(&query).await?.into_iter().next())
    }

    async fn retire_and_replace(
        &self, old_id: &str, state: KeyPairState, use_duration: Option<u64>,
        new_descriptor: Option<&KeyDescriptor>,
    ) -> Result<Option<KeyPairResource>> {
        let replacement = new_descriptor.map(|d| self.new_key(d)).transpose()?;
        let old = self.active_record(old_id).await?;
        let active = match new_descriptor {
            Some(descriptor) => {
                self.check_conflicts(&old.participant_id, descriptor, Some(&old.id)).await?
            }
            None => Vec::new(),
        };

        let retired = self.retire(old, state, use_duration).await?;
        self.observable.invoke_for_each(|l| match state {
            KeyPairState::Rotated => l.rotated(&retired),
            _ => l.revoked(&retired),
        })?;

        let (Some(descriptor), Some(key)) = (new_descriptor, replacement) else {
            return Ok(None);
        };
        let added = self
            .insert(&retired.participant_id, descriptor, key, retired.is_default_pair, &active)
            .await?;
        Ok(Some(added))
    }

    // Validate the descriptor and resolve its key material. Generation happens here so that an
    // unsupported algorithm is reported before any collaborator is called.
    fn new_key(&self, descriptor: &KeyDescriptor) -> Result<NewKey> {
        match descriptor.validate()? {
            KeyMaterial::Supplied(public_key) => Ok(NewKey {
                public_key,
                private_key: None,
            }),
            KeyMaterial::Generated(params) => {
                let key_pair = self.generator.generate(params)?;
                Ok(NewKey {
                    public_key: key_pair.serialized_public_key()?,
                    private_key: Some(key_pair.serialized_private_key()?),
                })
            }
        }
    }

    // Reject a descriptor whose key ID or private key alias is held by an active record other
    // than `replacing`. Returns the participant's other active records.
    async fn check_conflicts(
        &self, participant_id: &str, descriptor: &KeyDescriptor, replacing: Option<&str>,
    ) -> Result<Vec<KeyPairResource>> {
        let other = |r: &KeyPairResource| replacing != Some(r.id.as_str());

        let query = KeyPairQuery::by_participant(participant_id).state(KeyPairState::Created);
        let active: Vec<_> = self.store.query(&query).await?.into_iter().filter(other).collect();
        if active.iter().any(|r| r.key_id == descriptor.key_id) {
            let key_id = &descriptor.key_id;
            tracerr!(
                Err::InvalidDescriptor,
                "key ID '{key_id}' is already in use by participant '{participant_id}'"
            );
        }

        let alias = &descriptor.private_key_alias;
        let query = KeyPairQuery::by_alias(alias).state(KeyPairState::Created);
        if self.store.query(&query).await?.iter().any(other) {
            tracerr!(Err::InvalidDescriptor, "private key alias '{alias}' is already in use");
        }

        Ok(active)
    }

    // Write the secret (if generated), clear any previous default, then create the record.
    async fn insert(
        &self, participant_id: &str, descriptor: &KeyDescriptor, key: NewKey, make_default: bool,
        active: &[KeyPairResource],
    ) -> Result<KeyPairResource> {
        if let Some(private_key) = &key.private_key {
            debug!(alias = %descriptor.private_key_alias, "storing generated private key");
            self.vault.store_secret(&descriptor.private_key_alias, private_key).await?;
        }

        if make_default && self.config.clear_previous_default {
            for previous in active.iter().filter(|r| r.is_default_pair) {
                debug!(id = %previous.id, "clearing previous default key pair");
                let mut previous = previous.clone();
                previous.is_default_pair = false;
                self.store.update(&previous).await?;
            }
        }

        let now = self.clock.now();
        let resource = KeyPairResource {
            id: uuid::Uuid::new_v4().to_string(),
            participant_id: participant_id.to_string(),
            key_id: descriptor.key_id.clone(),
            private_key_alias: descriptor.private_key_alias.clone(),
            serialized_public_key: key.public_key,
            state: KeyPairState::Created,
            is_default_pair: make_default,
            use_duration: descriptor.use_duration.unwrap_or(self.config.default_use_duration),
            created_at: now,
            state_changed_at: now,
        };
        self.store.create(&resource).await?;

        info!(
            participant_id,
            id = %resource.id,
            key_id = %resource.key_id,
            is_default_pair = make_default,
            "key pair added"
        );
        self.observable.invoke_for_each(|l| l.added(&resource))?;

        Ok(resource)
    }

    // The record `old_id`, provided it exists and is not yet terminal.
    async fn active_record(&self, old_id: &str) -> Result<KeyPairResource> {
        let Some(resource) = self.store.query(&KeyPairQuery::by_id(old_id)).await?.pop() else {
            tracerr!(Err::NotFound, "A KeyPairResource with ID '{old_id}' does not exist.");
        };
        if resource.state.is_terminal() {
            tracerr!(
                Err::InvalidState,
                "A KeyPairResource with ID '{old_id}' is already {}.",
                resource.state
            );
        }
        Ok(resource)
    }

    // Move `resource` into the terminal `state`, persist it, then delete its secret.
    async fn retire(
        &self, mut resource: KeyPairResource, state: KeyPairState, use_duration: Option<u64>,
    ) -> Result<KeyPairResource> {
        resource.transition(state, self.clock.now());
        if let Some(millis) = use_duration {
            resource.use_duration = millis;
        }
        self.store.update(&resource).await?;

        debug!(alias = %resource.private_key_alias, "deleting private key");
        self.vault.delete_secret(&resource.private_key_alias).await?;

        info!(
            participant_id = %resource.participant_id,
            id = %resource.id,
            key_id = %resource.key_id,
            %state,
            "key pair retired"
        );
        Ok(resource)
    }
}

// Key material for a new record. Only generated key pairs carry a private key.
struct NewKey {
    public_key: String,
    private_key: Option<String>,
}
