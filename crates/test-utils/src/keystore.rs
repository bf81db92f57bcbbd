use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use vercre_keypairs::error::Err;
use vercre_keypairs::{KeyPairQuery, KeyPairResource, KeyPairResourceStore, Result, tracerr};

/// In-memory key-pair metadata store keyed by record ID. Clones share the same records.
#[derive(Clone, Debug, Default)]
pub struct KeyStore {
    records: Arc<DashMap<String, KeyPairResource>>,
}

impl KeyStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding `records`.
    #[must_use]
    pub fn with_records(records: impl IntoIterator<Item = KeyPairResource>) -> Self {
        let store = Self::new();
        for record in records {
            store.records.insert(record.id.clone(), record);
        }
        store
    }

    /// The record with `id`, if any.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<KeyPairResource> {
        self.records.get(id).map(|r| r.value().clone())
    }

    /// Every record owned by `participant_id`, oldest first.
    #[must_use]
    pub fn participant_records(&self, participant_id: &str) -> Vec<KeyPairResource> {
        let mut records: Vec<KeyPairResource> = self
            .records
            .iter()
            .filter(|r| r.participant_id == participant_id)
            .map(|r| r.value().clone())
            .collect();
        records.sort_by_key(|r| r.created_at);
        records
    }
}

impl KeyPairResourceStore for KeyStore {
    async fn create(&self, resource: &KeyPairResource) -> Result<()> {
        match self.records.entry(resource.id.clone()) {
            Entry::Occupied(_) => {
                let id = &resource.id;
                tracerr!(Err::StoreFailure, "A KeyPairResource with ID '{id}' already exists.")
            }
            Entry::Vacant(entry) => {
                entry.insert(resource.clone());
                Ok(())
            }
        }
    }

    async fn update(&self, resource: &KeyPairResource) -> Result<()> {
        let Some(mut existing) = self.records.get_mut(&resource.id) else {
            let id = &resource.id;
            tracerr!(Err::StoreFailure, "A KeyPairResource with ID '{id}' does not exist.");
        };
        *existing = resource.clone();
        Ok(())
    }

    async fn query(&self, query: &KeyPairQuery) -> Result<Vec<KeyPairResource>> {
        Ok(self
            .records
            .iter()
            .filter(|r| query.matches(r.value()))
            .map(|r| r.value().clone())
            .collect())
    }
}
