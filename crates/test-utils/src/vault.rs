use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use dashmap::DashMap;
use vercre_keypairs::error::Err;
use vercre_keypairs::{Result, SecretVault, tracerr};

/// In-memory secret vault. Clones share the same secrets.
#[derive(Clone, Debug, Default)]
pub struct SecretStore {
    secrets: Arc<DashMap<String, String>>,
    stores: Arc<AtomicUsize>,
    deletes: Arc<AtomicUsize>,
}

impl SecretStore {
    /// Create an empty vault.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a secret is held under `alias`.
    #[must_use]
    pub fn contains(&self, alias: &str) -> bool {
        self.secrets.contains_key(alias)
    }

    /// Number of secrets held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.secrets.len()
    }

    /// Whether the vault is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.secrets.is_empty()
    }

    /// Number of `store_secret` calls made.
    #[must_use]
    pub fn store_count(&self) -> usize {
        self.stores.load(Ordering::SeqCst)
    }

    /// Number of `delete_secret` calls made.
    #[must_use]
    pub fn delete_count(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }
}

impl SecretVault for SecretStore {
    async fn store_secret(&self, alias: &str, secret: &str) -> Result<()> {
        self.stores.fetch_add(1, Ordering::SeqCst);
        self.secrets.insert(alias.to_string(), secret.to_string());
        Ok(())
    }

    async fn delete_secret(&self, alias: &str) -> Result<()> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        if self.secrets.remove(alias).is_none() {
            tracerr!(Err::VaultFailure, "no secret found for alias '{alias}'");
        }
        Ok(())
    }

    async fn resolve_secret(&self, alias: &str) -> Result<Option<String>> {
        Ok(self.secrets.get(alias).map(|s| s.value().clone()))
    }
}
