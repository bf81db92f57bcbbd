//! In-memory collaborators for exercising the key-pair service in tests.

mod clock;
mod keystore;
mod router;
mod vault;

pub use crate::clock::FixedClock;
pub use crate::keystore::KeyStore;
pub use crate::router::EventLog;
pub use crate::vault::SecretStore as Vault;
