//! # Key-Pair Lifecycle
//!
//! Manages the key pairs belonging to participants of an identity service. Key pairs are created,
//! rotated and revoked through [`KeyPairService`], which keeps the public metadata in a
//! [`KeyPairResourceStore`] and the private key material in a [`SecretVault`], and notifies
//! registered [`KeyPairListener`]s of every transition.
//!
//! Each participant has at most one non-terminal default key pair. The default designation is
//! carried over to the replacement when a default key pair is rotated or revoked.

pub mod config;
pub mod error;
pub mod events;
mod generator;
mod model;
mod observable;
mod provider;
mod service;

pub use self::config::KeyPairConfig;
pub use self::events::{KeyPairEvent, KeyPairEventPublisher, KeyPairEventPayload};
pub use self::generator::{DefaultKeyGenerator, GeneratedKeyPair, KeyGenerator};
pub use self::model::*;
pub use self::observable::{KeyPairListener, KeyPairObservable};
pub use self::provider::*;
pub use self::service::KeyPairService;

/// Result type for key-pair operations.
pub type Result<T, E = error::Error> = core::result::Result<T, E>;
