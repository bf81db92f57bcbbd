//! Tests for rotating a participant's key pairs.

use std::sync::Arc;

use test_utils::{EventLog, FixedClock, KeyStore, Vault};
use vercre_keypairs::error::Err;
use vercre_keypairs::{
    KeyDescriptor, KeyGeneratorParams, KeyPairEvent, KeyPairEventPublisher, KeyPairObservable,
    KeyPairService, KeyPairState, SecretVault,
};

const USE_DURATION: u64 = 8_640_000_000;

fn service() -> (KeyPairService<KeyStore, Vault>, EventLog) {
    let events = EventLog::new();
    let mut observable = KeyPairObservable::new();
    observable.register_listener(KeyPairEventPublisher::new(events.clone()));
    let service = KeyPairService::new(KeyStore::new(), Vault::new(), observable)
        .with_clock(Arc::new(FixedClock::default()));
    (service, events)
}

fn ed25519(key_id: &str, alias: &str) -> KeyDescriptor {
    KeyDescriptor::new(key_id, alias).generate(KeyGeneratorParams::new("EdDSA", "Ed25519"))
}

// Rotating a participant's default key to a newly generated key. The old key's
// secret is removed, the replacement inherits the default designation and two
// events are raised: the rotation, then the creation.
#[tokio::test]
async fn rotate_default() {
    let (service, events) = service();
    let k1 = service.add_key_pair("p1", &ed25519("k1", "a1"), true).await.expect("should add");
    assert!(service.vault().contains("a1"));

    let k2 = service
        .rotate_key_pair(&k1.id, Some(&ed25519("k2", "a2")), USE_DURATION)
        .await
        .expect("should rotate")
        .expect("should return new key pair");

    let rotated = service.store().get(&k1.id).expect("should exist");
    assert_eq!(rotated.state, KeyPairState::Rotated);
    assert_eq!(rotated.use_duration, USE_DURATION);
    assert!(!service.vault().contains("a1"));

    assert!(k2.is_default_pair);
    assert_eq!(k2.participant_id, "p1");
    assert_eq!(k2.private_key_alias, "a2");
    assert!(service.vault().contains("a2"));
    assert_eq!(service.vault().store_count(), 2);
    assert_eq!(service.vault().delete_count(), 1);

    let current =
        service.default_key_pair("p1").await.expect("should query").expect("should exist");
    assert_eq!(current.id, k2.id);

    // the first event is from the initial add
    let events = events.events();
    assert_eq!(events.len(), 3);
    let KeyPairEvent::Rotated(rotation) = &events[1] else {
        panic!("should be a rotated event");
    };
    assert_eq!(rotation.key_pair_resource_id, k1.id);
    let KeyPairEvent::Added(addition) = &events[2] else {
        panic!("should be an added event");
    };
    assert_eq!(addition.key_pair_resource_id, k2.id);
}

#[tokio::test]
async fn rotate_without_replacement() {
    let (service, events) = service();
    let k1 = service.add_key_pair("p1", &ed25519("k1", "a1"), true).await.expect("should add");

    let replacement =
        service.rotate_key_pair(&k1.id, None, USE_DURATION).await.expect("should rotate");
    assert!(replacement.is_none());
    assert!(service.vault().is_empty());
    assert_eq!(service.store().participant_records("p1").len(), 1);
    assert!(service.default_key_pair("p1").await.expect("should query").is_none());
    assert_eq!(events.events().len(), 2);
}

// A non-default key is replaced by a non-default key.
#[tokio::test]
async fn rotate_non_default() {
    let (service, _) = service();
    let k1 = service.add_key_pair("p1", &ed25519("k1", "a1"), false).await.expect("should add");

    let k2 = service
        .rotate_key_pair(&k1.id, Some(&ed25519("k2", "a2")), USE_DURATION)
        .await
        .expect("should rotate")
        .expect("should return new key pair");
    assert!(!k2.is_default_pair);
}

#[tokio::test]
async fn rotate_unknown() {
    let (service, events) = service();

    let err = service
        .rotate_key_pair("not-exist", Some(&ed25519("k2", "a2")), USE_DURATION)
        .await
        .expect_err("should fail");
    assert!(err.is(Err::NotFound));
    assert_eq!(err.to_string(), "A KeyPairResource with ID 'not-exist' does not exist.");
    assert!(service.vault().is_empty());
    assert!(events.events().is_empty());
}

// Rotating twice is rejected before any secret is touched.
#[tokio::test]
async fn rotate_twice() {
    let (service, events) = service();
    let k1 = service.add_key_pair("p1", &ed25519("k1", "a1"), true).await.expect("should add");
    service.rotate_key_pair(&k1.id, None, USE_DURATION).await.expect("should rotate");

    let err = service.rotate_key_pair(&k1.id, None, USE_DURATION).await.expect_err("should fail");
    assert!(err.is(Err::InvalidState));
    assert_eq!(service.vault().delete_count(), 1);
    assert_eq!(events.events().len(), 2);
}

// When the secret is already gone from the vault, the vault's error is surfaced
// after the record has been updated.
#[tokio::test]
async fn rotate_missing_secret() {
    let (service, events) = service();
    let k1 = service.add_key_pair("p1", &ed25519("k1", "a1"), false).await.expect("should add");
    service.vault().delete_secret("a1").await.expect("should delete");

    let err = service.rotate_key_pair(&k1.id, None, USE_DURATION).await.expect_err("should fail");
    assert!(err.is(Err::VaultFailure));
    assert_eq!(err.to_string(), "no secret found for alias 'a1'");
    assert_eq!(service.store().get(&k1.id).expect("should exist").state, KeyPairState::Rotated);
    assert_eq!(events.events().len(), 1);
}

// A rejected replacement leaves the participant's default key pair in place.
#[tokio::test]
async fn rotate_invalid_replacement() {
    let (service, events) = service();
    let k1 = service.add_key_pair("p1", &ed25519("k1", "a1"), true).await.expect("should add");

    let err = service
        .rotate_key_pair(&k1.id, Some(&KeyDescriptor::new("k2", "a2")), USE_DURATION)
        .await
        .expect_err("should fail");
    assert!(err.is(Err::InvalidDescriptor));

    assert_eq!(service.store().get(&k1.id), Some(k1.clone()));
    assert!(service.vault().contains("a1"));
    let current =
        service.default_key_pair("p1").await.expect("should query").expect("should exist");
    assert_eq!(current.id, k1.id);
    assert_eq!(events.events().len(), 1);
}

// The replacement may reuse the alias of the key pair it replaces.
#[tokio::test]
async fn rotate_reusing_alias() {
    let (service, _) = service();
    let k1 = service.add_key_pair("p1", &ed25519("k1", "a1"), true).await.expect("should add");
    let old_secret = service.vault().resolve_secret("a1").await.expect("should resolve");

    let k2 = service
        .rotate_key_pair(&k1.id, Some(&ed25519("k2", "a1")), USE_DURATION)
        .await
        .expect("should rotate")
        .expect("should return new key pair");
    assert_eq!(k2.private_key_alias, "a1");

    let new_secret = service.vault().resolve_secret("a1").await.expect("should resolve");
    assert!(new_secret.is_some());
    assert_ne!(new_secret, old_secret);
}
