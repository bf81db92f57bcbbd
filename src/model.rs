//! # Key-Pair Data Model
//!
//! The persisted [`KeyPairResource`] record and the caller-supplied [`KeyDescriptor`] used to
//! request new key material.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Err;
use crate::{Result, tracerr};

/// Lifecycle state of a key pair. `Rotated` and `Revoked` are terminal.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum KeyPairState {
    /// The key pair has been created and is in use.
    #[default]
    Created,

    /// The key pair was replaced as part of a planned renewal.
    Rotated,

    /// The key pair was invalidated, typically because it was compromised or retired.
    Revoked,
}

impl KeyPairState {
    /// Whether the state permits no further transitions.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Rotated | Self::Revoked)
    }
}

impl std::fmt::Display for KeyPairState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Created => write!(f, "CREATED"),
            Self::Rotated => write!(f, "ROTATED"),
            Self::Revoked => write!(f, "REVOKED"),
        }
    }
}

/// Public metadata describing one key pair. The private key is never part of the record: it is
/// held by the vault under `private_key_alias`.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct KeyPairResource {
    /// Unique identifier of the record, generated at creation.
    pub id: String,

    /// The participant owning the key pair.
    pub participant_id: String,

    /// Logical key identifier, e.g. the `kid` used in signature headers.
    pub key_id: String,

    /// Vault alias of the private key.
    pub private_key_alias: String,

    /// Public key as JWK JSON or PEM.
    pub serialized_public_key: String,

    /// Lifecycle state.
    pub state: KeyPairState,

    /// Whether this is the participant's default key pair.
    pub is_default_pair: bool,

    /// Intended validity window, in milliseconds.
    pub use_duration: u64,

    /// Time the record was created.
    pub created_at: DateTime<Utc>,

    /// Time of the most recent state transition.
    pub state_changed_at: DateTime<Utc>,
}

impl KeyPairResource {
    /// Move the record into `state` at time `now`.
    pub(crate) fn transition(&mut self, state: KeyPairState, now: DateTime<Utc>) {
        self.state = state;
        self.state_changed_at = now;
    }
}

/// Parameters passed to the key generator when the service should create key material.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct KeyGeneratorParams {
    /// Algorithm identifier, e.g. `EdDSA` or `ES256K`.
    pub algorithm: String,

    /// Curve name, e.g. `Ed25519`. Some algorithms imply a default curve.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub curve: Option<String>,
}

impl KeyGeneratorParams {
    /// Parameters for `algorithm` on `curve`.
    pub fn new(algorithm: impl Into<String>, curve: impl Into<String>) -> Self {
        Self {
            algorithm: algorithm.into(),
            curve: Some(curve.into()),
        }
    }
}

/// Simplified JSON Web Key (JWK) key structure.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Jwk {
    /// Key type.
    pub kty: String,
    /// Cryptographic curve type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crv: Option<String>,
    /// X coordinate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<String>,
    /// Y coordinate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<String>,
    /// Secret key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub d: Option<String>,
}

impl Jwk {
    /// Whether the key carries private material.
    #[must_use]
    pub const fn is_private(&self) -> bool {
        self.d.is_some()
    }

    /// The public half of the key.
    #[must_use]
    pub fn to_public(&self) -> Self {
        Self {
            d: None,
            ..self.clone()
        }
    }
}

/// Caller-supplied description of the key material for a new key pair.
///
/// Exactly one mode must be used: either a public key is supplied (as JWK or PEM) and the
/// private key is managed out of band, or generator parameters are supplied and the service
/// generates the key pair, storing the private half in the vault.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct KeyDescriptor {
    /// Logical key identifier for the new key pair.
    pub key_id: String,

    /// Vault alias of the private key.
    pub private_key_alias: String,

    /// Caller-supplied public key as a JWK.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_key_jwk: Option<Jwk>,

    /// Caller-supplied public key in PEM encoding.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_key_pem: Option<String>,

    /// Parameters for generating a new key pair.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_generator_params: Option<KeyGeneratorParams>,

    /// Validity window in milliseconds. The configured default is used when not set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_duration: Option<u64>,
}

/// Key material requested by a validated [`KeyDescriptor`].
#[derive(Debug, PartialEq, Eq)]
pub enum KeyMaterial<'a> {
    /// The caller supplied the public key, already serialized.
    Supplied(String),

    /// The key pair is to be generated.
    Generated(&'a KeyGeneratorParams),
}

impl KeyDescriptor {
    /// Create a descriptor for `key_id` whose private key lives at `private_key_alias`.
    pub fn new(key_id: impl Into<String>, private_key_alias: impl Into<String>) -> Self {
        Self {
            key_id: key_id.into(),
            private_key_alias: private_key_alias.into(),
            ..Self::default()
        }
    }

    /// Supply the public key as a JWK.
    #[must_use]
    pub fn public_key_jwk(mut self, jwk: Jwk) -> Self {
        self.public_key_jwk = Some(jwk);
        self
    }

    /// Supply the public key as PEM.
    #[must_use]
    pub fn public_key_pem(mut self, pem: impl Into<String>) -> Self {
        self.public_key_pem = Some(pem.into());
        self
    }

    /// Request a generated key pair.
    #[must_use]
    pub fn generate(mut self, params: KeyGeneratorParams) -> Self {
        self.key_generator_params = Some(params);
        self
    }

    /// Set the validity window in milliseconds.
    #[must_use]
    pub const fn use_duration(mut self, millis: u64) -> Self {
        self.use_duration = Some(millis);
        self
    }

    /// Check the descriptor is unambiguous and return the key material it requests.
    ///
    /// # Errors
    ///
    /// * `Err::InvalidDescriptor` - identifiers are empty, both or neither of a public key and
    ///   generator parameters are present, or both a JWK and a PEM are present.
    /// * `Err::InvalidKey` - the supplied JWK contains private key material.
    /// * `Err::SerializationError` - the supplied JWK cannot be serialized.
    pub fn validate(&self) -> Result<KeyMaterial<'_>> {
        if self.key_id.trim().is_empty() {
            tracerr!(Err::InvalidDescriptor, "key descriptor has no key ID");
        }
        if self.private_key_alias.trim().is_empty() {
            tracerr!(Err::InvalidDescriptor, "key descriptor has no private key alias");
        }

        match (&self.public_key_jwk, &self.public_key_pem, &self.key_generator_params) {
            (None, None, Some(params)) => Ok(KeyMaterial::Generated(params)),
            (Some(jwk), None, None) => {
                if jwk.is_private() {
                    tracerr!(Err::InvalidKey, "supplied public key JWK contains a private key");
                }
                Ok(KeyMaterial::Supplied(serde_json::to_string(jwk)?))
            }
            (None, Some(pem), None) => Ok(KeyMaterial::Supplied(pem.clone())),
            (None, None, None) => tracerr!(
                Err::InvalidDescriptor,
                "key descriptor must contain either a public key or key generator params"
            ),
            (Some(_), Some(_), _) => tracerr!(
                Err::InvalidDescriptor,
                "key descriptor must not contain both a public key JWK and PEM"
            ),
            (_, _, Some(_)) => tracerr!(
                Err::InvalidDescriptor,
                "key descriptor must not contain both a public key and key generator params"
            ),
        }
    }
}
