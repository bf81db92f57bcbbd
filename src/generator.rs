//! Key generation for key pairs whose material is created by the service rather than supplied
//! by the caller.

use base64ct::{Base64UrlUnpadded, Encoding};
use ed25519_dalek::SigningKey;
use rand::rngs::OsRng;
use x25519_dalek::{PublicKey, StaticSecret};

use crate::error::Err;
use crate::model::{Jwk, KeyGeneratorParams};
use crate::{Result, tracerr};

/// Produces fresh asymmetric key pairs.
pub trait KeyGenerator: Send + Sync {
    /// Generate a key pair for the algorithm and curve given in `params`.
    ///
    /// # Errors
    ///
    /// * `Err::UnsupportedAlgorithm` - the algorithm and curve combination is not supported.
    fn generate(&self, params: &KeyGeneratorParams) -> Result<GeneratedKeyPair>;
}

/// Both halves of a generated key pair, expressed as JWKs.
#[derive(Clone, Debug)]
pub struct GeneratedKeyPair {
    /// Public key.
    pub public_key: Jwk,

    /// Private key, including the public parameters.
    pub private_key: Jwk,
}

impl GeneratedKeyPair {
    /// Public key serialized as JWK JSON, suitable for the metadata record.
    ///
    /// # Errors
    ///
    /// * `Err::SerializationError` - the key cannot be serialized.
    pub fn serialized_public_key(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.public_key)?)
    }

    /// Private key serialized as JWK JSON, suitable for the vault.
    ///
    /// # Errors
    ///
    /// * `Err::SerializationError` - the key cannot be serialized.
    pub fn serialized_private_key(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.private_key)?)
    }
}

// Key types the default generator can produce.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum KeyType {
    Ed25519,
    X25519,
    Secp256k1,
}

impl KeyType {
    fn from_params(params: &KeyGeneratorParams) -> Result<Self> {
        let algorithm = params.algorithm.to_ascii_uppercase();
        let curve = params.curve.as_deref().map(str::to_ascii_lowercase);

        match (algorithm.as_str(), curve.as_deref()) {
            ("EDDSA", None | Some("ed25519")) => Ok(Self::Ed25519),
            ("EDDSA" | "ECDH-ES", Some("x25519")) | ("ECDH-ES", None) => Ok(Self::X25519),
            ("EC", Some("secp256k1")) | ("ES256K", None | Some("secp256k1")) => {
                Ok(Self::Secp256k1)
            }
            _ => tracerr!(
                Err::UnsupportedAlgorithm,
                "unsupported key generator params: algorithm '{}', curve '{}'",
                params.algorithm,
                params.curve.as_deref().unwrap_or_default()
            ),
        }
    }
}

/// Key generator supporting Ed25519, X25519 and secp256k1 keys.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultKeyGenerator;

impl KeyGenerator for DefaultKeyGenerator {
    fn generate(&self, params: &KeyGeneratorParams) -> Result<GeneratedKeyPair> {
        let private_key = match KeyType::from_params(params)? {
            KeyType::Ed25519 => {
                let signing_key = SigningKey::generate(&mut OsRng);
                okp("Ed25519", signing_key.verifying_key().as_bytes(), signing_key.as_bytes())
            }
            KeyType::X25519 => {
                let secret = StaticSecret::random_from_rng(OsRng);
                let public = PublicKey::from(&secret);
                okp("X25519", public.as_bytes(), secret.as_bytes())
            }
            KeyType::Secp256k1 => {
                let secret = k256::SecretKey::random(&mut OsRng);
                match serde_json::from_str::<Jwk>(&secret.to_jwk_string()) {
                    Ok(jwk) => jwk,
                    Err(e) => tracerr!(Err::InvalidKey, "failed to encode secp256k1 key: {e}"),
                }
            }
        };

        Ok(GeneratedKeyPair {
            public_key: private_key.to_public(),
            private_key,
        })
    }
}

fn okp(crv: &str, x: &[u8], d: &[u8]) -> Jwk {
    Jwk {
        kty: "OKP".to_string(),
        crv: Some(crv.to_string()),
        x: Some(Base64UrlUnpadded::encode_string(x)),
        y: None,
        d: Some(Base64UrlUnpadded::encode_string(d)),
    }
}
