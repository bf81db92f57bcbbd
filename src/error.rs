//! # Key-Pair Errors
//!
//! This module defines the error types used by the key-pair lifecycle service, including for
//! the provider traits implemented in other crates (metadata stores, secret vaults and event
//! routers).

use std::fmt::Display;

use thiserror::Error;

/// Simplify creation of errors with tracing.
///
/// # Example
/// ```
/// use vercre_keypairs::error::Err;
/// use vercre_keypairs::{Result, tracerr};
///
/// fn with_msg() -> Result<()> {
///     tracerr!(Err::InvalidDescriptor, "message: {}", "some message")
/// }
///
/// fn no_msg() -> Result<()> {
///     tracerr!(Err::InvalidDescriptor)
/// }
/// ```
#[macro_export]
macro_rules! tracerr {
    // with context
    ($code:expr, $($msg:tt)*) => {
        {
        use $crate::error::Context as _;
        tracing::error!($($msg)*);
        return Err($code).context(format!($($msg)*));
        }
    };
    // no context
    ($code:expr) => {
        {
        tracing::error!("{}", $code);
        return Err($code.into());
        }
    }
}

/// Public error type for key-pair operations.
#[derive(Error, Debug)]
#[error(transparent)]
pub struct Error(#[from] anyhow::Error);

impl Error {
    /// Transfer the error to `OAuth2` compatible format.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "error": self.0.root_cause().to_string(),
            "error_description": self.to_string(),
        })
    }

    /// Returns true if `E` is the type held by this error object.
    #[must_use]
    pub fn is(&self, err: Err) -> bool {
        self.code() == Some(err)
    }

    /// The typed error code carried by this error, if any.
    #[must_use]
    pub fn code(&self) -> Option<Err> {
        self.0.downcast_ref::<Err>().copied()
    }
}

/// Typed errors for key-pair lifecycle operations.
#[derive(Clone, Copy, Error, Debug, PartialEq, Eq)]
pub enum Err {
    /// The key descriptor is malformed or ambiguous: both or neither of a public key and key
    /// generator parameters were supplied, or required identifiers are missing.
    #[error("invalid_descriptor")]
    InvalidDescriptor,

    /// No key-pair record exists for the requested ID.
    #[error("not_found")]
    NotFound,

    /// The key-pair record is in a state that does not permit the requested transition.
    #[error("invalid_state")]
    InvalidState,

    /// The key-pair metadata store reported a failure. (See context for details)
    #[error("store_failure")]
    StoreFailure,

    /// The secret vault reported a failure. (See context for details)
    #[error("vault_failure")]
    VaultFailure,

    /// The key generator cannot produce a key for the requested algorithm and curve.
    #[error("unsupported_algorithm")]
    UnsupportedAlgorithm,

    /// Invalid key is where the format of the key is incorrect.
    #[error("invalid_key")]
    InvalidKey,

    /// An error occurred trying to serialize data.
    #[error("serialization_error")]
    SerializationError,

    /// Environment configuration could not be resolved.
    #[error("invalid_config")]
    InvalidConfig,
}

/// Context is used to decorate errors with useful context information.
pub trait Context<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    /// Adds context to the error.
    ///
    /// # Errors
    ///
    /// * Original error with context appended.
    fn context<C>(self, context: C) -> Result<T, Error>
    where
        C: Display + Send + Sync + 'static;
}

impl<T, E> Context<T, E> for core::result::Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn context<C>(self, context: C) -> Result<T, Error>
    where
        C: Display + Send + Sync + 'static,
    {
        match self {
            Ok(ok) => Ok(ok),
            Err(e) => Err(Error(anyhow::Error::from(e).context(context))),
        }
    }
}

impl From<Err> for Error {
    fn from(error: Err) -> Self {
        Self(error.into())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self(anyhow::Error::from(err).context(Err::SerializationError))
    }
}
