//! # Configuration
//!
//! Settings for [`crate::KeyPairService`]. Values can be deserialized from a configuration
//! document or read from the environment.

use serde::{Deserialize, Serialize};

use crate::error::Err;
use crate::{Result, tracerr};

/// Default use duration: 180 days, in milliseconds.
pub const DEFAULT_USE_DURATION: u64 = 180 * 24 * 60 * 60 * 1000;

const USE_DURATION_VAR: &str = "KEYPAIR_DEFAULT_USE_DURATION";
const CLEAR_DEFAULT_VAR: &str = "KEYPAIR_CLEAR_PREVIOUS_DEFAULT";

/// Key-pair service configuration.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct KeyPairConfig {
    /// Use duration, in milliseconds, applied to new key pairs whose descriptor does not
    /// specify one.
    pub default_use_duration: u64,

    /// When adding a default key pair, clear the default flag on the participant's current
    /// default key pair.
    pub clear_previous_default: bool,
}

impl Default for KeyPairConfig {
    fn default() -> Self {
        Self {
            default_use_duration: DEFAULT_USE_DURATION,
            clear_previous_default: true,
        }
    }
}

impl KeyPairConfig {
    /// Set the default use duration in milliseconds.
    #[must_use]
    pub const fn default_use_duration(mut self, millis: u64) -> Self {
        self.default_use_duration = millis;
        self
    }

    /// Set whether adding a default key pair clears the previous default.
    #[must_use]
    pub const fn clear_previous_default(mut self, clear: bool) -> Self {
        self.clear_previous_default = clear;
        self
    }

    /// Read configuration from `KEYPAIR_DEFAULT_USE_DURATION` and
    /// `KEYPAIR_CLEAR_PREVIOUS_DEFAULT`, using defaults for unset variables.
    ///
    /// # Errors
    ///
    /// * `Err::InvalidConfig` - a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(value) = lookup(USE_DURATION_VAR) {
            match value.trim().parse() {
                Ok(millis) => config.default_use_duration = millis,
                Err(e) => tracerr!(Err::InvalidConfig, "invalid {USE_DURATION_VAR} '{value}': {e}"),
            }
        }
        if let Some(value) = lookup(CLEAR_DEFAULT_VAR) {
            match value.trim().parse() {
                Ok(clear) => config.clear_previous_default = clear,
                Err(e) => {
                    tracerr!(Err::InvalidConfig, "invalid {CLEAR_DEFAULT_VAR} '{value}': {e}")
                }
            }
        }

        tracing::debug!(?config, "key-pair configuration loaded");
        Ok(config)
    }
}
