//! Synchronous notification of key-pair lifecycle transitions.

use crate::Result;
use crate::model::KeyPairResource;

/// Receives key-pair lifecycle notifications. All callbacks default to doing nothing.
///
/// Listeners are trusted in-process code, typically an adapter publishing to an event router.
/// An error returned from a callback aborts notification of the remaining listeners and is
/// returned to the caller of the lifecycle operation.
pub trait KeyPairListener: Send + Sync {
    /// A key pair was created.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot process the notification.
    fn added(&self, resource: &KeyPairResource) -> Result<()> {
        let _ = resource;
        Ok(())
    }

    /// A key pair was rotated.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot process the notification.
    fn rotated(&self, resource: &KeyPairResource) -> Result<()> {
        let _ = resource;
        Ok(())
    }

    /// A key pair was revoked.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot process the notification.
    fn revoked(&self, resource: &KeyPairResource) -> Result<()> {
        let _ = resource;
        Ok(())
    }
}

/// Registry of [`KeyPairListener`]s, invoked in registration order.
#[derive(Default)]
pub struct KeyPairObservable {
    listeners: Vec<Box<dyn KeyPairListener>>,
}

impl KeyPairObservable {
    /// Create an observable with no listeners.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a listener.
    pub fn register_listener(&mut self, listener: impl KeyPairListener + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Call `f` once for each listener, in registration order, stopping at the first error.
    ///
    /// # Errors
    ///
    /// Returns the first error returned by `f`.
    pub fn invoke_for_each<F>(&self, f: F) -> Result<()>
    where
        F: Fn(&dyn KeyPairListener) -> Result<()>,
    {
        for listener in &self.listeners {
            f(listener.as_ref())?;
        }
        Ok(())
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    /// Whether no listeners are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl std::fmt::Debug for KeyPairObservable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPairObservable").field("listeners", &self.listeners.len()).finish()
    }
}
