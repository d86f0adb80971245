//! Session Storage Abstraction
//!
//! Provides a platform-agnostic trait for session-scoped key-value storage.

use async_trait::async_trait;

use crate::error::Result;

/// Session-scoped key-value storage trait
///
/// Abstracts the host's session storage mechanism:
/// - Web: sessionStorage (cleared when the tab closes)
/// - Desktop: in-memory store tied to the process lifetime
/// - Mobile: in-memory store tied to the app session
///
/// Values stored here are expected to survive in-session reloads but not
/// outlive the session. Token material lands here, so implementations must
/// never write it to durable unencrypted storage.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::SessionStore;
///
/// async fn remember(store: &dyn SessionStore) -> Result<()> {
///     store.set_item("last_view", "wiki/home").await?;
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Store a string value under a key, replacing any previous value
    async fn set_item(&self, key: &str, value: &str) -> Result<()>;

    /// Retrieve a string value
    ///
    /// Returns `Ok(None)` if the key doesn't exist.
    async fn get_item(&self, key: &str) -> Result<Option<String>>;

    /// Remove a single key
    ///
    /// Removing a missing key is not an error.
    async fn remove_item(&self, key: &str) -> Result<()>;

    /// Check if a key exists without retrieving it
    async fn has_item(&self, key: &str) -> Result<bool> {
        Ok(self.get_item(key).await?.is_some())
    }

    /// List all stored keys
    async fn list_keys(&self) -> Result<Vec<String>>;

    /// Clear the entire session store
    async fn clear(&self) -> Result<()>;
}
