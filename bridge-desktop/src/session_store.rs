//! In-Memory Session Store
//!
//! Desktop analogue of a browser's session storage: values live for the
//! process lifetime and vanish on exit.

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    storage::SessionStore,
};
use std::collections::HashMap;
use std::sync::RwLock;

/// Process-lifetime session store backed by a HashMap
#[derive(Default)]
pub struct MemorySessionStore {
    items: RwLock<HashMap<String, String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, HashMap<String, String>>> {
        self.items
            .read()
            .map_err(|_| BridgeError::StorageError("session store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, HashMap<String, String>>> {
        self.items
            .write()
            .map_err(|_| BridgeError::StorageError("session store lock poisoned".to_string()))
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.write()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read()?.get(key).cloned())
    }

    async fn remove_item(&self, key: &str) -> Result<()> {
        self.write()?.remove(key);
        Ok(())
    }

    async fn list_keys(&self) -> Result<Vec<String>> {
        Ok(self.read()?.keys().cloned().collect())
    }

    async fn clear(&self) -> Result<()> {
        self.write()?.clear();
        Ok(())
    }
}
