//! Session-Scoped Token Cache
//!
//! Persists the access token and its absolute expiry across in-session
//! reloads. Two fixed keys hold the serialized grant and its expiry as a
//! millisecond timestamp; a third holds the raw identity credential.
//!
//! A cached grant is only reused while its expiry is more than
//! [`EXPIRY_MARGIN`] in the future; anything closer is treated as stale
//! and removed.

use crate::error::{Result, SessionError};
use crate::types::IdentityCredential;
use bridge_traits::{Clock, SessionStore, TokenGrant};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Storage key for the serialized access-token grant.
pub const ACCESS_TOKEN_KEY: &str = "wikiAccessToken";

/// Storage key for the grant's absolute expiry (Unix milliseconds).
pub const ACCESS_TOKEN_EXPIRY_KEY: &str = "wikiAccessTokenValidUntil";

/// Storage key for the raw identity credential.
pub const IDENTITY_TOKEN_KEY: &str = "wikiIdToken";

/// A cached grant must outlive now by at least this margin to be reused.
pub const EXPIRY_MARGIN: Duration = Duration::from_secs(5);

/// Session-scoped cache for token material.
#[derive(Clone)]
pub struct TokenCache {
    store: Arc<dyn SessionStore>,
    clock: Arc<dyn Clock>,
}

impl TokenCache {
    pub fn new(store: Arc<dyn SessionStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Loads the cached grant if it is still valid.
    ///
    /// A grant is valid when its recorded expiry lies more than
    /// [`EXPIRY_MARGIN`] in the future. Stale or unparseable entries are
    /// removed and `None` is returned. The returned grant's `expires_in`
    /// is recomputed from the recorded expiry.
    pub async fn load_valid(&self) -> Result<Option<TokenGrant>> {
        let raw_expiry = self
            .store
            .get_item(ACCESS_TOKEN_EXPIRY_KEY)
            .await
            .map_err(|e| SessionError::Storage(e.to_string()))?;

        let now_ms = self.clock.unix_timestamp_millis();
        let margin_ms = EXPIRY_MARGIN.as_millis() as i64;

        let expires_at_ms = match raw_expiry.and_then(|s| s.parse::<i64>().ok()) {
            Some(ms) => ms,
            None => {
                self.clear_access_token().await?;
                return Ok(None);
            }
        };

        if expires_at_ms <= now_ms + margin_ms {
            debug!("Cached access token is stale, discarding");
            self.clear_access_token().await?;
            return Ok(None);
        }

        let raw_grant = self
            .store
            .get_item(ACCESS_TOKEN_KEY)
            .await
            .map_err(|e| SessionError::Storage(e.to_string()))?;

        let Some(raw_grant) = raw_grant else {
            self.clear_access_token().await?;
            return Ok(None);
        };

        match serde_json::from_str::<TokenGrant>(&raw_grant) {
            Ok(mut grant) => {
                grant.expires_in = (expires_at_ms - now_ms) / 1000;
                debug!(
                    expires_in = grant.expires_in,
                    "Reusing cached access token"
                );
                Ok(Some(grant))
            }
            Err(e) => {
                warn!(error = %e, "Discarding unparseable cached access token");
                self.clear_access_token().await?;
                Ok(None)
            }
        }
    }

    /// Persists a grant together with its computed absolute expiry.
    ///
    /// Returns the expiry as a Unix millisecond timestamp.
    pub async fn store(&self, grant: &TokenGrant) -> Result<i64> {
        let expires_at_ms = self.clock.unix_timestamp_millis() + grant.expires_in * 1000;

        let serialized = serde_json::to_string(grant)?;
        self.store
            .set_item(ACCESS_TOKEN_KEY, &serialized)
            .await
            .map_err(|e| SessionError::Storage(e.to_string()))?;
        self.store
            .set_item(ACCESS_TOKEN_EXPIRY_KEY, &expires_at_ms.to_string())
            .await
            .map_err(|e| SessionError::Storage(e.to_string()))?;

        Ok(expires_at_ms)
    }

    /// Removes the cached grant and its expiry.
    pub async fn clear_access_token(&self) -> Result<()> {
        self.store
            .remove_item(ACCESS_TOKEN_KEY)
            .await
            .map_err(|e| SessionError::Storage(e.to_string()))?;
        self.store
            .remove_item(ACCESS_TOKEN_EXPIRY_KEY)
            .await
            .map_err(|e| SessionError::Storage(e.to_string()))?;
        Ok(())
    }

    /// Persists the raw identity credential.
    pub async fn store_identity(&self, credential: &IdentityCredential) -> Result<()> {
        self.store
            .set_item(IDENTITY_TOKEN_KEY, credential.as_str())
            .await
            .map_err(|e| SessionError::Storage(e.to_string()))
    }

    /// Removes the persisted identity credential.
    pub async fn clear_identity(&self) -> Result<()> {
        self.store
            .remove_item(IDENTITY_TOKEN_KEY)
            .await
            .map_err(|e| SessionError::Storage(e.to_string()))
    }
}
