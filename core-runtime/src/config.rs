//! # Core Configuration Module
//!
//! Provides configuration management for the wiki core.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a
//! [`WikiConfig`] instance holding the identity client id, Drive API key, and
//! wiki root settings. It enforces fail-fast validation: the client id and
//! API key must be non-empty unless an external `config.json` overlay is in
//! use.
//!
//! A [`ConfigLoader`] can overlay the static configuration with values from
//! a hosted `config.json`, caching the overlay in session storage so a
//! subsequent startup doesn't block on the network.
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::config::WikiConfig;
//!
//! let config = WikiConfig::builder()
//!     .client_id("client-123.apps.example.com")
//!     .api_key("api-key-abc")
//!     .build()
//!     .expect("Failed to build config");
//! ```

use crate::error::{Error, Result};
use bridge_traits::{HttpClient, HttpMethod, HttpRequest, SessionStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// OAuth scopes requested when minting an access token.
///
/// Covers profile, Drive metadata, Drive read, per-file access, and
/// read-only Docs access.
pub const OAUTH_SCOPES: &str = "https://www.googleapis.com/auth/plus.login \
     https://www.googleapis.com/auth/drive.metadata \
     https://www.googleapis.com/auth/drive.readonly \
     https://www.googleapis.com/auth/drive.file \
     https://www.googleapis.com/auth/documents.readonly";

/// Field projection used for Drive file listing requests.
pub const DEFAULT_FILE_FIELDS: &str = "nextPageToken, files(properties, appProperties, name, id, driveId, parents, mimeType, modifiedTime, createdTime, lastModifyingUser(displayName, photoLink), iconLink, webViewLink, shortcutDetails, capabilities, starred)";

/// Session storage key under which the fetched overlay is cached.
const CONFIG_STORAGE_KEY: &str = "app-config";

/// Delay before refreshing a cached overlay in the background.
const OVERLAY_REFRESH_DELAY: Duration = Duration::from_secs(5);

/// Static configuration for the wiki core.
///
/// Use [`WikiConfigBuilder`] to construct instances.
#[derive(Clone, PartialEq, Eq)]
pub struct WikiConfig {
    /// OAuth client identifier for the identity provider
    pub client_id: String,

    /// API key for the Drive REST API
    pub api_key: String,

    /// Workspace domain users must belong to, if restricted
    pub hosted_domain: String,

    /// File id of the wiki root folder
    pub root_folder_id: String,

    /// Shared drive id containing the wiki root
    pub root_drive_id: String,

    /// Display name of the wiki
    pub app_name: String,

    /// Whether configuration is completed by a hosted `config.json` overlay
    pub use_config_file: bool,

    /// How long a sign-in prompt may stay unanswered before it is
    /// considered cancelled
    pub prompt_timeout: Duration,

    /// OAuth scopes requested for access tokens
    pub scopes: String,
}

impl std::fmt::Debug for WikiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WikiConfig")
            .field("client_id", &self.client_id)
            .field("api_key", &"[REDACTED]")
            .field("hosted_domain", &self.hosted_domain)
            .field("root_folder_id", &self.root_folder_id)
            .field("root_drive_id", &self.root_drive_id)
            .field("app_name", &self.app_name)
            .field("use_config_file", &self.use_config_file)
            .field("prompt_timeout", &self.prompt_timeout)
            .finish()
    }
}

impl WikiConfig {
    /// Creates a new builder for constructing a `WikiConfig`.
    pub fn builder() -> WikiConfigBuilder {
        WikiConfigBuilder::default()
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - Client id and API key are non-empty, unless `use_config_file` is
    ///   set (the overlay will supply them)
    /// - Prompt timeout is non-zero
    pub fn validate(&self) -> Result<()> {
        if !self.use_config_file {
            if self.client_id.is_empty() {
                return Err(Error::Config(
                    "Client id is not configured. Set it directly or enable the config file overlay."
                        .to_string(),
                ));
            }
            if self.api_key.is_empty() {
                return Err(Error::Config(
                    "API key is not configured. Set it directly or enable the config file overlay."
                        .to_string(),
                ));
            }
        }

        if self.prompt_timeout.is_zero() {
            return Err(Error::Config(
                "Prompt timeout must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

/// Builder for constructing [`WikiConfig`] instances.
pub struct WikiConfigBuilder {
    client_id: String,
    api_key: String,
    hosted_domain: String,
    root_folder_id: String,
    root_drive_id: String,
    app_name: String,
    use_config_file: bool,
    prompt_timeout: Duration,
    scopes: String,
}

impl Default for WikiConfigBuilder {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            api_key: String::new(),
            hosted_domain: String::new(),
            root_folder_id: String::new(),
            root_drive_id: String::new(),
            app_name: "Drive Wiki".to_string(),
            use_config_file: false,
            prompt_timeout: Duration::from_secs(120),
            scopes: OAUTH_SCOPES.to_string(),
        }
    }
}

impl WikiConfigBuilder {
    /// Sets the OAuth client identifier.
    pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = client_id.into();
        self
    }

    /// Sets the Drive API key.
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = api_key.into();
        self
    }

    /// Restricts sign-in to a workspace domain.
    pub fn hosted_domain(mut self, domain: impl Into<String>) -> Self {
        self.hosted_domain = domain.into();
        self
    }

    /// Sets the file id of the wiki root folder.
    pub fn root_folder_id(mut self, id: impl Into<String>) -> Self {
        self.root_folder_id = id.into();
        self
    }

    /// Sets the shared drive id containing the wiki root.
    pub fn root_drive_id(mut self, id: impl Into<String>) -> Self {
        self.root_drive_id = id.into();
        self
    }

    /// Sets the display name of the wiki.
    pub fn app_name(mut self, name: impl Into<String>) -> Self {
        self.app_name = name.into();
        self
    }

    /// Declares that a hosted `config.json` overlay completes the
    /// configuration, relaxing the client id / API key validation.
    pub fn use_config_file(mut self, enabled: bool) -> Self {
        self.use_config_file = enabled;
        self
    }

    /// Sets how long a sign-in prompt may stay unanswered.
    ///
    /// Default: 120 seconds.
    pub fn prompt_timeout(mut self, timeout: Duration) -> Self {
        self.prompt_timeout = timeout;
        self
    }

    /// Overrides the OAuth scopes requested for access tokens.
    pub fn scopes(mut self, scopes: impl Into<String>) -> Self {
        self.scopes = scopes.into();
        self
    }

    /// Builds the final `WikiConfig` instance.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails, e.g. a missing client id
    /// without the config file overlay enabled.
    pub fn build(self) -> Result<WikiConfig> {
        let config = WikiConfig {
            client_id: self.client_id,
            api_key: self.api_key,
            hosted_domain: self.hosted_domain,
            root_folder_id: self.root_folder_id,
            root_drive_id: self.root_drive_id,
            app_name: self.app_name,
            use_config_file: self.use_config_file,
            prompt_timeout: self.prompt_timeout,
            scopes: self.scopes,
        };

        config.validate()?;

        Ok(config)
    }
}

/// Overlay values fetched from a hosted `config.json`.
///
/// Field names match the keys of the hosted document. Only non-empty values
/// overwrite the static configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigOverlay {
    #[serde(rename = "REACT_APP_GAPI_CLIENT_ID", default)]
    pub client_id: Option<String>,
    #[serde(rename = "REACT_APP_GAPI_KEY", default)]
    pub api_key: Option<String>,
    #[serde(rename = "REACT_APP_GAPI_HOSTED_DOMAIN", default)]
    pub hosted_domain: Option<String>,
    #[serde(rename = "REACT_APP_ROOT_ID", default)]
    pub root_folder_id: Option<String>,
    #[serde(rename = "REACT_APP_ROOT_DRIVE_ID", default)]
    pub root_drive_id: Option<String>,
    #[serde(rename = "REACT_APP_NAME", default)]
    pub app_name: Option<String>,
}

impl ConfigOverlay {
    /// Applies the overlay to a configuration. Empty values are skipped.
    pub fn apply(&self, config: &mut WikiConfig) {
        fn overwrite(target: &mut String, source: &Option<String>) {
            if let Some(value) = source {
                if !value.is_empty() {
                    *target = value.clone();
                }
            }
        }

        overwrite(&mut config.client_id, &self.client_id);
        overwrite(&mut config.api_key, &self.api_key);
        overwrite(&mut config.hosted_domain, &self.hosted_domain);
        overwrite(&mut config.root_folder_id, &self.root_folder_id);
        overwrite(&mut config.root_drive_id, &self.root_drive_id);
        overwrite(&mut config.app_name, &self.app_name);
    }
}

/// Loads and caches the hosted `config.json` overlay.
///
/// On first startup the overlay is fetched before the configuration is
/// used. Afterwards the cached copy is applied immediately and refreshed in
/// the background, so a startup doesn't block on the network.
pub struct ConfigLoader {
    http_client: Arc<dyn HttpClient>,
    session_store: Arc<dyn SessionStore>,
    base_url: String,
}

impl ConfigLoader {
    pub fn new(
        http_client: Arc<dyn HttpClient>,
        session_store: Arc<dyn SessionStore>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            http_client,
            session_store,
            base_url: base_url.into(),
        }
    }

    /// Applies the overlay to `config`.
    ///
    /// Uses the cached overlay when present and schedules a background
    /// refresh; otherwise fetches synchronously. A fetch failure is fatal
    /// only when the configuration depends on the overlay.
    pub async fn load(self: Arc<Self>, config: &mut WikiConfig) -> Result<()> {
        if let Some(cached) = self.cached_overlay().await? {
            cached.apply(config);
            debug!("Applied cached configuration overlay");

            // Refresh the cache for the next startup. Delayed to keep
            // startup traffic low.
            let loader = Arc::clone(&self);
            tokio::spawn(async move {
                tokio::time::sleep(OVERLAY_REFRESH_DELAY).await;
                if let Err(e) = loader.fetch_and_cache().await {
                    warn!(error = %e, "Background config overlay refresh failed");
                }
            });

            return Ok(());
        }

        match self.fetch_and_cache().await {
            Ok(overlay) => {
                overlay.apply(config);
                Ok(())
            }
            Err(e) if config.use_config_file => Err(e),
            Err(e) => {
                warn!(error = %e, "Config overlay fetch failed, continuing with static config");
                Ok(())
            }
        }
    }

    /// Fetches `config.json` and caches the raw document.
    pub async fn fetch_and_cache(&self) -> Result<ConfigOverlay> {
        let url = format!("{}/config.json", self.base_url.trim_end_matches('/'));
        let request =
            HttpRequest::new(HttpMethod::Get, &url).header("Accept", "application/json");

        let response = self
            .http_client
            .execute(request)
            .await
            .map_err(|e| Error::Internal(format!("Config fetch failed: {}", e)))?;

        if !response.is_success() {
            return Err(Error::Config(format!(
                "Config fetch returned HTTP {}",
                response.status
            )));
        }

        let raw = response
            .text()
            .map_err(|e| Error::Config(format!("Config response is not UTF-8: {}", e)))?;

        let overlay: ConfigOverlay = serde_json::from_str(&raw)
            .map_err(|e| Error::Config(format!("Invalid config.json: {}", e)))?;

        self.session_store
            .set_item(CONFIG_STORAGE_KEY, &raw)
            .await
            .map_err(|e| Error::Internal(format!("Failed to cache config overlay: {}", e)))?;

        Ok(overlay)
    }

    async fn cached_overlay(&self) -> Result<Option<ConfigOverlay>> {
        let raw = self
            .session_store
            .get_item(CONFIG_STORAGE_KEY)
            .await
            .map_err(|e| Error::Internal(format!("Failed to read cached config: {}", e)))?;

        let Some(raw) = raw else {
            return Ok(None);
        };

        match serde_json::from_str(&raw) {
            Ok(overlay) => Ok(Some(overlay)),
            Err(e) => {
                // Stale or corrupt cache entry, drop it
                warn!(error = %e, "Discarding unparseable cached config overlay");
                self.session_store
                    .remove_item(CONFIG_STORAGE_KEY)
                    .await
                    .map_err(|e| Error::Internal(format!("Failed to clear cached config: {}", e)))?;
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::error::Result as BridgeResult;
    use bridge_traits::{BridgeError, HttpResponse};
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[test]
    fn test_builder_with_required_fields() {
        let config = WikiConfig::builder()
            .client_id("client-id")
            .api_key("api-key")
            .build()
            .unwrap();

        assert_eq!(config.client_id, "client-id");
        assert_eq!(config.api_key, "api-key");
        assert_eq!(config.scopes, OAUTH_SCOPES);
    }

    #[test]
    fn test_builder_requires_client_id() {
        let result = WikiConfig::builder().api_key("api-key").build();

        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Client id is not configured"));
    }

    #[test]
    fn test_builder_requires_api_key() {
        let result = WikiConfig::builder().client_id("client-id").build();

        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("API key is not configured"));
    }

    #[test]
    fn test_config_file_relaxes_validation() {
        let config = WikiConfig::builder().use_config_file(true).build().unwrap();

        assert!(config.client_id.is_empty());
        assert!(config.use_config_file);
    }

    #[test]
    fn test_zero_prompt_timeout_rejected() {
        let result = WikiConfig::builder()
            .client_id("client-id")
            .api_key("api-key")
            .prompt_timeout(Duration::ZERO)
            .build();

        assert!(result.is_err());
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let config = WikiConfig::builder()
            .client_id("client-id")
            .api_key("very-secret-key")
            .build()
            .unwrap();

        let debug = format!("{:?}", config);
        assert!(!debug.contains("very-secret-key"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_overlay_skips_empty_values() {
        let mut config = WikiConfig::builder()
            .client_id("original-client")
            .api_key("original-key")
            .app_name("Original Wiki")
            .build()
            .unwrap();

        let overlay = ConfigOverlay {
            client_id: Some("overlay-client".to_string()),
            api_key: Some(String::new()),
            app_name: None,
            ..Default::default()
        };

        overlay.apply(&mut config);

        assert_eq!(config.client_id, "overlay-client");
        assert_eq!(config.api_key, "original-key");
        assert_eq!(config.app_name, "Original Wiki");
    }

    #[test]
    fn test_overlay_deserializes_hosted_keys() {
        let json = r#"{
            "REACT_APP_GAPI_CLIENT_ID": "client-from-file",
            "REACT_APP_GAPI_KEY": "key-from-file",
            "REACT_APP_ROOT_ID": "root-123"
        }"#;

        let overlay: ConfigOverlay = serde_json::from_str(json).unwrap();
        assert_eq!(overlay.client_id.as_deref(), Some("client-from-file"));
        assert_eq!(overlay.api_key.as_deref(), Some("key-from-file"));
        assert_eq!(overlay.root_folder_id.as_deref(), Some("root-123"));
        assert!(overlay.root_drive_id.is_none());
    }

    // Mock implementations for loader tests

    struct MockHttpClient {
        response_body: String,
        status: u16,
        calls: Mutex<u32>,
    }

    impl MockHttpClient {
        fn new(status: u16, body: &str) -> Self {
            Self {
                response_body: body.to_string(),
                status,
                calls: Mutex::new(0),
            }
        }
    }

    #[async_trait]
    impl HttpClient for MockHttpClient {
        async fn execute(&self, _request: HttpRequest) -> BridgeResult<HttpResponse> {
            *self.calls.lock().unwrap() += 1;
            Ok(HttpResponse {
                status: self.status,
                headers: HashMap::new(),
                body: bytes::Bytes::from(self.response_body.clone()),
            })
        }
    }

    #[derive(Default)]
    struct MockSessionStore {
        items: Mutex<HashMap<String, String>>,
    }

    #[async_trait]
    impl SessionStore for MockSessionStore {
        async fn set_item(&self, key: &str, value: &str) -> BridgeResult<()> {
            self.items
                .lock()
                .map_err(|_| BridgeError::StorageError("poisoned".into()))?
                .insert(key.to_string(), value.to_string());
            Ok(())
        }

        async fn get_item(&self, key: &str) -> BridgeResult<Option<String>> {
            Ok(self
                .items
                .lock()
                .map_err(|_| BridgeError::StorageError("poisoned".into()))?
                .get(key)
                .cloned())
        }

        async fn remove_item(&self, key: &str) -> BridgeResult<()> {
            self.items
                .lock()
                .map_err(|_| BridgeError::StorageError("poisoned".into()))?
                .remove(key);
            Ok(())
        }

        async fn list_keys(&self) -> BridgeResult<Vec<String>> {
            Ok(self
                .items
                .lock()
                .map_err(|_| BridgeError::StorageError("poisoned".into()))?
                .keys()
                .cloned()
                .collect())
        }

        async fn clear(&self) -> BridgeResult<()> {
            self.items
                .lock()
                .map_err(|_| BridgeError::StorageError("poisoned".into()))?
                .clear();
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_loader_fetches_and_applies_overlay() {
        let body = r#"{"REACT_APP_GAPI_CLIENT_ID": "fetched-client", "REACT_APP_GAPI_KEY": "fetched-key"}"#;
        let http = Arc::new(MockHttpClient::new(200, body));
        let store = Arc::new(MockSessionStore::default());

        let loader = Arc::new(ConfigLoader::new(
            http.clone(),
            store.clone(),
            "https://wiki.example.com",
        ));

        let mut config = WikiConfig::builder().use_config_file(true).build().unwrap();
        loader.load(&mut config).await.unwrap();

        assert_eq!(config.client_id, "fetched-client");
        assert_eq!(config.api_key, "fetched-key");

        // The raw document is cached for the next startup
        let cached = store.get_item(CONFIG_STORAGE_KEY).await.unwrap();
        assert_eq!(cached.as_deref(), Some(body));
    }

    #[tokio::test]
    async fn test_loader_uses_cache_without_network() {
        let http = Arc::new(MockHttpClient::new(500, ""));
        let store = Arc::new(MockSessionStore::default());
        store
            .set_item(
                CONFIG_STORAGE_KEY,
                r#"{"REACT_APP_GAPI_CLIENT_ID": "cached-client"}"#,
            )
            .await
            .unwrap();

        let loader = Arc::new(ConfigLoader::new(
            http.clone(),
            store,
            "https://wiki.example.com",
        ));

        let mut config = WikiConfig::builder().use_config_file(true).build().unwrap();
        loader.load(&mut config).await.unwrap();

        assert_eq!(config.client_id, "cached-client");
        // No synchronous fetch happened
        assert_eq!(*http.calls.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_loader_fetch_failure_fatal_when_overlay_required() {
        let http = Arc::new(MockHttpClient::new(404, "not found"));
        let store = Arc::new(MockSessionStore::default());

        let loader = Arc::new(ConfigLoader::new(http, store, "https://wiki.example.com"));

        let mut config = WikiConfig::builder().use_config_file(true).build().unwrap();
        let result = loader.load(&mut config).await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_loader_fetch_failure_ignored_when_overlay_optional() {
        let http = Arc::new(MockHttpClient::new(404, "not found"));
        let store = Arc::new(MockSessionStore::default());

        let loader = Arc::new(ConfigLoader::new(http, store, "https://wiki.example.com"));

        let mut config = WikiConfig::builder()
            .client_id("static-client")
            .api_key("static-key")
            .build()
            .unwrap();
        loader.load(&mut config).await.unwrap();

        assert_eq!(config.client_id, "static-client");
    }
}
