//! Session Manager
//!
//! Owns the full sign-in lifecycle: prompting for an identity credential,
//! minting an access token (with one forced-consent retry when the first
//! grant comes back empty), applying the token to the API client, and
//! scheduling a refresh ahead of expiry.
//!
//! All session operations are serialized through a single lock; a sign-in
//! arriving while a refresh is running waits for it instead of racing it.
//! Any setup failure tears the whole session down: in-memory state, the
//! applied token, and the cached entries are all cleared before the error
//! is returned.

use crate::claims;
use crate::error::{Result, SessionError};
use crate::scheduler::{self, RefreshScheduler};
use crate::token_cache::TokenCache;
use crate::types::{IdentityCredential, SessionState, UserProfile};
use bridge_traits::{
    BridgeError, Clock, ConsentPrompt, IdentityProvider, PromptOutcome, SessionStore, TokenClient,
    TokenGrant, TokenRequest,
};
use core_runtime::config::WikiConfig;
use core_runtime::events::{CoreEvent, EventBus, SessionEvent};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Weak};
use tokio::sync::{Mutex, RwLock};
use tokio::time::timeout;
use tracing::{debug, info, instrument, warn};

/// Receives the current access token on behalf of the API client.
///
/// Implemented by whatever holds the bearer credential for outgoing API
/// calls. `apply_token` and `clear_token` must be cheap and non-blocking.
pub trait TokenSink: Send + Sync {
    /// Applies a freshly minted access token.
    fn apply_token(&self, access_token: &str);

    /// Drops the applied token; subsequent API calls are unauthenticated.
    fn clear_token(&self);
}

/// Orchestrates identity, access token, and refresh lifecycle.
///
/// Constructed behind an [`Arc`] so the scheduled refresh can hold a weak
/// handle back to the manager without keeping it alive.
pub struct SessionManager {
    config: WikiConfig,
    identity: Arc<dyn IdentityProvider>,
    token_client: Arc<dyn TokenClient>,
    sink: Arc<dyn TokenSink>,
    clock: Arc<dyn Clock>,
    cache: TokenCache,
    event_bus: EventBus,
    state: RwLock<SessionState>,
    scheduler: RefreshScheduler,
    // Serializes setup, sign-in, sign-out, and the scheduled refresh
    op_lock: Mutex<()>,
    // Handed to the scheduled refresh so it never keeps the manager alive
    weak_self: Weak<SessionManager>,
}

impl SessionManager {
    /// Creates a manager over the given bridges.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Configuration`] if the config is invalid.
    pub fn new(
        config: WikiConfig,
        identity: Arc<dyn IdentityProvider>,
        token_client: Arc<dyn TokenClient>,
        store: Arc<dyn SessionStore>,
        clock: Arc<dyn Clock>,
        sink: Arc<dyn TokenSink>,
        event_bus: EventBus,
    ) -> Result<Arc<Self>> {
        config
            .validate()
            .map_err(|e| SessionError::Configuration(e.to_string()))?;

        Ok(Arc::new_cyclic(|weak| Self {
            config,
            identity,
            token_client,
            sink,
            clock: clock.clone(),
            cache: TokenCache::new(store, clock),
            event_bus,
            state: RwLock::new(SessionState::default()),
            scheduler: RefreshScheduler::new(),
            op_lock: Mutex::new(()),
            weak_self: weak.clone(),
        }))
    }

    /// Runs the full session setup: identity prompt, access token, apply,
    /// schedule refresh.
    ///
    /// On any failure the session is torn down completely before the error
    /// is returned, so the manager is never left half signed in.
    #[instrument(skip(self))]
    pub async fn setup(&self) -> Result<()> {
        let _guard = self.op_lock.lock().await;
        self.scheduler.cancel().await;
        self.emit(SessionEvent::SetupStarted);

        match self.setup_inner().await {
            Ok(()) => Ok(()),
            Err(e) => {
                self.teardown().await;
                self.emit(SessionEvent::SessionError {
                    message: e.to_string(),
                    recoverable: e.is_recoverable(),
                });
                Err(e)
            }
        }
    }

    /// Starts an interactive sign-in.
    pub async fn sign_in(&self) -> Result<()> {
        self.setup().await
    }

    /// Signs the user out and immediately re-runs setup so the next prompt
    /// asks for an account instead of silently reusing the last one.
    #[instrument(skip(self))]
    pub async fn sign_out(&self) -> Result<()> {
        {
            let _guard = self.op_lock.lock().await;
            self.scheduler.cancel().await;

            self.identity
                .disable_auto_select()
                .await
                .map_err(|e| SessionError::Provider(e.to_string()))?;

            if let Err(e) = self.cache.clear_identity().await {
                warn!(error = %e, "Failed to remove persisted identity credential");
            }

            let mut state = self.state.write().await;
            state.identity = None;
            state.profile = None;
            drop(state);

            info!("User signed out");
            self.emit(SessionEvent::SignedOut);
        }

        self.setup().await
    }

    /// Whether a non-empty access token is currently held.
    pub async fn is_signed_in(&self) -> bool {
        self.state.read().await.is_signed_in()
    }

    /// Profile of the signed-in user, if any.
    pub async fn current_profile(&self) -> Option<UserProfile> {
        self.state.read().await.profile.clone()
    }

    /// The current access token, if a non-empty one is held.
    pub async fn access_token(&self) -> Option<String> {
        let state = self.state.read().await;
        state
            .access_token
            .as_ref()
            .filter(|grant| !grant.is_empty())
            .map(|grant| grant.access_token.clone())
    }

    async fn setup_inner(&self) -> Result<()> {
        self.acquire_identity().await?;

        let mut grant = self.acquire_access_token(false).await?;
        if grant.is_empty() {
            debug!("Empty grant, retrying with forced consent");
            self.emit(SessionEvent::SetupProgress {
                message: "Additional consent is required".to_string(),
            });
            grant = self.acquire_access_token(true).await?;
        }
        if grant.is_empty() {
            return Err(SessionError::ConsentDenied);
        }

        let expires_at_ms =
            self.clock.unix_timestamp_millis() + grant.expires_in * 1000;
        self.sink.apply_token(&grant.access_token);

        let email = {
            let mut state = self.state.write().await;
            state.access_token = Some(grant.clone());
            state
                .profile
                .as_ref()
                .map(|p| p.email.clone())
                .unwrap_or_default()
        };

        info!(expires_in = grant.expires_in, "Session established");
        self.emit(SessionEvent::SignedIn { email });
        self.emit(SessionEvent::TokenRefreshed { expires_at_ms });

        self.schedule_refresh(grant.expires_in).await;
        Ok(())
    }

    /// Shows the identity prompt and records the credential and profile.
    async fn acquire_identity(&self) -> Result<()> {
        self.emit(SessionEvent::SetupProgress {
            message: "Waiting for sign-in".to_string(),
        });

        let outcome = match timeout(
            self.config.prompt_timeout,
            self.identity.prompt_credential(),
        )
        .await
        {
            Ok(result) => result.map_err(|e| match e {
                // An unavailable identity SDK is a deployment problem, not
                // something a retry can fix
                BridgeError::NotAvailable(msg) => SessionError::Configuration(msg),
                other => SessionError::Provider(other.to_string()),
            })?,
            Err(_) => {
                if let Err(e) = self.identity.cancel_prompt().await {
                    warn!(error = %e, "Failed to cancel timed-out prompt");
                }
                return Err(SessionError::PromptTimeout {
                    seconds: self.config.prompt_timeout.as_secs(),
                });
            }
        };

        match outcome {
            PromptOutcome::Credential(raw) => {
                let profile = claims::decode_profile(&raw)?;
                let credential = IdentityCredential::new(raw);

                // Persistence is best effort; the in-memory credential is
                // what the session runs on
                if let Err(e) = self.cache.store_identity(&credential).await {
                    warn!(error = %e, "Failed to persist identity credential");
                }

                debug!(email = %profile.email, "Identity credential acquired");
                let mut state = self.state.write().await;
                state.identity = Some(credential);
                state.profile = Some(profile);
                Ok(())
            }
            PromptOutcome::Dismissed => Err(SessionError::SignInCancelled(
                "prompt was dismissed".to_string(),
            )),
            PromptOutcome::Skipped => Err(SessionError::SignInCancelled(
                "prompt was skipped".to_string(),
            )),
            PromptOutcome::NotDisplayed { reason } => Err(SessionError::SignInCancelled(format!(
                "prompt was not displayed: {}",
                reason
            ))),
        }
    }

    /// Returns a usable grant, preferring the session cache.
    ///
    /// An empty grant means the user declined consent; the caller decides
    /// whether to retry with `force_consent`.
    async fn acquire_access_token(&self, force_consent: bool) -> Result<TokenGrant> {
        if let Some(cached) = self.cache.load_valid().await? {
            return Ok(cached);
        }

        let login_hint = {
            let state = self.state.read().await;
            state
                .profile
                .as_ref()
                .filter(|p| !p.email.is_empty())
                .map(|p| p.email.clone())
        };

        let mut request = TokenRequest::new();
        if force_consent || login_hint.is_none() {
            request = request.prompt(ConsentPrompt::Consent);
        }
        if let Some(hint) = login_hint {
            request = request.login_hint(hint);
        }

        let grant = self
            .token_client
            .request_access_token(request)
            .await
            .map_err(|e| SessionError::Provider(e.to_string()))?;

        if !grant.is_empty() {
            self.cache.store(&grant).await?;
        }
        Ok(grant)
    }

    /// Schedules the next refresh, replacing any pending one.
    async fn schedule_refresh(&self, expires_in: i64) {
        let delay = scheduler::refresh_delay(expires_in);
        debug!(delay_secs = delay.as_secs(), "Scheduling token refresh");

        let weak = self.weak_self.clone();
        self.scheduler
            .schedule(delay, move || async move {
                let Some(manager) = weak.upgrade() else {
                    return;
                };
                manager.emit(SessionEvent::TokenRefreshing);
                // Drop the cached grant so the refresh mints a fresh one
                // instead of reusing the still-valid cache and rescheduling
                // itself immediately
                if let Err(e) = manager.cache.clear_access_token().await {
                    warn!(error = %e, "Failed to clear cached token before refresh");
                }
                if let Err(e) = manager.setup_boxed().await {
                    let e = SessionError::RefreshFailed(e.to_string());
                    warn!(error = %e, "Scheduled token refresh failed");
                }
            })
            .await;
    }

    /// Type-erased [`setup`](Self::setup) for the scheduled refresh.
    ///
    /// The refresh task's future would otherwise contain `setup`'s opaque
    /// future, whose `Send`-ness depends on the task being scheduled —
    /// boxing cuts that cycle.
    fn setup_boxed(self: Arc<Self>) -> Pin<Box<dyn Future<Output = Result<()>> + Send>> {
        Box::pin(async move { self.setup().await })
    }

    /// Clears in-memory state, the applied token, and the cached entries.
    async fn teardown(&self) {
        self.state.write().await.clear();
        self.sink.clear_token();

        if let Err(e) = self.cache.clear_access_token().await {
            warn!(error = %e, "Failed to clear cached access token");
        }
        if let Err(e) = self.cache.clear_identity().await {
            warn!(error = %e, "Failed to clear cached identity credential");
        }
    }

    fn emit(&self, event: SessionEvent) {
        // Delivery is best effort; no subscribers is fine
        let _ = self.event_bus.emit(CoreEvent::Session(event));
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
