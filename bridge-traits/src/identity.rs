//! Identity Provider Abstractions
//!
//! Traits for the host-side identity SDK: credential prompts that yield a
//! signed identity assertion, and a token client that mints short-lived
//! OAuth access tokens.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Outcome of a one-shot credential prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptOutcome {
    /// The user selected an account; carries the raw signed credential (JWT)
    Credential(String),
    /// The prompt was shown and explicitly dismissed by the user
    Dismissed,
    /// The prompt was shown and skipped (e.g. closed without choosing)
    Skipped,
    /// The prompt could not be displayed at all
    NotDisplayed { reason: String },
}

/// Identity prompt trait
///
/// Abstracts the host identity SDK's sign-in surface. A single call shows
/// (or attempts to show) one prompt and resolves with its outcome; the
/// provider may auto-select a previously used account without user
/// interaction.
///
/// Implementations must resolve every call exactly once, including when the
/// prompt is cancelled via [`cancel_prompt`](IdentityProvider::cancel_prompt).
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Show the credential prompt and wait for its outcome
    ///
    /// # Errors
    ///
    /// Returns error if the underlying SDK is unavailable or misconfigured.
    /// A user declining is a [`PromptOutcome`], not an error.
    async fn prompt_credential(&self) -> Result<PromptOutcome>;

    /// Disable automatic account selection for subsequent prompts
    ///
    /// Called on sign-out so the next prompt asks the user again instead of
    /// silently reusing the last account.
    async fn disable_auto_select(&self) -> Result<()>;

    /// Cancel an in-flight prompt, if any
    async fn cancel_prompt(&self) -> Result<()> {
        Ok(())
    }
}

/// Consent behaviour for an access token request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConsentPrompt {
    /// Reuse any existing grant without showing a consent screen
    #[default]
    None,
    /// Force the consent screen even if a grant exists
    Consent,
}

/// Parameters for minting an access token
#[derive(Debug, Clone, Default)]
pub struct TokenRequest {
    /// Account hint (usually the signed-in user's email)
    pub login_hint: Option<String>,
    /// Whether to force the consent screen
    pub prompt: ConsentPrompt,
    /// OAuth scopes to request; empty means the client's configured scopes
    pub scopes: Vec<String>,
}

impl TokenRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn login_hint(mut self, hint: impl Into<String>) -> Self {
        self.login_hint = Some(hint.into());
        self
    }

    pub fn prompt(mut self, prompt: ConsentPrompt) -> Self {
        self.prompt = prompt;
        self
    }
}

/// A minted access token grant
///
/// The provider may resolve with an empty token when the user declines the
/// requested scopes; callers must check [`is_empty`](TokenGrant::is_empty).
#[derive(Clone, Serialize, Deserialize)]
pub struct TokenGrant {
    /// Bearer access token; empty string when consent was not granted
    pub access_token: String,
    /// Token lifetime in seconds
    pub expires_in: i64,
    /// Space-separated granted scopes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    /// Token type, normally "Bearer"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
}

impl TokenGrant {
    /// Whether the grant carries no usable token
    pub fn is_empty(&self) -> bool {
        self.access_token.is_empty()
    }
}

// Redact the token value in debug output
impl std::fmt::Debug for TokenGrant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenGrant")
            .field("access_token", &"[REDACTED]")
            .field("expires_in", &self.expires_in)
            .field("scope", &self.scope)
            .field("token_type", &self.token_type)
            .finish()
    }
}

/// Access token client trait
///
/// Abstracts the host OAuth token client. Each call may pop a consent
/// screen depending on [`TokenRequest::prompt`] and existing grants.
#[async_trait]
pub trait TokenClient: Send + Sync {
    /// Request an access token
    ///
    /// # Errors
    ///
    /// Returns error on SDK or transport failure. A declined consent is
    /// reported as an empty [`TokenGrant`], not an error.
    async fn request_access_token(&self, request: TokenRequest) -> Result<TokenGrant>;
}
