//! # Core Session
//!
//! Sign-in session lifecycle for the wiki: identity credential acquisition,
//! access token minting with a one-shot forced-consent retry, session-scoped
//! token caching, and a single cancellable refresh scheduled ahead of expiry.
//!
//! The entry point is [`SessionManager`]; host platforms supply the identity
//! and token bridges from `bridge-traits` and an implementation of
//! [`TokenSink`] that feeds the API client.

pub mod claims;
pub mod error;
pub mod manager;
pub mod scheduler;
pub mod token_cache;
pub mod types;

pub use error::{Result, SessionError};
pub use manager::{SessionManager, TokenSink};
pub use scheduler::{refresh_delay, RefreshScheduler, REFRESH_LEAD};
pub use token_cache::{
    TokenCache, ACCESS_TOKEN_EXPIRY_KEY, ACCESS_TOKEN_KEY, EXPIRY_MARGIN, IDENTITY_TOKEN_KEY,
};
pub use types::{IdentityCredential, SessionState, UserProfile};
