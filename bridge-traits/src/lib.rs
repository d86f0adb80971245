//! # Host Bridge Traits
//!
//! Platform abstraction traits that must be implemented by each host.
//!
//! ## Overview
//!
//! This crate defines the contract between the core library and host-specific
//! implementations. Each trait represents a capability the core requires but
//! that must be provided differently per host (desktop shell, browser shell,
//! test harness).
//!
//! ## Traits
//!
//! ### Networking
//! - [`HttpClient`](http::HttpClient) - Async HTTP operations with retry and TLS
//!
//! ### Identity
//! - [`IdentityProvider`](identity::IdentityProvider) - Sign-in prompts yielding signed credentials
//! - [`TokenClient`](identity::TokenClient) - Minting short-lived OAuth access tokens
//!
//! ### Storage
//! - [`SessionStore`](storage::SessionStore) - Session-scoped key-value storage
//!
//! ### Utilities
//! - [`Clock`](time::Clock) - Time source for deterministic testing
//!
//! ## Fail-Fast Strategy
//!
//! The core should fail fast with descriptive errors when a required
//! capability is missing:
//!
//! ```ignore
//! use core_runtime::error::CoreError;
//!
//! pub fn new(config: CoreConfig) -> Result<Self> {
//!     let http_client = config.http_client
//!         .ok_or_else(|| CoreError::CapabilityMissing {
//!             capability: "HttpClient".to_string(),
//!             message: "No HTTP client implementation provided.".to_string(),
//!         })?;
//!     // ...
//! }
//! ```
//!
//! ## Error Handling
//!
//! All bridge traits use the [`BridgeError`](error::BridgeError) type for
//! consistent error handling. Host implementations should:
//!
//! - Convert host-specific errors to `BridgeError`
//! - Provide actionable error messages
//! - Never include token material in error text
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` bounds to support safe concurrent
//! usage across async tasks. Implementations must ensure thread safety.

pub mod error;
pub mod http;
pub mod identity;
pub mod storage;
pub mod time;

pub use error::BridgeError;

// Re-export commonly used types
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy};
pub use identity::{
    ConsentPrompt, IdentityProvider, PromptOutcome, TokenClient, TokenGrant, TokenRequest,
};
pub use storage::SessionStore;
pub use time::{Clock, SystemClock};
