//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop platforms
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! This crate provides production-ready implementations of the bridge traits
//! using desktop-appropriate libraries:
//! - `HttpClient` using `reqwest`
//! - `SessionStore` as a process-lifetime in-memory store
//!
//! Identity prompts (`IdentityProvider`, `TokenClient`) have no desktop
//! default; the embedding shell wires its own adapter.
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{MemorySessionStore, ReqwestHttpClient};
//! use bridge_traits::{HttpClient, SessionStore};
//!
//! #[tokio::main]
//! async fn main() {
//!     let http_client = ReqwestHttpClient::new();
//!     let session_store = MemorySessionStore::new();
//!
//!     // Use in core configuration
//! }
//! ```

mod http;
mod session_store;

pub use http::ReqwestHttpClient;
pub use session_store::MemorySessionStore;
