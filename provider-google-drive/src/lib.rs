//! # Google Drive Provider
//!
//! Read-only Google Drive v3 client for the wiki. The [`DriveConnector`]
//! receives its bearer token from the session manager via the
//! [`core_session::TokenSink`] seam and exposes folder listings and file
//! metadata lookups with the wiki's field projection.

pub mod connector;
pub mod error;
pub mod types;

pub use connector::DriveConnector;
pub use error::{DriveError, Result};
pub use types::{
    Capabilities, DriveFile, FileListResponse, LastModifyingUser, ShortcutDetails,
    FOLDER_MIME_TYPE, SHORTCUT_MIME_TYPE,
};
