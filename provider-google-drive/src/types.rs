//! Google Drive API response types
//!
//! Data structures for deserializing Google Drive API v3 responses, shaped
//! by the field projection the wiki requests for listings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// MIME type of Drive folders
pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

/// MIME type of Drive shortcuts
pub const SHORTCUT_MIME_TYPE: &str = "application/vnd.google-apps.shortcut";

/// Google Drive API file resource
///
/// See: https://developers.google.com/drive/api/v3/reference/files#resource
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveFile {
    /// File ID
    pub id: String,

    /// File name
    pub name: String,

    /// MIME type
    pub mime_type: String,

    /// Parent folder IDs
    #[serde(default)]
    pub parents: Vec<String>,

    /// Shared drive ID, if the file lives on one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drive_id: Option<String>,

    /// Modification time (RFC 3339)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_time: Option<String>,

    /// Creation time (RFC 3339)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_time: Option<String>,

    /// Who last modified the file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modifying_user: Option<LastModifyingUser>,

    /// Icon URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_link: Option<String>,

    /// Link for opening the file in the Drive UI
    #[serde(skip_serializing_if = "Option::is_none")]
    pub web_view_link: Option<String>,

    /// Shortcut target, present only for shortcut files
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shortcut_details: Option<ShortcutDetails>,

    /// What the current user may do with the file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capabilities: Option<Capabilities>,

    /// Whether the user starred the file
    #[serde(default)]
    pub starred: bool,

    /// Custom properties visible to all apps
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub properties: HashMap<String, String>,

    /// Custom properties private to this app
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub app_properties: HashMap<String, String>,
}

impl DriveFile {
    /// Whether this entry is a folder.
    pub fn is_folder(&self) -> bool {
        self.mime_type == FOLDER_MIME_TYPE
    }

    /// Whether this entry is a shortcut to another file.
    pub fn is_shortcut(&self) -> bool {
        self.mime_type == SHORTCUT_MIME_TYPE
    }

    /// The ID to load content from: the shortcut target if this is a
    /// shortcut, otherwise the file's own ID.
    pub fn resolved_id(&self) -> &str {
        self.shortcut_details
            .as_ref()
            .map(|details| details.target_id.as_str())
            .unwrap_or(&self.id)
    }

    /// Modification time parsed to UTC, if present and well-formed.
    pub fn modified_at(&self) -> Option<DateTime<Utc>> {
        self.modified_time
            .as_deref()
            .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }
}

/// Last modifying user, projected to display fields only
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LastModifyingUser {
    /// Display name
    #[serde(default)]
    pub display_name: String,

    /// Avatar URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_link: Option<String>,
}

/// Shortcut target details
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortcutDetails {
    /// ID of the file the shortcut points at
    pub target_id: String,

    /// MIME type of the target
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_mime_type: Option<String>,
}

/// Capabilities of the current user on a file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Capabilities {
    #[serde(default)]
    pub can_edit: bool,

    #[serde(default)]
    pub can_rename: bool,

    #[serde(default)]
    pub can_trash: bool,

    #[serde(default)]
    pub can_add_children: bool,
}

/// Google Drive API files.list response
///
/// See: https://developers.google.com/drive/api/v3/reference/files/list
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileListResponse {
    /// List of files
    #[serde(default)]
    pub files: Vec<DriveFile>,

    /// Token for the next page
    pub next_page_token: Option<String>,

    /// Whether the search was cut short
    #[serde(default)]
    pub incomplete_search: bool,
}
