//! Error types for the Google Drive provider

use thiserror::Error;

/// Google Drive provider errors
#[derive(Error, Debug)]
pub enum DriveError {
    /// No access token has been applied yet
    #[error("No access token applied; sign in first")]
    NotAuthenticated,

    /// API request returned an error
    #[error("Google Drive API error (status {status_code}): {message}")]
    ApiError { status_code: u16, message: String },

    /// File not found
    #[error("File not found: {file_id}")]
    FileNotFound { file_id: String },

    /// Failed to parse API response
    #[error("Failed to parse API response: {0}")]
    Parse(String),

    /// Transport-level failure
    #[error("Network error: {0}")]
    Network(#[from] bridge_traits::error::BridgeError),
}

impl DriveError {
    /// Whether retrying the same request may succeed.
    pub fn is_recoverable(&self) -> bool {
        match self {
            DriveError::Network(_) => true,
            DriveError::ApiError { status_code, .. } => {
                *status_code == 429 || (500..600).contains(status_code)
            }
            _ => false,
        }
    }
}

/// Result type for Google Drive operations
pub type Result<T> = std::result::Result<T, DriveError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = DriveError::ApiError {
            status_code: 404,
            message: "File not found".to_string(),
        };

        assert_eq!(
            error.to_string(),
            "Google Drive API error (status 404): File not found"
        );
    }

    #[test]
    fn test_recoverability() {
        assert!(DriveError::ApiError {
            status_code: 503,
            message: String::new()
        }
        .is_recoverable());
        assert!(DriveError::ApiError {
            status_code: 429,
            message: String::new()
        }
        .is_recoverable());
        assert!(!DriveError::ApiError {
            status_code: 403,
            message: String::new()
        }
        .is_recoverable());
        assert!(!DriveError::NotAuthenticated.is_recoverable());
    }
}
