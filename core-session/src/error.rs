use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Sign-in prompt was not completed: {0}")]
    SignInCancelled(String),

    #[error("Sign-in prompt timed out after {seconds} seconds")]
    PromptTimeout { seconds: u64 },

    #[error("Consent was not granted for the requested scopes")]
    ConsentDenied,

    #[error("Invalid identity credential: {0}")]
    InvalidCredential(String),

    #[error("Token refresh failed: {0}")]
    RefreshFailed(String),

    #[error("Identity provider error: {0}")]
    Provider(String),

    #[error("Session storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SessionError {
    /// Whether a manual sign-in retry is likely to succeed.
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            SessionError::Configuration(_) | SessionError::Serialization(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, SessionError>;
