//! Session state types.

use bridge_traits::TokenGrant;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Raw signed identity credential (JWT) issued by the identity provider.
///
/// Opaque to the core except for its payload, which is decoded into a
/// [`UserProfile`]. Never logged.
#[derive(Clone, PartialEq, Eq)]
pub struct IdentityCredential(String);

impl IdentityCredential {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for IdentityCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("IdentityCredential")
            .field(&"[REDACTED]")
            .finish()
    }
}

/// Profile claims decoded from the identity credential payload.
///
/// No signature verification is performed; trust is delegated to the
/// identity provider's sign-in flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Email address
    #[serde(default)]
    pub email: String,
    /// Profile picture URL
    #[serde(default)]
    pub picture: String,
}

/// In-memory session state.
///
/// The access token and profile are only meaningful while an identity
/// credential is held; all three are cleared together on any failure.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    /// Identity credential from the last successful prompt
    pub identity: Option<IdentityCredential>,
    /// Current access token grant
    pub access_token: Option<TokenGrant>,
    /// Profile decoded from the identity credential
    pub profile: Option<UserProfile>,
}

impl SessionState {
    /// Signed in means an access token is present and non-empty.
    pub fn is_signed_in(&self) -> bool {
        self.access_token
            .as_ref()
            .map(|grant| !grant.is_empty())
            .unwrap_or(false)
    }

    /// Clears all session state.
    pub fn clear(&mut self) {
        self.identity = None;
        self.access_token = None;
        self.profile = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_debug_redacted() {
        let credential = IdentityCredential::new("header.payload.signature");
        let debug = format!("{:?}", credential);
        assert!(!debug.contains("payload"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_signed_in_requires_non_empty_token() {
        let mut state = SessionState::default();
        assert!(!state.is_signed_in());

        state.access_token = Some(TokenGrant {
            access_token: String::new(),
            expires_in: 0,
            scope: None,
            token_type: None,
        });
        assert!(!state.is_signed_in());

        state.access_token = Some(TokenGrant {
            access_token: "tok".to_string(),
            expires_in: 3599,
            scope: None,
            token_type: None,
        });
        assert!(state.is_signed_in());
    }

    #[test]
    fn test_clear_drops_everything() {
        let mut state = SessionState {
            identity: Some(IdentityCredential::new("jwt")),
            access_token: Some(TokenGrant {
                access_token: "tok".to_string(),
                expires_in: 3599,
                scope: None,
                token_type: None,
            }),
            profile: Some(UserProfile {
                name: "Ada".to_string(),
                email: "ada@example.com".to_string(),
                picture: String::new(),
            }),
        };

        state.clear();

        assert!(state.identity.is_none());
        assert!(state.access_token.is_none());
        assert!(state.profile.is_none());
        assert!(!state.is_signed_in());
    }

    #[test]
    fn test_profile_tolerates_missing_claims() {
        let profile: UserProfile = serde_json::from_str(r#"{"email":"a@b.com"}"#).unwrap();
        assert_eq!(profile.email, "a@b.com");
        assert!(profile.name.is_empty());
        assert!(profile.picture.is_empty());
    }
}
