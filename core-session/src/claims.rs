//! Identity credential payload decoding.
//!
//! The credential is a JWT; only the payload segment is decoded, without
//! signature verification. The identity provider's front-end flow is
//! trusted to have validated the token.

use crate::error::{Result, SessionError};
use crate::types::UserProfile;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

/// Decodes the profile claims from a raw identity credential.
///
/// # Errors
///
/// Returns [`SessionError::InvalidCredential`] if the credential is not a
/// three-segment JWT or its payload is not valid base64url JSON.
pub fn decode_profile(credential: &str) -> Result<UserProfile> {
    let mut segments = credential.split('.');
    let payload = match (segments.next(), segments.next(), segments.next()) {
        (Some(_header), Some(payload), Some(_signature)) => payload,
        _ => {
            return Err(SessionError::InvalidCredential(
                "credential is not a three-segment JWT".to_string(),
            ))
        }
    };

    // Payload may arrive padded or unpadded; normalize before decoding
    let trimmed = payload.trim_end_matches('=');
    let decoded = URL_SAFE_NO_PAD
        .decode(trimmed)
        .map_err(|e| SessionError::InvalidCredential(format!("payload is not base64url: {}", e)))?;

    serde_json::from_slice(&decoded)
        .map_err(|e| SessionError::InvalidCredential(format!("payload is not valid JSON: {}", e)))
}

#[cfg(test)]
pub(crate) fn encode_credential(profile: &UserProfile) -> String {
    let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(profile).unwrap());
    format!("e30.{}.sig", payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_profile() {
        let profile = UserProfile {
            name: "Ada Lovelace".to_string(),
            email: "a@b.com".to_string(),
            picture: "https://example.com/a.png".to_string(),
        };
        let credential = encode_credential(&profile);

        let decoded = decode_profile(&credential).unwrap();
        assert_eq!(decoded, profile);
    }

    #[test]
    fn test_decode_profile_with_extra_claims() {
        let payload = URL_SAFE_NO_PAD.encode(
            r#"{"iss":"accounts.example.com","sub":"123","email":"a@b.com","name":"Ada","picture":"","exp":1700000000}"#,
        );
        let credential = format!("e30.{}.sig", payload);

        let decoded = decode_profile(&credential).unwrap();
        assert_eq!(decoded.email, "a@b.com");
        assert_eq!(decoded.name, "Ada");
    }

    #[test]
    fn test_decode_padded_payload() {
        let payload = URL_SAFE_NO_PAD.encode(r#"{"email":"a@b.com"}"#);
        let credential = format!("e30.{}==.sig", payload);

        let decoded = decode_profile(&credential).unwrap();
        assert_eq!(decoded.email, "a@b.com");
    }

    #[test]
    fn test_rejects_malformed_credential() {
        assert!(matches!(
            decode_profile("not-a-jwt"),
            Err(SessionError::InvalidCredential(_))
        ));
        assert!(matches!(
            decode_profile("a.%%%.c"),
            Err(SessionError::InvalidCredential(_))
        ));
    }
}
