//! Provider resolution from credential shape

use slotwise_domain::{CalendarCredential, ProviderKind};
use tracing::debug;

/// Resolves which calendar backend a credential belongs to.
///
/// An explicit hint always wins. Without one the token shape decides:
/// Google OAuth tokens carry a `ya29.` access or `1//` refresh prefix, and
/// Microsoft Graph tokens are JWTs with three dot-separated segments.
/// Unknown shapes fall back to Google.
#[must_use]
pub fn detect_provider(credential: &CalendarCredential) -> ProviderKind {
    if let Some(hint) = credential.provider_hint {
        return hint;
    }

    let token = credential.access_token.as_str();
    if token.starts_with("ya29.") || token.starts_with("1//") {
        return ProviderKind::Google;
    }
    if token.split('.').count() == 3 {
        return ProviderKind::Microsoft;
    }

    debug!("credential matched no known token shape, defaulting to google");
    ProviderKind::Google
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cred(token: &str, hint: Option<ProviderKind>) -> CalendarCredential {
        CalendarCredential { access_token: token.to_string(), provider_hint: hint, email: None }
    }

    #[test]
    fn hint_overrides_token_shape() {
        let credential = cred("ya29.a0AfH6SMB", Some(ProviderKind::Microsoft));
        assert_eq!(detect_provider(&credential), ProviderKind::Microsoft);
    }

    #[test]
    fn google_prefixes_are_detected() {
        assert_eq!(detect_provider(&cred("ya29.a0AfH6SMB", None)), ProviderKind::Google);
        assert_eq!(detect_provider(&cred("1//0gRefreshToken", None)), ProviderKind::Google);
    }

    #[test]
    fn jwt_shape_is_detected_as_microsoft() {
        let credential = cred("eyJhbGciOi.eyJzdWIiOi.c2lnbmF0dXJl", None);
        assert_eq!(detect_provider(&credential), ProviderKind::Microsoft);
    }

    #[test]
    fn unknown_shape_defaults_to_google() {
        assert_eq!(detect_provider(&cred("opaque-token", None)), ProviderKind::Google);
    }
}
