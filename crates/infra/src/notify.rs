//! Invitation notification adapters

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use slotwise_core::Notifier;
use slotwise_domain::Result;
use tracing::info;

const EMAIL_HASH_SALT: &[u8] = b"slotwise-notify-v1";

/// Stable pseudonym for an email address, safe to log.
///
/// Salted SHA-256, truncated to the first 8 bytes. Case and surrounding
/// whitespace are normalized away so the same address always hashes alike.
#[must_use]
pub fn redact_email(email: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(EMAIL_HASH_SALT);
    hasher.update(email.trim().to_ascii_lowercase().as_bytes());
    let digest = hasher.finalize();
    format!("email_hash={}", hex::encode(&digest[..8]))
}

/// Notifier that writes invitations to the log instead of delivering mail.
///
/// Recipient and sender addresses are redacted; the join link is logged
/// verbatim, it is the deliverable an operator hands to the invitee.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send_invitation(
        &self,
        to_email: &str,
        group_name: &str,
        from_email: &str,
        join_link: &str,
    ) -> Result<()> {
        info!(
            recipient = %redact_email(to_email),
            sender = %redact_email(from_email),
            group_name,
            join_link,
            "invitation issued"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redaction_is_deterministic_and_normalized() {
        let a = redact_email("Ada@Example.com");
        let b = redact_email("  ada@example.com ");
        assert_eq!(a, b);
    }

    #[test]
    fn redaction_hides_the_address() {
        let redacted = redact_email("ada.lovelace@example.com");
        assert!(!redacted.contains("ada"));
        assert!(!redacted.contains("example.com"));
    }

    #[test]
    fn redaction_is_prefixed_hex() {
        let redacted = redact_email("ada@example.com");
        let hash = redacted.strip_prefix("email_hash=").unwrap();
        assert_eq!(hash.len(), 16);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[tokio::test]
    async fn log_notifier_never_fails() {
        let notifier = LogNotifier;
        let sent = notifier
            .send_invitation("ada@example.com", "standup", "creator@example.com", "/join/x?token=y")
            .await;
        assert!(sent.is_ok());
    }
}
