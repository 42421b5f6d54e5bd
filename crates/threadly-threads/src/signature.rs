// SPDX-FileCopyrightText: 2026 Threadly Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Webhook authenticity checks: the subscription handshake and
//! `X-Hub-Signature-256` HMAC verification.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

const SIGNATURE_PREFIX: &str = "sha256=";

/// Verifies webhook handshakes and payload signatures for one app.
#[derive(Debug, Clone)]
pub struct SignatureVerifier {
    app_secret: SecretString,
    verify_token: SecretString,
}

impl SignatureVerifier {
    pub fn new(app_secret: SecretString, verify_token: SecretString) -> Self {
        Self {
            app_secret,
            verify_token,
        }
    }

    /// Returns the challenge to echo when `mode` is `subscribe` and the token matches.
    pub fn verify_challenge(&self, mode: &str, token: &str, challenge: &str) -> Option<String> {
        let expected = self.verify_token.expose_secret();
        if mode == "subscribe" && !expected.is_empty() && token == expected {
            Some(challenge.to_string())
        } else {
            None
        }
    }

    /// Checks `header` (`sha256=<hex>`) against an HMAC-SHA256 of the raw body.
    ///
    /// `payload` must be the bytes exactly as received. The digest comparison
    /// is constant-time.
    pub fn verify_signature(&self, payload: &[u8], header: &str) -> bool {
        let Some(digest_hex) = header.strip_prefix(SIGNATURE_PREFIX) else {
            return false;
        };
        let Ok(expected) = hex::decode(digest_hex) else {
            return false;
        };
        if expected.is_empty() {
            return false;
        }
        let Ok(mut mac) = HmacSha256::new_from_slice(self.app_secret.expose_secret().as_bytes())
        else {
            return false;
        };
        mac.update(payload);
        mac.verify_slice(&expected).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn verifier() -> SignatureVerifier {
        SignatureVerifier::new(
            SecretString::from("app-secret"),
            SecretString::from("hub-token"),
        )
    }

    fn sign_with(secret: &str, body: &[u8]) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(body);
        format!("{SIGNATURE_PREFIX}{}", hex::encode(mac.finalize().into_bytes()))
    }

    fn sign(body: &[u8]) -> String {
        sign_with("app-secret", body)
    }

    #[test]
    fn challenge_requires_subscribe_and_matching_token() {
        let v = verifier();
        assert_eq!(
            v.verify_challenge("subscribe", "hub-token", "12345"),
            Some("12345".to_string())
        );
        assert_eq!(v.verify_challenge("unsubscribe", "hub-token", "12345"), None);
        assert_eq!(v.verify_challenge("subscribe", "wrong", "12345"), None);
    }

    #[test]
    fn accepts_exact_signature() {
        let v = verifier();
        let body = br#"{"object":"threads","entry":[]}"#;
        let header = sign(body);
        assert!(v.verify_signature(body, &header));
    }

    #[test]
    fn rejects_malformed_headers() {
        let v = verifier();
        let body = b"{}";
        let digest = sign(body);
        let bare = digest.trim_start_matches("sha256=");

        assert!(!v.verify_signature(body, ""));
        assert!(!v.verify_signature(body, "sha256"));
        assert!(!v.verify_signature(body, "sha256="));
        assert!(!v.verify_signature(body, bare));
        assert!(!v.verify_signature(body, &format!("sha1={bare}")));
        assert!(!v.verify_signature(body, "sha256=not-hex"));
        assert!(!v.verify_signature(body, &digest[..digest.len() - 2]));
    }

    #[test]
    fn reserialized_body_does_not_verify() {
        let v = verifier();
        let raw = br#"{ "object": "threads" }"#;
        let header = sign(raw);
        let value: serde_json::Value = serde_json::from_slice(raw).unwrap();
        let reserialized = serde_json::to_vec(&value).unwrap();
        assert!(!v.verify_signature(&reserialized, &header));
    }

    #[test]
    fn other_secret_does_not_verify() {
        let body = b"payload";
        let header = sign(body);
        let other = SignatureVerifier::new(
            SecretString::from("different"),
            SecretString::from("hub-token"),
        );
        assert!(!other.verify_signature(body, &header));
    }

    proptest! {
        #[test]
        fn any_body_verifies_only_with_its_own_digest(
            body in proptest::collection::vec(any::<u8>(), 0..256),
            flip in 0usize..32,
        ) {
            let v = verifier();
            let header = sign(&body);
            prop_assert!(v.verify_signature(&body, &header));

            let mut digest = hex::decode(header.trim_start_matches("sha256=")).unwrap();
            digest[flip] ^= 0x80;
            let tampered = format!("sha256={}", hex::encode(digest));
            prop_assert!(!v.verify_signature(&body, &tampered));
        }
    }
}
