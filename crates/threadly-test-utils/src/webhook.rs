// SPDX-FileCopyrightText: 2026 Threadly Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Signing helper for simulated webhook deliveries.

use hmac::{Hmac, Mac};
use sha2::Sha256;

/// The `X-Hub-Signature-256` value the provider would attach to `payload`.
pub fn sign_payload(app_secret: &str, payload: &[u8]) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(app_secret.as_bytes())
        .expect("HMAC accepts any key length");
    mac.update(payload);
    format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_is_prefixed_lowercase_hex() {
        let sig = sign_payload("secret", b"{}");
        let digest = sig.strip_prefix("sha256=").unwrap();
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_ne!(sig, sign_payload("other", b"{}"));
    }
}
