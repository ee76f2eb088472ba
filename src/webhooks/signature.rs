//! Webhook delivery signature verification using HMAC-SHA256.
//!
//! Meta signs every webhook delivery with the app secret and sends the result
//! in the `X-Hub-Signature-256` header as `sha256=<hex>`. Verifying the
//! signature is the first step of delivery handling; a delivery that fails
//! verification is rejected before any parsing.
//!
//! Verification is optional at the service level: it runs only when an app
//! secret is configured (see [`crate::config::Config`]).

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the delivery signature.
pub const SIGNATURE_HEADER: &str = "x-hub-signature-256";

/// Computes the HMAC-SHA256 signature of a payload under the given secret.
pub fn compute_signature(secret: &[u8], payload: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC accepts any key length");
    mac.update(payload);
    mac.finalize().into_bytes().to_vec()
}

/// Renders the header value Meta would send for a payload: `sha256=<hex>`.
///
/// Used to sign test deliveries; the inverse of what [`verify_signature`]
/// checks.
pub fn signature_header_value(secret: &[u8], payload: &[u8]) -> String {
    format!("sha256={}", hex::encode(compute_signature(secret, payload)))
}

/// Decodes a `sha256=<hex>` header value into the claimed signature bytes.
///
/// Returns `None` for malformed values (missing or wrong algorithm prefix,
/// invalid hex). Never panics.
fn decode_signature_header(header: &str) -> Option<Vec<u8>> {
    let hex_sig = header.strip_prefix("sha256=")?;
    hex::decode(hex_sig).ok()
}

/// Verifies a delivery signature against the raw payload and the app secret.
///
/// Uses constant-time comparison (via the HMAC library) so the check does not
/// leak how much of a forged signature matched. Malformed header values fail
/// verification rather than erroring.
///
/// # Examples
///
/// ```
/// use replygram::webhooks::{signature_header_value, verify_signature};
///
/// let secret = b"app-secret";
/// let payload = br#"{"object":"instagram","entry":[]}"#;
///
/// let header = signature_header_value(secret, payload);
/// assert!(verify_signature(secret, payload, &header));
/// assert!(!verify_signature(b"other-secret", payload, &header));
/// ```
pub fn verify_signature(secret: &[u8], payload: &[u8], header: &str) -> bool {
    let claimed = match decode_signature_header(header) {
        Some(sig) => sig,
        None => return false,
    };

    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC accepts any key length");
    mac.update(payload);
    mac.verify_slice(&claimed).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn known_vector_verifies() {
        // Computed independently with python's hmac module.
        let payload = br#"{"object":"instagram","entry":[]}"#;
        let secret = b"im-an-app-secret";
        let header = "sha256=9e4960d55bf30eb5015cad518f2358404ee03cafe20bbcac1879d240b45d795a";

        assert_eq!(signature_header_value(secret, payload), header);
        assert!(verify_signature(secret, payload, header));
    }

    #[test]
    fn header_value_shape() {
        let header = signature_header_value(b"s", b"p");
        assert!(header.starts_with("sha256="));
        // SHA256 digests are 32 bytes, so 64 hex characters.
        assert_eq!(header.len(), "sha256=".len() + 64);
    }

    #[test]
    fn wrong_secret_fails() {
        let payload = b"delivery body";
        let header = signature_header_value(b"right", payload);
        assert!(verify_signature(b"right", payload, &header));
        assert!(!verify_signature(b"wrong", payload, &header));
    }

    #[test]
    fn tampered_payload_fails() {
        let secret = b"app-secret";
        let header = signature_header_value(secret, b"original");
        assert!(!verify_signature(secret, b"tampered", &header));
    }

    #[test]
    fn malformed_headers_fail_without_panicking() {
        let payload = b"body";
        let secret = b"secret";

        assert!(!verify_signature(secret, payload, ""));
        assert!(!verify_signature(secret, payload, "sha256="));
        assert!(!verify_signature(secret, payload, "sha256=zzzz"));
        assert!(!verify_signature(secret, payload, "sha1=abcd12"));
        assert!(!verify_signature(secret, payload, "abcd12"));
        assert!(!verify_signature(secret, payload, "sha256=abc"));
    }

    #[test]
    fn uppercase_hex_is_accepted() {
        let secret = b"secret";
        let payload = b"body";
        let header = signature_header_value(secret, payload).to_uppercase();
        // The prefix must stay lowercase; only the hex digits are case-insensitive.
        let header = header.replacen("SHA256=", "sha256=", 1);
        assert!(verify_signature(secret, payload, &header));
    }

    #[test]
    fn empty_payload_and_secret_roundtrip() {
        let header = signature_header_value(b"", b"");
        assert!(verify_signature(b"", b"", &header));
    }

    proptest! {
        #[test]
        fn sign_then_verify_succeeds(payload: Vec<u8>, secret: Vec<u8>) {
            let header = signature_header_value(&secret, &payload);
            prop_assert!(verify_signature(&secret, &payload, &header));
        }

        #[test]
        fn verify_with_different_secret_fails(
            payload: Vec<u8>,
            secret_a: Vec<u8>,
            secret_b: Vec<u8>,
        ) {
            prop_assume!(secret_a != secret_b);
            let header = signature_header_value(&secret_a, &payload);
            prop_assert!(!verify_signature(&secret_b, &payload, &header));
        }

        #[test]
        fn verify_with_modified_payload_fails(
            original: Vec<u8>,
            modified: Vec<u8>,
            secret: Vec<u8>,
        ) {
            prop_assume!(original != modified);
            let header = signature_header_value(&secret, &original);
            prop_assert!(!verify_signature(&secret, &modified, &header));
        }

        #[test]
        fn arbitrary_header_never_panics(header: String, payload: Vec<u8>, secret: Vec<u8>) {
            let _ = verify_signature(&secret, &payload, &header);
        }
    }
}
