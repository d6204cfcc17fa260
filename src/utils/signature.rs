use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

pub fn hmac_sha256_hex(secret: &str, message: &str) -> Option<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(message.as_bytes());
    Some(hex::encode(mac.finalize().into_bytes()))
}

/// Checks a Zoom webhook signature header (`v0=<hex>`) against `v0:{timestamp}:{body}`.
pub fn verify_zoom_signature(secret: &str, timestamp: &str, body: &str, signature: &str) -> bool {
    let message = format!("v0:{}:{}", timestamp, body);
    let Some(expected) = hmac_sha256_hex(secret, &message) else {
        return false;
    };
    let expected = format!("v0={}", expected);
    ConstantTimeEq::ct_eq(expected.as_bytes(), signature.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_own_signature_only() {
        let body = r#"{"event":"recording.completed"}"#;
        let sig = format!("v0={}", hmac_sha256_hex("s3cret", &format!("v0:1700000000:{}", body)).unwrap());
        assert!(verify_zoom_signature("s3cret", "1700000000", body, &sig));
        assert!(!verify_zoom_signature("s3cret", "1700000001", body, &sig));
        assert!(!verify_zoom_signature("other", "1700000000", body, &sig));
    }
}
