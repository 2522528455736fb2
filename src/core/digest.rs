//! HMAC request digest.
//!
//! Structured payloads are canonicalized before signing: object keys sorted
//! ascending at every depth, compact output, `/` escaped as `\/` and non-ASCII
//! as lower-case `\uXXXX`. The remote service computes the same bytes.
//!
//! # Security Properties
//!
//! - The shared secret is held in a `SecretString` and never logged
//! - Digest comparison is constant-time via `subtle`


use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::error::EfattureError;

type HmacSha256 = Hmac<Sha256>;

/// The content a digest is computed over.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Signed byte-for-byte.
    Text(String),
    /// Canonicalized with [`canonical_json`] before signing.
    Structured(Value),
}

impl Payload {
    pub fn canonical(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Structured(v) => canonical_json(v),
        }
    }
}

impl From<&str> for Payload {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Payload {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<Value> for Payload {
    fn from(v: Value) -> Self {
        Self::Structured(v)
    }
}

/// Deterministic compact JSON with recursively sorted keys.
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_value(&mut out, value);
    out
}

fn write_value(out: &mut String, value: &Value) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => out.push_str(&n.to_string()),
        Value::String(s) => write_string(out, s),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_value(out, item);
            }
            out.push(']');
        }
        Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            out.push('{');
            for (i, (k, v)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_string(out, k);
                out.push(':');
                write_value(out, v);
            }
            out.push('}');
        }
    }
}

fn write_string(out: &mut String, s: &str) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '/' => out.push_str("\\/"),
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 || !c.is_ascii() => {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units) {
                    out.push_str(&format!("\\u{unit:04x}"));
                }
            }
            c => out.push(c),
        }
    }
    out.push('"');
}

/// Lower-case hex HMAC-SHA256 of the canonical payload, keyed by
/// `client_id:secret`.
pub fn digest(client_id: &str, secret: &str, payload: &Payload) -> Result<String, EfattureError> {
    let key = format!("{client_id}:{secret}");
    let mut mac = HmacSha256::new_from_slice(key.as_bytes())
        .map_err(|e| EfattureError::InvalidArgument(format!("HMAC key: {e}")))?;
    mac.update(payload.canonical().as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Constant-time comparison of two hex digests (case-insensitive).
pub fn verify(expected: &str, candidate: &str) -> bool {
    let expected = expected.trim().to_ascii_lowercase();
    let candidate = candidate.trim().to_ascii_lowercase();
    expected.as_bytes().ct_eq(candidate.as_bytes()).into()
}

/// Signs and verifies payloads with a fixed client id and secret.
#[derive(Clone)]
pub struct Signer {
    client_id: String,
    secret: SecretString,
}

impl std::fmt::Debug for Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signer")
            .field("client_id", &self.client_id)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

impl Signer {
    pub fn new(client_id: impl Into<String>, secret: SecretString) -> Self {
        Self {
            client_id: client_id.into(),
            secret,
        }
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn sign(&self, payload: &Payload) -> Result<String, EfattureError> {
        digest(&self.client_id, self.secret.expose_secret(), payload)
    }

    /// Recompute the digest of `payload` and compare it with `fingerprint`.
    pub fn verify(&self, payload: &Payload, fingerprint: &str) -> Result<(), EfattureError> {
        let computed = self.sign(payload)?;
        if verify(&computed, fingerprint) {
            Ok(())
        } else {
            tracing::warn!(client_id = %self.client_id, "digest verification failed");
            Err(EfattureError::Authentication("mismatching signature".into()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn canonical_json_sorts_keys_recursively() {
        let v = json!({"b": 1, "a": {"z": true, "m": [3, {"y": null, "x": "s"}]}});
        assert_eq!(
            canonical_json(&v),
            r#"{"a":{"m":[3,{"x":"s","y":null}],"z":true},"b":1}"#
        );
    }

    #[test]
    fn canonical_json_escapes_slashes_and_non_ascii() {
        let v = json!({"k": "a/b \"q\" è\n€😀\u{1}"});
        assert_eq!(
            canonical_json(&v),
            r#"{"k":"a\/b \"q\" \u00e8\n\u20ac\ud83d\ude00\u0001"}"#
        );
    }

    #[test]
    fn digest_known_vector() {
        let payload = Payload::Structured(json!({"invoiceXml": "<a/>", "b": "1"}));
        assert_eq!(payload.canonical(), r#"{"b":"1","invoiceXml":"<a\/>"}"#);
        assert_eq!(
            digest("uuid", "key", &payload).unwrap(),
            "1d9bf6ec826b8a1f96f1afb4ae6407a54cbc2d1783ffd8b36cca6270d02e9bf7"
        );
    }

    #[test]
    fn text_payload_is_signed_verbatim() {
        let a = digest("id", "s", &Payload::from("hello")).unwrap();
        let b = digest("id", "s", &Payload::from(json!("hello"))).unwrap();
        assert_ne!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn verify_is_case_insensitive_and_strict() {
        assert!(verify("abcdef", "ABCDEF"));
        assert!(!verify("abcdef", "abcdee"));
        assert!(!verify("abcdef", "abcde"));
    }

    #[test]
    fn signer_rejects_tampered_payload() {
        let signer = Signer::new("id", SecretString::from("hunter2"));
        let payload = Payload::from(json!({"webhookKind": "webhook_ricevi_fattura"}));
        let fp = signer.sign(&payload).unwrap();
        assert!(signer.verify(&payload, &fp).is_ok());

        let tampered = Payload::from(json!({"webhookKind": "webhook_invio_fattura"}));
        assert!(matches!(
            signer.verify(&tampered, &fp),
            Err(EfattureError::Authentication(_))
        ));
        assert!(!format!("{signer:?}").contains("hunter2"));
    }
}
