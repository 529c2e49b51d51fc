//! Bitget request signing.
//!
//! The signature is `base64(HMAC-SHA256(secret, timestamp + METHOD + path + body))`
//! where `body` is the compact JSON body, or empty when there is none.

use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine};
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde_json::Value;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Compact JSON rendering used both for signing and as the request body
pub fn canonical_body(body: Option<&Value>) -> String {
    match body {
        None | Some(Value::Null) => String::new(),
        Some(value) => value.to_string(),
    }
}

/// Sign one request. Pure: identical inputs give identical output.
pub fn sign(
    timestamp: &str,
    method: &str,
    path: &str,
    body: Option<&Value>,
    secret: &str,
) -> String {
    let pre_hash = format!(
        "{}{}{}{}",
        timestamp,
        method.to_uppercase(),
        path,
        canonical_body(body)
    );

    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts keys of any length");
    mac.update(pre_hash.as_bytes());

    BASE64_STANDARD.encode(mac.finalize().into_bytes())
}

/// Everything needed to put one signed call on the wire
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedRequest {
    /// Milliseconds since epoch
    pub timestamp: String,
    pub method: String,
    pub path: String,
    pub body: String,
    pub signature: String,
}

impl SignedRequest {
    /// Sign with a fresh timestamp. Never reuse the result for a retry.
    pub fn new(method: &str, path: &str, body: Option<&Value>, secret: &str) -> Self {
        let timestamp = Utc::now().timestamp_millis().to_string();
        Self::at(timestamp, method, path, body, secret)
    }

    /// Sign at a fixed timestamp
    pub fn at(
        timestamp: String,
        method: &str,
        path: &str,
        body: Option<&Value>,
        secret: &str,
    ) -> Self {
        let signature = sign(&timestamp, method, path, body, secret);

        Self {
            timestamp,
            method: method.to_uppercase(),
            path: path.to_string(),
            body: canonical_body(body),
            signature,
        }
    }
}
