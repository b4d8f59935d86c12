//! RPC-style request signing (signature version 1.0, HMAC-SHA1).

use base64::Engine;
use hmac::{Hmac, Mac};
use rds_exporter_core::error::{ExporterError, Result};
use sha1::Sha1;

pub const SIGNATURE_METHOD: &str = "HMAC-SHA1";
pub const SIGNATURE_VERSION: &str = "1.0";

type HmacSha1 = Hmac<Sha1>;

/// RFC 3986 encoding: everything but `A-Za-z0-9-_.~` is escaped.
pub fn percent_encode(raw: &str) -> String {
    urlencoding::encode(raw).into_owned()
}

/// Sorted, encoded `k=v&k=v` form of the request parameters.
pub fn canonical_query(params: &[(String, String)]) -> String {
    let mut sorted: Vec<_> = params.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(&b.0));
    sorted
        .into_iter()
        .map(|(k, v)| format!("{}={}", percent_encode(k), percent_encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

pub fn string_to_sign(method: &str, canonical_query: &str) -> String {
    format!(
        "{method}&{}&{}",
        percent_encode("/"),
        percent_encode(canonical_query)
    )
}

pub fn sign(access_key_secret: &str, string_to_sign: &str) -> Result<String> {
    let key = format!("{access_key_secret}&");
    let mut mac = HmacSha1::new_from_slice(key.as_bytes())
        .map_err(|e| ExporterError::Internal(format!("signing key rejected: {e}")))?;
    mac.update(string_to_sign.as_bytes());
    Ok(base64::engine::general_purpose::STANDARD.encode(mac.finalize().into_bytes()))
}
