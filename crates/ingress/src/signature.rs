//! HMAC-SHA256 webhook signatures.
//!
//! Producers sign the exact request body and send
//! `X-{Source}-Signature: sha256=<hex>`; verification recomputes the MAC
//! over the same bytes and compares in constant time. An empty shared
//! secret disables verification (development mode).

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Why a signature was rejected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    /// A secret is configured but the request carried no signature header.
    #[error("missing signature header")]
    MissingHeader,

    /// The header is not of the form `sha256=<hex>`.
    #[error("malformed signature header")]
    MalformedHeader,

    /// The signature does not match the body.
    #[error("signature mismatch")]
    Mismatch,
}

/// Verify a request body against its signature header.
///
/// An empty `secret` skips verification entirely. Otherwise the header must
/// be present, carry the `sha256=` prefix, and match the HMAC-SHA256 of
/// `body` under `secret`; the comparison is constant-time.
pub fn verify_signature(
    secret: &str,
    header: Option<&str>,
    body: &[u8],
) -> Result<(), SignatureError> {
    if secret.is_empty() {
        return Ok(());
    }

    let header = header.ok_or(SignatureError::MissingHeader)?;
    let hex_digest = header
        .strip_prefix("sha256=")
        .ok_or(SignatureError::MalformedHeader)?;
    let claimed = hex::decode(hex_digest).map_err(|_| SignatureError::MalformedHeader)?;

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| SignatureError::MalformedHeader)?;
    mac.update(body);
    let computed = mac.finalize().into_bytes();

    if computed.ct_eq(claimed.as_slice()).into() {
        Ok(())
    } else {
        Err(SignatureError::Mismatch)
    }
}

/// Sign a body the way producers are expected to: `sha256=<hex>`.
#[must_use]
pub fn sign_body(secret: &str, body: &[u8]) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(body);
    format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
}
