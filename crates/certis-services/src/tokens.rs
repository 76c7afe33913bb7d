//! Signed download tokens for the database provider.
//!
//! Wire format: `{signature}.{base64url(msgpack(payload))}` with no padding.
//! The msgpack field order below is a compatibility contract between issuer
//! and verifier and must not be reordered. The signing secret is per-token,
//! generated at issuance, and lives only in the issuer's memory.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use hmac::{Hmac, Mac};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::time::Duration;
use thiserror::Error;
use ulid::Ulid;

const SECRET_LEN: usize = 32;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token payload encoding failed: {0}")]
    Encode(String),

    #[error("malformed download token")]
    Malformed,

    #[error("token signature mismatch")]
    SignatureMismatch,

    #[error("token expired")]
    Expired,
}

/// Payload of a presigned download. Field order is the wire contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadToken {
    pub token_id: Ulid,
    /// `provider:bucket:key` for the object being granted.
    pub object_uri: String,
    /// Caller bound to the token; `None` leaves the token bearer-redeemable.
    pub user_id: Option<Ulid>,
    pub organization_id: Option<Ulid>,
    pub content_type: String,
    pub file_name: String,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub expires_at: DateTime<Utc>,
}

impl DownloadToken {
    /// Mint a token for an object with a fresh ULID and expiry.
    pub fn new(object_uri: impl Into<String>, expires_in: Duration) -> Self {
        let ttl = ChronoDuration::from_std(expires_in).unwrap_or_else(|_| ChronoDuration::zero());

        DownloadToken {
            token_id: Ulid::new(),
            object_uri: object_uri.into(),
            user_id: None,
            organization_id: None,
            content_type: String::new(),
            file_name: String::new(),
            expires_at: Utc::now() + ttl,
        }
    }

    pub fn with_user(mut self, user_id: Ulid) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn with_organization(mut self, org_id: Ulid) -> Self {
        self.organization_id = Some(org_id);
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = file_name.into();
        self
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }

    fn canonical_bytes(&self) -> Result<Vec<u8>, TokenError> {
        rmp_serde::to_vec(self).map_err(|e| TokenError::Encode(e.to_string()))
    }

    /// Sign with a freshly generated per-token secret.
    ///
    /// Returns the signature and the secret; the caller is responsible for
    /// retaining the secret until the token expires.
    pub fn sign(&self) -> Result<(String, Vec<u8>), TokenError> {
        let mut secret = vec![0u8; SECRET_LEN];
        rand::rng().fill(&mut secret[..]);

        let signature = self.signature_with(&secret)?;
        Ok((signature, secret))
    }

    fn signature_with(&self, secret: &[u8]) -> Result<String, TokenError> {
        let mut mac =
            Hmac::<Sha256>::new_from_slice(secret).map_err(|e| TokenError::Encode(e.to_string()))?;
        mac.update(&self.canonical_bytes()?);

        Ok(URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes()))
    }

    /// Verify a signature against this payload in constant time.
    pub fn verify(&self, signature: &str, secret: &[u8]) -> Result<(), TokenError> {
        let tag = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| TokenError::Malformed)?;

        let mut mac =
            Hmac::<Sha256>::new_from_slice(secret).map_err(|e| TokenError::Encode(e.to_string()))?;
        mac.update(&self.canonical_bytes()?);
        mac.verify_slice(&tag)
            .map_err(|_| TokenError::SignatureMismatch)?;

        if self.is_expired() {
            return Err(TokenError::Expired);
        }

        Ok(())
    }

    /// Encode the payload half of the wire form.
    pub fn encode_payload(&self) -> Result<String, TokenError> {
        Ok(URL_SAFE_NO_PAD.encode(self.canonical_bytes()?))
    }

    /// Decode a payload produced by [`encode_payload`](Self::encode_payload).
    pub fn decode_payload(encoded: &str) -> Result<Self, TokenError> {
        let raw = URL_SAFE_NO_PAD
            .decode(encoded)
            .map_err(|_| TokenError::Malformed)?;

        rmp_serde::from_slice(&raw).map_err(|_| TokenError::Malformed)
    }
}

/// Assemble the wire form `signature.payload`.
pub fn encode_wire(signature: &str, payload: &str) -> String {
    format!("{signature}.{payload}")
}

/// Split a wire token into signature and payload.
///
/// The split is on the first `.` and must yield exactly two non-empty parts.
pub fn split_wire(token: &str) -> Result<(&str, &str), TokenError> {
    let (signature, payload) = token.split_once('.').ok_or(TokenError::Malformed)?;
    if signature.is_empty() || payload.is_empty() {
        return Err(TokenError::Malformed);
    }

    Ok((signature, payload))
}
