//! Webhook payload signatures
//!
//! HMAC-SHA256 over the raw request body, hex encoded. Only enforced when a
//! shared secret is configured.

use std::fmt;

use axum::http::HeaderValue;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

/// Header carrying the payload signature
pub const SIGNATURE_HEADER: &str = "x-ciq-signature";

const DIGEST_PREFIX: &str = "sha256=";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("Missing x-ciq-signature header")]
    Missing,

    #[error("Signature is not valid hex")]
    Encoding,

    #[error("Signature does not match payload")]
    Mismatch,
}

/// Verifies webhook bodies against a shared secret
#[derive(Clone)]
pub struct SignatureVerifier {
    key: Vec<u8>,
}

impl SignatureVerifier {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self {
            key: secret.as_ref().to_vec(),
        }
    }

    /// Hex signature for a payload
    pub fn sign(&self, payload: &[u8]) -> String {
        let mut mac = self.new_hmac();
        mac.update(payload);
        hex::encode(mac.finalize().into_bytes())
    }

    /// Check a hex signature, optionally prefixed with `sha256=`
    pub fn verify(&self, payload: &[u8], signature: &str) -> Result<(), SignatureError> {
        let signature = signature.trim();
        let signature = signature.strip_prefix(DIGEST_PREFIX).unwrap_or(signature);
        let expected = hex::decode(signature).map_err(|_| SignatureError::Encoding)?;

        let mut mac = self.new_hmac();
        mac.update(payload);
        mac.verify_slice(&expected).map_err(|_| SignatureError::Mismatch)
    }

    /// Check the signature header of an inbound request
    pub fn verify_header(
        &self,
        payload: &[u8],
        header: Option<&HeaderValue>,
    ) -> Result<(), SignatureError> {
        let header = header.ok_or(SignatureError::Missing)?;
        let signature = header.to_str().map_err(|_| SignatureError::Encoding)?;
        self.verify(payload, signature)
    }

    fn new_hmac(&self) -> Hmac<Sha256> {
        Hmac::<Sha256>::new_from_slice(&self.key)
            .expect("HMAC can take a key of any size so this cannot fail")
    }
}

impl fmt::Debug for SignatureVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignatureVerifier").finish_non_exhaustive()
    }
}
