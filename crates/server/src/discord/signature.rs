//! Ed25519 verification for inbound interaction requests.
//!
//! Discord signs `timestamp || body` with the application's private key and
//! sends the hex signature in `X-Signature-Ed25519`. Requests that fail
//! verification must be answered with 401.
//!
//! See: <https://discord.com/developers/docs/interactions/overview#setting-up-an-endpoint-validating-security-request-headers>

use ed25519_dalek::{Signature, VerifyingKey};
use tracing::{debug, instrument};

use super::error::DiscordError;

/// Header carrying the hex-encoded signature.
pub const SIGNATURE_HEADER: &str = "X-Signature-Ed25519";

/// Header carrying the signed timestamp.
pub const TIMESTAMP_HEADER: &str = "X-Signature-Timestamp";

/// Verifies interaction signatures against the application public key.
#[derive(Debug, Clone)]
pub struct InteractionVerifier {
    key: VerifyingKey,
}

impl InteractionVerifier {
    /// Build a verifier from raw public key bytes.
    ///
    /// # Errors
    ///
    /// Returns error if the bytes are not a valid Ed25519 point.
    pub fn from_bytes(public_key: &[u8; 32]) -> Result<Self, DiscordError> {
        let key = VerifyingKey::from_bytes(public_key)
            .map_err(|e| DiscordError::Config(format!("invalid public key: {e}")))?;
        Ok(Self { key })
    }

    /// Verify a request.
    ///
    /// Missing headers are a failure, never a reason to skip the check.
    ///
    /// # Errors
    ///
    /// Returns `DiscordError::InvalidSignature` if either header is missing,
    /// the signature is malformed, or it does not match.
    #[instrument(skip_all)]
    pub fn verify(
        &self,
        signature: Option<&str>,
        timestamp: Option<&str>,
        body: &[u8],
    ) -> Result<(), DiscordError> {
        let signature = signature
            .ok_or_else(|| DiscordError::InvalidSignature("missing signature header".into()))?;
        let timestamp = timestamp
            .ok_or_else(|| DiscordError::InvalidSignature("missing timestamp header".into()))?;

        let raw = hex::decode(signature.trim())
            .map_err(|_| DiscordError::InvalidSignature("signature is not hex".into()))?;
        let bytes = <[u8; 64]>::try_from(raw.as_slice())
            .map_err(|_| DiscordError::InvalidSignature("signature must be 64 bytes".into()))?;
        let signature = Signature::from_bytes(&bytes);

        let mut message = Vec::with_capacity(timestamp.len() + body.len());
        message.extend_from_slice(timestamp.as_bytes());
        message.extend_from_slice(body);

        self.key
            .verify_strict(&message, &signature)
            .map_err(|_| DiscordError::InvalidSignature("signature mismatch".into()))?;

        debug!("Discord signature verified");

        Ok(())
    }
}
