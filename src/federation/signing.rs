// ============================================================================
// Batch Signing - Gateway Upload Authentication
// ============================================================================
//
// Every uploaded batch carries a detached signature in the `batchSignature`
// header. The signature is Ed25519 over the SHA-256 digest of the exact
// payload bytes, base64-encoded.
//
// Security model:
// - One signing key per national backend
// - Private key stored as SECRET (FEDERATION_SIGNING_KEY)
// - Public key registered with the gateway operator out of band
//
// ============================================================================

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use sha2::{Digest, Sha256};
use std::fmt;

#[derive(Debug)]
pub enum SigningError {
    InvalidKey(String),
    VerificationFailed,
    InvalidSignature(String),
}

impl fmt::Display for SigningError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SigningError::InvalidKey(msg) => write!(f, "Invalid signing key: {}", msg),
            SigningError::VerificationFailed => write!(f, "Signature verification failed"),
            SigningError::InvalidSignature(msg) => write!(f, "Invalid signature format: {}", msg),
        }
    }
}

impl std::error::Error for SigningError {}

/// Produces the `batchSignature` value for a serialized batch
pub trait BatchSigner: Send + Sync {
    fn sign(&self, payload: &[u8]) -> Result<String, SigningError>;
}

/// Ed25519 batch signer
pub struct Ed25519BatchSigner {
    signing_key: SigningKey,
    verifying_key: VerifyingKey,
}

impl Ed25519BatchSigner {
    /// Create a signer from a base64-encoded 32-byte seed
    /// (from `openssl rand -base64 32`)
    pub fn from_seed_base64(seed_b64: &str) -> Result<Self, SigningError> {
        let seed_bytes = BASE64
            .decode(seed_b64.trim())
            .map_err(|e| SigningError::InvalidKey(format!("Invalid base64: {}", e)))?;

        let seed: [u8; 32] = seed_bytes.try_into().map_err(|bytes: Vec<u8>| {
            SigningError::InvalidKey(format!("Seed must be 32 bytes, got {}", bytes.len()))
        })?;

        let signing_key = SigningKey::from_bytes(&seed);
        let verifying_key = signing_key.verifying_key();

        tracing::info!(
            public_key = %BASE64.encode(verifying_key.as_bytes()),
            "Batch signing key initialized"
        );

        Ok(Self {
            signing_key,
            verifying_key,
        })
    }

    /// Public key as base64, for registration with the gateway
    pub fn public_key_base64(&self) -> String {
        BASE64.encode(self.verifying_key.as_bytes())
    }

    /// Verify a batch signature against a base64 public key
    pub fn verify_signature(
        public_key_b64: &str,
        payload: &[u8],
        signature_b64: &str,
    ) -> Result<(), SigningError> {
        let public_key_bytes = BASE64
            .decode(public_key_b64)
            .map_err(|e| SigningError::InvalidKey(format!("Invalid public key base64: {}", e)))?;

        let public_key_array: [u8; 32] = public_key_bytes.try_into().map_err(|bytes: Vec<u8>| {
            SigningError::InvalidKey(format!("Public key must be 32 bytes, got {}", bytes.len()))
        })?;

        let verifying_key = VerifyingKey::from_bytes(&public_key_array)
            .map_err(|e| SigningError::InvalidKey(format!("Invalid Ed25519 public key: {}", e)))?;

        let signature_bytes = BASE64.decode(signature_b64).map_err(|e| {
            SigningError::InvalidSignature(format!("Invalid signature base64: {}", e))
        })?;

        let signature_array: [u8; 64] = signature_bytes.try_into().map_err(|bytes: Vec<u8>| {
            SigningError::InvalidSignature(format!(
                "Signature must be 64 bytes, got {}",
                bytes.len()
            ))
        })?;

        let signature = Signature::from_bytes(&signature_array);

        verifying_key
            .verify(&payload_digest(payload), &signature)
            .map_err(|_| SigningError::VerificationFailed)
    }
}

impl BatchSigner for Ed25519BatchSigner {
    fn sign(&self, payload: &[u8]) -> Result<String, SigningError> {
        let signature = self.signing_key.sign(&payload_digest(payload));
        Ok(BASE64.encode(signature.to_bytes()))
    }
}

fn payload_digest(payload: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(payload);
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEED: &str = "ZmVkZXJhdGlvbi10ZXN0LXNlZWQtMzItYnl0ZXMtb2s=";
    const OTHER_SEED: &str = "YW5vdGhlci1mZWRlcmF0aW9uLXNlZWQtMzItYnl0ZXM=";

    #[test]
    fn test_signer_from_seed() {
        let signer = Ed25519BatchSigner::from_seed_base64(SEED).unwrap();
        assert!(!signer.public_key_base64().is_empty());
    }

    #[test]
    fn test_short_seed_rejected() {
        let result = Ed25519BatchSigner::from_seed_base64("c2hvcnQ=");
        assert!(matches!(result, Err(SigningError::InvalidKey(_))));
    }

    #[test]
    fn test_sign_and_verify() {
        let signer = Ed25519BatchSigner::from_seed_base64(SEED).unwrap();
        let payload = b"serialized diagnosis key batch";

        let signature = signer.sign(payload).unwrap();
        assert!(
            Ed25519BatchSigner::verify_signature(&signer.public_key_base64(), payload, &signature)
                .is_ok()
        );

        // Tampered payload
        let result = Ed25519BatchSigner::verify_signature(
            &signer.public_key_base64(),
            b"serialized diagnosis key batcH",
            &signature,
        );
        assert!(matches!(result, Err(SigningError::VerificationFailed)));

        // Wrong key
        let other = Ed25519BatchSigner::from_seed_base64(OTHER_SEED).unwrap();
        let result =
            Ed25519BatchSigner::verify_signature(&other.public_key_base64(), payload, &signature);
        assert!(result.is_err());
    }

    #[test]
    fn test_signature_is_deterministic() {
        let signer = Ed25519BatchSigner::from_seed_base64(SEED).unwrap();
        assert_eq!(signer.sign(b"abc").unwrap(), signer.sign(b"abc").unwrap());
        assert_ne!(signer.sign(b"abc").unwrap(), signer.sign(b"abd").unwrap());
    }
}
