//! Signature verification of license artifacts.

use crate::artifact::{Algorithm, LicenseArtifact};
use crate::keys::{KeyId, KeyRing, VerifyKey};
use ed25519_dalek::Signature;
use tessera_core::{Error, Result};
use tracing::{debug, warn};

/// Payload bytes whose signature has been checked against a trusted key.
///
/// Only [`SignatureVerifier::verify`] can construct one, which is what keeps
/// unverified bytes out of the parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedPayload {
    bytes: Vec<u8>,
    key_id: KeyId,
}

impl VerifiedPayload {
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Id of the trusted key that verified the payload.
    pub fn key_id(&self) -> &KeyId {
        &self.key_id
    }
}

/// Verifies artifact signatures against a [`KeyRing`].
#[derive(Debug, Clone)]
pub struct SignatureVerifier {
    keyring: KeyRing,
}

impl SignatureVerifier {
    pub fn new(keyring: KeyRing) -> Self {
        Self { keyring }
    }

    pub fn keyring(&self) -> &KeyRing {
        &self.keyring
    }

    /// Verify an artifact's signature.
    ///
    /// An artifact naming a key id is checked against that key only. An
    /// artifact without one is accepted if any trusted key verifies it.
    pub fn verify(&self, artifact: &LicenseArtifact) -> Result<VerifiedPayload> {
        // Every new algorithm needs its own arm here.
        match artifact.algorithm() {
            Algorithm::Ed25519 => {}
        }

        let Ok(sig_bytes): std::result::Result<[u8; 64], _> = artifact.signature().try_into()
        else {
            warn!(
                len = artifact.signature().len(),
                "License signature has wrong length"
            );
            return Err(Error::InvalidSignature(format!(
                "signature must be 64 bytes, got {}",
                artifact.signature().len()
            )));
        };
        let signature = Signature::from_bytes(&sig_bytes);

        if self.keyring.is_empty() {
            warn!("No trusted verify keys configured");
            return Err(Error::InvalidSignature(
                "no trusted verify keys configured".to_string(),
            ));
        }

        let verified_by = match artifact.key_id() {
            Some(key_id) => {
                let key = self.keyring.get(key_id).ok_or_else(|| {
                    warn!(key_id = %key_id, "License signed by untrusted key");
                    Error::InvalidSignature(format!("untrusted signing key: {}", key_id))
                })?;
                verify_with(key, artifact.payload(), &signature).then_some(key)
            }
            None => self
                .keyring
                .iter()
                .find(|key| verify_with(key, artifact.payload(), &signature)),
        };

        match verified_by {
            Some(key) => {
                debug!(key_id = %key.id(), "License signature verified");
                Ok(VerifiedPayload {
                    bytes: artifact.payload().to_vec(),
                    key_id: key.id().clone(),
                })
            }
            None => {
                warn!("License signature verification failed");
                Err(Error::InvalidSignature(
                    "signature does not match payload".to_string(),
                ))
            }
        }
    }
}

fn verify_with(key: &VerifyKey, payload: &[u8], signature: &Signature) -> bool {
    key.as_dalek().verify_strict(payload, signature).is_ok()
}
