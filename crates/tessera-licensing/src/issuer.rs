//! License issuing: signs claims into artifacts.

use crate::artifact::LicenseArtifact;
use crate::keys::{SigningKey, VerifyKey};
use crate::types::LicenseClaims;
use tessera_core::Result;
use tracing::info;

/// Signs license claims with an Ed25519 signing key.
#[derive(Debug)]
pub struct LicenseIssuer {
    signing_key: SigningKey,
}

impl LicenseIssuer {
    pub fn new(signing_key: SigningKey) -> Self {
        Self { signing_key }
    }

    /// The verify key clients need in order to accept this issuer's licenses.
    pub fn verify_key(&self) -> VerifyKey {
        self.signing_key.verify_key()
    }

    /// Sign claims into an artifact.
    ///
    /// Claims the parser would reject are refused with `MalformedArtifact`
    /// before anything is signed.
    pub fn issue(&self, claims: &LicenseClaims) -> Result<LicenseArtifact> {
        let payload = claims.to_json_vec()?;
        let signature = self.signing_key.sign(&payload);
        let key_id = self.signing_key.verify_key().id().clone();

        info!(
            license_id = %claims.license_id,
            product = %claims.product_id,
            key_id = %key_id,
            "License issued"
        );

        Ok(LicenseArtifact::from_parts(
            payload,
            signature.to_vec(),
            Some(key_id),
        ))
    }
}
