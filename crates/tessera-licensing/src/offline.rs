//! Offline license validation with signed license files.

use crate::artifact::LicenseArtifact;
use crate::evaluator::{Evaluator, Policy};
use crate::keys::KeyRing;
use crate::parser;
use crate::types::{ParsedLicense, ValidationResult};
use crate::verifier::SignatureVerifier;
use chrono::{DateTime, Utc};
use tessera_core::{Error, Result};
use tracing::info;

/// Offline license validator.
///
/// Signature and format problems surface as `Err`. An authentic license that
/// fails the validity window or policy is an `Ok` result with `valid = false`.
#[derive(Debug, Clone)]
pub struct OfflineValidator {
    verifier: SignatureVerifier,
    evaluator: Evaluator,
}

impl OfflineValidator {
    /// Create a new offline validator.
    pub fn new(keyring: KeyRing, policy: Policy) -> Self {
        Self {
            verifier: SignatureVerifier::new(keyring),
            evaluator: Evaluator::new(policy),
        }
    }

    /// Create a validator from encoded verify keys (base64 or hex).
    pub fn from_encoded_keys<I, S>(keys: I, policy: Policy) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Ok(Self::new(KeyRing::from_encoded(keys)?, policy))
    }

    pub fn keyring(&self) -> &KeyRing {
        self.verifier.keyring()
    }

    pub fn policy(&self) -> &Policy {
        self.evaluator.policy()
    }

    /// Verify the signature and parse the license, without evaluating it.
    pub fn verify_and_parse(&self, artifact: &LicenseArtifact) -> Result<ParsedLicense> {
        let payload = self.verifier.verify(artifact)?;
        parser::parse(&payload)
    }

    /// Validate a license artifact at `now`.
    pub fn validate(
        &self,
        artifact: &LicenseArtifact,
        now: DateTime<Utc>,
    ) -> Result<ValidationResult> {
        info!("Validating license offline");
        let license = self.verify_and_parse(artifact)?;
        Ok(self.evaluator.evaluate(&license, now))
    }

    /// Decode and validate a license in either text encoding.
    pub fn validate_str(&self, text: &str, now: DateTime<Utc>) -> Result<ValidationResult> {
        let artifact = LicenseArtifact::decode(text)?;
        self.validate(&artifact, now)
    }

    /// Load and validate a license file from disk.
    pub async fn validate_file(
        &self,
        path: &std::path::Path,
        now: DateTime<Utc>,
    ) -> Result<ValidationResult> {
        let artifact = load_artifact(path).await?;
        self.validate(&artifact, now)
    }
}

/// Read and decode a license file.
pub async fn load_artifact(path: &std::path::Path) -> Result<LicenseArtifact> {
    let content = tokio::fs::read_to_string(path).await.map_err(|e| {
        Error::Io(std::io::Error::new(
            e.kind(),
            format!("Failed to read license file {}: {}", path.display(), e),
        ))
    })?;
    LicenseArtifact::decode(&content)
}
