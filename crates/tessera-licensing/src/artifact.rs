//! Signed license artifacts and their two text encodings.
//!
//! The JSON envelope ([`LicenseFile`]) is what license files on disk contain.
//! The compact form is `base64url(payload).base64url(signature)`, convenient
//! for pasting into environment variables or config fields.

use crate::keys::KeyId;
use base64::Engine;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use serde::{Deserialize, Serialize};
use tessera_core::{Error, Result};

/// Envelope schema version this crate reads and writes.
pub const CURRENT_VERSION: u32 = 1;

/// Signature algorithm of an artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    #[default]
    Ed25519,
}

impl Algorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            Algorithm::Ed25519 => "ed25519",
        }
    }
}

impl std::str::FromStr for Algorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "ed25519" => Ok(Algorithm::Ed25519),
            other => Err(Error::MalformedArtifact(format!(
                "Unsupported signature algorithm: {}",
                other
            ))),
        }
    }
}

/// License file envelope, as stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LicenseFile {
    /// Schema version.
    pub version: u32,
    /// Signature algorithm.
    #[serde(default = "default_alg")]
    pub alg: String,
    /// Id of the key that signed the payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_id: Option<String>,
    /// License payload (base64 encoded).
    pub data: String,
    /// Signature over the decoded payload (base64 encoded).
    pub signature: String,
}

fn default_alg() -> String {
    Algorithm::Ed25519.as_str().to_string()
}

/// A decoded, not yet verified, license artifact.
///
/// Holding a `LicenseArtifact` says nothing about authenticity; pass it to
/// [`crate::SignatureVerifier`] first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LicenseArtifact {
    version: u32,
    algorithm: Algorithm,
    key_id: Option<KeyId>,
    payload: Vec<u8>,
    signature: Vec<u8>,
}

impl LicenseArtifact {
    /// Assemble an artifact from raw payload and signature bytes.
    pub fn from_parts(payload: Vec<u8>, signature: Vec<u8>, key_id: Option<KeyId>) -> Self {
        Self {
            version: CURRENT_VERSION,
            algorithm: Algorithm::Ed25519,
            key_id,
            payload,
            signature,
        }
    }

    /// Decode an artifact from text, detecting the encoding.
    ///
    /// Text starting with `{` is a JSON envelope, anything else a compact
    /// token. A leading byte order mark is ignored.
    pub fn decode(text: &str) -> Result<Self> {
        let text = text.trim_start_matches('\u{feff}').trim();
        if text.starts_with('{') {
            Self::from_json(text)
        } else {
            Self::from_compact(text)
        }
    }

    /// Decode raw bytes, which must be UTF-8 text in either encoding.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| Error::MalformedArtifact(format!("Artifact is not UTF-8: {}", e)))?;
        Self::decode(text)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let file: LicenseFile = serde_json::from_str(json).map_err(|e| {
            Error::MalformedArtifact(format!("Invalid license file format: {}", e))
        })?;
        Self::try_from(file)
    }

    pub fn from_compact(token: &str) -> Result<Self> {
        let mut parts = token.split('.');
        let (Some(data), Some(signature), None) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(Error::MalformedArtifact(
                "Compact license must have exactly two dot-separated parts".to_string(),
            ));
        };

        let payload = URL_SAFE_NO_PAD
            .decode(data)
            .map_err(|e| Error::MalformedArtifact(format!("Invalid license data: {}", e)))?;
        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|e| Error::MalformedArtifact(format!("Invalid signature encoding: {}", e)))?;

        Ok(Self::from_parts(payload, signature, None))
    }

    pub fn to_license_file(&self) -> LicenseFile {
        LicenseFile {
            version: self.version,
            alg: self.algorithm.as_str().to_string(),
            key_id: self.key_id.as_ref().map(|id| id.to_string()),
            data: STANDARD.encode(&self.payload),
            signature: STANDARD.encode(&self.signature),
        }
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.to_license_file())?)
    }

    /// Encode as a compact token. The key id is not carried.
    pub fn to_compact(&self) -> String {
        format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(&self.payload),
            URL_SAFE_NO_PAD.encode(&self.signature)
        )
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn key_id(&self) -> Option<&KeyId> {
        self.key_id.as_ref()
    }

    /// Payload bytes exactly as signed. Untrusted until verified.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn signature(&self) -> &[u8] {
        &self.signature
    }
}

impl TryFrom<LicenseFile> for LicenseArtifact {
    type Error = Error;

    fn try_from(file: LicenseFile) -> Result<Self> {
        if file.version != CURRENT_VERSION {
            return Err(Error::MalformedArtifact(format!(
                "Unsupported license file version: {}",
                file.version
            )));
        }

        let algorithm: Algorithm = file.alg.parse()?;

        let key_id = file
            .key_id
            .map(|id| {
                id.parse::<KeyId>()
                    .map_err(|e| Error::MalformedArtifact(format!("Invalid key id: {}", e)))
            })
            .transpose()?;

        let payload = STANDARD
            .decode(&file.data)
            .map_err(|e| Error::MalformedArtifact(format!("Invalid license data: {}", e)))?;
        let signature = STANDARD
            .decode(&file.signature)
            .map_err(|e| Error::MalformedArtifact(format!("Invalid signature encoding: {}", e)))?;

        Ok(Self {
            version: file.version,
            algorithm,
            key_id,
            payload,
            signature,
        })
    }
}
