//! Ed25519 key material: trusted verify keys, the key ring, and signing keys.
//!
//! Verify keys are distributed out-of-band as base64 (the format `keygen`
//! writes) or as 64 hex characters. Signing keys never implement
//! `Serialize` and are redacted from `Debug` output.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;
use tessera_core::{Error, Result};

/// Length of a key id in hex characters.
const KEY_ID_HEX_LEN: usize = 16;

/// Short fingerprint of a verify key: the first 8 bytes of SHA-256 over the
/// raw public key, hex encoded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyId(String);

impl KeyId {
    fn of(public_key: &[u8; 32]) -> Self {
        let digest = Sha256::digest(public_key);
        Self(hex::encode(&digest[..KEY_ID_HEX_LEN / 2]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for KeyId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim().to_ascii_lowercase();
        if s.len() != KEY_ID_HEX_LEN || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(Error::InvalidKey(format!(
                "key id must be {} hex chars, got {:?}",
                KEY_ID_HEX_LEN, s
            )));
        }
        Ok(Self(s))
    }
}

impl Serialize for KeyId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for KeyId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A trusted Ed25519 public key.
#[derive(Clone, PartialEq, Eq)]
pub struct VerifyKey {
    key: ed25519_dalek::VerifyingKey,
    id: KeyId,
}

impl VerifyKey {
    /// Build a verify key from 32 raw bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let raw: [u8; 32] = bytes.try_into().map_err(|_| {
            Error::InvalidKey(format!("verify key must be 32 bytes, got {}", bytes.len()))
        })?;
        let key = ed25519_dalek::VerifyingKey::from_bytes(&raw)
            .map_err(|e| Error::InvalidKey(format!("Invalid verify key: {}", e)))?;
        Ok(Self {
            id: KeyId::of(&raw),
            key,
        })
    }

    /// Decode a base64-encoded verify key.
    pub fn from_base64(encoded: &str) -> Result<Self> {
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|e| Error::InvalidKey(format!("Invalid verify key: {}", e)))?;
        Self::from_bytes(&bytes)
    }

    /// Decode a 64-character hex verify key.
    pub fn from_hex(encoded: &str) -> Result<Self> {
        let bytes = hex::decode(encoded.trim())
            .map_err(|e| Error::InvalidKey(format!("Invalid verify key: {}", e)))?;
        Self::from_bytes(&bytes)
    }

    /// Decode a verify key in either supported text form.
    pub fn parse(encoded: &str) -> Result<Self> {
        let encoded = encoded.trim();
        if encoded.len() == 64 && encoded.bytes().all(|b| b.is_ascii_hexdigit()) {
            Self::from_hex(encoded)
        } else {
            Self::from_base64(encoded)
        }
    }

    pub fn id(&self) -> &KeyId {
        &self.id
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.key.as_bytes())
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.key.as_bytes())
    }

    pub(crate) fn as_dalek(&self) -> &ed25519_dalek::VerifyingKey {
        &self.key
    }
}

impl fmt::Debug for VerifyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VerifyKey({})", self.id)
    }
}

/// The set of verify keys this client trusts.
///
/// Holding more than one key allows the licensing server to rotate its
/// signing key without invalidating licenses already in the field.
#[derive(Debug, Clone, Default)]
pub struct KeyRing {
    keys: Vec<VerifyKey>,
}

impl KeyRing {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a key ring from encoded keys (base64 or hex).
    pub fn from_encoded<I, S>(encoded: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut ring = Self::new();
        for key in encoded {
            ring.add(VerifyKey::parse(key.as_ref())?);
        }
        Ok(ring)
    }

    pub fn with_key(mut self, key: VerifyKey) -> Self {
        self.add(key);
        self
    }

    /// Add a key. Adding a key that is already trusted is a no-op.
    pub fn add(&mut self, key: VerifyKey) {
        if self.get(key.id()).is_none() {
            self.keys.push(key);
        }
    }

    pub fn get(&self, id: &KeyId) -> Option<&VerifyKey> {
        self.keys.iter().find(|k| k.id() == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &VerifyKey> {
        self.keys.iter()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// An Ed25519 signing key, held by the issuing side.
pub struct SigningKey {
    key: ed25519_dalek::SigningKey,
}

impl SigningKey {
    /// Generate a fresh signing key from the OS random source.
    pub fn generate() -> Self {
        let mut csprng = rand::rngs::OsRng;
        Self {
            key: ed25519_dalek::SigningKey::generate(&mut csprng),
        }
    }

    pub fn from_bytes(seed: &[u8; 32]) -> Self {
        Self {
            key: ed25519_dalek::SigningKey::from_bytes(seed),
        }
    }

    /// Decode a base64-encoded 32-byte seed.
    pub fn from_base64(encoded: &str) -> Result<Self> {
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|e| Error::InvalidKey(format!("Invalid signing key: {}", e)))?;
        let seed: [u8; 32] = bytes.as_slice().try_into().map_err(|_| {
            Error::InvalidKey(format!("signing key must be 32 bytes, got {}", bytes.len()))
        })?;
        Ok(Self::from_bytes(&seed))
    }

    /// Export the seed as base64. Only `keygen` should need this.
    pub fn export_base64(&self) -> String {
        STANDARD.encode(self.key.to_bytes())
    }

    pub fn verify_key(&self) -> VerifyKey {
        let raw = self.key.verifying_key().to_bytes();
        VerifyKey {
            key: self.key.verifying_key(),
            id: KeyId::of(&raw),
        }
    }

    /// Sign raw bytes. Licenses should go through [`crate::LicenseIssuer`].
    pub fn sign(&self, message: &[u8]) -> [u8; 64] {
        use ed25519_dalek::Signer;
        self.key.sign(message).to_bytes()
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SigningKey({}, <redacted>)", self.verify_key().id())
    }
}
