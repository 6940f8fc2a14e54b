//! Offline license validation for Tessera.
//!
//! A license artifact flows through three stages:
//!
//! 1. [`SignatureVerifier`] checks the Ed25519 signature against a
//!    [`KeyRing`] and yields a [`VerifiedPayload`].
//! 2. [`parser::parse`] turns a verified payload into a [`ParsedLicense`].
//! 3. [`Evaluator`] applies the validity window and an optional [`Policy`]
//!    at a caller-supplied instant and yields a [`ValidationResult`].
//!
//! [`OfflineValidator`] composes the three. [`LicenseIssuer`] is the signing
//! side, used by the CLI and by tests.

pub mod artifact;
pub mod evaluator;
pub mod issuer;
pub mod keys;
pub mod offline;
pub mod parser;
pub mod types;
pub mod verifier;

pub use artifact::{Algorithm, LicenseArtifact, LicenseFile};
pub use evaluator::{Evaluator, Policy};
pub use issuer::LicenseIssuer;
pub use keys::{KeyId, KeyRing, SigningKey, VerifyKey};
pub use offline::OfflineValidator;
pub use types::{
    LicenseClaims, LicenseClaimsBuilder, ParsedLicense, ValidationReason, ValidationResult,
};
pub use verifier::{SignatureVerifier, VerifiedPayload};
