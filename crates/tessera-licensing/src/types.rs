//! License types and structures.

use crate::keys::KeyId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tessera_core::{Error, LicenseId, ProductId, Result};

/// The signed content of a license.
///
/// This is the payload an issuer signs and the parser reads back. Holding
/// claims proves nothing; a [`ParsedLicense`] is the verified form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LicenseClaims {
    /// License ID.
    pub license_id: LicenseId,
    /// Product this license unlocks.
    pub product_id: ProductId,
    /// Licensee name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub licensee: Option<String>,
    /// Licensed seat/activation count. `None` means unlimited.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u64>,
    /// Start of the validity window (inclusive).
    pub valid_from: DateTime<Utc>,
    /// End of the validity window (inclusive).
    pub valid_until: DateTime<Utc>,
    /// When the license was issued.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issued_at: Option<DateTime<Utc>>,
    /// Enabled feature codes.
    #[serde(default)]
    pub features: BTreeSet<String>,
    /// Custom properties.
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

impl LicenseClaims {
    /// Create a new builder for license claims.
    pub fn builder(
        product_id: impl Into<ProductId>,
        valid_from: DateTime<Utc>,
        valid_until: DateTime<Utc>,
    ) -> LicenseClaimsBuilder {
        LicenseClaimsBuilder::new(product_id, valid_from, valid_until)
    }
}

/// Builder for license claims.
pub struct LicenseClaimsBuilder {
    license_id: LicenseId,
    product_id: ProductId,
    licensee: Option<String>,
    quantity: Option<u64>,
    valid_from: DateTime<Utc>,
    valid_until: DateTime<Utc>,
    issued_at: Option<DateTime<Utc>>,
    features: BTreeSet<String>,
    properties: BTreeMap<String, String>,
}

impl LicenseClaimsBuilder {
    pub fn new(
        product_id: impl Into<ProductId>,
        valid_from: DateTime<Utc>,
        valid_until: DateTime<Utc>,
    ) -> Self {
        Self {
            license_id: LicenseId::new(),
            product_id: product_id.into(),
            licensee: None,
            quantity: None,
            valid_from,
            valid_until,
            issued_at: None,
            features: BTreeSet::new(),
            properties: BTreeMap::new(),
        }
    }

    pub fn license_id(mut self, id: LicenseId) -> Self {
        self.license_id = id;
        self
    }

    pub fn licensee(mut self, licensee: impl Into<String>) -> Self {
        self.licensee = Some(licensee.into());
        self
    }

    pub fn quantity(mut self, quantity: u64) -> Self {
        self.quantity = Some(quantity);
        self
    }

    pub fn issued_at(mut self, issued_at: DateTime<Utc>) -> Self {
        self.issued_at = Some(issued_at);
        self
    }

    pub fn feature(mut self, code: impl Into<String>) -> Self {
        self.features.insert(code.into());
        self
    }

    pub fn property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn build(self) -> LicenseClaims {
        LicenseClaims {
            license_id: self.license_id,
            product_id: self.product_id,
            licensee: self.licensee,
            quantity: self.quantity,
            valid_from: self.valid_from,
            valid_until: self.valid_until,
            issued_at: self.issued_at,
            features: self.features,
            properties: self.properties,
        }
    }
}

/// A license whose signature has been verified and whose claims have been
/// parsed.
///
/// Constructed only by [`crate::parser::parse`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedLicense {
    #[serde(flatten)]
    claims: LicenseClaims,
    signed_by: KeyId,
}

impl ParsedLicense {
    pub(crate) fn new(claims: LicenseClaims, signed_by: KeyId) -> Self {
        Self { claims, signed_by }
    }

    pub fn claims(&self) -> &LicenseClaims {
        &self.claims
    }

    pub fn into_claims(self) -> LicenseClaims {
        self.claims
    }

    pub fn license_id(&self) -> LicenseId {
        self.claims.license_id
    }

    pub fn product_id(&self) -> &ProductId {
        &self.claims.product_id
    }

    pub fn licensee(&self) -> Option<&str> {
        self.claims.licensee.as_deref()
    }

    pub fn quantity(&self) -> Option<u64> {
        self.claims.quantity
    }

    pub fn valid_from(&self) -> DateTime<Utc> {
        self.claims.valid_from
    }

    pub fn valid_until(&self) -> DateTime<Utc> {
        self.claims.valid_until
    }

    pub fn features(&self) -> &BTreeSet<String> {
        &self.claims.features
    }

    pub fn properties(&self) -> &BTreeMap<String, String> {
        &self.claims.properties
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.claims.properties.get(key).map(String::as_str)
    }

    /// Id of the trusted key that signed this license.
    pub fn signed_by(&self) -> &KeyId {
        &self.signed_by
    }

    /// Check if a feature is enabled.
    pub fn has_feature(&self, code: &str) -> bool {
        self.claims.features.contains(code)
    }

    /// Check a requested quantity against the licensed quantity.
    pub fn check_quantity(&self, requested: u64) -> bool {
        self.claims.quantity.is_none_or(|limit| requested <= limit)
    }
}

/// Why a license was accepted or rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "code", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationReason {
    Valid,
    Expired,
    NotYetValid,
    ProductMismatch { expected: ProductId, actual: ProductId },
    MissingFeature { feature: String },
    QuantityExceeded { requested: u64, limit: u64 },
}

impl ValidationReason {
    /// The error matching a rejection reason, or `None` for `Valid`.
    pub fn to_error(&self) -> Option<Error> {
        match self {
            ValidationReason::Valid => None,
            ValidationReason::Expired => Some(Error::Expired),
            ValidationReason::NotYetValid => Some(Error::NotYetValid),
            ValidationReason::ProductMismatch { expected, actual } => {
                Some(Error::ProductMismatch {
                    expected: expected.to_string(),
                    actual: actual.to_string(),
                })
            }
            ValidationReason::MissingFeature { feature } => {
                Some(Error::MissingFeature(feature.clone()))
            }
            ValidationReason::QuantityExceeded { requested, limit } => {
                Some(Error::QuantityExceeded {
                    requested: *requested,
                    limit: *limit,
                })
            }
        }
    }
}

impl std::fmt::Display for ValidationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.to_error() {
            None => f.write_str("License is valid"),
            Some(err) => write!(f, "{}", err),
        }
    }
}

/// License validation result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    /// Whether the license is valid.
    pub valid: bool,
    /// Why.
    pub reason: ValidationReason,
    /// The evaluated license.
    pub license_id: LicenseId,
    /// The instant the license was evaluated at.
    pub evaluated_at: DateTime<Utc>,
}

impl ValidationResult {
    pub fn success(license_id: LicenseId, evaluated_at: DateTime<Utc>) -> Self {
        Self {
            valid: true,
            reason: ValidationReason::Valid,
            license_id,
            evaluated_at,
        }
    }

    pub fn failure(
        reason: ValidationReason,
        license_id: LicenseId,
        evaluated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            valid: false,
            reason,
            license_id,
            evaluated_at,
        }
    }

    /// Turn a rejected result into the matching error.
    pub fn into_result(self) -> Result<()> {
        match self.reason.to_error() {
            None => Ok(()),
            Some(err) => Err(err),
        }
    }
}
