//! License document parsing.

use crate::types::{LicenseClaims, ParsedLicense};
use crate::verifier::VerifiedPayload;
use tessera_core::{Error, Result};
use tracing::debug;

/// Parse a verified payload into a license.
pub fn parse(payload: &VerifiedPayload) -> Result<ParsedLicense> {
    let claims = LicenseClaims::from_json_slice(payload.as_bytes())?;
    debug!(license_id = %claims.license_id, product = %claims.product_id, "License parsed");
    Ok(ParsedLicense::new(claims, payload.key_id().clone()))
}

impl LicenseClaims {
    /// Decode claims from their JSON wire form and check them.
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self> {
        let claims: LicenseClaims = serde_json::from_slice(bytes)
            .map_err(|e| Error::MalformedArtifact(format!("Invalid license format: {}", e)))?;
        claims.check()?;
        Ok(claims)
    }

    /// Encode claims into their JSON wire form.
    pub fn to_json_vec(&self) -> Result<Vec<u8>> {
        self.check()?;
        Ok(serde_json::to_vec(self)?)
    }

    /// Check the structural rules every license must satisfy.
    pub fn check(&self) -> Result<()> {
        if self.product_id.is_empty() {
            return Err(Error::MalformedArtifact(
                "productId must not be empty".to_string(),
            ));
        }
        if self.valid_from > self.valid_until {
            return Err(Error::MalformedArtifact(format!(
                "validFrom {} is after validUntil {}",
                self.valid_from, self.valid_until
            )));
        }
        if self.quantity == Some(0) {
            return Err(Error::MalformedArtifact(
                "quantity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn claims() -> LicenseClaims {
        LicenseClaims::builder(
            "acme-desktop",
            Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2027, 1, 1, 0, 0, 0).unwrap(),
        )
        .licensee("Acme Corp")
        .quantity(5)
        .feature("export")
        .property("tier", "gold")
        .build()
    }

    #[test]
    fn test_claims_roundtrip() {
        let original = claims();
        let bytes = original.to_json_vec().unwrap();
        let parsed = LicenseClaims::from_json_slice(&bytes).unwrap();
        assert_eq!(parsed, original);
    }

    #[test]
    fn test_wire_form_uses_camel_case() {
        let json: serde_json::Value =
            serde_json::from_slice(&claims().to_json_vec().unwrap()).unwrap();
        assert!(json.get("productId").is_some());
        assert!(json.get("validUntil").is_some());
        assert!(json.get("product_id").is_none());
    }

    #[test]
    fn test_parsed_license_serializes_camel_case() {
        let signer = crate::SigningKey::from_bytes(&[4u8; 32]).verify_key();
        let license = ParsedLicense::new(claims(), signer.id().clone());
        let json = serde_json::to_value(&license).unwrap();

        assert_eq!(json["signedBy"], signer.id().as_str());
        assert_eq!(json["productId"], "acme-desktop");
        assert!(json.get("signed_by").is_none());
    }

    #[test]
    fn test_missing_field_is_malformed() {
        let json = br#"{"licenseId":"0190a8a0-0000-7000-8000-000000000000","productId":"p","validFrom":"2026-01-01T00:00:00Z"}"#;
        let err = LicenseClaims::from_json_slice(json).unwrap_err();
        assert!(matches!(err, Error::MalformedArtifact(_)));
    }

    #[test]
    fn test_wrong_type_is_malformed() {
        let json = br#"{"licenseId":"0190a8a0-0000-7000-8000-000000000000","productId":42,"validFrom":"2026-01-01T00:00:00Z","validUntil":"2027-01-01T00:00:00Z"}"#;
        let err = LicenseClaims::from_json_slice(json).unwrap_err();
        assert!(matches!(err, Error::MalformedArtifact(_)));
    }

    #[test]
    fn test_optional_fields_default() {
        let json = br#"{"licenseId":"0190a8a0-0000-7000-8000-000000000000","productId":"p","validFrom":"2026-01-01T00:00:00Z","validUntil":"2027-01-01T00:00:00Z","futureField":true}"#;
        let claims = LicenseClaims::from_json_slice(json).unwrap();
        assert!(claims.features.is_empty());
        assert!(claims.properties.is_empty());
        assert_eq!(claims.quantity, None);
    }

    #[test]
    fn test_inverted_window_is_malformed() {
        let mut bad = claims();
        std::mem::swap(&mut bad.valid_from, &mut bad.valid_until);
        assert!(matches!(bad.check(), Err(Error::MalformedArtifact(_))));
    }

    #[test]
    fn test_zero_quantity_is_malformed() {
        let mut bad = claims();
        bad.quantity = Some(0);
        assert!(matches!(bad.to_json_vec(), Err(Error::MalformedArtifact(_))));
    }

    #[test]
    fn test_empty_product_is_malformed() {
        let mut bad = claims();
        bad.product_id = "".into();
        assert!(matches!(bad.check(), Err(Error::MalformedArtifact(_))));
    }

    #[test]
    fn test_non_json_is_malformed() {
        let err = LicenseClaims::from_json_slice(b"\xff\xfe not json").unwrap_err();
        assert!(matches!(err, Error::MalformedArtifact(_)));
    }
}
