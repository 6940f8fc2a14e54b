//! Business-rule evaluation of parsed licenses.
//!
//! Evaluation is a pure function of the license, the policy and the
//! caller-supplied instant. Rules run in a fixed order (product, validity
//! window, features, quantity) and the first failing rule decides the
//! reason.

use crate::types::{ParsedLicense, ValidationReason, ValidationResult};
use chrono::{DateTime, Duration, Utc};
use tessera_core::ProductId;
use tracing::{debug, info};

/// Constraints a caller places on an otherwise authentic license.
#[derive(Debug, Clone)]
pub struct Policy {
    expected_product: Option<ProductId>,
    required_features: Vec<String>,
    requested_quantity: Option<u64>,
    clock_skew: Duration,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            expected_product: None,
            required_features: Vec::new(),
            requested_quantity: None,
            clock_skew: Duration::zero(),
        }
    }
}

impl Policy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn expect_product(mut self, product: impl Into<ProductId>) -> Self {
        self.expected_product = Some(product.into());
        self
    }

    pub fn require_feature(mut self, code: impl Into<String>) -> Self {
        self.required_features.push(code.into());
        self
    }

    pub fn request_quantity(mut self, quantity: u64) -> Self {
        self.requested_quantity = Some(quantity);
        self
    }

    /// Widen the validity window by `skew` on both sides. Negative values
    /// are treated as zero.
    pub fn clock_skew(mut self, skew: Duration) -> Self {
        self.clock_skew = skew.max(Duration::zero());
        self
    }
}

/// Applies a [`Policy`] to parsed licenses.
#[derive(Debug, Clone, Default)]
pub struct Evaluator {
    policy: Policy,
}

impl Evaluator {
    pub fn new(policy: Policy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    /// Evaluate a license at `now`.
    pub fn evaluate(&self, license: &ParsedLicense, now: DateTime<Utc>) -> ValidationResult {
        let reason = self.first_violation(license, now);

        match reason {
            None => {
                info!(license_id = %license.license_id(), "License valid");
                ValidationResult::success(license.license_id(), now)
            }
            Some(reason) => {
                info!(license_id = %license.license_id(), reason = ?reason, "License rejected");
                ValidationResult::failure(reason, license.license_id(), now)
            }
        }
    }

    fn first_violation(
        &self,
        license: &ParsedLicense,
        now: DateTime<Utc>,
    ) -> Option<ValidationReason> {
        if let Some(expected) = &self.policy.expected_product
            && expected != license.product_id()
        {
            return Some(ValidationReason::ProductMismatch {
                expected: expected.clone(),
                actual: license.product_id().clone(),
            });
        }

        let skew = self.policy.clock_skew;
        let starts = license
            .valid_from()
            .checked_sub_signed(skew)
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let ends = license
            .valid_until()
            .checked_add_signed(skew)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        if now < starts {
            debug!(valid_from = %license.valid_from(), now = %now, "License not yet valid");
            return Some(ValidationReason::NotYetValid);
        }
        if now > ends {
            debug!(valid_until = %license.valid_until(), now = %now, "License has expired");
            return Some(ValidationReason::Expired);
        }

        if let Some(missing) = self
            .policy
            .required_features
            .iter()
            .find(|code| !license.has_feature(code))
        {
            return Some(ValidationReason::MissingFeature {
                feature: missing.clone(),
            });
        }

        if let Some(requested) = self.policy.requested_quantity
            && !license.check_quantity(requested)
        {
            return Some(ValidationReason::QuantityExceeded {
                requested,
                limit: license.quantity().unwrap_or(u64::MAX),
            });
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::SigningKey;
    use crate::types::LicenseClaims;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn license() -> ParsedLicense {
        let claims = LicenseClaims::builder("acme-desktop", at(2026, 1, 1), at(2027, 1, 1))
            .quantity(5)
            .feature("export")
            .build();
        let key_id = SigningKey::from_bytes(&[1u8; 32]).verify_key().id().clone();
        ParsedLicense::new(claims, key_id)
    }

    #[test]
    fn test_inside_window_is_valid() {
        let result = Evaluator::default().evaluate(&license(), at(2026, 6, 1));
        assert!(result.valid);
        assert_eq!(result.reason, ValidationReason::Valid);
        assert_eq!(result.evaluated_at, at(2026, 6, 1));
    }

    #[test]
    fn test_window_bounds_are_inclusive() {
        let evaluator = Evaluator::default();
        assert!(evaluator.evaluate(&license(), at(2026, 1, 1)).valid);
        assert!(evaluator.evaluate(&license(), at(2027, 1, 1)).valid);
    }

    #[test]
    fn test_before_window_is_not_yet_valid() {
        let result = Evaluator::default().evaluate(&license(), at(2025, 12, 31));
        assert!(!result.valid);
        assert_eq!(result.reason, ValidationReason::NotYetValid);
    }

    #[test]
    fn test_after_window_is_expired() {
        let just_after = at(2027, 1, 1) + Duration::seconds(1);
        let result = Evaluator::default().evaluate(&license(), just_after);
        assert!(!result.valid);
        assert_eq!(result.reason, ValidationReason::Expired);
    }

    #[test]
    fn test_clock_skew_widens_window() {
        let evaluator = Evaluator::new(Policy::new().clock_skew(Duration::minutes(5)));
        assert!(evaluator.evaluate(&license(), at(2027, 1, 1) + Duration::minutes(4)).valid);
        assert!(evaluator.evaluate(&license(), at(2026, 1, 1) - Duration::minutes(4)).valid);
        assert!(!evaluator.evaluate(&license(), at(2027, 1, 1) + Duration::minutes(6)).valid);
    }

    #[test]
    fn test_negative_skew_is_ignored() {
        let evaluator = Evaluator::new(Policy::new().clock_skew(Duration::days(-1)));
        assert!(evaluator.evaluate(&license(), at(2027, 1, 1)).valid);
    }

    #[test]
    fn test_product_mismatch() {
        let evaluator = Evaluator::new(Policy::new().expect_product("acme-server"));
        let result = evaluator.evaluate(&license(), at(2026, 6, 1));
        assert_eq!(
            result.reason,
            ValidationReason::ProductMismatch {
                expected: "acme-server".into(),
                actual: "acme-desktop".into(),
            }
        );
    }

    #[test]
    fn test_product_checked_before_window() {
        let evaluator = Evaluator::new(Policy::new().expect_product("acme-server"));
        let result = evaluator.evaluate(&license(), at(2030, 1, 1));
        assert!(matches!(
            result.reason,
            ValidationReason::ProductMismatch { .. }
        ));
    }

    #[test]
    fn test_missing_feature() {
        let evaluator = Evaluator::new(
            Policy::new()
                .require_feature("export")
                .require_feature("sso"),
        );
        let result = evaluator.evaluate(&license(), at(2026, 6, 1));
        assert_eq!(
            result.reason,
            ValidationReason::MissingFeature {
                feature: "sso".to_string()
            }
        );
    }

    #[test]
    fn test_quantity_limits() {
        let within = Evaluator::new(Policy::new().request_quantity(5));
        assert!(within.evaluate(&license(), at(2026, 6, 1)).valid);

        let over = Evaluator::new(Policy::new().request_quantity(6));
        assert_eq!(
            over.evaluate(&license(), at(2026, 6, 1)).reason,
            ValidationReason::QuantityExceeded {
                requested: 6,
                limit: 5
            }
        );
    }

    #[test]
    fn test_into_result_maps_reasons() {
        let expired = Evaluator::default().evaluate(&license(), at(2030, 1, 1));
        assert!(matches!(
            expired.into_result(),
            Err(tessera_core::Error::Expired)
        ));

        let early = Evaluator::default().evaluate(&license(), at(2020, 1, 1));
        assert!(matches!(
            early.into_result(),
            Err(tessera_core::Error::NotYetValid)
        ));

        let ok = Evaluator::default().evaluate(&license(), at(2026, 6, 1));
        assert!(ok.into_result().is_ok());
    }
}
