//! Test fixtures for creating sample licenses.

use chrono::{DateTime, Duration, TimeZone, Utc};
use tessera_licensing::{KeyRing, LicenseArtifact, LicenseClaims, LicenseIssuer, SigningKey};

/// The instant fixtures are built around: 2026-06-15T12:00:00Z.
pub fn reference_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 6, 15, 12, 0, 0)
        .single()
        .expect("valid reference instant")
}

/// Deterministic issuers backed by fixed seeds.
pub struct TestIssuer {
    issuer: LicenseIssuer,
}

impl TestIssuer {
    pub fn primary() -> Self {
        Self::from_seed(0x11)
    }

    /// A second issuer, used as the rotated-in key or as an untrusted one.
    pub fn secondary() -> Self {
        Self::from_seed(0x22)
    }

    fn from_seed(byte: u8) -> Self {
        Self {
            issuer: LicenseIssuer::new(SigningKey::from_bytes(&[byte; 32])),
        }
    }

    /// Sign claims, panicking on claims the issuer refuses.
    pub fn issue(&self, claims: &LicenseClaims) -> LicenseArtifact {
        self.issuer
            .issue(claims)
            .expect("Failed to issue fixture license")
    }

    /// A key ring trusting only this issuer.
    pub fn keyring(&self) -> KeyRing {
        KeyRing::new().with_key(self.issuer.verify_key())
    }

    pub fn verify_key_base64(&self) -> String {
        self.issuer.verify_key().to_base64()
    }
}

/// Factory for creating test license claims.
pub struct LicenseFixture;

impl LicenseFixture {
    pub const PRODUCT: &'static str = "acme-desktop";

    /// Valid for 30 days either side of [`reference_now`].
    pub fn active() -> LicenseClaims {
        let now = reference_now();
        LicenseClaims::builder(Self::PRODUCT, now - Duration::days(30), now + Duration::days(30))
            .licensee("Test License")
            .issued_at(now - Duration::days(31))
            .build()
    }

    /// Ended a day before [`reference_now`].
    pub fn expired() -> LicenseClaims {
        let now = reference_now();
        LicenseClaims::builder(Self::PRODUCT, now - Duration::days(365), now - Duration::days(1))
            .licensee("Lapsed Customer")
            .build()
    }

    /// Starts a day after [`reference_now`].
    pub fn not_yet_valid() -> LicenseClaims {
        let now = reference_now();
        LicenseClaims::builder(Self::PRODUCT, now + Duration::days(1), now + Duration::days(366))
            .licensee("Early Bird")
            .build()
    }

    /// A seat-limited license with features and custom properties.
    pub fn enterprise() -> LicenseClaims {
        let now = reference_now();
        LicenseClaims::builder(Self::PRODUCT, now - Duration::days(90), now + Duration::days(275))
            .licensee("Acme Corp")
            .quantity(25)
            .feature("export")
            .feature("sso")
            .feature("audit-log")
            .property("tier", "enterprise")
            .property("support", "24x7")
            .issued_at(now - Duration::days(91))
            .build()
    }
}
