//! End-to-end offline validation tests against license files on disk.
//!
//! Run with: `cargo test -p tessera-tests`

use chrono::Duration;
use pretty_assertions::assert_eq;
use tessera_core::Error;
use tessera_licensing::{KeyRing, OfflineValidator, Policy, ValidationReason};
use tessera_tests::{
    Encoding, LicenseDir, LicenseFixture, TestIssuer, init_test_logging, reference_now,
};

fn validator(issuer: &TestIssuer) -> OfflineValidator {
    OfflineValidator::new(issuer.keyring(), Policy::new())
}

#[tokio::test]
async fn test_fixture_outcomes_in_both_encodings() {
    init_test_logging();
    let issuer = TestIssuer::primary();
    let dir = LicenseDir::new().expect("tempdir");

    let cases = [
        ("active", LicenseFixture::active(), ValidationReason::Valid),
        ("expired", LicenseFixture::expired(), ValidationReason::Expired),
        (
            "future",
            LicenseFixture::not_yet_valid(),
            ValidationReason::NotYetValid,
        ),
        ("enterprise", LicenseFixture::enterprise(), ValidationReason::Valid),
    ];

    for (name, claims, expected) in cases {
        let artifact = issuer.issue(&claims);
        for encoding in [Encoding::Envelope, Encoding::Compact] {
            let path = dir
                .write(&format!("{name}-{encoding:?}.lic"), &artifact, encoding)
                .await
                .expect("write license");

            let result = validator(&issuer)
                .validate_file(&path, reference_now())
                .await
                .expect("authentic license");

            assert_eq!(result.reason, expected, "{name} ({encoding:?})");
            assert_eq!(result.valid, expected == ValidationReason::Valid);
            assert_eq!(result.license_id, claims.license_id);
        }
    }
}

#[tokio::test]
async fn test_untrusted_issuer_is_rejected() {
    init_test_logging();
    let trusted = TestIssuer::primary();
    let rogue = TestIssuer::secondary();
    let dir = LicenseDir::new().expect("tempdir");

    let path = dir
        .write(
            "rogue.json",
            &rogue.issue(&LicenseFixture::active()),
            Encoding::Envelope,
        )
        .await
        .expect("write license");

    let err = validator(&trusted)
        .validate_file(&path, reference_now())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidSignature(_)));
}

#[tokio::test]
async fn test_rotated_keys_accept_both_issuers() {
    init_test_logging();
    let old = TestIssuer::primary();
    let new = TestIssuer::secondary();
    let dir = LicenseDir::new().expect("tempdir");

    let validator = OfflineValidator::from_encoded_keys(
        [old.verify_key_base64(), new.verify_key_base64()],
        Policy::new(),
    )
    .expect("keys");

    for (name, issuer) in [("old.json", &old), ("new.lic", &new)] {
        let encoding = if name.ends_with(".json") {
            Encoding::Envelope
        } else {
            Encoding::Compact
        };
        let path = dir
            .write(name, &issuer.issue(&LicenseFixture::active()), encoding)
            .await
            .expect("write license");
        let result = validator
            .validate_file(&path, reference_now())
            .await
            .expect("authentic license");
        assert!(result.valid, "{name}");
    }
}

#[tokio::test]
async fn test_garbage_file_is_malformed() {
    init_test_logging();
    let dir = LicenseDir::new().expect("tempdir");
    let issuer = TestIssuer::primary();

    for (name, content) in [
        ("empty.lic", ""),
        ("truncated.json", r#"{"version": 1, "data": "#),
        ("wrong-version.json", r#"{"version": 9, "data": "e30=", "signature": "AAAA"}"#),
        ("three-parts.lic", "a.b.c"),
    ] {
        let path = dir.write_raw(name, content).await.expect("write");
        let err = validator(&issuer)
            .validate_file(&path, reference_now())
            .await
            .unwrap_err();
        assert!(
            matches!(err, Error::MalformedArtifact(_)),
            "{name}: unexpected {err:?}"
        );
    }
}

#[tokio::test]
async fn test_missing_file() {
    let dir = LicenseDir::new().expect("tempdir");
    let err = validator(&TestIssuer::primary())
        .validate_file(&dir.path("nope.json"), reference_now())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Io(_)));
}

#[test]
fn test_enterprise_policy() {
    init_test_logging();
    let issuer = TestIssuer::primary();
    let artifact = issuer.issue(&LicenseFixture::enterprise());

    let policy = Policy::new()
        .expect_product(LicenseFixture::PRODUCT)
        .require_feature("sso")
        .require_feature("audit-log")
        .request_quantity(25);
    let result = OfflineValidator::new(issuer.keyring(), policy)
        .validate(&artifact, reference_now())
        .expect("authentic license");
    assert!(result.valid);

    let license = validator(&issuer)
        .verify_and_parse(&artifact)
        .expect("authentic license");
    assert_eq!(license.property("tier"), Some("enterprise"));
    assert_eq!(license.quantity(), Some(25));
    assert!(license.check_quantity(25));
    assert!(!license.check_quantity(26));
}

#[test]
fn test_clock_skew_rescues_recently_expired() {
    let issuer = TestIssuer::primary();
    let artifact = issuer.issue(&LicenseFixture::expired());

    let lenient = OfflineValidator::new(
        issuer.keyring(),
        Policy::new().clock_skew(Duration::days(2)),
    );
    assert!(
        lenient
            .validate(&artifact, reference_now())
            .expect("authentic license")
            .valid
    );
}

#[test]
fn test_empty_keyring_rejects_everything() {
    let issuer = TestIssuer::primary();
    let artifact = issuer.issue(&LicenseFixture::active());
    let err = OfflineValidator::new(KeyRing::new(), Policy::new())
        .validate(&artifact, reference_now())
        .unwrap_err();
    assert!(matches!(err, Error::InvalidSignature(_)));
}
