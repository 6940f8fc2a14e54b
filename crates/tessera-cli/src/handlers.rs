//! Command handlers.

use crate::config::{CliConfig, OutputFormat};
use anyhow::{Context, anyhow, bail};
use chrono::{DateTime, NaiveDate, Utc};
use console::style;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tessera_licensing::offline::load_artifact;
use tessera_licensing::{
    LicenseClaims, LicenseIssuer, OfflineValidator, ParsedLicense, SigningKey, ValidationResult,
};
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Generate a signing keypair.
pub async fn keygen(out_dir: Option<PathBuf>) -> anyhow::Result<()> {
    let signing_key = SigningKey::generate();
    let verify_key = signing_key.verify_key();

    match out_dir {
        Some(dir) => {
            tokio::fs::create_dir_all(&dir).await?;
            let key_path = dir.join("tessera.key");
            let pub_path = dir.join("tessera.pub");
            if key_path.exists() {
                bail!("{} already exists", key_path.display());
            }
            write_secret(&key_path, &signing_key.export_base64()).await?;
            tokio::fs::write(&pub_path, verify_key.to_base64()).await?;
            println!(
                "{} Wrote {} and {}",
                style("✓").green(),
                key_path.display(),
                pub_path.display()
            );
        }
        None => {
            println!("signing key: {}", signing_key.export_base64());
        }
    }

    println!("verify key:  {}", verify_key.to_base64());
    println!("key id:      {}", style(verify_key.id()).bold());
    Ok(())
}

/// Write a private key file readable only by its owner.
async fn write_secret(path: &Path, contents: &str) -> anyhow::Result<()> {
    let mut options = tokio::fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    options.mode(0o600);

    let mut file = options
        .open(path)
        .await
        .with_context(|| format!("creating {}", path.display()))?;
    file.write_all(contents.as_bytes()).await?;
    file.flush().await?;
    Ok(())
}

/// Options for issuing a license.
pub struct IssueArgs {
    pub signing_key: PathBuf,
    pub product: String,
    pub valid_from: String,
    pub valid_until: String,
    pub licensee: Option<String>,
    pub quantity: Option<u64>,
    pub features: Vec<String>,
    pub properties: Vec<String>,
    pub compact: bool,
    pub out: Option<PathBuf>,
}

/// Sign a new license.
pub async fn issue(args: IssueArgs) -> anyhow::Result<()> {
    let encoded = tokio::fs::read_to_string(&args.signing_key)
        .await
        .with_context(|| format!("reading {}", args.signing_key.display()))?;
    let issuer = LicenseIssuer::new(SigningKey::from_base64(&encoded)?);

    let mut builder = LicenseClaims::builder(
        args.product,
        parse_timestamp(&args.valid_from)?,
        parse_timestamp(&args.valid_until)?,
    )
    .issued_at(Utc::now());
    if let Some(licensee) = args.licensee {
        builder = builder.licensee(licensee);
    }
    if let Some(quantity) = args.quantity {
        builder = builder.quantity(quantity);
    }
    for feature in args.features {
        builder = builder.feature(feature);
    }
    for property in &args.properties {
        let (key, value) = parse_property(property)?;
        builder = builder.property(key, value);
    }
    let claims = builder.build();

    let artifact = issuer.issue(&claims)?;
    let rendered = if args.compact {
        artifact.to_compact()
    } else {
        artifact.to_json_pretty()?
    };

    match args.out {
        Some(path) => {
            tokio::fs::write(&path, format!("{}\n", rendered)).await?;
            println!(
                "{} Issued {} to {}",
                style("✓").green(),
                style(claims.license_id).bold(),
                path.display()
            );
        }
        None => println!("{}", rendered),
    }
    Ok(())
}

/// Options for validating a license.
pub struct ValidateArgs {
    pub path: PathBuf,
    pub verify_keys: Vec<String>,
    pub product: Option<String>,
    pub features: Vec<String>,
    pub quantity: Option<u64>,
    pub at: Option<String>,
}

/// Validate a license file. Returns whether the license is valid.
pub async fn validate(config: &CliConfig, args: ValidateArgs) -> anyhow::Result<bool> {
    let keyring = config.keyring(&args.verify_keys)?;
    if keyring.is_empty() {
        bail!("No trusted verify keys; pass --verify-key or run `tessera config set trusted_key <KEY>`");
    }

    let mut policy = config.policy();
    if let Some(product) = args.product {
        policy = policy.expect_product(product);
    }
    for feature in args.features {
        policy = policy.require_feature(feature);
    }
    if let Some(quantity) = args.quantity {
        policy = policy.request_quantity(quantity);
    }

    let now = match args.at {
        Some(at) => parse_timestamp(&at)?,
        None => Utc::now(),
    };
    debug!(path = %args.path.display(), now = %now, "Validating license file");

    let validator = OfflineValidator::new(keyring, policy);
    let result = validator.validate_file(&args.path, now).await?;

    print_result(config.output_format, &result)?;
    Ok(result.valid)
}

/// Verify a license file and print its contents.
pub async fn inspect(config: &CliConfig, path: &Path, verify_keys: &[String]) -> anyhow::Result<()> {
    let keyring = config.keyring(verify_keys)?;
    if keyring.is_empty() {
        bail!("No trusted verify keys; pass --verify-key or run `tessera config set trusted_key <KEY>`");
    }

    let artifact = load_artifact(path).await?;
    let validator = OfflineValidator::new(keyring, config.policy());
    let license = validator.verify_and_parse(&artifact)?;

    print_license(config.output_format, &license)
}

/// Show configuration.
pub fn show_config(config: &CliConfig) -> anyhow::Result<()> {
    println!("Configuration:");
    println!("  Path: {}", CliConfig::config_path()?.display());
    println!(
        "  Product: {}",
        config.product.as_deref().unwrap_or("(any)")
    );
    println!("  Clock skew: {}s", config.clock_skew_seconds);
    println!("  Output format: {:?}", config.output_format);
    println!("  Trusted keys: {}", config.trusted_keys.len());
    for key in &config.trusted_keys {
        println!("    - {}", key);
    }
    Ok(())
}

/// Set configuration value.
pub fn set_config(key: &str, value: &str) -> anyhow::Result<()> {
    let mut config = CliConfig::load()?;
    config.set(key, value)?;
    config.save()?;
    println!("{} Set {} = {}", style("✓").green(), key, value);
    Ok(())
}

fn print_result(format: OutputFormat, result: &ValidationResult) -> anyhow::Result<()> {
    if let Some(rendered) = render_structured(format, result)? {
        print!("{}", rendered);
        return Ok(());
    }

    if result.valid {
        println!("{} License {} is valid", style("✓").green(), result.license_id);
    } else {
        println!(
            "{} License {} is not valid: {}",
            style("✗").red(),
            result.license_id,
            result.reason
        );
    }
    println!("  Evaluated at: {}", result.evaluated_at.to_rfc3339());
    Ok(())
}

fn print_license(format: OutputFormat, license: &ParsedLicense) -> anyhow::Result<()> {
    if let Some(rendered) = render_structured(format, license)? {
        print!("{}", rendered);
        return Ok(());
    }

    println!("{} Signature verified", style("✓").green());
    println!("  License:     {}", style(license.license_id()).bold());
    println!("  Product:     {}", license.product_id());
    println!("  Licensee:    {}", license.licensee().unwrap_or("-"));
    println!(
        "  Quantity:    {}",
        license
            .quantity()
            .map_or_else(|| "unlimited".to_string(), |q| q.to_string())
    );
    println!("  Valid from:  {}", license.valid_from().to_rfc3339());
    println!("  Valid until: {}", license.valid_until().to_rfc3339());
    println!("  Signed by:   {}", license.signed_by());
    if !license.features().is_empty() {
        println!("  Features:");
        for feature in license.features() {
            println!("    - {}", feature);
        }
    }
    if !license.properties().is_empty() {
        println!("  Properties:");
        for (key, value) in license.properties() {
            println!("    {}: {}", key, value);
        }
    }
    Ok(())
}

/// Render JSON or YAML output. Table output is left to the caller.
fn render_structured<T: Serialize>(format: OutputFormat, value: &T) -> anyhow::Result<Option<String>> {
    Ok(match format {
        OutputFormat::Table => None,
        OutputFormat::Json => Some(format!("{}\n", serde_json::to_string_pretty(value)?)),
        OutputFormat::Yaml => Some(serde_yaml::to_string(value)?),
    })
}

/// Parse an RFC 3339 timestamp or a bare `YYYY-MM-DD` date (midnight UTC).
fn parse_timestamp(input: &str) -> anyhow::Result<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(input) {
        return Ok(ts.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .with_context(|| format!("Invalid timestamp: {}", input))?;
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| anyhow!("Invalid timestamp: {}", input))?;
    Ok(midnight.and_utc())
}

fn parse_property(input: &str) -> anyhow::Result<(&str, &str)> {
    match input.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key, value)),
        _ => bail!("Invalid property {:?}, expected KEY=VALUE", input),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_timestamp_forms() {
        assert_eq!(
            parse_timestamp("2026-03-01").unwrap(),
            Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap()
        );
        assert_eq!(
            parse_timestamp("2026-03-01T10:30:00+02:00").unwrap(),
            Utc.with_ymd_and_hms(2026, 3, 1, 8, 30, 0).unwrap()
        );
        assert!(parse_timestamp("yesterday").is_err());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_keygen_signing_key_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        keygen(Some(dir.path().to_path_buf())).await.unwrap();

        let key_path = dir.path().join("tessera.key");
        let mode = std::fs::metadata(&key_path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);

        let encoded = std::fs::read_to_string(&key_path).unwrap();
        let signing_key = SigningKey::from_base64(&encoded).unwrap();
        let published = std::fs::read_to_string(dir.path().join("tessera.pub")).unwrap();
        assert_eq!(published, signing_key.verify_key().to_base64());

        assert!(keygen(Some(dir.path().to_path_buf())).await.is_err());
    }

    #[test]
    fn test_parse_property() {
        assert_eq!(parse_property("tier=gold").unwrap(), ("tier", "gold"));
        assert_eq!(parse_property("note=a=b").unwrap(), ("note", "a=b"));
        assert!(parse_property("novalue").is_err());
        assert!(parse_property("=x").is_err());
    }
}
