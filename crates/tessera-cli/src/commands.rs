//! CLI command definitions.

use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Generate an Ed25519 signing keypair
    Keygen {
        /// Directory to write tessera.key and tessera.pub into
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },

    /// Sign a new license
    Issue {
        /// File holding the base64 signing key
        #[arg(long)]
        signing_key: PathBuf,

        /// Product the license unlocks
        #[arg(long)]
        product: String,

        /// Start of the validity window (RFC 3339 or YYYY-MM-DD)
        #[arg(long)]
        valid_from: String,

        /// End of the validity window (RFC 3339 or YYYY-MM-DD)
        #[arg(long)]
        valid_until: String,

        /// Licensee name
        #[arg(long)]
        licensee: Option<String>,

        /// Licensed seat count
        #[arg(long)]
        quantity: Option<u64>,

        /// Enabled feature (repeatable)
        #[arg(long = "feature")]
        features: Vec<String>,

        /// Custom property as KEY=VALUE (repeatable)
        #[arg(long = "property")]
        properties: Vec<String>,

        /// Emit a compact token instead of a JSON license file
        #[arg(long)]
        compact: bool,

        /// Write the license here instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Validate a license file offline
    Validate {
        /// Path to license file
        #[arg(default_value = "license.json")]
        path: PathBuf,

        /// Trusted verify key (repeatable; overrides config)
        #[arg(long = "verify-key")]
        verify_keys: Vec<String>,

        /// Require the license to be for this product
        #[arg(long)]
        product: Option<String>,

        /// Require this feature (repeatable)
        #[arg(long = "feature")]
        features: Vec<String>,

        /// Require at least this many seats
        #[arg(long)]
        quantity: Option<u64>,

        /// Evaluate at this instant instead of now
        #[arg(long)]
        at: Option<String>,
    },

    /// Verify a license file and print its contents
    Inspect {
        /// Path to license file
        #[arg(default_value = "license.json")]
        path: PathBuf,

        /// Trusted verify key (repeatable; overrides config)
        #[arg(long = "verify-key")]
        verify_keys: Vec<String>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Set a configuration value
    Set {
        /// Key: trusted_key, product, clock_skew_seconds, output_format
        key: String,

        /// Value
        value: String,
    },
}
