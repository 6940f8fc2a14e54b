//! Test helper functions and utilities.

use std::path::PathBuf;
use tempfile::TempDir;
use tessera_licensing::LicenseArtifact;

/// Encoding used when writing a license to disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Envelope,
    Compact,
}

/// A temporary directory holding license files. Removed on drop.
pub struct LicenseDir {
    dir: TempDir,
}

impl LicenseDir {
    pub fn new() -> anyhow::Result<Self> {
        Ok(Self {
            dir: tempfile::tempdir()?,
        })
    }

    /// Write an artifact under `name` and return its path.
    pub async fn write(
        &self,
        name: &str,
        artifact: &LicenseArtifact,
        encoding: Encoding,
    ) -> anyhow::Result<PathBuf> {
        let content = match encoding {
            Encoding::Envelope => artifact.to_json_pretty()?,
            Encoding::Compact => artifact.to_compact(),
        };
        self.write_raw(name, &content).await
    }

    /// Write arbitrary text, for malformed-file cases.
    pub async fn write_raw(&self, name: &str, content: &str) -> anyhow::Result<PathBuf> {
        let path = self.dir.path().join(name);
        tokio::fs::write(&path, content).await?;
        Ok(path)
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }
}
