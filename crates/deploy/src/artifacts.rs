//! Compiled contract artifacts.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::DeployError;

/// Compiled wasm bytecode for one logical contract.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub name: String,
    pub bytes: Vec<u8>,
    /// Hex SHA-256 of the bytecode, the checksum the chain records for stored code.
    pub checksum: String,
}

/// Directory of `<name>.wasm` artifacts.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Location of the artifact for a logical contract name.
    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.wasm", name))
    }

    /// Read the full bytecode for `name`.
    ///
    /// Absent and empty files are both reported as [`DeployError::ArtifactNotFound`].
    pub async fn load(&self, name: &str) -> Result<Artifact, DeployError> {
        let path = self.path(name);

        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) if !bytes.is_empty() => bytes,
            Ok(_) => {
                tracing::warn!(path = %path.display(), "Artifact is empty");
                return Err(DeployError::ArtifactNotFound {
                    name: name.to_string(),
                    path,
                });
            }
            Err(e) => {
                tracing::debug!(err = %e, path = %path.display(), "Failed to read artifact");
                return Err(DeployError::ArtifactNotFound {
                    name: name.to_string(),
                    path,
                });
            }
        };

        let checksum = hex::encode(Sha256::digest(&bytes));
        tracing::debug!(name, checksum, size = bytes.len(), "Loaded artifact");

        Ok(Artifact {
            name: name.to_string(),
            bytes,
            checksum,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    #[tokio::test]
    async fn test_load_artifact() {
        let temp_dir = TempDir::new("cosmup-test").expect("Failed to create temp dir");
        std::fs::write(temp_dir.path().join("price_feed.wasm"), b"\0asm").unwrap();

        let store = ArtifactStore::new(temp_dir.path());
        let artifact = store.load("price_feed").await.unwrap();

        assert_eq!(artifact.bytes, b"\0asm");
        assert_eq!(
            artifact.checksum,
            hex::encode(Sha256::digest(b"\0asm")),
        );
    }

    #[tokio::test]
    async fn test_missing_artifact() {
        let temp_dir = TempDir::new("cosmup-test").expect("Failed to create temp dir");
        let store = ArtifactStore::new(temp_dir.path());

        let err = store.load("price_collector").await.unwrap_err();
        match err {
            DeployError::ArtifactNotFound { name, path } => {
                assert_eq!(name, "price_collector");
                assert_eq!(path, temp_dir.path().join("price_collector.wasm"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_empty_artifact_is_not_found() {
        let temp_dir = TempDir::new("cosmup-test").expect("Failed to create temp dir");
        std::fs::write(temp_dir.path().join("minter.wasm"), b"").unwrap();

        let store = ArtifactStore::new(temp_dir.path());
        assert!(matches!(
            store.load("minter").await,
            Err(DeployError::ArtifactNotFound { .. })
        ));
    }
}
