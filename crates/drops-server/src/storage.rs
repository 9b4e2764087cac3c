use anyhow::{Result, bail};
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::info;
use uuid::Uuid;

/// Where received uploads are written.
///
/// Each upload is stored as a flat file at `{dir}/{uuid}-{sanitized name}`,
/// so two drops of the same name never overwrite each other.
pub struct Storage {
    dir: PathBuf,
}

/// Result of persisting one upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Saved {
    pub stored_as: String,
    pub size: u64,
    pub sha256: String,
}

impl Storage {
    pub async fn new(dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&dir).await?;
        info!("Upload storage directory: {}", dir.display());
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }

    /// Write `data` under a unique name derived from `file_name`.
    pub async fn save(&self, file_name: &str, data: &[u8]) -> Result<Saved> {
        let stored_as = format!("{}-{}", Uuid::new_v4(), sanitize_file_name(file_name));
        let path = self.dir.join(&stored_as);

        let mut file = fs::File::create(&path).await?;
        file.write_all(data).await?;
        file.flush().await?;

        let mut hasher = Sha256::new();
        hasher.update(data);

        Ok(Saved {
            stored_as,
            size: data.len() as u64,
            sha256: hex::encode(hasher.finalize()),
        })
    }

    /// Read back a stored upload.
    pub async fn load(&self, stored_as: &str) -> Result<Vec<u8>> {
        if stored_as != sanitize_file_name(stored_as) {
            bail!("Refusing to read {:?} outside the storage directory", stored_as);
        }
        Ok(fs::read(self.dir.join(stored_as)).await?)
    }
}

/// Reduce a client-supplied name to a single safe path component.
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '.' | '-' | '_' | ' ') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim().trim_start_matches('.');

    if cleaned.is_empty() {
        "upload.bin".to_string()
    } else {
        cleaned.to_string()
    }
}
