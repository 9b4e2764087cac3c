use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

/// Name and length of a dropped file, as handed to every hook.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileInfo {
    pub name: String,
    pub size: u64,
}

/// A file supplied by the host environment.
///
/// The engine never owns the underlying file; it only asks for its bytes once
/// per upload attempt.
#[async_trait]
pub trait FileSource: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    fn size(&self) -> u64;

    /// Materialize the whole file in memory.
    async fn read(&self) -> io::Result<Bytes>;

    fn info(&self) -> FileInfo {
        FileInfo {
            name: self.name().to_string(),
            size: self.size(),
        }
    }
}

/// One entry of a drop payload.
pub type DroppedFile = Arc<dyn FileSource>;

/// A file on the local filesystem, read through `tokio::fs`.
#[derive(Debug, Clone)]
pub struct LocalFile {
    path: PathBuf,
    name: String,
    size: u64,
}

impl LocalFile {
    /// Stat `path` and capture its name and length.
    pub async fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let metadata = tokio::fs::metadata(&path).await?;
        if !metadata.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is not a regular file", path.display()),
            ));
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(Self {
            path,
            name,
            size: metadata.len(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn into_dropped(self) -> DroppedFile {
        Arc::new(self)
    }
}

#[async_trait]
impl FileSource for LocalFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn size(&self) -> u64 {
        self.size
    }

    async fn read(&self) -> io::Result<Bytes> {
        tokio::fs::read(&self.path).await.map(Bytes::from)
    }
}

/// A file whose contents are already in memory (clipboard pastes, generated data).
#[derive(Debug, Clone)]
pub struct MemoryFile {
    name: String,
    bytes: Bytes,
}

impl MemoryFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    pub fn into_dropped(self) -> DroppedFile {
        Arc::new(self)
    }
}

#[async_trait]
impl FileSource for MemoryFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    async fn read(&self) -> io::Result<Bytes> {
        Ok(self.bytes.clone())
    }
}
