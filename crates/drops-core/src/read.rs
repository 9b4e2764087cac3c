use std::io;

use bytes::Bytes;
use futures_util::StreamExt;
use futures_util::stream::FuturesUnordered;
use tracing::debug;

use crate::file::{DroppedFile, FileInfo};

/// A file whose bytes are in memory and ready to upload.
#[derive(Debug, Clone)]
pub struct ReadyFile {
    pub info: FileInfo,
    pub bytes: Bytes,
}

/// Result of reading a whole batch.
#[derive(Debug, Default)]
pub struct ReadBatch {
    /// Readable files in the order their reads finished.
    pub ready: Vec<ReadyFile>,
    pub failed: Vec<(FileInfo, io::Error)>,
}

/// Read every file at once and resolve when all reads have finished.
pub async fn read_all(files: &[DroppedFile]) -> ReadBatch {
    if files.is_empty() {
        return ReadBatch::default();
    }

    let mut reads: FuturesUnordered<_> = files
        .iter()
        .map(|file| async move {
            let info = file.info();
            let result = file.read().await;
            (info, result)
        })
        .collect();

    let mut batch = ReadBatch {
        ready: Vec::with_capacity(files.len()),
        failed: Vec::new(),
    };

    while let Some((info, result)) = reads.next().await {
        match result {
            Ok(bytes) => {
                debug!("Read {} ({} bytes)", info.name, bytes.len());
                let info = FileInfo {
                    size: bytes.len() as u64,
                    ..info
                };
                batch.ready.push(ReadyFile { info, bytes });
            }
            Err(e) => batch.failed.push((info, e)),
        }
    }

    batch
}
