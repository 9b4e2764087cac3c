use std::sync::Arc;

use tracing::{info, warn};

use crate::config::UploadOptions;
use crate::file::DroppedFile;
use crate::read::read_all;
use crate::transport::Transport;
use crate::upload::upload_all;

/// Settlement count for one batch of uploads.
///
/// A batch of zero is done from the start; otherwise exactly one call to
/// `settle` reports that the last file has settled. Only the task draining
/// the batch's uploads touches it.
#[derive(Debug)]
pub(crate) struct BatchCounter {
    total: usize,
    settled: usize,
}

impl BatchCounter {
    pub(crate) fn new(total: usize) -> Self {
        Self { total, settled: 0 }
    }

    /// Record one settled file. Returns true for the settlement that completes the batch.
    pub(crate) fn settle(&mut self) -> bool {
        self.settled += 1;
        self.settled == self.total
    }

    pub(crate) fn is_done(&self) -> bool {
        self.settled >= self.total
    }
}

/// Counts for a processed drop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Files in the drop.
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Files whose bytes could not be read; never uploaded.
    pub unreadable: usize,
}

/// Read and upload one dropped batch.
///
/// Unreadable files are reported through `read_error` and left out of the
/// upload stage, so `complete` still fires once the readable files settle.
pub async fn process_drop(
    files: Vec<DroppedFile>,
    transport: Arc<dyn Transport>,
    options: &UploadOptions,
) -> BatchSummary {
    info!("Processing drop of {} file(s)", files.len());

    let read = read_all(&files).await;
    for (file, e) in &read.failed {
        warn!("Could not read {}: {}", file.name, e);
        if let Some(on_read_error) = &options.hooks.read_error {
            on_read_error(file, e);
        }
    }

    let unreadable = read.failed.len();
    let summary = upload_all(read.ready, transport.as_ref(), options).await;

    BatchSummary {
        total: files.len(),
        unreadable,
        ..summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_batch_is_done_immediately() {
        let counter = BatchCounter::new(0);
        assert!(counter.is_done());
        assert_eq!(counter.settled, 0);
    }

    #[test]
    fn only_the_last_settlement_completes() {
        let mut counter = BatchCounter::new(3);
        assert!(!counter.is_done());
        assert!(!counter.settle());
        assert!(!counter.settle());
        assert!(counter.settle());
        assert!(counter.is_done());
        assert_eq!(counter.settled, counter.total);
    }
}
