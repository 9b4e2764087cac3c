use std::sync::Arc;

use crate::config::ProgressHandler;
use crate::file::FileInfo;

/// Raw progress notification from a transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressEvent {
    /// Bytes handed to the connection so far.
    pub loaded: u64,
    /// Total bytes to send, when the transport knows it.
    pub total: Option<u64>,
}

impl ProgressEvent {
    pub fn new(loaded: u64, total: u64) -> Self {
        Self {
            loaded,
            total: Some(total),
        }
    }

    /// An event with no computable length.
    pub fn indeterminate(loaded: u64) -> Self {
        Self { loaded, total: None }
    }

    pub fn length_computable(&self) -> bool {
        self.total.is_some()
    }

    pub fn percent(&self) -> Option<u8> {
        self.total.map(|total| percent(self.loaded, total))
    }
}

/// Callback a transport invokes for every progress notification.
pub type ProgressSink = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

/// `loaded / total` as a percentage clamped to [0, 100] and rounded up.
/// An empty body counts as fully sent.
pub fn percent(loaded: u64, total: u64) -> u8 {
    if total == 0 {
        return 100;
    }
    // Integer ceiling: 3/10 is exactly 30.
    let loaded = loaded.min(total) as u128;
    let total = total as u128;
    ((loaded * 100).div_ceil(total)) as u8
}

/// Turns transport progress for one file into `progress(file, percent)` calls.
pub struct ProgressAdapter {
    handler: Option<ProgressHandler>,
    file: FileInfo,
}

impl ProgressAdapter {
    pub fn new(handler: Option<ProgressHandler>, file: FileInfo) -> Self {
        Self { handler, file }
    }

    pub fn on_progress(&self, event: ProgressEvent) {
        let Some(handler) = &self.handler else {
            return;
        };
        if let Some(pct) = event.percent() {
            handler(&self.file, pct);
        }
    }

    /// Final 100% notification once the transfer has completed.
    pub fn finish(&self) {
        if let Some(handler) = &self.handler {
            handler(&self.file, 100);
        }
    }

    pub fn sink(self: &Arc<Self>) -> ProgressSink {
        let adapter = self.clone();
        Arc::new(move |event| adapter.on_progress(event))
    }
}
