/// Drops: multiple file upload from a drag-and-drop zone.
///
/// A drop hands the engine a batch of files. Every file is read and uploaded
/// concurrently as its own multipart HTTP request, with:
/// - per-file progress as a clamped integer percentage
/// - per-file `success` / `error` hooks, exactly one per readable file
/// - a single `complete` signal once the whole batch has settled
///
/// Hosts plug in through the `Host`, `Transport` and `FileSource` traits;
/// `Document`, `HttpTransport` and `LocalFile` are the stock implementations.

pub mod batch;
pub mod config;
pub mod error;
pub mod events;
pub mod file;
pub mod gate;
pub mod host;
pub mod progress;
pub mod read;
pub mod transport;
pub mod upload;

// Re-export key types for convenience.
pub use batch::{BatchSummary, process_drop};
pub use config::{Hooks, UploadOptions};
pub use error::{DropsError, TransferError};
pub use events::{DragEvent, DragEventKind, DropZone, bind};
pub use file::{DroppedFile, FileInfo, FileSource, LocalFile, MemoryFile};
pub use gate::Capabilities;
pub use host::{Document, Host, initiate};
pub use progress::{ProgressAdapter, ProgressEvent, ProgressSink, percent};
pub use read::{ReadBatch, ReadyFile, read_all};
pub use transport::{FormPayload, FormValue, HttpTransport, Transport, UploadRequest, UploadResponse};
pub use upload::{FileOutcome, upload_all, upload_file};
