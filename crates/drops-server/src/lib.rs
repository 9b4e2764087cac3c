/// Drops reference receiver.
///
/// Accepts the per-file multipart uploads a drop zone sends:
/// - `POST /` or `POST /upload` (PUT works too) with the file in one field
/// - the file lands in the storage directory under a sanitized, unique name
/// - the response describes what was stored, including its SHA-256

pub mod config;
pub mod routes;
pub mod storage;

pub use config::ServerConfig;
pub use routes::{AppState, ExtraFile, StoredFile, router};
pub use storage::Storage;
