use thiserror::Error;

/// Errors surfaced while setting up a drop zone or loading options.
///
/// Nothing that happens to an individual file ends up here: per-file
/// failures are handed to the caller's hooks instead.
#[derive(Debug, Error)]
pub enum DropsError {
    #[error("no tokio runtime is available to drive uploads")]
    NoRuntime,

    #[error("invalid upload options: {0}")]
    Options(#[from] serde_json::Error),
}

/// A transport-level failure for one file's upload.
///
/// An HTTP error status is not a `TransferError`; the exchange completed and
/// is reported through the `success` hook with its status code.
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("invalid HTTP method {0:?}")]
    InvalidMethod(String),

    #[error("invalid upload url {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("invalid value for header {name}")]
    InvalidHeader { name: &'static str },

    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("connection to {url} failed: {message}")]
    Network { url: String, message: String },
}
