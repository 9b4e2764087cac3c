use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::{Stream, StreamExt, stream};
use reqwest::header::HeaderMap;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client, Method, StatusCode};
use tracing::debug;
use url::Url;

use crate::error::TransferError;
use crate::progress::{ProgressEvent, ProgressSink};

/// Size of the slices a file part is streamed in; one progress event per slice.
const SLICE_SIZE: usize = 64 * 1024;

/// Value of one multipart field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormValue {
    Text(String),
    File { file_name: String, bytes: Bytes },
}

/// The outgoing `multipart/form-data` body, in field order.
#[derive(Debug, Clone, Default)]
pub struct FormPayload {
    parts: Vec<(String, FormValue)>,
}

impl FormPayload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append_text(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.parts.push((name.into(), FormValue::Text(value.into())));
    }

    pub fn append_file(&mut self, name: impl Into<String>, file_name: impl Into<String>, bytes: Bytes) {
        self.parts.push((
            name.into(),
            FormValue::File {
                file_name: file_name.into(),
                bytes,
            },
        ));
    }

    /// First value appended under `name`.
    pub fn get(&self, name: &str) -> Option<&FormValue> {
        self.parts.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn parts(&self) -> &[(String, FormValue)] {
        &self.parts
    }

    pub fn into_parts(self) -> Vec<(String, FormValue)> {
        self.parts
    }

    /// Bytes carried by file fields; the total reported in progress events.
    pub fn file_bytes(&self) -> u64 {
        self.parts
            .iter()
            .map(|(_, v)| match v {
                FormValue::File { bytes, .. } => bytes.len() as u64,
                FormValue::Text(_) => 0,
            })
            .sum()
    }
}

/// One file's HTTP request, open to the `request` hook before it is sent.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub form: FormPayload,
}

/// A completed HTTP exchange, whatever its status.
#[derive(Debug, Clone)]
pub struct UploadResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl UploadResponse {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Capability to upload a multipart body over HTTP with progress notifications.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send `request`, reporting progress through `on_progress`.
    ///
    /// Resolves `Ok` whenever the exchange completes, including error statuses;
    /// `Err` is reserved for transport-level failures.
    async fn send(
        &self,
        request: UploadRequest,
        on_progress: ProgressSink,
    ) -> Result<UploadResponse, TransferError>;

    fn reports_upload_progress(&self) -> bool {
        true
    }
}

/// reqwest-backed transport.
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: Client,
    origin: Option<Url>,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            origin: None,
        }
    }

    /// Resolve relative endpoint URLs such as the default `/` against `origin`.
    pub fn with_origin(mut self, origin: Url) -> Self {
        self.origin = Some(origin);
        self
    }

    pub fn resolve(&self, url: &str) -> Result<Url, TransferError> {
        match Url::parse(url) {
            Ok(url) => Ok(url),
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                let origin = self.origin.as_ref().ok_or_else(|| TransferError::InvalidUrl {
                    url: url.to_string(),
                    reason: "relative url and no origin configured".into(),
                })?;
                origin.join(url).map_err(|e| TransferError::InvalidUrl {
                    url: url.to_string(),
                    reason: e.to_string(),
                })
            }
            Err(e) => Err(TransferError::InvalidUrl {
                url: url.to_string(),
                reason: e.to_string(),
            }),
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(
        &self,
        request: UploadRequest,
        on_progress: ProgressSink,
    ) -> Result<UploadResponse, TransferError> {
        let url = self.resolve(&request.url)?;
        let total = request.form.file_bytes();
        let sent = Arc::new(AtomicU64::new(0));

        let mut form = Form::new();
        for (name, value) in request.form.into_parts() {
            form = match value {
                FormValue::Text(text) => form.text(name, text),
                FormValue::File { file_name, bytes } => {
                    let len = bytes.len() as u64;
                    let body = Body::wrap_stream(progress_stream(
                        bytes,
                        sent.clone(),
                        total,
                        on_progress.clone(),
                    ));
                    form.part(name, Part::stream_with_length(body, len).file_name(file_name))
                }
            };
        }

        let target = url.to_string();
        debug!("{} {} ({} bytes of file data)", request.method, target, total);

        let response = self
            .client
            .request(request.method, url)
            .headers(request.headers)
            .multipart(form)
            .send()
            .await
            .map_err(|source| TransferError::Request {
                url: target.clone(),
                source,
            })?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|source| TransferError::Request {
                url: target.clone(),
                source,
            })?;

        Ok(UploadResponse {
            status,
            headers,
            body,
        })
    }
}

/// Stream `bytes` in slices, reporting the running byte count of every file
/// part in the request against `total`.
fn progress_stream(
    bytes: Bytes,
    sent: Arc<AtomicU64>,
    total: u64,
    on_progress: ProgressSink,
) -> impl Stream<Item = Result<Bytes, io::Error>> + Send + 'static {
    let slices: Vec<Bytes> = (0..bytes.len())
        .step_by(SLICE_SIZE)
        .map(|start| bytes.slice(start..(start + SLICE_SIZE).min(bytes.len())))
        .collect();

    stream::iter(slices).map(move |slice| {
        let len = slice.len() as u64;
        let loaded = sent.fetch_add(len, Ordering::Relaxed) + len;
        on_progress(ProgressEvent::new(loaded, total));
        Ok::<_, io::Error>(slice)
    })
}
