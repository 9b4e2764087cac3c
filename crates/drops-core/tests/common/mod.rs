#![allow(dead_code)]

use std::collections::HashMap;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use drops_core::{
    FileSource, ProgressEvent, ProgressSink, Transport, TransferError, UploadOptions,
    UploadRequest, UploadResponse,
};
use reqwest::StatusCode;
use reqwest::header::HeaderMap;

/// Every hook invocation, in the order it happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Progress(String, u8),
    Success(String, u16),
    Error(String),
    ReadError(String),
    Complete,
}

#[derive(Clone, Default)]
pub struct Recorder {
    calls: Arc<Mutex<Vec<Call>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Options with every per-file hook and `complete` recording into `self`.
    pub fn options(&self) -> UploadOptions {
        let (p, s, e, r, c) = (
            self.clone(),
            self.clone(),
            self.clone(),
            self.clone(),
            self.clone(),
        );
        UploadOptions::new()
            .with_url("http://uploads.test/")
            .on_progress(move |file, pct| p.push(Call::Progress(file.name.clone(), pct)))
            .on_success(move |resp, file| {
                s.push(Call::Success(file.name.clone(), resp.status.as_u16()))
            })
            .on_error(move |_, file| e.push(Call::Error(file.name.clone())))
            .on_read_error(move |file, _| r.push(Call::ReadError(file.name.clone())))
            .on_complete(move || c.push(Call::Complete))
    }

    pub fn push(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|c| pred(c)).count()
    }

    pub fn successes(&self) -> usize {
        self.count(|c| matches!(c, Call::Success(..)))
    }

    pub fn errors(&self) -> usize {
        self.count(|c| matches!(c, Call::Error(_)))
    }

    pub fn completes(&self) -> usize {
        self.count(|c| matches!(c, Call::Complete))
    }

    pub fn progress_for(&self, name: &str) -> Vec<u8> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Progress(n, pct) if n == name => Some(pct),
                _ => None,
            })
            .collect()
    }
}

/// How the mock transport treats one file, keyed by file name.
#[derive(Debug, Clone, Copy)]
pub enum Behavior {
    Respond { status: u16, delay_ms: u64 },
    Disconnect { delay_ms: u64 },
}

/// Transport that answers from a script instead of the network.
///
/// Each send reports progress at a quarter, a half, and past the end of the
/// body (the last is clamped by the adapter) before settling.
#[derive(Default)]
pub struct MockTransport {
    script: HashMap<String, Behavior>,
    pub requests: Mutex<Vec<UploadRequest>>,
    no_progress: bool,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, behavior: Behavior) -> Self {
        self.script.insert(name.to_string(), behavior);
        self
    }

    /// A transport whose host cannot observe upload progress.
    pub fn without_progress(mut self) -> Self {
        self.no_progress = true;
        self
    }

    pub fn file_names(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter_map(|r| r.headers.get("x-file-name"))
            .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
            .collect()
    }

    /// Most sends that were ever outstanding at the same time.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

/// Counts a send as outstanding until dropped.
struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(transport: &'a MockTransport) -> Self {
        let now = transport.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        transport.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        Self(&transport.in_flight)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(
        &self,
        request: UploadRequest,
        on_progress: ProgressSink,
    ) -> Result<UploadResponse, TransferError> {
        let name = request
            .headers
            .get("x-file-name")
            .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
            .unwrap_or_default();
        let total = request.form.file_bytes().max(4);
        let url = request.url.clone();
        self.requests.lock().unwrap().push(request);
        let _in_flight = InFlight::enter(self);

        let behavior = self.script.get(&name).copied().unwrap_or(Behavior::Respond {
            status: 200,
            delay_ms: 0,
        });

        match behavior {
            Behavior::Respond { status, delay_ms } => {
                on_progress(ProgressEvent::new(total / 4, total));
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                on_progress(ProgressEvent::new(total / 2, total));
                on_progress(ProgressEvent::new(total * 2, total));
                Ok(UploadResponse {
                    status: StatusCode::from_u16(status).unwrap(),
                    headers: HeaderMap::new(),
                    body: Bytes::from_static(b"ok"),
                })
            }
            Behavior::Disconnect { delay_ms } => {
                on_progress(ProgressEvent::new(total / 4, total));
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                Err(TransferError::Network {
                    url,
                    message: "connection reset by peer".into(),
                })
            }
        }
    }

    fn reports_upload_progress(&self) -> bool {
        !self.no_progress
    }
}

/// In-memory file whose read takes `delay_ms`, or fails.
#[derive(Debug)]
pub struct ScriptedFile {
    pub name: String,
    pub bytes: Bytes,
    pub delay_ms: u64,
    pub unreadable: bool,
}

impl ScriptedFile {
    pub fn new(name: &str, bytes: &'static [u8]) -> Self {
        Self {
            name: name.to_string(),
            bytes: Bytes::from_static(bytes),
            delay_ms: 0,
            unreadable: false,
        }
    }

    pub fn delayed(mut self, delay_ms: u64) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    pub fn unreadable(mut self) -> Self {
        self.unreadable = true;
        self
    }
}

#[async_trait]
impl FileSource for ScriptedFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    async fn read(&self) -> io::Result<Bytes> {
        tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
        if self.unreadable {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "permission denied"));
        }
        Ok(self.bytes.clone())
    }
}
