use std::sync::Arc;

use futures_util::StreamExt;
use futures_util::stream::FuturesUnordered;
use reqwest::Method;
use reqwest::header::{ACCEPT, CACHE_CONTROL, HeaderMap, HeaderName, HeaderValue};
use tracing::{debug, info, warn};

use crate::batch::{BatchCounter, BatchSummary};
use crate::config::{Hooks, UploadOptions};
use crate::error::TransferError;
use crate::file::FileInfo;
use crate::progress::ProgressAdapter;
use crate::read::ReadyFile;
use crate::transport::{FormPayload, Transport, UploadRequest};

pub const X_REQUESTED_WITH: HeaderName = HeaderName::from_static("x-requested-with");
pub const X_FILE_NAME: HeaderName = HeaderName::from_static("x-file-name");

/// How one file's upload settled. Until then the file is pending or in
/// flight inside its `upload_file` future.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOutcome {
    Succeeded,
    Failed,
}

/// Upload every file concurrently and fire `complete` once all have settled.
///
/// An empty batch completes immediately. One file failing never holds up or
/// cancels the others.
pub async fn upload_all(
    files: Vec<ReadyFile>,
    transport: &dyn Transport,
    options: &UploadOptions,
) -> BatchSummary {
    let mut counter = BatchCounter::new(files.len());
    let mut summary = BatchSummary {
        total: files.len(),
        ..BatchSummary::default()
    };

    if counter.is_done() {
        options.hooks.fire_complete();
        return summary;
    }

    let mut uploads: FuturesUnordered<_> = files
        .into_iter()
        .map(|file| upload_file(file, transport, options))
        .collect();

    while let Some(outcome) = uploads.next().await {
        match outcome {
            FileOutcome::Succeeded => summary.succeeded += 1,
            FileOutcome::Failed => summary.failed += 1,
        }
        if counter.settle() {
            info!(
                "Batch settled: {} succeeded, {} failed",
                summary.succeeded, summary.failed
            );
            options.hooks.fire_complete();
        }
    }

    summary
}

/// Run one file's upload to a terminal outcome.
///
/// Exactly one of the `success` / `error` hooks fires. A successful transfer
/// is followed by a final 100% progress notification.
pub async fn upload_file(
    file: ReadyFile,
    transport: &dyn Transport,
    options: &UploadOptions,
) -> FileOutcome {
    let ReadyFile { info, bytes } = file;
    let hooks = &options.hooks;

    let mut form = FormPayload::new();
    form.append_file(options.field.as_str(), info.name.as_str(), bytes);
    if let Some(form_data) = &hooks.form_data {
        form_data(&mut form, &info);
    }

    let mut request = match build_request(&info, options, form) {
        Ok(request) => request,
        Err(e) => return fail(&e, &info, hooks),
    };

    let adapter = Arc::new(ProgressAdapter::new(hooks.progress.clone(), info.clone()));
    if let Some(customize) = &hooks.request {
        customize(&mut request, &info);
    }

    debug!("Uploading {} to {} {}", info.name, request.method, request.url);

    match transport.send(request, adapter.sink()).await {
        Ok(response) => {
            debug!("Upload of {} finished with status {}", info.name, response.status);
            if let Some(success) = &hooks.success {
                success(&response, &info);
            }
            adapter.finish();
            FileOutcome::Succeeded
        }
        Err(e) => fail(&e, &info, hooks),
    }
}

fn build_request(
    info: &FileInfo,
    options: &UploadOptions,
    form: FormPayload,
) -> Result<UploadRequest, TransferError> {
    let method = Method::from_bytes(options.method.as_bytes())
        .map_err(|_| TransferError::InvalidMethod(options.method.clone()))?;

    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_str(&options.accept)
            .map_err(|_| TransferError::InvalidHeader { name: "Accept" })?,
    );
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(X_REQUESTED_WITH, HeaderValue::from_static("XMLHttpRequest"));
    // Raw UTF-8 is allowed through as obs-text.
    headers.insert(
        X_FILE_NAME,
        HeaderValue::from_bytes(info.name.as_bytes())
            .map_err(|_| TransferError::InvalidHeader { name: "X-File-Name" })?,
    );

    Ok(UploadRequest {
        method,
        url: options.url.clone(),
        headers,
        form,
    })
}

fn fail(error: &TransferError, info: &FileInfo, hooks: &Hooks) -> FileOutcome {
    warn!("Upload of {} failed: {}", info.name, error);
    if let Some(on_error) = &hooks.error {
        on_error(error, info);
    }
    FileOutcome::Failed
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use bytes::Bytes;

    use crate::progress::{ProgressEvent, ProgressSink};
    use crate::transport::{FormValue, UploadResponse};

    /// Records the request it is handed and answers 200.
    #[derive(Default)]
    struct CapturingTransport {
        seen: Mutex<Option<UploadRequest>>,
    }

    #[async_trait]
    impl Transport for CapturingTransport {
        async fn send(
            &self,
            request: UploadRequest,
            on_progress: ProgressSink,
        ) -> Result<UploadResponse, TransferError> {
            on_progress(ProgressEvent::new(1, 2));
            *self.seen.lock().unwrap() = Some(request);
            Ok(UploadResponse {
                status: reqwest::StatusCode::OK,
                headers: HeaderMap::new(),
                body: Bytes::new(),
            })
        }
    }

    fn ready(name: &str, contents: &'static [u8]) -> ReadyFile {
        ReadyFile {
            info: FileInfo {
                name: name.into(),
                size: contents.len() as u64,
            },
            bytes: Bytes::from_static(contents),
        }
    }

    #[tokio::test]
    async fn request_carries_wire_headers_and_field() {
        let transport = CapturingTransport::default();
        let options = UploadOptions::new()
            .with_url("/upload")
            .with_field("attachment")
            .with_accept("application/json");

        let outcome = upload_file(ready("photo.jpg", b"jpeg"), &transport, &options).await;
        assert_eq!(outcome, FileOutcome::Succeeded);

        let request = transport.seen.lock().unwrap().take().unwrap();
        assert_eq!(request.method, Method::POST);
        assert_eq!(request.url, "/upload");
        assert_eq!(request.headers[ACCEPT], "application/json");
        assert_eq!(request.headers[CACHE_CONTROL], "no-cache");
        assert_eq!(request.headers[X_REQUESTED_WITH], "XMLHttpRequest");
        assert_eq!(request.headers[X_FILE_NAME], "photo.jpg");
        assert_eq!(
            request.form.get("attachment"),
            Some(&FormValue::File {
                file_name: "photo.jpg".into(),
                bytes: Bytes::from_static(b"jpeg"),
            })
        );
    }

    #[tokio::test]
    async fn hooks_shape_the_request_before_send() {
        let transport = CapturingTransport::default();
        let options = UploadOptions::new()
            .with_method("PUT")
            .form_data(|form, file| form.append_text("original_name", file.name.clone()))
            .request(|request, _file| {
                request
                    .headers
                    .insert("authorization", HeaderValue::from_static("Bearer t0ken"));
            });

        upload_file(ready("a.txt", b"a"), &transport, &options).await;

        let request = transport.seen.lock().unwrap().take().unwrap();
        assert_eq!(request.method, Method::PUT);
        assert_eq!(request.headers["authorization"], "Bearer t0ken");
        assert_eq!(
            request.form.get("original_name"),
            Some(&FormValue::Text("a.txt".into()))
        );
    }

    #[tokio::test]
    async fn non_ascii_file_names_are_sent_verbatim() {
        let transport = CapturingTransport::default();
        upload_file(ready("résumé.pdf", b"%PDF"), &transport, &UploadOptions::new()).await;

        let request = transport.seen.lock().unwrap().take().unwrap();
        assert_eq!(request.headers[X_FILE_NAME].as_bytes(), "résumé.pdf".as_bytes());
    }

    #[tokio::test]
    async fn invalid_method_settles_on_the_error_path() {
        let transport = CapturingTransport::default();
        let errors = Arc::new(Mutex::new(Vec::new()));
        let sink = errors.clone();
        let options = UploadOptions::new()
            .with_method("NOT A METHOD")
            .on_error(move |e, file| sink.lock().unwrap().push((file.name.clone(), e.to_string())));

        let outcome = upload_file(ready("a.txt", b"a"), &transport, &options).await;
        assert_eq!(outcome, FileOutcome::Failed);
        assert!(transport.seen.lock().unwrap().is_none());

        let errors = errors.lock().unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].0, "a.txt");
        assert!(errors[0].1.contains("NOT A METHOD"));
    }

    #[tokio::test]
    async fn success_is_followed_by_a_final_hundred() {
        let transport = CapturingTransport::default();
        let log = Arc::new(Mutex::new(Vec::new()));
        let (p, s) = (log.clone(), log.clone());
        let options = UploadOptions::new()
            .on_progress(move |_, pct| p.lock().unwrap().push(format!("progress {}", pct)))
            .on_success(move |_, _| s.lock().unwrap().push("success".to_string()));

        upload_file(ready("a.txt", b"ab"), &transport, &options).await;
        assert_eq!(
            *log.lock().unwrap(),
            vec!["progress 50", "success", "progress 100"]
        );
    }
}
