use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::Deserialize;

use crate::error::{DropsError, TransferError};
use crate::events::{DragEvent, DragEventKind};
use crate::file::FileInfo;
use crate::transport::{FormPayload, UploadRequest, UploadResponse};

pub const DEFAULT_URL: &str = "/";
pub const DEFAULT_FIELD: &str = "file";
pub const DEFAULT_METHOD: &str = "POST";
pub const DEFAULT_ACCEPT: &str = "text";

pub type ProgressHandler = Arc<dyn Fn(&FileInfo, u8) + Send + Sync>;
pub type SuccessHandler = Arc<dyn Fn(&UploadResponse, &FileInfo) + Send + Sync>;
pub type ErrorHandler = Arc<dyn Fn(&TransferError, &FileInfo) + Send + Sync>;
pub type ReadErrorHandler = Arc<dyn Fn(&FileInfo, &std::io::Error) + Send + Sync>;
pub type CompleteHandler = Arc<dyn Fn() + Send + Sync>;
pub type FormDataHook = Arc<dyn Fn(&mut FormPayload, &FileInfo) + Send + Sync>;
pub type RequestHook = Arc<dyn Fn(&mut UploadRequest, &FileInfo) + Send + Sync>;
pub type DragHandler = Arc<dyn Fn(&DragEvent) + Send + Sync>;

/// Per-invocation upload settings.
///
/// The plain fields deserialize from JSON with defaults for anything missing;
/// hooks are attached with the `on_*` builder methods.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct UploadOptions {
    /// Endpoint receiving each file. Relative URLs resolve against the transport's origin.
    pub url: String,
    /// Multipart field holding the file contents.
    pub field: String,
    pub method: String,
    /// Value of the `Accept` header.
    pub accept: String,
    #[serde(skip)]
    pub hooks: Hooks,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            field: DEFAULT_FIELD.to_string(),
            method: DEFAULT_METHOD.to_string(),
            accept: DEFAULT_ACCEPT.to_string(),
            hooks: Hooks::default(),
        }
    }
}

impl UploadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self, DropsError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = field.into();
        self
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    pub fn with_accept(mut self, accept: impl Into<String>) -> Self {
        self.accept = accept.into();
        self
    }

    pub fn on_progress(mut self, f: impl Fn(&FileInfo, u8) + Send + Sync + 'static) -> Self {
        self.hooks.progress = Some(Arc::new(f));
        self
    }

    pub fn on_success(
        mut self,
        f: impl Fn(&UploadResponse, &FileInfo) + Send + Sync + 'static,
    ) -> Self {
        self.hooks.success = Some(Arc::new(f));
        self
    }

    pub fn on_error(mut self, f: impl Fn(&TransferError, &FileInfo) + Send + Sync + 'static) -> Self {
        self.hooks.error = Some(Arc::new(f));
        self
    }

    pub fn on_read_error(
        mut self,
        f: impl Fn(&FileInfo, &std::io::Error) + Send + Sync + 'static,
    ) -> Self {
        self.hooks.read_error = Some(Arc::new(f));
        self
    }

    pub fn on_complete(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.hooks.complete = Some(Arc::new(f));
        self
    }

    /// Augment the multipart payload before it is sent.
    pub fn form_data(mut self, f: impl Fn(&mut FormPayload, &FileInfo) + Send + Sync + 'static) -> Self {
        self.hooks.form_data = Some(Arc::new(f));
        self
    }

    /// Augment the outgoing request (headers, method, url) before it is sent.
    pub fn request(mut self, f: impl Fn(&mut UploadRequest, &FileInfo) + Send + Sync + 'static) -> Self {
        self.hooks.request = Some(Arc::new(f));
        self
    }

    /// Observe a raw drag event on the drop zone.
    pub fn on_drag(
        mut self,
        kind: DragEventKind,
        f: impl Fn(&DragEvent) + Send + Sync + 'static,
    ) -> Self {
        self.hooks.drag.insert(kind, Arc::new(f));
        self
    }
}

impl fmt::Debug for UploadOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadOptions")
            .field("url", &self.url)
            .field("field", &self.field)
            .field("method", &self.method)
            .field("accept", &self.accept)
            .field("hooks", &self.hooks)
            .finish()
    }
}

/// Optional caller callbacks. Unset hooks are never invoked.
#[derive(Clone, Default)]
pub struct Hooks {
    pub progress: Option<ProgressHandler>,
    pub success: Option<SuccessHandler>,
    pub error: Option<ErrorHandler>,
    pub read_error: Option<ReadErrorHandler>,
    pub complete: Option<CompleteHandler>,
    pub form_data: Option<FormDataHook>,
    pub request: Option<RequestHook>,
    pub drag: HashMap<DragEventKind, DragHandler>,
}

impl Hooks {
    pub fn drag_handler(&self, kind: DragEventKind) -> Option<DragHandler> {
        self.drag.get(&kind).cloned()
    }

    pub(crate) fn fire_complete(&self) {
        if let Some(complete) = &self.complete {
            complete();
        }
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut drag: Vec<&str> = self.drag.keys().map(|k| k.as_str()).collect();
        drag.sort_unstable();
        f.debug_struct("Hooks")
            .field("progress", &self.progress.is_some())
            .field("success", &self.success.is_some())
            .field("error", &self.error.is_some())
            .field("read_error", &self.read_error.is_some())
            .field("complete", &self.complete.is_some())
            .field("form_data", &self.form_data.is_some())
            .field("request", &self.request.is_some())
            .field("drag", &drag)
            .finish()
    }
}
