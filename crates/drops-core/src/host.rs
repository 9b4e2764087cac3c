use std::sync::Arc;

use tokio::runtime::Handle;
use tracing::{debug, info};

use crate::batch::process_drop;
use crate::config::UploadOptions;
use crate::error::DropsError;
use crate::events::{DragEventKind, DropZone, bind, bind_listener};
use crate::gate::Capabilities;
use crate::transport::Transport;

/// The environment a drop zone lives in.
pub trait Host {
    fn capabilities(&self) -> Capabilities;

    /// First drop zone matching `selector`.
    fn query_selector(&self, selector: &str) -> Option<DropZone>;

    fn transport(&self) -> Arc<dyn Transport>;

    /// Runtime the upload pipelines are spawned on.
    fn runtime(&self) -> Handle;
}

/// In-process host: a set of named drop zones sharing one transport.
pub struct Document {
    zones: Vec<DropZone>,
    transport: Arc<dyn Transport>,
    runtime: Handle,
    capabilities: Capabilities,
}

impl Document {
    /// Create a document on the current tokio runtime.
    pub fn new(transport: Arc<dyn Transport>) -> Result<Self, DropsError> {
        let runtime = Handle::try_current().map_err(|_| DropsError::NoRuntime)?;
        Ok(Self::with_runtime(transport, runtime))
    }

    pub fn with_runtime(transport: Arc<dyn Transport>, runtime: Handle) -> Self {
        let capabilities = Capabilities {
            upload_progress: transport.reports_upload_progress(),
            ..Capabilities::native()
        };
        Self {
            zones: Vec::new(),
            transport,
            runtime,
            capabilities,
        }
    }

    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Add a drop zone, or return the one already registered under `selector`.
    pub fn register(&mut self, selector: &str) -> DropZone {
        if let Some(zone) = self.query_selector(selector) {
            return zone;
        }
        let zone = DropZone::new(zone_id(selector));
        self.zones.push(zone.clone());
        zone
    }
}

impl Host for Document {
    fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    fn query_selector(&self, selector: &str) -> Option<DropZone> {
        let id = zone_id(selector);
        self.zones.iter().find(|z| z.id() == id).cloned()
    }

    fn transport(&self) -> Arc<dyn Transport> {
        self.transport.clone()
    }

    fn runtime(&self) -> Handle {
        self.runtime.clone()
    }
}

/// `#uploads` and `uploads` name the same zone.
fn zone_id(selector: &str) -> &str {
    let selector = selector.trim();
    selector.strip_prefix('#').unwrap_or(selector)
}

/// Turn the first zone matching `selector` into an upload drop zone.
///
/// Hosts lacking any required capability get nothing bound. Calling this again
/// for the same zone replaces its listeners rather than adding to them.
pub fn initiate<H: Host + ?Sized>(host: &H, selector: &str, options: UploadOptions) {
    let capabilities = host.capabilities();
    if !capabilities.supported() {
        debug!("Uploads unsupported by host ({:?}); {} left inert", capabilities, selector);
        return;
    }

    let zone = host.query_selector(selector);
    let element = zone.as_ref();
    if element.is_none() {
        debug!("No drop zone matches {}", selector);
        return;
    }

    for kind in DragEventKind::LIFECYCLE {
        bind(element, kind, options.hooks.drag_handler(kind));
    }

    let transport = host.transport();
    let runtime = host.runtime();
    let options = Arc::new(options);

    bind_listener(element, DragEventKind::Drop, move |event| {
        if let Some(on_drop) = options.hooks.drag_handler(DragEventKind::Drop) {
            on_drop(&*event);
        }

        let files = event.files().to_vec();
        let transport = transport.clone();
        let options = options.clone();
        runtime.spawn(async move {
            let summary = process_drop(files, transport, &options).await;
            debug!("Drop processed: {:?}", summary);
        });
    });

    info!("Drop zone {} ready", selector);
}
