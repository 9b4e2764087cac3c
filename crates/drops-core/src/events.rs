use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use crate::config::DragHandler;
use crate::file::DroppedFile;

/// Drag-and-drop events a drop zone listens for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DragEventKind {
    DragEnter,
    DragOver,
    DragExit,
    DragLeave,
    DragEnd,
    Drop,
}

impl DragEventKind {
    /// Every event before the terminal drop.
    pub const LIFECYCLE: [DragEventKind; 5] = [
        DragEventKind::DragEnter,
        DragEventKind::DragOver,
        DragEventKind::DragExit,
        DragEventKind::DragLeave,
        DragEventKind::DragEnd,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DragEnter => "dragenter",
            Self::DragOver => "dragover",
            Self::DragExit => "dragexit",
            Self::DragLeave => "dragleave",
            Self::DragEnd => "dragend",
            Self::Drop => "drop",
        }
    }
}

impl fmt::Display for DragEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A drag event delivered by the host to a drop zone.
#[derive(Debug)]
pub struct DragEvent {
    kind: DragEventKind,
    files: Vec<DroppedFile>,
    propagation_stopped: bool,
    default_prevented: bool,
}

impl DragEvent {
    pub fn new(kind: DragEventKind) -> Self {
        Self {
            kind,
            files: Vec::new(),
            propagation_stopped: false,
            default_prevented: false,
        }
    }

    /// A drop carrying `files`.
    pub fn dropped(files: Vec<DroppedFile>) -> Self {
        Self {
            files,
            ..Self::new(DragEventKind::Drop)
        }
    }

    pub fn kind(&self) -> DragEventKind {
        self.kind
    }

    /// The transferred files. Empty for everything but a drop.
    pub fn files(&self) -> &[DroppedFile] {
        &self.files
    }

    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn is_propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }

    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented
    }
}

type Listener = Arc<dyn Fn(&mut DragEvent) + Send + Sync>;

/// A region accepting dropped files. Holds at most one listener per event kind.
#[derive(Clone)]
pub struct DropZone {
    inner: Arc<DropZoneInner>,
}

struct DropZoneInner {
    id: String,
    listeners: Mutex<HashMap<DragEventKind, Listener>>,
}

impl DropZone {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(DropZoneInner {
                id: id.into(),
                listeners: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub fn id(&self) -> &str {
        &self.inner.id
    }

    pub fn is_bound(&self, kind: DragEventKind) -> bool {
        self.listeners().contains_key(&kind)
    }

    pub fn listener_count(&self) -> usize {
        self.listeners().len()
    }

    /// Deliver `event` to the listener for its kind.
    /// Returns false when nothing is listening.
    pub fn dispatch(&self, event: &mut DragEvent) -> bool {
        // Clone out so a listener may rebind this zone without deadlocking.
        let listener = self.listeners().get(&event.kind).cloned();
        match listener {
            Some(listener) => {
                listener(event);
                true
            }
            None => false,
        }
    }

    /// Install `listener` for `kind`, dropping any listener already bound to it.
    fn replace_listener(&self, kind: DragEventKind, listener: Listener) {
        self.listeners().insert(kind, listener);
    }

    fn listeners(&self) -> std::sync::MutexGuard<'_, HashMap<DragEventKind, Listener>> {
        self.inner
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for DropZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut bound: Vec<&str> = self.listeners().keys().map(|k| k.as_str()).collect();
        bound.sort_unstable();
        f.debug_struct("DropZone")
            .field("id", &self.inner.id)
            .field("bound", &bound)
            .finish()
    }
}

/// Bind a suppressing listener that forwards the raw event to `handler`.
///
/// A missing element is a no-op, and rebinding a kind replaces its listener.
pub fn bind(element: Option<&DropZone>, kind: DragEventKind, handler: Option<DragHandler>) {
    bind_listener(element, kind, move |event: &mut DragEvent| {
        if let Some(handler) = &handler {
            handler(&*event);
        }
    });
}

/// Like [`bind`], with full access to the event after suppression.
pub(crate) fn bind_listener<F>(element: Option<&DropZone>, kind: DragEventKind, f: F)
where
    F: Fn(&mut DragEvent) + Send + Sync + 'static,
{
    let Some(zone) = element else {
        return;
    };
    let listener: Listener = Arc::new(move |event: &mut DragEvent| {
        event.stop_propagation();
        event.prevent_default();
        f(event);
    });
    zone.replace_listener(kind, listener);
}
