/// What the host environment can do.
///
/// All four primitives are needed for a drop zone to work; a host missing any
/// of them gets an inert drop zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// Drop zones can be looked up by selector.
    pub element_lookup: bool,
    /// The HTTP transport reports upload progress.
    pub upload_progress: bool,
    /// Dropped files can be read asynchronously.
    pub file_reader: bool,
    /// Multipart form bodies can be built.
    pub form_data: bool,
}

impl Capabilities {
    /// Everything a native host with a stock transport provides.
    pub const fn native() -> Self {
        Self {
            element_lookup: true,
            upload_progress: true,
            file_reader: true,
            form_data: true,
        }
    }

    pub fn supported(&self) -> bool {
        self.element_lookup && self.upload_progress && self.file_reader && self.form_data
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::native()
    }
}
