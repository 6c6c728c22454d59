mod builder;

pub use builder::PageBuilder;

use std::fmt;

/// Local identifier of a captured page.
///
/// Assigned by the capture layer; the pipeline keys partial documents by it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageId(String);

impl PageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PageId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for PageId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Payload format of a captured page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageContentType {
    Png,
    Jpeg,
    Pdf,
    Tiff,
}

impl PageContentType {
    /// Vendor media type used when uploading the page as a partial document.
    pub fn partial_media_type(&self) -> &'static str {
        match self {
            PageContentType::Png => "application/vnd.gini.v2.partial+png",
            PageContentType::Jpeg => "application/vnd.gini.v2.partial+jpeg",
            PageContentType::Pdf => "application/vnd.gini.v2.partial+pdf",
            PageContentType::Tiff => "application/vnd.gini.v2.partial+tiff",
        }
    }
}

/// A captured page handed to the composition pipeline.
#[derive(Clone)]
pub struct Page {
    pub id: PageId,
    pub bytes: Vec<u8>,
    pub content_type: PageContentType,
    /// Opaque value sent with the upload (device, channel, etc.).
    pub upload_metadata: Option<String>,
}

impl fmt::Debug for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Page")
            .field("id", &self.id)
            .field("bytes", &self.bytes.len())
            .field("content_type", &self.content_type)
            .field("upload_metadata", &self.upload_metadata)
            .finish()
    }
}
