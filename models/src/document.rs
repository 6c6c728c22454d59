//! Remote document handle as returned by the extraction service.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Processing state of a remote document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentProgress {
    Pending,
    Completed,
    Error,
}

/// Links to a document's sub-resources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentLinks {
    pub document: String,
    #[serde(default)]
    pub extractions: Option<String>,
    #[serde(default)]
    pub layout: Option<String>,
    #[serde(default)]
    pub processed: Option<String>,
    #[serde(default)]
    pub pages: Option<String>,
}

/// Server-owned document. The client only keeps this handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: String,
    /// Milliseconds since the Unix epoch.
    pub creation_date: u64,
    #[serde(default)]
    pub name: Option<String>,
    pub progress: DocumentProgress,
    #[serde(default)]
    pub origin: Option<String>,
    #[serde(default)]
    pub source_classification: Option<String>,
    #[serde(default)]
    pub page_count: Option<u32>,
    #[serde(rename = "_links", alias = "links")]
    pub links: DocumentLinks,
}

impl Document {
    pub fn created_at(&self) -> SystemTime {
        UNIX_EPOCH + Duration::from_millis(self.creation_date)
    }

    pub fn is_processed(&self) -> bool {
        self.progress == DocumentProgress::Completed
    }
}
