//! Partial (single page) and composite document descriptions.

use crate::document::Document;
use crate::page::PageId;

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// Reference to an uploaded page plus the rotation applied during review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialDocumentInfo {
    /// URL of the uploaded partial document. `None` until the upload completes.
    #[serde(rename = "document")]
    pub document_url: Option<String>,
    /// Rotation in degrees, normalized to 0..360.
    pub rotation_delta: i32,
}

impl PartialDocumentInfo {
    pub fn pending() -> Self {
        Self {
            document_url: None,
            rotation_delta: 0,
        }
    }

    pub fn set_rotation(&mut self, degrees: i32) {
        self.rotation_delta = degrees.rem_euclid(360);
    }
}

/// A page tracked by the composition pipeline.
///
/// Ordered by `order`; two entries are equal when they reference the same page.
#[derive(Debug, Clone)]
pub struct PartialDocument {
    pub page_id: PageId,
    pub info: PartialDocumentInfo,
    pub document: Option<Document>,
    pub order: usize,
}

impl PartialDocument {
    pub fn new(page_id: PageId, order: usize) -> Self {
        Self {
            page_id,
            info: PartialDocumentInfo::pending(),
            document: None,
            order,
        }
    }

    pub fn is_uploaded(&self) -> bool {
        self.document.is_some() && self.info.document_url.is_some()
    }
}

impl PartialEq for PartialDocument {
    fn eq(&self, other: &Self) -> bool {
        self.page_id == other.page_id
    }
}

impl Eq for PartialDocument {}

impl PartialOrd for PartialDocument {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PartialDocument {
    fn cmp(&self, other: &Self) -> Ordering {
        self.order
            .cmp(&other.order)
            .then_with(|| self.page_id.cmp(&other.page_id))
    }
}

/// Body of the "create composite document" call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositeDocumentInfo {
    pub partial_documents: Vec<PartialDocumentInfo>,
}

impl CompositeDocumentInfo {
    pub fn is_empty(&self) -> bool {
        self.partial_documents.is_empty()
    }

    pub fn len(&self) -> usize {
        self.partial_documents.len()
    }
}
