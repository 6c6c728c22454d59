use crate::ModelError;
use crate::page::{Page, PageContentType, PageId};

use common::ErrorLocation;

use std::panic::Location;

/// Builder for creating validated Page instances.
#[derive(Debug, Default)]
pub struct PageBuilder {
    id: Option<PageId>,
    bytes: Option<Vec<u8>>,
    content_type: Option<PageContentType>,
    upload_metadata: Option<String>,
}

impl PageBuilder {
    pub fn with_id(mut self, id: impl Into<PageId>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_bytes(mut self, bytes: impl Into<Vec<u8>>) -> Self {
        self.bytes = Some(bytes.into());
        self
    }

    pub fn with_content_type(mut self, content_type: PageContentType) -> Self {
        self.content_type = Some(content_type);
        self
    }

    pub fn with_upload_metadata(mut self, metadata: impl Into<String>) -> Self {
        self.upload_metadata = Some(metadata.into());
        self
    }

    /// Build the Page with validation.
    #[track_caller]
    pub fn build(self) -> Result<Page, ModelError> {
        let id = self.id.ok_or_else(|| ModelError::Validation {
            message: String::from("Page id is required"),
            location: ErrorLocation::from(Location::caller()),
        })?;

        if id.as_str().is_empty() {
            return Err(ModelError::Validation {
                message: String::from("Page id cannot be empty"),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let bytes = self.bytes.ok_or_else(|| ModelError::Validation {
            message: String::from("Page bytes are required"),
            location: ErrorLocation::from(Location::caller()),
        })?;

        if bytes.is_empty() {
            return Err(ModelError::Validation {
                message: format!("Page '{id}' has no content"),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let content_type = self.content_type.ok_or_else(|| ModelError::Validation {
            message: String::from("Content type is required"),
            location: ErrorLocation::from(Location::caller()),
        })?;

        if let Some(metadata) = &self.upload_metadata
            && metadata.chars().any(|c| c.is_control())
        {
            return Err(ModelError::Validation {
                message: String::from("Upload metadata cannot contain control characters"),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        Ok(Page {
            id,
            bytes,
            content_type,
            upload_metadata: self.upload_metadata,
        })
    }
}
