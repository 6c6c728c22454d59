//! Domain models for the capture SDK.
//!
//! Pure data structures exchanged with the remote extraction service:
//! captured pages, partial/composite document infos, remote document
//! handles, extraction results, feedback payloads and access tokens.
//! Models carry serde mappings for the service's JSON schema but no
//! network or storage logic.

pub mod document;
pub mod error;
pub mod extraction;
pub mod feedback;
pub mod page;
pub mod partial;
pub mod token;

pub use document::{Document, DocumentLinks, DocumentProgress};
pub use error::model_error::ModelError;
pub use extraction::{Extraction, ExtractionBox, ExtractionResult};
pub use feedback::Feedback;
pub use page::{Page, PageBuilder, PageContentType, PageId};
pub use partial::{CompositeDocumentInfo, PartialDocument, PartialDocumentInfo};
pub use token::{AccessToken, TokenResponse, TokenType};

#[cfg(test)]
mod tests;
