//! Remote document operations on top of the transport.

use crate::cancellation::CancellationToken;
use crate::error::ApiError;
use crate::resource::api;
use crate::transport::Transport;

use models::{CompositeDocumentInfo, Document, DocumentProgress, ExtractionResult, Feedback, Page};

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, trace, warn};
use serde_json::Value;
use tokio::time::sleep as TokioSleep;

#[derive(Clone)]
pub struct DocumentApi {
    transport: Arc<Transport>,
}

impl DocumentApi {
    pub fn new(transport: Arc<Transport>) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &Arc<Transport> {
        &self.transport
    }

    /// Upload one page as a partial document and fetch its handle.
    pub async fn upload_partial(
        &self,
        page: &Page,
        token: Option<&CancellationToken>,
    ) -> Result<Document, ApiError> {
        let (resource, media_type) = api::upload_partial(
            self.transport.api_endpoint(),
            page.content_type,
            page.upload_metadata.as_deref(),
        );

        debug!("Uploading page '{}' ({} bytes)", page.id, page.bytes.len());
        let location = self
            .transport
            .upload(resource, page.bytes.clone(), media_type, token)
            .await?;

        self.document_at(&location, token).await
    }

    /// Create the composite document and fetch its handle.
    pub async fn create_composite(
        &self,
        info: &CompositeDocumentInfo,
        token: Option<&CancellationToken>,
    ) -> Result<Document, ApiError> {
        let resource = api::create_composite(self.transport.api_endpoint(), info)?;

        info!("Creating composite document from {} partial(s)", info.len());
        let location = self.transport.send(&resource, token).await?;

        self.document_at(&location, token).await
    }

    pub async fn document(
        &self,
        id: &str,
        token: Option<&CancellationToken>,
    ) -> Result<Document, ApiError> {
        let resource = api::document(self.transport.api_endpoint(), id);
        self.transport.send(&resource, token).await
    }

    /// Fetch a document by absolute (or API-relative) URL.
    pub async fn document_at(
        &self,
        location: &str,
        token: Option<&CancellationToken>,
    ) -> Result<Document, ApiError> {
        let resource = api::document_at(&self.absolute(location));
        self.transport.send(&resource, token).await
    }

    pub async fn delete(&self, document: &Document) -> Result<(), ApiError> {
        let resource = api::delete_document_at(&self.absolute(&document.links.document));
        self.transport.send(&resource, None).await
    }

    pub async fn delete_by_id(&self, id: &str) -> Result<(), ApiError> {
        let resource = api::delete_document(self.transport.api_endpoint(), id);
        self.transport.send(&resource, None).await
    }

    /// Delete, logging instead of failing.
    pub async fn delete_best_effort(&self, document: &Document) {
        match self.delete(document).await {
            Ok(()) => debug!("Deleted document {}", document.id),
            Err(e) => warn!("Failed to delete document {}: {e}", document.id),
        }
    }

    pub async fn extractions(
        &self,
        document: &Document,
        token: Option<&CancellationToken>,
    ) -> Result<ExtractionResult, ApiError> {
        let resource = api::extractions(self.transport.api_endpoint(), document);
        self.transport.send(&resource, token).await
    }

    /// Poll the document until the server reports it processed.
    ///
    /// No overall timeout; cancellation is the only way out besides a
    /// terminal progress value.
    pub async fn wait_until_processed(
        &self,
        document: &Document,
        poll_interval: Duration,
        token: Option<&CancellationToken>,
    ) -> Result<Document, ApiError> {
        let mut current = document.clone();

        loop {
            match current.progress {
                DocumentProgress::Completed => {
                    debug!("Document {} processed", current.id);
                    return Ok(current);
                }
                DocumentProgress::Error => {
                    return Err(ApiError::unknown(format!(
                        "Processing failed for document {}",
                        current.id
                    )));
                }
                DocumentProgress::Pending => {
                    trace!("Document {} pending, polling in {poll_interval:?}", current.id);
                    TokioSleep(poll_interval).await;
                    if token.is_some_and(CancellationToken::is_cancelled) {
                        return Err(ApiError::cancelled());
                    }
                    current = self.document_at(&current.links.document, token).await?;
                }
            }
        }
    }

    pub async fn send_feedback(
        &self,
        document_id: &str,
        feedback: &Feedback,
    ) -> Result<(), ApiError> {
        let resource = api::feedback(self.transport.api_endpoint(), document_id, feedback)?;
        self.transport.send(&resource, None).await
    }

    pub async fn layout(&self, document: &Document) -> Result<Value, ApiError> {
        let resource = api::layout(self.transport.api_endpoint(), document);
        self.transport.send(&resource, None).await
    }

    pub async fn pages(&self, document: &Document) -> Result<Value, ApiError> {
        let resource = api::pages(self.transport.api_endpoint(), document);
        self.transport.send(&resource, None).await
    }

    /// Processed document bytes.
    pub async fn processed(
        &self,
        document: &Document,
        token: Option<&CancellationToken>,
    ) -> Result<Vec<u8>, ApiError> {
        let resource = api::processed(self.transport.api_endpoint(), document);
        self.transport.download(&resource, token).await
    }

    /// `Location` headers may be relative to the API host.
    fn absolute(&self, location: &str) -> String {
        if location.contains("://") {
            return location.to_string();
        }

        let endpoint = self.transport.api_endpoint();
        let path = location.trim_start_matches('/');
        format!("{}://{}/{}", endpoint.scheme(), endpoint.host(), path)
    }
}
