//! Document composition pipeline.
//!
//! Tracks one partial document per local page id, in a caller-controlled
//! order. Uploads for different pages may run concurrently; the map is only
//! touched under a single lock that is never held across an await.
//!
//! Each upload takes a reservation. A completion whose reservation was
//! superseded (page removed, re-uploaded or pipeline cleared) is not
//! recorded; its remote partial is deleted best-effort.

use super::api::DocumentApi;

use crate::cancellation::CancellationToken;
use crate::error::ApiError;

use models::{CompositeDocumentInfo, Document, Page, PageId, PartialDocument};

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use log::{debug, info, warn};
use tokio::sync::watch;

#[derive(Debug, Default)]
struct PipelineState {
    entries: HashMap<PageId, PartialDocument>,
    reservations: HashMap<PageId, u64>,
    next_order: usize,
    next_reservation: u64,
}

impl PipelineState {
    /// Place `id` at the end of the current order. Returns the reservation and
    /// the remote handle of a replaced upload, if any.
    fn reserve(&mut self, id: &PageId) -> (u64, Option<Document>) {
        let reservation = self.next_reservation;
        self.next_reservation += 1;

        let order = self.next_order;
        self.next_order += 1;

        let replaced = self
            .entries
            .insert(id.clone(), PartialDocument::new(id.clone(), order))
            .and_then(|previous| previous.document);
        self.reservations.insert(id.clone(), reservation);

        (reservation, replaced)
    }

    fn complete(&mut self, id: &PageId, reservation: u64, document: &Document) -> bool {
        if self.reservations.get(id) != Some(&reservation) {
            return false;
        }
        self.reservations.remove(id);

        match self.entries.get_mut(id) {
            Some(entry) => {
                entry.info.document_url = Some(document.links.document.clone());
                entry.document = Some(document.clone());
                true
            }
            None => false,
        }
    }

    fn abandon(&mut self, id: &PageId, reservation: u64) {
        if self.reservations.get(id) == Some(&reservation) {
            self.reservations.remove(id);
            self.entries.remove(id);
        }
    }

    fn sorted(&self) -> Vec<&PartialDocument> {
        let mut entries: Vec<&PartialDocument> = self.entries.values().collect();
        entries.sort();
        entries
    }
}

/// Decrements the pending upload count when the upload ends, however it ends.
struct PendingUpload<'a> {
    counter: &'a watch::Sender<usize>,
}

impl<'a> PendingUpload<'a> {
    fn start(counter: &'a watch::Sender<usize>) -> Self {
        counter.send_modify(|pending| *pending += 1);
        Self { counter }
    }
}

impl Drop for PendingUpload<'_> {
    fn drop(&mut self) {
        self.counter
            .send_modify(|pending| *pending = pending.saturating_sub(1));
    }
}

pub struct CompositionPipeline {
    api: DocumentApi,
    state: Mutex<PipelineState>,
    pending: watch::Sender<usize>,
}

impl CompositionPipeline {
    pub fn new(api: DocumentApi) -> Self {
        let (pending, _) = watch::channel(0);
        Self {
            api,
            state: Mutex::new(PipelineState::default()),
            pending,
        }
    }

    /// Upload a page and record it once the server accepted it.
    ///
    /// Failures leave no entry behind and are returned unchanged.
    pub async fn upload(
        &self,
        page: &Page,
        token: Option<&CancellationToken>,
    ) -> Result<Document, ApiError> {
        let _pending = PendingUpload::start(&self.pending);
        let (reservation, replaced) = self.lock().reserve(&page.id);

        if let Some(previous) = replaced {
            debug!("Page '{}' replaced, deleting previous upload", page.id);
            self.api.delete_best_effort(&previous).await;
        }

        match self.api.upload_partial(page, token).await {
            Ok(document) => {
                let recorded = self.lock().complete(&page.id, reservation, &document);
                if recorded {
                    info!("Page '{}' uploaded as {}", page.id, document.id);
                    Ok(document)
                } else {
                    debug!("Upload of page '{}' was superseded", page.id);
                    self.api.delete_best_effort(&document).await;
                    Err(ApiError::cancelled())
                }
            }
            Err(e) => {
                self.lock().abandon(&page.id, reservation);
                if !e.is_cancellation() {
                    warn!("Upload of page '{}' failed: {e}", page.id);
                }
                Err(e)
            }
        }
    }

    /// Forget a page and delete its remote partial (best-effort).
    pub async fn remove(&self, page_id: &PageId) -> Option<PartialDocument> {
        let removed = {
            let mut state = self.lock();
            state.reservations.remove(page_id);
            state.entries.remove(page_id)
        };

        if let Some(document) = removed.as_ref().and_then(|entry| entry.document.as_ref()) {
            self.api.delete_best_effort(document).await;
        }

        if removed.is_some() {
            debug!("Page '{page_id}' removed");
        }
        removed
    }

    /// Mirror the caller's page sequence.
    ///
    /// Listed pages come first in the given order; pages the caller did not
    /// list keep their relative order after them. Unknown ids are ignored.
    pub fn reorder(&self, to_match: &[PageId]) {
        let mut state = self.lock();

        let mut seen = HashSet::new();
        let mut sequence: Vec<PageId> = to_match
            .iter()
            .filter(|id| state.entries.contains_key(*id) && seen.insert((*id).clone()))
            .cloned()
            .collect();

        let rest: Vec<PageId> = state
            .sorted()
            .into_iter()
            .filter(|entry| !seen.contains(&entry.page_id))
            .map(|entry| entry.page_id.clone())
            .collect();
        sequence.extend(rest);

        for (order, id) in sequence.iter().enumerate() {
            if let Some(entry) = state.entries.get_mut(id) {
                entry.order = order;
            }
        }
        state.next_order = sequence.len();

        debug!("Pipeline reordered: {sequence:?}");
    }

    /// Set a page's rotation. No re-upload. Returns false for unknown pages.
    pub fn update_rotation(&self, page_id: &PageId, degrees: i32) -> bool {
        match self.lock().entries.get_mut(page_id) {
            Some(entry) => {
                entry.info.set_rotation(degrees);
                true
            }
            None => false,
        }
    }

    /// Composite body from completed uploads, in current order.
    pub fn build_composite_info(&self) -> CompositeDocumentInfo {
        let state = self.lock();
        CompositeDocumentInfo {
            partial_documents: state
                .sorted()
                .into_iter()
                .filter(|entry| entry.is_uploaded())
                .map(|entry| entry.info.clone())
                .collect(),
        }
    }

    /// Snapshot of all entries, in order.
    pub fn partial_documents(&self) -> Vec<PartialDocument> {
        self.lock().sorted().into_iter().cloned().collect()
    }

    pub fn pending_uploads(&self) -> usize {
        *self.pending.borrow()
    }

    /// Resolve once no upload is in flight.
    pub async fn wait_for_uploads(&self) {
        let mut pending = self.pending.subscribe();
        if pending.wait_for(|count| *count == 0).await.is_err() {
            warn!("Upload counter closed while waiting for uploads");
        }
    }

    /// Drop all entries without touching remote resources.
    pub fn clear(&self) {
        let mut state = self.lock();
        state.entries.clear();
        state.reservations.clear();
        state.next_order = 0;
    }

    pub fn api(&self) -> &DocumentApi {
        &self.api
    }

    fn lock(&self) -> MutexGuard<'_, PipelineState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
