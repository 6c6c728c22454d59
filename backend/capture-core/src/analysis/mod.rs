//! Capture/review contract: page management, analysis and feedback.
//!
//! # State machine
//!
//! ```text
//! Idle → CreatingComposite → Analyzing → Completed(result)
//!                                      → Failed(error)
//!                                      → Cancelled → Idle
//! ```
//!
//! Every analysis run gets a run number. `reset_to_initial_state` bumps it, so
//! a run finishing late can never overwrite the state of a newer one.

mod error_sink;
mod feedback;

pub use error_sink::{ErrorSink, LogErrorSink};
pub use feedback::FeedbackOutcome;

use crate::cancellation::CancellationToken;
use crate::config::{AnalysisConfig, SdkConfig};
use crate::credentials::CredentialStore;
use crate::documents::{CompositionPipeline, DocumentApi, extraction_result_from_qr};
use crate::error::{ApiError, CoreError, DocumentServiceError};
use crate::transport::Transport;

use models::{Document, ExtractionResult, Feedback, Page, PageId, PartialDocument};

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::{debug, info, warn};

#[derive(Debug, Clone)]
pub enum AnalysisState {
    Idle,
    CreatingComposite,
    Analyzing,
    Completed(ExtractionResult),
    Failed(ApiError),
    Cancelled,
}

impl AnalysisState {
    pub fn is_idle(&self) -> bool {
        matches!(self, AnalysisState::Idle)
    }

    pub fn is_running(&self) -> bool {
        matches!(
            self,
            AnalysisState::CreatingComposite | AnalysisState::Analyzing
        )
    }
}

#[derive(Debug)]
struct FlowState {
    status: AnalysisState,
    composite: Option<Document>,
    analysis_token: Option<CancellationToken>,
    cancel_requested: bool,
    run: u64,
}

impl FlowState {
    fn idle(&mut self) {
        self.status = AnalysisState::Idle;
        self.composite = None;
        self.analysis_token = None;
        self.cancel_requested = false;
    }
}

pub struct DocumentService {
    api: DocumentApi,
    pipeline: CompositionPipeline,
    flow: Mutex<FlowState>,
    error_sink: Arc<dyn ErrorSink>,
    settings: AnalysisConfig,
}

impl DocumentService {
    pub fn new(transport: Arc<Transport>, settings: AnalysisConfig) -> Self {
        let api = DocumentApi::new(transport);
        Self {
            pipeline: CompositionPipeline::new(api.clone()),
            api,
            flow: Mutex::new(FlowState {
                status: AnalysisState::Idle,
                composite: None,
                analysis_token: None,
                cancel_requested: false,
                run: 0,
            }),
            error_sink: Arc::new(LogErrorSink),
            settings,
        }
    }

    /// Wire transport and service from a loaded configuration.
    pub fn from_config(
        config: &SdkConfig,
        store: Arc<dyn CredentialStore>,
    ) -> Result<Self, CoreError> {
        let transport = Arc::new(Transport::new(config, store)?);
        Ok(Self::new(transport, config.analysis.clone()))
    }

    pub fn with_error_sink(mut self, error_sink: Arc<dyn ErrorSink>) -> Self {
        self.error_sink = error_sink;
        self
    }

    pub fn state(&self) -> AnalysisState {
        self.lock().status.clone()
    }

    /// Composite document of the current run, once created.
    pub fn composite_document(&self) -> Option<Document> {
        self.lock().composite.clone()
    }

    pub fn pipeline(&self) -> &CompositionPipeline {
        &self.pipeline
    }

    pub fn api(&self) -> &DocumentApi {
        &self.api
    }

    // ============================================
    // PAGES
    // ============================================

    pub async fn upload(
        &self,
        page: &Page,
        token: Option<&CancellationToken>,
    ) -> Result<Document, DocumentServiceError> {
        Ok(self.pipeline.upload(page, token).await?)
    }

    pub async fn remove(&self, page_id: &PageId) -> Option<PartialDocument> {
        self.pipeline.remove(page_id).await
    }

    /// Set the rotation of an uploaded page.
    pub fn update(&self, page_id: &PageId, rotation_degrees: i32) -> bool {
        self.pipeline.update_rotation(page_id, rotation_degrees)
    }

    pub fn reorder(&self, to_match: &[PageId]) {
        self.pipeline.reorder(to_match);
    }

    // ============================================
    // ANALYSIS
    // ============================================

    /// Compose uploaded pages, wait for processing and fetch extractions.
    ///
    /// Waits for in-flight uploads first. Cancellation (through
    /// [`DocumentService::cancel_analysis`] or a reset) yields
    /// `request_cancelled` and leaves the flow `Idle`.
    pub async fn start_analysis(&self) -> Result<ExtractionResult, DocumentServiceError> {
        self.pipeline.wait_for_uploads().await;

        let info = self.pipeline.build_composite_info();
        if info.is_empty() {
            return Err(DocumentServiceError::no_documents());
        }

        let run = {
            let mut flow = self.lock();
            if flow.status.is_running() {
                return Err(DocumentServiceError::analysis_in_progress());
            }
            flow.idle();
            flow.status = AnalysisState::CreatingComposite;
            flow.run
        };

        let composite = match self.api.create_composite(&info, None).await {
            Ok(document) => document,
            Err(e) => {
                if self.cancelled_during_creation(run) {
                    debug!("Composite creation failed after cancel: {e}");
                    self.settle_cancelled(run);
                    return Err(ApiError::cancelled().into());
                }
                self.finish(run, AnalysisState::Failed(e.clone()));
                return Err(e.into());
            }
        };

        let token = CancellationToken::new();
        let proceed = {
            let mut flow = self.lock();
            if flow.run != run || flow.cancel_requested {
                false
            } else {
                flow.status = AnalysisState::Analyzing;
                flow.composite = Some(composite.clone());
                flow.analysis_token = Some(token.clone());
                true
            }
        };

        if !proceed {
            debug!("Analysis cancelled while creating composite {}", composite.id);
            self.api.delete_best_effort(&composite).await;
            self.settle_cancelled(run);
            return Err(ApiError::cancelled().into());
        }

        info!("Analyzing composite document {}", composite.id);

        match self.analyze(&composite, &token).await {
            Ok(result) => {
                if self.finish(run, AnalysisState::Completed(result.clone())) {
                    info!("Analysis of {} completed", composite.id);
                    Ok(result)
                } else {
                    Err(ApiError::cancelled().into())
                }
            }
            Err(e) if e.is_cancellation() => {
                self.settle_cancelled(run);
                Err(e.into())
            }
            Err(e) => {
                warn!("Analysis of {} failed: {e}", composite.id);
                self.finish(run, AnalysisState::Failed(e.clone()));
                Err(e.into())
            }
        }
    }

    /// Single-page mode: upload, then analyse right away.
    pub async fn upload_and_analyze(
        &self,
        page: &Page,
    ) -> Result<ExtractionResult, DocumentServiceError> {
        self.upload(page, None).await?;
        self.start_analysis().await
    }

    /// Stop a running analysis and delete its composite (best-effort).
    pub async fn cancel_analysis(&self) {
        let (token, composite) = {
            let mut flow = self.lock();
            match flow.status {
                AnalysisState::CreatingComposite => {
                    flow.cancel_requested = true;
                    flow.status = AnalysisState::Cancelled;
                    (None, None)
                }
                AnalysisState::Analyzing => {
                    flow.status = AnalysisState::Cancelled;
                    (flow.analysis_token.take(), flow.composite.take())
                }
                _ => return,
            }
        };

        info!("Cancelling analysis");

        if let Some(token) = token {
            token.cancel();
        }

        if let Some(composite) = composite {
            self.api.delete_best_effort(&composite).await;
            let mut flow = self.lock();
            if matches!(flow.status, AnalysisState::Cancelled) {
                flow.idle();
            }
        }
    }

    /// Back to a blank session. Remote documents are left alone.
    pub fn reset_to_initial_state(&self) {
        let token = {
            let mut flow = self.lock();
            flow.run += 1;
            let token = flow.analysis_token.take();
            flow.idle();
            token
        };

        if let Some(token) = token {
            token.cancel();
        }

        self.pipeline.clear();
        debug!("Document service reset");
    }

    // ============================================
    // FEEDBACK / QR
    // ============================================

    /// Send corrected extractions for the analysed document.
    ///
    /// Retries `retries` times with the configured delay. Failures go to the
    /// error sink; the flow ends `Idle` either way.
    pub async fn send_feedback(&self, feedback: &Feedback, retries: u32) -> FeedbackOutcome {
        let Some(document) = self.composite_document() else {
            debug!("No analysed document, skipping feedback");
            self.reset_to_initial_state();
            return FeedbackOutcome::Skipped;
        };

        let outcome = feedback::send_with_retries(
            &self.api,
            &document.id,
            feedback,
            retries,
            self.settings.feedback_retry_delay,
            self.error_sink.as_ref(),
        )
        .await;

        self.reset_to_initial_state();
        outcome
    }

    /// [`DocumentService::send_feedback`] with the configured retry count.
    pub async fn send_feedback_with_defaults(&self, feedback: &Feedback) -> FeedbackOutcome {
        self.send_feedback(feedback, self.settings.feedback_retries)
            .await
    }

    /// Extraction result for a scanned payment QR code. No network traffic.
    pub fn qr_code_result(&self, content: &str) -> Result<ExtractionResult, DocumentServiceError> {
        extraction_result_from_qr(content)
    }

    // ============================================
    // INTERNALS
    // ============================================

    async fn analyze(
        &self,
        composite: &Document,
        token: &CancellationToken,
    ) -> Result<ExtractionResult, ApiError> {
        let processed = self
            .api
            .wait_until_processed(composite, self.settings.poll_interval, Some(token))
            .await?;
        self.api.extractions(&processed, Some(token)).await
    }

    /// Record a terminal state if the run is still the active one.
    fn finish(&self, run: u64, status: AnalysisState) -> bool {
        let mut flow = self.lock();
        if flow.run != run || !flow.status.is_running() {
            return false;
        }
        flow.status = status;
        flow.analysis_token = None;
        true
    }

    /// True when `run` was cancelled or reset while its composite was being created.
    fn cancelled_during_creation(&self, run: u64) -> bool {
        let flow = self.lock();
        flow.run != run || flow.cancel_requested
    }

    fn settle_cancelled(&self, run: u64) {
        let mut flow = self.lock();
        if flow.run == run {
            flow.idle();
        }
    }

    fn lock(&self) -> MutexGuard<'_, FlowState> {
        self.flow.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
