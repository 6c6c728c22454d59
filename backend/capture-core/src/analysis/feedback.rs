//! Feedback submission with fixed-delay retries.

use super::error_sink::ErrorSink;

use crate::documents::DocumentApi;
use crate::error::ApiError;

use models::Feedback;

use std::time::Duration;

use backoff::backoff::{Backoff, Constant};
use log::{debug, info, warn};
use tokio::time::sleep as TokioSleep;

/// How a feedback call ended. Never an error for the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackOutcome {
    Sent { attempts: u32 },
    /// Every attempt failed; the last error went to the error sink.
    Exhausted { attempts: u32 },
    /// No analysed document to attach feedback to.
    Skipped,
}

impl FeedbackOutcome {
    pub fn is_sent(&self) -> bool {
        matches!(self, FeedbackOutcome::Sent { .. })
    }
}

/// Submit feedback, retrying up to `retries` times after the first attempt.
pub(crate) async fn send_with_retries(
    api: &DocumentApi,
    document_id: &str,
    feedback: &Feedback,
    retries: u32,
    delay: Duration,
    error_sink: &dyn ErrorSink,
) -> FeedbackOutcome {
    let mut backoff = Constant::new(delay);
    let mut attempts = 0;

    loop {
        attempts += 1;

        let error: ApiError = match api.send_feedback(document_id, feedback).await {
            Ok(()) => {
                info!("Feedback sent for document {document_id} after {attempts} attempt(s)");
                return FeedbackOutcome::Sent { attempts };
            }
            Err(e) => e,
        };

        if attempts > retries {
            warn!("Feedback for document {document_id} failed after {attempts} attempt(s)");
            error_sink.handle(&error, "Sending feedback failed");
            return FeedbackOutcome::Exhausted { attempts };
        }

        match backoff.next_backoff() {
            Some(duration) => {
                debug!(
                    "Feedback attempt {attempts} failed ({}), retrying in {duration:?}",
                    error.kind()
                );
                TokioSleep(duration).await;
            }
            None => {
                error_sink.handle(&error, "Sending feedback failed");
                return FeedbackOutcome::Exhausted { attempts };
            }
        }
    }
}
