use crate::error::ApiError;

use log::error;

/// Fire-and-forget channel for failures nobody awaits.
pub trait ErrorSink: Send + Sync {
    fn handle(&self, error: &ApiError, context: &str);
}

/// Default sink: log at error level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogErrorSink;

impl ErrorSink for LogErrorSink {
    fn handle(&self, error: &ApiError, context: &str) {
        error!("{context}: [{}] {error}", error.kind());
    }
}
