use anyhow::Error;
use thiserror::Error;

use crate::types::{ItemOutcome, OperationResult};

/// Application-level error types for sesrm-rs.
///
/// Setup and listing errors abort the run. Per-template failures are not
/// represented here; they are reported as [`ItemError`] data in the result list.
///
/// ## Exit Codes
///
/// Each variant maps to an exit code (via `exit_code()`):
/// - 0: Non-error conditions (Cancelled)
/// - 1: General errors (AwsSdk, Listing, Pipeline)
/// - 2: Configuration errors (InvalidConfig)
/// - 3: Partial failure (some templates processed, some failed)
#[derive(Error, Debug, PartialEq)]
pub enum SesrmError {
    /// AWS SDK error outside of a per-template request.
    #[error("AWS SDK error: {0}")]
    AwsSdk(String),

    /// Invalid or missing configuration, detected before any request is sent.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The template listing failed. Nothing is executed after this.
    #[error("Template listing failed: {0}")]
    Listing(String),

    /// Operation cancelled by user.
    #[error("Operation cancelled by user")]
    Cancelled,

    /// Some templates failed.
    #[error("Partial failure: {succeeded} succeeded, {failed} failed")]
    PartialFailure { succeeded: u64, failed: u64 },

    /// General pipeline error.
    #[error("Pipeline error: {0}")]
    Pipeline(String),
}

const PARTIAL_FAILURE_EXIT_CODE: i32 = 3;

impl SesrmError {
    pub fn exit_code(&self) -> i32 {
        match self {
            SesrmError::Cancelled => 0,
            SesrmError::InvalidConfig(_) => 2,
            SesrmError::PartialFailure { .. } => PARTIAL_FAILURE_EXIT_CODE,
            _ => 1,
        }
    }
}

/// Failure of a single get/delete request.
///
/// `code` is the provider error code (e.g. `TemplateDoesNotExist`,
/// `Throttling`), `N/A` when the failure did not come from the service.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{code}: {message}")]
pub struct ItemError {
    pub code: String,
    pub message: String,
}

pub const ITEM_ERROR_CODE_NOT_AVAILABLE: &str = "N/A";
pub const ITEM_ERROR_CODE_TIMEOUT: &str = "Timeout";
pub const ITEM_ERROR_CODE_PANIC: &str = "TaskPanicked";

impl ItemError {
    pub fn new(code: &str, message: &str) -> Self {
        Self {
            code: code.to_string(),
            message: message.to_string(),
        }
    }

    /// Recover the [`ItemError`] carried inside an `anyhow::Error`, if any.
    ///
    /// Errors of other types keep their full context chain as the message.
    pub fn from_error(e: &Error) -> Self {
        if let Some(item_error) = e.downcast_ref::<ItemError>() {
            return item_error.clone();
        }
        Self::new(ITEM_ERROR_CODE_NOT_AVAILABLE, &format!("{e:#}"))
    }
}

pub fn is_cancelled_error(e: &Error) -> bool {
    if let Some(err) = e.downcast_ref::<SesrmError>() {
        return *err == SesrmError::Cancelled;
    }
    false
}

pub fn is_listing_error(e: &Error) -> bool {
    matches!(e.downcast_ref::<SesrmError>(), Some(SesrmError::Listing(_)))
}

/// Extract the exit code from an anyhow::Error, defaulting to 1.
pub fn exit_code_from_error(e: &Error) -> i32 {
    if let Some(err) = e.downcast_ref::<SesrmError>() {
        return err.exit_code();
    }
    1
}

/// Exit code of a finished run.
///
/// Any error other than [`SesrmError::Cancelled`] decides the code. Otherwise
/// a failed item, or an item cancelled while its request was in flight,
/// yields the partial-failure code 3, even when the run was cancelled.
pub fn exit_code_for_run(errors: &[Error], results: &[OperationResult]) -> i32 {
    if let Some(e) = errors.iter().find(|e| !is_cancelled_error(e)) {
        return exit_code_from_error(e);
    }

    let unsettled = results.iter().any(|result| {
        matches!(
            result.outcome,
            ItemOutcome::Failed(_) | ItemOutcome::Cancelled { dispatched: true }
        )
    });
    if unsettled {
        return PARTIAL_FAILURE_EXIT_CODE;
    }

    0
}
