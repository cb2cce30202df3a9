/// A cancellation token used to signal pipeline shutdown.
///
/// This is a type alias for [`tokio_util::sync::CancellationToken`]. Pass the
/// token to [`TemplatePipeline::new`](crate::TemplatePipeline::new) and call
/// [`cancel()`](tokio_util::sync::CancellationToken::cancel) on it to stop a
/// running batch (e.g., in a Ctrl+C handler). Requests that already completed
/// keep their effect.
pub type PipelineCancellationToken = tokio_util::sync::CancellationToken;

/// Create a new [`PipelineCancellationToken`].
///
/// # Example
///
/// ```
/// use sesrm_rs::create_pipeline_cancellation_token;
///
/// let token = create_pipeline_cancellation_token();
/// assert!(!token.is_cancelled());
///
/// token.cancel();
/// assert!(token.is_cancelled());
/// ```
pub fn create_pipeline_cancellation_token() -> PipelineCancellationToken {
    tokio_util::sync::CancellationToken::new()
}
