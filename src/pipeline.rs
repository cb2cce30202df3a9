//! Run orchestrator.
//!
//! A run has two phases that never overlap: the [`TemplateLister`] walks the
//! whole listing and produces the selected names, then the
//! [`BatchExecutor`] issues one request per name and waits for all of them.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{Result, anyhow};
use async_channel::{Receiver, Sender};
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::executor::BatchExecutor;
use crate::lister::TemplateLister;
use crate::safety::SafetyChecker;
use crate::storage::{self, Client, PageSource, Source};
use crate::types::error::{SesrmError, is_cancelled_error};
use crate::types::token::PipelineCancellationToken;
use crate::types::{BatchSummary, ItemOutcome, OperationResult, OperationStatistics};

/// Lists, filters and then gets or deletes SES templates.
///
/// ## Usage
///
/// ```no_run
/// # async fn example() {
/// use sesrm_rs::types::OperationKind;
/// use sesrm_rs::{Config, TemplatePipeline, create_pipeline_cancellation_token};
///
/// let config = Config::for_operation(OperationKind::Get, 30);
/// let cancellation_token = create_pipeline_cancellation_token();
/// let mut pipeline = TemplatePipeline::new(config, cancellation_token).await;
/// pipeline.close_stats_sender();
/// pipeline.run().await;
///
/// if pipeline.has_error() {
///     eprintln!("{:?}", pipeline.get_errors_and_consume().unwrap()[0]);
/// }
/// for result in pipeline.get_results() {
///     println!("{}: {:?}", result.name, result.outcome);
/// }
/// # }
/// ```
pub struct TemplatePipeline {
    config: Config,
    source: Arc<dyn PageSource + Send + Sync>,
    client: Client,
    cancellation_token: PipelineCancellationToken,
    stats_sender: Sender<OperationStatistics>,
    stats_receiver: Receiver<OperationStatistics>,
    has_error: Arc<AtomicBool>,
    has_panic: Arc<AtomicBool>,
    has_warning: Arc<AtomicBool>,
    errors: Arc<Mutex<VecDeque<anyhow::Error>>>,
    results: Vec<OperationResult>,
    ready: bool,
    prerequisites_checked: bool,
}

impl TemplatePipeline {
    /// Create a pipeline backed by Amazon SES.
    ///
    /// Uses `config.client_config`, or the standard AWS environment chain when
    /// it is `None`.
    pub async fn new(config: Config, cancellation_token: PipelineCancellationToken) -> Self {
        let client_config = config.client_config.clone().unwrap_or_default();
        let (source, client) = storage::create_storage(&client_config, config.max_items).await;

        Self::with_storage(config, source, client, cancellation_token)
    }

    /// Create a pipeline over any page source and template client.
    pub fn with_storage(
        config: Config,
        source: Source,
        client: Client,
        cancellation_token: PipelineCancellationToken,
    ) -> Self {
        // Unbounded so that progress reporting never slows the workers.
        let (stats_sender, stats_receiver) = async_channel::unbounded();

        Self {
            config,
            source: Arc::from(source),
            client,
            cancellation_token,
            stats_sender,
            stats_receiver,
            has_error: Arc::new(AtomicBool::new(false)),
            has_panic: Arc::new(AtomicBool::new(false)),
            has_warning: Arc::new(AtomicBool::new(false)),
            errors: Arc::new(Mutex::new(VecDeque::new())),
            results: Vec::new(),
            ready: true,
            prerequisites_checked: false,
        }
    }

    /// Run the pipeline.
    ///
    /// 1. Check prerequisites (cutoff present, confirmation)
    /// 2. List and filter templates
    /// 3. Execute the batch
    /// 4. Close the stats channel
    ///
    /// Errors are recorded, not returned; inspect them with
    /// [`has_error`](Self::has_error) and
    /// [`get_errors_and_consume`](Self::get_errors_and_consume).
    pub async fn run(&mut self) {
        assert!(self.ready, "TemplatePipeline::run() called more than once");
        self.ready = false;

        if !self.prerequisites_checked {
            if let Err(e) = self.check_prerequisites().await {
                self.record_error(e);
                self.shutdown();
                return;
            }
        }

        self.execute_pipeline().await;

        self.shutdown();
    }

    /// Check prerequisites before running the pipeline.
    ///
    /// Call this before `run()` to perform actions (e.g. starting a progress
    /// indicator) between the confirmation prompt and execution. If not
    /// called explicitly, `run()` calls it.
    pub async fn check_prerequisites(&mut self) -> Result<()> {
        if self.config.filter_config.before_time.is_none() {
            return Err(anyhow!(SesrmError::InvalidConfig(
                "retention cutoff (filter_config.before_time) is not set".to_string()
            )));
        }

        let checker = SafetyChecker::new(&self.config);
        checker.check_before_execution()?;

        self.prerequisites_checked = true;
        Ok(())
    }

    pub fn has_error(&self) -> bool {
        self.has_error.load(Ordering::SeqCst)
    }

    /// Check if the listing task panicked.
    pub fn has_panic(&self) -> bool {
        self.has_panic.load(Ordering::SeqCst)
    }

    /// Check if any template request failed.
    pub fn has_warning(&self) -> bool {
        self.has_warning.load(Ordering::SeqCst)
    }

    /// Consume and return all accumulated errors.
    ///
    /// Returns `None` if no errors occurred.
    pub fn get_errors_and_consume(&self) -> Option<Vec<anyhow::Error>> {
        if !self.has_error() {
            return None;
        }
        let mut error_list = self.errors.lock().unwrap();
        let mut errors = Vec::with_capacity(error_list.len());
        while let Some(e) = error_list.pop_front() {
            errors.push(e);
        }
        Some(errors)
    }

    /// Get error messages without consuming them.
    ///
    /// Returns `None` if no errors occurred.
    pub fn get_error_messages(&self) -> Option<Vec<String>> {
        if !self.has_error() {
            return None;
        }
        let error_list = self.errors.lock().unwrap();
        Some(error_list.iter().map(|e| e.to_string()).collect())
    }

    /// Per-template results of the batch; `results[i]` matches the i-th
    /// selected name. Empty if the batch never ran.
    pub fn get_results(&self) -> &[OperationResult] {
        &self.results
    }

    pub fn get_summary(&self) -> BatchSummary {
        BatchSummary::from_results(&self.results)
    }

    /// Get the stats receiver for progress reporting.
    pub fn get_stats_receiver(&self) -> Receiver<OperationStatistics> {
        self.stats_receiver.clone()
    }

    /// Close the stats sender to signal the progress reporter to finish.
    ///
    /// Call this before `run()` if you don't need progress reporting.
    pub fn close_stats_sender(&self) {
        self.stats_sender.close();
    }

    // -----------------------------------------------------------------------
    // Internal methods
    // -----------------------------------------------------------------------

    async fn execute_pipeline(&mut self) {
        let names = match self.list_templates().await {
            Ok(names) => names,
            Err(e) => {
                if is_cancelled_error(&e) {
                    info!("pipeline cancelled during listing.");
                } else {
                    error!("template listing failed: {:#}", e);
                }
                self.record_error(e);
                return;
            }
        };

        info!(
            operation = self.config.operation.as_str(),
            selected = names.len(),
            "template listing finished."
        );

        let executor = BatchExecutor::new(
            self.client.clone(),
            &self.config,
            self.cancellation_token.clone(),
            self.stats_sender.clone(),
        );
        self.results = executor
            .execute_batch(names, self.config.operation)
            .await;

        self.review_results();

        // Checked once after every request has completed.
        if self.config.warn_as_error && self.has_warning() {
            let summary = self.get_summary();
            self.record_error(anyhow!(SesrmError::Pipeline(format!(
                "{} of {} template requests failed (--warn-as-error)",
                summary.failed,
                summary.total()
            ))));
        }
    }

    /// Run the lister in its own task so that a panic is reported as a
    /// listing failure.
    async fn list_templates(&self) -> Result<Vec<String>> {
        let lister = TemplateLister::new(
            self.config.filter_config.clone(),
            self.cancellation_token.clone(),
            self.stats_sender.clone(),
        );
        let source = self.source.clone();
        let starting_token = self.config.starting_token.clone();

        let join_result =
            tokio::spawn(async move { lister.list_and_filter(source.as_ref(), starting_token).await })
                .await;

        match join_result {
            Ok(result) => result,
            Err(e) => {
                self.has_panic.store(true, Ordering::SeqCst);
                error!("template lister task panicked: {}", e);
                Err(anyhow!(SesrmError::Listing(format!(
                    "template lister task panicked: {e}"
                ))))
            }
        }
    }

    fn review_results(&self) {
        let mut cancelled = false;

        for result in &self.results {
            match &result.outcome {
                ItemOutcome::Failed(item_error) => {
                    self.has_warning.store(true, Ordering::SeqCst);
                    warn!(
                        template = result.name,
                        code = item_error.code,
                        message = item_error.message,
                        "{} request failed for template {}.",
                        self.config.operation,
                        result.name,
                    );
                }
                ItemOutcome::Cancelled { dispatched } => {
                    cancelled = true;
                    if *dispatched {
                        warn!(
                            template = result.name,
                            "{} request was in flight when cancelled; its effect is unknown.",
                            self.config.operation,
                        );
                    }
                }
                _ => {}
            }
        }

        let summary = self.get_summary();
        info!(
            retrieved = summary.retrieved,
            deleted = summary.deleted,
            previewed = summary.previewed,
            failed = summary.failed,
            cancelled = summary.cancelled,
            "batch finished."
        );

        if cancelled {
            debug!("batch was cancelled.");
            self.record_error(anyhow!(SesrmError::Cancelled));
        }
    }

    fn record_error(&self, error: anyhow::Error) {
        self.has_error.store(true, Ordering::SeqCst);
        self.errors.lock().unwrap().push_back(error);
    }

    fn shutdown(&self) {
        self.close_stats_sender();
    }
}
