//! Concurrent per-template request execution.
//!
//! The [`BatchExecutor`] issues exactly one request per name, runs them on a
//! worker pool bounded by `worker_size`, and waits for every request to
//! finish before returning. A failure on one template is captured as that
//! template's [`ItemOutcome::Failed`] and never short-circuits the batch.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_channel::Sender;
use async_trait::async_trait;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info};

use crate::config::Config;
use crate::storage::Client;
use crate::types::error::{ITEM_ERROR_CODE_PANIC, ITEM_ERROR_CODE_TIMEOUT, ItemError};
use crate::types::token::PipelineCancellationToken;
use crate::types::{ItemOutcome, OperationKind, OperationResult, OperationStatistics};

pub mod delete;
pub mod get;

pub use delete::{DeleteOperation, PreviewDeleteOperation};
pub use get::GetOperation;

/// A single per-template request.
///
/// Implementations issue exactly one kind of request and translate its
/// success into an [`ItemOutcome`]. Errors are turned into
/// [`ItemOutcome::Failed`] by the executor.
#[async_trait]
pub trait ItemOperation: Send + Sync {
    /// Request name used in log output (e.g. `GetTemplate`).
    fn request_name(&self) -> &'static str;

    async fn execute(&self, client: &Client, name: &str) -> Result<ItemOutcome>;
}

/// Select the request issued for every name of a batch.
///
/// With `dry_run`, a Delete batch issues Get requests and reports
/// [`ItemOutcome::Previewed`] instead of deleting anything.
pub fn operation_for(kind: OperationKind, dry_run: bool) -> Arc<dyn ItemOperation> {
    match kind {
        OperationKind::Get => Arc::new(GetOperation),
        OperationKind::Delete if dry_run => Arc::new(PreviewDeleteOperation),
        OperationKind::Delete => Arc::new(DeleteOperation),
    }
}

pub struct BatchExecutor {
    client: Client,
    worker_size: u16,
    item_timeout: Option<Duration>,
    dry_run: bool,
    cancellation_token: PipelineCancellationToken,
    stats_sender: Sender<OperationStatistics>,
}

impl BatchExecutor {
    pub fn new(
        client: Client,
        config: &Config,
        cancellation_token: PipelineCancellationToken,
        stats_sender: Sender<OperationStatistics>,
    ) -> Self {
        Self {
            client,
            worker_size: config.worker_size,
            item_timeout: config.item_timeout_milliseconds.map(Duration::from_millis),
            dry_run: config.dry_run,
            cancellation_token,
            stats_sender,
        }
    }

    /// Issue one `kind` request per name and collect every outcome.
    ///
    /// `results[i]` corresponds to `names[i]`. Returns only after all
    /// requests have completed, failed, timed out or been cancelled.
    pub async fn execute_batch(&self, names: Vec<String>, kind: OperationKind) -> Vec<OperationResult> {
        if names.is_empty() {
            debug!(operation = kind.as_str(), "nothing to execute.");
            return Vec::new();
        }

        let operation = operation_for(kind, self.dry_run);
        // A zero-permit semaphore would never dispatch anything.
        let semaphore = Arc::new(Semaphore::new(usize::from(self.worker_size.max(1))));

        info!(
            operation = kind.as_str(),
            request = operation.request_name(),
            count = names.len(),
            worker_size = self.worker_size,
            dry_run = self.dry_run,
            "batch execution has started."
        );

        let mut join_set = JoinSet::new();
        for (index, name) in names.iter().enumerate() {
            let item = ItemTask {
                name: name.clone(),
                client: self.client.clone(),
                operation: operation.clone(),
                semaphore: semaphore.clone(),
                cancellation_token: self.cancellation_token.clone(),
                item_timeout: self.item_timeout,
            };
            join_set.spawn(async move { (index, item.run().await) });
        }

        let mut slots: Vec<Option<ItemOutcome>> = vec![None; names.len()];
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((index, outcome)) => {
                    self.send_stats(OperationStatistics::from_outcome(&names[index], &outcome))
                        .await;
                    slots[index] = Some(outcome);
                }
                Err(e) => {
                    error!("batch item task failed: {}", e);
                }
            }
        }

        let results: Vec<OperationResult> = names
            .iter()
            .zip(slots)
            .map(|(name, outcome)| {
                let outcome = outcome.unwrap_or_else(|| {
                    ItemOutcome::Failed(ItemError::new(
                        ITEM_ERROR_CODE_PANIC,
                        "item task ended without reporting an outcome",
                    ))
                });
                OperationResult::new(name, outcome)
            })
            .collect();

        debug!(
            operation = kind.as_str(),
            count = results.len(),
            "batch execution has been completed."
        );

        results
    }

    async fn send_stats(&self, stats: OperationStatistics) {
        let _ = self.stats_sender.send(stats).await;
    }
}

struct ItemTask {
    name: String,
    client: Client,
    operation: Arc<dyn ItemOperation>,
    semaphore: Arc<Semaphore>,
    cancellation_token: PipelineCancellationToken,
    item_timeout: Option<Duration>,
}

impl ItemTask {
    async fn run(self) -> ItemOutcome {
        let permit = tokio::select! {
            biased;
            _ = self.cancellation_token.cancelled() => {
                debug!(template = self.name, "cancelled before dispatch.");
                return ItemOutcome::Cancelled { dispatched: false };
            }
            permit = self.semaphore.clone().acquire_owned() => match permit {
                Ok(permit) => permit,
                Err(_) => return ItemOutcome::Cancelled { dispatched: false },
            },
        };

        let name = self.name.clone();
        let client = self.client;
        let operation = self.operation;
        let item_timeout = self.item_timeout;

        // Inner task so that a panic in the request is caught by the JoinHandle.
        let mut handle = tokio::spawn(async move {
            debug!(
                template = name,
                request = operation.request_name(),
                "sending request."
            );
            let request = operation.execute(&client, &name);
            let result = match item_timeout {
                Some(item_timeout) => match tokio::time::timeout(item_timeout, request).await {
                    Ok(result) => result,
                    Err(_) => {
                        return ItemOutcome::Failed(ItemError::new(
                            ITEM_ERROR_CODE_TIMEOUT,
                            &format!(
                                "{} did not complete within {} milliseconds.",
                                operation.request_name(),
                                item_timeout.as_millis()
                            ),
                        ));
                    }
                },
                None => request.await,
            };

            result.unwrap_or_else(|e| ItemOutcome::Failed(ItemError::from_error(&e)))
        });

        let outcome = tokio::select! {
            biased;
            joined = &mut handle => match joined {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!(template = self.name, "item task panicked: {}", e);
                    ItemOutcome::Failed(ItemError::new(ITEM_ERROR_CODE_PANIC, &e.to_string()))
                }
            },
            _ = self.cancellation_token.cancelled() => {
                handle.abort();
                info!(template = self.name, "cancelled while in flight; outcome is unknown.");
                ItemOutcome::Cancelled { dispatched: true }
            }
        };

        drop(permit);
        outcome
    }
}
