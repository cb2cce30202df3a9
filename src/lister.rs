use anyhow::{Result, anyhow};
use async_channel::Sender;
use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::config::FilterConfig;
use crate::filters::TemplateFilterChain;
use crate::storage::PageSource;
use crate::types::OperationStatistics;
use crate::types::error::SesrmError;
use crate::types::token::{PipelineCancellationToken, create_pipeline_cancellation_token};

/// Lists templates page by page and keeps the names that pass every filter.
///
/// This is the first phase of a run. It completes before any per-template
/// request is issued, so the executor only ever sees a finished list.
pub struct TemplateLister {
    filter_chain: TemplateFilterChain,
    cancellation_token: PipelineCancellationToken,
    stats_sender: Sender<OperationStatistics>,
}

impl TemplateLister {
    pub fn new(
        filter_config: FilterConfig,
        cancellation_token: PipelineCancellationToken,
        stats_sender: Sender<OperationStatistics>,
    ) -> Self {
        Self {
            filter_chain: TemplateFilterChain::new(filter_config),
            cancellation_token,
            stats_sender,
        }
    }

    /// Walk every page starting at `starting_token` and return the selected
    /// names in listing order.
    ///
    /// `starting_token` is handed to the page source as-is. Any page failure
    /// aborts the listing with [`SesrmError::Listing`]; no partial list is
    /// returned.
    pub async fn list_and_filter<P>(
        &self,
        page_source: &P,
        starting_token: Option<String>,
    ) -> Result<Vec<String>>
    where
        P: PageSource + ?Sized,
    {
        debug!(
            filters = ?self.filter_chain.filter_names(),
            starting_token = starting_token.as_deref(),
            "template listing has started."
        );

        let mut selected = Vec::new();
        let mut listed_count: u64 = 0;
        let mut page_count: u64 = 0;
        let mut next_token = starting_token;

        loop {
            if self.cancellation_token.is_cancelled() {
                info!("template listing cancelled.");
                return Err(anyhow!(SesrmError::Cancelled));
            }

            let requested_token = next_token.take();
            let page = tokio::select! {
                biased;
                _ = self.cancellation_token.cancelled() => {
                    info!("template listing cancelled while a page request was in flight.");
                    return Err(anyhow!(SesrmError::Cancelled));
                }
                page = page_source.list_templates(requested_token.clone()) => page,
            };
            let page = page.map_err(|e| {
                e.context(SesrmError::Listing(format!(
                    "page {} request failed",
                    page_count + 1
                )))
            })?;
            page_count += 1;

            for template in &page.templates {
                listed_count += 1;
                self.send_stats(OperationStatistics::TemplateListed {
                    name: template.name.clone(),
                })
                .await;

                if self.filter_chain.is_selected(template) {
                    debug!(
                        template = template.name,
                        created_at = template.created_at.to_rfc3339(),
                        "template selected."
                    );
                    selected.push(template.name.clone());
                } else {
                    self.send_stats(OperationStatistics::TemplateSkipped {
                        name: template.name.clone(),
                    })
                    .await;
                }
            }

            match page.next_token {
                Some(token) if requested_token.as_ref() == Some(&token) => {
                    return Err(anyhow!(SesrmError::Listing(format!(
                        "provider returned the same NextToken twice (page {page_count})"
                    ))));
                }
                Some(token) => next_token = Some(token),
                None => break,
            }
        }

        info!(
            pages = page_count,
            listed = listed_count,
            selected = selected.len(),
            "template listing has been completed."
        );

        Ok(selected)
    }

    async fn send_stats(&self, stats: OperationStatistics) {
        let _ = self.stats_sender.send(stats).await;
    }
}

/// List every template and keep the names created strictly before `cutoff`.
///
/// Convenience form of [`TemplateLister::list_and_filter`] with only the age
/// filter and no progress reporting.
pub async fn list_and_filter<P>(
    page_source: &P,
    cutoff: DateTime<Utc>,
    starting_token: Option<String>,
) -> Result<Vec<String>>
where
    P: PageSource + ?Sized,
{
    let (stats_sender, _) = async_channel::unbounded();
    let lister = TemplateLister::new(
        FilterConfig {
            before_time: Some(cutoff),
            ..Default::default()
        },
        create_pipeline_cancellation_token(),
        stats_sender,
    );

    lister.list_and_filter(page_source, starting_token).await
}
