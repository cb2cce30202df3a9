use anyhow::Result;
use async_trait::async_trait;
use tracing::{debug, info};

use super::ItemOperation;
use crate::storage::Client;
use crate::types::ItemOutcome;

/// Permanently delete a template by name (`DeleteTemplate`).
pub struct DeleteOperation;

#[async_trait]
impl ItemOperation for DeleteOperation {
    fn request_name(&self) -> &'static str {
        "DeleteTemplate"
    }

    async fn execute(&self, client: &Client, name: &str) -> Result<ItemOutcome> {
        client.delete_template(name).await?;
        debug!(template = name, "template deleted.");

        Ok(ItemOutcome::Deleted)
    }
}

/// Dry-run delete: fetch the template and report that it would have been
/// deleted. Nothing is removed.
pub struct PreviewDeleteOperation;

#[async_trait]
impl ItemOperation for PreviewDeleteOperation {
    fn request_name(&self) -> &'static str {
        "GetTemplate"
    }

    async fn execute(&self, client: &Client, name: &str) -> Result<ItemOutcome> {
        let content = client.get_template(name).await?;
        info!(
            template = name,
            subject = content.subject.as_deref(),
            "[dry-run] would have deleted template."
        );

        Ok(ItemOutcome::Previewed(content))
    }
}
