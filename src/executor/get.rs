use anyhow::Result;
use async_trait::async_trait;
use tracing::debug;

use super::ItemOperation;
use crate::storage::Client;
use crate::types::ItemOutcome;

/// Fetch a template by name (`GetTemplate`).
pub struct GetOperation;

#[async_trait]
impl ItemOperation for GetOperation {
    fn request_name(&self) -> &'static str {
        "GetTemplate"
    }

    async fn execute(&self, client: &Client, name: &str) -> Result<ItemOutcome> {
        let content = client.get_template(name).await?;
        debug!(template = name, subject = content.subject.as_deref(), "template retrieved.");

        Ok(ItemOutcome::Retrieved(content))
    }
}
