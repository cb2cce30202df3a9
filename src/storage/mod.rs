use anyhow::Result;
use async_trait::async_trait;
use dyn_clone::DynClone;

use crate::config::ClientConfig;
use crate::types::{TemplateContent, TemplatePage};

pub mod ses;

/// Type alias for a boxed per-template client.
pub type Client = Box<dyn TemplateClient + Send + Sync>;

/// Type alias for a boxed listing source.
pub type Source = Box<dyn PageSource + Send + Sync>;

/// Paged listing of templates.
///
/// A page request either returns a full page or fails. Implementations must
/// not retry internally; a failed page aborts the listing.
#[async_trait]
pub trait PageSource {
    /// Fetch the page identified by `next_token` (`None` for the first page).
    async fn list_templates(&self, next_token: Option<String>) -> Result<TemplatePage>;
}

/// Per-template requests issued by the batch executor.
///
/// Cloned into every worker task, so implementations hold their SDK client
/// behind an `Arc`.
///
/// Errors should carry an [`ItemError`](crate::types::error::ItemError) so
/// that the provider's error code survives into the result list.
#[async_trait]
pub trait TemplateClient: DynClone {
    async fn get_template(&self, name: &str) -> Result<TemplateContent>;

    async fn delete_template(&self, name: &str) -> Result<()>;
}

dyn_clone::clone_trait_object!(TemplateClient);

/// Create the SES-backed listing source and template client.
///
/// Both share one SDK client built from `client_config`.
pub async fn create_storage(client_config: &ClientConfig, max_items: i32) -> (Source, Client) {
    let storage = ses::SesStorage::new(client_config, max_items).await;
    (Box::new(storage.clone()), Box::new(storage))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CLITimeoutConfig;
    use crate::types::{AccessKeys, ClientConfigLocation, SesCredentials};

    fn init_dummy_tracing_subscriber() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("dummy=trace")
            .try_init();
    }

    fn make_test_client_config() -> ClientConfig {
        ClientConfig {
            client_config_location: ClientConfigLocation::default(),
            credential: SesCredentials::Credentials {
                access_keys: AccessKeys {
                    access_key: "test_key".to_string(),
                    secret_access_key: "test_secret".to_string(),
                    session_token: None,
                },
            },
            region: Some("us-east-1".to_string()),
            endpoint_url: Some("http://localhost:4566".to_string()),
            cli_timeout_config: CLITimeoutConfig::default(),
            disable_stalled_stream_protection: false,
        }
    }

    #[tokio::test]
    async fn create_ses_storage_with_static_credentials() {
        init_dummy_tracing_subscriber();

        let (_source, client) = create_storage(&make_test_client_config(), 50).await;

        // Clone through the trait object, as the executor does per worker.
        let _cloned = client.clone();
    }
}
