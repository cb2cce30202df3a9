pub mod client_builder;

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use aws_sdk_ses::Client;
use aws_sdk_ses::error::SdkError;
use aws_sdk_ses::types::{Template, TemplateMetadata as SdkTemplateMetadata};
use aws_smithy_types::error::display::DisplayErrorContext;
use aws_smithy_types::error::metadata::ProvideErrorMetadata;
use aws_smithy_types_convert::date_time::DateTimeExt;
use std::sync::Arc;

use crate::config::ClientConfig;
use crate::storage::{PageSource, TemplateClient};
use crate::types::error::{ITEM_ERROR_CODE_NOT_AVAILABLE, ItemError, SesrmError};
use crate::types::{TemplateContent, TemplateMetadata, TemplatePage};

/// Extracts the SES error code and message from an AWS SDK error.
///
/// Service errors yield the SES error code (e.g. "TemplateDoesNotExist",
/// "Throttling") and message. Transport and construction failures yield
/// "N/A" and the full error chain.
fn extract_sdk_error_details<E>(e: &SdkError<E>) -> (String, String)
where
    E: std::error::Error + ProvideErrorMetadata + 'static,
{
    if let Some(service_err) = e.as_service_error() {
        (
            service_err.code().unwrap_or("unknown").to_string(),
            service_err.message().unwrap_or("no message").to_string(),
        )
    } else {
        (
            ITEM_ERROR_CODE_NOT_AVAILABLE.to_string(),
            DisplayErrorContext(e).to_string(),
        )
    }
}

/// SES v1 template storage.
///
/// Implements both [`PageSource`] (ListTemplates) and [`TemplateClient`]
/// (GetTemplate, DeleteTemplate) over one shared SDK client.
#[derive(Clone)]
pub struct SesStorage {
    client: Arc<Client>,
    max_items: i32,
}

impl SesStorage {
    pub async fn new(client_config: &ClientConfig, max_items: i32) -> Self {
        Self::from_client(client_config.create_client().await, max_items)
    }

    pub fn from_client(client: Client, max_items: i32) -> Self {
        Self {
            client: Arc::new(client),
            max_items,
        }
    }
}

#[async_trait]
impl PageSource for SesStorage {
    async fn list_templates(&self, next_token: Option<String>) -> Result<TemplatePage> {
        let output = self
            .client
            .list_templates()
            .set_next_token(next_token)
            .max_items(self.max_items)
            .send()
            .await
            .map_err(|e| {
                let (ses_error_code, ses_error_message) = extract_sdk_error_details(&e);
                tracing::error!(
                    ses_error_code = ses_error_code,
                    ses_error_message = ses_error_message,
                    "SES ListTemplates API call failed: {} ({}).",
                    ses_error_code,
                    ses_error_message,
                );
                anyhow!(ItemError::new(&ses_error_code, &ses_error_message))
                    .context("aws_sdk_ses::client::list_templates() failed.")
            })?;

        let templates = output
            .templates_metadata()
            .iter()
            .map(to_template_metadata)
            .collect::<Result<Vec<_>>>()?;

        Ok(TemplatePage {
            templates,
            next_token: output.next_token().map(String::from),
        })
    }
}

#[async_trait]
impl TemplateClient for SesStorage {
    async fn get_template(&self, name: &str) -> Result<TemplateContent> {
        let output = self
            .client
            .get_template()
            .template_name(name)
            .send()
            .await
            .map_err(|e| {
                let (ses_error_code, ses_error_message) = extract_sdk_error_details(&e);
                tracing::warn!(
                    name = name,
                    ses_error_code = ses_error_code,
                    ses_error_message = ses_error_message,
                    "SES GetTemplate API call failed for {}: {} ({}).",
                    name,
                    ses_error_code,
                    ses_error_message,
                );
                anyhow!(ItemError::new(&ses_error_code, &ses_error_message))
                    .context("aws_sdk_ses::client::get_template() failed.")
            })?;

        to_template_content(name, output.template())
    }

    async fn delete_template(&self, name: &str) -> Result<()> {
        self.client
            .delete_template()
            .template_name(name)
            .send()
            .await
            .map_err(|e| {
                let (ses_error_code, ses_error_message) = extract_sdk_error_details(&e);
                tracing::warn!(
                    name = name,
                    ses_error_code = ses_error_code,
                    ses_error_message = ses_error_message,
                    "SES DeleteTemplate API call failed for {}: {} ({}).",
                    name,
                    ses_error_code,
                    ses_error_message,
                );
                anyhow!(ItemError::new(&ses_error_code, &ses_error_message))
                    .context("aws_sdk_ses::client::delete_template() failed.")
            })?;

        Ok(())
    }
}

fn to_template_metadata(metadata: &SdkTemplateMetadata) -> Result<TemplateMetadata> {
    let name = metadata.name().ok_or_else(|| {
        anyhow!(SesrmError::AwsSdk(
            "ListTemplates returned a template without a name.".to_string()
        ))
    })?;
    let created_timestamp = metadata.created_timestamp().ok_or_else(|| {
        anyhow!(SesrmError::AwsSdk(format!(
            "ListTemplates returned no creation timestamp for {name}."
        )))
    })?;
    let created_at = created_timestamp
        .to_chrono_utc()
        .with_context(|| format!("creation timestamp of {name} is out of range."))?;

    Ok(TemplateMetadata::new(name, created_at))
}

fn to_template_content(name: &str, template: Option<&Template>) -> Result<TemplateContent> {
    let template = template.ok_or_else(|| {
        anyhow!(ItemError::new(
            ITEM_ERROR_CODE_NOT_AVAILABLE,
            &format!("GetTemplate returned no template for {name}."),
        ))
    })?;

    Ok(TemplateContent {
        name: template.template_name().to_string(),
        subject: template.subject_part().map(String::from),
        text: template.text_part().map(String::from),
        html: template.html_part().map(String::from),
    })
}
