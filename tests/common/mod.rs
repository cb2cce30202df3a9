//! Shared integration test infrastructure for sesrm-rs.
//!
//! Provides an in-memory template store that plays both the listing source
//! and the per-template client, and `TestHelper` for building configs and
//! running the pipeline against it.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use sesrm_rs::config::args::build_config_from_args;
use sesrm_rs::types::error::ItemError;
use sesrm_rs::{
    BatchSummary, Config, OperationResult, PageSource, TemplateClient, TemplateContent,
    TemplateMetadata, TemplatePage, TemplatePipeline, create_pipeline_cancellation_token,
    exit_code_for_run,
};

/// Templates returned per listing page.
pub const PAGE_SIZE: usize = 2;

/// Result of running a template pipeline.
#[derive(Debug)]
pub struct PipelineResult {
    pub results: Vec<OperationResult>,
    pub summary: BatchSummary,
    pub has_error: bool,
    pub has_warning: bool,
    pub errors: Vec<String>,
    /// Process exit code the CLI would report for this run.
    pub exit_code: i32,
}

/// In-memory SES account.
///
/// Templates are listed in name order, `PAGE_SIZE` per page. Every clone
/// shares the same state.
#[derive(Clone, Default)]
pub struct TemplateStore {
    templates: Arc<Mutex<BTreeMap<String, DateTime<Utc>>>>,
    fail_on_page: Option<usize>,
    failing_template: Option<(String, String)>,
    list_requests: Arc<AtomicUsize>,
    get_requests: Arc<AtomicUsize>,
    delete_requests: Arc<AtomicUsize>,
}

impl TemplateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the listing request for the given 1-based page number.
    pub fn failing_on_page(mut self, page: usize) -> Self {
        self.fail_on_page = Some(page);
        self
    }

    /// Fail every Get and Delete request for `name` with the provider `code`.
    pub fn failing_requests_for(mut self, name: &str, code: &str) -> Self {
        self.failing_template = Some((name.to_string(), code.to_string()));
        self
    }

    fn check_request(&self, name: &str) -> Result<()> {
        match &self.failing_template {
            Some((failing_name, code)) if failing_name == name => Err(anyhow!(ItemError::new(
                code,
                &format!("request for {name} was rejected.")
            ))),
            _ => Ok(()),
        }
    }

    pub fn put_template(&self, name: &str, age: TimeDelta) {
        self.templates
            .lock()
            .unwrap()
            .insert(name.to_string(), Utc::now() - age);
    }

    pub fn template_names(&self) -> Vec<String> {
        self.templates.lock().unwrap().keys().cloned().collect()
    }

    pub fn list_requests(&self) -> usize {
        self.list_requests.load(Ordering::SeqCst)
    }

    pub fn get_requests(&self) -> usize {
        self.get_requests.load(Ordering::SeqCst)
    }

    pub fn delete_requests(&self) -> usize {
        self.delete_requests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageSource for TemplateStore {
    async fn list_templates(&self, next_token: Option<String>) -> Result<TemplatePage> {
        let page_number = self.list_requests.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_on_page == Some(page_number) {
            return Err(anyhow!(ItemError::new(
                "ServiceUnavailable",
                "listing is unavailable"
            )));
        }

        let offset = match next_token {
            Some(token) => token.parse::<usize>()?,
            None => 0,
        };

        let templates: Vec<TemplateMetadata> = self
            .templates
            .lock()
            .unwrap()
            .iter()
            .map(|(name, created_at)| TemplateMetadata::new(name, *created_at))
            .collect();

        let end = (offset + PAGE_SIZE).min(templates.len());
        let next_token = if end < templates.len() {
            Some(end.to_string())
        } else {
            None
        };

        Ok(TemplatePage {
            templates: templates[offset.min(end)..end].to_vec(),
            next_token,
        })
    }
}

#[async_trait]
impl TemplateClient for TemplateStore {
    async fn get_template(&self, name: &str) -> Result<TemplateContent> {
        self.get_requests.fetch_add(1, Ordering::SeqCst);
        self.check_request(name)?;
        if !self.templates.lock().unwrap().contains_key(name) {
            return Err(anyhow!(ItemError::new(
                "TemplateDoesNotExist",
                &format!("Template {name} does not exist.")
            )));
        }

        Ok(TemplateContent {
            name: name.to_string(),
            subject: Some(format!("subject of {name}")),
            text: Some("hello".to_string()),
            html: None,
        })
    }

    async fn delete_template(&self, name: &str) -> Result<()> {
        self.delete_requests.fetch_add(1, Ordering::SeqCst);
        self.check_request(name)?;
        // DeleteTemplate succeeds for unknown names on SES.
        self.templates.lock().unwrap().remove(name);
        Ok(())
    }
}

pub struct TestHelper;

impl TestHelper {
    /// Build a `Config` from CLI-style args. `sesrm` is prepended.
    pub fn build_config(args: Vec<&str>) -> Config {
        let mut full_args = vec!["sesrm"];
        full_args.extend(args);
        build_config_from_args(full_args).unwrap()
    }

    /// Run a pipeline over `store` and collect everything the tests inspect.
    pub async fn run_pipeline(config: Config, store: &TemplateStore) -> PipelineResult {
        let cancellation_token = create_pipeline_cancellation_token();
        let mut pipeline = TemplatePipeline::with_storage(
            config,
            Box::new(store.clone()),
            Box::new(store.clone()),
            cancellation_token,
        );
        pipeline.close_stats_sender();
        pipeline.run().await;

        let has_error = pipeline.has_error();
        let errors = pipeline.get_error_messages().unwrap_or_default();
        let recorded_errors = pipeline.get_errors_and_consume().unwrap_or_default();
        let exit_code = exit_code_for_run(&recorded_errors, pipeline.get_results());

        PipelineResult {
            results: pipeline.get_results().to_vec(),
            summary: pipeline.get_summary(),
            has_error,
            has_warning: pipeline.has_warning(),
            errors,
            exit_code,
        }
    }
}
