//! Shared test utilities for the sesrm library crate.
//!
//! Provides the tracing helper, a default test [`Config`], and in-memory
//! fakes for the two storage capabilities.

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::config::{Config, FilterConfig};
use crate::storage::{PageSource, TemplateClient};
use crate::types::error::ItemError;
use crate::types::{OperationKind, TemplateContent, TemplateMetadata, TemplatePage};

/// Initialise a dummy tracing subscriber for tests.
///
/// Uses `try_init` so that only the first call in a process actually
/// installs the subscriber; subsequent calls are silently ignored.
pub(crate) fn init_dummy_tracing_subscriber() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("dummy=trace")
        .try_init();
}

/// Create a default [`Config`] suitable for most unit / property tests.
///
/// Key defaults: `worker_size=4`, `force=true`, cutoff one day ago.
pub(crate) fn make_test_config(operation: OperationKind) -> Config {
    Config {
        operation,
        worker_size: 4,
        force: true,
        filter_config: FilterConfig {
            before_time: Some(Utc::now() - TimeDelta::days(1)),
            ..Default::default()
        },
        ..Config::default()
    }
}

/// A template created `days` days ago.
pub(crate) fn template_aged(name: &str, days: i64) -> TemplateMetadata {
    TemplateMetadata::new(name, Utc::now() - TimeDelta::days(days))
}

pub(crate) fn template_created_at(name: &str, created_at: DateTime<Utc>) -> TemplateMetadata {
    TemplateMetadata::new(name, created_at)
}

/// Page source backed by a fixed list of pages.
///
/// Page `i` is requested with token `token-{i}` (the first page with no
/// token). `fail_at_page` makes that page's request fail.
#[derive(Clone, Default)]
pub(crate) struct FakePageSource {
    pages: Vec<Vec<TemplateMetadata>>,
    fail_at_page: Option<usize>,
    pub requested_tokens: Arc<Mutex<Vec<Option<String>>>>,
}

impl FakePageSource {
    pub fn new(pages: Vec<Vec<TemplateMetadata>>) -> Self {
        Self {
            pages,
            ..Default::default()
        }
    }

    pub fn failing_at(mut self, page: usize) -> Self {
        self.fail_at_page = Some(page);
        self
    }

    pub fn request_count(&self) -> usize {
        self.requested_tokens.lock().unwrap().len()
    }
}

#[async_trait]
impl PageSource for FakePageSource {
    async fn list_templates(&self, next_token: Option<String>) -> Result<TemplatePage> {
        self.requested_tokens
            .lock()
            .unwrap()
            .push(next_token.clone());

        let index = match next_token.as_deref() {
            None => 0,
            Some(token) => token
                .strip_prefix("token-")
                .and_then(|i| i.parse::<usize>().ok())
                .ok_or_else(|| anyhow!(ItemError::new("InvalidParameterValue", "bad token")))?,
        };

        if self.fail_at_page == Some(index) {
            return Err(anyhow!(ItemError::new("Throttling", "Rate exceeded")));
        }

        let templates = self.pages.get(index).cloned().unwrap_or_default();
        let next_token = (index + 1 < self.pages.len()).then(|| format!("token-{}", index + 1));

        Ok(TemplatePage {
            templates,
            next_token,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ClientCall {
    Get(String),
    Delete(String),
}

/// Template client that records every call.
#[derive(Clone, Default)]
pub(crate) struct FakeTemplateClient {
    failing_names: HashSet<String>,
    panicking_names: HashSet<String>,
    delay: Option<Duration>,
    pub calls: Arc<Mutex<Vec<ClientCall>>>,
    in_flight: Arc<AtomicUsize>,
    pub max_in_flight: Arc<AtomicUsize>,
}

impl FakeTemplateClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(mut self, names: &[&str]) -> Self {
        self.failing_names = names.iter().map(|n| n.to_string()).collect();
        self
    }

    pub fn panicking_on(mut self, names: &[&str]) -> Self {
        self.panicking_names = names.iter().map(|n| n.to_string()).collect();
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<ClientCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn get_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, ClientCall::Get(_)))
            .count()
    }

    pub fn delete_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, ClientCall::Delete(_)))
            .count()
    }

    async fn call(&self, call: ClientCall, name: &str) -> Result<()> {
        self.calls.lock().unwrap().push(call);

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.panicking_names.contains(name) {
            panic!("fake client panic for {name}");
        }
        if self.failing_names.contains(name) {
            return Err(anyhow!(ItemError::new(
                "TemplateDoesNotExist",
                &format!("Template {name} does not exist."),
            )));
        }
        Ok(())
    }
}

pub(crate) fn fake_content(name: &str) -> TemplateContent {
    TemplateContent {
        name: name.to_string(),
        subject: Some(format!("subject of {name}")),
        text: Some(format!("text of {name}")),
        html: None,
    }
}

#[async_trait]
impl TemplateClient for FakeTemplateClient {
    async fn get_template(&self, name: &str) -> Result<TemplateContent> {
        self.call(ClientCall::Get(name.to_string()), name).await?;
        Ok(fake_content(name))
    }

    async fn delete_template(&self, name: &str) -> Result<()> {
        self.call(ClientCall::Delete(name.to_string()), name).await
    }
}
