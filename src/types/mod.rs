use std::fmt;
use std::fmt::{Debug, Formatter};
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use zeroize_derive::{Zeroize, ZeroizeOnDrop};

use crate::types::error::ItemError;

pub mod error;
pub mod token;

/// One entry of the provider's template listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateMetadata {
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl TemplateMetadata {
    pub fn new(name: &str, created_at: DateTime<Utc>) -> Self {
        Self {
            name: name.to_string(),
            created_at,
        }
    }
}

/// A single page returned by a [`PageSource`](crate::storage::PageSource).
///
/// `next_token` is opaque provider state. `None` means the listing is exhausted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplatePage {
    pub templates: Vec<TemplateMetadata>,
    pub next_token: Option<String>,
}

/// The per-template request issued by the batch executor.
///
/// Decided once per run; a batch never mixes kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Get,
    Delete,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "get" | "get_template" | "get_templates" => Ok(Self::Get),
            "delete" | "delete_template" | "delete_templates" => Ok(Self::Delete),
            _ => Err(format!(
                "unsupported action '{s}'. expected one of: get, get_template(s), delete, delete_template(s)"
            )),
        }
    }
}

/// Template representation returned by a Get request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateContent {
    pub name: String,
    pub subject: Option<String>,
    pub text: Option<String>,
    pub html: Option<String>,
}

/// Outcome of a single per-template request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    Retrieved(TemplateContent),
    Deleted,
    /// Dry-run delete: the template was fetched and would have been deleted.
    Previewed(TemplateContent),
    Failed(ItemError),
    /// The batch was cancelled before this item completed.
    ///
    /// When `dispatched` is true the request was already in flight and its
    /// effect on the provider is unknown.
    Cancelled { dispatched: bool },
}

impl ItemOutcome {
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            Self::Retrieved(_) | Self::Deleted | Self::Previewed(_)
        )
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationResult {
    pub name: String,
    pub outcome: ItemOutcome,
}

impl OperationResult {
    pub fn new(name: &str, outcome: ItemOutcome) -> Self {
        Self {
            name: name.to_string(),
            outcome,
        }
    }
}

/// Per-outcome counters over a finished batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub retrieved: u64,
    pub deleted: u64,
    pub previewed: u64,
    pub failed: u64,
    pub cancelled: u64,
}

impl BatchSummary {
    pub fn from_results(results: &[OperationResult]) -> Self {
        results
            .iter()
            .fold(BatchSummary::default(), |mut summary, result| {
                match result.outcome {
                    ItemOutcome::Retrieved(_) => summary.retrieved += 1,
                    ItemOutcome::Deleted => summary.deleted += 1,
                    ItemOutcome::Previewed(_) => summary.previewed += 1,
                    ItemOutcome::Failed(_) => summary.failed += 1,
                    ItemOutcome::Cancelled { .. } => summary.cancelled += 1,
                }
                summary
            })
    }

    pub fn total(&self) -> u64 {
        self.retrieved + self.deleted + self.previewed + self.failed + self.cancelled
    }

    pub fn succeeded(&self) -> u64 {
        self.retrieved + self.deleted + self.previewed
    }
}

/// Statistics sent through the stats channel during pipeline execution.
#[derive(Debug, PartialEq)]
pub enum OperationStatistics {
    TemplateListed { name: String },
    TemplateSkipped { name: String },
    TemplateRetrieved { name: String },
    TemplateDeleted { name: String },
    TemplatePreviewed { name: String },
    TemplateFailed { name: String },
    TemplateCancelled { name: String },
}

impl OperationStatistics {
    pub fn from_outcome(name: &str, outcome: &ItemOutcome) -> Self {
        let name = name.to_string();
        match outcome {
            ItemOutcome::Retrieved(_) => Self::TemplateRetrieved { name },
            ItemOutcome::Deleted => Self::TemplateDeleted { name },
            ItemOutcome::Previewed(_) => Self::TemplatePreviewed { name },
            ItemOutcome::Failed(_) => Self::TemplateFailed { name },
            ItemOutcome::Cancelled { .. } => Self::TemplateCancelled { name },
        }
    }
}

/// AWS configuration file locations.
#[derive(Debug, Clone, Default)]
pub struct ClientConfigLocation {
    pub aws_config_file: Option<PathBuf>,
    pub aws_shared_credentials_file: Option<PathBuf>,
}

/// Credential sources the SES client can be built from.
#[derive(Debug, Clone)]
pub enum SesCredentials {
    Profile(String),
    Credentials { access_keys: AccessKeys },
    FromEnvironment,
}

/// AWS access key pair, cleared from memory on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct AccessKeys {
    pub access_key: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

impl Debug for AccessKeys {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut keys = f.debug_struct("AccessKeys");
        let session_token = self
            .session_token
            .as_ref()
            .map_or("None", |_| "** redacted **");
        keys.field("access_key", &self.access_key)
            .field("secret_access_key", &"** redacted **")
            .field("session_token", &session_token);
        keys.finish()
    }
}
