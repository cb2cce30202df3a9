pub mod args;

use crate::types::{ClientConfigLocation, OperationKind, SesCredentials};
use chrono::{DateTime, TimeDelta, Utc};
use fancy_regex::Regex;

pub const DEFAULT_OLDER_THAN_DAYS: u32 = 1;
pub const DEFAULT_WORKER_SIZE: u16 = 16;
pub const DEFAULT_MAX_ITEMS: i32 = 100;
pub const MAX_ITEMS_LIMIT: i32 = 100;

/// Main configuration for a sesrm-rs run.
///
/// Holds everything the [`TemplatePipeline`](crate::TemplatePipeline) needs:
/// the operation, the retention cutoff and name filters, the SES client
/// settings, worker pool size and safety flags. It is built once (from the
/// command line or by a library caller) and passed by value into the pipeline.
///
/// # Quick Start
///
/// ```
/// use sesrm_rs::Config;
/// use sesrm_rs::types::OperationKind;
///
/// let config = Config::for_operation(OperationKind::Delete, 30);
/// assert_eq!(config.worker_size, 16);
/// assert!(config.filter_config.before_time.is_some());
/// ```
///
/// # Default
///
/// [`Config::default()`] leaves the retention cutoff unset. A pipeline refuses
/// to run until `filter_config.before_time` is set.
#[derive(Debug, Clone)]
pub struct Config {
    pub operation: OperationKind,
    pub older_than_days: u32,
    pub starting_token: Option<String>,
    pub filter_config: FilterConfig,
    pub client_config: Option<ClientConfig>,
    pub tracing_config: Option<TracingConfig>,
    pub worker_size: u16,
    pub max_items: i32,
    pub item_timeout_milliseconds: Option<u64>,
    pub dry_run: bool,
    pub force: bool,
    pub warn_as_error: bool,
    pub show_no_progress: bool,
    pub auto_complete_shell: Option<clap_complete::shells::Shell>,
}

impl Config {
    /// Create a `Config` for the given operation, with the retention cutoff
    /// computed from the current time.
    ///
    /// `force` is set so that library callers are never prompted.
    pub fn for_operation(operation: OperationKind, older_than_days: u32) -> Self {
        Config {
            operation,
            older_than_days,
            filter_config: FilterConfig {
                before_time: retention_cutoff(Utc::now(), older_than_days).ok(),
                ..FilterConfig::default()
            },
            force: true,
            ..Config::default()
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            operation: OperationKind::Get,
            older_than_days: DEFAULT_OLDER_THAN_DAYS,
            starting_token: None,
            filter_config: FilterConfig::default(),
            client_config: None,
            tracing_config: None,
            worker_size: DEFAULT_WORKER_SIZE,
            max_items: DEFAULT_MAX_ITEMS,
            item_timeout_milliseconds: None,
            dry_run: false,
            force: false,
            warn_as_error: false,
            show_no_progress: false,
            auto_complete_shell: None,
        }
    }
}

/// Compute the retention cutoff `now - older_than_days`.
pub fn retention_cutoff(now: DateTime<Utc>, older_than_days: u32) -> Result<DateTime<Utc>, String> {
    TimeDelta::try_days(i64::from(older_than_days))
        .and_then(|age| now.checked_sub_signed(age))
        .ok_or_else(|| format!("older-than-days is out of range: {older_than_days}"))
}

/// SES client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub client_config_location: ClientConfigLocation,
    pub credential: SesCredentials,
    pub region: Option<String>,
    pub endpoint_url: Option<String>,
    pub cli_timeout_config: CLITimeoutConfig,
    pub disable_stalled_stream_protection: bool,
}

impl Default for ClientConfig {
    /// Credentials and region from the standard AWS environment chain.
    fn default() -> Self {
        ClientConfig {
            client_config_location: ClientConfigLocation::default(),
            credential: SesCredentials::FromEnvironment,
            region: None,
            endpoint_url: None,
            cli_timeout_config: CLITimeoutConfig::default(),
            disable_stalled_stream_protection: false,
        }
    }
}

/// Timeout configuration applied to the SDK client.
#[derive(Debug, Clone, Default)]
pub struct CLITimeoutConfig {
    pub operation_timeout_milliseconds: Option<u64>,
    pub operation_attempt_timeout_milliseconds: Option<u64>,
    pub connect_timeout_milliseconds: Option<u64>,
    pub read_timeout_milliseconds: Option<u64>,
}

/// Tracing (logging) configuration.
#[derive(Debug, Clone, Copy)]
pub struct TracingConfig {
    pub tracing_level: log::Level,
    pub json_tracing: bool,
    pub aws_sdk_tracing: bool,
    pub span_events_tracing: bool,
    pub disable_color_tracing: bool,
}

/// Template selection rules, applied with AND semantics.
///
/// `before_time` is the retention cutoff: only templates created strictly
/// before it are selected.
#[derive(Debug, Clone, Default)]
pub struct FilterConfig {
    pub before_time: Option<DateTime<Utc>>,
    pub include_regex: Option<Regex>,
    pub exclude_regex: Option<Regex>,
}
