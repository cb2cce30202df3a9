use crate::config::{
    CLITimeoutConfig, ClientConfig, Config, DEFAULT_MAX_ITEMS, DEFAULT_OLDER_THAN_DAYS,
    DEFAULT_WORKER_SIZE, FilterConfig, MAX_ITEMS_LIMIT, TracingConfig, retention_cutoff,
};
use crate::types::{AccessKeys, ClientConfigLocation, OperationKind, SesCredentials};
use chrono::Utc;
use clap::Parser;
use clap::builder::NonEmptyStringValueParser;
use clap_verbosity_flag::{Verbosity, WarnLevel};
use fancy_regex::Regex;
use std::ffi::OsString;
use std::path::PathBuf;
use std::str::FromStr;

use value_parser::file_exist::check_aws_file_exists;
use value_parser::url::check_endpoint_url;

pub mod value_parser;

// ---------------------------------------------------------------------------
// Default constants
// ---------------------------------------------------------------------------

const SUPPORTED_SERVICE_SES: &str = "ses";

const DEFAULT_SERVICE: &str = SUPPORTED_SERVICE_SES;
const DEFAULT_DRY_RUN: bool = false;
const DEFAULT_FORCE: bool = false;
const DEFAULT_SHOW_NO_PROGRESS: bool = false;
const DEFAULT_JSON_TRACING: bool = false;
const DEFAULT_AWS_SDK_TRACING: bool = false;
const DEFAULT_SPAN_EVENTS_TRACING: bool = false;
const DEFAULT_DISABLE_COLOR_TRACING: bool = false;
const DEFAULT_WARN_AS_ERROR: bool = false;
const DEFAULT_DISABLE_STALLED_STREAM_PROTECTION: bool = false;

// ---------------------------------------------------------------------------
// Error messages
// ---------------------------------------------------------------------------

const ERROR_MESSAGE_UNSUPPORTED_SERVICE: &str = "Unsupported service. Supported services: ses";
const ERROR_MESSAGE_INVALID_REGEX: &str = "Invalid regular expression pattern";
const ERROR_MESSAGE_WORKER_SIZE_ZERO: &str = "Worker size must be at least 1.";
const ERROR_MESSAGE_MAX_ITEMS_OUT_OF_RANGE: &str = "Max items must be between 1 and 100.";
const ERROR_MESSAGE_ITEM_TIMEOUT_ZERO: &str = "Item timeout must be at least 1 millisecond.";
const ERROR_MESSAGE_ACTION_REQUIRED: &str = "--action is required.";

// ---------------------------------------------------------------------------
// Value parser helpers
// ---------------------------------------------------------------------------

fn check_service(s: &str) -> Result<String, String> {
    if s.eq_ignore_ascii_case(SUPPORTED_SERVICE_SES) {
        Ok(SUPPORTED_SERVICE_SES.to_string())
    } else {
        Err(ERROR_MESSAGE_UNSUPPORTED_SERVICE.to_string())
    }
}

fn parse_action(s: &str) -> Result<OperationKind, String> {
    OperationKind::from_str(s)
}

// ---------------------------------------------------------------------------
// CLIArgs (clap-derived argument struct)
// ---------------------------------------------------------------------------

/// sesrm - Bulk get or delete of aged Amazon SES email templates.
///
/// Lists every template in the account/region, keeps those created more than
/// --older-than-days ago, then gets or deletes each of them concurrently.
///
/// Example:
///   sesrm --action get --older-than-days 30 --region us-east-1
///   sesrm --action delete --older-than-days 90 --dry-run -v
///   sesrm --action delete --older-than-days 90 --filter-include-regex '^campaign-' --force
#[derive(Parser, Clone, Debug)]
#[command(name = "sesrm", version, about, long_about = None)]
pub struct CLIArgs {
    /// Operation applied to every selected template.
    #[arg(
        long,
        env = "SESRM_ACTION",
        value_parser = parse_action,
        required_unless_present = "auto_complete_shell",
        help_heading = "General",
        long_help = r#"Operation applied to every selected template.
get (get_template, get_templates): fetch each template.
delete (delete_template, delete_templates): permanently delete each template."#
    )]
    pub action: Option<OperationKind>,

    /// Email service that owns the templates. Only "ses" is supported.
    #[arg(long, env = "SESRM_SERVICE", default_value = DEFAULT_SERVICE, value_parser = check_service, help_heading = "General")]
    pub service: String,

    /// Select templates created more than this many days ago.
    #[arg(long, env, default_value_t = DEFAULT_OLDER_THAN_DAYS, help_heading = "General")]
    pub older_than_days: u32,

    /// Opaque NextToken to start the listing from.
    #[arg(long, env, value_parser = NonEmptyStringValueParser::new(), help_heading = "General")]
    pub starting_token: Option<String>,

    /// Preview mode. Deletions are replaced by a get of the template.
    #[arg(short = 'd', long, env, default_value_t = DEFAULT_DRY_RUN, help_heading = "General")]
    pub dry_run: bool,

    /// Don't show the progress bar.
    #[arg(long, env, default_value_t = DEFAULT_SHOW_NO_PROGRESS, help_heading = "General")]
    pub show_no_progress: bool,

    // -----------------------------------------------------------------------
    // Safety options
    // -----------------------------------------------------------------------
    /// Skip confirmation prompt before deleting.
    #[arg(short = 'f', long, env, default_value_t = DEFAULT_FORCE, help_heading = "Safety")]
    pub force: bool,

    // -----------------------------------------------------------------------
    // Filter options
    // -----------------------------------------------------------------------
    /// Select only templates whose name matches this regex pattern.
    #[arg(long, env, value_parser = NonEmptyStringValueParser::new(), help_heading = "Filter")]
    pub filter_include_regex: Option<String>,

    /// Skip templates whose name matches this regex pattern.
    #[arg(long, env, value_parser = NonEmptyStringValueParser::new(), help_heading = "Filter")]
    pub filter_exclude_regex: Option<String>,

    // -----------------------------------------------------------------------
    // Performance options
    // -----------------------------------------------------------------------
    /// Maximum number of concurrent template requests. Default: 16.
    #[arg(long, env, default_value_t = DEFAULT_WORKER_SIZE, help_heading = "Performance")]
    pub worker_size: u16,

    /// Templates per ListTemplates page (1-100). Default: 100.
    #[arg(long, env, default_value_t = DEFAULT_MAX_ITEMS, help_heading = "Performance")]
    pub max_items: i32,

    /// Per-template request timeout in milliseconds.
    #[arg(long, env, help_heading = "Performance")]
    pub item_timeout_milliseconds: Option<u64>,

    // -----------------------------------------------------------------------
    // Logging options
    // -----------------------------------------------------------------------
    /// Verbosity level. -q (quiet), default (normal), -v, -vv, -vvv.
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Output logs in JSON format.
    #[arg(long, env, default_value_t = DEFAULT_JSON_TRACING, help_heading = "Logging")]
    pub json_tracing: bool,

    /// Enable AWS SDK tracing.
    #[arg(long, env, default_value_t = DEFAULT_AWS_SDK_TRACING, help_heading = "Logging")]
    pub aws_sdk_tracing: bool,

    /// Enable tracing span events.
    #[arg(long, env, default_value_t = DEFAULT_SPAN_EVENTS_TRACING, help_heading = "Logging")]
    pub span_events_tracing: bool,

    /// Disable colored output in logs.
    #[arg(long, env, default_value_t = DEFAULT_DISABLE_COLOR_TRACING, help_heading = "Logging")]
    pub disable_color_tracing: bool,

    // -----------------------------------------------------------------------
    // Timeout options
    // -----------------------------------------------------------------------
    /// Overall SDK operation timeout in milliseconds.
    #[arg(long, env, help_heading = "Timeout")]
    pub operation_timeout_milliseconds: Option<u64>,

    /// Per-attempt SDK operation timeout in milliseconds.
    #[arg(long, env, help_heading = "Timeout")]
    pub operation_attempt_timeout_milliseconds: Option<u64>,

    /// Connection timeout in milliseconds.
    #[arg(long, env, help_heading = "Timeout")]
    pub connect_timeout_milliseconds: Option<u64>,

    /// Read timeout in milliseconds.
    #[arg(long, env, help_heading = "Timeout")]
    pub read_timeout_milliseconds: Option<u64>,

    // -----------------------------------------------------------------------
    // AWS configuration
    // -----------------------------------------------------------------------
    /// AWS config file path.
    #[arg(long, env, value_parser = check_aws_file_exists, help_heading = "AWS")]
    pub aws_config_file: Option<PathBuf>,

    /// AWS shared credentials file path.
    #[arg(long, env, value_parser = check_aws_file_exists, help_heading = "AWS")]
    pub aws_shared_credentials_file: Option<PathBuf>,

    /// AWS profile. If not set, the default credential chain is used.
    #[arg(long, env = "SESRM_PROFILE", conflicts_with = "access_key", value_parser = NonEmptyStringValueParser::new(), help_heading = "AWS")]
    pub profile: Option<String>,

    /// AWS access key ID.
    #[arg(long, env = "SESRM_ACCESS_KEY", requires = "secret_key", value_parser = NonEmptyStringValueParser::new(), help_heading = "AWS")]
    pub access_key: Option<String>,

    /// AWS secret access key.
    #[arg(long, env = "SESRM_SECRET_KEY", requires = "access_key", value_parser = NonEmptyStringValueParser::new(), help_heading = "AWS")]
    pub secret_key: Option<String>,

    /// AWS session token.
    #[arg(long, env = "SESRM_SESSION_TOKEN", requires = "access_key", value_parser = NonEmptyStringValueParser::new(), help_heading = "AWS")]
    pub session_token: Option<String>,

    /// AWS region.
    #[arg(long, env = "SESRM_REGION", value_parser = NonEmptyStringValueParser::new(), help_heading = "AWS")]
    pub region: Option<String>,

    /// Custom SES endpoint URL (e.g. LocalStack).
    #[arg(long, env = "SESRM_ENDPOINT_URL", value_parser = check_endpoint_url, help_heading = "AWS")]
    pub endpoint_url: Option<String>,

    /// Disable stalled stream protection.
    #[arg(long, env, default_value_t = DEFAULT_DISABLE_STALLED_STREAM_PROTECTION, help_heading = "AWS")]
    pub disable_stalled_stream_protection: bool,

    // -----------------------------------------------------------------------
    // Advanced options
    // -----------------------------------------------------------------------
    /// Treat item failures as errors (exit code 1 instead of 3).
    #[arg(long, env, default_value_t = DEFAULT_WARN_AS_ERROR, help_heading = "Advanced")]
    pub warn_as_error: bool,

    /// Generate shell completions.
    #[arg(long, env, help_heading = "Advanced")]
    pub auto_complete_shell: Option<clap_complete::shells::Shell>,
}

// ---------------------------------------------------------------------------
// parse_from_args (public API)
// ---------------------------------------------------------------------------

/// Parse command-line arguments into a `CLIArgs` struct.
///
/// # Example
///
/// ```
/// use sesrm_rs::config::args::parse_from_args;
/// use sesrm_rs::types::OperationKind;
///
/// let args = vec!["sesrm", "--action", "delete", "--dry-run"];
/// let cli_args = parse_from_args(args).unwrap();
/// assert_eq!(cli_args.action, Some(OperationKind::Delete));
/// assert!(cli_args.dry_run);
/// ```
pub fn parse_from_args<I, T>(args: I) -> Result<CLIArgs, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    CLIArgs::try_parse_from(args)
}

/// Parse arguments and build a Config in one step.
pub fn build_config_from_args<I, T>(args: I) -> Result<Config, String>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli_args = CLIArgs::try_parse_from(args).map_err(|e| e.to_string())?;
    Config::try_from(cli_args)
}

// ---------------------------------------------------------------------------
// Validation and Config conversion
// ---------------------------------------------------------------------------

impl CLIArgs {
    fn validate(&self) -> Result<(), String> {
        if self.worker_size == 0 {
            return Err(ERROR_MESSAGE_WORKER_SIZE_ZERO.to_string());
        }
        if !(1..=MAX_ITEMS_LIMIT).contains(&self.max_items) {
            return Err(ERROR_MESSAGE_MAX_ITEMS_OUT_OF_RANGE.to_string());
        }
        if self.item_timeout_milliseconds == Some(0) {
            return Err(ERROR_MESSAGE_ITEM_TIMEOUT_ZERO.to_string());
        }
        Ok(())
    }

    fn build_filter_config(&self) -> Result<FilterConfig, String> {
        let compile_regex =
            |pattern: &Option<String>, name: &str| -> Result<Option<Regex>, String> {
                match pattern {
                    Some(p) => Regex::new(p)
                        .map(Some)
                        .map_err(|e| format!("{ERROR_MESSAGE_INVALID_REGEX} for {name}: {e}")),
                    None => Ok(None),
                }
            };

        Ok(FilterConfig {
            before_time: Some(retention_cutoff(Utc::now(), self.older_than_days)?),
            include_regex: compile_regex(&self.filter_include_regex, "filter-include-regex")?,
            exclude_regex: compile_regex(&self.filter_exclude_regex, "filter-exclude-regex")?,
        })
    }

    fn build_client_config(&self) -> ClientConfig {
        let credential = if let Some(ref profile) = self.profile {
            SesCredentials::Profile(profile.clone())
        } else if let Some(ref access_key) = self.access_key {
            SesCredentials::Credentials {
                access_keys: AccessKeys {
                    access_key: access_key.clone(),
                    secret_access_key: self.secret_key.clone().unwrap_or_default(),
                    session_token: self.session_token.clone(),
                },
            }
        } else {
            SesCredentials::FromEnvironment
        };

        ClientConfig {
            client_config_location: ClientConfigLocation {
                aws_config_file: self.aws_config_file.clone(),
                aws_shared_credentials_file: self.aws_shared_credentials_file.clone(),
            },
            credential,
            region: self.region.clone(),
            endpoint_url: self.endpoint_url.clone(),
            cli_timeout_config: CLITimeoutConfig {
                operation_timeout_milliseconds: self.operation_timeout_milliseconds,
                operation_attempt_timeout_milliseconds: self.operation_attempt_timeout_milliseconds,
                connect_timeout_milliseconds: self.connect_timeout_milliseconds,
                read_timeout_milliseconds: self.read_timeout_milliseconds,
            },
            disable_stalled_stream_protection: self.disable_stalled_stream_protection,
        }
    }

    fn build_tracing_config(&self) -> Option<TracingConfig> {
        let log_level = self.verbosity.log_level()?;

        Some(TracingConfig {
            tracing_level: log_level,
            json_tracing: self.json_tracing,
            aws_sdk_tracing: self.aws_sdk_tracing,
            span_events_tracing: self.span_events_tracing,
            disable_color_tracing: self.disable_color_tracing,
        })
    }
}

impl TryFrom<CLIArgs> for Config {
    type Error = String;

    fn try_from(args: CLIArgs) -> Result<Self, Self::Error> {
        args.validate()?;

        // Shell completion does not run a batch, so any operation will do.
        let operation = match (args.action, args.auto_complete_shell) {
            (Some(action), _) => action,
            (None, Some(_)) => OperationKind::Get,
            (None, None) => return Err(ERROR_MESSAGE_ACTION_REQUIRED.to_string()),
        };

        let filter_config = args.build_filter_config()?;
        let client_config = Some(args.build_client_config());
        let tracing_config = args.build_tracing_config();

        Ok(Config {
            operation,
            older_than_days: args.older_than_days,
            starting_token: args.starting_token,
            filter_config,
            client_config,
            tracing_config,
            worker_size: args.worker_size,
            max_items: args.max_items,
            item_timeout_milliseconds: args.item_timeout_milliseconds,
            dry_run: args.dry_run,
            force: args.force,
            warn_as_error: args.warn_as_error,
            show_no_progress: args.show_no_progress,
            auto_complete_shell: args.auto_complete_shell,
        })
    }
}
