// Initializes the tracing subscriber for the CLI binary.

use std::env;
use std::io::IsTerminal;

use tracing_subscriber::fmt::format::FmtSpan;

use sesrm_rs::config::TracingConfig;

const EVENT_FILTER_ENV_VAR: &str = "RUST_LOG";

/// Targets whose events are shown when `--aws-sdk-tracing` is set.
const AWS_SDK_TARGETS: [&str; 4] = ["aws_smithy_runtime", "aws_config", "aws_sigv4", "aws_sdk_ses"];

pub fn init_tracing(config: &TracingConfig) {
    let fmt_span = if config.span_events_tracing {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let subscriber_builder = tracing_subscriber::fmt()
        .with_writer(std::io::stdout)
        .compact()
        .with_ansi(!config.disable_color_tracing && std::io::stdout().is_terminal())
        .with_span_events(fmt_span);

    let (event_filter, show_target) = build_event_filter(config, env::var(EVENT_FILTER_ENV_VAR).ok());

    let subscriber_builder = subscriber_builder
        .with_env_filter(event_filter)
        .with_target(show_target);
    if config.json_tracing {
        subscriber_builder.json().init();
    } else {
        subscriber_builder.init();
    }
}

/// Returns the `EnvFilter` directive and whether event targets are shown.
///
/// `--aws-sdk-tracing` wins over `RUST_LOG`; without either only this
/// crate's events are shown, without targets.
fn build_event_filter(config: &TracingConfig, rust_log: Option<String>) -> (String, bool) {
    let tracing_level = config.tracing_level;
    let own_filter = format!("sesrm_rs={tracing_level},sesrm={tracing_level}");

    if config.aws_sdk_tracing {
        let sdk_filter = AWS_SDK_TARGETS
            .iter()
            .map(|target| format!("{target}={tracing_level}"))
            .collect::<Vec<_>>()
            .join(",");
        return (format!("{own_filter},{sdk_filter}"), true);
    }

    match rust_log {
        Some(rust_log) => (rust_log, true),
        None => (own_filter, false),
    }
}
