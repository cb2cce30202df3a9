use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use tracing::{debug, error, trace, warn};

use sesrm_rs::config::Config;
use sesrm_rs::types::error::SesrmError;
use sesrm_rs::{
    CLIArgs, TemplatePipeline, create_pipeline_cancellation_token, exit_code_for_run,
    exit_code_from_error, is_cancelled_error,
};

mod ctrl_c_handler;
pub mod indicator;
mod tracing_init;
pub mod ui_config;

/// sesrm - Bulk get/delete of Amazon SES email templates older than a cutoff.
///
/// This binary is a thin wrapper over the sesrm-rs library.
/// All core functionality is implemented in the library crate.
#[tokio::main]
async fn main() -> Result<()> {
    let config = load_config_exit_if_err();

    if let Some(shell) = config.auto_complete_shell {
        generate(
            shell,
            &mut CLIArgs::command(),
            "sesrm",
            &mut std::io::stdout(),
        );

        return Ok(());
    }

    start_tracing_if_necessary(&config);

    trace!("config = {:?}", config);

    run(config).await
}

fn load_config_exit_if_err() -> Config {
    match Config::try_from(CLIArgs::parse()) {
        Ok(config) => config,
        Err(error_message) => {
            clap::Error::raw(clap::error::ErrorKind::ValueValidation, error_message).exit()
        }
    }
}

fn start_tracing_if_necessary(config: &Config) -> bool {
    match config.tracing_config.as_ref() {
        None => false,
        Some(tracing_config) => {
            tracing_init::init_tracing(tracing_config);
            true
        }
    }
}

async fn run(config: Config) -> Result<()> {
    let cancellation_token = create_pipeline_cancellation_token();

    ctrl_c_handler::spawn_ctrl_c_handler(cancellation_token.clone());

    let start_time = tokio::time::Instant::now();
    debug!(
        operation = config.operation.as_str(),
        "template pipeline start."
    );

    let mut pipeline = TemplatePipeline::new(config.clone(), cancellation_token).await;

    // The confirmation prompt must not race with the progress line.
    if let Err(e) = pipeline.check_prerequisites().await {
        if is_cancelled_error(&e) {
            debug!("operation cancelled by user.");
            return Ok(());
        }
        error!("{}", e);
        std::process::exit(exit_code_from_error(&e));
    }

    let indicator_join_handle = indicator::show_indicator(
        pipeline.get_stats_receiver(),
        ui_config::is_progress_indicator_needed(&config),
        ui_config::is_show_result_needed(&config),
    );

    pipeline.run().await;
    indicator_join_handle.await?;

    let duration_sec = format!("{:.3}", start_time.elapsed().as_secs_f32());

    let errors = pipeline.get_errors_and_consume().unwrap_or_default();
    let mut has_fatal_error = false;
    for err in &errors {
        if is_cancelled_error(err) {
            debug!("operation cancelled by user.");
            continue;
        }
        has_fatal_error = true;
        error!("{:#}", err);
    }

    let exit_code = exit_code_for_run(&errors, pipeline.get_results());
    if has_fatal_error {
        error!(duration_sec = duration_sec, "sesrm failed.");
    } else if exit_code != 0 {
        let summary = pipeline.get_summary();
        warn!(
            duration_sec = duration_sec,
            "{}",
            SesrmError::PartialFailure {
                succeeded: summary.succeeded(),
                failed: summary.failed,
            }
        );
    }

    if exit_code != 0 {
        std::process::exit(exit_code);
    }

    debug!(duration_sec = duration_sec, "sesrm has been completed.");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusty_fork::rusty_fork_test;
    use sesrm_rs::config::args::parse_from_args;

    rusty_fork_test! {
        #[test]
        fn with_tracing() {
            let args = vec![
                "sesrm",
                "-v",
                "--action",
                "get",
            ];

            let config = Config::try_from(parse_from_args(args).unwrap()).unwrap();
            assert!(start_tracing_if_necessary(&config));
        }

        #[test]
        fn without_tracing() {
            let args = vec![
                "sesrm",
                "-qq",
                "--action",
                "delete",
            ];

            let config = Config::try_from(parse_from_args(args).unwrap()).unwrap();
            assert!(!start_tracing_if_necessary(&config));
        }
    }
}
