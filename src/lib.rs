/*!
# Overview
sesrm-rs lists Amazon SES email templates, selects the ones older than a
retention cutoff, and gets or deletes them concurrently.

## Features
- **Two-phase run**: the whole listing is walked and filtered before any
  per-template request is sent
- **Bounded fan-out**: one GetTemplate or DeleteTemplate request per selected
  template on a worker pool, waiting for every request to finish
- **Per-template results**: a failed, timed-out or cancelled request is
  reported as that template's outcome; the rest of the batch carries on
- **Safety**: dry-run preview, confirmation prompt, force flag
- **Library-First**: the `sesrm` CLI is a thin wrapper over this crate

## As a Library

```toml
[dependencies]
sesrm-rs = "0.1"
tokio = { version = "1", features = ["full"] }
```

```no_run
use sesrm_rs::config::Config;
use sesrm_rs::config::args::parse_from_args;
use sesrm_rs::pipeline::TemplatePipeline;
use sesrm_rs::types::token::create_pipeline_cancellation_token;

#[tokio::main]
async fn main() {
    let args = vec!["sesrm", "--action", "delete", "--older-than-days", "90", "--dry-run"];

    let parsed_args = parse_from_args(args).unwrap();
    let config = Config::try_from(parsed_args).unwrap();
    let cancellation_token = create_pipeline_cancellation_token();
    let mut pipeline = TemplatePipeline::new(config, cancellation_token).await;
    pipeline.close_stats_sender();
    pipeline.run().await;

    if pipeline.has_error() {
        eprintln!("{:?}", pipeline.get_errors_and_consume().unwrap()[0]);
    }
    println!("{:?}", pipeline.get_summary());
}
```

Any [`storage::PageSource`] and [`storage::TemplateClient`] can be plugged in
with [`TemplatePipeline::with_storage`], or the two phases can be driven
directly with [`lister::list_and_filter`] and
[`executor::BatchExecutor::execute_batch`].
*/

#![allow(clippy::collapsible_if)]

pub mod config;
pub mod executor;
pub mod filters;
pub mod lister;
pub mod pipeline;
pub mod safety;
pub mod storage;
pub mod types;

#[cfg(test)]
pub(crate) mod test_utils;

pub use config::Config;
pub use config::args::{CLIArgs, build_config_from_args, parse_from_args};
pub use executor::BatchExecutor;
pub use lister::{TemplateLister, list_and_filter};
pub use pipeline::TemplatePipeline;
pub use storage::{Client, PageSource, TemplateClient};
pub use types::error::{SesrmError, exit_code_for_run, exit_code_from_error, is_cancelled_error};
pub use types::token::{PipelineCancellationToken, create_pipeline_cancellation_token};
pub use types::{
    BatchSummary, ItemOutcome, OperationKind, OperationResult, TemplateContent, TemplateMetadata,
    TemplatePage,
};
