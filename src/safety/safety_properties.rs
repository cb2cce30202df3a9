//! Property-based tests for the confirmation decision.

#[cfg(test)]
mod tests {
    use crate::config::{Config, TracingConfig};
    use crate::safety::{PromptHandler, SafetyChecker};
    use crate::types::OperationKind;
    use crate::types::error::SesrmError;
    use anyhow::Result;
    use proptest::prelude::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Always interactive; counts how often the user is asked.
    struct CountingPromptHandler {
        response: String,
        prompts: Arc<AtomicUsize>,
    }

    impl PromptHandler for CountingPromptHandler {
        fn read_confirmation(&self, _target_display: &str) -> Result<String> {
            self.prompts.fetch_add(1, Ordering::SeqCst);
            Ok(self.response.clone())
        }

        fn is_interactive(&self) -> bool {
            true
        }
    }

    fn make_config(is_delete: bool, dry_run: bool, force: bool, json_tracing: bool) -> Config {
        Config {
            operation: if is_delete {
                OperationKind::Delete
            } else {
                OperationKind::Get
            },
            dry_run,
            force,
            tracing_config: Some(TracingConfig {
                tracing_level: log::Level::Info,
                json_tracing,
                aws_sdk_tracing: false,
                span_events_tracing: false,
                disable_color_tracing: false,
            }),
            ..Config::default()
        }
    }

    proptest! {
        #[test]
        fn prompt_only_for_unforced_interactive_delete(
            is_delete in any::<bool>(),
            dry_run in any::<bool>(),
            force in any::<bool>(),
            json_tracing in any::<bool>(),
        ) {
            let prompts = Arc::new(AtomicUsize::new(0));
            let checker = SafetyChecker::with_prompt_handler(
                &make_config(is_delete, dry_run, force, json_tracing),
                Box::new(CountingPromptHandler { response: "yes".to_string(), prompts: prompts.clone() }),
            );

            prop_assert!(checker.check_before_execution().is_ok());

            let expect_prompt = is_delete && !dry_run && !force && !json_tracing;
            prop_assert_eq!(prompts.load(Ordering::SeqCst), usize::from(expect_prompt));
        }

        #[test]
        fn anything_but_exact_yes_cancels(response in "[a-zA-Z ]{0,8}") {
            prop_assume!(response != "yes");

            let checker = SafetyChecker::with_prompt_handler(
                &make_config(true, false, false, false),
                Box::new(CountingPromptHandler { response, prompts: Arc::new(AtomicUsize::new(0)) }),
            );

            let err = checker.check_before_execution().unwrap_err();
            prop_assert_eq!(err.downcast_ref::<SesrmError>(), Some(&SesrmError::Cancelled));
        }
    }
}
