//! Confirmation before destructive batches.
//!
//! A Delete batch permanently removes templates, so the user must type
//! exactly `yes` before it starts. The prompt is skipped for Get batches,
//! dry-runs, `--force`, JSON logging and non-interactive terminals.

#[cfg(test)]
mod safety_properties;

use crate::config::Config;
use crate::types::OperationKind;
use crate::types::error::SesrmError;
use anyhow::{Result, anyhow};
use std::io::{BufRead, IsTerminal, Write};

// ---------------------------------------------------------------------------
// PromptHandler trait (for testability)
// ---------------------------------------------------------------------------

/// Trait for handling user prompts.
///
/// The default implementation ([`StdioPromptHandler`]) uses stdin/stdout.
/// Tests provide their own to avoid blocking on user input.
pub trait PromptHandler: Send + Sync {
    /// Show what is about to be deleted and read a line of user input.
    ///
    /// Returns the trimmed input.
    fn read_confirmation(&self, target_display: &str) -> Result<String>;

    /// Returns `true` if both stdin and stdout are connected to a TTY.
    fn is_interactive(&self) -> bool;
}

/// Default prompt handler using stdin/stdout.
///
/// Prompts are written with `print!`, not tracing, so they show regardless
/// of the log level.
pub struct StdioPromptHandler;

impl PromptHandler for StdioPromptHandler {
    fn read_confirmation(&self, target_display: &str) -> Result<String> {
        println!("You are about to permanently delete {target_display}.");
        print!("Type 'yes' to confirm deletion: ");
        std::io::stdout().flush()?;

        let mut input = String::new();
        std::io::stdin().lock().read_line(&mut input)?;
        Ok(input.trim().to_string())
    }

    fn is_interactive(&self) -> bool {
        std::io::stdin().is_terminal() && std::io::stdout().is_terminal()
    }
}

// ---------------------------------------------------------------------------
// SafetyChecker
// ---------------------------------------------------------------------------

/// Decides whether a batch may start.
///
/// Checks run in order:
/// 1. Get batches never prompt.
/// 2. Dry-run never prompts (nothing is deleted).
/// 3. `force` skips the prompt.
/// 4. JSON logging or a non-interactive terminal skips the prompt.
/// 5. Otherwise the user must type exactly `yes`.
pub struct SafetyChecker {
    operation: OperationKind,
    dry_run: bool,
    force: bool,
    json_logging: bool,
    target_display: String,
    prompt_handler: Box<dyn PromptHandler>,
}

impl SafetyChecker {
    pub fn new(config: &Config) -> Self {
        Self::with_prompt_handler(config, Box::new(StdioPromptHandler))
    }

    /// Create a SafetyChecker with a custom prompt handler (for testing).
    pub fn with_prompt_handler(config: &Config, prompt_handler: Box<dyn PromptHandler>) -> Self {
        let json_logging = config
            .tracing_config
            .map(|tc| tc.json_tracing)
            .unwrap_or(false);

        Self {
            operation: config.operation,
            dry_run: config.dry_run,
            force: config.force,
            json_logging,
            target_display: describe_target(config),
            prompt_handler,
        }
    }

    /// Returns `Err(SesrmError::Cancelled)` if the user declines.
    pub fn check_before_execution(&self) -> Result<()> {
        if self.operation != OperationKind::Delete {
            return Ok(());
        }

        if self.dry_run {
            return Ok(());
        }

        if self.force {
            return Ok(());
        }

        if self.should_skip_prompt() {
            return Ok(());
        }

        self.prompt_confirmation()
    }

    fn should_skip_prompt(&self) -> bool {
        // Would corrupt structured output.
        if self.json_logging {
            return true;
        }

        !self.prompt_handler.is_interactive()
    }

    fn prompt_confirmation(&self) -> Result<()> {
        let input = self.prompt_handler.read_confirmation(&self.target_display)?;

        if input != "yes" {
            return Err(anyhow!(SesrmError::Cancelled));
        }

        Ok(())
    }
}

/// Human-readable description of the templates a run selects.
fn describe_target(config: &Config) -> String {
    let mut target = match config.filter_config.before_time {
        Some(before_time) => format!(
            "all SES templates created before {}",
            before_time.to_rfc3339()
        ),
        None => "all SES templates".to_string(),
    };

    if let Some(include_regex) = &config.filter_config.include_regex {
        target.push_str(&format!(", matching '{}'", include_regex.as_str()));
    }
    if let Some(exclude_regex) = &config.filter_config.exclude_regex {
        target.push_str(&format!(", not matching '{}'", exclude_regex.as_str()));
    }

    target
}
