//! Exclude regex filter.
//!
//! Passes templates whose name does not match the configured exclude regex.

use tracing::{debug, warn};

use crate::config::FilterConfig;
use crate::types::TemplateMetadata;

pub const FILTER_NAME: &str = "ExcludeRegexFilter";

pub fn is_not_match(template: &TemplateMetadata, config: &FilterConfig) -> bool {
    let Some(exclude_regex) = config.exclude_regex.as_ref() else {
        return true;
    };

    let match_result = exclude_regex.is_match(&template.name).unwrap_or_else(|e| {
        warn!(
            name = FILTER_NAME,
            template = template.name,
            error = e.to_string(),
            "regex evaluation failed; template treated as matching."
        );
        true
    });

    if match_result {
        debug!(
            name = FILTER_NAME,
            template = template.name,
            exclude_regex = exclude_regex.as_str(),
            "template filtered."
        );
    }

    !match_result
}
