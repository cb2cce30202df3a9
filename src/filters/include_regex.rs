//! Include regex filter.
//!
//! Passes templates whose name matches the configured include regex.

use tracing::{debug, warn};

use crate::config::FilterConfig;
use crate::types::TemplateMetadata;

pub const FILTER_NAME: &str = "IncludeRegexFilter";

pub fn is_match(template: &TemplateMetadata, config: &FilterConfig) -> bool {
    let Some(include_regex) = config.include_regex.as_ref() else {
        return true;
    };

    let match_result = include_regex.is_match(&template.name).unwrap_or_else(|e| {
        warn!(
            name = FILTER_NAME,
            template = template.name,
            error = e.to_string(),
            "regex evaluation failed; template treated as not matching."
        );
        false
    });

    if !match_result {
        debug!(
            name = FILTER_NAME,
            template = template.name,
            include_regex = include_regex.as_str(),
            "template filtered."
        );
    }

    match_result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::init_dummy_tracing_subscriber;
    use chrono::Utc;
    use fancy_regex::Regex;

    fn make_config(regex: &str) -> FilterConfig {
        FilterConfig {
            include_regex: Some(Regex::new(regex).unwrap()),
            ..Default::default()
        }
    }

    #[test]
    fn match_passes() {
        init_dummy_tracing_subscriber();

        let template = TemplateMetadata::new("campaign-2023-spring", Utc::now());
        assert!(is_match(&template, &make_config(r"^campaign-\d{4}-")));
    }

    #[test]
    fn no_match_is_filtered() {
        init_dummy_tracing_subscriber();

        let template = TemplateMetadata::new("welcome", Utc::now());
        assert!(!is_match(&template, &make_config("^campaign-")));
    }

    #[test]
    fn lookahead_is_supported() {
        init_dummy_tracing_subscriber();

        let config = make_config("^campaign-(?!keep)");
        assert!(is_match(
            &TemplateMetadata::new("campaign-old", Utc::now()),
            &config
        ));
        assert!(!is_match(
            &TemplateMetadata::new("campaign-keep", Utc::now()),
            &config
        ));
    }
}
