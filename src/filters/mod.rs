//! Template selection filters.
//!
//! Each filter is a plain predicate over a listed template. The lister runs
//! every configured filter against each template with logical AND
//! semantics; a template is selected only if all filters pass.

use crate::config::FilterConfig;
use crate::types::TemplateMetadata;

pub mod created_before;
pub mod exclude_regex;
#[cfg(test)]
mod filter_properties;
pub mod include_regex;

/// Predicate applied to each listed template.
pub type FilterFn = fn(&TemplateMetadata, &FilterConfig) -> bool;

/// The ordered set of filters enabled by a [`FilterConfig`].
pub struct TemplateFilterChain {
    filter_config: FilterConfig,
    filters: Vec<(&'static str, FilterFn)>,
}

impl TemplateFilterChain {
    pub fn new(filter_config: FilterConfig) -> Self {
        let mut filters: Vec<(&'static str, FilterFn)> = Vec::new();

        if filter_config.before_time.is_some() {
            filters.push((created_before::FILTER_NAME, created_before::is_before));
        }
        if filter_config.include_regex.is_some() {
            filters.push((include_regex::FILTER_NAME, include_regex::is_match));
        }
        if filter_config.exclude_regex.is_some() {
            filters.push((exclude_regex::FILTER_NAME, exclude_regex::is_not_match));
        }

        Self {
            filter_config,
            filters,
        }
    }

    /// Returns true if the template passes every enabled filter.
    pub fn is_selected(&self, template: &TemplateMetadata) -> bool {
        self.filters
            .iter()
            .all(|(_, filter_fn)| filter_fn(template, &self.filter_config))
    }

    pub fn filter_names(&self) -> Vec<&'static str> {
        self.filters.iter().map(|(name, _)| *name).collect()
    }
}
