//! Creation-time "before" filter.
//!
//! Passes templates whose creation time is strictly before the retention
//! cutoff. A template created exactly at the cutoff is filtered out.

use tracing::debug;

use crate::config::FilterConfig;
use crate::types::TemplateMetadata;

pub const FILTER_NAME: &str = "CreatedBeforeFilter";

pub fn is_before(template: &TemplateMetadata, config: &FilterConfig) -> bool {
    let Some(before_time) = config.before_time else {
        return true;
    };

    if before_time <= template.created_at {
        let created_at = template.created_at.to_rfc3339();
        let cutoff = before_time.to_rfc3339();

        debug!(
            name = FILTER_NAME,
            template = template.name,
            created_at = created_at,
            cutoff = cutoff,
            "template filtered."
        );

        return false;
    }

    true
}
