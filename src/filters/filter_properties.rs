//! Property-based tests for template selection.

#[cfg(test)]
mod tests {
    use crate::config::FilterConfig;
    use crate::filters::{TemplateFilterChain, created_before};
    use crate::types::TemplateMetadata;
    use chrono::{DateTime, TimeDelta, Utc};
    use fancy_regex::Regex;
    use proptest::prelude::*;

    const BASE_SECS: i64 = 1_700_000_000;

    fn base_time() -> DateTime<Utc> {
        DateTime::from_timestamp(BASE_SECS, 0).unwrap()
    }

    // --- Generators ---

    /// Templates created within +/- 10 days of the base time, with second
    /// resolution so that some land exactly on the cutoff.
    fn arbitrary_template() -> impl Strategy<Value = TemplateMetadata> {
        let prefixes = prop_oneof![
            Just("campaign-".to_string()),
            Just("transactional-".to_string()),
            Just("".to_string()),
        ];
        (prefixes, "[a-z0-9]{1,8}", -864_000i64..864_000)
            .prop_map(|(prefix, suffix, offset)| {
                TemplateMetadata::new(
                    &format!("{prefix}{suffix}"),
                    base_time() + TimeDelta::seconds(offset),
                )
            })
    }

    fn filter_all(chain: &TemplateFilterChain, templates: &[TemplateMetadata]) -> Vec<TemplateMetadata> {
        templates
            .iter()
            .filter(|t| chain.is_selected(t))
            .cloned()
            .collect()
    }

    proptest! {
        #[test]
        fn selected_iff_created_strictly_before_cutoff(
            template in arbitrary_template(),
            cutoff_offset in -864_000i64..864_000,
        ) {
            let cutoff = base_time() + TimeDelta::seconds(cutoff_offset);
            let config = FilterConfig { before_time: Some(cutoff), ..Default::default() };

            prop_assert_eq!(
                created_before::is_before(&template, &config),
                template.created_at < cutoff
            );
        }

        #[test]
        fn boundary_equal_is_excluded(offset in -864_000i64..864_000) {
            let at = base_time() + TimeDelta::seconds(offset);
            let config = FilterConfig { before_time: Some(at), ..Default::default() };

            prop_assert!(!created_before::is_before(&TemplateMetadata::new("edge", at), &config));
        }

        #[test]
        fn filtering_preserves_order_and_is_idempotent(
            templates in proptest::collection::vec(arbitrary_template(), 0..50),
            cutoff_offset in -864_000i64..864_000,
            use_exclude in any::<bool>(),
        ) {
            let chain = TemplateFilterChain::new(FilterConfig {
                before_time: Some(base_time() + TimeDelta::seconds(cutoff_offset)),
                include_regex: None,
                exclude_regex: use_exclude.then(|| Regex::new("^transactional-").unwrap()),
            });

            let once = filter_all(&chain, &templates);

            // `once` is a subsequence of `templates`.
            let mut remaining = templates.iter();
            for selected in &once {
                prop_assert!(remaining.any(|t| t == selected));
            }

            let twice = filter_all(&chain, &once);
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn include_and_exclude_are_complementary(template in arbitrary_template()) {
            let include = TemplateFilterChain::new(FilterConfig {
                include_regex: Some(Regex::new("^campaign-").unwrap()),
                ..Default::default()
            });
            let exclude = TemplateFilterChain::new(FilterConfig {
                exclude_regex: Some(Regex::new("^campaign-").unwrap()),
                ..Default::default()
            });

            prop_assert_ne!(include.is_selected(&template), exclude.is_selected(&template));
        }
    }
}
