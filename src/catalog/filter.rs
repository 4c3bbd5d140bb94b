//! Ordered rename/discard rules applied to discovered metric names.

use regex::Regex;

use crate::config::{ConfigError, FilterConfig};

/// Action taken when a rule's pattern matches.
#[derive(Debug, Clone)]
enum FilterAction {
    /// Drop the metric and stop processing.
    Discard,
    /// Replace the match, then continue with the rewritten name.
    Rewrite(String),
}

/// A single compiled filter rule.
#[derive(Debug, Clone)]
struct FilterRule {
    pattern: Regex,
    action: FilterAction,
}

/// Outcome of running a metric name through a filter set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterOutcome {
    /// Store the metric under this (possibly rewritten) name.
    Keep(String),
    /// Drop the metric.
    Discard,
}

/// An ordered set of compiled filter rules for one origin.
///
/// Rules are evaluated strictly in configured order against the current,
/// possibly already-rewritten, name. A matching discard rule short-circuits;
/// a matching rewrite rule feeds its result to the next rule, so chained
/// rewrites apply in rule order.
#[derive(Debug, Clone, Default)]
pub struct FilterSet {
    rules: Vec<FilterRule>,
}

impl FilterSet {
    /// Compile an ordered rule list from configuration.
    ///
    /// # Errors
    /// Returns `ConfigError::ValidationError` for an invalid pattern or a
    /// rule that specifies both or neither of discard/rewrite.
    pub fn compile(configs: &[FilterConfig]) -> Result<Self, ConfigError> {
        let mut rules = Vec::with_capacity(configs.len());

        for config in configs {
            config.validate()?;

            let pattern = Regex::new(&config.pattern).map_err(|e| {
                ConfigError::ValidationError(format!(
                    "invalid filter pattern '{}': {e}",
                    config.pattern
                ))
            })?;

            let action = if config.discard {
                FilterAction::Discard
            } else {
                // validate() guarantees a rewrite is present here
                FilterAction::Rewrite(config.rewrite.clone().unwrap_or_default())
            };

            rules.push(FilterRule { pattern, action });
        }

        Ok(Self { rules })
    }

    /// Number of compiled rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the set has no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Run a metric name through the rule chain.
    pub fn apply(&self, metric: &str) -> FilterOutcome {
        let mut name = metric.to_string();

        for rule in &self.rules {
            if !rule.pattern.is_match(&name) {
                continue;
            }

            match &rule.action {
                FilterAction::Discard => {
                    tracing::debug!(metric = %metric, "discarding metric");
                    return FilterOutcome::Discard;
                }
                FilterAction::Rewrite(template) => {
                    name = rule.pattern.replace_all(&name, template.as_str()).into_owned();
                }
            }
        }

        FilterOutcome::Keep(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rewrite(pattern: &str, rewrite: &str) -> FilterConfig {
        FilterConfig {
            pattern: pattern.to_string(),
            discard: false,
            rewrite: Some(rewrite.to_string()),
        }
    }

    fn discard(pattern: &str) -> FilterConfig {
        FilterConfig {
            pattern: pattern.to_string(),
            discard: true,
            rewrite: None,
        }
    }

    #[test]
    fn test_empty_set_passes_name_through() {
        let filters = FilterSet::compile(&[]).unwrap();

        assert!(filters.is_empty());
        assert_eq!(
            filters.apply("cpu/idle"),
            FilterOutcome::Keep("cpu/idle".to_string())
        );
    }

    #[test]
    fn test_non_matching_rules_are_skipped() {
        let filters = FilterSet::compile(&[rewrite("^df-", "df/")]).unwrap();

        assert_eq!(
            filters.apply("cpu/idle"),
            FilterOutcome::Keep("cpu/idle".to_string())
        );
    }

    #[test]
    fn test_rewrite_with_capture_groups() {
        let filters = FilterSet::compile(&[rewrite(r"^cpu-(\d+)/", "cpu/$1/")]).unwrap();

        assert_eq!(
            filters.apply("cpu-0/idle"),
            FilterOutcome::Keep("cpu/0/idle".to_string())
        );
    }

    #[test]
    fn test_chained_rewrites_apply_in_order() {
        let filters = FilterSet::compile(&[rewrite("foo", "bar"), rewrite("bar", "baz")]).unwrap();

        assert_eq!(filters.apply("foo"), FilterOutcome::Keep("baz".to_string()));
    }

    #[test]
    fn test_discard_short_circuits() {
        // The rewrite after the discard must never run.
        let filters =
            FilterSet::compile(&[discard("secret"), rewrite("secret", "public")]).unwrap();

        assert_eq!(filters.apply("db/secret"), FilterOutcome::Discard);
    }

    #[test]
    fn test_rewrite_can_feed_a_discard() {
        let filters =
            FilterSet::compile(&[rewrite("^tmp-", "scratch/"), discard("^scratch/")]).unwrap();

        assert_eq!(filters.apply("tmp-files"), FilterOutcome::Discard);
        assert_eq!(
            filters.apply("disk/used"),
            FilterOutcome::Keep("disk/used".to_string())
        );
    }

    #[test]
    fn test_compile_rejects_invalid_pattern() {
        let err = FilterSet::compile(&[discard("(")]).unwrap_err();
        assert!(err.to_string().contains("invalid filter pattern"));
    }
}
