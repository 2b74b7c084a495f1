//! Per-pattern screen-size resolution
//!
//! Violations are collected across the whole pattern set and only turned
//! into a single aggregated error after every pattern has been resolved,
//! so one run surfaces everything there is to fix.

use crate::config::ResolvedConfig;
use crate::error::Error;
use crate::pattern::PatternOverride;

/// Screen-size violations accumulated over a full resolution pass.
///
/// Category order is fixed: undefined sizes, zero-screen patterns,
/// overwrite conflicts. Within a category, first-seen order is kept.
#[derive(Debug, Default)]
pub struct SizeViolations {
    undefined_sizes: Vec<String>,
    zero_screens: Vec<String>,
    overwrite_conflicts: Vec<String>,
}

impl SizeViolations {
    pub fn is_empty(&self) -> bool {
        self.undefined_sizes.is_empty()
            && self.zero_screens.is_empty()
            && self.overwrite_conflicts.is_empty()
    }

    fn record_undefined(&mut self, size_id: &str) {
        if !self.undefined_sizes.iter().any(|s| s == size_id) {
            self.undefined_sizes.push(size_id.to_string());
        }
    }

    /// Collapse the collected violations into one aggregated config error,
    /// or `None` if the pass was clean.
    pub fn into_error(self) -> Option<Error> {
        let mut parts = Vec::new();
        if !self.undefined_sizes.is_empty() {
            parts.push(format!(
                "The following screenSizes are used in patterns, but are not defined: {}",
                self.undefined_sizes.join(", ")
            ));
        }
        if !self.zero_screens.is_empty() {
            parts.push(format!(
                "The following patterns have no screens: {}",
                self.zero_screens.join(", ")
            ));
        }
        if !self.overwrite_conflicts.is_empty() {
            parts.push(format!(
                "The following patterns have both overwrites and additionalScreenSizes \
                 or excludeScreenSizes defined: {} please fix the configuration to use \
                 either overwrites or additionalScreenSizes/excludeScreenSizes",
                self.overwrite_conflicts.join(", ")
            ));
        }
        if parts.is_empty() {
            None
        } else {
            Some(Error::Config(parts.join("; ")))
        }
    }
}

/// Compute the effective ordered screen-size ids for one pattern.
///
/// Never fails on its own; every problem is recorded in `violations` and
/// resolution continues with the other patterns.
pub fn resolve_screen_sizes(
    pattern_id: &str,
    declared: &PatternOverride,
    config: &ResolvedConfig,
    violations: &mut SizeViolations,
) -> Vec<String> {
    for size_id in declared
        .screen_sizes
        .iter()
        .chain(declared.additional_screen_sizes.iter())
        .chain(declared.exclude_screen_sizes.iter())
        .flatten()
    {
        if !config.screen_sizes.contains_key(size_id.as_str()) {
            violations.record_undefined(size_id);
        }
    }

    let has_modifiers =
        declared.additional_screen_sizes.is_some() || declared.exclude_screen_sizes.is_some();

    if let Some(overwrite) = &declared.screen_sizes {
        if has_modifiers {
            violations.overwrite_conflicts.push(pattern_id.to_string());
        }
        if overwrite.is_empty() {
            violations.zero_screens.push(pattern_id.to_string());
        }
        return overwrite.clone();
    }

    if !has_modifiers {
        return config.default_sizes.clone();
    }

    let mut sizes = config.default_sizes.clone();
    if let Some(additional) = &declared.additional_screen_sizes {
        // duplicates are kept on purpose, the tool does not dedupe
        sizes.extend(additional.iter().cloned());
    }
    if let Some(excluded) = &declared.exclude_screen_sizes {
        for size_id in excluded {
            if let Some(index) = sizes.iter().position(|s| s == size_id) {
                sizes.remove(index);
            }
        }
    }

    if sizes.is_empty() {
        violations.zero_screens.push(pattern_id.to_string());
    }
    sizes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use serde_json::json;

    fn config() -> ResolvedConfig {
        Config::from_value(json!({
            "screenSizes": {
                "a": { "width": 100, "height": 100 },
                "b": { "width": 200, "height": 200 },
                "x": { "width": 300, "height": 300 }
            },
            "defaultSizes": ["a", "b"]
        }))
        .unwrap()
        .resolve()
        .unwrap()
    }

    fn declared(value: serde_json::Value) -> PatternOverride {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn no_declaration_uses_the_default_set() {
        let mut violations = SizeViolations::default();
        let sizes = resolve_screen_sizes("p1", &declared(json!({})), &config(), &mut violations);
        assert_eq!(sizes, vec!["a", "b"]);
        assert!(violations.is_empty());
    }

    #[test]
    fn additional_sizes_are_appended_to_the_defaults() {
        let mut violations = SizeViolations::default();
        let sizes = resolve_screen_sizes(
            "p1",
            &declared(json!({ "additionalScreenSizes": ["x"] })),
            &config(),
            &mut violations,
        );
        assert_eq!(sizes, vec!["a", "b", "x"]);
        assert!(violations.is_empty());
    }

    #[test]
    fn excluded_sizes_are_removed_from_the_defaults() {
        let mut violations = SizeViolations::default();
        let sizes = resolve_screen_sizes(
            "p1",
            &declared(json!({ "excludeScreenSizes": ["b"] })),
            &config(),
            &mut violations,
        );
        assert_eq!(sizes, vec!["a"]);
        assert!(violations.is_empty());
    }

    #[test]
    fn excluding_an_absent_size_is_a_no_op() {
        let mut violations = SizeViolations::default();
        let sizes = resolve_screen_sizes(
            "p1",
            &declared(json!({ "excludeScreenSizes": ["x"] })),
            &config(),
            &mut violations,
        );
        assert_eq!(sizes, vec!["a", "b"]);
    }

    #[test]
    fn explicit_overwrite_is_used_as_is_and_is_idempotent() {
        let cfg = config();
        let declared = declared(json!({ "screenSizes": ["b"] }));
        let mut violations = SizeViolations::default();
        let first = resolve_screen_sizes("p1", &declared, &cfg, &mut violations);
        let second = resolve_screen_sizes("p1", &declared, &cfg, &mut violations);
        assert_eq!(first, vec!["b"]);
        assert_eq!(first, second);
        assert!(violations.is_empty());
    }

    #[test]
    fn empty_overwrite_is_a_zero_screens_violation() {
        let mut violations = SizeViolations::default();
        resolve_screen_sizes(
            "pattern-2",
            &declared(json!({ "screenSizes": [] })),
            &config(),
            &mut violations,
        );
        let err = violations.into_error().unwrap();
        assert_eq!(
            err.to_string(),
            "config error - The following patterns have no screens: pattern-2"
        );
    }

    #[test]
    fn excluding_everything_is_a_zero_screens_violation() {
        let mut violations = SizeViolations::default();
        resolve_screen_sizes(
            "pattern-2",
            &declared(json!({ "excludeScreenSizes": ["a", "b"] })),
            &config(),
            &mut violations,
        );
        let err = violations.into_error().unwrap();
        assert_eq!(
            err.to_string(),
            "config error - The following patterns have no screens: pattern-2"
        );
    }

    #[test]
    fn overwrite_with_modifiers_is_a_conflict_even_when_one_is_empty() {
        let cases = [
            json!({ "screenSizes": ["a"], "additionalScreenSizes": ["x"] }),
            json!({ "screenSizes": ["a"], "excludeScreenSizes": [] }),
            json!({ "screenSizes": [], "additionalScreenSizes": ["x"] }),
        ];
        for case in cases {
            let mut violations = SizeViolations::default();
            resolve_screen_sizes("p1", &declared(case), &config(), &mut violations);
            let message = violations.into_error().unwrap().to_string();
            assert!(
                message.contains("have both overwrites and additionalScreenSizes"),
                "unexpected message: {}",
                message
            );
        }
    }

    #[test]
    fn unknown_sizes_are_aggregated_in_first_seen_order() {
        let mut violations = SizeViolations::default();
        resolve_screen_sizes(
            "p1",
            &declared(json!({ "additionalScreenSizes": ["unknownSize_9", "a"] })),
            &config(),
            &mut violations,
        );
        resolve_screen_sizes(
            "p2",
            &declared(json!({ "excludeScreenSizes": ["unknownSize_10", "unknownSize_9"] })),
            &config(),
            &mut violations,
        );
        let err = violations.into_error().unwrap();
        assert_eq!(
            err.to_string(),
            "config error - The following screenSizes are used in patterns, but are not \
             defined: unknownSize_9, unknownSize_10"
        );
    }

    #[test]
    fn categories_are_reported_in_fixed_order() {
        let mut violations = SizeViolations::default();
        resolve_screen_sizes(
            "p1",
            &declared(json!({ "screenSizes": [], "additionalScreenSizes": ["nope"] })),
            &config(),
            &mut violations,
        );
        let message = violations.into_error().unwrap().to_string();
        let undefined = message.find("are not defined").unwrap();
        let zero = message.find("have no screens").unwrap();
        let conflict = message.find("have both overwrites").unwrap();
        assert!(undefined < zero && zero < conflict);
    }
}
