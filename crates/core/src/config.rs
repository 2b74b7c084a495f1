//! Tool configuration
//!
//! Configuration comes in as JSON, either from a file or built in memory.
//! Cheap structural checks happen at load time; `Config::resolve` then
//! produces an immutable [`ResolvedConfig`] with exclude rules compiled to
//! regexes and `defaultSizes` filled in from the catalog.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::pattern::PatternOverride;

/// A named viewport used to drive a capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenSize {
    pub width: u32,
    pub height: u32,
}

/// Raw configuration as declared by the user.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Base URL of the running PatternLab instance
    #[serde(default = "default_patternlab_url")]
    pub patternlab_url: String,

    /// Catalog of screen sizes, keyed by identifier
    #[serde(default)]
    pub screen_sizes: Option<IndexMap<String, ScreenSize>>,

    /// Subset of the catalog used when a pattern specifies nothing
    #[serde(default)]
    pub default_sizes: Option<Vec<String>>,

    /// Regex sources matched against pattern ids
    #[serde(default)]
    pub exclude_patterns: Vec<String>,

    /// Regex sources matched against pattern states
    #[serde(default)]
    pub exclude_states: Vec<String>,

    /// Inline per-pattern overrides
    #[serde(default)]
    pub patterns: Option<IndexMap<String, PatternOverride>>,

    /// Drop scraped patterns that have no inline `patterns` entry
    #[serde(default)]
    pub implicit_exclude: bool,

    /// Legacy external override file, mutually exclusive with `patterns`
    #[serde(default)]
    pub pattern_config_file: Option<PathBuf>,

    /// Destination for the rendered test file
    #[serde(default = "default_output_file")]
    pub output_file: PathBuf,

    /// Template consumed by the renderer; `None` uses the bundled default
    #[serde(default)]
    pub template_file: Option<PathBuf>,

    /// Capture every pattern on its own page instead of the styleguide
    #[serde(default)]
    pub load_on_single_page: bool,

    /// Group rendered suites by the pattern id's first hyphen segment
    #[serde(default)]
    pub group_tests_by_type: bool,

    /// When false, scraped pattern titles are lower-cased
    #[serde(default = "default_true")]
    pub case_sensitive: bool,

    /// Directory of the config file this was loaded from, if any.
    /// `patternConfigFile` resolves relative to it.
    #[serde(skip)]
    pub config_dir: Option<PathBuf>,
}

fn default_patternlab_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_output_file() -> PathBuf {
    PathBuf::from("./patternlabTests.js")
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load a configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|_| {
            Error::Config(format!("could not read config file \"{}\"", path.display()))
        })?;
        let mut config: Self = serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("invalid config file \"{}\": {}", path.display(), e)))?;
        config.config_dir = path.parent().map(Path::to_path_buf);
        config.validate()?;
        Ok(config)
    }

    /// Build a configuration from an in-memory JSON value.
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        let config: Self = serde_json::from_value(value)
            .map_err(|e| Error::Config(format!("invalid config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Structural checks that fail fast, before any scraping happens.
    fn validate(&self) -> Result<()> {
        let screen_sizes = self
            .screen_sizes
            .as_ref()
            .ok_or_else(|| Error::Config("missing screenSizes".to_string()))?;

        if self.patterns.is_some() && self.pattern_config_file.is_some() {
            return Err(Error::Config(
                "Please use either the patternConfigFile or the patterns settings".to_string(),
            ));
        }

        if let Some(defaults) = &self.default_sizes {
            let unknown: Vec<&str> = defaults
                .iter()
                .filter(|id| !screen_sizes.contains_key(id.as_str()))
                .map(String::as_str)
                .collect();
            if !unknown.is_empty() {
                return Err(Error::Config(format!(
                    "The following default screenSizes are not defined: {}",
                    unknown.join(", ")
                )));
            }
        }

        Ok(())
    }

    /// Compile exclude rules and fill in defaults, producing the immutable
    /// configuration the rest of the pipeline runs on.
    pub fn resolve(self) -> Result<ResolvedConfig> {
        let screen_sizes = self
            .screen_sizes
            .ok_or_else(|| Error::Config("missing screenSizes".to_string()))?;

        let default_sizes = match self.default_sizes {
            Some(sizes) => sizes,
            None => screen_sizes.keys().cloned().collect(),
        };

        let exclude_patterns = compile_rules(&self.exclude_patterns, "excludePatterns")?;
        let exclude_states = compile_rules(&self.exclude_states, "excludeStates")?;

        Ok(ResolvedConfig {
            patternlab_url: self.patternlab_url,
            screen_sizes,
            default_sizes,
            exclude_patterns,
            exclude_states,
            patterns: self.patterns,
            implicit_exclude: self.implicit_exclude,
            pattern_config_file: self.pattern_config_file,
            output_file: self.output_file,
            template_file: self.template_file,
            load_on_single_page: self.load_on_single_page,
            group_tests_by_type: self.group_tests_by_type,
            case_sensitive: self.case_sensitive,
            config_dir: self.config_dir,
        })
    }
}

fn compile_rules(sources: &[String], option: &str) -> Result<Vec<Regex>> {
    sources
        .iter()
        .map(|source| {
            Regex::new(source).map_err(|e| {
                Error::Config(format!("invalid {} regex \"{}\": {}", option, source, e))
            })
        })
        .collect()
}

/// Resolved, immutable configuration for one run.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub patternlab_url: String,
    pub screen_sizes: IndexMap<String, ScreenSize>,
    pub default_sizes: Vec<String>,
    pub exclude_patterns: Vec<Regex>,
    pub exclude_states: Vec<Regex>,
    pub patterns: Option<IndexMap<String, PatternOverride>>,
    pub implicit_exclude: bool,
    pub pattern_config_file: Option<PathBuf>,
    pub output_file: PathBuf,
    pub template_file: Option<PathBuf>,
    pub load_on_single_page: bool,
    pub group_tests_by_type: bool,
    pub case_sensitive: bool,
    pub config_dir: Option<PathBuf>,
}

impl ResolvedConfig {
    /// Absolute path of the legacy pattern config file, relative to the
    /// directory the main config file was loaded from.
    pub fn pattern_config_path(&self) -> Option<PathBuf> {
        self.pattern_config_file.as_ref().map(|file| {
            match &self.config_dir {
                Some(dir) => dir.join(file),
                None => file.clone(),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn minimal() -> serde_json::Value {
        json!({
            "screenSizes": {
                "desktop": { "width": 1440, "height": 900 }
            }
        })
    }

    #[test]
    fn applies_defaults() {
        let config = Config::from_value(minimal()).unwrap();
        assert_eq!(config.patternlab_url, "http://localhost:3000");
        assert_eq!(config.output_file, PathBuf::from("./patternlabTests.js"));
        assert!(config.template_file.is_none());
        assert!(config.exclude_patterns.is_empty());
        assert!(config.case_sensitive);
        assert!(!config.load_on_single_page);
        assert!(!config.group_tests_by_type);
    }

    #[test]
    fn fails_without_screen_sizes() {
        let err = Config::from_value(json!({})).unwrap_err();
        assert_eq!(err.to_string(), "config error - missing screenSizes");
    }

    #[test]
    fn patterns_and_pattern_config_file_are_mutually_exclusive() {
        let mut value = minimal();
        value["patterns"] = json!({});
        value["patternConfigFile"] = json!("./pattern.config.json");
        let err = Config::from_value(value).unwrap_err();
        assert!(err
            .to_string()
            .contains("Please use either the patternConfigFile or the patterns settings"));
    }

    #[test]
    fn unknown_default_sizes_are_listed_in_input_order() {
        let mut value = minimal();
        value["defaultSizes"] = json!(["notExistingScreenSize_1", "unknownScreenSize_2"]);
        let err = Config::from_value(value).unwrap_err();
        assert_eq!(
            err.to_string(),
            "config error - The following default screenSizes are not defined: \
             notExistingScreenSize_1, unknownScreenSize_2"
        );
    }

    #[test]
    fn resolve_defaults_default_sizes_to_all_catalog_keys() {
        let mut value = minimal();
        value["screenSizes"]["tablet"] = json!({ "width": 1024, "height": 768 });
        let resolved = Config::from_value(value).unwrap().resolve().unwrap();
        assert_eq!(resolved.default_sizes, vec!["desktop", "tablet"]);
    }

    #[test]
    fn resolve_compiles_exclude_rules() {
        let mut value = minimal();
        value["excludePatterns"] = json!(["^templates-", "navigation$"]);
        value["excludeStates"] = json!(["inprogress"]);
        let resolved = Config::from_value(value).unwrap().resolve().unwrap();
        assert!(resolved.exclude_patterns[0].is_match("templates-page"));
        assert!(!resolved.exclude_patterns[0].is_match("atoms-templates-x"));
        assert!(resolved.exclude_patterns[1].is_match("molecules-navigation"));
        assert!(resolved.exclude_states[0].is_match("inprogress"));
    }

    #[test]
    fn resolve_rejects_invalid_regex() {
        let mut value = minimal();
        value["excludePatterns"] = json!(["["]);
        let err = Config::from_value(value).unwrap().resolve().unwrap_err();
        assert!(err.to_string().starts_with("config error - invalid excludePatterns regex"));
    }

    #[test]
    fn pattern_config_path_resolves_relative_to_config_dir() {
        let mut value = minimal();
        value["patternConfigFile"] = json!("pattern.config.json");
        let mut config = Config::from_value(value).unwrap();
        config.config_dir = Some(PathBuf::from("/srv/styleguide"));
        let resolved = config.resolve().unwrap();
        assert_eq!(
            resolved.pattern_config_path(),
            Some(PathBuf::from("/srv/styleguide/pattern.config.json"))
        );
    }
}
