//! Configuration merge engine
//!
//! Orchestrates one run as a linear pipeline: fetch and scrape the
//! styleguide, load the declared pattern configuration, merge scraped
//! patterns with declared overrides, resolve per-pattern screen sizes and
//! actions, render, and write the output file. The first failing stage
//! aborts the run; size violations are collected across the whole pattern
//! set first.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::actions::normalize_actions;
use crate::config::{Config, ResolvedConfig};
use crate::error::{Error, Result};
use crate::fetch::fetch_styleguide;
use crate::pattern::{MergedPattern, PatternConfig, PatternDescriptor, PatternOverride};
use crate::render::render_tests;
use crate::scrape::scrape_patterns;
use crate::sizes::{resolve_screen_sizes, SizeViolations};

/// The merged, fully resolved pattern set for one run.
#[derive(Debug, Serialize)]
pub struct PatternsConfiguration {
    #[serde(rename = "_patternOrder")]
    pub pattern_order: Vec<String>,
    pub patterns: IndexMap<String, PatternConfig>,
}

/// Result of a successful run. Warnings are part of the value, the engine
/// never prints them itself.
#[derive(Debug)]
pub struct GenerateOutcome {
    pub output_file: PathBuf,
    pub warnings: Vec<String>,
}

/// Where the declared pattern overrides came from.
enum DeclaredSource {
    None,
    Inline(IndexMap<String, PatternOverride>),
    LegacyFile {
        path: PathBuf,
        /// Verbatim file content, kept for the `.bak` backup
        raw: String,
        patterns: IndexMap<String, PatternOverride>,
    },
}

#[derive(Deserialize)]
struct LegacyPatternFile {
    #[serde(default)]
    patterns: IndexMap<String, PatternOverride>,
}

/// Generates a Gemini test suite from a PatternLab styleguide.
pub struct TestGenerator {
    config: ResolvedConfig,
}

impl TestGenerator {
    pub fn new(config: Config) -> Result<Self> {
        Ok(Self {
            config: config.resolve()?,
        })
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        Self::new(Config::from_file(path)?)
    }

    pub fn config(&self) -> &ResolvedConfig {
        &self.config
    }

    /// Run the full pipeline and write the rendered test file.
    pub async fn generate_tests(&self) -> Result<GenerateOutcome> {
        let html = fetch_styleguide(&self.config.patternlab_url).await?;
        self.generate_tests_from_html(&html)
    }

    /// Same as [`generate_tests`](Self::generate_tests) but starting from
    /// already fetched styleguide HTML.
    pub fn generate_tests_from_html(&self, html: &str) -> Result<GenerateOutcome> {
        let mut warnings = Vec::new();
        let configuration = self.patterns_configuration_from_html(html, &mut warnings)?;

        let rendered = render_tests(&self.config, &configuration)?;
        std::fs::write(&self.config.output_file, rendered)?;
        info!("wrote {}", self.config.output_file.display());

        Ok(GenerateOutcome {
            output_file: self.config.output_file.clone(),
            warnings,
        })
    }

    /// Fetch, scrape, merge and resolve, without rendering.
    pub async fn patterns_configuration(
        &self,
        warnings: &mut Vec<String>,
    ) -> Result<PatternsConfiguration> {
        let html = fetch_styleguide(&self.config.patternlab_url).await?;
        self.patterns_configuration_from_html(&html, warnings)
    }

    /// Merge already fetched styleguide HTML against the declared pattern
    /// configuration and resolve every pattern.
    pub fn patterns_configuration_from_html(
        &self,
        html: &str,
        warnings: &mut Vec<String>,
    ) -> Result<PatternsConfiguration> {
        let scraped = scrape_patterns(html, &self.config)?;
        debug!("scraped {} pattern(s)", scraped.len());
        let declared = self.load_pattern_config(warnings)?;

        let merged = match &declared {
            DeclaredSource::None => self.merge_patterns(scraped, &IndexMap::new(), false, warnings)?,
            DeclaredSource::Inline(patterns) => {
                self.merge_patterns(scraped, patterns, false, warnings)?
            }
            DeclaredSource::LegacyFile { patterns, .. } => {
                self.merge_patterns(scraped, patterns, true, warnings)?
            }
        };

        let configuration = self.resolve_pattern_options(merged.clone())?;

        if let DeclaredSource::LegacyFile { path, raw, .. } = &declared {
            self.persist_legacy_config(path, raw, &merged)?;
        }

        Ok(configuration)
    }

    /// Resolve the declared pattern overrides from one of three mutually
    /// exclusive sources: inline `patterns`, the legacy external file, or
    /// nothing.
    fn load_pattern_config(&self, warnings: &mut Vec<String>) -> Result<DeclaredSource> {
        if let Some(patterns) = &self.config.patterns {
            return Ok(DeclaredSource::Inline(patterns.clone()));
        }

        let Some(configured) = &self.config.pattern_config_file else {
            return Ok(DeclaredSource::None);
        };
        let path = self
            .config
            .pattern_config_path()
            .unwrap_or_else(|| configured.clone());

        warnings.push(
            "the patternConfigFile setting is deprecated, please use the patterns \
             setting instead"
                .to_string(),
        );

        let not_found = || {
            Error::Config(format!(
                "could not find config file \"{}\"",
                configured.display()
            ))
        };
        let metadata = std::fs::metadata(&path).map_err(|_| not_found())?;
        if !metadata.is_file() {
            return Err(not_found());
        }

        let raw = std::fs::read_to_string(&path).map_err(|_| not_found())?;
        let file: LegacyPatternFile = serde_json::from_str(&raw).map_err(|e| {
            Error::Config(format!(
                "invalid pattern config file \"{}\": {}",
                configured.display(),
                e
            ))
        })?;

        Ok(DeclaredSource::LegacyFile {
            path,
            raw,
            patterns: file.patterns,
        })
    }

    /// Seed one merged entry per scraped pattern, then overlay declared
    /// fields. Declared ids missing from the fresh scrape are fatal in
    /// legacy-file mode and a warning in inline mode.
    fn merge_patterns(
        &self,
        scraped: Vec<PatternDescriptor>,
        declared: &IndexMap<String, PatternOverride>,
        legacy: bool,
        warnings: &mut Vec<String>,
    ) -> Result<Vec<MergedPattern>> {
        let missing: Vec<&str> = declared
            .keys()
            .filter(|id| !scraped.iter().any(|p| &p.id == *id))
            .map(String::as_str)
            .collect();

        if !missing.is_empty() {
            if legacy {
                let quoted: Vec<String> =
                    missing.iter().map(|id| format!("\"{}\"", id)).collect();
                return Err(Error::Config(format!(
                    "The following patterns are no longer part of the styleguide: {}! \
                     Please check if they have been renamed or remove them from the config",
                    quoted.join(", ")
                )));
            }
            let message = format!(
                "The following patterns are no longer part of the styleguide: {}",
                missing.join(", ")
            );
            warn!("{}", message);
            warnings.push(message);
        }

        Ok(scraped
            .into_iter()
            .map(|descriptor| {
                let mut merged = MergedPattern::from_descriptor(descriptor);
                if let Some(declared) = declared.get(merged.id.as_str()) {
                    merged.apply_override(declared);
                }
                merged
            })
            .collect())
    }

    /// One pass over every merged pattern: normalize actions, resolve
    /// screen sizes, collect size violations across the whole set, and
    /// only then fail with one aggregated message per category.
    fn resolve_pattern_options(
        &self,
        merged: Vec<MergedPattern>,
    ) -> Result<PatternsConfiguration> {
        let mut violations = SizeViolations::default();
        let mut pattern_order = Vec::with_capacity(merged.len());
        let mut patterns = IndexMap::with_capacity(merged.len());

        for pattern in merged {
            let normalized = normalize_actions(&pattern, &self.config)?;
            let screen_sizes =
                resolve_screen_sizes(&pattern.id, &pattern.declared, &self.config, &mut violations);

            pattern_order.push(pattern.id.clone());
            patterns.insert(
                pattern.id.clone(),
                PatternConfig {
                    id: pattern.id,
                    name: pattern.name,
                    url: pattern.url,
                    state: pattern.state,
                    screen_sizes,
                    actions: normalized.actions,
                    skip_browsers: normalized.skip_browsers,
                    capture_elements: pattern.declared.capture_elements,
                    ignore_elements: pattern.declared.ignore_elements,
                    load_on_single_page: pattern.declared.load_on_single_page.unwrap_or(false),
                },
            );
        }

        if let Some(error) = violations.into_error() {
            return Err(error);
        }

        Ok(PatternsConfiguration {
            pattern_order,
            patterns,
        })
    }

    /// Legacy mode persists the merged configuration back: the previous
    /// file is kept verbatim as `<file>.bak`, the file itself is rewritten
    /// as `{_patternOrder, patterns}` holding each pattern's scraped
    /// identity plus its raw declared override. Resolved data (derived
    /// screen sizes, normalized actions) stays out of the file so the
    /// next run can reload it unchanged.
    fn persist_legacy_config(
        &self,
        path: &Path,
        previous: &str,
        merged: &[MergedPattern],
    ) -> Result<()> {
        let mut backup = path.as_os_str().to_os_string();
        backup.push(".bak");
        std::fs::write(PathBuf::from(backup), previous)?;

        let mut pattern_order = Vec::with_capacity(merged.len());
        let mut patterns = IndexMap::with_capacity(merged.len());
        for pattern in merged {
            // the effective name lives in the top-level field
            let mut declared = pattern.declared.clone();
            declared.name = None;

            pattern_order.push(pattern.id.clone());
            patterns.insert(
                pattern.id.clone(),
                PersistedPattern {
                    id: pattern.id.clone(),
                    name: pattern.name.clone(),
                    url: pattern.url.clone(),
                    state: pattern.state.clone(),
                    declared,
                },
            );
        }

        let updated = serde_json::to_string_pretty(&PersistedPatterns {
            pattern_order,
            patterns,
        })
        .map_err(|e| Error::Config(format!("could not serialize pattern config: {}", e)))?;
        std::fs::write(path, updated)?;
        debug!("updated pattern config file {}", path.display());
        Ok(())
    }
}

/// Shape of the rewritten legacy pattern config file.
#[derive(Serialize)]
struct PersistedPatterns {
    #[serde(rename = "_patternOrder")]
    pattern_order: Vec<String>,
    patterns: IndexMap<String, PersistedPattern>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PersistedPattern {
    id: String,
    name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    state: Option<String>,

    #[serde(flatten)]
    declared: PatternOverride,
}
