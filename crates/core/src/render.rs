//! Test-file rendering
//!
//! Builds the render-ready view model out of the merged pattern
//! configuration and runs it through a minijinja template. A bundled
//! template produces Gemini suites; `templateFile` swaps in a custom one.

use minijinja::Environment;
use serde::Serialize;
use tracing::debug;

use crate::config::ResolvedConfig;
use crate::engine::PatternsConfiguration;
use crate::error::{Error, Result};
use crate::fetch::STYLEGUIDE_PATH;
use crate::pattern::{BrowserSkip, PatternConfig};

const DEFAULT_TEMPLATE: &str = include_str!("../templates/main.js.jinja");
const DEFAULT_TEMPLATE_NAME: &str = "templates/main.js.jinja";

/// Everything the template sees.
#[derive(Debug, Serialize)]
pub struct TestFileModel {
    /// Render-ready suites, one per group (or a single default group)
    pub suites: Vec<SuiteModel>,
    /// Canonical pattern order, for custom templates
    #[serde(rename = "patternOrder")]
    pub pattern_order: Vec<String>,
    /// Full merged pattern data, for custom templates
    pub patterns: indexmap::IndexMap<String, PatternConfig>,
}

#[derive(Debug, Serialize)]
pub struct SuiteModel {
    pub title: String,
    /// Styleguide URL for the outer suite; absent in global single-page mode
    pub url: Option<String>,
    pub cases: Vec<CaseModel>,
}

/// One `gemini.suite` block: a pattern, or a pattern/action variant.
#[derive(Debug, Serialize)]
pub struct CaseModel {
    pub title: String,
    /// Per-case URL when the pattern is captured on its own page
    pub url: Option<String>,
    /// Element lookup for action variants
    pub before_selector: Option<String>,
    /// JS literal for `setCaptureElements`
    pub capture_elements: String,
    /// JS literal for `ignoreElements`
    pub ignore_elements: Option<String>,
    pub skip_browsers: Vec<BrowserSkip>,
    pub captures: Vec<CaptureModel>,
}

#[derive(Debug, Serialize)]
pub struct CaptureModel {
    pub name: String,
    pub width: u32,
    pub height: u32,
    /// Derived action steps chained after `setWindowSize`
    pub steps: String,
}

/// Build the view model for a merged, fully resolved pattern set.
pub fn build_view_model(
    config: &ResolvedConfig,
    configuration: &PatternsConfiguration,
) -> Result<TestFileModel> {
    let mut suites: Vec<SuiteModel> = Vec::new();

    for id in &configuration.pattern_order {
        let Some(pattern) = configuration.patterns.get(id) else {
            continue;
        };

        let title = if config.group_tests_by_type {
            group_title(id)
        } else {
            "Patternlab - ".to_string()
        };

        let suite = match suites.iter_mut().find(|s| s.title == title) {
            Some(suite) => suite,
            None => {
                suites.push(SuiteModel {
                    title,
                    url: (!config.load_on_single_page).then(|| STYLEGUIDE_PATH.to_string()),
                    cases: Vec::new(),
                });
                suites.last_mut().expect("just pushed")
            }
        };

        append_pattern_cases(config, pattern, &mut suite.cases)?;
    }

    Ok(TestFileModel {
        suites,
        pattern_order: configuration.pattern_order.clone(),
        patterns: configuration.patterns.clone(),
    })
}

fn append_pattern_cases(
    config: &ResolvedConfig,
    pattern: &PatternConfig,
    cases: &mut Vec<CaseModel>,
) -> Result<()> {
    let single_page = config.load_on_single_page || pattern.load_on_single_page;

    let capture_elements = if single_page && pattern.capture_elements.is_none() {
        "'body'".to_string()
    } else {
        let selectors = match &pattern.capture_elements {
            Some(declared) => declared.clone(),
            None => vec![format!("#{} .sg-pattern-example", pattern.id)],
        };
        js_string_array(&selectors)
    };

    let ignore_elements = pattern
        .ignore_elements
        .as_ref()
        .map(|selectors| ignore_elements_literal(selectors))
        .transpose()?;

    let url = if single_page { pattern.url.clone() } else { None };

    let captures = |steps: &str| -> Result<Vec<CaptureModel>> {
        pattern
            .screen_sizes
            .iter()
            .map(|size_id| {
                let size = config.screen_sizes.get(size_id.as_str()).ok_or_else(|| {
                    Error::Config(format!(
                        "The following screenSizes are used in patterns, but are not defined: {}",
                        size_id
                    ))
                })?;
                Ok(CaptureModel {
                    name: size_id.clone(),
                    width: size.width,
                    height: size.height,
                    steps: steps.to_string(),
                })
            })
            .collect()
    };

    cases.push(CaseModel {
        title: escape_js(&pattern.name),
        url: url.clone(),
        before_selector: None,
        capture_elements: capture_elements.clone(),
        ignore_elements: ignore_elements.clone(),
        skip_browsers: pattern.skip_browsers.clone(),
        captures: captures("")?,
    });

    for action in &pattern.actions {
        let mut skip_browsers = pattern.skip_browsers.clone();
        skip_browsers.extend(action.skip_browsers.iter().cloned());

        cases.push(CaseModel {
            title: format!("{} --- {}", escape_js(&pattern.name), escape_js(&action.name)),
            url: url.clone(),
            before_selector: Some(escape_js(&action.selector)),
            capture_elements: capture_elements.clone(),
            ignore_elements: ignore_elements.clone(),
            skip_browsers,
            captures: captures(&action.steps)?,
        });
    }

    Ok(())
}

/// Render the view model through the configured template.
pub fn render_tests(
    config: &ResolvedConfig,
    configuration: &PatternsConfiguration,
) -> Result<String> {
    let model = build_view_model(config, configuration)?;

    let (template_path, source) = match &config.template_file {
        Some(path) => {
            let path_display = path.display().to_string();
            let source = std::fs::read_to_string(path).map_err(|e| Error::Rendering {
                path: path_display.clone(),
                reason: e.to_string(),
            })?;
            (path_display, source)
        }
        None => (DEFAULT_TEMPLATE_NAME.to_string(), DEFAULT_TEMPLATE.to_string()),
    };

    debug!("rendering test file with template {}", template_path);

    let mut env = Environment::new();
    env.add_template("tests", &source)
        .map_err(|e| Error::Rendering {
            path: template_path.clone(),
            reason: e.to_string(),
        })?;
    let template = env.get_template("tests").map_err(|e| Error::Rendering {
        path: template_path.clone(),
        reason: e.to_string(),
    })?;
    template.render(&model).map_err(|e| Error::Rendering {
        path: template_path,
        reason: e.to_string(),
    })
}

/// `Atoms - ` for pattern id `atoms-button`.
fn group_title(pattern_id: &str) -> String {
    let segment = pattern_id.split('-').next().unwrap_or(pattern_id);
    let mut chars = segment.chars();
    let titlecased = match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    };
    format!("{} - ", titlecased)
}

fn js_string_array(items: &[String]) -> String {
    let quoted: Vec<String> = items
        .iter()
        .map(|item| format!("'{}'", escape_js(item)))
        .collect();
    format!("[{}]", quoted.join(", "))
}

fn ignore_elements_literal(selectors: &[String]) -> Result<String> {
    let wrapped: Vec<serde_json::Value> = selectors
        .iter()
        .map(|s| serde_json::json!({ "every": s }))
        .collect();
    serde_json::to_string(&wrapped)
        .map_err(|e| Error::Config(format!("could not serialize ignoreElements: {}", e)))
}

fn escape_js(raw: &str) -> String {
    raw.replace('\\', "\\\\").replace('\'', "\\'")
}
