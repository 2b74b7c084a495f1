//! Action normalization
//!
//! Validates a pattern's declared interactions, derives the concrete
//! selectors and the Gemini step scripts, and normalizes skip-browser
//! rules. Unlike screen-size resolution, problems here are fatal right
//! away: a broken action list cannot be partially rendered.

use serde_json::Value;

use crate::config::ResolvedConfig;
use crate::error::{Error, Result};
use crate::pattern::{Action, ActionKind, BrowserSkip, MergedPattern};

/// Indentation matching the `actions.setWindowSize(...)` chain in the
/// rendered capture body.
const STEP_INDENT: &str = "\n            ";

/// Normalized pattern-level and per-action interaction data.
#[derive(Debug, Default)]
pub struct NormalizedActions {
    pub actions: Vec<Action>,
    pub skip_browsers: Vec<BrowserSkip>,
}

/// Validate and normalize the actions and skip-browser rules of one
/// merged pattern. A pattern without actions is a no-op.
pub fn normalize_actions(
    pattern: &MergedPattern,
    config: &ResolvedConfig,
) -> Result<NormalizedActions> {
    let mut normalized = NormalizedActions::default();

    if let Some(value) = &pattern.declared.skip_browsers {
        normalized.skip_browsers = normalize_skip_browsers(value, &pattern.id, None)?;
    }

    let Some(inputs) = &pattern.declared.actions else {
        return Ok(normalized);
    };

    let single_page =
        config.load_on_single_page || pattern.declared.load_on_single_page == Some(true);

    for input in inputs {
        let name = match input.name.as_deref() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => {
                return Err(Error::Config(format!(
                    "missing name for action in pattern \"{}\"",
                    pattern.id
                )))
            }
        };

        let kind = match input.action.as_deref() {
            None => {
                return Err(Error::Config(format!(
                    "missing action kind for action \"{}\" in pattern \"{}\"",
                    name, pattern.id
                )))
            }
            Some(raw) => ActionKind::parse(raw).ok_or_else(|| {
                Error::Config(format!(
                    "unknown action \"{}\" for pattern \"{}\", valid actions are: {}",
                    raw,
                    pattern.id,
                    ActionKind::VALID.join(", ")
                ))
            })?,
        };

        let selector = resolve_selector(&pattern.id, input.selector.as_deref(), single_page)?;

        let mut steps = match kind {
            ActionKind::Hover => match &input.pseudo_class {
                Some(class) => pseudo_class_script(&selector, class),
                None => format!("{}.moveMouse(this.element)", STEP_INDENT),
            },
            ActionKind::Focus => format!("{}.focus(this.element)", STEP_INDENT),
            ActionKind::Click => format!(
                "{indent}.click(this.element){indent}.moveMouse(this.element, {{x: -1, y: -1}})",
                indent = STEP_INDENT
            ),
            ActionKind::SendKeys => {
                let keys = match input.keys.as_deref() {
                    Some(keys) if !keys.is_empty() => keys,
                    _ => {
                        return Err(Error::Config(format!(
                            "missing keys option for action \"{}\" in pattern \"{}\"",
                            name, pattern.id
                        )))
                    }
                };
                format!("{}.sendKeys(this.element, '{}')", STEP_INDENT, escape_js(keys))
            }
        };

        if let Some(delay) = input.delay {
            steps.push_str(&format!("{}.wait({})", STEP_INDENT, delay));
        }

        let skip_browsers = match &input.skip_browsers {
            Some(value) => normalize_skip_browsers(value, &pattern.id, Some(&name))?,
            None => Vec::new(),
        };

        normalized.actions.push(Action {
            kind,
            name,
            selector,
            steps,
            skip_browsers,
        });
    }

    Ok(normalized)
}

/// Derive the concrete selector an action's element lookup uses.
fn resolve_selector(
    pattern_id: &str,
    declared: Option<&str>,
    single_page: bool,
) -> Result<String> {
    if single_page {
        // On a standalone pattern page there is no #<id> scope, so a
        // defaulted selector would match anything on the page.
        let selector = declared.ok_or_else(|| {
            Error::Config(format!(
                "actions of pattern \"{}\" need an explicit selector when \
                 loadOnSinglePage is set",
                pattern_id
            ))
        })?;
        Ok(format!("body {}", selector))
    } else {
        let selector = declared.unwrap_or("> *");
        Ok(format!("#{} .sg-pattern-example {}", pattern_id, selector))
    }
}

fn pseudo_class_script(selector: &str, class: &str) -> String {
    format!(
        "{indent}.executeJS(function(window) {{\
         {indent}  window.document.querySelector('{selector}').classList.add('{class}');\
         {indent}}})",
        indent = STEP_INDENT,
        selector = escape_js(selector),
        class = escape_js(class),
    )
}

fn escape_js(raw: &str) -> String {
    raw.replace('\\', "\\\\").replace('\'', "\\'")
}

/// Normalize a `skipBrowsers` value into canonical records. Bare strings
/// become `{regexp, default comment}`; objects may leave the comment off.
pub fn normalize_skip_browsers(
    value: &Value,
    pattern_id: &str,
    action_name: Option<&str>,
) -> Result<Vec<BrowserSkip>> {
    let scope = match action_name {
        Some(action) => format!("action \"{}\" in pattern \"{}\"", action, pattern_id),
        None => format!("pattern \"{}\"", pattern_id),
    };

    let entries = value.as_array().ok_or_else(|| {
        Error::Config(format!("skipBrowsers of {} is not an array", scope))
    })?;

    let mut skips = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        let invalid = || {
            Error::Config(format!(
                "invalid skipBrowsers entry at index {} of {}",
                index, scope
            ))
        };
        match entry {
            Value::String(regexp) => skips.push(BrowserSkip::from_regexp(regexp.clone())),
            Value::Object(fields) => {
                let regexp = fields
                    .get("regexp")
                    .and_then(Value::as_str)
                    .ok_or_else(invalid)?;
                let comment = match fields.get("comment") {
                    Some(Value::String(comment)) => comment.clone(),
                    Some(_) => return Err(invalid()),
                    None => BrowserSkip::DEFAULT_COMMENT.to_string(),
                };
                skips.push(BrowserSkip {
                    regexp: regexp.to_string(),
                    comment,
                });
            }
            _ => return Err(invalid()),
        }
    }

    Ok(skips)
}
