//! Pattern data model
//!
//! [`PatternDescriptor`] is what the scraper finds in the styleguide,
//! [`PatternOverride`] is what the user declared for a pattern, and
//! [`PatternConfig`] is the merged, fully resolved unit that goes into
//! rendering.

use serde::{Deserialize, Serialize};

/// One pattern block discovered in the styleguide HTML.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternDescriptor {
    pub id: String,
    pub name: String,
    pub url: Option<String>,
    pub state: Option<String>,
}

/// Per-pattern settings declared by the user, all optional.
///
/// `skip_browsers` stays a raw JSON value here: entries may be bare strings
/// or objects, and malformed entries must surface as config errors naming
/// the pattern and index, not as deserialization failures.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actions: Option<Vec<ActionInput>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_browsers: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screen_sizes: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_screen_sizes: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude_screen_sizes: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capture_elements: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignore_elements: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load_on_single_page: Option<bool>,
}

/// A raw action entry as declared in configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionInput {
    #[serde(default)]
    pub action: Option<String>,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pseudo_class: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keys: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_browsers: Option<serde_json::Value>,
}

/// Recognized interaction kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ActionKind {
    Hover,
    Focus,
    SendKeys,
    Click,
}

impl ActionKind {
    pub const VALID: &'static [&'static str] = &["hover", "focus", "sendKeys", "click"];

    pub fn parse(kind: &str) -> Option<Self> {
        match kind {
            "hover" => Some(ActionKind::Hover),
            "focus" => Some(ActionKind::Focus),
            "sendKeys" => Some(ActionKind::SendKeys),
            "click" => Some(ActionKind::Click),
            _ => None,
        }
    }
}

/// A normalized, render-ready interaction.
///
/// `steps` is always derived from the action kind, never user-supplied.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Action {
    pub kind: ActionKind,
    pub name: String,
    pub selector: String,
    pub steps: String,
    pub skip_browsers: Vec<BrowserSkip>,
}

/// A rule suppressing a capture on browsers matching a regexp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowserSkip {
    pub regexp: String,
    pub comment: String,
}

impl BrowserSkip {
    pub const DEFAULT_COMMENT: &'static str = "skipped via patternlab-to-gemini config";

    pub fn from_regexp(regexp: String) -> Self {
        Self {
            regexp,
            comment: Self::DEFAULT_COMMENT.to_string(),
        }
    }
}

/// The merged unit of truth for one pattern, built from a scraped
/// descriptor overlaid with its declared override.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternConfig {
    pub id: String,
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    /// Effective ordered screen-size ids, non-empty after resolution
    pub screen_sizes: Vec<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<Action>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skip_browsers: Vec<BrowserSkip>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub capture_elements: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub ignore_elements: Option<Vec<String>>,

    pub load_on_single_page: bool,
}

/// A scraped descriptor overlaid with zero or one declared override.
/// Intermediate state between merging and per-pattern resolution.
#[derive(Debug, Clone)]
pub struct MergedPattern {
    pub id: String,
    pub name: String,
    pub url: Option<String>,
    pub state: Option<String>,
    pub declared: PatternOverride,
}

impl MergedPattern {
    /// Seed a merged pattern from a scraped descriptor alone.
    pub fn from_descriptor(descriptor: PatternDescriptor) -> Self {
        Self {
            id: descriptor.id,
            name: descriptor.name,
            url: descriptor.url,
            state: descriptor.state,
            declared: PatternOverride::default(),
        }
    }

    /// Overlay declared fields onto the scraped seed. Declared fields win
    /// over scraped ones, except `id` which is authoritative from scraping.
    pub fn apply_override(&mut self, declared: &PatternOverride) {
        if let Some(name) = &declared.name {
            self.name = name.clone();
        }
        self.declared = declared.clone();
    }
}
