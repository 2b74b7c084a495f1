//! Styleguide scraping
//!
//! Given the styleguide HTML, produce the ordered list of pattern
//! descriptors. The document order of the matched blocks is the canonical
//! pattern order for the rest of the run.

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

use crate::config::ResolvedConfig;
use crate::error::{Error, Result};
use crate::pattern::PatternDescriptor;

static PATTERN: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(".sg-pattern").expect("static selector")
});
static TITLE_LINK: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(".sg-pattern-title > a").expect("static selector")
});
static STATE: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(".sg-pattern-state").expect("static selector")
});

/// Scrape all pattern blocks out of the styleguide HTML, applying the
/// configured exclusion rules.
pub fn scrape_patterns(html: &str, config: &ResolvedConfig) -> Result<Vec<PatternDescriptor>> {
    let document = Html::parse_document(html);
    let mut patterns = Vec::new();

    for block in document.select(&PATTERN) {
        let id = block.attr("id").unwrap_or_default().to_string();
        let state = block
            .select(&STATE)
            .next()
            .map(|el| collect_text(el).trim().to_string())
            .filter(|s| !s.is_empty());

        if excluded(config, &id, state.as_deref()) {
            continue;
        }

        let link = block.select(&TITLE_LINK).next();
        let url = link.and_then(|a| a.attr("href")).map(str::to_string);
        let name = link
            .map(|a| normalize_title(&collect_text(a), state.is_some(), config.case_sensitive))
            .unwrap_or_default();

        patterns.push(PatternDescriptor { id, name, url, state });
    }

    if patterns.iter().any(|p| p.id.is_empty()) {
        return Err(Error::Scraping("pattern without an id found".to_string()));
    }
    if patterns.is_empty() {
        return Err(Error::Scraping("no pattern found".to_string()));
    }

    Ok(patterns)
}

fn excluded(config: &ResolvedConfig, id: &str, state: Option<&str>) -> bool {
    if config.exclude_patterns.iter().any(|re| re.is_match(id)) {
        return true;
    }
    if let Some(state) = state {
        if config.exclude_states.iter().any(|re| re.is_match(state)) {
            return true;
        }
    }
    if config.implicit_exclude {
        if let Some(declared) = &config.patterns {
            if !declared.contains_key(id) {
                return true;
            }
        }
    }
    false
}

fn collect_text(element: ElementRef) -> String {
    element.text().collect::<String>()
}

/// Trim the scraped title; a state marker renders on its own line, so only
/// the text before the first line break is the pattern name.
fn normalize_title(raw: &str, has_state: bool, case_sensitive: bool) -> String {
    let trimmed = raw.trim();
    let name = if has_state {
        trimmed.split('\n').next().unwrap_or(trimmed).trim()
    } else {
        trimmed
    };
    if case_sensitive {
        name.to_string()
    } else {
        name.to_lowercase()
    }
}
