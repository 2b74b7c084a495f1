//! Styleguide fetch

use reqwest::StatusCode;
use tracing::debug;

use crate::error::{Error, Result};

/// Path of the rendered styleguide page on a PatternLab instance.
pub const STYLEGUIDE_PATH: &str = "/styleguide/html/styleguide.html";

/// Full URL of the styleguide page for a PatternLab base URL.
pub fn styleguide_url(base_url: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), STYLEGUIDE_PATH)
}

/// Fetch the styleguide HTML. Transport failures propagate unchanged;
/// unexpected status codes become scraping errors.
pub async fn fetch_styleguide(base_url: &str) -> Result<String> {
    let url = styleguide_url(base_url);
    debug!("fetching styleguide from {}", url);

    let response = reqwest::get(&url).await?;
    let status = response.status();
    let body = response.text().await?;

    body_for_status(status, &url, body)
}

/// Map an HTTP status to the styleguide body or a scraping error.
pub(crate) fn body_for_status(status: StatusCode, url: &str, body: String) -> Result<String> {
    match status {
        StatusCode::OK => Ok(body),
        StatusCode::NOT_FOUND => Err(Error::Scraping(format!(
            "\"{}\" could not be found",
            url
        ))),
        other => Err(Error::Scraping(format!(
            "unknown error (statusCode was: {})",
            other.as_u16()
        ))),
    }
}
