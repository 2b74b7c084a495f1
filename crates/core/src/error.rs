//! Error types for the test generator

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("config error - {0}")]
    Config(String),

    #[error("scraping error - {0}")]
    Scraping(String),

    #[error("rendering error - there was an error while rendering \"{path}\"")]
    Rendering { path: String, reason: String },

    // Transport failures bubble up unwrapped so callers see the
    // underlying error, not a scraping error.
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
