//! Gemini visual-regression suites out of a PatternLab styleguide.
//!
//! The crate scrapes the rendered styleguide page of a running PatternLab
//! instance, merges the discovered patterns with per-pattern configuration,
//! resolves screen sizes and interactions, and renders one Gemini test
//! file covering every pattern. [`TestGenerator`] drives the whole
//! pipeline; the modules underneath it are usable on their own.

pub mod actions;
pub mod config;
pub mod engine;
pub mod error;
pub mod fetch;
pub mod graph;
pub mod pattern;
pub mod render;
pub mod scrape;
pub mod sizes;

pub use config::{Config, ResolvedConfig, ScreenSize};
pub use engine::{GenerateOutcome, PatternsConfiguration, TestGenerator};
pub use error::{Error, Result};
pub use pattern::{Action, ActionKind, BrowserSkip, PatternConfig, PatternDescriptor};
