//! patternlab-to-gemini - Main Entry Point
//!
//! Generates a Gemini visual-regression test suite from a running
//! PatternLab styleguide, driven by a JSON configuration file.

use std::path::PathBuf;

use clap::Parser;
use patternlab_gemini_core::TestGenerator;
use tracing::warn;

/// Generate Gemini visual regression tests from a PatternLab styleguide
#[derive(Parser)]
#[command(name = "patternlab-to-gemini")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the JSON configuration file
    #[arg(short, long)]
    config: PathBuf,

    /// Enable debug output
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_target(false)
        .init();

    let generator = TestGenerator::from_file(&cli.config)?;
    let outcome = generator.generate_tests().await?;

    for warning in &outcome.warnings {
        warn!("{}", warning);
    }
    println!("done");

    Ok(())
}
