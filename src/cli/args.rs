//! Command line argument parsing and validation.
//!
//! The tool is designed to "just work" - point it at a bundle manifest, it
//! assembles the AppDir.

use clap::Parser;
use std::path::PathBuf;

/// Assemble a relocatable AppDir bundle from an installed tree
#[derive(Parser, Debug)]
#[command(
    name = "appdir_bundler",
    version,
    about = "Assemble a relocatable AppDir bundle from an installed tree",
    long_about = "Collect executables, resolve and copy their non-system shared-library \
dependencies, rewrite library search paths with $ORIGIN expressions, and emit the \
AppRun launcher, desktop entry, and size-keyed icons.

Usage:
  appdir_bundler bundle.json
  appdir_bundler bundle.json --output Revere.AppDir"
)]
pub struct Args {
    /// Bundle manifest (JSON) describing the installed tree to package
    #[arg(index = 1, value_name = "MANIFEST")]
    pub manifest: PathBuf,

    /// Output AppDir path (defaults to <ProductName>.AppDir)
    #[arg(long, short = 'o', value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Show verbose progress output
    #[arg(long, short = 'v', conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only print warnings and errors
    #[arg(long, short = 'q')]
    pub quiet: bool,
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate arguments for consistency
    pub fn validate(&self) -> Result<(), String> {
        if self.manifest.as_os_str().is_empty() {
            return Err("Bundle manifest path is required".to_string());
        }
        Ok(())
    }
}
