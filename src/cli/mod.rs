//! Command line interface for appdir_bundler.
//!
//! Loads the bundle manifest, verifies the external tools are available, and
//! drives one assembly run with user-facing progress output.

mod args;
mod manifest;
mod output;

pub use args::Args;
pub use manifest::BundleManifest;
pub use output::OutputManager;

use crate::bail;
use crate::bundler::{AppDirBuilder, LddQuery, PatchelfPatcher, Result};

/// Main CLI entry point.
pub fn run() -> Result<i32> {
    let args = Args::parse_args();
    if let Err(message) = args.validate() {
        bail!(message);
    }

    let output = OutputManager::new(args.verbose, args.quiet);

    let manifest = BundleManifest::load(&args.manifest)?;
    let settings = manifest.into_settings(args.output)?;

    preflight()?;

    let _ = output.info(&format!(
        "Assembling {} {} into {}",
        settings.product_name(),
        settings.version_string(),
        settings.app_dir().display()
    ));

    let desktop_entry = settings.app_dir().join(settings.desktop_entry_name());
    let builder = AppDirBuilder::new(settings, LddQuery::default(), PatchelfPatcher::default());
    let report = builder.assemble()?;

    for warning in &report.warnings {
        let _ = output.warn(warning);
    }
    let _ = output.success(&format!(
        "AppDir ready: {} ({} executables, {} bundled libraries, {} binaries relocated)",
        report.app_dir.display(),
        report.executables.len(),
        report.libraries.len(),
        report.relocated
    ));

    output.println("\nNext steps:");
    output.indent(&format!(
        "linuxdeploy --appdir {} --desktop-file {} --output appimage",
        report.app_dir.display(),
        desktop_entry.display()
    ));

    Ok(0)
}

/// Verifies the external tools the resolver and relocator shell out to.
fn preflight() -> Result<()> {
    for tool in ["ldd", "patchelf"] {
        match which::which(tool) {
            Ok(path) => log::debug!("found {tool} at {}", path.display()),
            Err(e) => bail!("required tool '{tool}' not found in PATH ({e})"),
        }
    }
    Ok(())
}
