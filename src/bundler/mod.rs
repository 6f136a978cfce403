//! Relocatable AppDir assembly.
//!
//! This module turns an already-built installation tree into a
//! self-contained bundle directory that runs from any filesystem path:
//!
//! 1. Executables are copied and their shared-library closures resolved
//!    through the platform's dynamic-linker query tool.
//! 2. Each resolved library is classified — core-system (host-provided,
//!    skipped), force-bundle (ships regardless of where the host installed
//!    it), or ordinary (ships unless under a system path).
//! 3. Bundled binaries get `$ORIGIN`-relative search paths so siblings
//!    satisfy each other without `LD_LIBRARY_PATH`.
//! 4. The AppRun launcher, desktop entry, and size-keyed icons complete the
//!    bundle.
//!
//! # Example
//!
//! ```no_run
//! use appdir_bundler::bundler::{
//!     AppDirBuilder, LddQuery, PackageSettings, PatchelfPatcher, SettingsBuilder,
//! };
//!
//! # fn example() -> appdir_bundler::bundler::Result<()> {
//! let settings = SettingsBuilder::new()
//!     .package_settings(PackageSettings {
//!         product_name: "Revere".into(),
//!         ..Default::default()
//!     })
//!     .install_prefix("/usr/local/revere")
//!     .executables(vec!["revere".into(), "vision".into()])
//!     .build()?;
//!
//! let builder = AppDirBuilder::new(settings, LddQuery::default(), PatchelfPatcher::default());
//! let report = builder.assemble()?;
//! println!("bundled {} libraries", report.libraries.len());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod builder;
mod classify;
mod deps;
mod error;
mod freedesktop;
mod relocate;
mod resources;
mod settings;
mod utils;

// Public re-exports
pub use builder::{AppDirBuilder, AssemblyReport};
pub use classify::{Classification, Classifier};
pub use deps::{DependencyQuery, LddQuery, LibraryReference, parse_ldd_output};
pub use error::{Context, Error, ErrorExt, Result};
pub use freedesktop::{write_desktop_entry, write_launcher};
pub use relocate::{BinaryPatcher, BinaryRole, BundleTarget, PatchelfPatcher, SearchPath};
pub use resources::icons::{IconAsset, install_icon};
pub use settings::{
    ClassifierRules, DirSpec, IconSpec, PackageSettings, Settings, SettingsBuilder,
};
