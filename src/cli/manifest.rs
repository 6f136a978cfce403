//! Bundle manifest loading.
//!
//! The manifest is a JSON file describing one bundle: package metadata, the
//! installation tree, executables, project libraries, auxiliary directories,
//! icons, and optional classifier-rule overrides.
//!
//! ```json
//! {
//!   "package": {
//!     "product_name": "Revere",
//!     "description": "An open source video surveillance application",
//!     "category": "Utility;GTK;"
//!   },
//!   "install_prefix": "/usr/local/revere",
//!   "executables": ["revere", "vision"],
//!   "project_libraries": ["libr_utils.so", "libr_pipeline.so"],
//!   "plugin_dirs": [{ "name": "gstreamer_plugins", "source": "gstreamer_plugins" }],
//!   "data_dirs": [{ "name": "models", "source": "models" }],
//!   "icons": [
//!     { "name": "revere", "source": "R.png" },
//!     { "name": "vision", "source": "V.png" }
//!   ]
//! }
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::bundler::{
    ClassifierRules, Context, DirSpec, Error, ErrorExt, IconSpec, PackageSettings, Result,
    Settings, SettingsBuilder,
};

/// On-disk JSON description of one bundle.
#[derive(Debug, Deserialize)]
pub struct BundleManifest {
    /// Package metadata for the desktop entry and summary output.
    pub package: PackageSettings,

    /// Installation tree the bundle is assembled from.
    pub install_prefix: PathBuf,

    /// Executables to copy from the install prefix, in order.
    pub executables: Vec<String>,

    /// Launcher target; defaults to the first executable.
    #[serde(default)]
    pub primary_executable: Option<String>,

    /// Project-owned shared libraries seeded before dependency resolution.
    #[serde(default)]
    pub project_libraries: Vec<String>,

    /// Plugin directories copied under `usr/bin` and relocated.
    #[serde(default)]
    pub plugin_dirs: Vec<DirSpec>,

    /// Data directories copied under `usr/bin` verbatim.
    #[serde(default)]
    pub data_dirs: Vec<DirSpec>,

    /// Icons placed under the hicolor theme tree.
    #[serde(default)]
    pub icons: Vec<IconSpec>,

    /// Classifier rule overrides; platform defaults when omitted.
    #[serde(default)]
    pub classifier_rules: Option<ClassifierRules>,
}

impl BundleManifest {
    /// Reads and parses a manifest file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents =
            std::fs::read_to_string(path).fs_context("reading bundle manifest", path)?;
        let manifest: Self = serde_json::from_str(&contents)
            .map_err(Error::from)
            .context("parsing bundle manifest")?;
        Ok(manifest)
    }

    /// Converts into validated [`Settings`].
    ///
    /// `output` overrides the default `<ProductName>.AppDir` output path.
    pub fn into_settings(self, output: Option<PathBuf>) -> Result<Settings> {
        let mut builder = SettingsBuilder::new()
            .package_settings(self.package)
            .install_prefix(self.install_prefix)
            .executables(self.executables)
            .project_libraries(self.project_libraries)
            .plugin_dirs(self.plugin_dirs)
            .data_dirs(self.data_dirs)
            .icons(self.icons);
        if let Some(primary) = self.primary_executable {
            builder = builder.primary_executable(primary);
        }
        if let Some(rules) = self.classifier_rules {
            builder = builder.classifier_rules(rules);
        }
        if let Some(output) = output {
            builder = builder.app_dir(output);
        }
        builder.build()
    }
}
