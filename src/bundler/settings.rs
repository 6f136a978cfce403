//! Configuration structures for bundle assembly.
//!
//! All rule tables (core-system names, force-bundle markers, system library
//! prefixes) are plain data on [`Settings`], never hard-coded logic: the set
//! of runtime stacks that must travel with a bundle is project-specific, and
//! tests substitute minimal tables for the full platform lists.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::bail;
use crate::bundler::error::Result;

/// Package metadata used in the desktop entry and summary output.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PackageSettings {
    /// Product name displayed to users.
    ///
    /// This is the human-readable name shown in the desktop entry `Name=`
    /// field.
    pub product_name: String,

    /// Version string in semantic versioning format.
    ///
    /// Example: "1.0.0", "0.2.3-beta.1"
    #[serde(default = "default_version")]
    pub version: String,

    /// Brief description of the application.
    ///
    /// Used as the desktop entry `Comment=` field.
    #[serde(default)]
    pub description: String,

    /// Desktop entry `Categories=` value, e.g. `"Utility;GTK;"`.
    ///
    /// Default: None (falls back to `"Utility;"`)
    #[serde(default)]
    pub category: Option<String>,
}

fn default_version() -> String {
    "0.1.0".to_string()
}

/// An auxiliary directory copied into the bundle.
#[derive(Debug, Clone, Deserialize)]
pub struct DirSpec {
    /// Destination directory name under `usr/bin`.
    pub name: String,

    /// Source directory, relative to the install prefix unless absolute.
    pub source: PathBuf,
}

/// An application icon to classify and place.
#[derive(Debug, Clone, Deserialize)]
pub struct IconSpec {
    /// Icon name; the destination file becomes `<name>.png`.
    pub name: String,

    /// Source image, relative to the install prefix unless absolute.
    pub source: PathBuf,
}

/// Rule tables driving library classification.
///
/// Classification is a pure function of the library path and these tables;
/// see [`crate::bundler::Classifier`] for the evaluation order.
#[derive(Debug, Clone, Deserialize)]
pub struct ClassifierRules {
    /// Library basenames assumed present and ABI-compatible on any host.
    ///
    /// Matched as substrings of the basename, so `"libc.so"` covers
    /// `libc.so.6` and `"ld-linux"` covers `ld-linux-x86-64.so.2`.
    #[serde(default = "default_core_system")]
    pub core_system: Vec<String>,

    /// Path markers for runtime stacks that must travel with the bundle
    /// regardless of where the host installed them.
    ///
    /// Matched as substrings of the full path.
    #[serde(default = "default_force_bundle")]
    pub force_bundle: Vec<String>,

    /// Standard system library directories, matched as path prefixes.
    ///
    /// `/lib` and `/usr/lib` also cover `/lib64` and `/usr/lib64` by prefix.
    #[serde(default = "default_system_prefixes")]
    pub system_prefixes: Vec<String>,
}

impl Default for ClassifierRules {
    fn default() -> Self {
        Self {
            core_system: default_core_system(),
            force_bundle: default_force_bundle(),
            system_prefixes: default_system_prefixes(),
        }
    }
}

fn default_core_system() -> Vec<String> {
    [
        // C runtime, loader, and POSIX utility libraries
        "libc.so",
        "libm.so",
        "ld-linux",
        "libdl.so",
        "libpthread.so",
        "librt.so",
        "libresolv.so",
        "libnsl.so",
        "libcrypt.so",
        "libutil.so",
        // Graphics stack, always host-provided
        "libGL.so",
        "libGLX",
        "libEGL.so",
        "libGLdispatch.so",
        "libOpenGL.so",
        "libgbm.so",
        "libdrm.so",
        "libX11",
        "libxcb",
        "libXau",
        "libXdmcp",
        "libXext",
        "libXrender",
        "libXrandr",
        "libXi.so",
        "libXcursor",
        "libXfixes",
        "libXinerama",
        "libwayland-",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_force_bundle() -> Vec<String> {
    ["gstreamer", "opencv", "ffmpeg"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_system_prefixes() -> Vec<String> {
    ["/lib", "/usr/lib"].iter().map(|s| s.to_string()).collect()
}

/// Validated configuration for one assembly run.
///
/// Built with [`SettingsBuilder`]; the bundle manifest in the CLI layer is
/// the usual source.
#[derive(Debug, Clone)]
pub struct Settings {
    package: PackageSettings,
    install_prefix: PathBuf,
    app_dir: PathBuf,
    executables: Vec<String>,
    primary_executable: Option<String>,
    project_libraries: Vec<String>,
    plugin_dirs: Vec<DirSpec>,
    data_dirs: Vec<DirSpec>,
    icons: Vec<IconSpec>,
    rules: ClassifierRules,
}

impl Settings {
    /// Product name shown to users.
    pub fn product_name(&self) -> &str {
        &self.package.product_name
    }

    /// Package version string.
    pub fn version_string(&self) -> &str {
        &self.package.version
    }

    /// Package description.
    pub fn description(&self) -> &str {
        &self.package.description
    }

    /// Desktop entry category string, if configured.
    pub fn category(&self) -> Option<&str> {
        self.package.category.as_deref()
    }

    /// Installation tree the bundle is assembled from.
    pub fn install_prefix(&self) -> &Path {
        &self.install_prefix
    }

    /// Output AppDir path. Recreated from scratch every run.
    pub fn app_dir(&self) -> &Path {
        &self.app_dir
    }

    /// Executables copied from the install prefix, in configuration order.
    pub fn executables(&self) -> &[String] {
        &self.executables
    }

    /// The executable the AppRun launcher forwards to.
    ///
    /// Defaults to the first configured executable.
    pub fn primary_executable(&self) -> &str {
        self.primary_executable
            .as_deref()
            .unwrap_or_else(|| self.executables[0].as_str())
    }

    /// Project-owned libraries seeded into `usr/lib` before dependency
    /// resolution.
    pub fn project_libraries(&self) -> &[String] {
        &self.project_libraries
    }

    /// Plugin directories copied under `usr/bin` and relocated.
    pub fn plugin_dirs(&self) -> &[DirSpec] {
        &self.plugin_dirs
    }

    /// Data directories copied under `usr/bin` verbatim.
    pub fn data_dirs(&self) -> &[DirSpec] {
        &self.data_dirs
    }

    /// Icons to classify and place.
    pub fn icons(&self) -> &[IconSpec] {
        &self.icons
    }

    /// Classification rule tables.
    pub fn rules(&self) -> &ClassifierRules {
        &self.rules
    }

    /// Desktop entry file name at the AppDir root.
    pub fn desktop_entry_name(&self) -> String {
        format!("{}.desktop", self.primary_executable())
    }

    /// Icon name referenced by the desktop entry.
    pub fn icon_name(&self) -> &str {
        self.primary_executable()
    }

    /// Resolve a configured source path against the install prefix.
    pub fn resolve_source(&self, source: &Path) -> PathBuf {
        if source.is_absolute() {
            source.to_path_buf()
        } else {
            self.install_prefix.join(source)
        }
    }
}

/// Builder for [`Settings`].
#[derive(Debug, Default)]
pub struct SettingsBuilder {
    package: Option<PackageSettings>,
    install_prefix: Option<PathBuf>,
    app_dir: Option<PathBuf>,
    executables: Vec<String>,
    primary_executable: Option<String>,
    project_libraries: Vec<String>,
    plugin_dirs: Vec<DirSpec>,
    data_dirs: Vec<DirSpec>,
    icons: Vec<IconSpec>,
    rules: Option<ClassifierRules>,
}

impl SettingsBuilder {
    /// Creates a new builder with no fields set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the package metadata.
    pub fn package_settings(mut self, package: PackageSettings) -> Self {
        self.package = Some(package);
        self
    }

    /// Sets the installation tree to assemble from.
    pub fn install_prefix(mut self, prefix: impl Into<PathBuf>) -> Self {
        self.install_prefix = Some(prefix.into());
        self
    }

    /// Sets the output AppDir path.
    ///
    /// Default: `<ProductName>.AppDir` in the working directory.
    pub fn app_dir(mut self, app_dir: impl Into<PathBuf>) -> Self {
        self.app_dir = Some(app_dir.into());
        self
    }

    /// Sets the executables to bundle.
    pub fn executables(mut self, executables: Vec<String>) -> Self {
        self.executables = executables;
        self
    }

    /// Sets the launcher target executable.
    pub fn primary_executable(mut self, name: impl Into<String>) -> Self {
        self.primary_executable = Some(name.into());
        self
    }

    /// Sets the project-owned libraries to pre-seed.
    pub fn project_libraries(mut self, libraries: Vec<String>) -> Self {
        self.project_libraries = libraries;
        self
    }

    /// Sets the plugin directories.
    pub fn plugin_dirs(mut self, dirs: Vec<DirSpec>) -> Self {
        self.plugin_dirs = dirs;
        self
    }

    /// Sets the data directories.
    pub fn data_dirs(mut self, dirs: Vec<DirSpec>) -> Self {
        self.data_dirs = dirs;
        self
    }

    /// Sets the icons to place.
    pub fn icons(mut self, icons: Vec<IconSpec>) -> Self {
        self.icons = icons;
        self
    }

    /// Overrides the classification rule tables.
    pub fn classifier_rules(mut self, rules: ClassifierRules) -> Self {
        self.rules = Some(rules);
        self
    }

    /// Validates the configuration and builds [`Settings`].
    pub fn build(self) -> Result<Settings> {
        let package = self.package.unwrap_or_default();
        if package.product_name.is_empty() {
            bail!("product name is required");
        }
        let install_prefix = match self.install_prefix {
            Some(prefix) => prefix,
            None => bail!("install prefix is required"),
        };
        if self.executables.is_empty() {
            bail!("at least one executable is required");
        }
        if let Some(primary) = &self.primary_executable
            && !self.executables.contains(primary)
        {
            bail!("primary executable '{primary}' is not in the executable list");
        }
        let app_dir = self
            .app_dir
            .unwrap_or_else(|| PathBuf::from(format!("{}.AppDir", package.product_name)));

        Ok(Settings {
            package,
            install_prefix,
            app_dir,
            executables: self.executables,
            primary_executable: self.primary_executable,
            project_libraries: self.project_libraries,
            plugin_dirs: self.plugin_dirs,
            data_dirs: self.data_dirs,
            icons: self.icons,
            rules: self.rules.unwrap_or_default(),
        })
    }
}
