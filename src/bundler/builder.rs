//! Bundle assembly orchestration.
//!
//! [`AppDirBuilder`] drives one run over the configured installation tree:
//!
//! 1. Recreates the output tree from scratch (`usr/bin`, `usr/lib`)
//! 2. Seeds project-owned libraries so dependency copying finds them present
//! 3. Copies each executable, resolves and copies its bundlable dependencies
//! 4. Copies plugin and data directories verbatim
//! 5. Relocates executables, libraries, and plugins with their role policies
//! 6. Writes the AppRun launcher and desktop entry
//! 7. Classifies and places icons
//!
//! Failure policy: a missing required executable or an unusable output tree
//! aborts the run; everything else is reported per item and the run
//! continues, favoring partial, debuggable output over all-or-nothing
//! failure during iterative packaging work.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::bail;
use crate::bundler::classify::Classifier;
use crate::bundler::deps::DependencyQuery;
use crate::bundler::error::{ErrorExt, Result};
use crate::bundler::freedesktop;
use crate::bundler::relocate::{BinaryPatcher, BinaryRole, BundleTarget};
use crate::bundler::resources::icons::{self, IconAsset};
use crate::bundler::settings::Settings;
use crate::bundler::utils::fs::{self as fsutil, CopyOutcome};

/// Summary of one assembly run.
///
/// Warnings collect every recoverable condition in the order encountered;
/// each is also logged at emission time.
#[derive(Debug, Clone)]
pub struct AssemblyReport {
    /// The assembled AppDir.
    pub app_dir: PathBuf,

    /// Executables copied into `usr/bin`.
    pub executables: Vec<PathBuf>,

    /// Dependency libraries copied into `usr/lib` (seeded project libraries
    /// not included).
    pub libraries: Vec<PathBuf>,

    /// Number of binaries whose search path was rewritten.
    pub relocated: usize,

    /// Recoverable conditions encountered during the run.
    pub warnings: Vec<String>,
}

impl AssemblyReport {
    fn new(app_dir: PathBuf) -> Self {
        Self {
            app_dir,
            executables: Vec::new(),
            libraries: Vec::new(),
            relocated: 0,
            warnings: Vec::new(),
        }
    }

    fn warn(&mut self, message: String) {
        log::warn!("{message}");
        self.warnings.push(message);
    }
}

/// Assembles one AppDir from an installation tree.
///
/// Generic over the dependency query and patch tools so tests can substitute
/// canned dependency lists and record patch calls without invoking `ldd` or
/// `patchelf`.
///
/// The builder owns the output directory exclusively for the duration of one
/// run; concurrent invocation against the same output path is undefined.
pub struct AppDirBuilder<Q, P> {
    settings: Settings,
    query: Q,
    patcher: P,
}

impl<Q: DependencyQuery, P: BinaryPatcher> AppDirBuilder<Q, P> {
    /// Creates a builder with the given settings and tool implementations.
    pub fn new(settings: Settings, query: Q, patcher: P) -> Self {
        Self {
            settings,
            query,
            patcher,
        }
    }

    /// Returns a reference to the builder settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Runs the full assembly once, recreating the output tree.
    pub fn assemble(&self) -> Result<AssemblyReport> {
        let app_dir = self.settings.app_dir().to_path_buf();
        let bin_dir = app_dir.join("usr/bin");
        let lib_dir = app_dir.join("usr/lib");

        log::info!("setting up {}", app_dir.display());
        fsutil::remove_dir_all(&app_dir)?;
        for dir in [&bin_dir, &lib_dir] {
            fs::create_dir_all(dir).fs_context("creating bundle directory", dir)?;
        }

        let mut report = AssemblyReport::new(app_dir.clone());
        let mut targets = Vec::new();

        self.seed_project_libraries(&lib_dir, &mut report);
        self.install_executables(&bin_dir, &lib_dir, &mut targets, &mut report)?;
        self.copy_plugin_dirs(&bin_dir, &mut targets, &mut report);
        self.copy_data_dirs(&bin_dir, &mut report);
        self.collect_library_targets(&lib_dir, &mut targets, &mut report);
        self.relocate(&targets, &mut report);

        freedesktop::write_launcher(&self.settings, &app_dir)?;
        freedesktop::write_desktop_entry(&self.settings, &app_dir)?;
        self.install_icons(&app_dir, &mut report);

        Ok(report)
    }

    /// Copies project-owned libraries first so executable dependency sets
    /// find them already present and skip re-copying.
    fn seed_project_libraries(&self, lib_dir: &Path, report: &mut AssemblyReport) {
        for name in self.settings.project_libraries() {
            let src = self.settings.install_prefix().join(name);
            if !src.exists() {
                report.warn(format!("project library {} not found", src.display()));
                continue;
            }
            match fsutil::copy_file_if_absent(&src, lib_dir) {
                Ok(CopyOutcome::Copied(_)) => log::info!("copied project library {name}"),
                Ok(CopyOutcome::AlreadyPresent(_)) => {
                    log::debug!("project library {name} already present");
                }
                Err(e) => report.warn(format!("failed to copy project library {name}: {e}")),
            }
        }
    }

    /// Copies the configured executables and their dependency closures.
    ///
    /// A missing executable is fatal: the bundle cannot work without it.
    fn install_executables(
        &self,
        bin_dir: &Path,
        lib_dir: &Path,
        targets: &mut Vec<BundleTarget>,
        report: &mut AssemblyReport,
    ) -> Result<()> {
        let classifier = Classifier::new(self.settings.rules());
        let mut unresolved = HashSet::new();

        for name in self.settings.executables() {
            let src = self.settings.install_prefix().join(name);
            if !src.exists() {
                bail!("required executable {} not found", src.display());
            }

            let dest = bin_dir.join(name);
            log::info!("copying binary {name}");
            fsutil::copy_file(&src, &dest)?;
            fsutil::make_executable(&dest)?;
            report.executables.push(dest.clone());
            targets.push(BundleTarget::new(dest, BinaryRole::Executable));

            self.copy_dependencies(&src, lib_dir, &classifier, &mut unresolved, report)?;
        }
        Ok(())
    }

    /// Copies one executable's bundlable dependency set into `lib_dir`.
    ///
    /// The query tool's transitive report is trusted; copied libraries are
    /// never re-queried.
    fn copy_dependencies(
        &self,
        binary: &Path,
        lib_dir: &Path,
        classifier: &Classifier<'_>,
        unresolved: &mut HashSet<String>,
        report: &mut AssemblyReport,
    ) -> Result<()> {
        for reference in self.query.resolve(binary)? {
            let Some(path) = reference.path else {
                // an unresolved reference means the bundle will fail to run;
                // surfaced exactly once per soname
                if unresolved.insert(reference.name.clone()) {
                    report.warn(format!(
                        "dependency {} of {} could not be resolved",
                        reference.name,
                        binary.display()
                    ));
                }
                continue;
            };

            if !classifier.should_bundle(&path) {
                log::debug!("skipping system library {}", reference.name);
                continue;
            }

            match fsutil::copy_file_if_absent(&path, lib_dir) {
                Ok(CopyOutcome::Copied(dest)) => {
                    log::info!("copying dependency {}", path.display());
                    report.libraries.push(dest);
                }
                Ok(CopyOutcome::AlreadyPresent(_)) => {
                    log::debug!("dependency {} already present", reference.name);
                }
                Err(e) => report.warn(format!("failed to copy {}: {e}", path.display())),
            }
        }
        Ok(())
    }

    /// Copies plugin directories under `usr/bin` and queues their shared
    /// objects for plugin-policy relocation.
    fn copy_plugin_dirs(
        &self,
        bin_dir: &Path,
        targets: &mut Vec<BundleTarget>,
        report: &mut AssemblyReport,
    ) {
        for spec in self.settings.plugin_dirs() {
            let src = self.settings.resolve_source(&spec.source);
            if !src.is_dir() {
                report.warn(format!("plugin directory {} not found", src.display()));
                continue;
            }

            let dest = bin_dir.join(&spec.name);
            log::info!("copying plugin directory {}", spec.name);
            if let Err(e) = fsutil::copy_dir(&src, &dest) {
                report.warn(format!("failed to copy plugin directory {}: {e}", spec.name));
                continue;
            }

            for entry in walkdir::WalkDir::new(&dest)
                .sort_by_file_name()
                .into_iter()
                .filter_map(|e| e.ok())
            {
                if entry.file_type().is_file()
                    && entry.file_name().to_string_lossy().contains(".so")
                {
                    targets.push(BundleTarget::new(entry.into_path(), BinaryRole::Plugin));
                }
            }
        }
    }

    /// Copies data directories under `usr/bin` verbatim.
    fn copy_data_dirs(&self, bin_dir: &Path, report: &mut AssemblyReport) {
        for spec in self.settings.data_dirs() {
            let src = self.settings.resolve_source(&spec.source);
            if !src.is_dir() {
                report.warn(format!("data directory {} not found", src.display()));
                continue;
            }

            let dest = bin_dir.join(&spec.name);
            log::info!("copying data directory {}", spec.name);
            if let Err(e) = fsutil::copy_dir(&src, &dest) {
                report.warn(format!("failed to copy data directory {}: {e}", spec.name));
            }
        }
    }

    /// Queues everything now present under `usr/lib` for library-policy
    /// relocation.
    fn collect_library_targets(
        &self,
        lib_dir: &Path,
        targets: &mut Vec<BundleTarget>,
        report: &mut AssemblyReport,
    ) {
        let mut entries: Vec<PathBuf> = match fs::read_dir(lib_dir) {
            Ok(iter) => iter
                .filter_map(|entry| entry.ok())
                .map(|entry| entry.path())
                .filter(|path| path.is_file())
                .collect(),
            Err(e) => {
                report.warn(format!("failed to list {}: {e}", lib_dir.display()));
                return;
            }
        };
        entries.sort();
        for path in entries {
            targets.push(BundleTarget::new(path, BinaryRole::Library));
        }
    }

    /// Rewrites the search path of every copied binary.
    ///
    /// A failed patch is reported but non-fatal: the bundle is still
    /// produced, possibly non-functional.
    fn relocate(&self, targets: &[BundleTarget], report: &mut AssemblyReport) {
        for target in targets {
            let search_path = target.search_path();
            match self.patcher.set_search_path(&target.path, &search_path) {
                Ok(()) => report.relocated += 1,
                Err(e) => report.warn(format!(
                    "failed to set search path on {}: {e}",
                    target.path.display()
                )),
            }
        }
    }

    /// Probes and places the configured icons.
    fn install_icons(&self, app_dir: &Path, report: &mut AssemblyReport) {
        for spec in self.settings.icons() {
            let src = self.settings.resolve_source(&spec.source);
            if !src.exists() {
                report.warn(format!("icon file {} not found", src.display()));
                continue;
            }

            let asset = match IconAsset::probe(&spec.name, &src) {
                Ok(asset) => asset,
                Err(e) => {
                    report.warn(format!("failed to read icon {}: {e}", src.display()));
                    continue;
                }
            };
            if !asset.is_square() {
                report.warn(format!(
                    "icon {} is not square ({}x{})",
                    src.display(),
                    asset.width,
                    asset.height
                ));
            }

            match icons::install_icon(&asset, app_dir) {
                Ok(dest) => log::info!("copied icon {} -> {}", src.display(), dest.display()),
                Err(e) => report.warn(format!("failed to copy icon {}: {e}", src.display())),
            }
        }
    }
}
