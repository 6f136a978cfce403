//! End-to-end assembly tests over a synthetic installation tree.
//!
//! The external tools are replaced by a canned dependency query and a
//! recording patcher so the tests are deterministic and host-independent.

use appdir_bundler::bundler::{
    AppDirBuilder, BinaryPatcher, ClassifierRules, DependencyQuery, DirSpec, IconSpec,
    LibraryReference, PackageSettings, Result, SearchPath, Settings, SettingsBuilder,
};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tempfile::TempDir;

/// Dependency query returning canned reference lists keyed by binary name.
#[derive(Default)]
struct CannedQuery {
    deps: HashMap<String, Vec<LibraryReference>>,
}

impl CannedQuery {
    fn with(mut self, executable: &str, deps: Vec<LibraryReference>) -> Self {
        self.deps.insert(executable.to_string(), deps);
        self
    }
}

impl DependencyQuery for CannedQuery {
    fn resolve(&self, binary: &Path) -> Result<Vec<LibraryReference>> {
        let name = binary
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(self.deps.get(&name).cloned().unwrap_or_default())
    }
}

/// Patcher that records every call instead of invoking patchelf.
#[derive(Clone, Default)]
struct RecordingPatcher {
    calls: Rc<RefCell<Vec<(PathBuf, String)>>>,
}

impl RecordingPatcher {
    fn rpath_for(&self, suffix: &str) -> Option<String> {
        self.calls
            .borrow()
            .iter()
            .find(|(path, _)| path.to_string_lossy().ends_with(suffix))
            .map(|(_, rpath)| rpath.clone())
    }
}

impl BinaryPatcher for RecordingPatcher {
    fn set_search_path(&self, binary: &Path, search_path: &SearchPath) -> Result<()> {
        self.calls
            .borrow_mut()
            .push((binary.to_path_buf(), search_path.to_rpath()));
        Ok(())
    }
}

/// Patcher that always fails, standing in for a broken patch tool.
struct FailingPatcher;

impl BinaryPatcher for FailingPatcher {
    fn set_search_path(&self, _binary: &Path, _search_path: &SearchPath) -> Result<()> {
        appdir_bundler::bail!("patch tool unavailable")
    }
}

fn write_file(path: &Path, contents: &[u8]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

fn write_png(path: &Path, width: u32, height: u32) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    image::RgbaImage::new(width, height).save(path).unwrap();
}

/// Synthetic install prefix, system root, and third-party directory.
struct Fixture {
    temp: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let prefix = temp.path().join("prefix");

        write_file(&prefix.join("app"), b"\x7fELF app");
        write_file(&prefix.join("tool"), b"\x7fELF tool");
        write_file(&prefix.join("libr_core.so"), b"\x7fELF libr_core");
        write_file(&prefix.join("gst_plugins/libgstplug.so"), b"\x7fELF plug");
        write_file(&prefix.join("models/net.onnx"), b"weights");
        write_png(&prefix.join("R.png"), 128, 128);

        // synthetic system root; the rule tables point here instead of /usr/lib
        let sys = temp.path().join("sys");
        write_file(&sys.join("lib/libc.so.6"), b"\x7fELF libc");
        write_file(&sys.join("usr/lib/libssl.so.3"), b"\x7fELF libssl");
        write_file(
            &sys.join("usr/lib/gstreamer-1.0/libgstapp.so"),
            b"\x7fELF gstapp",
        );

        // an ordinary third-party dependency outside any system prefix
        write_file(&temp.path().join("opt/libpng16.so.16"), b"\x7fELF libpng");

        Self { temp }
    }

    fn prefix(&self) -> PathBuf {
        self.temp.path().join("prefix")
    }

    fn sys(&self, rel: &str) -> PathBuf {
        self.temp.path().join("sys").join(rel)
    }

    fn opt(&self, rel: &str) -> PathBuf {
        self.temp.path().join("opt").join(rel)
    }

    fn out(&self) -> PathBuf {
        self.temp.path().join("Revere.AppDir")
    }

    fn rules(&self) -> ClassifierRules {
        ClassifierRules {
            core_system: vec!["libc.so".into()],
            force_bundle: vec!["gstreamer".into()],
            system_prefixes: vec![
                self.sys("lib").to_string_lossy().into_owned(),
                self.sys("usr/lib").to_string_lossy().into_owned(),
            ],
        }
    }

    fn base_builder(&self) -> SettingsBuilder {
        SettingsBuilder::new()
            .package_settings(PackageSettings {
                product_name: "Revere".into(),
                version: "1.0.0".into(),
                description: "An open source video surveillance application".into(),
                category: Some("Utility;GTK;".into()),
            })
            .install_prefix(self.prefix())
            .app_dir(self.out())
            .executables(vec!["app".into(), "tool".into()])
            .project_libraries(vec!["libr_core.so".into()])
            .plugin_dirs(vec![DirSpec {
                name: "gst_plugins".into(),
                source: "gst_plugins".into(),
            }])
            .data_dirs(vec![DirSpec {
                name: "models".into(),
                source: "models".into(),
            }])
            .icons(vec![IconSpec {
                name: "revere".into(),
                source: "R.png".into(),
            }])
            .classifier_rules(self.rules())
    }

    fn settings(&self) -> Settings {
        self.base_builder().build().unwrap()
    }
}

fn lib_dir_entries(out: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(out.join("usr/lib"))
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn assembles_full_bundle_layout() {
    let fx = Fixture::new();
    let query = CannedQuery::default()
        .with(
            "app",
            vec![
                LibraryReference::resolved("libc.so.6", fx.sys("lib/libc.so.6")),
                LibraryReference::resolved("libpng16.so.16", fx.opt("libpng16.so.16")),
            ],
        )
        .with(
            "tool",
            vec![LibraryReference::resolved(
                "libc.so.6",
                fx.sys("lib/libc.so.6"),
            )],
        );

    let builder = AppDirBuilder::new(fx.settings(), query, RecordingPatcher::default());
    let report = builder.assemble().unwrap();

    let out = fx.out();
    for exe in ["app", "tool"] {
        let path = out.join("usr/bin").join(exe);
        assert!(path.is_file(), "missing executable {exe}");
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o755, 0o755, "{exe} is not executable");
    }

    assert_eq!(lib_dir_entries(&out), vec!["libpng16.so.16", "libr_core.so"]);
    assert!(out.join("usr/bin/gst_plugins/libgstplug.so").is_file());
    assert!(out.join("usr/bin/models/net.onnx").is_file());
    assert!(out.join("AppRun").is_file());
    assert!(out.join("app.desktop").is_file());
    assert!(
        out.join("usr/share/icons/hicolor/128x128/apps/revere.png")
            .is_file()
    );

    assert_eq!(report.executables.len(), 2);
    assert_eq!(report.libraries.len(), 1);
    assert!(report.warnings.is_empty(), "unexpected: {:?}", report.warnings);
}

#[test]
fn executables_search_own_dir_and_sibling_lib() {
    let fx = Fixture::new();
    let patcher = RecordingPatcher::default();
    let builder = AppDirBuilder::new(fx.settings(), CannedQuery::default(), patcher.clone());
    builder.assemble().unwrap();

    assert_eq!(
        patcher.rpath_for("usr/bin/app").as_deref(),
        Some("$ORIGIN:$ORIGIN/../lib")
    );
    assert_eq!(
        patcher.rpath_for("usr/bin/tool").as_deref(),
        Some("$ORIGIN:$ORIGIN/../lib")
    );
}

#[test]
fn libraries_search_own_dir_only() {
    let fx = Fixture::new();
    let query = CannedQuery::default().with(
        "app",
        vec![LibraryReference::resolved(
            "libpng16.so.16",
            fx.opt("libpng16.so.16"),
        )],
    );
    let patcher = RecordingPatcher::default();
    let builder = AppDirBuilder::new(fx.settings(), query, patcher.clone());
    builder.assemble().unwrap();

    assert_eq!(
        patcher.rpath_for("usr/lib/libr_core.so").as_deref(),
        Some("$ORIGIN")
    );
    assert_eq!(
        patcher.rpath_for("usr/lib/libpng16.so.16").as_deref(),
        Some("$ORIGIN")
    );
}

#[test]
fn plugins_search_parent_and_lib_two_up() {
    let fx = Fixture::new();
    let patcher = RecordingPatcher::default();
    let builder = AppDirBuilder::new(fx.settings(), CannedQuery::default(), patcher.clone());
    builder.assemble().unwrap();

    assert_eq!(
        patcher.rpath_for("gst_plugins/libgstplug.so").as_deref(),
        Some("$ORIGIN/..:$ORIGIN/../../lib")
    );
}

#[test]
fn core_system_libraries_stay_on_host() {
    let fx = Fixture::new();
    let query = CannedQuery::default().with(
        "app",
        vec![
            LibraryReference::resolved("libc.so.6", fx.sys("lib/libc.so.6")),
            LibraryReference::resolved("libssl.so.3", fx.sys("usr/lib/libssl.so.3")),
        ],
    );

    let builder = AppDirBuilder::new(fx.settings(), query, RecordingPatcher::default());
    let report = builder.assemble().unwrap();

    assert_eq!(lib_dir_entries(&fx.out()), vec!["libr_core.so"]);
    assert!(report.libraries.is_empty());
    assert!(report.warnings.is_empty());
}

#[test]
fn force_bundle_override_wins_over_system_directory() {
    let fx = Fixture::new();
    let query = CannedQuery::default().with(
        "app",
        vec![LibraryReference::resolved(
            "libgstapp.so",
            fx.sys("usr/lib/gstreamer-1.0/libgstapp.so"),
        )],
    );

    let builder = AppDirBuilder::new(fx.settings(), query, RecordingPatcher::default());
    let report = builder.assemble().unwrap();

    assert!(fx.out().join("usr/lib/libgstapp.so").is_file());
    assert_eq!(report.libraries.len(), 1);
}

#[test]
fn overlapping_dependency_sets_copy_once() {
    let fx = Fixture::new();
    let png = LibraryReference::resolved("libpng16.so.16", fx.opt("libpng16.so.16"));
    let query = CannedQuery::default()
        .with("app", vec![png.clone()])
        .with("tool", vec![png]);

    let builder = AppDirBuilder::new(fx.settings(), query, RecordingPatcher::default());
    let report = builder.assemble().unwrap();

    assert_eq!(lib_dir_entries(&fx.out()), vec!["libpng16.so.16", "libr_core.so"]);
    assert_eq!(report.libraries.len(), 1);
    assert!(report.warnings.is_empty());
}

#[test]
fn unresolved_dependency_warns_once() {
    let fx = Fixture::new();
    let query = CannedQuery::default()
        .with("app", vec![LibraryReference::unresolved("libmissing.so.1")])
        .with("tool", vec![LibraryReference::unresolved("libmissing.so.1")]);

    let builder = AppDirBuilder::new(fx.settings(), query, RecordingPatcher::default());
    let report = builder.assemble().unwrap();

    let mentions: Vec<_> = report
        .warnings
        .iter()
        .filter(|w| w.contains("libmissing.so.1"))
        .collect();
    assert_eq!(mentions.len(), 1, "warnings: {:?}", report.warnings);
}

#[test]
fn missing_required_executable_is_fatal() {
    let fx = Fixture::new();
    let settings = fx
        .base_builder()
        .executables(vec!["ghost".into()])
        .build()
        .unwrap();

    let builder = AppDirBuilder::new(settings, CannedQuery::default(), RecordingPatcher::default());
    assert!(builder.assemble().is_err());
}

#[test]
fn missing_plugin_dir_is_nonfatal() {
    let fx = Fixture::new();
    fs::remove_dir_all(fx.prefix().join("gst_plugins")).unwrap();

    let builder = AppDirBuilder::new(
        fx.settings(),
        CannedQuery::default(),
        RecordingPatcher::default(),
    );
    let report = builder.assemble().unwrap();

    assert!(report.warnings.iter().any(|w| w.contains("not found")));
    assert!(fx.out().join("usr/bin/app").is_file());
}

#[test]
fn nonsquare_icon_flagged_but_placed() {
    let fx = Fixture::new();
    write_png(&fx.prefix().join("V.png"), 64, 100);
    let settings = fx
        .base_builder()
        .icons(vec![
            IconSpec {
                name: "revere".into(),
                source: "R.png".into(),
            },
            IconSpec {
                name: "vision".into(),
                source: "V.png".into(),
            },
        ])
        .build()
        .unwrap();

    let builder = AppDirBuilder::new(settings, CannedQuery::default(), RecordingPatcher::default());
    let report = builder.assemble().unwrap();

    assert!(
        fx.out()
            .join("usr/share/icons/hicolor/128x128/apps/revere.png")
            .is_file()
    );
    assert!(
        fx.out()
            .join("usr/share/icons/hicolor/64x100/apps/vision.png")
            .is_file()
    );
    assert!(report.warnings.iter().any(|w| w.contains("not square")));
}

#[test]
fn failed_patch_is_nonfatal() {
    let fx = Fixture::new();
    let builder = AppDirBuilder::new(fx.settings(), CannedQuery::default(), FailingPatcher);
    let report = builder.assemble().unwrap();

    assert_eq!(report.relocated, 0);
    assert!(!report.warnings.is_empty());
    assert!(fx.out().join("usr/bin/app").is_file());
}

#[test]
fn rerun_produces_identical_tree() {
    let fx = Fixture::new();
    let query = CannedQuery::default().with(
        "app",
        vec![LibraryReference::resolved(
            "libpng16.so.16",
            fx.opt("libpng16.so.16"),
        )],
    );
    let builder = AppDirBuilder::new(fx.settings(), query, RecordingPatcher::default());

    let snapshot = |out: &Path| -> Vec<(String, Vec<u8>)> {
        let mut entries: Vec<(String, Vec<u8>)> = walkdir::WalkDir::new(out)
            .sort_by_file_name()
            .into_iter()
            .map(|e| e.unwrap())
            .filter(|e| e.file_type().is_file())
            .map(|e| {
                let rel = e
                    .path()
                    .strip_prefix(out)
                    .unwrap()
                    .to_string_lossy()
                    .into_owned();
                (rel, fs::read(e.path()).unwrap())
            })
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    };

    let first_report = builder.assemble().unwrap();
    let first = snapshot(&fx.out());
    let second_report = builder.assemble().unwrap();
    let second = snapshot(&fx.out());

    assert_eq!(first, second);
    assert_eq!(first_report.warnings, second_report.warnings);
}
