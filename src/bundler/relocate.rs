//! Search-path rewriting for copied binaries.
//!
//! Every copied binary gets a `$ORIGIN`-relative RUNPATH so the bundle runs
//! correctly regardless of where it is extracted or mounted. The patch tool
//! sits behind the [`BinaryPatcher`] capability trait so tests can record
//! patch calls instead of invoking `patchelf`.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::bail;
use crate::bundler::error::{Error, Result};

/// A library search path composed of offsets from the binary's own
/// directory.
///
/// Never absolute: rendering anchors every entry at `$ORIGIN`, the dynamic
/// linker's token for "directory containing this binary".
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SearchPath {
    offsets: Vec<String>,
}

impl SearchPath {
    /// Builds a search path from offsets relative to the binary's own
    /// directory. The empty offset means the directory itself.
    pub fn from_offsets<I, S>(offsets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            offsets: offsets.into_iter().map(Into::into).collect(),
        }
    }

    /// Renders the `$ORIGIN` expression, e.g. `$ORIGIN:$ORIGIN/../lib`.
    pub fn to_rpath(&self) -> String {
        self.offsets
            .iter()
            .map(|offset| {
                if offset.is_empty() {
                    "$ORIGIN".to_string()
                } else {
                    format!("$ORIGIN/{offset}")
                }
            })
            .collect::<Vec<_>>()
            .join(":")
    }
}

impl fmt::Display for SearchPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_rpath())
    }
}

/// Role of a copied binary, deciding which search-path policy applies.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BinaryRole {
    /// Top-level executable under `usr/bin`.
    Executable,
    /// Shared library under `usr/lib`; siblings satisfy each other.
    Library,
    /// Dynamically loaded plugin in a dedicated subdirectory of `usr/bin`.
    Plugin,
}

impl BinaryRole {
    /// The search-path policy for this role.
    pub fn search_path(self) -> SearchPath {
        match self {
            // own directory plus the sibling library directory
            BinaryRole::Executable => SearchPath::from_offsets(["", "../lib"]),
            // siblings only
            BinaryRole::Library => SearchPath::from_offsets([""]),
            // parent directory plus the library directory two levels up
            BinaryRole::Plugin => SearchPath::from_offsets(["..", "../../lib"]),
        }
    }
}

/// One binary or library copied into the bundle, awaiting relocation.
#[derive(Clone, Debug)]
pub struct BundleTarget {
    /// Destination path inside the bundle.
    pub path: PathBuf,
    /// Role deciding the search-path policy.
    pub role: BinaryRole,
}

impl BundleTarget {
    /// Creates a target for a copied file.
    pub fn new(path: impl Into<PathBuf>, role: BinaryRole) -> Self {
        Self {
            path: path.into(),
            role,
        }
    }

    /// The search path to apply to this target.
    pub fn search_path(&self) -> SearchPath {
        self.role.search_path()
    }
}

/// Capability interface over the platform's binary patch tool.
pub trait BinaryPatcher {
    /// Rewrites the embedded library-search directive of `binary`.
    ///
    /// Applying the same expression twice must be idempotent.
    fn set_search_path(&self, binary: &Path, search_path: &SearchPath) -> Result<()>;
}

/// Production [`BinaryPatcher`] backed by `patchelf`.
#[derive(Debug, Clone)]
pub struct PatchelfPatcher {
    program: PathBuf,
}

impl PatchelfPatcher {
    /// Creates a patcher using the given `patchelf` program path.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for PatchelfPatcher {
    fn default() -> Self {
        Self::new("patchelf")
    }
}

impl BinaryPatcher for PatchelfPatcher {
    fn set_search_path(&self, binary: &Path, search_path: &SearchPath) -> Result<()> {
        let rpath = search_path.to_rpath();
        let output = Command::new(&self.program)
            .arg("--set-rpath")
            .arg(&rpath)
            .arg(binary)
            .output()
            .map_err(|error| Error::CommandFailed {
                command: format!("{} --set-rpath {}", self.program.display(), binary.display()),
                error,
            })?;

        if !output.status.success() {
            bail!(
                "{} --set-rpath failed on {}: {}",
                self.program.display(),
                binary.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        log::debug!("set search path {} on {}", rpath, binary.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn executable_policy_searches_own_dir_and_sibling_lib() {
        assert_eq!(
            BinaryRole::Executable.search_path().to_rpath(),
            "$ORIGIN:$ORIGIN/../lib"
        );
    }

    #[test]
    fn library_policy_searches_own_dir_only() {
        assert_eq!(BinaryRole::Library.search_path().to_rpath(), "$ORIGIN");
    }

    #[test]
    fn plugin_policy_searches_parent_and_lib_two_up() {
        assert_eq!(
            BinaryRole::Plugin.search_path().to_rpath(),
            "$ORIGIN/..:$ORIGIN/../../lib"
        );
    }

    #[test]
    fn search_path_display_matches_rpath() {
        let path = SearchPath::from_offsets(["", "../lib"]);
        assert_eq!(path.to_string(), "$ORIGIN:$ORIGIN/../lib");
    }

    #[test]
    fn target_carries_role_policy() {
        let target = BundleTarget::new("/bundle/usr/lib/libr_utils.so", BinaryRole::Library);
        assert_eq!(target.search_path().to_rpath(), "$ORIGIN");
    }
}
