//! Shared-library dependency resolution.
//!
//! Queries the platform's dynamic-linker tool (`ldd`) once per top-level
//! executable and trusts its transitive report; copied libraries are never
//! re-queried. The query sits behind the [`DependencyQuery`] capability
//! trait so tests can substitute canned dependency lists.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::bail;
use crate::bundler::error::{Error, Result};

/// A shared-library reference reported for a binary.
///
/// A reference the dynamic linker could not resolve (`path == None`) is a
/// distinct, reportable state: the bundle will fail to run without it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LibraryReference {
    /// Shared-object name, with version suffix (e.g. `libpng16.so.16`).
    pub name: String,

    /// Resolved absolute path, or `None` when the linker reported
    /// "not found".
    pub path: Option<PathBuf>,
}

impl LibraryReference {
    /// A reference with a resolved filesystem path.
    pub fn resolved(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: Some(path.into()),
        }
    }

    /// A reference the dynamic linker could not find.
    pub fn unresolved(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: None,
        }
    }

    /// Whether the linker resolved this reference to a path.
    pub fn is_resolved(&self) -> bool {
        self.path.is_some()
    }
}

/// Capability interface over the platform's dynamic-dependency query tool.
pub trait DependencyQuery {
    /// Full dependency report for one binary.
    fn resolve(&self, binary: &Path) -> Result<Vec<LibraryReference>>;
}

/// Production [`DependencyQuery`] backed by `ldd`.
#[derive(Debug, Clone)]
pub struct LddQuery {
    program: PathBuf,
}

impl LddQuery {
    /// Creates a query using the given `ldd` program path.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for LddQuery {
    fn default() -> Self {
        Self::new("ldd")
    }
}

impl DependencyQuery for LddQuery {
    fn resolve(&self, binary: &Path) -> Result<Vec<LibraryReference>> {
        // Check existence first for a clear error message
        if !binary.exists() {
            bail!("binary does not exist: {}", binary.display());
        }

        let output = Command::new(&self.program)
            .arg(binary)
            .output()
            .map_err(|error| Error::CommandFailed {
                command: format!("{} {}", self.program.display(), binary.display()),
                error,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            // Statically linked binaries have no closure; not an error
            if stderr.contains("not a dynamic executable")
                || stdout.contains("not a dynamic executable")
            {
                return Ok(Vec::new());
            }
            bail!(
                "{} failed on {}: {}",
                self.program.display(),
                binary.display(),
                stderr.trim()
            );
        }

        Ok(parse_ldd_output(&stdout))
    }
}

/// Parse `ldd` output into library references.
///
/// Example output:
/// ```text
///     linux-vdso.so.1 (0x00007ffd4a5fe000)
///     libpng16.so.16 => /usr/lib/libpng16.so.16 (0x00007f1bb0b00000)
///     libmissing.so.1 => not found
///     /lib64/ld-linux-x86-64.so.2 (0x00007f1bb0ce5000)
/// ```
///
/// Lines without `=>` (the vdso and the direct loader line) carry no file to
/// copy and are skipped, as are malformed lines. A `not found` target yields
/// an unresolved reference.
pub fn parse_ldd_output(output: &str) -> Vec<LibraryReference> {
    let mut references = Vec::new();

    for line in output.lines() {
        let line = line.trim();
        let Some((name, target)) = line.split_once("=>") else {
            continue;
        };
        let name = name.trim();
        if name.is_empty() {
            continue;
        }

        let target = target.trim();
        if target.starts_with("not found") {
            references.push(LibraryReference::unresolved(name));
            continue;
        }

        // First token is the resolved path; the parenthesised load address
        // follows it
        let Some(path) = target.split_whitespace().next() else {
            continue;
        };
        if !path.starts_with('/') {
            continue;
        }
        references.push(LibraryReference::resolved(name, path));
    }

    references
}
