//! Library classification: ship it, or assume the host has it.
//!
//! Classification is a pure function of the resolved path string and the
//! rule tables in [`ClassifierRules`]; it never depends on copy order.

use std::path::Path;

use crate::bundler::settings::ClassifierRules;

/// Verdict for one resolved library path.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Classification {
    /// Assumed present and ABI-compatible on any target host; never bundled.
    CoreSystem,
    /// Belongs to a runtime stack the bundle must own; bundled
    /// unconditionally, even when installed under a system directory.
    ForceBundle,
    /// Bundled unless already satisfiable from a standard system path.
    Ordinary,
}

/// Applies the classification rule tables to resolved library paths.
pub struct Classifier<'a> {
    rules: &'a ClassifierRules,
}

impl<'a> Classifier<'a> {
    /// Creates a classifier over the given rule tables.
    pub fn new(rules: &'a ClassifierRules) -> Self {
        Self { rules }
    }

    /// Classifies a resolved library path.
    ///
    /// Evaluation order:
    /// 1. Force-bundle markers, checked against the full path. These win
    ///    over everything else: a streaming-media plugin under `/usr/lib`
    ///    must still travel with the bundle.
    /// 2. Core-system names, checked against the basename; a core library
    ///    is excluded regardless of which directory it resolved from.
    /// 3. System library prefixes; anything else under them is assumed
    ///    host-provided.
    /// 4. Everything else is an ordinary, bundled dependency.
    pub fn classify(&self, path: &Path) -> Classification {
        let text = path.to_string_lossy();
        if self
            .rules
            .force_bundle
            .iter()
            .any(|marker| text.contains(marker.as_str()))
        {
            return Classification::ForceBundle;
        }

        if let Some(basename) = path.file_name().map(|n| n.to_string_lossy())
            && self
                .rules
                .core_system
                .iter()
                .any(|name| basename.contains(name.as_str()))
        {
            return Classification::CoreSystem;
        }

        if self
            .rules
            .system_prefixes
            .iter()
            .any(|prefix| text.starts_with(prefix.as_str()))
        {
            return Classification::CoreSystem;
        }

        Classification::Ordinary
    }

    /// Whether the library at `path` should be copied into the bundle.
    pub fn should_bundle(&self, path: &Path) -> bool {
        !matches!(self.classify(path), Classification::CoreSystem)
    }
}
