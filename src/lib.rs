//! # appdir_bundler
//!
//! Assembles a relocatable, self-contained AppDir bundle from an
//! already-built installation tree.
//!
//! ## Features
//!
//! - **Dependency closure**: Resolves each executable's shared-library
//!   dependencies through the platform's dynamic-linker query tool
//! - **Classification**: Distinguishes host-provided core-system libraries
//!   from force-bundled runtime stacks and ordinary dependencies, driven by
//!   configurable rule tables
//! - **Relocation**: Rewrites every copied binary's library search path to
//!   `$ORIGIN`-relative expressions so the bundle runs from any path
//! - **Launcher and manifest**: Emits the AppRun entry point and a
//!   freedesktop.org desktop entry
//! - **Icons**: Places icons under size-keyed hicolor subdirectories
//!
//! ## Usage
//!
//! ```bash
//! appdir_bundler bundle.json
//! appdir_bundler bundle.json --output Revere.AppDir
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod bundler;
pub mod cli;

// Re-export main types for public API
pub use bundler::{
    AppDirBuilder, AssemblyReport, Classification, Error, Result, Settings, SettingsBuilder,
};
