//! Bundled resource handling (icons).

pub mod icons;
