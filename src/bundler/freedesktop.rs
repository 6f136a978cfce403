//! AppRun launcher and freedesktop.org desktop entry generation.
//!
//! Both files are rendered from Handlebars templates and written at the
//! AppDir root. The desktop entry's field set and order match the
//! freedesktop.org desktop-entry schema so third-party bundling tools
//! accept the output unchanged.

use std::fs;
use std::path::{Path, PathBuf};

use handlebars::Handlebars;
use serde_json::json;

use crate::bundler::error::{ErrorExt, Result};
use crate::bundler::settings::Settings;
use crate::bundler::utils::fs::make_executable;

/// Entry-point script: forwards all arguments to the primary executable,
/// resolved relative to the script's own location.
const APPRUN_TEMPLATE: &str =
    "#!/bin/bash\nexec \"$(dirname \"$0\")/usr/bin/{{executable}}\" \"$@\"\n";

const DESKTOP_TEMPLATE: &str = "\
[Desktop Entry]
Version=1.0
Type=Application
Name={{name}}
Exec={{exec}}
Comment={{comment}}
Icon={{icon}}
Terminal=false
Categories={{categories}}
";

fn renderer() -> Handlebars<'static> {
    let mut handlebars = Handlebars::new();
    // these are shell scripts and ini files, not HTML
    handlebars.register_escape_fn(handlebars::no_escape);
    handlebars
}

/// Writes the executable AppRun launcher at the AppDir root.
pub fn write_launcher(settings: &Settings, app_dir: &Path) -> Result<PathBuf> {
    let body = renderer().render_template(
        APPRUN_TEMPLATE,
        &json!({ "executable": settings.primary_executable() }),
    )?;

    let path = app_dir.join("AppRun");
    fs::write(&path, body).fs_context("writing launcher", &path)?;
    make_executable(&path)?;
    log::info!("wrote launcher {}", path.display());
    Ok(path)
}

/// Writes the desktop entry at the AppDir root.
pub fn write_desktop_entry(settings: &Settings, app_dir: &Path) -> Result<PathBuf> {
    let body = renderer().render_template(
        DESKTOP_TEMPLATE,
        &json!({
            "name": settings.product_name(),
            "exec": settings.primary_executable(),
            "comment": settings.description(),
            "icon": settings.icon_name(),
            "categories": settings.category().unwrap_or("Utility;"),
        }),
    )?;

    let path = app_dir.join(settings.desktop_entry_name());
    fs::write(&path, body).fs_context("writing desktop entry", &path)?;
    log::info!("wrote desktop entry {}", path.display());
    Ok(path)
}
