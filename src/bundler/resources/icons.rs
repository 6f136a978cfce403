//! Icon probing and hicolor theme placement.
//!
//! Icons are placed under size-keyed subdirectories following the
//! freedesktop.org hicolor layout:
//!
//! ```text
//! usr/share/icons/hicolor/
//!   ├── 128x128/apps/{name}.png
//!   └── 256x256/apps/{name}.png
//! ```
//!
//! The size key comes from the image itself, not configuration: the source
//! is probed for its pixel dimensions. A non-square icon is accepted but
//! flagged by the assembler.

use std::fs;
use std::path::{Path, PathBuf};

use crate::bundler::error::{ErrorExt, Result};

/// A source icon with probed pixel dimensions.
#[derive(Clone, Debug)]
pub struct IconAsset {
    /// Icon name; the destination file becomes `<name>.png`.
    pub name: String,

    /// Path to the source image.
    pub source: PathBuf,

    /// Icon width in pixels.
    pub width: u32,

    /// Icon height in pixels.
    pub height: u32,
}

impl IconAsset {
    /// Probes `source` for its dimensions without decoding the full image.
    pub fn probe(name: &str, source: &Path) -> Result<Self> {
        let (width, height) = image::image_dimensions(source)?;
        log::debug!("icon {}: {}x{}", source.display(), width, height);
        Ok(Self {
            name: name.to_string(),
            source: source.to_path_buf(),
            width,
            height,
        })
    }

    /// Returns whether this icon is square (width == height).
    pub fn is_square(&self) -> bool {
        self.width == self.height
    }

    /// The hicolor size directory for this icon, e.g. `128x128`.
    pub fn size_dir(&self) -> String {
        format!("{}x{}", self.width, self.height)
    }
}

/// Places an icon under `usr/share/icons/hicolor/<WxH>/apps/<name>.png`.
///
/// Returns the destination path.
pub fn install_icon(asset: &IconAsset, app_dir: &Path) -> Result<PathBuf> {
    let dest_dir = app_dir
        .join("usr/share/icons/hicolor")
        .join(asset.size_dir())
        .join("apps");
    fs::create_dir_all(&dest_dir).fs_context("creating icon directory", &dest_dir)?;

    let dest = dest_dir.join(format!("{}.png", asset.name));
    fs::copy(&asset.source, &dest).fs_context("copying icon", &asset.source)?;
    Ok(dest)
}
