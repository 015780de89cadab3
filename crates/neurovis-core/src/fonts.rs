//! Font registration for text rendering
//!
//! Text is rasterized with a TrueType font registered under the configured
//! family name. The font file comes from the configuration or, failing
//! that, from a list of common system locations.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use plotters::style::{register_font, FontStyle};

use crate::config::FontConfig;
use crate::error::ExportError;

/// System fonts tried when no font path is configured
pub const FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu-sans-fonts/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation-sans/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Family and font file of every registration made in this process
static REGISTERED: Mutex<Vec<(String, PathBuf)>> = Mutex::new(Vec::new());

/// Font file to use for `config`, if any exists
pub fn find_font(config: &FontConfig) -> Option<PathBuf> {
    if let Some(path) = &config.path {
        return path.is_file().then(|| path.clone());
    }
    FONT_CANDIDATES
        .iter()
        .map(Path::new)
        .find(|p| p.is_file())
        .map(Path::to_path_buf)
}

/// Make sure the configured family can be drawn
///
/// A family registered again with a different font file is re-registered,
/// so the latest file wins.
pub fn ensure_font(config: &FontConfig) -> Result<(), ExportError> {
    let mut registered = REGISTERED.lock().unwrap_or_else(|e| e.into_inner());

    let path = find_font(config).ok_or_else(|| ExportError::FontUnavailable {
        reason: match &config.path {
            Some(p) => format!("configured font {} does not exist", p.display()),
            None => "no TrueType font found in the usual system locations; set fonts.path"
                .to_string(),
        },
    })?;
    if registered
        .iter()
        .any(|(family, file)| family == &config.family && file == &path)
    {
        return Ok(());
    }

    let bytes = fs::read(&path).map_err(|e| ExportError::FontUnavailable {
        reason: format!("{}: {}", path.display(), e),
    })?;

    // registered fonts must live for the rest of the process
    let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());
    register_font(&config.family, FontStyle::Normal, bytes).map_err(|_| {
        ExportError::FontUnavailable {
            reason: format!("{}: not a valid TrueType font", path.display()),
        }
    })?;

    tracing::debug!(family = %config.family, path = %path.display(), "registered font");
    registered.retain(|(family, _)| family != &config.family);
    registered.push((config.family.clone(), path));
    Ok(())
}
