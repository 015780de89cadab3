//! Template background volumes
//!
//! Brain views draw on one of two MNI templates: the full-head `ch2` and
//! the skull-stripped `ch2bet`. The template directory is resolved at call
//! time, in order:
//!
//! 1. an explicit directory (usually from the plot configuration)
//! 2. the `NEUROVIS_TEMPLATE_DIR` environment variable
//! 3. `<data dir>/neurovis/template`

use std::env;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{IoError, IoResult};

/// Environment variable overriding the template directory
pub const TEMPLATE_DIR_ENV: &str = "NEUROVIS_TEMPLATE_DIR";

/// A bundled template volume
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateAsset {
    /// Full-head single-subject MNI template
    Ch2,
    /// Brain-extracted variant of `Ch2`
    Ch2Bet,
}

impl TemplateAsset {
    /// File name inside the template directory
    pub fn file_name(&self) -> &'static str {
        match self {
            TemplateAsset::Ch2 => "ch2.nii.gz",
            TemplateAsset::Ch2Bet => "ch2bet.nii.gz",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TemplateAsset::Ch2 => "ch2",
            TemplateAsset::Ch2Bet => "ch2bet",
        }
    }
}

impl fmt::Display for TemplateAsset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Default template directory, ignoring any explicit override
pub fn default_template_dir() -> PathBuf {
    if let Some(dir) = env::var_os(TEMPLATE_DIR_ENV).filter(|v| !v.is_empty()) {
        return PathBuf::from(dir);
    }
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("neurovis")
        .join("template")
}

/// Path a template is expected at; the file is not checked
pub fn template_path(asset: TemplateAsset, dir: Option<&Path>) -> PathBuf {
    match dir {
        Some(dir) => dir.join(asset.file_name()),
        None => default_template_dir().join(asset.file_name()),
    }
}

/// Path of an existing template file
pub fn locate(asset: TemplateAsset, dir: Option<&Path>) -> IoResult<PathBuf> {
    let path = template_path(asset, dir);
    if path.is_file() {
        tracing::debug!(asset = %asset, path = %path.display(), "located template");
        Ok(path)
    } else {
        Err(IoError::TemplateMissing {
            asset: asset.name().to_string(),
            path,
        })
    }
}

/// Path of the `ch2` template in the default directory
pub fn get_bg_ch2() -> PathBuf {
    template_path(TemplateAsset::Ch2, None)
}

/// Path of the `ch2bet` template in the default directory
pub fn get_bg_ch2bet() -> PathBuf {
    template_path(TemplateAsset::Ch2Bet, None)
}
