//! Configuration for neurovis plotting
//!
//! Holds the values that were implicit module state in older plotting
//! code: where template volumes live, which font to render with, default
//! figure geometry and the surface meshes used for cortical views.
//!
//! ```toml
//! [templates]
//! dir = "/opt/neurovis/template"
//!
//! [fonts]
//! path = "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf"
//! axis_label_size = 20.0
//!
//! [figure]
//! width_inches = 6.4
//! height_inches = 4.8
//! dpi = 100
//!
//! [surface]
//! left_pial = "/data/fsaverage/surf/lh.pial"
//! left_sulc = "/data/fsaverage/surf/lh.sulc"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use neurovis_io::{default_template_dir, Hemisphere};

use crate::error::ConfigError;

/// Top-level plotting configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotConfig {
    pub templates: TemplateConfig,
    pub fonts: FontConfig,
    pub figure: FigureConfig,
    pub surface: SurfaceConfig,
}

/// Template background location
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateConfig {
    /// Directory holding `ch2.nii.gz` and `ch2bet.nii.gz`
    pub dir: Option<PathBuf>,
}

impl TemplateConfig {
    /// Configured directory, else the environment / data-dir default
    pub fn resolve_dir(&self) -> PathBuf {
        self.dir.clone().unwrap_or_else(default_template_dir)
    }
}

/// Font selection and default text sizes (points)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FontConfig {
    pub family: String,
    /// TrueType file to render with; common system fonts are probed when unset
    pub path: Option<PathBuf>,
    pub colorbar_label_size: f64,
    pub colorbar_tick_size: f64,
    pub axis_label_size: f64,
    pub tick_label_size: f64,
    pub condition_label_size: f64,
    pub value_size: f64,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            family: "sans-serif".to_string(),
            path: None,
            colorbar_label_size: 18.0,
            colorbar_tick_size: 16.0,
            axis_label_size: 20.0,
            tick_label_size: 18.0,
            condition_label_size: 12.0,
            value_size: 10.0,
        }
    }
}

/// Default figure geometry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FigureConfig {
    pub width_inches: f64,
    pub height_inches: f64,
    pub dpi: u32,
}

impl Default for FigureConfig {
    fn default() -> Self {
        Self {
            width_inches: 6.4,
            height_inches: 4.8,
            dpi: 100,
        }
    }
}

/// FreeSurfer meshes for surface views
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceConfig {
    pub left_pial: Option<PathBuf>,
    pub left_sulc: Option<PathBuf>,
    pub right_pial: Option<PathBuf>,
    pub right_sulc: Option<PathBuf>,
}

impl SurfaceConfig {
    /// Build from a FreeSurfer subject's `surf/` directory
    pub fn from_subject_dir(surf_dir: impl AsRef<Path>) -> Self {
        let dir = surf_dir.as_ref();
        Self {
            left_pial: Some(dir.join("lh.pial")),
            left_sulc: Some(dir.join("lh.sulc")),
            right_pial: Some(dir.join("rh.pial")),
            right_sulc: Some(dir.join("rh.sulc")),
        }
    }

    /// Pial mesh and sulcal map for one hemisphere, if both are set
    pub fn hemisphere(&self, hemi: Hemisphere) -> Option<(&Path, &Path)> {
        let (pial, sulc) = match hemi {
            Hemisphere::Left => (&self.left_pial, &self.left_sulc),
            Hemisphere::Right => (&self.right_pial, &self.right_sulc),
        };
        Some((pial.as_deref()?, sulc.as_deref()?))
    }

    /// Whether both hemispheres are configured
    pub fn is_configured(&self) -> bool {
        self.hemisphere(Hemisphere::Left).is_some() && self.hemisphere(Hemisphere::Right).is_some()
    }
}

impl PlotConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml_str).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Serialize configuration to TOML
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))
    }

    /// Load configuration from a JSON string
    pub fn from_json(json_str: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json_str).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Serialize configuration to JSON
    pub fn to_json(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))
    }

    /// Load and validate a TOML config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let config = Self::from_toml(&text)?;
        config.validate()?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Standard config file location
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("neurovis").join("config.toml"))
    }

    /// Load from the standard location, falling back to defaults when absent
    pub fn load_default() -> Result<Self, ConfigError> {
        match Self::default_path() {
            Some(path) if path.is_file() => Self::load(path),
            _ => Ok(Self::default()),
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fig = &self.figure;
        if !(fig.width_inches > 0.0 && fig.height_inches > 0.0) {
            return Err(ConfigError::OutOfRange(
                "figure width and height must be positive".to_string(),
            ));
        }

        if fig.dpi == 0 || fig.dpi > 1200 {
            return Err(ConfigError::OutOfRange(
                "dpi must be between 1 and 1200".to_string(),
            ));
        }

        let f = &self.fonts;
        let sizes = [
            ("colorbar_label_size", f.colorbar_label_size),
            ("colorbar_tick_size", f.colorbar_tick_size),
            ("axis_label_size", f.axis_label_size),
            ("tick_label_size", f.tick_label_size),
            ("condition_label_size", f.condition_label_size),
            ("value_size", f.value_size),
        ];
        if let Some((name, _)) = sizes.iter().find(|(_, size)| !(*size > 0.0)) {
            return Err(ConfigError::OutOfRange(format!("{} must be positive", name)));
        }

        let s = &self.surface;
        if s.left_pial.is_some() != s.left_sulc.is_some()
            || s.right_pial.is_some() != s.right_sulc.is_some()
        {
            return Err(ConfigError::OutOfRange(
                "each hemisphere needs both a pial mesh and a sulcal map".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PlotConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.figure.dpi, 100);
        assert_eq!(config.fonts.axis_label_size, 20.0);
        assert!(!config.surface.is_configured());
    }

    #[test]
    fn test_json_serialization() {
        let mut config = PlotConfig::default();
        config.templates.dir = Some(PathBuf::from("/opt/template"));
        let json = config.to_json().unwrap();
        let parsed = PlotConfig::from_json(&json).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = PlotConfig::from_toml("[figure]\ndpi = 200\n").unwrap();
        assert_eq!(config.figure.dpi, 200);
        assert_eq!(config.figure.width_inches, 6.4);
        assert_eq!(config.fonts.family, "sans-serif");
    }

    #[test]
    fn test_out_of_range() {
        let mut config = PlotConfig::default();
        config.figure.dpi = 0;
        assert!(config.validate().is_err());

        let mut config = PlotConfig::default();
        config.fonts.tick_label_size = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_half_configured_hemisphere() {
        let mut config = PlotConfig::default();
        config.surface.left_pial = Some(PathBuf::from("lh.pial"));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_surface_from_subject_dir() {
        let surface = SurfaceConfig::from_subject_dir("/data/fsaverage/surf");
        assert!(surface.is_configured());
        let (pial, sulc) = surface.hemisphere(Hemisphere::Right).unwrap();
        assert!(pial.ends_with("rh.pial"));
        assert!(sulc.ends_with("rh.sulc"));
    }

    #[test]
    fn test_explicit_template_dir() {
        let config = TemplateConfig {
            dir: Some(PathBuf::from("/opt/template")),
        };
        assert_eq!(config.resolve_dir(), PathBuf::from("/opt/template"));
    }
}
