//! Figure export
//!
//! Supports writing figures as:
//! - PNG: raster image at the figure's dpi
//! - SVG: scalable vector graphics

use std::fs;
use std::path::Path;

use plotters::backend::{BitMapBackend, SVGBackend};
use plotters::drawing::IntoDrawingArea;
use serde::{Deserialize, Serialize};

use crate::error::ExportError;
use crate::figure::Figure;
use crate::fonts;
use crate::render::draw_figure;

/// Largest accepted edge length in pixels
const MAX_EDGE_PX: u32 = 20_000;

/// Export format for figures
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// PNG raster image
    Png,
    /// SVG scalable vector graphics
    Svg,
}

impl ExportFormat {
    /// Get file extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Svg => "svg",
        }
    }

    /// Get MIME type for this format
    pub fn mime_type(&self) -> &'static str {
        match self {
            ExportFormat::Png => "image/png",
            ExportFormat::Svg => "image/svg+xml",
        }
    }

    /// Check if this format is raster (vs vector)
    pub fn is_raster(&self) -> bool {
        matches!(self, ExportFormat::Png)
    }

    /// Pick the format from a file extension (case-insensitive)
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ExportError> {
        let ext = path
            .as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "png" => Ok(ExportFormat::Png),
            "svg" => Ok(ExportFormat::Svg),
            _ => Err(ExportError::UnsupportedFormat { format: ext }),
        }
    }
}

impl Figure {
    fn prepare(&self) -> Result<(u32, u32), ExportError> {
        let (width, height) = self.pixel_size();
        if width == 0 || height == 0 || width > MAX_EDGE_PX || height > MAX_EDGE_PX {
            return Err(ExportError::InvalidSize { width, height });
        }
        if self.has_text() {
            fonts::ensure_font(&self.fonts)?;
        }
        Ok((width, height))
    }

    /// Write the figure, choosing the format from the file extension
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ExportError> {
        let path = path.as_ref();
        let format = ExportFormat::from_path(path)?;
        let write_err = |message: String| ExportError::Write {
            path: path.to_path_buf(),
            message,
        };

        match format {
            ExportFormat::Png => {
                let size = self.prepare()?;
                let root = BitMapBackend::new(path, size).into_drawing_area();
                draw_figure(&root, self).map_err(render_err)?;
                root.present().map_err(|e| write_err(e.to_string()))?;
            }
            ExportFormat::Svg => {
                let svg = self.render_svg()?;
                fs::write(path, svg).map_err(|e| write_err(e.to_string()))?;
            }
        }

        tracing::info!(path = %path.display(), ?format, "saved figure");
        Ok(())
    }

    /// Render the figure as an SVG document
    pub fn render_svg(&self) -> Result<String, ExportError> {
        let size = self.prepare()?;
        let mut svg = String::new();
        {
            let root = SVGBackend::with_string(&mut svg, size).into_drawing_area();
            draw_figure(&root, self).map_err(render_err)?;
            root.present().map_err(render_err)?;
        }
        Ok(svg)
    }

    /// Render the figure into a packed RGB buffer, row-major from the top left
    pub fn render_rgb(&self) -> Result<Vec<u8>, ExportError> {
        let (width, height) = self.prepare()?;
        let mut buffer = vec![0u8; width as usize * height as usize * 3];
        {
            let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
            draw_figure(&root, self).map_err(render_err)?;
            root.present().map_err(render_err)?;
        }
        Ok(buffer)
    }
}

fn render_err(e: impl std::fmt::Display) -> ExportError {
    ExportError::Render {
        message: e.to_string(),
    }
}
