//! Explicit figure model
//!
//! Plotting functions take a [`Figure`] by value and hand back the same
//! figure filled with panels, so there is no hidden "current figure". A
//! figure only describes what to draw; [`crate::export`] turns it into PNG
//! or SVG output.

use ndarray::Array2;

use crate::axis::{AxisConfig, AxisPosition, Ticks};
use crate::colormap::{Color, ColorScale};
use crate::config::{FontConfig, PlotConfig};

/// A piece of text with its size in points
#[derive(Clone, Debug, PartialEq)]
pub struct Label {
    pub text: String,
    pub size: f64,
    pub color: Color,
}

impl Label {
    pub fn new(text: impl Into<String>, size: f64) -> Self {
        Self {
            text: text.into(),
            size,
            color: Color::BLACK,
        }
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }
}

/// Where row 0 of a heatmap is drawn
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Origin {
    /// Row 0 at the top (matrix convention)
    #[default]
    Upper,
    /// Row 0 at the bottom (plot convention)
    Lower,
}

/// A color-mapped 2-D array drawn over a data-space rectangle
#[derive(Clone, Debug, PartialEq)]
pub struct Heatmap {
    /// `[rows, cols]`
    pub values: Array2<f64>,
    /// `(left, right, bottom, top)` in data coordinates
    pub extent: [f64; 4],
    pub origin: Origin,
    pub scale: ColorScale,
}

impl Heatmap {
    pub fn new(values: Array2<f64>, extent: [f64; 4], origin: Origin, scale: ColorScale) -> Self {
        Self {
            values,
            extent,
            origin,
            scale,
        }
    }

    /// Data-space rectangle `(x0, x1, y0, y1)` covered by cell `(row, col)`
    pub fn cell_bounds(&self, row: usize, col: usize) -> (f64, f64, f64, f64) {
        let (nrows, ncols) = self.values.dim();
        let [left, right, bottom, top] = self.extent;
        let dx = (right - left) / ncols as f64;
        let dy = (top - bottom) / nrows as f64;

        let x0 = left + dx * col as f64;
        let (y0, y1) = match self.origin {
            Origin::Upper => (top - dy * (row + 1) as f64, top - dy * row as f64),
            Origin::Lower => (bottom + dy * row as f64, bottom + dy * (row + 1) as f64),
        };
        (x0, x0 + dx, y0, y1)
    }
}

/// A polyline
#[derive(Clone, Debug, PartialEq)]
pub struct Line {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub color: Color,
    /// Width in points
    pub width: f64,
    /// Legend entry
    pub label: Option<String>,
}

/// A filled, already projected triangle
#[derive(Clone, Debug, PartialEq)]
pub struct Triangle {
    pub points: [(f64, f64); 3],
    pub color: Color,
}

/// Triangles drawn in order (back to front)
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Mesh {
    pub triangles: Vec<Triangle>,
}

/// Something drawn inside a panel's plot area
#[derive(Clone, Debug, PartialEq)]
pub enum Layer {
    Heatmap(Heatmap),
    Line(Line),
    Mesh(Mesh),
    /// Full-height and full-width lines through a point
    Crosshair { x: f64, y: f64, color: Color },
}

/// Text placed at data coordinates, centered
#[derive(Clone, Debug, PartialEq)]
pub struct Annotation {
    pub x: f64,
    pub y: f64,
    pub label: Label,
}

/// Color scale legend drawn to the right of a panel
#[derive(Clone, Debug, PartialEq)]
pub struct Colorbar {
    pub scale: ColorScale,
    pub label: Option<Label>,
    /// Tick label size in points
    pub tick_size: f64,
}

/// Which frame lines are drawn around the plot area
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Spines {
    pub left: bool,
    pub right: bool,
    pub top: bool,
    pub bottom: bool,
}

impl Spines {
    pub fn hide(&mut self, side: AxisPosition) {
        match side {
            AxisPosition::Left => self.left = false,
            AxisPosition::Right => self.right = false,
            AxisPosition::Top => self.top = false,
            AxisPosition::Bottom => self.bottom = false,
        }
    }
}

impl Default for Spines {
    fn default() -> Self {
        Self {
            left: true,
            right: true,
            top: true,
            bottom: true,
        }
    }
}

/// One set of axes
#[derive(Clone, Debug, PartialEq)]
pub struct Panel {
    pub title: Option<Label>,
    pub x_axis: AxisConfig,
    pub y_axis: AxisConfig,
    pub layers: Vec<Layer>,
    pub annotations: Vec<Annotation>,
    pub colorbar: Option<Colorbar>,
    /// Draw a legend for labeled lines
    pub legend: bool,
    pub spines: Spines,
    /// When false, no ticks, labels or spines are drawn
    pub axes_visible: bool,
    /// Fill behind the plot area
    pub background: Option<Color>,
    /// Keep one data unit the same length on both axes
    pub equal_aspect: bool,
}

impl Panel {
    pub fn new(x_axis: AxisConfig, y_axis: AxisConfig) -> Self {
        Self {
            title: None,
            x_axis,
            y_axis,
            layers: Vec::new(),
            annotations: Vec::new(),
            colorbar: None,
            legend: false,
            spines: Spines::default(),
            axes_visible: true,
            background: None,
            equal_aspect: false,
        }
    }

    /// A panel over `[x0, x1] × [y0, y1]` with no axes drawn
    pub fn bare(x0: f64, x1: f64, y0: f64, y1: f64) -> Self {
        let mut panel = Self::new(
            AxisConfig::new(AxisPosition::Bottom, x0, x1).with_ticks(Ticks::Hidden),
            AxisConfig::new(AxisPosition::Left, y0, y1).with_ticks(Ticks::Hidden),
        );
        panel.axes_visible = false;
        panel
    }

    pub fn with_title(mut self, title: Label) -> Self {
        self.title = Some(title);
        self
    }

    pub fn push(&mut self, layer: Layer) {
        self.layers.push(layer);
    }

    pub fn heatmaps(&self) -> impl Iterator<Item = &Heatmap> {
        self.layers.iter().filter_map(|l| match l {
            Layer::Heatmap(h) => Some(h),
            _ => None,
        })
    }

    pub fn lines(&self) -> impl Iterator<Item = &Line> {
        self.layers.iter().filter_map(|l| match l {
            Layer::Line(line) => Some(line),
            _ => None,
        })
    }

    /// Whether drawing this panel needs a font
    pub fn has_text(&self) -> bool {
        let axis_text = |axis: &AxisConfig| {
            axis.label.is_some()
                || match &axis.ticks {
                    Ticks::Hidden => false,
                    Ticks::Auto => true,
                    Ticks::Fixed(ticks) => !ticks.is_empty(),
                }
        };
        self.title.is_some()
            || !self.annotations.is_empty()
            || self.colorbar.is_some()
            || (self.legend && self.lines().any(|l| l.label.is_some()))
            || (self.axes_visible && (axis_text(&self.x_axis) || axis_text(&self.y_axis)))
    }
}

/// A figure: geometry, fonts and a grid of panels
#[derive(Clone, Debug, PartialEq)]
pub struct Figure {
    /// `(width, height)` in inches
    pub size_inches: (f64, f64),
    pub dpi: u32,
    pub background: Color,
    /// Color of axes, ticks and tick labels
    pub foreground: Color,
    pub fonts: FontConfig,
    pub title: Option<Label>,
    /// Panel grid `(rows, cols)`, filled row by row
    pub grid: (usize, usize),
    pub panels: Vec<Panel>,
}

impl Figure {
    /// An empty 6.4 × 4.8 in figure at 100 dpi
    pub fn new() -> Self {
        Self::from_config(&PlotConfig::default())
    }

    /// An empty figure using the configured geometry and fonts
    pub fn from_config(config: &PlotConfig) -> Self {
        Self {
            size_inches: (config.figure.width_inches, config.figure.height_inches),
            dpi: config.figure.dpi,
            background: Color::WHITE,
            foreground: Color::BLACK,
            fonts: config.fonts.clone(),
            title: None,
            grid: (1, 1),
            panels: Vec::new(),
        }
    }

    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.size_inches = (width, height);
        self
    }

    pub fn with_dpi(mut self, dpi: u32) -> Self {
        self.dpi = dpi;
        self
    }

    /// Output size in pixels
    pub fn pixel_size(&self) -> (u32, u32) {
        let px = |inches: f64| (inches * self.dpi as f64).round().max(0.0) as u32;
        (px(self.size_inches.0), px(self.size_inches.1))
    }

    /// Pixels per typographic point
    pub fn px_per_pt(&self) -> f64 {
        self.dpi as f64 / 72.0
    }

    /// Drop all panels and the title, keeping geometry and fonts
    pub fn clear(&mut self) {
        self.panels.clear();
        self.title = None;
        self.grid = (1, 1);
    }

    /// Replace the contents with `panels` laid out on a `rows × cols` grid
    pub fn set_panels(&mut self, rows: usize, cols: usize, panels: Vec<Panel>) {
        self.grid = (rows.max(1), cols.max(1));
        self.panels = panels;
    }

    pub fn panel(&self, index: usize) -> Option<&Panel> {
        self.panels.get(index)
    }

    pub fn has_text(&self) -> bool {
        self.title.is_some() || self.panels.iter().any(Panel::has_text)
    }
}

impl Default for Figure {
    fn default() -> Self {
        Self::new()
    }
}
