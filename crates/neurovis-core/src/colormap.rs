//! Colormaps for RSA figures
//!
//! Provides the colormaps the plotting functions default to:
//! - Sequential: viridis, inferno, greens, gray, hot
//! - Rainbow: jet (RDM heatmaps)
//! - Diverging: cold_hot (signed brain maps)
//! - Categorical: `category10` for line series
//!
//! Any colormap can be reversed, and `get_colormap` accepts the `_r`
//! suffix for reversed variants.

use serde::{Deserialize, Serialize};

/// A color in RGBA format (0.0 to 1.0)
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const BLACK: Color = Color { r: 0.0, g: 0.0, b: 0.0, a: 1.0 };
    pub const WHITE: Color = Color { r: 1.0, g: 1.0, b: 1.0, a: 1.0 };
    pub const BLUE: Color = Color { r: 0.0, g: 0.0, b: 1.0, a: 1.0 };

    pub fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Create a color from RGB (alpha = 1.0)
    pub fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Create a color from hex string (e.g., "#1F77B4" or "1F77B4")
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim_start_matches('#');
        if hex.len() != 6 {
            return None;
        }

        let r = u8::from_str_radix(&hex[0..2], 16).ok()? as f32 / 255.0;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()? as f32 / 255.0;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()? as f32 / 255.0;

        Some(Self::rgb(r, g, b))
    }

    pub fn to_hex(&self) -> String {
        let (r, g, b) = self.to_rgb8();
        format!("#{:02X}{:02X}{:02X}", r, g, b)
    }

    /// 8-bit channels, rounded
    pub fn to_rgb8(&self) -> (u8, u8, u8) {
        let q = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        (q(self.r), q(self.g), q(self.b))
    }

    /// Linear interpolation between two colors
    pub fn lerp(a: &Color, b: &Color, t: f32) -> Color {
        let t = t.clamp(0.0, 1.0);
        Color {
            r: a.r + (b.r - a.r) * t,
            g: a.g + (b.g - a.g) * t,
            b: a.b + (b.b - a.b) * t,
            a: a.a + (b.a - a.a) * t,
        }
    }

    /// Multiply the RGB channels, keeping alpha
    pub fn darken(&self, factor: f32) -> Color {
        Color {
            r: self.r * factor,
            g: self.g * factor,
            b: self.b * factor,
            a: self.a,
        }
    }

    pub fn with_alpha(mut self, a: f32) -> Color {
        self.a = a;
        self
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::rgb(0.5, 0.5, 0.5)
    }
}

/// A colormap for mapping scalar values to colors
#[derive(Clone, Debug, PartialEq)]
pub struct Colormap {
    pub name: String,
    /// Color stops (positions from 0.0 to 1.0)
    stops: Vec<(f32, Color)>,
    reversed: bool,
}

impl Colormap {
    /// Create a new colormap from a list of colors (evenly spaced)
    pub fn from_colors(name: impl Into<String>, colors: Vec<Color>) -> Self {
        let n = colors.len();
        let stops: Vec<(f32, Color)> = colors
            .into_iter()
            .enumerate()
            .map(|(i, c)| (i as f32 / (n - 1).max(1) as f32, c))
            .collect();

        Self {
            name: name.into(),
            stops,
            reversed: false,
        }
    }

    /// Create a new colormap from stops (position, color pairs)
    pub fn from_stops(name: impl Into<String>, stops: Vec<(f32, Color)>) -> Self {
        Self {
            name: name.into(),
            stops,
            reversed: false,
        }
    }

    pub fn reversed(mut self) -> Self {
        self.reversed = !self.reversed;
        self
    }

    /// Sample the colormap at a position (0.0 to 1.0)
    pub fn sample(&self, mut t: f32) -> Color {
        t = t.clamp(0.0, 1.0);
        if self.reversed {
            t = 1.0 - t;
        }

        match self.stops.len() {
            0 => return Color::default(),
            1 => return self.stops[0].1,
            _ => {}
        }

        for pair in self.stops.windows(2) {
            let (t0, c0) = &pair[0];
            let (t1, c1) = &pair[1];
            if t >= *t0 && t <= *t1 {
                let local_t = if t1 > t0 { (t - t0) / (t1 - t0) } else { 0.0 };
                return Color::lerp(c0, c1, local_t);
            }
        }

        self.stops.last().map(|(_, c)| *c).unwrap_or_default()
    }
}

// MARK: - Built-in Colormaps

/// Perceptually uniform, colorblind-safe; default for pattern-similarity hotmaps
pub fn viridis() -> Colormap {
    Colormap::from_colors(
        "viridis",
        vec![
            Color::rgb(0.267, 0.005, 0.329),
            Color::rgb(0.282, 0.141, 0.458),
            Color::rgb(0.254, 0.265, 0.530),
            Color::rgb(0.207, 0.372, 0.553),
            Color::rgb(0.164, 0.471, 0.558),
            Color::rgb(0.128, 0.567, 0.551),
            Color::rgb(0.135, 0.659, 0.518),
            Color::rgb(0.267, 0.749, 0.441),
            Color::rgb(0.478, 0.821, 0.318),
            Color::rgb(0.741, 0.873, 0.150),
            Color::rgb(0.993, 0.906, 0.144),
        ],
    )
}

/// Default for correlation hotmaps
pub fn inferno() -> Colormap {
    Colormap::from_colors(
        "inferno",
        vec![
            Color::rgb(0.001, 0.000, 0.014),
            Color::rgb(0.133, 0.047, 0.263),
            Color::rgb(0.341, 0.063, 0.429),
            Color::rgb(0.550, 0.161, 0.506),
            Color::rgb(0.735, 0.216, 0.330),
            Color::rgb(0.878, 0.392, 0.102),
            Color::rgb(0.978, 0.557, 0.035),
            Color::rgb(0.992, 0.772, 0.247),
            Color::rgb(0.988, 0.998, 0.645),
        ],
    )
}

/// Rainbow map used for RDMs
pub fn jet() -> Colormap {
    Colormap::from_stops(
        "jet",
        vec![
            (0.0, Color::rgb(0.0, 0.0, 0.5)),
            (0.11, Color::rgb(0.0, 0.0, 1.0)),
            (0.34, Color::rgb(0.0, 0.9, 1.0)),
            (0.5, Color::rgb(0.5, 1.0, 0.5)),
            (0.65, Color::rgb(1.0, 0.9, 0.0)),
            (0.89, Color::rgb(1.0, 0.0, 0.0)),
            (1.0, Color::rgb(0.5, 0.0, 0.0)),
        ],
    )
}

/// White to dark green; used for RDMs with printed values
pub fn greens() -> Colormap {
    let hex = [
        "#F7FCF5", "#E5F5E0", "#C7E9C0", "#A1D99B", "#74C476", "#41AB5D", "#238B45", "#006D2C",
        "#00441B",
    ];
    Colormap::from_colors(
        "greens",
        hex.iter().filter_map(|h| Color::from_hex(h)).collect(),
    )
}

/// Black to white; template backgrounds
pub fn gray() -> Colormap {
    Colormap::from_colors("gray", vec![Color::BLACK, Color::WHITE])
}

/// Black, red, yellow, white; unsigned glass-brain projections
pub fn hot() -> Colormap {
    Colormap::from_stops(
        "hot",
        vec![
            (0.0, Color::rgb(0.04, 0.0, 0.0)),
            (0.365, Color::rgb(1.0, 0.0, 0.0)),
            (0.746, Color::rgb(1.0, 1.0, 0.0)),
            (1.0, Color::WHITE),
        ],
    )
}

/// Cyan-blue for negative, black at zero, red-yellow for positive values
pub fn cold_hot() -> Colormap {
    Colormap::from_stops(
        "cold_hot",
        vec![
            (0.0, Color::rgb(0.0, 1.0, 1.0)),
            (0.25, Color::rgb(0.0, 0.0, 1.0)),
            (0.5, Color::BLACK),
            (0.75, Color::rgb(1.0, 0.0, 0.0)),
            (1.0, Color::rgb(1.0, 1.0, 0.0)),
        ],
    )
}

/// Ten-color categorical cycle for line series
pub fn category10() -> Vec<Color> {
    [
        "#1F77B4", "#FF7F0E", "#2CA02C", "#D62728", "#9467BD", "#8C564B", "#E377C2", "#7F7F7F",
        "#BCBD22", "#17BECF",
    ]
    .iter()
    .filter_map(|h| Color::from_hex(h))
    .collect()
}

pub fn builtin_colormap_names() -> Vec<&'static str> {
    vec!["viridis", "inferno", "jet", "greens", "gray", "hot", "cold_hot"]
}

/// Get a built-in colormap by name; `<name>_r` gives the reversed map
pub fn get_colormap(name: &str) -> Option<Colormap> {
    let name = name.to_lowercase();
    if let Some(base) = name.strip_suffix("_r") {
        return get_colormap(base).map(Colormap::reversed);
    }
    match name.as_str() {
        "viridis" => Some(viridis()),
        "inferno" => Some(inferno()),
        "jet" => Some(jet()),
        "greens" => Some(greens()),
        "gray" | "grey" => Some(gray()),
        "hot" => Some(hot()),
        "cold_hot" => Some(cold_hot()),
        _ => None,
    }
}

/// Maps data values onto a colormap between `vmin` and `vmax`
#[derive(Clone, Debug, PartialEq)]
pub struct ColorScale {
    pub colormap: Colormap,
    pub vmin: f64,
    pub vmax: f64,
    /// Values with magnitude below this are left undrawn
    pub threshold: Option<f64>,
}

impl ColorScale {
    pub fn new(colormap: Colormap, vmin: f64, vmax: f64) -> Self {
        Self {
            colormap,
            vmin,
            vmax,
            threshold: None,
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = Some(threshold);
        self
    }

    /// Map a value to a normalized position (0.0 to 1.0), clamped
    pub fn normalize(&self, value: f64) -> f32 {
        let t = if self.vmax > self.vmin {
            ((value - self.vmin) / (self.vmax - self.vmin)) as f32
        } else {
            0.5
        };
        t.clamp(0.0, 1.0)
    }

    /// Color for a value; `None` for NaN and sub-threshold values
    pub fn color(&self, value: f64) -> Option<Color> {
        if value.is_nan() {
            return None;
        }
        if let Some(threshold) = self.threshold {
            if value.abs() < threshold {
                return None;
            }
        }
        Some(self.colormap.sample(self.normalize(value)))
    }
}

impl Default for ColorScale {
    fn default() -> Self {
        Self::new(viridis(), 0.0, 1.0)
    }
}
