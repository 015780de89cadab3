//! Axis configuration, tick placement and data → pixel layout

use serde::{Deserialize, Serialize};

/// Axis side, also used to name spines
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AxisPosition {
    Left,
    Right,
    Top,
    Bottom,
}

/// How ticks are chosen for an axis
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Ticks {
    /// "Nice" round values over the data range
    #[default]
    Auto,
    /// Fixed positions with text labels
    Fixed(Vec<(f64, String)>),
    /// No ticks or tick labels
    Hidden,
}

/// Configuration for one axis of a panel
#[derive(Clone, Debug, PartialEq)]
pub struct AxisConfig {
    pub position: AxisPosition,

    /// Data range; `min > max` flips the axis
    pub min: f64,
    pub max: f64,

    pub label: Option<String>,
    /// Label size in points
    pub label_size: f64,

    pub ticks: Ticks,
    /// Tick label size in points
    pub tick_size: f64,
    /// Tick label rotation in degrees, counter-clockwise
    pub tick_rotation: f64,

    /// Decimals of auto tick labels; derived from the tick step when unset
    pub decimals: Option<usize>,
}

impl AxisConfig {
    pub fn new(position: AxisPosition, min: f64, max: f64) -> Self {
        Self {
            position,
            min,
            max,
            label: None,
            label_size: 10.0,
            ticks: Ticks::Auto,
            tick_size: 10.0,
            tick_rotation: 0.0,
            decimals: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>, size: f64) -> Self {
        self.label = Some(label.into());
        self.label_size = size;
        self
    }

    pub fn with_ticks(mut self, ticks: Ticks) -> Self {
        self.ticks = ticks;
        self
    }

    pub fn with_tick_size(mut self, size: f64) -> Self {
        self.tick_size = size;
        self
    }

    /// Fraction of the axis length at which `value` sits
    pub fn normalize(&self, value: f64) -> f64 {
        let span = self.max - self.min;
        if span == 0.0 {
            0.5
        } else {
            (value - self.min) / span
        }
    }
}

impl Default for AxisConfig {
    fn default() -> Self {
        Self::new(AxisPosition::Bottom, 0.0, 1.0)
    }
}

/// A tick mark on an axis
#[derive(Clone, Debug, PartialEq)]
pub struct TickMark {
    /// Position in data coordinates
    pub value: f64,
    /// Position in normalized coordinates (0.0 to 1.0)
    pub normalized: f64,
    pub label: String,
}

/// Tick marks for an axis, in ascending data order
pub fn calculate_ticks(config: &AxisConfig) -> Vec<TickMark> {
    match &config.ticks {
        Ticks::Hidden => Vec::new(),
        Ticks::Fixed(ticks) => ticks
            .iter()
            .map(|(value, label)| TickMark {
                value: *value,
                normalized: config.normalize(*value),
                label: label.clone(),
            })
            .collect(),
        Ticks::Auto => calculate_linear_ticks(config),
    }
}

fn calculate_linear_ticks(config: &AxisConfig) -> Vec<TickMark> {
    let (lo, hi) = if config.min <= config.max {
        (config.min, config.max)
    } else {
        (config.max, config.min)
    };
    let range = hi - lo;
    if !(range > 0.0) || !range.is_finite() {
        return vec![];
    }

    let step = nice_step(range / 5.0);
    let decimals = config.decimals.unwrap_or_else(|| step_decimals(step));
    let start = (lo / step).ceil() * step;
    let mut ticks = Vec::new();

    let mut i = 0;
    loop {
        let mut value = start + step * i as f64;
        if value > hi + step * 0.001 {
            break;
        }
        // no "-0.0" labels
        if value.abs() < step * 1e-9 {
            value = 0.0;
        }
        ticks.push(TickMark {
            value,
            normalized: config.normalize(value),
            label: format!("{:.*}", decimals, value),
        });
        i += 1;
    }

    ticks
}

/// Round a rough step to 1, 2 or 5 times a power of ten
fn nice_step(rough: f64) -> f64 {
    let magnitude = 10.0_f64.powf(rough.abs().log10().floor());
    let residual = rough / magnitude;

    if residual <= 1.5 {
        magnitude
    } else if residual <= 3.0 {
        2.0 * magnitude
    } else if residual <= 7.0 {
        5.0 * magnitude
    } else {
        10.0 * magnitude
    }
}

/// Decimals needed to tell ticks `step` apart
fn step_decimals(step: f64) -> usize {
    if step >= 1.0 {
        0
    } else {
        (-step.log10()).ceil().max(0.0) as usize
    }
}

/// Maps data coordinates into a pixel rectangle
#[derive(Clone, Debug)]
pub struct AxisLayout {
    /// Plot area in pixels (x, y, width, height), y measured downwards
    pub plot_area: [f64; 4],
    pub x_range: (f64, f64),
    pub y_range: (f64, f64),
}

impl AxisLayout {
    pub fn new(plot_area: [f64; 4], x_axis: &AxisConfig, y_axis: &AxisConfig) -> Self {
        Self {
            plot_area,
            x_range: (x_axis.min, x_axis.max),
            y_range: (y_axis.min, y_axis.max),
        }
    }

    /// Pixel position of a data point
    pub fn data_to_pixel(&self, x: f64, y: f64) -> (f64, f64) {
        let x_norm = (x - self.x_range.0) / (self.x_range.1 - self.x_range.0);
        let y_norm = (y - self.y_range.0) / (self.y_range.1 - self.y_range.0);

        let px = self.plot_area[0] + x_norm * self.plot_area[2];
        let py = self.plot_area[1] + (1.0 - y_norm) * self.plot_area[3]; // Y is flipped

        (px, py)
    }
}
