//! Representational dissimilarity matrix heatmaps

use ndarray::{Array2, ArrayView2};

use crate::axis::{AxisConfig, AxisPosition, Ticks};
use crate::colormap::{greens, jet, Color, ColorScale, Colormap};
use crate::error::{PlotError, PlotResult};
use crate::figure::{Annotation, Colorbar, Figure, Heatmap, Label, Layer, Origin, Panel};

/// Display options for RDM heatmaps
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RdmOptions {
    /// Min-max rescale the off-diagonal entries before drawing
    pub rescale: bool,
    /// One label per condition; without labels the axes are hidden
    pub conditions: Option<Vec<String>>,
    /// Condition label size in points (configured default when unset)
    pub con_fontsize: Option<f64>,
    /// Cell value size in points, used by [`plot_rdm_with_value`]
    pub value_fontsize: Option<f64>,
    /// Overrides the default colormap (jet, or Greens with values)
    pub colormap: Option<Colormap>,
}

/// Check that `rdm` can be drawn: square and not 2 × 2
fn validate(rdm: &ArrayView2<f64>, opts: &RdmOptions) -> PlotResult<usize> {
    let (rows, cols) = rdm.dim();
    if rows != cols || rows == 0 {
        return Err(PlotError::shape_mismatch("a square [n_cons, n_cons] matrix", rdm.shape()));
    }
    if rows == 2 {
        return Err(PlotError::shape_mismatch("an RDM larger than 2 x 2", rdm.shape()));
    }
    if let Some(conditions) = &opts.conditions {
        if conditions.len() != rows {
            return Err(PlotError::invalid_option(
                "conditions",
                format!("expected {} labels, got {}", rows, conditions.len()),
            ));
        }
    }
    Ok(rows)
}

/// Min-max rescale the off-diagonal entries in place
///
/// The minimum is the second smallest distinct value (the smallest is
/// normally the zero diagonal) and the maximum the largest. Returns whether
/// anything was rescaled.
pub fn rescale_rdm(rdm: &mut Array2<f64>) -> bool {
    let mut distinct: Vec<f64> = rdm.iter().copied().filter(|v| !v.is_nan()).collect();
    distinct.sort_by(f64::total_cmp);
    distinct.dedup();

    if distinct.len() < 2 {
        tracing::warn!("fewer than two distinct values; RDM left unscaled");
        return false;
    }
    let min = distinct[1];
    let max = distinct[distinct.len() - 1];
    if max == min {
        tracing::warn!(value = max, "flat off-diagonal range; RDM left unscaled");
        return false;
    }

    for ((i, j), v) in rdm.indexed_iter_mut() {
        if i != j {
            *v = (*v - min) / (max - min);
        }
    }
    tracing::debug!(min, max, "rescaled RDM");
    true
}

/// Cell value as text: rounded to 4 decimals, trailing zeros trimmed
pub(crate) fn format_value(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let mut text = format!("{:.4}", value);
    while text.ends_with('0') && !text.ends_with(".0") {
        text.pop();
    }
    if text == "-0.0" {
        text = "0.0".to_string();
    }
    text
}

fn rdm_panel(fig: &Figure, values: Array2<f64>, colormap: Colormap, label: &str, opts: &RdmOptions) -> Panel {
    let cons = values.nrows();
    let fonts = &fig.fonts;

    let heatmap = Heatmap::new(
        values,
        [0.0, 1.0, 0.0, 1.0],
        Origin::Upper,
        ColorScale::new(colormap, 0.0, 1.0),
    );

    let mut x_axis = AxisConfig::new(AxisPosition::Bottom, 0.0, 1.0);
    let mut y_axis = AxisConfig::new(AxisPosition::Left, 0.0, 1.0);
    let mut axes_visible = false;

    if let Some(conditions) = &opts.conditions {
        let step = 1.0 / cons as f64;
        let size = opts.con_fontsize.unwrap_or(fonts.condition_label_size);
        let x_ticks = conditions
            .iter()
            .enumerate()
            .map(|(i, c)| ((i as f64 + 0.5) * step, c.clone()))
            .collect();
        let y_ticks = conditions
            .iter()
            .enumerate()
            .map(|(i, c)| (1.0 - (i as f64 + 0.5) * step, c.clone()))
            .collect();

        x_axis = x_axis.with_ticks(Ticks::Fixed(x_ticks)).with_tick_size(size);
        x_axis.tick_rotation = 30.0;
        y_axis = y_axis.with_ticks(Ticks::Fixed(y_ticks)).with_tick_size(size);
        axes_visible = true;
    } else {
        x_axis = x_axis.with_ticks(Ticks::Hidden);
        y_axis = y_axis.with_ticks(Ticks::Hidden);
    }

    let mut panel = Panel::new(x_axis, y_axis);
    panel.axes_visible = axes_visible;
    panel.equal_aspect = true;
    panel.push(Layer::Heatmap(heatmap.clone()));
    panel.colorbar = Some(Colorbar {
        scale: heatmap.scale,
        label: Some(Label::new(label, fonts.colorbar_label_size)),
        tick_size: fonts.colorbar_tick_size,
    });
    panel
}

/// Plot an RDM as a heatmap over the unit square
///
/// `rdm` is never modified; rescaling works on a copy.
pub fn plot_rdm(mut fig: Figure, rdm: ArrayView2<f64>, opts: &RdmOptions) -> PlotResult<Figure> {
    let cons = validate(&rdm, opts)?;
    tracing::debug!(cons, rescale = opts.rescale, "plotting RDM");

    let mut values = rdm.to_owned();
    let label = if opts.rescale {
        rescale_rdm(&mut values);
        "Dissimilarity (Rescaling)"
    } else {
        "Dissimilarity"
    };

    let colormap = opts.colormap.clone().unwrap_or_else(jet);
    let panel = rdm_panel(&fig, values, colormap, label, opts);

    fig.clear();
    fig.set_panels(1, 1, vec![panel]);
    Ok(fig)
}

/// Plot an RDM with each cell's value written on it
pub fn plot_rdm_with_value(
    mut fig: Figure,
    rdm: ArrayView2<f64>,
    opts: &RdmOptions,
) -> PlotResult<Figure> {
    let cons = validate(&rdm, opts)?;
    tracing::debug!(cons, "plotting RDM with values");

    let colormap = opts.colormap.clone().unwrap_or_else(greens);
    let mut panel = rdm_panel(&fig, rdm.to_owned(), colormap, "Dissimilarity", opts);

    let step = 1.0 / cons as f64;
    let size = opts.value_fontsize.unwrap_or(fig.fonts.value_size);
    for ((i, j), v) in rdm.indexed_iter() {
        panel.annotations.push(Annotation {
            x: (j as f64 + 0.5) * step,
            y: 1.0 - (i as f64 + 0.5) * step,
            label: Label::new(format_value(*v), size).with_color(Color::BLUE),
        });
    }

    fig.clear();
    fig.set_panels(1, 1, vec![panel]);
    Ok(fig)
}
