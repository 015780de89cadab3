//! Correlation time courses

use ndarray::{Array2, ArrayViewD, Axis, Ix2, Ix3};

use neurovis_stats::{linspace, CubicSpline};

use crate::axis::{AxisConfig, AxisPosition};
use crate::colormap::category10;
use crate::error::{PlotError, PlotResult};
use crate::figure::{Figure, Layer, Line, Panel};

/// Output samples per input time point when smoothing
pub const UPSAMPLE: usize = 50;

/// Display options for [`plot_corrs_by_time`]
#[derive(Clone, Debug, PartialEq)]
pub struct TimecourseOptions {
    /// One legend entry per curve; no legend when unset
    pub labels: Option<Vec<String>>,
    /// `(start_t, t_step)` in seconds
    pub time_unit: (f64, f64),
}

impl Default for TimecourseOptions {
    fn default() -> Self {
        Self {
            labels: None,
            time_unit: (0.0, 0.1),
        }
    }
}

/// r-values of a `[n, ts]` or `[n, ts, 2]` array as `[n, ts]`
pub(crate) fn r_values(data: ArrayViewD<f64>) -> PlotResult<Array2<f64>> {
    match data.ndim() {
        2 => {
            let view = data
                .into_dimensionality::<Ix2>()
                .map_err(|_| PlotError::shape_mismatch("[n, ts]", &[]))?;
            Ok(view.to_owned())
        }
        3 if data.shape()[2] == 2 => {
            let view = data
                .into_dimensionality::<Ix3>()
                .map_err(|_| PlotError::shape_mismatch("[n, ts, 2]", &[]))?;
            Ok(view.index_axis(Axis(2), 0).to_owned())
        }
        _ => Err(PlotError::shape_mismatch(
            "[n, ts] or [n, ts, 2]",
            data.shape(),
        )),
    }
}

/// Time of each sample: `start + i * step`
pub(crate) fn time_points(ts: usize, time_unit: (f64, f64)) -> PlotResult<Vec<f64>> {
    let (start, step) = time_unit;
    if !(step > 0.0) || !step.is_finite() || !start.is_finite() {
        return Err(PlotError::invalid_option(
            "time_unit",
            format!("time step must be positive and finite, got {}", step),
        ));
    }
    Ok((0..ts).map(|i| start + step * i as f64).collect())
}

/// Cubic-spline every row onto `ts * UPSAMPLE` evenly spaced times
pub(crate) fn upsample_rows(x: &[f64], rows: &Array2<f64>) -> PlotResult<(Vec<f64>, Array2<f64>)> {
    let spline = CubicSpline::new(x)?;
    let (first, last) = match (x.first(), x.last()) {
        (Some(first), Some(last)) => (*first, *last),
        _ => return Err(PlotError::shape_mismatch("at least one time point", &[0])),
    };
    let x_soft = linspace(first, last, x.len() * UPSAMPLE);

    let mut out = Array2::zeros((rows.nrows(), x_soft.len()));
    for (row, mut target) in rows.outer_iter().zip(out.outer_iter_mut()) {
        let values: Vec<f64> = row.iter().copied().collect();
        let smooth = spline.evaluate(&values, &x_soft)?;
        target.assign(&ndarray::ArrayView1::from(&smooth[..]));
    }
    Ok((x_soft, out))
}

/// Y range that leaves a 10% margin around the curves
///
/// Curves that come within 10% of ±1 are shown on the full ±1 range.
pub fn similarity_limits(vmin: f64, vmax: f64) -> (f64, f64) {
    let ymax = if vmax > 1.0 / 1.1 {
        1.0
    } else if vmax > 0.0 {
        vmax * 1.1
    } else {
        0.1
    };
    let ymin = if vmin >= 0.0 {
        -0.1
    } else if vmin > -1.0 / 1.1 {
        vmin * 1.1
    } else {
        -1.0
    };
    (ymin, ymax)
}

/// Plot smoothed correlation curves over time
///
/// `corrs` has shape `[n, ts]` (r-values) or `[n, ts, 2]` (r and p); only
/// the r-values are drawn. Needs at least four time points.
pub fn plot_corrs_by_time(
    mut fig: Figure,
    corrs: ArrayViewD<f64>,
    opts: &TimecourseOptions,
) -> PlotResult<Figure> {
    let r = r_values(corrs)?;
    let (n, ts) = r.dim();
    if let Some(labels) = &opts.labels {
        if labels.len() != n {
            return Err(PlotError::invalid_option(
                "labels",
                format!("expected {} labels, got {}", n, labels.len()),
            ));
        }
    }
    tracing::debug!(curves = n, ts, time_unit = ?opts.time_unit, "plotting time course");

    let x = time_points(ts, opts.time_unit)?;
    let (x_soft, y_soft) = upsample_rows(&x, &r)?;

    let finite = y_soft.iter().copied().filter(|v| v.is_finite());
    let vmax = finite.clone().fold(f64::NEG_INFINITY, f64::max);
    let vmin = finite.fold(f64::INFINITY, f64::min);
    if !vmax.is_finite() {
        return Err(PlotError::EmptyResult {
            reason: "time course has no finite values".to_string(),
        });
    }
    let (ymin, ymax) = similarity_limits(vmin, vmax);

    let (x0, x1) = (x_soft[0], x_soft[x_soft.len() - 1]);
    let pad = (x1 - x0) * 0.05;

    let fonts = &fig.fonts;
    let x_axis = AxisConfig::new(AxisPosition::Bottom, x0 - pad, x1 + pad)
        .with_label("Time (s)", fonts.axis_label_size)
        .with_tick_size(fonts.tick_label_size);
    let y_axis = AxisConfig::new(AxisPosition::Left, ymin, ymax)
        .with_label("Similarity", fonts.axis_label_size)
        .with_tick_size(fonts.tick_label_size);

    let mut panel = Panel::new(x_axis, y_axis);
    panel.spines.hide(AxisPosition::Top);
    panel.spines.hide(AxisPosition::Right);
    panel.legend = opts.labels.is_some();

    let palette = category10();
    for (i, row) in y_soft.outer_iter().enumerate() {
        panel.push(Layer::Line(Line {
            x: x_soft.clone(),
            y: row.to_vec(),
            color: palette[i % palette.len()],
            width: 3.0,
            label: opts.labels.as_ref().map(|l| l[i].clone()),
        }));
    }

    fig.clear();
    fig.set_panels(1, 1, vec![panel]);
    Ok(fig)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array3, IxDyn};

    #[test]
    fn test_r_values_from_3d() {
        let mut data = Array3::<f64>::zeros((2, 5, 2));
        data[[1, 3, 0]] = 0.7;
        data[[1, 3, 1]] = 0.01;
        let r = r_values(data.view().into_dyn()).unwrap();
        assert_eq!(r.dim(), (2, 5));
        assert_eq!(r[[1, 3]], 0.7);
    }

    #[test]
    fn test_r_values_rejects_other_shapes() {
        let bad = ndarray::ArrayD::<f64>::zeros(IxDyn(&[2, 5, 3]));
        assert!(matches!(
            r_values(bad.view()),
            Err(PlotError::ShapeMismatch { .. })
        ));
        let flat = ndarray::ArrayD::<f64>::zeros(IxDyn(&[5]));
        assert!(r_values(flat.view()).is_err());
    }

    #[test]
    fn test_similarity_limits() {
        assert_eq!(similarity_limits(0.1, 0.5).0, -0.1);
        assert!((similarity_limits(0.1, 0.5).1 - 0.55).abs() < 1e-12);
        assert_eq!(similarity_limits(-0.95, 0.95), (-1.0, 1.0));
        let (ymin, _) = similarity_limits(-0.5, 0.5);
        assert!((ymin + 0.55).abs() < 1e-12);
    }

    #[test]
    fn test_curves_are_upsampled() {
        let corrs = Array2::from_shape_fn((3, 10), |(i, t)| 0.1 * i as f64 + 0.01 * t as f64);
        let opts = TimecourseOptions {
            labels: Some(vec!["a".into(), "b".into(), "c".into()]),
            ..TimecourseOptions::default()
        };
        let fig = plot_corrs_by_time(Figure::new(), corrs.view().into_dyn(), &opts).unwrap();
        let panel = fig.panel(0).unwrap();

        let lines: Vec<&Line> = panel.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].x.len(), 500);
        assert!((lines[0].x[0] - 0.0).abs() < 1e-12);
        assert!((lines[0].x[499] - 0.9).abs() < 1e-12);
        assert_eq!(lines[2].label.as_deref(), Some("c"));
        assert!(panel.legend);
        assert!(!panel.spines.top && !panel.spines.right);
    }

    #[test]
    fn test_too_few_time_points() {
        let corrs = Array2::<f64>::zeros((1, 3));
        let err = plot_corrs_by_time(Figure::new(), corrs.view().into_dyn(), &TimecourseOptions::default())
            .unwrap_err();
        assert!(matches!(err, PlotError::Stats(_)));
    }

    #[test]
    fn test_bad_time_step() {
        let corrs = Array2::<f64>::zeros((1, 8));
        let opts = TimecourseOptions {
            time_unit: (0.0, 0.0),
            ..TimecourseOptions::default()
        };
        let err = plot_corrs_by_time(Figure::new(), corrs.view().into_dyn(), &opts).unwrap_err();
        assert!(matches!(err, PlotError::InvalidOption { .. }));
    }
}
