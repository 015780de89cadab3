//! Channel × time heatmaps ("hotmaps")
//!
//! Each channel (or region) is one horizontal band of height 0.16 in data
//! units, with the first channel at the bottom. Time runs along x over
//! `[start_t, start_t + ts * t_step]`.

use ndarray::{Array2, ArrayView2, ArrayViewD};

use neurovis_stats::{butter_lowpass, filtfilt};

use crate::axis::{AxisConfig, AxisPosition, Ticks};
use crate::colormap::{inferno, viridis, ColorScale, Colormap};
use crate::error::{PlotError, PlotResult};
use crate::figure::{Colorbar, Figure, Heatmap, Label, Layer, Origin, Panel};
use crate::timecourse::{r_values, time_points, upsample_rows, UPSAMPLE};

/// Height of one channel band in data units
pub const CHANNEL_HEIGHT: f64 = 0.16;

/// Butterworth order used when smoothing
const FILTER_ORDER: usize = 4;

/// Low-pass cutoff in Hz
const CUTOFF_HZ: f64 = 30.0;

/// Display options shared by the hotmap plots
#[derive(Clone, Debug, PartialEq)]
pub struct HotmapOptions {
    /// One label per channel; ordinals ("1st", "2nd", ...) when unset
    pub chllabels: Option<Vec<String>>,
    /// `(start_t, t_step)` in seconds
    pub time_unit: (f64, f64),
    /// Color limits `(min, max)`
    pub lim: (f64, f64),
    /// Spline-upsample and low-pass filter each channel
    pub smooth: bool,
    /// Figure size in inches; derived from the data when unset
    pub figsize: Option<(f64, f64)>,
    pub colormap: Option<Colormap>,
}

impl Default for HotmapOptions {
    fn default() -> Self {
        Self {
            chllabels: None,
            time_unit: (0.0, 0.1),
            lim: (0.0, 1.0),
            smooth: false,
            figsize: None,
            colormap: None,
        }
    }
}

/// Options for [`plot_nps_hotmap`]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NpsHotmapOptions {
    pub hotmap: HotmapOptions,
    /// Plot absolute similarities
    pub abs: bool,
}

/// English ordinal for `n` ("1st", "12th", "22nd")
pub fn ordinal(n: usize) -> String {
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{}{}", n, suffix)
}

/// Default channel labels: "1st", "2nd", "3rd", ...
pub fn channel_ordinals(nchls: usize) -> Vec<String> {
    (1..=nchls).map(ordinal).collect()
}

/// Upsample each channel 50× and low-pass it without phase shift
///
/// The cutoff is 30 Hz at the upsampled rate `trunc(1 / t_step) * 50`.
pub fn smooth_rows(rows: &Array2<f64>, time_unit: (f64, f64)) -> PlotResult<Array2<f64>> {
    let x = time_points(rows.ncols(), time_unit)?;
    let (_, mut soft) = upsample_rows(&x, rows)?;

    let samplerate = (1.0 / time_unit.1).trunc() * UPSAMPLE as f64;
    let coeffs = butter_lowpass(FILTER_ORDER, 2.0 * CUTOFF_HZ / samplerate)?;
    for mut row in soft.outer_iter_mut() {
        let values: Vec<f64> = row.iter().copied().collect();
        let filtered = filtfilt(&coeffs, &values)?;
        for (dst, src) in row.iter_mut().zip(filtered) {
            *dst = src;
        }
    }
    tracing::debug!(samplerate, channels = soft.nrows(), "smoothed channels");
    Ok(soft)
}

fn hotmap(mut fig: Figure, data: Array2<f64>, default_cmap: Colormap, opts: &HotmapOptions) -> PlotResult<Figure> {
    let (nchls, ts) = data.dim();
    if nchls == 0 || ts == 0 {
        return Err(PlotError::shape_mismatch("a non-empty [n_chls, ts] array", &[nchls, ts]));
    }
    let labels = match &opts.chllabels {
        Some(labels) if labels.len() != nchls => {
            return Err(PlotError::invalid_option(
                "chllabels",
                format!("expected {} labels, got {}", nchls, labels.len()),
            ));
        }
        Some(labels) => labels.clone(),
        None => channel_ordinals(nchls),
    };
    let (start_t, tstep) = opts.time_unit;
    time_points(ts, opts.time_unit)?;
    tracing::debug!(nchls, ts, smooth = opts.smooth, "plotting hotmap");

    let values = if opts.smooth {
        smooth_rows(&data, opts.time_unit)?
    } else {
        data
    };

    let end_t = start_t + ts as f64 * tstep;
    let top = CHANNEL_HEIGHT * nchls as f64;
    let scale = ColorScale::new(
        opts.colormap.clone().unwrap_or(default_cmap),
        opts.lim.0,
        opts.lim.1,
    );

    let fonts = &fig.fonts;
    let ticks = labels
        .into_iter()
        .enumerate()
        .map(|(i, label)| (CHANNEL_HEIGHT * i as f64 + CHANNEL_HEIGHT / 2.0, label))
        .collect();
    let x_axis = AxisConfig::new(AxisPosition::Bottom, start_t, end_t)
        .with_label("Time (s)", fonts.axis_label_size)
        .with_tick_size(fonts.tick_label_size);
    let y_axis = AxisConfig::new(AxisPosition::Left, 0.0, top)
        .with_label("Channel", fonts.axis_label_size)
        .with_ticks(Ticks::Fixed(ticks))
        .with_tick_size(fonts.tick_label_size);

    let mut panel = Panel::new(x_axis, y_axis);
    panel.equal_aspect = true;
    panel.colorbar = Some(Colorbar {
        scale: scale.clone(),
        label: Some(Label::new("Similarity", fonts.colorbar_label_size)),
        tick_size: fonts.colorbar_tick_size,
    });
    panel.push(Layer::Heatmap(Heatmap::new(
        values,
        [start_t, end_t, 0.0, top],
        Origin::Lower,
        scale,
    )));

    let (w, h) = fig.size_inches;
    fig.size_inches = opts.figsize.unwrap_or((
        ts as f64 * tstep * (w - 2.0) + 2.0,
        nchls as f64 * 0.2 * (h - 1.5) + 1.5,
    ));
    fig.clear();
    fig.set_panels(1, 1, vec![panel]);
    Ok(fig)
}

/// Plot correlation coefficients per channel over time
///
/// `corrs` has shape `[n_chls, ts]` or `[n_chls, ts, 2]`; only r-values are
/// drawn. Defaults to the inferno colormap.
pub fn plot_corrs_hotmap(fig: Figure, corrs: ArrayViewD<f64>, opts: &HotmapOptions) -> PlotResult<Figure> {
    let r = r_values(corrs)?;
    hotmap(fig, r, inferno(), opts)
}

/// Plot neural pattern similarities per channel over time
///
/// `similarities` has shape `[n_chls, ts]`. Defaults to viridis.
pub fn plot_nps_hotmap(
    fig: Figure,
    similarities: ArrayView2<f64>,
    opts: &NpsHotmapOptions,
) -> PlotResult<Figure> {
    let data = if opts.abs {
        similarities.mapv(f64::abs)
    } else {
        similarities.to_owned()
    };
    hotmap(fig, data, viridis(), &opts.hotmap)
}
